//! Emitter for circuits and schedules.

use tweezer_ir::{
    Circuit, LoopBlock, Operation, ParameterExpression, Register, Schedule, Template,
};

use crate::error::{ParseError, ParseResult};

/// Emit a circuit. Loops are written back as `for` blocks.
pub fn emit(circuit: &Circuit) -> ParseResult<String> {
    let mut emitter = Emitter::new();
    emitter.emit_header(circuit.qregs(), circuit.cregs());
    for op in circuit.iter() {
        emitter.emit_operation(op)?;
    }
    Ok(emitter.output)
}

/// Emit a schedule layer by layer, with a barrier over every qubit between
/// consecutive layers.
pub fn emit_schedule(schedule: &Schedule) -> ParseResult<String> {
    let mut emitter = Emitter::new();
    emitter.emit_header(schedule.qregs(), schedule.cregs());
    let fence = Operation::barrier(schedule.qubits());
    for (i, layer) in schedule.layers().iter().enumerate() {
        if i > 0 {
            emitter.emit_operation(&fence)?;
        }
        emitter.writeln(&format!("// layer {i}"));
        for op in layer.operations() {
            emitter.emit_operation(op)?;
        }
    }
    Ok(emitter.output)
}

struct Emitter {
    output: String,
    indent: usize,
}

impl Emitter {
    fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    fn emit_header(&mut self, qregs: &[Register], cregs: &[Register]) {
        self.writeln("OPENQASM 2.0;");
        self.writeln("include \"qelib1.inc\";");
        for reg in qregs {
            self.writeln(&format!("qreg {}[{}];", reg.name, reg.size));
        }
        for reg in cregs {
            self.writeln(&format!("creg {}[{}];", reg.name, reg.size));
        }
    }

    fn emit_operation(&mut self, op: &Operation) -> ParseResult<()> {
        match op {
            Operation::Gate(gate) => {
                let params = gate
                    .params
                    .iter()
                    .map(|p| format_float(*p))
                    .collect::<ParseResult<Vec<_>>>()?;
                let qubits: Vec<String> = gate.qubits.iter().map(ToString::to_string).collect();
                self.write_gate(gate.name(), &params, &qubits);
            }
            Operation::Measure { qubit, clbit } => {
                self.writeln(&format!("measure {qubit} -> {clbit};"));
            }
            Operation::Barrier { qubits } => {
                let qubits: Vec<String> = qubits.iter().map(ToString::to_string).collect();
                self.write_barrier(&qubits);
            }
            Operation::Loop(block) => self.emit_loop(block)?,
        }
        Ok(())
    }

    fn emit_loop(&mut self, block: &LoopBlock) -> ParseResult<()> {
        self.writeln(&format!("for {} in {} {{", block.var, block.bound));
        self.indent += 1;
        for template in &block.body {
            self.emit_template(template)?;
        }
        self.indent -= 1;
        self.writeln("}");
        Ok(())
    }

    fn emit_template(&mut self, template: &Template) -> ParseResult<()> {
        match template {
            Template::Gate(gate) => {
                let params = gate
                    .params
                    .iter()
                    .map(|p| format_expression(p, false))
                    .collect::<ParseResult<Vec<_>>>()?;
                let qubits: Vec<String> = gate.qubits.iter().map(ToString::to_string).collect();
                self.write_gate(gate.name(), &params, &qubits);
            }
            Template::Measure { qubit, clbit } => {
                self.writeln(&format!("measure {qubit} -> {clbit};"));
            }
            Template::Barrier { qubits } => {
                let qubits: Vec<String> = qubits.iter().map(ToString::to_string).collect();
                self.write_barrier(&qubits);
            }
            Template::Loop(block) => self.emit_loop(block)?,
        }
        Ok(())
    }

    fn write_gate(&mut self, name: &str, params: &[String], qubits: &[String]) {
        if params.is_empty() {
            self.writeln(&format!("{name} {};", qubits.join(", ")));
        } else {
            self.writeln(&format!("{name}({}) {};", params.join(", "), qubits.join(", ")));
        }
    }

    fn write_barrier(&mut self, qubits: &[String]) {
        if qubits.is_empty() {
            self.writeln("barrier;");
        } else {
            self.writeln(&format!("barrier {};", qubits.join(", ")));
        }
    }

    fn writeln(&mut self, line: &str) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
        self.output.push_str(line);
        self.output.push('\n');
    }
}

/// Shortest representation that parses back to the same bits.
fn format_float(value: f64) -> ParseResult<String> {
    if value.is_finite() {
        Ok(format!("{value:?}"))
    } else {
        Err(ParseError::Emit(format!("non-finite parameter {value}")))
    }
}

/// Print an expression so that parsing it rebuilds the same tree.
///
/// Nested binary operations are parenthesised. Negation is always written
/// `-(...)`, keeping it apart from a negative constant.
fn format_expression(expr: &ParameterExpression, nested: bool) -> ParseResult<String> {
    let binary = |a: &ParameterExpression,
                  op: &str,
                  b: &ParameterExpression|
     -> ParseResult<String> {
        let text = format!(
            "{} {op} {}",
            format_expression(a, true)?,
            format_expression(b, true)?
        );
        Ok(if nested { format!("({text})") } else { text })
    };

    match expr {
        ParameterExpression::Constant(v) if nested && v.is_sign_negative() => {
            Ok(format!("({})", format_float(*v)?))
        }
        ParameterExpression::Constant(v) => format_float(*v),
        ParameterExpression::Symbol(name) => Ok(name.clone()),
        ParameterExpression::Pi => Ok("pi".into()),
        ParameterExpression::Neg(inner) => Ok(format!("-({})", format_expression(inner, false)?)),
        ParameterExpression::Add(a, b) => binary(a, "+", b),
        ParameterExpression::Sub(a, b) => binary(a, "-", b),
        ParameterExpression::Mul(a, b) => binary(a, "*", b),
        ParameterExpression::Div(a, b) => binary(a, "/", b),
        ParameterExpression::Pow(a, b) => binary(a, "**", b),
    }
}
