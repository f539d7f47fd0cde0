//! Statement parsing.

use tweezer_ir::{IndexExpr, LoopBound};

use super::Parser;
use crate::ast::{ForLoop, GateCall, Operand, Statement};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse a top-level statement.
    pub(super) fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.peek() {
            Some(Token::Include) => self.parse_include(),
            Some(Token::QReg) => {
                self.advance();
                let (name, size) = self.parse_declaration()?;
                Ok(Statement::QReg { name, size })
            }
            Some(Token::CReg) => {
                self.advance();
                let (name, size) = self.parse_declaration()?;
                Ok(Statement::CReg { name, size })
            }
            _ => self.parse_body_statement(),
        }
    }

    /// Statements allowed inside a loop body.
    fn parse_body_statement(&mut self) -> ParseResult<Statement> {
        match self.peek() {
            Some(Token::Measure) => self.parse_measure(),
            Some(Token::Barrier) => self.parse_barrier(),
            Some(Token::For) => self.parse_for(),
            Some(Token::Identifier(_)) => self.parse_gate_call(),
            _ => Err(self.unexpected("gate, measure, barrier or for")),
        }
    }

    fn parse_include(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Include)?;
        let path = match self.peek() {
            Some(Token::StringLiteral(s)) => s.clone(),
            _ => return Err(self.unexpected("file name")),
        };
        self.advance();
        self.expect(Token::Semicolon)?;
        Ok(Statement::Include(path))
    }

    /// `name[size];` after `qreg` / `creg`.
    fn parse_declaration(&mut self) -> ParseResult<(String, u32)> {
        let name = self.parse_identifier()?;
        self.expect(Token::LBracket)?;
        let line = self.line();
        let size = self.parse_int_literal()?;
        let size = u32::try_from(size).map_err(|_| ParseError::UnexpectedToken {
            line,
            expected: "register size below 2^32".into(),
            found: size.to_string(),
        })?;
        self.expect(Token::RBracket)?;
        self.expect(Token::Semicolon)?;
        Ok((name, size))
    }

    fn parse_gate_call(&mut self) -> ParseResult<Statement> {
        let name = self.parse_identifier()?;

        let params = if self.consume(&Token::LParen) {
            let params = self.parse_expression_list()?;
            self.expect(Token::RParen)?;
            params
        } else {
            Vec::new()
        };

        let operands = self.parse_operand_list()?;
        if operands.is_empty() {
            return Err(self.unexpected("operand"));
        }
        self.expect(Token::Semicolon)?;

        Ok(Statement::Gate(GateCall {
            name,
            params,
            operands,
        }))
    }

    fn parse_measure(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Measure)?;
        let qubit = self.parse_operand()?;
        self.expect(Token::Arrow)?;
        let clbit = self.parse_operand()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Measure { qubit, clbit })
    }

    fn parse_barrier(&mut self) -> ParseResult<Statement> {
        self.expect(Token::Barrier)?;
        let operands = self.parse_operand_list()?;
        self.expect(Token::Semicolon)?;
        Ok(Statement::Barrier(operands))
    }

    /// `for var in [start:stop]`, `for var in [start:step:stop]` or
    /// `for var in bound`, followed by a braced body.
    fn parse_for(&mut self) -> ParseResult<Statement> {
        self.expect(Token::For)?;
        let var = self.parse_identifier()?;
        self.expect(Token::In)?;

        let bound = if self.consume(&Token::LBracket) {
            let first = self.parse_index_expr()?;
            self.expect(Token::Colon)?;
            let second = self.parse_index_expr()?;
            let bound = if self.consume(&Token::Colon) {
                let line = self.line();
                let stop = self.parse_index_expr()?;
                let step = second.as_constant().filter(|s| *s != 0).ok_or_else(|| {
                    ParseError::UnexpectedToken {
                        line,
                        expected: "non-zero constant step".into(),
                        found: second.to_string(),
                    }
                })?;
                LoopBound::Range {
                    start: first,
                    stop,
                    step,
                }
            } else {
                LoopBound::range(first, second)
            };
            self.expect(Token::RBracket)?;
            bound
        } else {
            LoopBound::Symbolic(self.parse_identifier()?)
        };

        self.expect(Token::LBrace)?;
        let mut body = Vec::new();
        while !self.consume(&Token::RBrace) {
            if self.is_eof() {
                return Err(ParseError::UnexpectedEof(format!(
                    "expected }} closing loop over '{var}'"
                )));
            }
            body.push(self.parse_body_statement()?);
        }

        Ok(Statement::For(ForLoop { var, bound, body }))
    }

    /// Comma-separated operands, possibly none, up to `;`.
    fn parse_operand_list(&mut self) -> ParseResult<Vec<Operand>> {
        let mut operands = Vec::new();
        if self.check(&Token::Semicolon) {
            return Ok(operands);
        }
        loop {
            operands.push(self.parse_operand()?);
            if !self.consume(&Token::Comma) {
                break;
            }
        }
        Ok(operands)
    }

    fn parse_operand(&mut self) -> ParseResult<Operand> {
        let register = self.parse_identifier()?;
        let index: Option<IndexExpr> = if self.consume(&Token::LBracket) {
            let index = self.parse_index_expr()?;
            self.expect(Token::RBracket)?;
            Some(index)
        } else {
            None
        };
        Ok(Operand { register, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Program;

    fn program(body: &str) -> Program {
        let mut parser = Parser::new(&format!("OPENQASM 2.0; {body}")).unwrap();
        parser.parse_program().unwrap()
    }

    fn program_err(body: &str) -> ParseError {
        let mut parser = Parser::new(&format!("OPENQASM 2.0; {body}")).unwrap();
        parser.parse_program().unwrap_err()
    }

    #[test]
    fn test_declarations() {
        let p = program("qreg q[4]; creg c[2];");
        assert_eq!(
            p.statements,
            vec![
                Statement::QReg {
                    name: "q".into(),
                    size: 4
                },
                Statement::CReg {
                    name: "c".into(),
                    size: 2
                },
            ]
        );
    }

    #[test]
    fn test_gate_call_with_params() {
        let p = program("u(pi, 0, pi / 2) q[1];");
        match &p.statements[0] {
            Statement::Gate(call) => {
                assert_eq!(call.name, "u");
                assert_eq!(call.params.len(), 3);
                assert_eq!(call.operands[0].to_string(), "q[1]");
            }
            other => panic!("expected a gate, got {other:?}"),
        }
    }

    #[test]
    fn test_whole_register_operands() {
        let p = program("measure q -> c; barrier q;");
        assert!(matches!(
            &p.statements[0],
            Statement::Measure { qubit, clbit } if qubit.index.is_none() && clbit.index.is_none()
        ));
        assert!(matches!(&p.statements[1], Statement::Barrier(ops) if ops.len() == 1));
    }

    #[test]
    fn test_nested_loops() {
        let p = program("for j in [0:4] { h q[j]; for k in [j + 1:4] { cp(pi) q[k], q[j]; } }");
        let Statement::For(outer) = &p.statements[0] else {
            panic!("expected a loop");
        };
        assert_eq!(outer.body.len(), 2);
        let Statement::For(inner) = &outer.body[1] else {
            panic!("expected a nested loop");
        };
        assert_eq!(inner.bound, LoopBound::range(IndexExpr::var("j") + 1, 4));
    }

    #[test]
    fn test_stepped_and_symbolic_bounds() {
        let p = program("for i in [3:-1:-1] { x q[i]; } for i in n { x q[i]; }");
        let Statement::For(stepped) = &p.statements[0] else {
            panic!("expected a loop");
        };
        assert_eq!(
            stepped.bound,
            LoopBound::Range {
                start: IndexExpr::constant(3),
                stop: IndexExpr::constant(-1),
                step: -1,
            }
        );
        let Statement::For(symbolic) = &p.statements[1] else {
            panic!("expected a loop");
        };
        assert_eq!(symbolic.bound, LoopBound::Symbolic("n".into()));
    }

    #[test]
    fn test_zero_step_rejected() {
        let err = program_err("for i in [0:0:4] { x q[i]; }");
        assert!(matches!(err, ParseError::UnexpectedToken { ref found, .. } if found == "0"));
    }

    #[test]
    fn test_declaration_inside_loop_rejected() {
        let err = program_err("for i in [0:2] { qreg r[1]; }");
        assert!(matches!(err, ParseError::UnexpectedToken { ref found, .. } if found == "qreg"));
    }

    #[test]
    fn test_unclosed_loop() {
        let err = program_err("for i in [0:2] { x q[i];");
        assert!(matches!(err, ParseError::UnexpectedEof(_)));
    }

    #[test]
    fn test_gate_needs_operands() {
        let err = program_err("h;");
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }
}
