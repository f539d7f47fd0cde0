//! Decomposition into the neutral-atom native gate set `{u, rz, cz}`.
//!
//! Every canonical gate has one identity, equal to the original up to a
//! global phase. Identities may produce further canonical gates (`cx` from
//! `swap`, `h` from `cx`); the engine rescans replacements so they are
//! lowered in turn.
//!
//! | Gate       | Identity                                                   |
//! |------------|------------------------------------------------------------|
//! | `id`       | (removed)                                                  |
//! | `h`        | `u(pi/2, 0, pi)`                                           |
//! | `x`        | `u(pi, 0, pi)`                                             |
//! | `y`        | `u(pi, pi/2, pi/2)`                                        |
//! | `rx(t)`    | `u(t, -pi/2, pi/2)`                                        |
//! | `ry(t)`    | `u(t, 0, 0)`                                               |
//! | `z s sdg t tdg p` | `rz` with angle `pi`, `pi/2`, `-pi/2`, `pi/4`, `-pi/4`, `l` |
//! | `cx a,b`   | `h b; cz a,b; h b`                                         |
//! | `cy a,b`   | `sdg b; cx a,b; s b`                                       |
//! | `cp(l) a,b`| `p(l/2) a; cx a,b; p(-l/2) b; cx a,b; p(l/2) b`            |
//! | `crz(t) a,b` | `rz(t/2) b; cx a,b; rz(-t/2) b; cx a,b`                  |
//! | `swap a,b` | `cx a,b; cx b,a; cx a,b`                                   |
//! | `ccx a,b,c`| six `cx`, seven `t`/`tdg`, two `h`                         |

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use tweezer_ir::{
    Angle, Gate, GateKind, Operation, ParameterExpression, Qubit, QubitExpr, Template,
};

use crate::error::{CompileError, CompileResult};
use crate::rewrite::{RewriteRule, RuleSet};

/// An identity table entry: operands and parameters in, replacement out.
type Identity<Q, P> = fn(&[Q], &[P]) -> Vec<Gate<Q, P>>;

macro_rules! native_rule {
    ($name:literal, $kind:expr, $identity:ident) => {
        RewriteRule::new($name, 1, |window| {
            expand_operation(window, &$kind, $identity::<Qubit, f64>)
        })
        .with_templates(|window| {
            expand_template(
                window,
                &$kind,
                $identity::<QubitExpr, ParameterExpression>,
            )
        })
    };
}

/// Lower every canonical gate to `{u, rz, cz}`.
///
/// The final rule rejects any gate left over, so a fixpoint of this rule
/// set contains only native gates, measurements, barriers and loops with
/// native bodies.
pub fn native_ruleset() -> RuleSet {
    RuleSet::new("native")
        .with_rule(native_rule!("id", GateKind::Id, id_identity))
        .with_rule(native_rule!("h", GateKind::H, h_identity))
        .with_rule(native_rule!("x", GateKind::X, x_identity))
        .with_rule(native_rule!("y", GateKind::Y, y_identity))
        .with_rule(native_rule!("rx", GateKind::Rx, rx_identity))
        .with_rule(native_rule!("ry", GateKind::Ry, ry_identity))
        .with_rule(native_rule!("z", GateKind::Z, z_identity))
        .with_rule(native_rule!("s", GateKind::S, s_identity))
        .with_rule(native_rule!("sdg", GateKind::Sdg, sdg_identity))
        .with_rule(native_rule!("t", GateKind::T, t_identity))
        .with_rule(native_rule!("tdg", GateKind::Tdg, tdg_identity))
        .with_rule(native_rule!("p", GateKind::P, p_identity))
        .with_rule(native_rule!("cx", GateKind::CX, cx_identity))
        .with_rule(native_rule!("cy", GateKind::CY, cy_identity))
        .with_rule(native_rule!("cp", GateKind::CP, cp_identity))
        .with_rule(native_rule!("crz", GateKind::CRz, crz_identity))
        .with_rule(native_rule!("swap", GateKind::Swap, swap_identity))
        .with_rule(native_rule!("ccx", GateKind::CCX, ccx_identity))
        .with_rule(
            RewriteRule::new("reject_unsupported", 1, reject_operation)
                .with_templates(reject_template),
        )
}

/// Decompose one gate, or `None` if it is already native.
///
/// Generic over operands so the same table lowers concrete gates and
/// symbolic loop-body gates.
pub fn decompose<Q, P>(gate: &Gate<Q, P>) -> CompileResult<Option<Vec<Gate<Q, P>>>>
where
    Q: Clone + std::fmt::Display,
    P: Angle + std::fmt::Display,
{
    let identity: Identity<Q, P> = match gate.kind {
        GateKind::Id => id_identity,
        GateKind::H => h_identity,
        GateKind::X => x_identity,
        GateKind::Y => y_identity,
        GateKind::Rx => rx_identity,
        GateKind::Ry => ry_identity,
        GateKind::Z => z_identity,
        GateKind::S => s_identity,
        GateKind::Sdg => sdg_identity,
        GateKind::T => t_identity,
        GateKind::Tdg => tdg_identity,
        GateKind::P => p_identity,
        GateKind::CX => cx_identity,
        GateKind::CY => cy_identity,
        GateKind::CP => cp_identity,
        GateKind::CRz => crz_identity,
        GateKind::Swap => swap_identity,
        GateKind::CCX => ccx_identity,
        GateKind::U | GateKind::Rz | GateKind::CZ => {
            check_signature(gate)?;
            return Ok(None);
        }
        GateKind::Custom(_) => return Err(unsupported(gate)),
    };
    expand(gate, &gate.kind, identity)
}

/// Check qubit and parameter counts against the gate kind.
pub fn check_signature<Q, P>(gate: &Gate<Q, P>) -> CompileResult<()> {
    if let Some(expected) = gate.kind.num_qubits() {
        if gate.qubits.len() != expected {
            return Err(CompileError::ArityMismatch {
                gate: gate.name().to_string(),
                expected,
                found: gate.qubits.len(),
            });
        }
    }
    if let Some(expected) = gate.kind.num_params() {
        if gate.params.len() != expected {
            return Err(CompileError::ParameterMismatch {
                gate: gate.name().to_string(),
                expected,
                found: gate.params.len(),
            });
        }
    }
    Ok(())
}

fn expand<Q: Clone, P: Angle>(
    gate: &Gate<Q, P>,
    kind: &GateKind,
    identity: Identity<Q, P>,
) -> CompileResult<Option<Vec<Gate<Q, P>>>> {
    if &gate.kind != kind {
        return Ok(None);
    }
    check_signature(gate)?;
    Ok(Some(identity(&gate.qubits, &gate.params)))
}

fn expand_operation(
    window: &[Operation],
    kind: &GateKind,
    identity: Identity<Qubit, f64>,
) -> CompileResult<Option<Vec<Operation>>> {
    let Some(Operation::Gate(gate)) = window.first() else {
        return Ok(None);
    };
    Ok(expand(gate, kind, identity)?.map(|gates| gates.into_iter().map(Operation::Gate).collect()))
}

fn expand_template(
    window: &[Template],
    kind: &GateKind,
    identity: Identity<QubitExpr, ParameterExpression>,
) -> CompileResult<Option<Vec<Template>>> {
    let Some(Template::Gate(gate)) = window.first() else {
        return Ok(None);
    };
    Ok(expand(gate, kind, identity)?.map(|gates| gates.into_iter().map(Template::Gate).collect()))
}

fn reject_operation(window: &[Operation]) -> CompileResult<Option<Vec<Operation>>> {
    match window.first() {
        Some(Operation::Gate(gate)) => reject(gate),
        _ => Ok(None),
    }
}

fn reject_template(window: &[Template]) -> CompileResult<Option<Vec<Template>>> {
    match window.first() {
        Some(Template::Gate(gate)) => reject(gate),
        _ => Ok(None),
    }
}

/// Native gates pass through once their signature checks out; anything
/// else reaching this rule has no identity.
fn reject<Q, P, T>(gate: &Gate<Q, P>) -> CompileResult<Option<T>>
where
    Q: std::fmt::Display,
    P: std::fmt::Display,
{
    if gate.kind.is_native() {
        check_signature(gate)?;
        Ok(None)
    } else {
        Err(unsupported(gate))
    }
}

fn unsupported<Q: std::fmt::Display, P: std::fmt::Display>(gate: &Gate<Q, P>) -> CompileError {
    CompileError::UnsupportedGate {
        gate: gate.name().to_string(),
        operation: gate.to_string(),
    }
}

// =============================================================================
// Gate constructors
// =============================================================================

fn k<P: Angle>(value: f64) -> P {
    P::from_f64(value)
}

fn u<Q: Clone, P: Angle>(q: &Q, theta: P, phi: P, lambda: P) -> Gate<Q, P> {
    Gate::new(GateKind::U, vec![q.clone()], vec![theta, phi, lambda])
}

fn rz<Q: Clone, P: Angle>(q: &Q, lambda: P) -> Gate<Q, P> {
    Gate::new(GateKind::Rz, vec![q.clone()], vec![lambda])
}

fn cz<Q: Clone, P>(a: &Q, b: &Q) -> Gate<Q, P> {
    Gate::new(GateKind::CZ, vec![a.clone(), b.clone()], Vec::new())
}

fn fixed<Q: Clone, P>(kind: GateKind, qubits: &[&Q]) -> Gate<Q, P> {
    Gate::new(kind, qubits.iter().map(|q| (*q).clone()).collect(), Vec::new())
}

fn phase<Q: Clone, P>(kind: GateKind, q: &Q, lambda: P) -> Gate<Q, P> {
    Gate::new(kind, vec![q.clone()], vec![lambda])
}

// =============================================================================
// Identities
// =============================================================================

fn id_identity<Q, P>(_: &[Q], _: &[P]) -> Vec<Gate<Q, P>> {
    Vec::new()
}

fn h_identity<Q: Clone, P: Angle>(q: &[Q], _: &[P]) -> Vec<Gate<Q, P>> {
    vec![u(&q[0], k(FRAC_PI_2), k(0.0), k(PI))]
}

fn x_identity<Q: Clone, P: Angle>(q: &[Q], _: &[P]) -> Vec<Gate<Q, P>> {
    vec![u(&q[0], k(PI), k(0.0), k(PI))]
}

fn y_identity<Q: Clone, P: Angle>(q: &[Q], _: &[P]) -> Vec<Gate<Q, P>> {
    vec![u(&q[0], k(PI), k(FRAC_PI_2), k(FRAC_PI_2))]
}

fn rx_identity<Q: Clone, P: Angle>(q: &[Q], p: &[P]) -> Vec<Gate<Q, P>> {
    vec![u(&q[0], p[0].clone(), k(-FRAC_PI_2), k(FRAC_PI_2))]
}

fn ry_identity<Q: Clone, P: Angle>(q: &[Q], p: &[P]) -> Vec<Gate<Q, P>> {
    vec![u(&q[0], p[0].clone(), k(0.0), k(0.0))]
}

fn z_identity<Q: Clone, P: Angle>(q: &[Q], _: &[P]) -> Vec<Gate<Q, P>> {
    vec![rz(&q[0], k(PI))]
}

fn s_identity<Q: Clone, P: Angle>(q: &[Q], _: &[P]) -> Vec<Gate<Q, P>> {
    vec![rz(&q[0], k(FRAC_PI_2))]
}

fn sdg_identity<Q: Clone, P: Angle>(q: &[Q], _: &[P]) -> Vec<Gate<Q, P>> {
    vec![rz(&q[0], k(-FRAC_PI_2))]
}

fn t_identity<Q: Clone, P: Angle>(q: &[Q], _: &[P]) -> Vec<Gate<Q, P>> {
    vec![rz(&q[0], k(FRAC_PI_4))]
}

fn tdg_identity<Q: Clone, P: Angle>(q: &[Q], _: &[P]) -> Vec<Gate<Q, P>> {
    vec![rz(&q[0], k(-FRAC_PI_4))]
}

fn p_identity<Q: Clone, P: Angle>(q: &[Q], p: &[P]) -> Vec<Gate<Q, P>> {
    vec![rz(&q[0], p[0].clone())]
}

fn cx_identity<Q: Clone, P: Angle>(q: &[Q], _: &[P]) -> Vec<Gate<Q, P>> {
    let (c, t) = (&q[0], &q[1]);
    vec![fixed(GateKind::H, &[t]), cz(c, t), fixed(GateKind::H, &[t])]
}

fn cy_identity<Q: Clone, P: Angle>(q: &[Q], _: &[P]) -> Vec<Gate<Q, P>> {
    let (c, t) = (&q[0], &q[1]);
    vec![
        fixed(GateKind::Sdg, &[t]),
        fixed(GateKind::CX, &[c, t]),
        fixed(GateKind::S, &[t]),
    ]
}

fn cp_identity<Q: Clone, P: Angle>(q: &[Q], p: &[P]) -> Vec<Gate<Q, P>> {
    let (c, t) = (&q[0], &q[1]);
    let half = p[0].scaled(0.5);
    vec![
        phase(GateKind::P, c, half.clone()),
        fixed(GateKind::CX, &[c, t]),
        phase(GateKind::P, t, p[0].scaled(-0.5)),
        fixed(GateKind::CX, &[c, t]),
        phase(GateKind::P, t, half),
    ]
}

fn crz_identity<Q: Clone, P: Angle>(q: &[Q], p: &[P]) -> Vec<Gate<Q, P>> {
    let (c, t) = (&q[0], &q[1]);
    vec![
        rz(t, p[0].scaled(0.5)),
        fixed(GateKind::CX, &[c, t]),
        rz(t, p[0].scaled(-0.5)),
        fixed(GateKind::CX, &[c, t]),
    ]
}

fn swap_identity<Q: Clone, P: Angle>(q: &[Q], _: &[P]) -> Vec<Gate<Q, P>> {
    let (a, b) = (&q[0], &q[1]);
    vec![
        fixed(GateKind::CX, &[a, b]),
        fixed(GateKind::CX, &[b, a]),
        fixed(GateKind::CX, &[a, b]),
    ]
}

fn ccx_identity<Q: Clone, P: Angle>(q: &[Q], _: &[P]) -> Vec<Gate<Q, P>> {
    let (a, b, c) = (&q[0], &q[1], &q[2]);
    vec![
        fixed(GateKind::H, &[c]),
        fixed(GateKind::CX, &[b, c]),
        fixed(GateKind::Tdg, &[c]),
        fixed(GateKind::CX, &[a, c]),
        fixed(GateKind::T, &[c]),
        fixed(GateKind::CX, &[b, c]),
        fixed(GateKind::Tdg, &[c]),
        fixed(GateKind::CX, &[a, c]),
        fixed(GateKind::T, &[b]),
        fixed(GateKind::T, &[c]),
        fixed(GateKind::H, &[c]),
        fixed(GateKind::CX, &[a, b]),
        fixed(GateKind::T, &[a]),
        fixed(GateKind::Tdg, &[b]),
        fixed(GateKind::CX, &[a, b]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite::fixpoint;
    use tweezer_ir::{Circuit, IndexExpr, LoopBlock, LoopBound};

    fn q(i: u32) -> Qubit {
        Qubit::new("q", i)
    }

    fn lower(circuit: &Circuit) -> CompileResult<Circuit> {
        fixpoint(circuit, &native_ruleset()).map(|r| r.circuit)
    }

    fn all_native(circuit: &Circuit) -> bool {
        circuit
            .iter()
            .filter_map(Operation::as_gate)
            .all(|g| g.kind.is_native())
    }

    #[test]
    fn test_h_identity() {
        let gate = Gate::new(GateKind::H, vec![q(0)], Vec::<f64>::new());
        let out = decompose(&gate).unwrap().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, GateKind::U);
        assert_eq!(out[0].params, vec![FRAC_PI_2, 0.0, PI]);
    }

    #[test]
    fn test_native_gates_are_left_alone() {
        let gate = Gate::new(GateKind::CZ, vec![q(0), q(1)], Vec::<f64>::new());
        assert!(decompose(&gate).unwrap().is_none());
    }

    #[test]
    fn test_cp_halves_angle() {
        let gate = Gate::new(GateKind::CP, vec![q(1), q(0)], vec![0.5]);
        let out = decompose(&gate).unwrap().unwrap();
        let kinds: Vec<_> = out.iter().map(|g| g.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![GateKind::P, GateKind::CX, GateKind::P, GateKind::CX, GateKind::P]
        );
        assert_eq!(out[0].params, vec![0.25]);
        assert_eq!(out[0].qubits, vec![q(1)]);
        assert_eq!(out[2].params, vec![-0.25]);
        assert_eq!(out[4].qubits, vec![q(0)]);
    }

    #[test]
    fn test_arity_checked() {
        let gate = Gate::new(GateKind::CX, vec![q(0)], Vec::<f64>::new());
        let err = decompose(&gate).unwrap_err();
        assert!(matches!(
            err,
            CompileError::ArityMismatch { expected: 2, found: 1, .. }
        ));
    }

    #[test]
    fn test_qft_lowers_to_native() {
        let circuit = Circuit::qft(4).unwrap();
        let lowered = lower(&circuit).unwrap();
        assert!(all_native(&lowered));
        // Each cp contributes two cz, each swap three.
        assert_eq!(lowered.count_ops().get("cz"), Some(&(6 * 2 + 2 * 3)));
    }

    #[test]
    fn test_lowering_is_idempotent() {
        let mut circuit = Circuit::with_size("mix", 3, 0);
        circuit
            .ccx(q(0), q(1), q(2))
            .unwrap()
            .cy(q(2), q(0))
            .unwrap()
            .rx(0.3, q(1))
            .unwrap()
            .crz(1.2, q(0), q(2))
            .unwrap();

        let once = lower(&circuit).unwrap();
        let twice = lower(&once).unwrap();
        assert_eq!(once, twice);
        assert!(all_native(&once));
    }

    #[test]
    fn test_custom_gate_rejected() {
        let mut circuit = Circuit::with_size("c", 1, 0);
        circuit
            .push(Operation::gate(GateKind::Custom("sx".into()), vec![q(0)], Vec::new()))
            .unwrap();
        let err = lower(&circuit).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedGate { ref gate, .. } if gate == "sx"));
    }

    #[test]
    fn test_loop_bodies_lowered_symbolically() {
        let body = vec![Template::gate(
            GateKind::CP,
            vec![
                QubitExpr::new("q", IndexExpr::var("i") + 1),
                QubitExpr::new("q", IndexExpr::var("i")),
            ],
            vec![ParameterExpression::symbol("i")],
        )];
        let mut circuit = Circuit::with_size("c", 3, 0);
        circuit
            .push_loop(LoopBlock::new("i", LoopBound::range(0, 2), body))
            .unwrap();

        let lowered = lower(&circuit).unwrap();
        let Operation::Loop(block) = &lowered.operations()[0] else {
            panic!("expected loop");
        };
        let names: Vec<&str> = block.body.iter().map(Template::name).collect();
        assert_eq!(names, vec!["rz", "u", "cz", "u", "rz", "u", "cz", "u", "rz"]);
    }
}
