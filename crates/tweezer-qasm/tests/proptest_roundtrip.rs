//! Property-based tests for emit/parse round-trips.
//!
//! Circuit → text → circuit must give back the same registers and the
//! same operations, with every parameter bit-identical.

use proptest::prelude::*;
use tweezer_compile::{CommutationRule, SchedulerConfig, schedule};
use tweezer_ir::{Circuit, Clbit, GateKind, Operation, Qubit, Register};
use tweezer_qasm::{emit, emit_schedule, parse};

/// Any finite angle, including subnormals, signed zeros and huge values.
fn arb_angle() -> impl Strategy<Value = f64> {
    prop_oneof![
        any::<f64>().prop_filter("finite", |v| v.is_finite()),
        -7.0..7.0f64,
        Just(-0.0),
    ]
}

fn arb_operation(num_qubits: u32) -> impl Strategy<Value = Operation> {
    let q = move || (0..num_qubits).prop_map(|i| Qubit::new("q", i));
    let pair = move || {
        (0..num_qubits, 1..num_qubits).prop_map(move |(a, d)| {
            vec![Qubit::new("q", a), Qubit::new("q", (a + d) % num_qubits)]
        })
    };
    prop_oneof![
        q().prop_map(|q| Operation::gate(GateKind::H, vec![q], vec![])),
        (q(), arb_angle()).prop_map(|(q, t)| Operation::gate(GateKind::Rz, vec![q], vec![t])),
        (q(), arb_angle(), arb_angle(), arb_angle())
            .prop_map(|(q, a, b, c)| Operation::gate(GateKind::U, vec![q], vec![a, b, c])),
        pair().prop_map(|qs| Operation::gate(GateKind::CX, qs, vec![])),
        (pair(), arb_angle()).prop_map(|(qs, t)| Operation::gate(GateKind::CP, qs, vec![t])),
        pair().prop_map(|qs| Operation::gate(GateKind::CZ, qs, vec![])),
        pair().prop_map(Operation::barrier),
        (0..num_qubits).prop_map(|i| Operation::measure(Qubit::new("q", i), Clbit::new("c", i))),
    ]
}

/// Circuits over 2-5 qubits with a matching classical register.
fn arb_circuit() -> impl Strategy<Value = Circuit> {
    (2_u32..=5).prop_flat_map(|n| {
        prop::collection::vec(arb_operation(n), 0..25).prop_map(move |ops| {
            Circuit::from_operations(
                "roundtrip",
                vec![Register::new("q", n)],
                vec![Register::new("c", n)],
                ops,
            )
            .unwrap()
        })
    })
}

fn param_bits(circuit: &Circuit) -> Vec<u64> {
    circuit
        .iter()
        .filter_map(Operation::as_gate)
        .flat_map(|g| g.params.iter().map(|p| p.to_bits()))
        .collect()
}

proptest! {
    #[test]
    fn prop_roundtrip_preserves_operations(circuit in arb_circuit()) {
        let text = emit(&circuit).unwrap();
        let parsed = parse(&text).unwrap();

        prop_assert_eq!(parsed.qregs(), circuit.qregs());
        prop_assert_eq!(parsed.cregs(), circuit.cregs());
        prop_assert_eq!(parsed.operations(), circuit.operations());
        prop_assert_eq!(param_bits(&parsed), param_bits(&circuit));
    }

    #[test]
    fn prop_emit_is_a_fixpoint(circuit in arb_circuit()) {
        let text = emit(&circuit).unwrap();
        let again = emit(&parse(&text).unwrap()).unwrap();
        prop_assert_eq!(text, again);
    }

    #[test]
    fn prop_looped_qft_roundtrip(n in 1_u32..=8) {
        let looped = Circuit::qft_looped(n).unwrap();
        let parsed = parse(&emit(&looped).unwrap()).unwrap();
        prop_assert_eq!(parsed.operations(), looped.operations());
    }

    #[test]
    fn prop_schedule_text_keeps_layer_contents(circuit in arb_circuit(), diagonal in any::<bool>()) {
        let rule = if diagonal { CommutationRule::Diagonal } else { CommutationRule::Disjoint };
        let sched = schedule(&circuit, &SchedulerConfig::parallel(rule)).unwrap();
        let text = emit_schedule(&sched).unwrap();

        let fences = text.lines().filter(|l| l.starts_with("barrier ")).count();
        let layers = sched.num_layers();
        prop_assert_eq!(fences, layers.saturating_sub(1));

        let parsed = parse(&text).unwrap();
        let ops: Vec<&Operation> = parsed.iter().filter(|op| !op.is_barrier()).collect();
        prop_assert_eq!(ops, sched.flatten().collect::<Vec<_>>());
    }
}
