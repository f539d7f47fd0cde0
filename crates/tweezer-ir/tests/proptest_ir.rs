//! Property-based tests for index arithmetic and circuit validation.

use proptest::prelude::*;
use tweezer_ir::{Circuit, Clbit, GateKind, IndexExpr, IrError, Operation, Qubit, Register};

/// `a*i + b*j + c` with coefficients small enough to never overflow.
fn arb_affine() -> impl Strategy<Value = (i64, i64, i64)> {
    (-50_i64..50, -50_i64..50, -1000_i64..1000)
}

fn affine(a: i64, b: i64, c: i64) -> IndexExpr {
    IndexExpr::var("i").scaled(a) + IndexExpr::var("j").scaled(b) + c
}

fn arb_operation(num_qubits: u32) -> impl Strategy<Value = Operation> {
    let q = move || (0..num_qubits).prop_map(|i| Qubit::new("q", i));
    prop_oneof![
        q().prop_map(|q| Operation::gate(GateKind::H, vec![q], vec![])),
        (q(), -3.0..3.0f64).prop_map(|(q, t)| Operation::gate(GateKind::Rz, vec![q], vec![t])),
        (0..num_qubits).prop_map(|i| Operation::measure(Qubit::new("q", i), Clbit::new("c", i))),
    ]
}

proptest! {
    #[test]
    fn prop_bind_evaluates_affine_form(
        (a, b, c) in arb_affine(),
        i in -10_000_i64..10_000,
        j in -10_000_i64..10_000,
    ) {
        let e = affine(a, b, c);
        let partial = e.bind("i", i).unwrap();
        prop_assert!(!partial.mentions("i"));

        let value = partial.bind("j", j).unwrap().as_constant();
        prop_assert_eq!(value, Some(a * i + b * j + c));
    }

    #[test]
    fn prop_bind_order_does_not_matter(
        (a, b, c) in arb_affine(),
        i in -100_i64..100,
        j in -100_i64..100,
    ) {
        let e = affine(a, b, c);
        let ij = e.bind("i", i).unwrap().bind("j", j).unwrap();
        let ji = e.bind("j", j).unwrap().bind("i", i).unwrap();
        prop_assert_eq!(ij, ji);
    }

    #[test]
    fn prop_checked_add_matches_wide_arithmetic(x in any::<i64>(), y in any::<i64>()) {
        let sum = IndexExpr::constant(x).checked_add(&IndexExpr::constant(y));
        let wide = i128::from(x) + i128::from(y);
        let expected = i64::try_from(wide).ok().map(IndexExpr::constant);
        prop_assert_eq!(sum, expected);
    }

    #[test]
    fn prop_bind_overflow_is_reported(coeff in 2_i64..1000, value in (i64::MAX / 2 + 1)..i64::MAX) {
        let e = IndexExpr::var("i").scaled(coeff);
        let is_overflow = matches!(e.bind("i", value), Err(IrError::IndexOverflow(_)));
        prop_assert!(is_overflow);
    }

    #[test]
    fn prop_valid_operations_build(
        ops in (1_u32..=5).prop_flat_map(|n| {
            prop::collection::vec(arb_operation(n), 0..20).prop_map(move |ops| (n, ops))
        }),
    ) {
        let (n, ops) = ops;
        let circuit = Circuit::from_operations(
            "ok",
            vec![Register::new("q", n)],
            vec![Register::new("c", n)],
            ops.clone(),
        )
        .unwrap();
        prop_assert_eq!(circuit.operations(), ops.as_slice());
    }

    #[test]
    fn prop_one_bad_bit_rejects_the_whole_circuit(
        n in 1_u32..=5,
        before in 0_usize..10,
        extra in 0_u32..3,
    ) {
        let mut ops: Vec<Operation> = (0..before)
            .map(|k| Operation::gate(GateKind::H, vec![Qubit::new("q", k as u32 % n)], vec![]))
            .collect();
        ops.push(Operation::measure(Qubit::new("q", 0), Clbit::new("c", n + extra)));

        let result = Circuit::from_operations(
            "bad",
            vec![Register::new("q", n)],
            vec![Register::new("c", n)],
            ops,
        );
        let is_unknown = matches!(result, Err(IrError::UnknownResource { .. }));
        prop_assert!(is_unknown);
    }

    #[test]
    fn prop_deserialize_rejects_out_of_range_bits(n in 1_u32..=5, extra in 0_u32..3) {
        let mut circuit = Circuit::with_size("m", 1, n);
        circuit.measure(Qubit::new("q", 0), Clbit::new("c", n - 1)).unwrap();

        let json = serde_json::to_string(&circuit).unwrap();
        let edited = json.replace(
            &format!(r#""register":"c","index":{}"#, n - 1),
            &format!(r#""register":"c","index":{}"#, n + extra),
        );
        prop_assert!(serde_json::from_str::<Circuit>(&edited).is_err());
        prop_assert!(serde_json::from_str::<Circuit>(&json).is_ok());
    }
}
