//! Workflow tests for the CLI.
//!
//! The CLI is a binary crate, so these tests drive the same library calls
//! the commands make: read a file, resolve the pipeline config, compile,
//! and write the result back as text.

// ============================================================================
// Pipeline config files
// ============================================================================

mod config_files {
    use tweezer_compile::{CommutationRule, PipelineConfig};

    #[test]
    fn test_empty_yaml_is_default() {
        let config: PipelineConfig = serde_yaml_ng::from_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: PipelineConfig =
            serde_yaml_ng::from_str("parallelize: true\ncommutation: diagonal\n").unwrap();
        assert!(config.parallelize);
        assert!(config.fold);
        assert_eq!(config.commutation, CommutationRule::Diagonal);
        assert_eq!(config.max_iterations, PipelineConfig::default().max_iterations);
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = PipelineConfig::default()
            .with_parallelize(true)
            .with_merge_rotations(true)
            .with_max_iterations(12);
        let text = serde_yaml_ng::to_string(&config).unwrap();
        let back: PipelineConfig = serde_yaml_ng::from_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_unknown_commutation_rejected() {
        let result: Result<PipelineConfig, _> = serde_yaml_ng::from_str("commutation: sideways");
        assert!(result.is_err());
    }
}

// ============================================================================
// Circuit loading
// ============================================================================

mod circuit_loading {
    use std::fs;
    use tweezer_qasm::parse;

    #[test]
    fn test_parse_valid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bell.qasm");
        fs::write(
            &path,
            "OPENQASM 2.0;\nqreg q[2];\ncreg c[2];\nh q[0];\ncx q[0], q[1];\n",
        )
        .unwrap();

        let source = fs::read_to_string(&path).unwrap();
        let circuit = parse(&source).unwrap();
        assert_eq!(circuit.num_qubits(), 2);
        assert_eq!(circuit.depth(), 2);
    }

    #[test]
    fn test_parse_invalid_text() {
        assert!(parse("this is not a circuit").is_err());
    }

    #[test]
    fn test_parse_registers_only() {
        let circuit = parse("OPENQASM 2.0; qreg q[3];").unwrap();
        assert_eq!(circuit.num_qubits(), 3);
        assert_eq!(circuit.depth(), 0);
    }

    #[test]
    fn test_json_is_not_a_circuit() {
        assert!(parse(r#"{"circuit": "test"}"#).is_err());
    }
}

// ============================================================================
// compile → emit workflow
// ============================================================================

mod compile_workflow {
    use std::fs;
    use tweezer_compile::{CompileError, PipelineConfig, compile};
    use tweezer_ir::{Circuit, Operation};
    use tweezer_qasm::{emit, emit_schedule, parse};

    const LOOPED_QFT: &str = r#"
        OPENQASM 2.0;
        include "qelib1.inc";
        qreg q[3];
        creg c[3];
        for j in [0:3] {
            h q[j];
            for k in [j + 1:3] {
                cp(pi / 2.0 ** (k - j)) q[k], q[j];
            }
        }
        swap q[0], q[2];
        measure q -> c;
    "#;

    #[test]
    fn test_looped_file_compiles_to_native_text() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("qft3.qasm");
        fs::write(&input, LOOPED_QFT).unwrap();

        let circuit = parse(&fs::read_to_string(&input).unwrap()).unwrap();
        assert!(circuit.has_loops());

        let program = compile(&circuit, &PipelineConfig::default().with_parallelize(true)).unwrap();
        let output = dir.path().join("qft3_compiled.qasm");
        fs::write(&output, emit(&program.circuit).unwrap()).unwrap();

        let lowered = parse(&fs::read_to_string(&output).unwrap()).unwrap();
        assert!(!lowered.has_loops());
        assert_eq!(lowered.operations(), program.circuit.operations());
        assert!(
            lowered
                .iter()
                .filter_map(Operation::as_gate)
                .all(|g| matches!(g.name(), "u" | "rz" | "cz"))
        );
    }

    #[test]
    fn test_schedule_file_has_one_fence_per_layer_boundary() {
        let circuit = Circuit::qft_from_bitstring("0101", false).unwrap();
        let program = compile(&circuit, &PipelineConfig::default().with_parallelize(true)).unwrap();

        let text = emit_schedule(&program.schedule).unwrap();
        let fences = text
            .lines()
            .filter(|l| l.starts_with("barrier q[0], q[1], q[2], q[3];"))
            .count();
        assert_eq!(fences, program.schedule.num_layers() - 1);
        assert_eq!(program.stats.layers, program.schedule.num_layers());
    }

    #[test]
    fn test_symbolic_loop_cannot_be_folded() {
        let circuit = parse("OPENQASM 2.0; qreg q[2]; for i in n { h q[0]; }").unwrap();
        let err = compile(&circuit, &PipelineConfig::default()).unwrap_err();
        assert!(matches!(err, CompileError::UnboundedLoop { .. }));
    }
}
