//! Device capability introspection.

use serde::{Deserialize, Serialize};

use tweezer_ir::{Operation, Schedule};

use crate::device::ValidationResult;

/// Hardware capabilities of a device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capabilities {
    /// Name of the device.
    pub name: String,
    /// Number of qubits (trapped atoms) available.
    pub num_qubits: u32,
    /// Supported gate set.
    pub gate_set: GateSet,
    /// Maximum number of shots per execution.
    pub max_shots: u32,
    /// Whether this is a simulator.
    pub is_simulator: bool,
    /// Additional capability flags, e.g. `"statevector"`, `"neutral_atom"`,
    /// `"mid_circuit_measurement"`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Capabilities {
    /// Capabilities for a statevector simulator.
    pub fn simulator(num_qubits: u32) -> Self {
        Self {
            name: "simulator".into(),
            num_qubits,
            gate_set: GateSet::universal(),
            max_shots: 100_000,
            is_simulator: true,
            features: vec![
                "statevector".into(),
                "mid_circuit_measurement".into(),
            ],
        }
    }

    /// Capabilities for a neutral-atom tweezer array.
    pub fn neutral_atom(name: impl Into<String>, num_qubits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            gate_set: GateSet::neutral_atom(),
            max_shots: 10_000,
            is_simulator: false,
            features: vec!["neutral_atom".into()],
        }
    }

    /// Check whether a feature flag is present.
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }

    /// Check a schedule against these capabilities.
    pub fn check(&self, schedule: &Schedule) -> ValidationResult {
        let mut reasons = Vec::new();
        let mut foreign = Vec::new();

        if schedule.num_qubits() > self.num_qubits as usize {
            reasons.push(format!(
                "{} qubits requested, {} available",
                schedule.num_qubits(),
                self.num_qubits
            ));
        }

        for op in schedule.flatten() {
            match op {
                Operation::Gate(g) if !self.gate_set.contains(g.name()) => {
                    reasons.push(format!("gate '{}' is not supported", g.name()));
                }
                Operation::Gate(g) if !self.gate_set.is_native(g.name()) => {
                    if !foreign.iter().any(|n: &String| n == g.name()) {
                        foreign.push(g.name().to_string());
                    }
                }
                Operation::Loop(block) => {
                    reasons.push(format!("loop over '{}' was not unrolled", block.var));
                }
                _ => {}
            }
        }

        if !reasons.is_empty() {
            ValidationResult::Invalid { reasons }
        } else if !foreign.is_empty() {
            ValidationResult::RequiresTranspilation {
                details: format!("non-native gates: {}", foreign.join(", ")),
            }
        } else {
            ValidationResult::Valid
        }
    }
}

/// Gates a device accepts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GateSet {
    /// Single-qubit gates supported.
    pub single_qubit: Vec<String>,
    /// Two-qubit gates supported.
    pub two_qubit: Vec<String>,
    /// Three-qubit gates supported.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub three_qubit: Vec<String>,
    /// Native gates (execute without decomposition).
    pub native: Vec<String>,
}

impl GateSet {
    /// The neutral-atom native set: global `u`, local `rz`, Rydberg `cz`.
    pub fn neutral_atom() -> Self {
        Self {
            single_qubit: vec!["u".into(), "rz".into()],
            two_qubit: vec!["cz".into()],
            three_qubit: vec![],
            native: vec!["u".into(), "rz".into(), "cz".into()],
        }
    }

    /// Every canonical gate. Native set left empty: everything runs as-is.
    pub fn universal() -> Self {
        let names = |list: &[&str]| list.iter().map(|s| (*s).to_string()).collect();
        Self {
            single_qubit: names(&[
                "id", "h", "x", "y", "z", "s", "sdg", "t", "tdg", "rx", "ry", "rz", "p", "u",
            ]),
            two_qubit: names(&["cx", "cy", "cz", "cp", "crz", "swap"]),
            three_qubit: names(&["ccx"]),
            native: vec![],
        }
    }

    /// Check if a gate is supported.
    pub fn contains(&self, gate: &str) -> bool {
        self.single_qubit.iter().any(|g| g == gate)
            || self.two_qubit.iter().any(|g| g == gate)
            || self.three_qubit.iter().any(|g| g == gate)
    }

    /// Check if a gate is native (executes without decomposition).
    ///
    /// If the `native` list is empty, all supported gates are considered
    /// native.
    pub fn is_native(&self, gate: &str) -> bool {
        if self.native.is_empty() {
            self.contains(gate)
        } else {
            self.native.iter().any(|g| g == gate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tweezer_ir::{Circuit, GateKind, Layer, Qubit};

    fn schedule_of(circuit: &Circuit) -> Schedule {
        Schedule::new(circuit, circuit.iter().cloned().map(Layer::single).collect())
    }

    #[test]
    fn test_neutral_atom_gate_set() {
        let gates = GateSet::neutral_atom();
        assert!(gates.is_native("cz"));
        assert!(!gates.contains("cx"));
    }

    #[test]
    fn test_universal_treats_everything_as_native() {
        let gates = GateSet::universal();
        assert!(gates.is_native("ccx"));
        assert!(!gates.contains("sx"));
    }

    #[test]
    fn test_check_schedule() {
        let caps = Capabilities::neutral_atom("array", 4);

        let mut native = Circuit::with_size("n", 2, 0);
        native.cz(Qubit::new("q", 0), Qubit::new("q", 1)).unwrap();
        assert!(caps.check(&schedule_of(&native)).is_valid());

        let mut too_big = Circuit::with_size("big", 8, 0);
        too_big.rz(0.1, Qubit::new("q", 7)).unwrap();
        assert!(matches!(
            caps.check(&schedule_of(&too_big)),
            ValidationResult::Invalid { .. }
        ));

        let mut custom = Circuit::with_size("c", 1, 0);
        custom
            .push(Operation::gate(
                GateKind::Custom("sx".into()),
                vec![Qubit::new("q", 0)],
                vec![],
            ))
            .unwrap();
        assert!(!caps.check(&schedule_of(&custom)).is_valid());
    }

    #[test]
    fn test_simulator_accepts_canonical_gates() {
        let caps = Capabilities::simulator(4);
        let circuit = Circuit::qft(3).unwrap();
        assert!(caps.check(&schedule_of(&circuit)).is_valid());
        assert!(caps.has_feature("statevector"));
    }
}
