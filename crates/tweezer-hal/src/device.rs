//! Device trait definition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use tweezer_ir::Schedule;

use crate::capability::Capabilities;
use crate::error::HalResult;
use crate::result::ExecutionResult;

/// Configuration for constructing a device.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Device name.
    pub name: String,
    /// Device-specific options (seed, qubit limit, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DeviceConfig {
    /// Create a configuration with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Add a device-specific option.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Read an option as an unsigned integer.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.extra.get(key).and_then(serde_json::Value::as_u64)
    }

    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> HalResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Something that executes layered programs.
///
/// `capabilities()` is synchronous: implementations compute it once at
/// construction. `execute` consumes a [`Schedule`] whose loops have been
/// unrolled; layers run in order, members of a layer run together.
#[async_trait]
pub trait Device: Send + Sync {
    /// Get the name of this device.
    fn name(&self) -> &str;

    /// Get the capabilities of this device.
    fn capabilities(&self) -> &Capabilities;

    /// Check a schedule against this device.
    ///
    /// The default checks qubit count and gate set via
    /// [`Capabilities::check`].
    async fn validate(&self, schedule: &Schedule) -> HalResult<ValidationResult> {
        Ok(self.capabilities().check(schedule))
    }

    /// Run a schedule `shots` times and histogram the measured bits.
    async fn execute(&self, schedule: &Schedule, shots: u32) -> HalResult<ExecutionResult>;
}

/// Result of checking a schedule against device constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationResult {
    /// The schedule can run as-is.
    Valid,
    /// The schedule cannot run on this device.
    Invalid {
        /// Reasons it is invalid.
        reasons: Vec<String>,
    },
    /// The schedule could run after lowering to the native gate set.
    RequiresTranspilation {
        /// What lowering is needed.
        details: String,
    },
}

impl ValidationResult {
    /// Check if the schedule can run as-is.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationResult::Valid => write!(f, "valid"),
            ValidationResult::Invalid { reasons } => write!(f, "invalid: {}", reasons.join("; ")),
            ValidationResult::RequiresTranspilation { details } => {
                write!(f, "requires transpilation: {details}")
            }
        }
    }
}

/// Construct a device from configuration.
pub trait DeviceFactory: Device + Sized {
    /// Create a device from configuration.
    fn from_config(config: DeviceConfig) -> HalResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Counts;
    use tweezer_ir::{Circuit, GateKind, Layer, LoopBlock, LoopBound, Operation, Qubit};

    /// Reports every shot as all zeros.
    struct AllZeros {
        caps: Capabilities,
    }

    #[async_trait]
    impl Device for AllZeros {
        fn name(&self) -> &str {
            "all_zeros"
        }

        fn capabilities(&self) -> &Capabilities {
            &self.caps
        }

        async fn execute(&self, schedule: &Schedule, shots: u32) -> HalResult<ExecutionResult> {
            let zeros = "0".repeat(schedule.num_clbits());
            let counts: Counts = [(zeros, u64::from(shots))].into_iter().collect();
            Ok(ExecutionResult::new(counts, shots))
        }
    }

    fn atoms(num_qubits: u32) -> AllZeros {
        AllZeros {
            caps: Capabilities::neutral_atom("atoms", num_qubits),
        }
    }

    fn layered(num_qubits: u32, ops: Vec<Operation>) -> Schedule {
        let circuit = Circuit::with_size("s", num_qubits, num_qubits);
        Schedule::new(&circuit, ops.into_iter().map(Layer::single).collect())
    }

    fn q(i: u32) -> Qubit {
        Qubit::new("q", i)
    }

    #[tokio::test]
    async fn test_default_validate_rejects_foreign_gate() {
        let schedule = layered(1, vec![Operation::gate(GateKind::H, vec![q(0)], vec![])]);
        let result = atoms(1).validate(&schedule).await.unwrap();
        assert_eq!(
            result,
            ValidationResult::Invalid {
                reasons: vec!["gate 'h' is not supported".into()],
            }
        );
    }

    #[tokio::test]
    async fn test_default_validate_accepts_native_schedule() {
        let schedule = layered(
            2,
            vec![
                Operation::gate(GateKind::Rz, vec![q(0)], vec![0.5]),
                Operation::gate(GateKind::CZ, vec![q(0), q(1)], vec![]),
            ],
        );
        let result = atoms(4).validate(&schedule).await.unwrap();
        assert_eq!(result, ValidationResult::Valid);
    }

    #[tokio::test]
    async fn test_default_validate_reports_width_and_loops() {
        let block = LoopBlock::new("i", LoopBound::range(0, 2), Vec::new());
        let schedule = layered(3, vec![Operation::Loop(block)]);

        let result = atoms(2).validate(&schedule).await.unwrap();
        let ValidationResult::Invalid { reasons } = result else {
            panic!("expected invalid, got {result}");
        };
        assert_eq!(reasons.len(), 2);
        assert!(reasons[0].contains("3 qubits requested, 2 available"));
        assert!(reasons[1].contains("loop over 'i'"));
    }

    #[tokio::test]
    async fn test_default_validate_asks_for_lowering() {
        let mut device = atoms(1);
        device.caps.gate_set.single_qubit.push("h".into());
        let schedule = layered(1, vec![Operation::gate(GateKind::H, vec![q(0)], vec![])]);

        let result = device.validate(&schedule).await.unwrap();
        assert_eq!(
            result,
            ValidationResult::RequiresTranspilation {
                details: "non-native gates: h".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_execute_through_trait_object() {
        let device: Box<dyn Device> = Box::new(atoms(3));
        let schedule = layered(3, Vec::new());

        let result = device.execute(&schedule, 64).await.unwrap();
        assert_eq!(device.name(), "all_zeros");
        assert_eq!(result.shots, 64);
        assert_eq!(result.counts.get("000"), 64);
    }

    #[test]
    fn test_device_config() {
        let config = DeviceConfig::new("simulator").with_extra("seed", serde_json::json!(7));
        assert_eq!(config.name, "simulator");
        assert_eq!(config.get_u64("seed"), Some(7));
        assert_eq!(config.get_u64("missing"), None);
    }

    #[test]
    fn test_device_config_from_json() {
        let config = DeviceConfig::from_json(r#"{"name": "sim", "max_qubits": 12}"#).unwrap();
        assert_eq!(config.name, "sim");
        assert_eq!(config.get_u64("max_qubits"), Some(12));
        assert!(DeviceConfig::from_json("{").is_err());
    }

    #[test]
    fn test_validation_result_is_valid() {
        assert!(ValidationResult::Valid.is_valid());
        assert!(
            !ValidationResult::Invalid {
                reasons: vec!["too many qubits".into()],
            }
            .is_valid()
        );
        let pending = ValidationResult::RequiresTranspilation {
            details: "non-native gates: h".into(),
        };
        assert!(!pending.is_valid());
        assert_eq!(pending.to_string(), "requires transpilation: non-native gates: h");
    }
}
