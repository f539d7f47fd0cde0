//! Tweezer Hardware Abstraction Layer
//!
//! A common interface for anything that runs compiled schedules: the local
//! statevector simulator today, neutral-atom hardware behind the same trait.
//!
//! # Overview
//!
//! - [`Device`]: validate and execute a [`Schedule`](tweezer_ir::Schedule)
//! - [`Capabilities`] / [`GateSet`]: qubit count, gate support, shot limits
//! - [`ExecutionResult`] / [`Counts`]: the measured histogram
//!
//! # Example: Implementing a Device
//!
//! ```rust
//! use async_trait::async_trait;
//! use tweezer_hal::{Capabilities, Counts, Device, ExecutionResult, HalResult};
//! use tweezer_ir::Schedule;
//!
//! struct AllZeros {
//!     caps: Capabilities,
//! }
//!
//! #[async_trait]
//! impl Device for AllZeros {
//!     fn name(&self) -> &str {
//!         "all_zeros"
//!     }
//!
//!     fn capabilities(&self) -> &Capabilities {
//!         &self.caps
//!     }
//!
//!     async fn execute(&self, schedule: &Schedule, shots: u32) -> HalResult<ExecutionResult> {
//!         let zeros = "0".repeat(schedule.num_clbits());
//!         let counts: Counts = [(zeros, u64::from(shots))].into_iter().collect();
//!         Ok(ExecutionResult::new(counts, shots))
//!     }
//! }
//!
//! let device = AllZeros { caps: Capabilities::neutral_atom("zeros", 4) };
//! assert_eq!(device.name(), "all_zeros");
//! ```

pub mod capability;
pub mod device;
pub mod error;
pub mod result;

pub use capability::{Capabilities, GateSet};
pub use device::{Device, DeviceConfig, DeviceFactory, ValidationResult};
pub use error::{HalError, HalResult};
pub use result::{Counts, ExecutionResult};
