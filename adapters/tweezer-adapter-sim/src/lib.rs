//! Tweezer Local Statevector Simulator
//!
//! An exact statevector [`Device`](tweezer_hal::Device) for testing compiled
//! schedules. It accepts every canonical gate as well as the native
//! `{u, rz, cz}` set, so a program can be compared before and after
//! lowering.
//!
//! # Sampling
//!
//! When no gate follows a measurement on the same qubit, the final state is
//! computed once and sampled per shot. Otherwise every shot re-runs the
//! program and collapses the state at each measurement.
//!
//! # Memory
//!
//! | Qubits | Memory |
//! |--------|--------|
//! | 10 | ~16 KB |
//! | 15 | ~512 KB |
//! | 20 | ~16 MB |
//! | 25 | ~512 MB |
//!
//! # Example
//!
//! ```rust
//! use tweezer_adapter_sim::SimulatorDevice;
//! use tweezer_compile::{PipelineConfig, compile};
//! use tweezer_hal::Device;
//! use tweezer_ir::Circuit;
//!
//! # let rt = tokio::runtime::Runtime::new().unwrap();
//! # rt.block_on(async {
//! let circuit = Circuit::qft_from_bitstring("01", false).unwrap();
//! let program = compile(&circuit, &PipelineConfig::default()).unwrap();
//!
//! let device = SimulatorDevice::new().with_seed(7);
//! let result = device.execute(&program.schedule, 100).await.unwrap();
//! assert_eq!(result.counts.total_shots(), 100);
//! # });
//! ```

mod simulator;
pub mod statevector;

pub use simulator::SimulatorDevice;
pub use statevector::Statevector;
