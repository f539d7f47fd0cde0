//! Simulator device implementation.

use async_trait::async_trait;
use rand::SeedableRng;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::{Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, instrument};

use tweezer_hal::{
    Capabilities, Counts, Device, DeviceConfig, DeviceFactory, ExecutionResult, HalError,
    HalResult,
};
use tweezer_ir::{Clbit, Operation, Qubit, Register, Schedule};

use crate::statevector::Statevector;

const DEFAULT_MAX_QUBITS: u32 = 20;

/// Local statevector simulator.
///
/// Layers execute in order; operations inside a layer execute in placement
/// order, which is equivalent because they commute. Mid-circuit
/// measurements collapse the state.
pub struct SimulatorDevice {
    name: String,
    capabilities: Capabilities,
    max_qubits: u32,
    rng: Mutex<StdRng>,
}

/// One step of a lowered program with qubits and clbits resolved to
/// positions.
enum Step<'a> {
    Gate(&'a Operation, Vec<usize>),
    Measure { qubit: usize, clbit: usize },
}

impl SimulatorDevice {
    /// A simulator seeded from the operating system.
    pub fn new() -> Self {
        Self::build("simulator", DEFAULT_MAX_QUBITS, StdRng::from_entropy())
    }

    /// A simulator with a custom qubit limit.
    pub fn with_max_qubits(max_qubits: u32) -> Self {
        Self::build("simulator", max_qubits, StdRng::from_entropy())
    }

    /// Reseed for reproducible sampling.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    fn build(name: impl Into<String>, max_qubits: u32, rng: StdRng) -> Self {
        Self {
            name: name.into(),
            capabilities: Capabilities::simulator(max_qubits),
            max_qubits,
            rng: Mutex::new(rng),
        }
    }

    fn check_request(&self, schedule: &Schedule, shots: u32) -> HalResult<()> {
        if shots == 0 || shots > self.capabilities.max_shots {
            return Err(HalError::InvalidShots(format!(
                "{shots} shots requested, allowed range is 1..={}",
                self.capabilities.max_shots
            )));
        }
        if schedule.num_qubits() > self.max_qubits as usize {
            return Err(HalError::CircuitTooLarge(format!(
                "Schedule has {} qubits but simulator only supports {}",
                schedule.num_qubits(),
                self.max_qubits
            )));
        }
        Ok(())
    }

    /// Resolve every operation to positions, rejecting loops.
    fn lower<'a>(&self, schedule: &'a Schedule) -> HalResult<Vec<Step<'a>>> {
        let qubit_pos: FxHashMap<Qubit, usize> = schedule
            .qubits()
            .into_iter()
            .enumerate()
            .map(|(i, q)| (q, i))
            .collect();
        let clbit_pos: FxHashMap<Clbit, usize> = schedule
            .clbits()
            .into_iter()
            .enumerate()
            .map(|(i, c)| (c, i))
            .collect();

        let qubit = |q: &Qubit| {
            qubit_pos
                .get(q)
                .copied()
                .ok_or_else(|| HalError::InvalidProgram(format!("undeclared qubit {q}")))
        };

        let mut steps = Vec::with_capacity(schedule.num_operations());
        for op in schedule.flatten() {
            match op {
                Operation::Gate(gate) => {
                    let positions = gate.qubits.iter().map(qubit).collect::<HalResult<_>>()?;
                    steps.push(Step::Gate(op, positions));
                }
                Operation::Measure { qubit: q, clbit } => {
                    let clbit = clbit_pos.get(clbit).copied().ok_or_else(|| {
                        HalError::InvalidProgram(format!("undeclared clbit {clbit}"))
                    })?;
                    steps.push(Step::Measure {
                        qubit: qubit(q)?,
                        clbit,
                    });
                }
                Operation::Barrier { .. } => {}
                Operation::Loop(block) => {
                    return Err(HalError::InvalidProgram(format!(
                        "loop over '{}' must be unrolled before execution",
                        block.var
                    )));
                }
            }
        }
        Ok(steps)
    }

    /// Run the simulation synchronously.
    #[instrument(skip(self, schedule), fields(schedule = %schedule.name()))]
    fn run_simulation(&self, schedule: &Schedule, shots: u32) -> HalResult<ExecutionResult> {
        let start = Instant::now();
        let num_qubits = schedule.num_qubits();
        debug!(
            "Starting simulation: {} qubits, {} layers, {} shots",
            num_qubits,
            schedule.num_layers(),
            shots
        );

        let steps = self.lower(schedule)?;
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut counts = Counts::new();
        let mut memory = vec![false; schedule.num_clbits()];

        if measurements_are_terminal(&steps) {
            debug!("Measurements are terminal, sampling the final state");
            let mut sv = Statevector::new(num_qubits);
            apply_gates(&mut sv, &steps)?;
            let dist = WeightedIndex::new(sv.probabilities())
                .map_err(|e| HalError::Backend(format!("degenerate final state: {e}")))?;

            for shot in 0..shots {
                let outcome = dist.sample(&mut *rng);
                for step in &steps {
                    if let Step::Measure { qubit, clbit } = *step {
                        memory[clbit] = outcome & (1 << qubit) != 0;
                    }
                }
                counts.insert(bitstring(schedule.cregs(), &memory), 1);
                log_progress(shot);
            }
        } else {
            for shot in 0..shots {
                let mut sv = Statevector::new(num_qubits);
                memory.fill(false);
                for step in &steps {
                    match *step {
                        Step::Gate(op, ref positions) => apply_step(&mut sv, op, positions)?,
                        Step::Measure { qubit, clbit } => {
                            memory[clbit] = sv.measure(qubit, &mut *rng);
                        }
                    }
                }
                counts.insert(bitstring(schedule.cregs(), &memory), 1);
                log_progress(shot);
            }
        }

        let elapsed = start.elapsed();
        debug!("Simulation completed in {:?}", elapsed);

        Ok(ExecutionResult::new(counts, shots).with_execution_time(elapsed.as_millis() as u64))
    }
}

impl Default for SimulatorDevice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Device for SimulatorDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    #[instrument(skip(self, schedule))]
    async fn execute(&self, schedule: &Schedule, shots: u32) -> HalResult<ExecutionResult> {
        self.check_request(schedule, shots)?;
        self.run_simulation(schedule, shots)
    }
}

impl DeviceFactory for SimulatorDevice {
    fn from_config(config: DeviceConfig) -> HalResult<Self> {
        let max_qubits = config
            .get_u64("max_qubits")
            .map_or(Ok(DEFAULT_MAX_QUBITS), u32::try_from)
            .map_err(|_| HalError::Backend("max_qubits does not fit in u32".into()))?;
        let rng = config
            .get_u64("seed")
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Ok(Self::build(config.name, max_qubits, rng))
    }
}

/// True when no gate touches a qubit after it has been measured.
fn measurements_are_terminal(steps: &[Step<'_>]) -> bool {
    let mut measured = FxHashSet::default();
    for step in steps {
        match step {
            Step::Measure { qubit, .. } => {
                measured.insert(*qubit);
            }
            Step::Gate(_, positions) => {
                if positions.iter().any(|q| measured.contains(q)) {
                    return false;
                }
            }
        }
    }
    true
}

fn apply_gates(sv: &mut Statevector, steps: &[Step<'_>]) -> HalResult<()> {
    for step in steps {
        if let Step::Gate(op, positions) = step {
            apply_step(sv, op, positions)?;
        }
    }
    Ok(())
}

fn apply_step(sv: &mut Statevector, op: &Operation, positions: &[usize]) -> HalResult<()> {
    match op.as_gate() {
        Some(gate) => sv.apply_gate(&gate.kind, positions, &gate.params),
        None => Ok(()),
    }
}

/// Registers in declaration order separated by a space, bit 0 rightmost.
fn bitstring(cregs: &[Register], memory: &[bool]) -> String {
    let mut offset = 0;
    let mut parts = Vec::with_capacity(cregs.len());
    for reg in cregs {
        let size = reg.size as usize;
        let bits: String = memory[offset..offset + size]
            .iter()
            .rev()
            .map(|&b| if b { '1' } else { '0' })
            .collect();
        parts.push(bits);
        offset += size;
    }
    parts.join(" ")
}

fn log_progress(shot: u32) {
    if shot > 0 && shot % 1000 == 0 {
        debug!("Completed {} shots", shot);
    }
}
