//! Statevector simulation engine.
//!
//! Qubit `k` is bit `k` of the amplitude index. Every gate reduces to one of
//! three kernels: a (possibly controlled) 2x2 matrix on a target bit, a
//! phase on the indices where a set of bits are all one, or a (possibly
//! controlled) exchange of two bits.

use num_complex::Complex64;
use rand::Rng;
use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, FRAC_PI_4};

use tweezer_hal::{HalError, HalResult};
use tweezer_ir::GateKind;

type Matrix = [[Complex64; 2]; 2];

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// A pure state over `num_qubits` qubits.
#[derive(Debug, Clone, PartialEq)]
pub struct Statevector {
    amplitudes: Vec<Complex64>,
    num_qubits: usize,
}

impl Statevector {
    /// The all-zeros state.
    pub fn new(num_qubits: usize) -> Self {
        Self::basis(num_qubits, 0)
    }

    /// The computational basis state `|index⟩`.
    ///
    /// `index` is reduced modulo the dimension.
    pub fn basis(num_qubits: usize, index: usize) -> Self {
        let dim = 1usize << num_qubits;
        let mut amplitudes = vec![ZERO; dim];
        amplitudes[index % dim] = ONE;
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Amplitudes indexed by basis state.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// Born-rule probabilities indexed by basis state.
    pub fn probabilities(&self) -> Vec<f64> {
        self.amplitudes.iter().map(Complex64::norm_sqr).collect()
    }

    /// `⟨self|other⟩`.
    pub fn inner(&self, other: &Statevector) -> Complex64 {
        self.amplitudes
            .iter()
            .zip(&other.amplitudes)
            .map(|(a, b)| a.conj() * b)
            .sum()
    }

    /// Apply gate `kind` to the given qubit indices.
    ///
    /// Operands are checked against the gate's arity and this state's width.
    pub fn apply_gate(&mut self, kind: &GateKind, qubits: &[usize], params: &[f64]) -> HalResult<()> {
        self.check_operands(kind, qubits, params)?;
        let q = qubits;
        match kind {
            GateKind::Id => {}
            GateKind::H => self.apply_matrix(q[0], 0, hadamard()),
            GateKind::X => self.apply_matrix(q[0], 0, pauli_x()),
            GateKind::Y => self.apply_matrix(q[0], 0, pauli_y()),
            GateKind::Z => self.apply_phase(bit(q[0]), -ONE),
            GateKind::S => self.apply_phase(bit(q[0]), Complex64::cis(FRAC_PI_2)),
            GateKind::Sdg => self.apply_phase(bit(q[0]), Complex64::cis(-FRAC_PI_2)),
            GateKind::T => self.apply_phase(bit(q[0]), Complex64::cis(FRAC_PI_4)),
            GateKind::Tdg => self.apply_phase(bit(q[0]), Complex64::cis(-FRAC_PI_4)),
            GateKind::P => self.apply_phase(bit(q[0]), Complex64::cis(params[0])),
            GateKind::Rx => self.apply_matrix(q[0], 0, rx(params[0])),
            GateKind::Ry => self.apply_matrix(q[0], 0, ry(params[0])),
            GateKind::Rz => self.apply_matrix(q[0], 0, rz(params[0])),
            GateKind::U => self.apply_matrix(q[0], 0, u(params[0], params[1], params[2])),
            GateKind::CX => self.apply_matrix(q[1], bit(q[0]), pauli_x()),
            GateKind::CY => self.apply_matrix(q[1], bit(q[0]), pauli_y()),
            GateKind::CZ => self.apply_phase(bit(q[0]) | bit(q[1]), -ONE),
            GateKind::CP => self.apply_phase(bit(q[0]) | bit(q[1]), Complex64::cis(params[0])),
            GateKind::CRz => self.apply_matrix(q[1], bit(q[0]), rz(params[0])),
            GateKind::Swap => self.apply_exchange(q[0], q[1], 0),
            GateKind::CCX => self.apply_matrix(q[2], bit(q[0]) | bit(q[1]), pauli_x()),
            GateKind::Custom(name) => {
                return Err(HalError::Unsupported(format!(
                    "gate '{name}' has no simulator semantics"
                )));
            }
        }
        Ok(())
    }

    /// Measure `qubit`, collapse the state, and return the outcome.
    pub fn measure<R: Rng + ?Sized>(&mut self, qubit: usize, rng: &mut R) -> bool {
        let mask = bit(qubit);
        let p_one: f64 = self
            .amplitudes
            .iter()
            .enumerate()
            .filter(|(i, _)| i & mask != 0)
            .map(|(_, a)| a.norm_sqr())
            .sum();
        let outcome = rng.gen_bool(p_one.clamp(0.0, 1.0));
        let kept = if outcome { p_one } else { 1.0 - p_one };
        let scale = if kept > 0.0 { kept.sqrt().recip() } else { 0.0 };

        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if (i & mask != 0) == outcome {
                *amp *= scale;
            } else {
                *amp = ZERO;
            }
        }
        outcome
    }

    /// Draw a basis state without collapsing.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        let r: f64 = rng.gen_range(0.0..1.0);
        let mut cumulative = 0.0;
        for (i, amp) in self.amplitudes.iter().enumerate() {
            cumulative += amp.norm_sqr();
            if r < cumulative {
                return i;
            }
        }
        // Rounding can leave the total a hair under one.
        self.amplitudes.len() - 1
    }

    fn check_operands(&self, kind: &GateKind, qubits: &[usize], params: &[f64]) -> HalResult<()> {
        match kind.num_qubits() {
            Some(arity) if qubits.len() != arity => {
                return Err(HalError::InvalidProgram(format!(
                    "gate '{kind}' expects {arity} qubits, got {}",
                    qubits.len()
                )));
            }
            _ => {}
        }
        match kind.num_params() {
            Some(expected) if params.len() != expected => {
                return Err(HalError::InvalidProgram(format!(
                    "gate '{kind}' expects {expected} parameters, got {}",
                    params.len()
                )));
            }
            _ => {}
        }
        for (pos, &q) in qubits.iter().enumerate() {
            if q >= self.num_qubits {
                return Err(HalError::InvalidProgram(format!(
                    "qubit index {q} out of range for {} qubits",
                    self.num_qubits
                )));
            }
            if qubits[..pos].contains(&q) {
                return Err(HalError::InvalidProgram(format!(
                    "gate '{kind}' repeats qubit index {q}"
                )));
            }
        }
        Ok(())
    }

    /// Apply `m` to `target` on every index where all `controls` bits are set.
    fn apply_matrix(&mut self, target: usize, controls: usize, m: Matrix) {
        let t = bit(target);
        for i in 0..self.amplitudes.len() {
            if i & t != 0 || i & controls != controls {
                continue;
            }
            let j = i | t;
            let (a, b) = (self.amplitudes[i], self.amplitudes[j]);
            self.amplitudes[i] = m[0][0] * a + m[0][1] * b;
            self.amplitudes[j] = m[1][0] * a + m[1][1] * b;
        }
    }

    /// Multiply by `phase` every amplitude whose index has all `mask` bits set.
    fn apply_phase(&mut self, mask: usize, phase: Complex64) {
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & mask == mask {
                *amp *= phase;
            }
        }
    }

    /// Exchange bits `a` and `b` on every index where all `controls` are set.
    fn apply_exchange(&mut self, a: usize, b: usize, controls: usize) {
        let (ma, mb) = (bit(a), bit(b));
        for i in 0..self.amplitudes.len() {
            if i & ma != 0 && i & mb == 0 && i & controls == controls {
                self.amplitudes.swap(i, (i & !ma) | mb);
            }
        }
    }
}

fn bit(qubit: usize) -> usize {
    1 << qubit
}

fn hadamard() -> Matrix {
    let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
    [[h, h], [h, -h]]
}

fn pauli_x() -> Matrix {
    [[ZERO, ONE], [ONE, ZERO]]
}

fn pauli_y() -> Matrix {
    [[ZERO, -I], [I, ZERO]]
}

fn rx(theta: f64) -> Matrix {
    let (s, c) = (theta / 2.0).sin_cos();
    let c = Complex64::new(c, 0.0);
    let mis = Complex64::new(0.0, -s);
    [[c, mis], [mis, c]]
}

fn ry(theta: f64) -> Matrix {
    let (s, c) = (theta / 2.0).sin_cos();
    [
        [Complex64::new(c, 0.0), Complex64::new(-s, 0.0)],
        [Complex64::new(s, 0.0), Complex64::new(c, 0.0)],
    ]
}

fn rz(theta: f64) -> Matrix {
    [
        [Complex64::cis(-theta / 2.0), ZERO],
        [ZERO, Complex64::cis(theta / 2.0)],
    ]
}

/// `U(θ, φ, λ) = [[cos θ/2, -e^{iλ} sin θ/2], [e^{iφ} sin θ/2, e^{i(φ+λ)} cos θ/2]]`.
fn u(theta: f64, phi: f64, lambda: f64) -> Matrix {
    let (s, c) = (theta / 2.0).sin_cos();
    [
        [Complex64::new(c, 0.0), -Complex64::cis(lambda) * s],
        [Complex64::cis(phi) * s, Complex64::cis(phi + lambda) * c],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::f64::consts::PI;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert!(approx_eq(sv.amplitudes()[0], ONE));
        assert!(sv.amplitudes()[1..].iter().all(|a| approx_eq(*a, ZERO)));
    }

    #[test]
    fn test_hadamard() {
        let mut sv = Statevector::new(1);
        sv.apply_gate(&GateKind::H, &[0], &[]).unwrap();
        let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
        assert!(approx_eq(sv.amplitudes()[0], h));
        assert!(approx_eq(sv.amplitudes()[1], h));
    }

    #[test]
    fn test_bell_state() {
        let mut sv = Statevector::new(2);
        sv.apply_gate(&GateKind::H, &[0], &[]).unwrap();
        sv.apply_gate(&GateKind::CX, &[0, 1], &[]).unwrap();

        let probs = sv.probabilities();
        assert!((probs[0] - 0.5).abs() < 1e-10);
        assert!(probs[1].abs() < 1e-10);
        assert!(probs[2].abs() < 1e-10);
        assert!((probs[3] - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_u_matches_named_gates() {
        // U(π/2, 0, π) is H; U(π, 0, π) is X.
        let mut via_u = Statevector::basis(1, 1);
        via_u.apply_gate(&GateKind::U, &[0], &[PI / 2.0, 0.0, PI]).unwrap();
        let mut via_h = Statevector::basis(1, 1);
        via_h.apply_gate(&GateKind::H, &[0], &[]).unwrap();
        assert!(approx_eq(via_u.inner(&via_h), ONE));

        let mut flip = Statevector::new(1);
        flip.apply_gate(&GateKind::U, &[0], &[PI, 0.0, PI]).unwrap();
        assert!((flip.probabilities()[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_controlled_gates_respect_control() {
        // Control q0 clear: nothing happens.
        let mut sv = Statevector::basis(3, 0b000);
        sv.apply_gate(&GateKind::CX, &[0, 1], &[]).unwrap();
        assert_eq!(sv, Statevector::basis(3, 0b000));

        let mut sv = Statevector::basis(3, 0b011);
        sv.apply_gate(&GateKind::CCX, &[0, 1, 2], &[]).unwrap();
        assert!(approx_eq(sv.amplitudes()[0b111], ONE));

        let mut sv = Statevector::basis(2, 0b11);
        sv.apply_gate(&GateKind::CP, &[0, 1], &[PI / 4.0]).unwrap();
        assert!(approx_eq(sv.amplitudes()[0b11], Complex64::cis(PI / 4.0)));
    }

    #[test]
    fn test_swap() {
        let mut sv = Statevector::basis(3, 0b001);
        sv.apply_gate(&GateKind::Swap, &[0, 2], &[]).unwrap();
        assert!(approx_eq(sv.amplitudes()[0b100], ONE));
    }

    #[test]
    fn test_operand_checks() {
        let mut sv = Statevector::new(2);
        assert!(matches!(
            sv.apply_gate(&GateKind::CZ, &[0], &[]),
            Err(HalError::InvalidProgram(_))
        ));
        assert!(matches!(
            sv.apply_gate(&GateKind::CZ, &[1, 1], &[]),
            Err(HalError::InvalidProgram(_))
        ));
        assert!(matches!(
            sv.apply_gate(&GateKind::Rz, &[0], &[]),
            Err(HalError::InvalidProgram(_))
        ));
        assert!(matches!(
            sv.apply_gate(&GateKind::H, &[2], &[]),
            Err(HalError::InvalidProgram(_))
        ));
        assert!(matches!(
            sv.apply_gate(&GateKind::Custom("sx".into()), &[0], &[]),
            Err(HalError::Unsupported(_))
        ));
    }

    #[test]
    fn test_measure_collapses() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut sv = Statevector::new(2);
        sv.apply_gate(&GateKind::H, &[0], &[]).unwrap();
        sv.apply_gate(&GateKind::CX, &[0, 1], &[]).unwrap();

        let first = sv.measure(0, &mut rng);
        // Entangled partner now agrees on every subsequent measurement.
        for _ in 0..10 {
            assert_eq!(sv.clone().measure(1, &mut rng), first);
        }
    }

    #[test]
    fn test_sample_deterministic() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut sv = Statevector::new(1);
        sv.apply_gate(&GateKind::X, &[0], &[]).unwrap();
        for _ in 0..100 {
            assert_eq!(sv.sample(&mut rng), 1);
        }
    }
}
