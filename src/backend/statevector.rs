//! In-process exact statevector backend
//!
//! A reference [`ExecutionBackend`] that executes circuit specifications on
//! a dense statevector. Intended for algorithm development and testing, not
//! for large qubit counts: memory grows as 2^n. Shot-based requests sample
//! from the exact distribution with a seedable generator, so a fixed seed
//! makes the whole backend deterministic.

use std::collections::BTreeMap;

use ndarray::Array1;
use num_complex::Complex64;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::backend::{BackendOutput, EvaluationRequest, ExecutionBackend};
use crate::circuit::{BoundAnsatz, CircuitSpec, Entangler, Oracle, StatePreparation};
use crate::error::AlgorithmError;

/// Exact statevector execution backend
pub struct StatevectorBackend {
    rng: StdRng,
}

impl StatevectorBackend {
    /// Create a backend with an entropy-seeded generator
    pub fn new() -> Self {
        StatevectorBackend {
            rng: StdRng::from_entropy(),
        }
    }

    /// Create a backend with a fixed seed for reproducible sampling
    pub fn seeded(seed: u64) -> Self {
        StatevectorBackend {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn build_state(&self, circuit: &CircuitSpec) -> Result<Array1<Complex64>, AlgorithmError> {
        match circuit {
            CircuitSpec::Ansatz(bound) => simulate_ansatz(bound),
            CircuitSpec::Amplification {
                state_preparation,
                oracle,
                power,
            } => simulate_amplification(*state_preparation, oracle.as_ref(), *power),
        }
    }
}

impl Default for StatevectorBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionBackend for StatevectorBackend {
    fn evaluate(&mut self, request: &EvaluationRequest<'_>) -> Result<BackendOutput, AlgorithmError> {
        if request.circuit.qubit_count() == 0 {
            return Err(AlgorithmError::configuration(
                "circuit must act on at least one qubit",
            ));
        }
        if request.shots == Some(0) {
            return Err(AlgorithmError::configuration("shot count must be positive"));
        }

        let state = self.build_state(request.circuit)?;
        let num_qubits = request.circuit.qubit_count();

        match request.observable {
            Some(operator) => match request.shots {
                // Shot-noise estimation is only meaningful for operators we
                // can read off sampled bitstrings; otherwise fall back to
                // the exact value.
                Some(shots) if operator.is_diagonal() => {
                    let mut total = 0.0;
                    for _ in 0..shots {
                        let index = sample_index(&mut self.rng, &state);
                        let bits = index_to_bitstring(index, num_qubits);
                        total += operator.eigenvalue_of_bitstring(&bits)?;
                    }
                    Ok(BackendOutput::Expectation(total / shots as f64))
                }
                _ => Ok(BackendOutput::Expectation(operator.expectation(&state)?)),
            },
            None => match request.shots {
                Some(shots) => {
                    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
                    for _ in 0..shots {
                        let index = sample_index(&mut self.rng, &state);
                        *counts.entry(index_to_bitstring(index, num_qubits)).or_insert(0) += 1;
                    }
                    let probabilities = counts
                        .into_iter()
                        .map(|(bits, count)| (bits, count as f64 / shots as f64))
                        .collect();
                    Ok(BackendOutput::Distribution {
                        probabilities,
                        shots_taken: Some(shots),
                        shots_requested: Some(shots),
                    })
                }
                None => {
                    let mut probabilities = BTreeMap::new();
                    for (index, amplitude) in state.iter().enumerate() {
                        let p = amplitude.norm_sqr();
                        if p > 1e-12 {
                            probabilities.insert(index_to_bitstring(index, num_qubits), p);
                        }
                    }
                    Ok(BackendOutput::Distribution {
                        probabilities,
                        shots_taken: None,
                        shots_requested: None,
                    })
                }
            },
        }
    }
}

fn simulate_ansatz(bound: &BoundAnsatz) -> Result<Array1<Complex64>, AlgorithmError> {
    let n = bound.ansatz.qubits;
    let mut state = zero_state(n);

    for layer in 0..bound.ansatz.layers {
        for qubit in 0..n {
            let theta = bound.angle(layer, qubit).ok_or_else(|| {
                AlgorithmError::configuration(format!(
                    "no bound angle for layer {}, qubit {}",
                    layer, qubit
                ))
            })?;
            apply_ry(&mut state, n, qubit, theta);
        }
        match bound.ansatz.entangler {
            Entangler::None => {}
            Entangler::Linear => {
                for qubit in 0..n.saturating_sub(1) {
                    apply_cx(&mut state, n, qubit, qubit + 1);
                }
            }
            Entangler::Circular => {
                for qubit in 0..n.saturating_sub(1) {
                    apply_cx(&mut state, n, qubit, qubit + 1);
                }
                if n > 1 {
                    apply_cx(&mut state, n, n - 1, 0);
                }
            }
        }
    }

    Ok(state)
}

fn simulate_amplification(
    preparation: StatePreparation,
    oracle: &dyn Oracle,
    power: usize,
) -> Result<Array1<Complex64>, AlgorithmError> {
    let n = oracle.num_qubits();
    let prepared = prepare(preparation, n);
    let mut state = prepared.clone();

    for _ in 0..power {
        // Phase oracle: flip the sign of every good basis state.
        for (index, amplitude) in state.iter_mut().enumerate() {
            if oracle.is_good(&index_to_bitstring(index, n)) {
                *amplitude = -*amplitude;
            }
        }
        // Reflect about the prepared state: psi -> 2 s <s|psi> - psi.
        let overlap: Complex64 = prepared
            .iter()
            .zip(state.iter())
            .map(|(s, a)| s.conj() * a)
            .sum();
        for (s, amplitude) in prepared.iter().zip(state.iter_mut()) {
            *amplitude = 2.0 * overlap * s - *amplitude;
        }
    }

    Ok(state)
}

fn zero_state(num_qubits: usize) -> Array1<Complex64> {
    let dim = 1 << num_qubits;
    let mut state = Array1::zeros(dim);
    state[0] = Complex64::new(1.0, 0.0);
    state
}

fn prepare(preparation: StatePreparation, num_qubits: usize) -> Array1<Complex64> {
    match preparation {
        StatePreparation::Zero => zero_state(num_qubits),
        StatePreparation::Uniform => {
            let dim = 1 << num_qubits;
            let amplitude = Complex64::new(1.0 / (dim as f64).sqrt(), 0.0);
            Array1::from_elem(dim, amplitude)
        }
    }
}

fn apply_ry(state: &mut Array1<Complex64>, num_qubits: usize, qubit: usize, theta: f64) {
    let shift = num_qubits - 1 - qubit;
    let mask = 1 << shift;
    let c = (theta / 2.0).cos();
    let s = (theta / 2.0).sin();

    for i in 0..state.len() {
        if (i >> shift) & 1 == 0 {
            let j = i | mask;
            let a = state[i];
            let b = state[j];
            state[i] = Complex64::new(c, 0.0) * a - Complex64::new(s, 0.0) * b;
            state[j] = Complex64::new(s, 0.0) * a + Complex64::new(c, 0.0) * b;
        }
    }
}

fn apply_cx(state: &mut Array1<Complex64>, num_qubits: usize, control: usize, target: usize) {
    let control_shift = num_qubits - 1 - control;
    let target_shift = num_qubits - 1 - target;
    let target_mask = 1 << target_shift;

    for i in 0..state.len() {
        if (i >> control_shift) & 1 == 1 && (i >> target_shift) & 1 == 0 {
            state.swap(i, i | target_mask);
        }
    }
}

fn sample_index(rng: &mut StdRng, state: &Array1<Complex64>) -> usize {
    let r: f64 = rng.gen();
    let mut cumulative = 0.0;
    for (index, amplitude) in state.iter().enumerate() {
        cumulative += amplitude.norm_sqr();
        if r < cumulative {
            return index;
        }
    }
    state.len() - 1
}

/// Format a basis index as a big-endian bitstring: character position q is
/// qubit q.
pub fn index_to_bitstring(index: usize, num_qubits: usize) -> String {
    (0..num_qubits)
        .map(|q| {
            if (index >> (num_qubits - 1 - q)) & 1 == 1 {
                '1'
            } else {
                '0'
            }
        })
        .collect()
}
