//! Execution backend boundary
//!
//! A backend accepts a parameterized computation request and returns either
//! an expectation value or a measurement distribution. Backends may be
//! stochastic and may fail transiently; a failure is always an `Err`, never
//! an empty success.

pub mod statevector;

use std::collections::BTreeMap;

use crate::circuit::CircuitSpec;
use crate::error::AlgorithmError;
use crate::operator::PauliHamiltonian;

pub use statevector::StatevectorBackend;

/// A single evaluation request dispatched to a backend
#[derive(Debug)]
pub struct EvaluationRequest<'a> {
    /// The circuit to execute
    pub circuit: &'a CircuitSpec,
    /// Observable to estimate; `None` requests a measurement distribution
    pub observable: Option<&'a PauliHamiltonian>,
    /// Number of measurement shots; `None` requests exact values where the
    /// backend supports them
    pub shots: Option<usize>,
}

/// Raw output of one backend dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOutput {
    /// Scalar estimate of the requested observable
    Expectation(f64),
    /// Measurement distribution over bitstrings
    Distribution {
        /// Outcome probabilities (not necessarily normalized; reduction
        /// normalizes)
        probabilities: BTreeMap<String, f64>,
        /// Shots the backend actually executed, when shot-based
        shots_taken: Option<usize>,
        /// Shots that were requested, when shot-based
        shots_requested: Option<usize>,
    },
}

/// The execution capability every loop dispatches through
pub trait ExecutionBackend {
    /// Execute one request, returning an expectation value or distribution
    fn evaluate(&mut self, request: &EvaluationRequest<'_>) -> Result<BackendOutput, AlgorithmError>;
}
