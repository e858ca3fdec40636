//! Circuit specifications at the backend boundary
//!
//! Circuit construction and compilation are external concerns; what the
//! loops hand a backend is a small closed specification: either a layered
//! rotation ansatz with bound parameter values, or an amplification circuit
//! (state preparation followed by a number of amplification operator
//! applications against an oracle).

use std::fmt;
use std::sync::Arc;

use ndarray::Array1;
use serde::Serialize;

use crate::error::AlgorithmError;

/// Entanglement layout of an ansatz layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Entangler {
    /// No entangling gates
    None,
    /// CX chain over neighboring qubits
    Linear,
    /// CX chain closed into a ring
    Circular,
}

/// A two-local style layered rotation ansatz.
///
/// Each layer applies one Ry rotation per qubit followed by the entangler,
/// so the parameter vector length is `qubits * layers`. Parameter identity
/// is positional: layer-major, qubit-minor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ansatz {
    /// Number of qubits
    pub qubits: usize,
    /// Number of rotation-plus-entangler layers
    pub layers: usize,
    /// Entanglement layout applied after each rotation layer
    pub entangler: Entangler,
}

impl Ansatz {
    /// Create an ansatz with a linear entangler
    pub fn new(qubits: usize, layers: usize) -> Self {
        Ansatz {
            qubits,
            layers,
            entangler: Entangler::Linear,
        }
    }

    /// Set the entanglement layout
    pub fn with_entangler(mut self, entangler: Entangler) -> Self {
        self.entangler = entangler;
        self
    }

    /// Length of the parameter vector this ansatz expects
    pub fn parameter_count(&self) -> usize {
        self.qubits * self.layers
    }

    /// Bind concrete parameter values, producing a dispatchable circuit
    pub fn bind(&self, parameters: &Array1<f64>) -> Result<BoundAnsatz, AlgorithmError> {
        if parameters.len() != self.parameter_count() {
            return Err(AlgorithmError::configuration(format!(
                "ansatz expects {} parameters, got {}",
                self.parameter_count(),
                parameters.len()
            )));
        }
        Ok(BoundAnsatz {
            ansatz: self.clone(),
            values: parameters.clone(),
        })
    }
}

/// An ansatz with its parameters bound to concrete values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundAnsatz {
    /// The ansatz template
    pub ansatz: Ansatz,
    /// Bound parameter values, layer-major
    pub values: Array1<f64>,
}

impl BoundAnsatz {
    /// The bound rotation angle for a given layer and qubit, `None` when
    /// either index is outside the ansatz layout
    pub fn angle(&self, layer: usize, qubit: usize) -> Option<f64> {
        if layer >= self.ansatz.layers || qubit >= self.ansatz.qubits {
            return None;
        }
        self.values.get(layer * self.ansatz.qubits + qubit).copied()
    }
}

/// Initial state preparation for amplification circuits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatePreparation {
    /// Uniform superposition over all basis states
    Uniform,
    /// The all-zero computational basis state
    Zero,
}

/// A predicate judging whether a measured bitstring satisfies the search
/// condition. Bitstrings are big-endian: character position q is qubit q.
pub trait Oracle: Send + Sync {
    /// Number of qubits in the search space
    fn num_qubits(&self) -> usize;

    /// Whether the outcome satisfies the search condition
    fn is_good(&self, bitstring: &str) -> bool;
}

/// An oracle accepting an explicit set of good bitstrings
#[derive(Debug, Clone)]
pub struct BitstringOracle {
    qubits: usize,
    good: std::collections::BTreeSet<String>,
}

impl BitstringOracle {
    /// Create an oracle over `qubits` qubits accepting exactly the given
    /// bitstrings
    pub fn new<I, S>(qubits: usize, good: I) -> Result<Self, AlgorithmError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let good: std::collections::BTreeSet<String> =
            good.into_iter().map(Into::into).collect();
        for bits in &good {
            if bits.len() != qubits || !bits.chars().all(|c| c == '0' || c == '1') {
                return Err(AlgorithmError::configuration(format!(
                    "\"{}\" is not a {}-qubit bitstring",
                    bits, qubits
                )));
            }
        }
        Ok(BitstringOracle { qubits, good })
    }
}

impl Oracle for BitstringOracle {
    fn num_qubits(&self) -> usize {
        self.qubits
    }

    fn is_good(&self, bitstring: &str) -> bool {
        self.good.contains(bitstring)
    }
}

/// The circuit specification a backend consumes
#[derive(Clone)]
pub enum CircuitSpec {
    /// A bound variational ansatz
    Ansatz(BoundAnsatz),
    /// State preparation followed by `power` amplification operator
    /// applications against the oracle
    Amplification {
        state_preparation: StatePreparation,
        oracle: Arc<dyn Oracle>,
        power: usize,
    },
}

impl CircuitSpec {
    /// Number of qubits the circuit acts on
    pub fn qubit_count(&self) -> usize {
        match self {
            CircuitSpec::Ansatz(bound) => bound.ansatz.qubits,
            CircuitSpec::Amplification { oracle, .. } => oracle.num_qubits(),
        }
    }
}

impl fmt::Debug for CircuitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CircuitSpec::Ansatz(bound) => f.debug_tuple("Ansatz").field(bound).finish(),
            CircuitSpec::Amplification {
                state_preparation,
                power,
                oracle,
            } => f
                .debug_struct("Amplification")
                .field("state_preparation", state_preparation)
                .field("power", power)
                .field("qubits", &oracle.num_qubits())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_parameter_count() {
        let ansatz = Ansatz::new(3, 2);
        assert_eq!(ansatz.parameter_count(), 6);
    }

    #[test]
    fn test_bind_checks_length() {
        let ansatz = Ansatz::new(2, 1);
        assert!(ansatz.bind(&array![0.1]).is_err());
        assert!(ansatz.bind(&array![0.1, 0.2]).is_ok());
    }

    #[test]
    fn test_bound_angle_indexing() {
        let ansatz = Ansatz::new(2, 2);
        let bound = ansatz.bind(&array![0.1, 0.2, 0.3, 0.4]).unwrap();
        assert_eq!(bound.angle(0, 1), Some(0.2));
        assert_eq!(bound.angle(1, 0), Some(0.3));
    }

    #[test]
    fn test_bound_angle_out_of_range() {
        let ansatz = Ansatz::new(2, 1);
        let bound = ansatz.bind(&array![0.1, 0.2]).unwrap();
        assert_eq!(bound.angle(1, 0), None);
        assert_eq!(bound.angle(0, 2), None);
    }

    #[test]
    fn test_bitstring_oracle_validation() {
        assert!(BitstringOracle::new(2, ["11"]).is_ok());
        assert!(BitstringOracle::new(2, ["111"]).is_err());
        assert!(BitstringOracle::new(2, ["1x"]).is_err());
    }
}
