//! Cost operators as weighted sums of Pauli strings
//!
//! A [`PauliHamiltonian`] is the concrete cost-operator specification the
//! variational path minimizes. Diagonal operators (identity and Z factors
//! only) additionally admit per-bitstring eigenvalues, which is what lets
//! expectation values be recovered from measurement distributions.

use ndarray::Array1;
use num_complex::Complex64;
use serde::Serialize;

use crate::error::AlgorithmError;

/// A single-qubit Pauli operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pauli {
    I,
    X,
    Y,
    Z,
}

/// One weighted Pauli string. Identity factors are left implicit: a qubit
/// not named in `operators` carries `I`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PauliTerm {
    /// Real weight of the term
    pub coefficient: f64,
    /// (qubit, operator) pairs; qubits are positional indices
    pub operators: Vec<(usize, Pauli)>,
}

impl PauliTerm {
    /// A pure identity term (constant energy offset)
    pub fn identity(coefficient: f64) -> Self {
        PauliTerm {
            coefficient,
            operators: Vec::new(),
        }
    }

    /// A single-qubit Z term
    pub fn z(coefficient: f64, qubit: usize) -> Self {
        PauliTerm {
            coefficient,
            operators: vec![(qubit, Pauli::Z)],
        }
    }

    /// A single-qubit X term
    pub fn x(coefficient: f64, qubit: usize) -> Self {
        PauliTerm {
            coefficient,
            operators: vec![(qubit, Pauli::X)],
        }
    }

    /// A two-qubit ZZ coupling term
    pub fn zz(coefficient: f64, qubit_a: usize, qubit_b: usize) -> Self {
        PauliTerm {
            coefficient,
            operators: vec![(qubit_a, Pauli::Z), (qubit_b, Pauli::Z)],
        }
    }

    /// Whether the term contains only identity and Z factors
    pub fn is_diagonal(&self) -> bool {
        self.operators
            .iter()
            .all(|(_, p)| matches!(p, Pauli::I | Pauli::Z))
    }
}

/// A Hermitian operator expressed as a weighted sum of Pauli strings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PauliHamiltonian {
    /// The weighted terms; empty sums are rejected at construction
    pub terms: Vec<PauliTerm>,
}

impl PauliHamiltonian {
    /// Create a Hamiltonian from its terms
    pub fn new(terms: Vec<PauliTerm>) -> Result<Self, AlgorithmError> {
        if terms.is_empty() {
            return Err(AlgorithmError::configuration(
                "a Hamiltonian needs at least one Pauli term",
            ));
        }
        Ok(PauliHamiltonian { terms })
    }

    /// Number of qubits the operator acts on (highest named qubit plus one)
    pub fn num_qubits(&self) -> usize {
        self.terms
            .iter()
            .flat_map(|t| t.operators.iter().map(|(q, _)| q + 1))
            .max()
            .unwrap_or(0)
    }

    /// Whether every term is diagonal in the computational basis
    pub fn is_diagonal(&self) -> bool {
        self.terms.iter().all(PauliTerm::is_diagonal)
    }

    /// Eigenvalue of a computational basis state for a diagonal operator.
    ///
    /// The bitstring is big-endian: character position q is qubit q.
    pub fn eigenvalue_of_bitstring(&self, bitstring: &str) -> Result<f64, AlgorithmError> {
        if !self.is_diagonal() {
            return Err(AlgorithmError::configuration(
                "per-bitstring eigenvalues are only defined for diagonal operators",
            ));
        }
        let bits: Vec<bool> = bitstring
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(AlgorithmError::configuration(format!(
                    "invalid character '{}' in bitstring \"{}\"",
                    other, bitstring
                ))),
            })
            .collect::<Result<_, _>>()?;
        if bits.len() < self.num_qubits() {
            return Err(AlgorithmError::configuration(format!(
                "bitstring \"{}\" is shorter than the {}-qubit operator",
                bitstring,
                self.num_qubits()
            )));
        }

        let mut value = 0.0;
        for term in &self.terms {
            let mut sign = 1.0;
            for &(qubit, pauli) in &term.operators {
                if pauli == Pauli::Z && bits[qubit] {
                    sign = -sign;
                }
            }
            value += term.coefficient * sign;
        }
        Ok(value)
    }

    /// Exact expectation value over a statevector.
    ///
    /// Amplitudes are indexed big-endian: qubit q occupies bit position
    /// `n - 1 - q` of the basis index.
    pub fn expectation(&self, amplitudes: &Array1<Complex64>) -> Result<f64, AlgorithmError> {
        let dim = amplitudes.len();
        if dim == 0 || !dim.is_power_of_two() {
            return Err(AlgorithmError::configuration(format!(
                "statevector length {} is not a power of two",
                dim
            )));
        }
        let num_qubits = dim.trailing_zeros() as usize;
        if self.num_qubits() > num_qubits {
            return Err(AlgorithmError::configuration(format!(
                "operator acts on {} qubits but the state has only {}",
                self.num_qubits(),
                num_qubits
            )));
        }

        let mut energy = 0.0;
        for term in &self.terms {
            let mut term_value = Complex64::new(0.0, 0.0);
            for (i, &amplitude) in amplitudes.iter().enumerate() {
                let (j, phase) = apply_pauli_string(i, &term.operators, num_qubits);
                term_value += amplitude.conj() * phase * amplitudes[j];
            }
            energy += term.coefficient * term_value.re;
        }
        Ok(energy)
    }
}

/// Apply a Pauli string to a basis state index, returning the mapped index
/// and the accumulated phase.
fn apply_pauli_string(
    index: usize,
    operators: &[(usize, Pauli)],
    num_qubits: usize,
) -> (usize, Complex64) {
    let mut new_index = index;
    let mut phase = Complex64::new(1.0, 0.0);

    for &(qubit, pauli) in operators {
        let shift = num_qubits - 1 - qubit;
        let bit = (index >> shift) & 1;

        match pauli {
            Pauli::I => {}
            Pauli::X => {
                new_index ^= 1 << shift;
            }
            Pauli::Y => {
                new_index ^= 1 << shift;
                if bit == 0 {
                    phase *= Complex64::new(0.0, 1.0);
                } else {
                    phase *= Complex64::new(0.0, -1.0);
                }
            }
            Pauli::Z => {
                if bit == 1 {
                    phase *= Complex64::new(-1.0, 0.0);
                }
            }
        }
    }

    (new_index, phase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_num_qubits() {
        let h = PauliHamiltonian::new(vec![PauliTerm::z(1.0, 0), PauliTerm::zz(0.5, 0, 2)])
            .unwrap();
        assert_eq!(h.num_qubits(), 3);
    }

    #[test]
    fn test_empty_hamiltonian_rejected() {
        assert!(PauliHamiltonian::new(Vec::new()).is_err());
    }

    #[test]
    fn test_eigenvalue_of_bitstring() {
        // Z0 + 2 Z0Z1: |00> -> 1 + 2 = 3, |01> -> 1 - 2 = -1, |10> -> -1 - 2 = -3
        let h = PauliHamiltonian::new(vec![PauliTerm::z(1.0, 0), PauliTerm::zz(2.0, 0, 1)])
            .unwrap();
        assert_eq!(h.eigenvalue_of_bitstring("00").unwrap(), 3.0);
        assert_eq!(h.eigenvalue_of_bitstring("01").unwrap(), -1.0);
        assert_eq!(h.eigenvalue_of_bitstring("10").unwrap(), -3.0);
    }

    #[test]
    fn test_eigenvalue_rejects_non_diagonal() {
        let h = PauliHamiltonian::new(vec![PauliTerm::x(1.0, 0)]).unwrap();
        assert!(h.eigenvalue_of_bitstring("0").is_err());
    }

    #[test]
    fn test_expectation_z_on_basis_states() {
        let h = PauliHamiltonian::new(vec![PauliTerm::z(1.0, 0)]).unwrap();

        let zero = array![Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)];
        assert!((h.expectation(&zero).unwrap() - 1.0).abs() < 1e-12);

        let one = array![Complex64::new(0.0, 0.0), Complex64::new(1.0, 0.0)];
        assert!((h.expectation(&one).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_expectation_x_on_plus_state() {
        let h = PauliHamiltonian::new(vec![PauliTerm::x(1.0, 0)]).unwrap();
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let plus = array![Complex64::new(s, 0.0), Complex64::new(s, 0.0)];
        assert!((h.expectation(&plus).unwrap() - 1.0).abs() < 1e-12);
    }
}
