//! Reduction of raw backend output
//!
//! The variational path reduces backend output to a scalar cost; the
//! amplification path reduces it to a normalized bitstring-probability
//! mapping. Partial executions (fewer shots delivered than requested) are
//! reduced over what is present and flagged, never failed.

use std::collections::BTreeMap;

use tracing::warn;

use crate::backend::BackendOutput;
use crate::error::AlgorithmError;
use crate::operator::PauliHamiltonian;

/// Tolerance within which a probability mapping counts as normalized
pub const NORMALIZATION_TOLERANCE: f64 = 1e-9;

/// A normalized measurement distribution with its side-channel flags
#[derive(Debug, Clone, PartialEq)]
pub struct ReducedDistribution {
    /// Outcome probabilities, normalized to sum to one
    pub probabilities: BTreeMap<String, f64>,
    /// Whether the backend delivered fewer shots than requested
    pub undersampled: bool,
}

/// Reduce backend output to a scalar cost for minimization.
///
/// An expectation value passes through; a distribution is folded into the
/// probability-weighted eigenvalue sum of the operator, which requires the
/// operator to be diagonal.
pub fn reduce_expectation(
    output: &BackendOutput,
    operator: &PauliHamiltonian,
) -> Result<f64, AlgorithmError> {
    match output {
        BackendOutput::Expectation(value) => {
            if !value.is_finite() {
                return Err(AlgorithmError::backend(format!(
                    "backend returned non-finite expectation value {}",
                    value
                )));
            }
            Ok(*value)
        }
        BackendOutput::Distribution { .. } => {
            if !operator.is_diagonal() {
                return Err(AlgorithmError::configuration(
                    "cannot reduce a measurement distribution against a non-diagonal operator",
                ));
            }
            let reduced = reduce_distribution(output)?;
            let mut value = 0.0;
            for (bits, probability) in &reduced.probabilities {
                value += probability * operator.eigenvalue_of_bitstring(bits)?;
            }
            Ok(value)
        }
    }
}

/// Reduce backend output to a normalized bitstring-probability mapping
pub fn reduce_distribution(output: &BackendOutput) -> Result<ReducedDistribution, AlgorithmError> {
    let (probabilities, shots_taken, shots_requested) = match output {
        BackendOutput::Distribution {
            probabilities,
            shots_taken,
            shots_requested,
        } => (probabilities, *shots_taken, *shots_requested),
        BackendOutput::Expectation(_) => {
            return Err(AlgorithmError::configuration(
                "expected a measurement distribution, backend returned an expectation value",
            ));
        }
    };

    let total: f64 = probabilities.values().sum();
    if total <= 0.0 || !total.is_finite() {
        // A backend must report execution failure as an error; an empty or
        // degenerate distribution reaching this point is a backend defect.
        return Err(AlgorithmError::backend(format!(
            "distribution has invalid total probability {}",
            total
        )));
    }

    let probabilities = if (total - 1.0).abs() > NORMALIZATION_TOLERANCE {
        probabilities
            .iter()
            .map(|(bits, p)| (bits.clone(), p / total))
            .collect()
    } else {
        probabilities.clone()
    };

    let undersampled = match (shots_taken, shots_requested) {
        (Some(taken), Some(requested)) if taken < requested => {
            warn!(
                shots_taken = taken,
                shots_requested = requested,
                "backend delivered fewer shots than requested; reducing over what is present"
            );
            true
        }
        _ => false,
    };

    Ok(ReducedDistribution {
        probabilities,
        undersampled,
    })
}

/// The most probable outcome of a normalized distribution.
///
/// Ties at maximal probability resolve to the lexicographically smallest
/// bitstring, which the ordered map gives for free by keeping the first
/// strictly-greater entry.
pub fn top_outcome(probabilities: &BTreeMap<String, f64>) -> Option<(String, f64)> {
    let mut best: Option<(&String, f64)> = None;
    for (bits, &p) in probabilities {
        match best {
            Some((_, best_p)) if p <= best_p => {}
            _ => best = Some((bits, p)),
        }
    }
    best.map(|(bits, p)| (bits.clone(), p))
}
