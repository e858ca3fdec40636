//! Classical optimizer adapters
//!
//! Concrete optimizers sit behind one capability contract: given an
//! objective, an initial point and optionally a gradient, return the best
//! point, its value and the evaluation count. The loops never know which
//! variant is active; selection is an explicit caller choice, not runtime
//! type inspection.

pub mod gradient_descent;
pub mod spsa;

use ndarray::Array1;
use serde::Serialize;

use crate::error::AlgorithmError;

pub use gradient_descent::GradientDescent;
pub use spsa::Spsa;

/// Objective function: parameters to cost. Errors from the underlying
/// backend propagate through unchanged.
pub type Objective<'a> = dyn FnMut(&Array1<f64>) -> Result<f64, AlgorithmError> + 'a;

/// Gradient function: parameters to cost gradient
pub type Gradient<'a> = dyn FnMut(&Array1<f64>) -> Result<Array1<f64>, AlgorithmError> + 'a;

/// Capability set of an optimizer variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptimizerCapabilities {
    /// Can consume an analytic gradient function
    pub supports_gradient: bool,
    /// Can honor box bounds on parameters
    pub supports_bounds: bool,
    /// Can honor general constraints
    pub supports_constraints: bool,
}

/// Outcome reported by an optimizer
#[derive(Debug, Clone)]
pub struct OptimizerOutcome {
    /// Best point found
    pub point: Array1<f64>,
    /// Objective value at the best point
    pub value: f64,
    /// Objective evaluations the optimizer issued
    pub evaluations: usize,
    /// Optimizer-internal iterations performed
    pub iterations: usize,
    /// Whether the stopping tolerance was met before the iteration budget
    /// ran out
    pub converged: bool,
}

/// Capability contract for pluggable classical optimizers
pub trait Optimizer {
    /// The capability set of this variant
    fn capabilities(&self) -> OptimizerCapabilities;

    /// Minimize the objective starting from `initial_point`.
    ///
    /// `gradient`, when given and supported, replaces internal gradient
    /// estimation. Objective errors are propagated immediately, never
    /// swallowed.
    fn optimize(
        &self,
        objective: &mut Objective<'_>,
        initial_point: &Array1<f64>,
        gradient: Option<&mut Gradient<'_>>,
    ) -> Result<OptimizerOutcome, AlgorithmError>;
}

/// Forward-difference gradient estimate using `f0 = objective(point)`.
///
/// Issues one objective call per dimension, so estimation cost is visible
/// in the caller's evaluation count.
pub fn forward_difference(
    objective: &mut Objective<'_>,
    point: &Array1<f64>,
    f0: f64,
    step: f64,
) -> Result<Array1<f64>, AlgorithmError> {
    let mut gradient = Array1::zeros(point.len());
    for i in 0..point.len() {
        let mut shifted = point.clone();
        shifted[i] += step;
        gradient[i] = (objective(&shifted)? - f0) / step;
    }
    Ok(gradient)
}
