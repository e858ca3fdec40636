//! Gradient descent optimizer adapter

use ndarray::Array1;

use crate::error::AlgorithmError;
use crate::optimizers::{
    forward_difference, Gradient, Objective, Optimizer, OptimizerCapabilities, OptimizerOutcome,
};

/// Plain gradient descent with a fixed learning rate.
///
/// Consumes an analytic gradient when one is supplied; otherwise estimates
/// one by forward differences through the objective, so estimation cost
/// shows up in the evaluation count.
#[derive(Debug, Clone)]
pub struct GradientDescent {
    learning_rate: f64,
    max_iterations: usize,
    tolerance: f64,
    gradient_step: f64,
}

impl GradientDescent {
    /// Create a gradient descent optimizer with default settings
    pub fn new() -> Self {
        GradientDescent {
            learning_rate: 0.1,
            max_iterations: 1000,
            tolerance: 1e-6,
            gradient_step: 1e-6,
        }
    }

    /// Set the learning rate
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the iteration budget
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance on the gradient norm and value change
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the finite-difference perturbation size
    pub fn with_gradient_step(mut self, gradient_step: f64) -> Self {
        self.gradient_step = gradient_step;
        self
    }
}

impl Default for GradientDescent {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer for GradientDescent {
    fn capabilities(&self) -> OptimizerCapabilities {
        OptimizerCapabilities {
            supports_gradient: true,
            supports_bounds: false,
            supports_constraints: false,
        }
    }

    fn optimize(
        &self,
        objective: &mut Objective<'_>,
        initial_point: &Array1<f64>,
        mut gradient: Option<&mut Gradient<'_>>,
    ) -> Result<OptimizerOutcome, AlgorithmError> {
        if initial_point.is_empty() {
            return Err(AlgorithmError::configuration(
                "cannot optimize an empty parameter vector",
            ));
        }

        let mut point = initial_point.clone();
        let mut value = objective(&point)?;
        let mut evaluations = 1;
        let mut iterations = 0;
        let mut converged = false;

        for _ in 0..self.max_iterations {
            iterations += 1;

            let grad = match gradient.as_deref_mut() {
                Some(g) => g(&point)?,
                None => {
                    evaluations += point.len();
                    forward_difference(objective, &point, value, self.gradient_step)?
                }
            };

            let grad_norm = grad.dot(&grad).sqrt();
            if grad_norm < self.tolerance {
                converged = true;
                break;
            }

            point = &point - &grad.mapv(|g| g * self.learning_rate);
            let next = objective(&point)?;
            evaluations += 1;

            if (value - next).abs() < self.tolerance {
                value = next;
                converged = true;
                break;
            }
            value = next;
        }

        Ok(OptimizerOutcome {
            point,
            value,
            evaluations,
            iterations,
            converged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_minimizes_quadratic() {
        let optimizer = GradientDescent::new()
            .with_learning_rate(0.2)
            .with_max_iterations(500)
            .with_tolerance(1e-10);
        let mut objective =
            |p: &Array1<f64>| -> Result<f64, AlgorithmError> { Ok(p.dot(p)) };

        let outcome = optimizer
            .optimize(&mut objective, &array![1.0, -1.5], None)
            .unwrap();

        assert!(outcome.converged);
        assert!(outcome.value < 1e-6);
        assert!(outcome.point.iter().all(|x| x.abs() < 1e-3));
    }

    #[test]
    fn test_uses_supplied_gradient() {
        let optimizer = GradientDescent::new().with_learning_rate(0.2);
        let mut objective =
            |p: &Array1<f64>| -> Result<f64, AlgorithmError> { Ok(p.dot(p)) };
        let mut gradient =
            |p: &Array1<f64>| -> Result<Array1<f64>, AlgorithmError> { Ok(p.mapv(|x| 2.0 * x)) };

        let outcome = optimizer
            .optimize(&mut objective, &array![2.0], Some(&mut gradient))
            .unwrap();

        assert!(outcome.value < 1e-6);
        // One initial evaluation plus one per accepted step; no
        // finite-difference calls.
        assert!(outcome.evaluations <= outcome.iterations + 1);
    }

    #[test]
    fn test_rejects_empty_point() {
        let optimizer = GradientDescent::new();
        let mut objective = |_: &Array1<f64>| -> Result<f64, AlgorithmError> { Ok(0.0) };
        assert!(optimizer
            .optimize(&mut objective, &Array1::zeros(0), None)
            .is_err());
    }

    #[test]
    fn test_objective_error_propagates() {
        let optimizer = GradientDescent::new();
        let mut objective = |_: &Array1<f64>| -> Result<f64, AlgorithmError> {
            Err(AlgorithmError::backend("device offline"))
        };
        let result = optimizer.optimize(&mut objective, &array![0.5], None);
        assert!(matches!(result, Err(AlgorithmError::Backend(_))));
    }
}
