//! Simultaneous perturbation stochastic approximation (SPSA)

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::AlgorithmError;
use crate::optimizers::{Gradient, Objective, Optimizer, OptimizerCapabilities, OptimizerOutcome};

/// Gradient-free stochastic-approximation optimizer.
///
/// Estimates the gradient from two objective evaluations per iteration
/// along a random Bernoulli perturbation, which tolerates shot-noisy
/// objectives well. The best point seen across all evaluations is
/// reported, not the final iterate.
#[derive(Debug, Clone)]
pub struct Spsa {
    max_iterations: usize,
    tolerance: f64,
    initial_step: f64,
    perturbation: f64,
    alpha: f64,
    gamma: f64,
    stability: f64,
    seed: Option<u64>,
}

impl Spsa {
    /// Create an SPSA optimizer with standard gain defaults
    pub fn new() -> Self {
        Spsa {
            max_iterations: 300,
            tolerance: 1e-6,
            initial_step: 0.2,
            perturbation: 0.1,
            alpha: 0.602,
            gamma: 0.101,
            stability: 0.0,
            seed: None,
        }
    }

    /// Set the iteration budget
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance on the update step norm
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the first-iteration step size
    pub fn with_initial_step(mut self, initial_step: f64) -> Self {
        self.initial_step = initial_step;
        self
    }

    /// Set the first-iteration perturbation size
    pub fn with_perturbation(mut self, perturbation: f64) -> Self {
        self.perturbation = perturbation;
        self
    }

    /// Fix the perturbation seed for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

impl Default for Spsa {
    fn default() -> Self {
        Self::new()
    }
}

impl Optimizer for Spsa {
    fn capabilities(&self) -> OptimizerCapabilities {
        OptimizerCapabilities {
            supports_gradient: false,
            supports_bounds: false,
            supports_constraints: false,
        }
    }

    fn optimize(
        &self,
        objective: &mut Objective<'_>,
        initial_point: &Array1<f64>,
        _gradient: Option<&mut Gradient<'_>>,
    ) -> Result<OptimizerOutcome, AlgorithmError> {
        if initial_point.is_empty() {
            return Err(AlgorithmError::configuration(
                "cannot optimize an empty parameter vector",
            ));
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut point = initial_point.clone();
        let mut best_point = point.clone();
        let mut best_value = objective(&point)?;
        let mut evaluations = 1;
        let mut iterations = 0;
        let mut converged = false;

        for k in 0..self.max_iterations {
            iterations += 1;

            let ak = self.initial_step
                / (k as f64 + 1.0 + self.stability).powf(self.alpha);
            let ck = self.perturbation / (k as f64 + 1.0).powf(self.gamma);

            let delta: Array1<f64> = (0..point.len())
                .map(|_| if rng.gen::<bool>() { 1.0 } else { -1.0 })
                .collect();

            let plus = &point + &delta.mapv(|d| d * ck);
            let minus = &point - &delta.mapv(|d| d * ck);
            let f_plus = objective(&plus)?;
            let f_minus = objective(&minus)?;
            evaluations += 2;

            if f_plus < best_value {
                best_value = f_plus;
                best_point = plus.clone();
            }
            if f_minus < best_value {
                best_value = f_minus;
                best_point = minus.clone();
            }

            // delta entries are +-1, so 1/delta_i == delta_i.
            let difference = (f_plus - f_minus) / (2.0 * ck);
            let step = delta.mapv(|d| ak * difference * d);
            point = &point - &step;

            if step.dot(&step).sqrt() < self.tolerance {
                converged = true;
                break;
            }
        }

        let final_value = objective(&point)?;
        evaluations += 1;
        if final_value < best_value {
            best_value = final_value;
            best_point = point;
        }

        Ok(OptimizerOutcome {
            point: best_point,
            value: best_value,
            evaluations,
            iterations,
            converged,
        })
    }
}
