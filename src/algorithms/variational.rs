//! Variational minimum-eigenvalue loop
//!
//! Orchestrates the ansatz, the execution backend, result reduction and a
//! pluggable classical optimizer. The optimizer owns the iterate/evaluate/
//! update cycle and its own stopping rule; the loop supplies the objective,
//! collects telemetry through a monotonic evaluation counter, and enforces
//! the hard evaluation ceiling and retry policy on top.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::algorithms::CancellationToken;
use crate::backend::{EvaluationRequest, ExecutionBackend};
use crate::circuit::{Ansatz, CircuitSpec};
use crate::error::AlgorithmError;
use crate::operator::PauliHamiltonian;
use crate::optimizers::Optimizer;
use crate::reducer;
use crate::result::{FieldValue, MinimumEigensolverResult, RunStatus};

/// Default point when the caller supplies none. Always explicit, never
/// silently undefined.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum InitialPoint {
    /// All parameters zero
    Zero,
    /// Each parameter drawn uniformly from `[low, high)`
    Uniform {
        low: f64,
        high: f64,
        /// Fixed seed for reproducible draws; entropy-seeded when `None`
        seed: Option<u64>,
    },
}

/// Loop-local optimization telemetry, owned exclusively by one run
#[derive(Debug, Clone)]
pub struct OptimizationState {
    /// Number of recorded objective evaluations
    pub iteration: usize,
    /// Best cost value seen so far
    pub best_value: f64,
    /// Parameters at the best value
    pub best_parameters: Array1<f64>,
    /// Backend dispatches issued, retries included
    pub evaluation_count: usize,
    /// Append-only (parameters, value) evaluation history
    pub history: Vec<(Array1<f64>, f64)>,
}

impl OptimizationState {
    fn new(initial_point: Array1<f64>) -> Self {
        OptimizationState {
            iteration: 0,
            best_value: f64::INFINITY,
            best_parameters: initial_point,
            evaluation_count: 0,
            history: Vec::new(),
        }
    }

    fn record(&mut self, parameters: Array1<f64>, value: f64) {
        if value < self.best_value {
            self.best_value = value;
            self.best_parameters = parameters.clone();
        }
        self.history.push((parameters, value));
        self.iteration = self.history.len();
    }

    fn optimal_index(&self) -> usize {
        let mut best_index = 0;
        let mut best_value = f64::INFINITY;
        for (index, (_, value)) in self.history.iter().enumerate() {
            if *value < best_value {
                best_value = *value;
                best_index = index;
            }
        }
        best_index
    }
}

/// The variational minimum-eigenvalue loop
pub struct VariationalEigensolver<O: Optimizer> {
    optimizer: O,
    initial_point: Option<Array1<f64>>,
    initial_point_policy: InitialPoint,
    max_evals: Option<usize>,
    max_retries: usize,
    eval_timeout: Option<Duration>,
    shots: Option<usize>,
    cancellation: CancellationToken,
}

impl<O: Optimizer> VariationalEigensolver<O> {
    /// Create a loop around the given optimizer.
    ///
    /// Defaults: all-zero initial point, exact (shot-free) evaluation,
    /// three dispatch attempts per evaluation, no evaluation ceiling, no
    /// per-dispatch time budget.
    pub fn new(optimizer: O) -> Self {
        VariationalEigensolver {
            optimizer,
            initial_point: None,
            initial_point_policy: InitialPoint::Zero,
            max_evals: None,
            max_retries: 3,
            eval_timeout: None,
            shots: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Start the search from an explicit point
    pub fn with_initial_point(mut self, initial_point: Array1<f64>) -> Self {
        self.initial_point = Some(initial_point);
        self
    }

    /// Policy for drawing the initial point when none is supplied
    pub fn with_initial_point_policy(mut self, policy: InitialPoint) -> Self {
        self.initial_point_policy = policy;
        self
    }

    /// Hard ceiling on backend dispatches across the whole run
    pub fn with_max_evals(mut self, max_evals: usize) -> Self {
        self.max_evals = Some(max_evals);
        self
    }

    /// Total dispatch attempts per evaluation before escalating to an
    /// execution error
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Per-dispatch time budget; an overrun counts as a retryable failure
    pub fn with_eval_timeout(mut self, eval_timeout: Duration) -> Self {
        self.eval_timeout = Some(eval_timeout);
        self
    }

    /// Number of measurement shots per dispatch; exact evaluation when
    /// unset
    pub fn with_shots(mut self, shots: usize) -> Self {
        self.shots = Some(shots);
        self
    }

    /// Use an externally held cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Handle for cancelling this loop from another thread
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Run the minimum-eigenvalue search
    pub fn run(
        &self,
        operator: &PauliHamiltonian,
        ansatz: &Ansatz,
        backend: &mut dyn ExecutionBackend,
    ) -> Result<MinimumEigensolverResult, AlgorithmError> {
        self.validate(operator, ansatz)?;
        let initial_point = self.resolve_initial_point(ansatz)?;
        self.run_with_initial(operator, ansatz, initial_point, backend)
    }

    /// Run independent searches from several initial points in parallel.
    ///
    /// Each run owns its own state and its own backend handle from the
    /// factory; no state is shared across runs.
    pub fn run_sweep<B, F>(
        &self,
        operator: &PauliHamiltonian,
        ansatz: &Ansatz,
        initial_points: &[Array1<f64>],
        backend_factory: F,
    ) -> Vec<Result<MinimumEigensolverResult, AlgorithmError>>
    where
        O: Sync,
        B: ExecutionBackend,
        F: Fn() -> B + Sync,
    {
        initial_points
            .par_iter()
            .map(|point| {
                self.validate(operator, ansatz)?;
                let mut backend = backend_factory();
                self.run_with_initial(operator, ansatz, point.clone(), &mut backend)
            })
            .collect()
    }

    /// Run the search from one explicit initial point
    pub fn run_with_initial(
        &self,
        operator: &PauliHamiltonian,
        ansatz: &Ansatz,
        initial_point: Array1<f64>,
        backend: &mut dyn ExecutionBackend,
    ) -> Result<MinimumEigensolverResult, AlgorithmError> {
        self.validate(operator, ansatz)?;
        if initial_point.len() != ansatz.parameter_count() {
            return Err(AlgorithmError::configuration(format!(
                "initial point has {} parameters, ansatz expects {}",
                initial_point.len(),
                ansatz.parameter_count()
            )));
        }

        let mut state = OptimizationState::new(initial_point.clone());
        let outcome = {
            let state = &mut state;
            let mut objective = |parameters: &Array1<f64>| -> Result<f64, AlgorithmError> {
                if self.cancellation.is_cancelled() {
                    return Err(AlgorithmError::Cancelled);
                }
                let bound = ansatz.bind(parameters)?;
                let circuit = CircuitSpec::Ansatz(bound);
                let request = EvaluationRequest {
                    circuit: &circuit,
                    observable: Some(operator),
                    shots: self.shots,
                };
                let value = self.dispatch(state, backend, &request, operator)?;
                state.record(parameters.clone(), value);
                debug!(
                    evaluation = state.evaluation_count,
                    value, "objective evaluated"
                );
                Ok(value)
            };
            self.optimizer.optimize(&mut objective, &initial_point, None)
        };

        match outcome {
            Ok(outcome) => Ok(self.build_result(
                &state,
                &initial_point,
                RunStatus::Converged,
                outcome.converged,
                outcome.iterations,
            )),
            Err(AlgorithmError::BudgetExhausted) => Ok(self.build_result(
                &state,
                &initial_point,
                RunStatus::BudgetExhausted,
                false,
                state.iteration,
            )),
            Err(AlgorithmError::Cancelled) => Ok(self.build_result(
                &state,
                &initial_point,
                RunStatus::Cancelled,
                false,
                state.iteration,
            )),
            Err(other) => Err(other),
        }
    }

    fn validate(&self, operator: &PauliHamiltonian, ansatz: &Ansatz) -> Result<(), AlgorithmError> {
        if ansatz.qubits == 0 {
            return Err(AlgorithmError::configuration(
                "ansatz must act on at least one qubit",
            ));
        }
        if ansatz.parameter_count() == 0 {
            return Err(AlgorithmError::configuration(
                "ansatz has a zero-length parameter vector",
            ));
        }
        if operator.num_qubits() > ansatz.qubits {
            return Err(AlgorithmError::configuration(format!(
                "operator acts on {} qubits but the ansatz has only {}",
                operator.num_qubits(),
                ansatz.qubits
            )));
        }
        if self.max_retries == 0 {
            return Err(AlgorithmError::configuration(
                "retry budget must allow at least one dispatch attempt",
            ));
        }
        Ok(())
    }

    fn resolve_initial_point(&self, ansatz: &Ansatz) -> Result<Array1<f64>, AlgorithmError> {
        let n = ansatz.parameter_count();
        if let Some(point) = &self.initial_point {
            if point.len() != n {
                return Err(AlgorithmError::configuration(format!(
                    "initial point has {} parameters, ansatz expects {}",
                    point.len(),
                    n
                )));
            }
            return Ok(point.clone());
        }
        match &self.initial_point_policy {
            InitialPoint::Zero => Ok(Array1::zeros(n)),
            InitialPoint::Uniform { low, high, seed } => {
                if low >= high {
                    return Err(AlgorithmError::configuration(format!(
                        "uniform initial point range [{}, {}) is empty",
                        low, high
                    )));
                }
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(*seed),
                    None => StdRng::from_entropy(),
                };
                Ok((0..n).map(|_| rng.gen_range(*low..*high)).collect())
            }
        }
    }

    /// One objective evaluation: bounded retries over backend dispatches,
    /// each attempt counted against the evaluation ceiling.
    fn dispatch(
        &self,
        state: &mut OptimizationState,
        backend: &mut dyn ExecutionBackend,
        request: &EvaluationRequest<'_>,
        operator: &PauliHamiltonian,
    ) -> Result<f64, AlgorithmError> {
        let mut last_error: Option<AlgorithmError> = None;

        for attempt in 1..=self.max_retries {
            if let Some(ceiling) = self.max_evals {
                if state.evaluation_count >= ceiling {
                    return Err(AlgorithmError::BudgetExhausted);
                }
            }
            state.evaluation_count += 1;

            let started = Instant::now();
            match backend.evaluate(request) {
                Ok(output) => {
                    if let Some(budget) = self.eval_timeout {
                        let elapsed = started.elapsed();
                        if elapsed > budget {
                            let error = AlgorithmError::BackendTimeout { elapsed, budget };
                            warn!(attempt, error = %error, "dispatch exceeded its time budget");
                            last_error = Some(error);
                            continue;
                        }
                    }
                    return reducer::reduce_expectation(&output, operator);
                }
                Err(error) if error.is_retryable() => {
                    warn!(attempt, error = %error, "backend dispatch failed; retrying");
                    last_error = Some(error);
                }
                Err(error) => return Err(error),
            }
        }

        let message = last_error
            .map(|error| error.to_string())
            .unwrap_or_else(|| "no dispatch attempted".to_string());
        Err(AlgorithmError::Execution {
            attempts: self.max_retries,
            message,
        })
    }

    fn build_result(
        &self,
        state: &OptimizationState,
        initial_point: &Array1<f64>,
        status: RunStatus,
        converged: bool,
        iterations: usize,
    ) -> MinimumEigensolverResult {
        let success = !state.history.is_empty();
        let (optimal_value, optimal_parameters, optimal_point_index) = if success {
            (
                state.best_value,
                state.best_parameters.clone(),
                state.optimal_index(),
            )
        } else {
            (f64::NAN, initial_point.clone(), 0)
        };

        let mut raw_data = BTreeMap::new();
        raw_data.insert(
            "energy_history".to_string(),
            FieldValue::FloatVec(state.history.iter().map(|(_, value)| *value).collect()),
        );
        raw_data.insert(
            "initial_point".to_string(),
            FieldValue::FloatVec(initial_point.to_vec()),
        );

        MinimumEigensolverResult {
            success,
            status,
            converged,
            optimal_value,
            optimal_parameters,
            optimal_point_index,
            cost_function_evals: state.evaluation_count,
            iterations,
            raw_data,
        }
    }
}
