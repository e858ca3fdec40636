//! Amplitude amplification loop
//!
//! Applies a scheduled number of amplification operator applications,
//! dispatches each candidate circuit to the backend, and tests the oracle
//! against the most probable outcome. Acceptance terminates the run; an
//! exhausted schedule returns the globally best outcome observed.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use crate::algorithms::CancellationToken;
use crate::backend::{BackendOutput, EvaluationRequest, ExecutionBackend};
use crate::circuit::{CircuitSpec, Oracle, StatePreparation};
use crate::error::AlgorithmError;
use crate::reducer;
use crate::result::{AmplitudeAmplifierResult, FieldValue};

/// Amplification powers to try across outer iterations.
///
/// Finite; each run consumes a fresh unrolling of the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum GrowthSchedule {
    /// A single fixed power (non-adaptive mode)
    Fixed(usize),
    /// Powers of two, 1, 2, 4, ... up to and including `max`
    Powers { max: usize },
    /// An explicit sequence of powers
    Sequence(Vec<usize>),
}

impl GrowthSchedule {
    fn unroll(&self) -> Vec<usize> {
        match self {
            GrowthSchedule::Fixed(power) => vec![*power],
            GrowthSchedule::Powers { max } => {
                let mut powers = Vec::new();
                let mut power = 1;
                while power <= *max {
                    powers.push(power);
                    power *= 2;
                }
                powers
            }
            GrowthSchedule::Sequence(powers) => powers.clone(),
        }
    }
}

/// States of the amplification loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AmplificationState {
    /// No dispatch issued yet
    Idle,
    /// A circuit with the given power is in flight
    Dispatched(usize),
    /// The distribution for the given power has been reduced
    Evaluated(usize),
    /// The oracle accepted an outcome (terminal)
    Accepted,
    /// The schedule ran out without acceptance (terminal)
    Exhausted,
}

impl fmt::Display for AmplificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AmplificationState::Idle => write!(f, "idle"),
            AmplificationState::Dispatched(power) => write!(f, "dispatched({})", power),
            AmplificationState::Evaluated(power) => write!(f, "evaluated({})", power),
            AmplificationState::Accepted => write!(f, "accepted"),
            AmplificationState::Exhausted => write!(f, "exhausted"),
        }
    }
}

/// The amplitude amplification loop
pub struct AmplitudeAmplifier {
    schedule: GrowthSchedule,
    state_preparation: StatePreparation,
    shots: Option<usize>,
    max_retries: usize,
    eval_timeout: Option<Duration>,
    cancellation: CancellationToken,
}

impl AmplitudeAmplifier {
    /// Create an amplifier over the given schedule.
    ///
    /// Defaults: uniform state preparation, exact (shot-free) evaluation,
    /// three dispatch attempts per scheduled power.
    pub fn new(schedule: GrowthSchedule) -> Self {
        AmplitudeAmplifier {
            schedule,
            state_preparation: StatePreparation::Uniform,
            shots: None,
            max_retries: 3,
            eval_timeout: None,
            cancellation: CancellationToken::new(),
        }
    }

    /// Set the state preparation applied before amplification
    pub fn with_state_preparation(mut self, state_preparation: StatePreparation) -> Self {
        self.state_preparation = state_preparation;
        self
    }

    /// Number of measurement shots per dispatch; exact evaluation when
    /// unset
    pub fn with_shots(mut self, shots: usize) -> Self {
        self.shots = Some(shots);
        self
    }

    /// Total dispatch attempts per scheduled power before escalating to an
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

    /// Use an externally held cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Handle for cancelling this loop from another thread
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Run the amplification search
    pub fn run(
        &self,
        oracle: Arc<dyn Oracle>,
        backend: &mut dyn ExecutionBackend,
    ) -> Result<AmplitudeAmplifierResult, AlgorithmError> {
        if oracle.num_qubits() == 0 {
            return Err(AlgorithmError::configuration(
                "oracle must act on at least one qubit",
            ));
        }
        if self.max_retries == 0 {
            return Err(AlgorithmError::configuration(
                "retry budget must allow at least one dispatch attempt",
            ));
        }

        let mut machine = AmplificationState::Idle;
        let mut dispatches = 0;
        let mut powers = Vec::new();
        let mut undersampled = false;
        let mut cancelled = false;
        // Globally best (outcome, probability, distribution) across all
        // evaluated powers.
        let mut best: Option<(String, f64, BTreeMap<String, f64>)> = None;
        let mut accepted: Option<(String, f64, BTreeMap<String, f64>)> = None;

        for power in self.schedule.unroll() {
            if self.cancellation.is_cancelled() {
                cancelled = true;
                break;
            }

            machine = AmplificationState::Dispatched(power);
            debug!(state = %machine, "dispatching amplification circuit");
            let circuit = CircuitSpec::Amplification {
                state_preparation: self.state_preparation,
                oracle: oracle.clone(),
                power,
            };
            let request = EvaluationRequest {
                circuit: &circuit,
                observable: None,
                shots: self.shots,
            };

            let output = self.dispatch(&mut dispatches, backend, &request)?;
            let reduced = reducer::reduce_distribution(&output)?;
            undersampled |= reduced.undersampled;
            machine = AmplificationState::Evaluated(power);
            powers.push(power);

            let (top, probability) = reducer::top_outcome(&reduced.probabilities)
                .ok_or_else(|| AlgorithmError::backend("backend returned an empty distribution"))?;
            debug!(power, top = %top, probability, "evaluated amplification power");

            let improves = best
                .as_ref()
                .map_or(true, |(_, best_probability, _)| probability > *best_probability);
            if improves {
                best = Some((top.clone(), probability, reduced.probabilities.clone()));
            }

            if oracle.is_good(&top) {
                machine = AmplificationState::Accepted;
                accepted = Some((top, probability, reduced.probabilities));
                break;
            }
        }

        if machine != AmplificationState::Accepted {
            machine = AmplificationState::Exhausted;
        }

        let (success, top_measurement, max_probability, assignment) = match accepted {
            Some((top, probability, assignment)) => (true, Some(top), probability, assignment),
            None => match best {
                Some((top, probability, assignment)) => {
                    (false, Some(top), probability, assignment)
                }
                None => (false, None, 0.0, BTreeMap::new()),
            },
        };

        let mut raw_data = BTreeMap::new();
        raw_data.insert("final_state".to_string(), FieldValue::Text(machine.to_string()));
        raw_data.insert("undersampled".to_string(), FieldValue::Bool(undersampled));
        raw_data.insert("cancelled".to_string(), FieldValue::Bool(cancelled));

        Ok(AmplitudeAmplifierResult {
            success,
            top_measurement,
            assignment,
            max_probability,
            powers,
            circuit_dispatches: dispatches,
            raw_data,
        })
    }

    fn dispatch(
        &self,
        dispatches: &mut usize,
        backend: &mut dyn ExecutionBackend,
        request: &EvaluationRequest<'_>,
    ) -> Result<BackendOutput, AlgorithmError> {
        let mut last_error: Option<AlgorithmError> = None;

        for attempt in 1..=self.max_retries {
            *dispatches += 1;

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
                    return Ok(output);
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
}
