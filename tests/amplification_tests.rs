// tests/amplification_tests.rs
//! Tests for the amplitude amplification loop

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use varq::prelude::*;
use varq::backend::{BackendOutput, EvaluationRequest, ExecutionBackend};
use varq::result::FieldValue;

/// Backend replaying a fixed sequence of distributions
struct ScriptedBackend {
    responses: Vec<BTreeMap<String, f64>>,
    calls: usize,
}

impl ScriptedBackend {
    fn new(responses: Vec<Vec<(&str, f64)>>) -> Self {
        ScriptedBackend {
            responses: responses
                .into_iter()
                .map(|entries| {
                    entries
                        .into_iter()
                        .map(|(bits, p)| (bits.to_string(), p))
                        .collect()
                })
                .collect(),
            calls: 0,
        }
    }
}

impl ExecutionBackend for ScriptedBackend {
    fn evaluate(&mut self, _request: &EvaluationRequest<'_>) -> Result<BackendOutput, AlgorithmError> {
        let probabilities = self
            .responses
            .get(self.calls)
            .cloned()
            .ok_or_else(|| AlgorithmError::backend("no scripted response left"))?;
        self.calls += 1;
        Ok(BackendOutput::Distribution {
            probabilities,
            shots_taken: None,
            shots_requested: None,
        })
    }
}

/// Oracle that never accepts
struct NeverOracle {
    qubits: usize,
}

impl Oracle for NeverOracle {
    fn num_qubits(&self) -> usize {
        self.qubits
    }

    fn is_good(&self, _bitstring: &str) -> bool {
        false
    }
}

#[test]
fn test_accepts_at_first_good_power() {
    let oracle = Arc::new(BitstringOracle::new(2, ["11"]).unwrap());
    let mut backend = ScriptedBackend::new(vec![
        vec![("00", 0.2), ("01", 0.2), ("10", 0.2), ("11", 0.4)],
        vec![("11", 1.0)],
        vec![("11", 1.0)],
    ]);
    let amplifier = AmplitudeAmplifier::new(GrowthSchedule::Sequence(vec![1, 2, 4]));

    let result = amplifier.run(oracle, &mut backend).unwrap();

    assert!(result.success);
    assert_eq!(result.top_measurement.as_deref(), Some("11"));
    assert_eq!(result.powers, vec![1]);
    // No dispatch beyond the accepting iteration.
    assert_eq!(backend.calls, 1);
    assert_eq!(result.circuit_dispatches, 1);
    assert_eq!(
        result.raw_data["final_state"],
        FieldValue::Text("accepted".into())
    );
}

#[test]
fn test_grover_on_statevector_backend() {
    // One Grover iteration over a 2-qubit uniform superposition amplifies
    // the single marked state to probability 1.
    let oracle = Arc::new(BitstringOracle::new(2, ["11"]).unwrap());
    let mut backend = StatevectorBackend::seeded(1);
    let amplifier = AmplitudeAmplifier::new(GrowthSchedule::Fixed(1));

    let result = amplifier.run(oracle, &mut backend).unwrap();

    assert!(result.success);
    assert_eq!(result.top_measurement.as_deref(), Some("11"));
    assert!((result.max_probability - 1.0).abs() < 1e-9);
}

#[test]
fn test_tie_break_is_lexicographic() {
    let oracle = Arc::new(NeverOracle { qubits: 2 });
    let amplifier = AmplitudeAmplifier::new(GrowthSchedule::Fixed(1));

    for _ in 0..5 {
        let mut backend =
            ScriptedBackend::new(vec![vec![("10", 0.4), ("01", 0.4), ("00", 0.2)]]);
        let result = amplifier.run(oracle.clone(), &mut backend).unwrap();
        assert_eq!(result.top_measurement.as_deref(), Some("01"));
    }
}

#[test]
fn test_empty_schedule_terminates_without_dispatch() {
    let oracle = Arc::new(BitstringOracle::new(2, ["11"]).unwrap());
    let mut backend = ScriptedBackend::new(vec![]);
    let amplifier = AmplitudeAmplifier::new(GrowthSchedule::Sequence(vec![]));

    let result = amplifier.run(oracle, &mut backend).unwrap();

    assert!(!result.success);
    assert_eq!(result.top_measurement, None);
    assert_eq!(result.circuit_dispatches, 0);
    assert_eq!(backend.calls, 0);
    assert!(result.assignment.is_empty());
    assert_eq!(
        result.raw_data["final_state"],
        FieldValue::Text("exhausted".into())
    );
}

#[test]
fn test_exhausted_schedule_reports_global_best() {
    let oracle = Arc::new(BitstringOracle::new(2, ["11"]).unwrap());
    let distribution = vec![("00", 0.5), ("01", 0.2), ("10", 0.2), ("11", 0.1)];
    let mut backend = ScriptedBackend::new(vec![distribution.clone(), distribution]);
    let amplifier = AmplitudeAmplifier::new(GrowthSchedule::Sequence(vec![1, 2]));

    let result = amplifier.run(oracle, &mut backend).unwrap();

    assert!(!result.success);
    assert_eq!(result.top_measurement.as_deref(), Some("00"));
    assert!((result.max_probability - 0.5).abs() < 1e-12);
    assert_eq!(result.powers, vec![1, 2]);
    assert_eq!(
        result.raw_data["final_state"],
        FieldValue::Text("exhausted".into())
    );
}

#[test]
fn test_best_outcome_tracked_across_iterations() {
    // The second iteration's top outcome has lower probability than the
    // first; the global best must come from the first.
    let oracle = Arc::new(NeverOracle { qubits: 2 });
    let mut backend = ScriptedBackend::new(vec![
        vec![("10", 0.7), ("00", 0.3)],
        vec![("01", 0.6), ("00", 0.4)],
    ]);
    let amplifier = AmplitudeAmplifier::new(GrowthSchedule::Sequence(vec![1, 2]));

    let result = amplifier.run(oracle, &mut backend).unwrap();

    assert!(!result.success);
    assert_eq!(result.top_measurement.as_deref(), Some("10"));
    assert!((result.max_probability - 0.7).abs() < 1e-12);
}

#[test]
fn test_assignment_is_normalized() {
    let oracle = Arc::new(NeverOracle { qubits: 2 });
    let mut backend = ScriptedBackend::new(vec![vec![("00", 0.3), ("11", 0.1)]]);
    let amplifier = AmplitudeAmplifier::new(GrowthSchedule::Fixed(1));

    let result = amplifier.run(oracle, &mut backend).unwrap();

    let total: f64 = result.assignment.values().sum();
    assert!((total - 1.0).abs() < 1e-9);
    assert!((result.assignment["00"] - 0.75).abs() < 1e-9);
}

#[test]
fn test_retry_budget_exhaustion_surfaces_execution_error() {
    struct AlwaysFailing;
    impl ExecutionBackend for AlwaysFailing {
        fn evaluate(
            &mut self,
            _request: &EvaluationRequest<'_>,
        ) -> Result<BackendOutput, AlgorithmError> {
            Err(AlgorithmError::backend("queue unavailable"))
        }
    }

    let oracle = Arc::new(BitstringOracle::new(2, ["11"]).unwrap());
    let amplifier =
        AmplitudeAmplifier::new(GrowthSchedule::Fixed(1)).with_max_retries(2);

    let result = amplifier.run(oracle, &mut AlwaysFailing);

    match result {
        Err(AlgorithmError::Execution { attempts, .. }) => assert_eq!(attempts, 2),
        other => panic!("expected an execution error, got {:?}", other),
    }
}

#[test]
fn test_timeout_overrun_counts_against_retries() {
    struct SlowBackend {
        calls: usize,
    }
    impl ExecutionBackend for SlowBackend {
        fn evaluate(
            &mut self,
            _request: &EvaluationRequest<'_>,
        ) -> Result<BackendOutput, AlgorithmError> {
            self.calls += 1;
            std::thread::sleep(Duration::from_millis(30));
            Ok(BackendOutput::Distribution {
                probabilities: [("11".to_string(), 1.0)].into_iter().collect(),
                shots_taken: None,
                shots_requested: None,
            })
        }
    }

    let oracle = Arc::new(BitstringOracle::new(2, ["11"]).unwrap());
    let amplifier = AmplitudeAmplifier::new(GrowthSchedule::Fixed(1))
        .with_eval_timeout(Duration::from_millis(1))
        .with_max_retries(2);
    let mut backend = SlowBackend { calls: 0 };

    match amplifier.run(oracle, &mut backend) {
        Err(AlgorithmError::Execution { attempts, message }) => {
            assert_eq!(attempts, 2);
            assert!(message.contains("budget"));
        }
        other => panic!("expected an execution error, got {:?}", other),
    }
    assert_eq!(backend.calls, 2);
}

#[test]
fn test_cancelled_before_start_dispatches_nothing() {
    let oracle = Arc::new(BitstringOracle::new(2, ["11"]).unwrap());
    let mut backend = ScriptedBackend::new(vec![vec![("11", 1.0)]]);
    let amplifier = AmplitudeAmplifier::new(GrowthSchedule::Fixed(1));
    amplifier.cancellation_token().cancel();

    let result = amplifier.run(oracle, &mut backend).unwrap();

    assert!(!result.success);
    assert_eq!(backend.calls, 0);
    assert_eq!(result.raw_data["cancelled"], FieldValue::Bool(true));
}

#[test]
fn test_sampled_grover_finds_marked_state() {
    let oracle = Arc::new(BitstringOracle::new(3, ["101"]).unwrap());
    let mut backend = StatevectorBackend::seeded(21);
    let amplifier = AmplitudeAmplifier::new(GrowthSchedule::Powers { max: 4 })
        .with_shots(1024);

    let result = amplifier.run(oracle, &mut backend).unwrap();

    // A single iteration already puts the marked state near 0.78 on
    // 3 qubits, so sampling picks it as the top outcome.
    assert!(result.success);
    assert_eq!(result.top_measurement.as_deref(), Some("101"));
}

#[test]
fn test_result_fields_are_flat() {
    let oracle = Arc::new(BitstringOracle::new(2, ["11"]).unwrap());
    let mut backend = StatevectorBackend::seeded(1);
    let amplifier = AmplitudeAmplifier::new(GrowthSchedule::Fixed(1));
    let result = amplifier.run(oracle, &mut backend).unwrap();

    let fields = AlgorithmResult::from(result).fields();
    assert_eq!(fields["kind"], FieldValue::Text("amplitude_amplifier".into()));
    assert_eq!(fields["success"], FieldValue::Bool(true));
    assert_eq!(fields["top_measurement"], FieldValue::Text("11".into()));
    assert!(matches!(fields["assignment"], FieldValue::ProbabilityMap(_)));
    assert!(matches!(fields["powers"], FieldValue::IntVec(_)));
}
