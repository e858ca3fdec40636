// tests/backend_tests.rs
//! Tests for the statevector execution backend

use ndarray::arr1;

use varq::prelude::*;
use varq::backend::{BackendOutput, EvaluationRequest, ExecutionBackend};

fn distribution_of(output: BackendOutput) -> std::collections::BTreeMap<String, f64> {
    match output {
        BackendOutput::Distribution { probabilities, .. } => probabilities,
        other => panic!("expected a distribution, got {:?}", other),
    }
}

#[test]
fn test_exact_distribution_of_uniform_amplification_source() {
    // Zero amplification iterations leave the prepared uniform state
    // untouched.
    let oracle = std::sync::Arc::new(BitstringOracle::new(2, ["11"]).unwrap());
    let circuit = CircuitSpec::Amplification {
        state_preparation: StatePreparation::Uniform,
        oracle,
        power: 0,
    };
    let mut backend = StatevectorBackend::new();

    let output = backend
        .evaluate(&EvaluationRequest {
            circuit: &circuit,
            observable: None,
            shots: None,
        })
        .unwrap();

    let probabilities = distribution_of(output);
    assert_eq!(probabilities.len(), 4);
    for outcome in ["00", "01", "10", "11"] {
        assert!((probabilities[outcome] - 0.25).abs() < 1e-12);
    }
}

#[test]
fn test_ry_pi_flips_expectation_sign() {
    // Ry(pi)|0> = |1>, so <-Z> evaluates to +1.
    let ansatz = Ansatz::new(1, 1).with_entangler(Entangler::None);
    let bound = ansatz.bind(&arr1(&[std::f64::consts::PI])).unwrap();
    let circuit = CircuitSpec::Ansatz(bound);
    let operator = PauliHamiltonian::new(vec![PauliTerm::z(-1.0, 0)]).unwrap();
    let mut backend = StatevectorBackend::new();

    let output = backend
        .evaluate(&EvaluationRequest {
            circuit: &circuit,
            observable: Some(&operator),
            shots: None,
        })
        .unwrap();

    match output {
        BackendOutput::Expectation(value) => assert!((value - 1.0).abs() < 1e-12),
        other => panic!("expected an expectation, got {:?}", other),
    }
}

#[test]
fn test_entangler_produces_correlated_distribution() {
    // Ry(pi) on qubit 0 followed by CX(0, 1) maps |00> to |11>.
    let ansatz = Ansatz::new(2, 1);
    let bound = ansatz.bind(&arr1(&[std::f64::consts::PI, 0.0])).unwrap();
    let circuit = CircuitSpec::Ansatz(bound);
    let mut backend = StatevectorBackend::new();

    let output = backend
        .evaluate(&EvaluationRequest {
            circuit: &circuit,
            observable: None,
            shots: None,
        })
        .unwrap();

    let probabilities = distribution_of(output);
    assert_eq!(probabilities.len(), 1);
    assert!((probabilities["11"] - 1.0).abs() < 1e-12);
}

#[test]
fn test_seeded_sampling_is_deterministic() {
    let ansatz = Ansatz::new(2, 1).with_entangler(Entangler::None);
    let parameters = arr1(&[0.7, 1.3]);
    let circuit = CircuitSpec::Ansatz(ansatz.bind(&parameters).unwrap());

    let sample = |seed: u64| {
        let mut backend = StatevectorBackend::seeded(seed);
        distribution_of(
            backend
                .evaluate(&EvaluationRequest {
                    circuit: &circuit,
                    observable: None,
                    shots: Some(512),
                })
                .unwrap(),
        )
    };

    assert_eq!(sample(9), sample(9));
    assert_ne!(sample(9), sample(10));
}

#[test]
fn test_sampled_distribution_reports_shot_counts() {
    let ansatz = Ansatz::new(1, 1).with_entangler(Entangler::None);
    let circuit = CircuitSpec::Ansatz(ansatz.bind(&arr1(&[1.0])).unwrap());
    let mut backend = StatevectorBackend::seeded(3);

    let output = backend
        .evaluate(&EvaluationRequest {
            circuit: &circuit,
            observable: None,
            shots: Some(200),
        })
        .unwrap();

    match output {
        BackendOutput::Distribution {
            probabilities,
            shots_taken,
            shots_requested,
        } => {
            assert_eq!(shots_taken, Some(200));
            assert_eq!(shots_requested, Some(200));
            let total: f64 = probabilities.values().sum();
            assert!((total - 1.0).abs() < 1e-12);
        }
        other => panic!("expected a distribution, got {:?}", other),
    }
}

#[test]
fn test_sampled_expectation_of_deterministic_state_is_exact() {
    // The state is a Z eigenstate, so every sampled eigenvalue is +1 and
    // the shot average carries no noise.
    let ansatz = Ansatz::new(1, 1).with_entangler(Entangler::None);
    let circuit = CircuitSpec::Ansatz(ansatz.bind(&arr1(&[std::f64::consts::PI])).unwrap());
    let operator = PauliHamiltonian::new(vec![PauliTerm::z(-1.0, 0)]).unwrap();
    let mut backend = StatevectorBackend::seeded(7);

    let output = backend
        .evaluate(&EvaluationRequest {
            circuit: &circuit,
            observable: Some(&operator),
            shots: Some(64),
        })
        .unwrap();

    match output {
        BackendOutput::Expectation(value) => assert!((value - 1.0).abs() < 1e-12),
        other => panic!("expected an expectation, got {:?}", other),
    }
}

#[test]
fn test_zero_shots_is_rejected() {
    let ansatz = Ansatz::new(1, 1).with_entangler(Entangler::None);
    let circuit = CircuitSpec::Ansatz(ansatz.bind(&arr1(&[0.5])).unwrap());
    let mut backend = StatevectorBackend::new();

    let result = backend.evaluate(&EvaluationRequest {
        circuit: &circuit,
        observable: None,
        shots: Some(0),
    });

    assert!(matches!(result, Err(AlgorithmError::Configuration(_))));
}
