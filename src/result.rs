//! Structured results shared by all algorithms
//!
//! Every algorithm produces an immutable result constructed once at the end
//! of a run. Subtypes only ever add fields on top of the shared base
//! (`success`, `raw_data`) and never repurpose a field name, so downstream
//! reporting can treat the flat field map as append-only.

use std::collections::BTreeMap;
use std::fmt;

use ndarray::Array1;
use serde::Serialize;

/// How a run terminated, distinguishing "the optimizer stopped on its own
/// rule" from "the hard evaluation ceiling cut it off" and from external
/// cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunStatus {
    /// The optimizer finished under its own stopping rule
    Converged,
    /// The hard `max_evals` ceiling was reached; best point so far returned
    BudgetExhausted,
    /// The run was cancelled; best point so far returned
    Cancelled,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Converged => write!(f, "converged"),
            RunStatus::BudgetExhausted => write!(f, "budget_exhausted"),
            RunStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A primitive or array value in the flat serialized form of a result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    IntVec(Vec<i64>),
    FloatVec(Vec<f64>),
    ProbabilityMap(BTreeMap<String, f64>),
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<usize> for FieldValue {
    fn from(v: usize) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

/// Result of a minimum-eigenvalue search
#[derive(Debug, Clone, Serialize)]
pub struct MinimumEigensolverResult {
    /// Whether the run produced a usable optimum
    pub success: bool,
    /// How the run terminated
    pub status: RunStatus,
    /// Whether the optimizer met its tolerance before exhausting its own
    /// iteration budget. `false` here with a successful run is the
    /// convergence warning.
    pub converged: bool,
    /// Best cost value seen across the run
    pub optimal_value: f64,
    /// Parameters at which the best value was observed
    pub optimal_parameters: Array1<f64>,
    /// Index of the best point in the evaluation history
    pub optimal_point_index: usize,
    /// Number of backend dispatches issued, retries included
    pub cost_function_evals: usize,
    /// Optimizer-internal iterations
    pub iterations: usize,
    /// Opaque run data for auditing (evaluation history and the like)
    pub raw_data: BTreeMap<String, FieldValue>,
}

impl MinimumEigensolverResult {
    /// Flatten the result into a field-name to value mapping for
    /// downstream reporting
    pub fn fields(&self) -> BTreeMap<String, FieldValue> {
        let mut map = BTreeMap::new();
        map.insert("success".into(), self.success.into());
        map.insert("status".into(), self.status.to_string().into());
        map.insert("converged".into(), self.converged.into());
        map.insert("optimal_value".into(), self.optimal_value.into());
        map.insert(
            "optimal_parameters".into(),
            FieldValue::FloatVec(self.optimal_parameters.to_vec()),
        );
        map.insert("optimal_point_index".into(), self.optimal_point_index.into());
        map.insert("cost_function_evals".into(), self.cost_function_evals.into());
        map.insert("iterations".into(), self.iterations.into());
        for (key, value) in &self.raw_data {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

/// Result of an amplitude-amplification search
#[derive(Debug, Clone, Serialize)]
pub struct AmplitudeAmplifierResult {
    /// Whether the oracle accepted an outcome
    pub success: bool,
    /// The most probable measured bitstring, `None` when no dispatch was
    /// performed
    pub top_measurement: Option<String>,
    /// The measurement distribution of the iteration that produced the top
    /// measurement
    pub assignment: BTreeMap<String, f64>,
    /// Probability of the top measurement within its distribution
    pub max_probability: f64,
    /// Amplification powers that were dispatched, in order
    pub powers: Vec<usize>,
    /// Number of backend dispatches issued, retries included
    pub circuit_dispatches: usize,
    /// Opaque run data for auditing
    pub raw_data: BTreeMap<String, FieldValue>,
}

impl AmplitudeAmplifierResult {
    /// Flatten the result into a field-name to value mapping for
    /// downstream reporting
    pub fn fields(&self) -> BTreeMap<String, FieldValue> {
        let mut map = BTreeMap::new();
        map.insert("success".into(), self.success.into());
        if let Some(top) = &self.top_measurement {
            map.insert("top_measurement".into(), top.clone().into());
        }
        map.insert(
            "assignment".into(),
            FieldValue::ProbabilityMap(self.assignment.clone()),
        );
        map.insert("max_probability".into(), self.max_probability.into());
        map.insert(
            "powers".into(),
            FieldValue::IntVec(self.powers.iter().map(|&p| p as i64).collect()),
        );
        map.insert("circuit_dispatches".into(), self.circuit_dispatches.into());
        for (key, value) in &self.raw_data {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

/// Tagged result variant covering all algorithm families
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum AlgorithmResult {
    MinimumEigensolver(MinimumEigensolverResult),
    AmplitudeAmplifier(AmplitudeAmplifierResult),
}

impl AlgorithmResult {
    /// The kind discriminant as a string
    pub fn kind(&self) -> &'static str {
        match self {
            AlgorithmResult::MinimumEigensolver(_) => "minimum_eigensolver",
            AlgorithmResult::AmplitudeAmplifier(_) => "amplitude_amplifier",
        }
    }

    /// Whether the underlying run succeeded
    pub fn success(&self) -> bool {
        match self {
            AlgorithmResult::MinimumEigensolver(r) => r.success,
            AlgorithmResult::AmplitudeAmplifier(r) => r.success,
        }
    }

    /// Flatten the result, including the kind discriminant
    pub fn fields(&self) -> BTreeMap<String, FieldValue> {
        let mut map = match self {
            AlgorithmResult::MinimumEigensolver(r) => r.fields(),
            AlgorithmResult::AmplitudeAmplifier(r) => r.fields(),
        };
        map.insert("kind".into(), self.kind().into());
        map
    }
}

impl From<MinimumEigensolverResult> for AlgorithmResult {
    fn from(r: MinimumEigensolverResult) -> Self {
        AlgorithmResult::MinimumEigensolver(r)
    }
}

impl From<AmplitudeAmplifierResult> for AlgorithmResult {
    fn from(r: AmplitudeAmplifierResult) -> Self {
        AlgorithmResult::AmplitudeAmplifier(r)
    }
}
