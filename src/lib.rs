//! Hybrid Quantum-Classical Algorithms Framework
//!
//! This crate provides the control loops shared by variational
//! minimum-eigenvalue solvers and amplitude-amplification algorithms: a
//! loop parameterizes a quantum computation, dispatches it to an execution
//! backend, reduces the measurement results, and feeds the reduced value to
//! a pluggable classical optimizer until convergence or budget exhaustion.
//! Backends and optimizers sit behind capability traits so concrete
//! variants can be swapped without the loops knowing which is active.

pub mod algorithms;
pub mod backend;
pub mod circuit;
pub mod error;
pub mod operator;
pub mod optimizers;
pub mod reducer;
pub mod result;

// Create a prelude module for convenient imports
pub mod prelude {
    pub use crate::algorithms::{
        AmplificationState, AmplitudeAmplifier, CancellationToken, ExactMinimumEigensolver,
        GrowthSchedule, InitialPoint, VariationalEigensolver,
    };
    pub use crate::backend::{
        BackendOutput, EvaluationRequest, ExecutionBackend, StatevectorBackend,
    };
    pub use crate::circuit::{
        Ansatz, BitstringOracle, CircuitSpec, Entangler, Oracle, StatePreparation,
    };
    pub use crate::error::AlgorithmError;
    pub use crate::operator::{Pauli, PauliHamiltonian, PauliTerm};
    pub use crate::optimizers::{GradientDescent, Optimizer, OptimizerOutcome, Spsa};
    pub use crate::result::{
        AlgorithmResult, AmplitudeAmplifierResult, MinimumEigensolverResult, RunStatus,
    };
}

// Version and crate information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");
