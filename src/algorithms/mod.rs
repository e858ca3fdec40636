//! Algorithm loops
//!
//! The hybrid control loops that drive an execution backend through
//! reduction and classical optimization: minimum-eigenvalue search
//! ([`VariationalEigensolver`]), amplitude amplification
//! ([`AmplitudeAmplifier`]) and the classical reference solver
//! ([`ExactMinimumEigensolver`]).

pub mod amplification;
pub mod exact;
pub mod variational;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use amplification::{AmplificationState, AmplitudeAmplifier, GrowthSchedule};
pub use exact::ExactMinimumEigensolver;
pub use variational::{InitialPoint, OptimizationState, VariationalEigensolver};

/// Cooperative cancellation handle for an in-flight run.
///
/// Cancelling stops the loop from issuing new dispatches; the run returns
/// the best result seen so far with a distinguishing status instead of an
/// error. Clones share the same flag, so a clone handed to another thread
/// can cancel the run that owns the original.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Create a fresh, uncancelled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
