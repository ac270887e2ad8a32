//! Maps `Box<dyn Error>` from trait boundaries to typed errors.
//!
//! The traits in `gassist_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `gassist_sim::SimError` downcasting.

use crate::error::BacklashError;

/// Which collaborator call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwOp {
    Transform,
    Pulse,
}

/// Map a trait-boundary error to a typed `BacklashError`.
///
/// Attempts to downcast known simulator error types first, then falls back
/// to the operation that failed.
pub fn map_hw_error(op: HwOp, e: &(dyn std::error::Error + 'static)) -> BacklashError {
    #[cfg(feature = "sim-errors")]
    {
        if let Some(sim) = e.downcast_ref::<gassist_sim::SimError>() {
            return match sim {
                gassist_sim::SimError::TransformUnavailable => {
                    BacklashError::TransformFailure(sim.to_string())
                }
                other => BacklashError::MountFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    match op {
        HwOp::Transform => BacklashError::TransformFailure(s),
        HwOp::Pulse if s.to_lowercase().contains("transform") => {
            BacklashError::TransformFailure(s)
        }
        HwOp::Pulse => BacklashError::MountFault(s),
    }
}
