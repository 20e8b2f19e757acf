use thiserror::Error;

/// Failures surfaced by the AD* updater and driver.
///
/// None of these are recovered from internally; the caller decides whether to abort, fix its
/// strategies, or restart with a different configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdStarError {
    #[error("transition cost must be finite and non-negative, got {cost}")]
    InvalidCost { cost: f64 },
    #[error("heuristic estimate must be finite and non-negative, got {estimate}")]
    InvalidHeuristic { estimate: f64 },
    #[error("epsilon must be finite and at least 1, got {epsilon}")]
    InvalidEpsilon { epsilon: f64 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T, E = AdStarError> = std::result::Result<T, E>;

pub(crate) fn check_epsilon(epsilon: f64) -> Result<f64> {
    if epsilon.is_finite() && epsilon >= 1.0 {
        Ok(epsilon)
    } else {
        Err(AdStarError::InvalidEpsilon { epsilon })
    }
}
