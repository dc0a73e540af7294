use thiserror::Error;

/// Reasons a run is no longer trustworthy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GuardianError {
    #[error("Non-finite populations at iteration {iteration}")]
    NonFinite { iteration: u64 },

    #[error("Velocity {velocity:.4} exceeds the limit {limit:.4} at iteration {iteration}")]
    VelocityLimit {
        iteration: u64,
        velocity: f64,
        limit: f64,
    },

    #[error("Relative mass drift {drift:.3e} exceeds {tolerance:.3e} at iteration {iteration}")]
    MassDrift {
        iteration: u64,
        drift: f64,
        tolerance: f64,
    },
}
