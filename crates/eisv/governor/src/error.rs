//! Governor error types.

use thiserror::Error;

/// Errors raised while validating governor configuration.
///
/// Per-cycle adaptation never fails; inputs are clamped instead.
#[derive(Debug, Error)]
pub enum GovernorError {
    /// A bound or default violates the floor <= default <= ceiling ordering.
    #[error("invalid bounds for {name}: floor {floor}, default {default}, ceiling {ceiling}")]
    InvalidBounds {
        name: String,
        floor: f64,
        default: f64,
        ceiling: f64,
    },

    /// Any other inconsistent configuration value.
    #[error("invalid governor config: {0}")]
    InvalidConfig(String),
}
