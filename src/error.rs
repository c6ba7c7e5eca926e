//! Error types for the estimator and the tracking session.

use thiserror::Error;

/// Result type for pitch tracking operations.
pub type Result<T> = std::result::Result<T, PitchError>;

/// Caller contract violations. An absent tone is not an error: it is reported as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PitchError {
    /// The block does not cover the lag range implied by the sample rate and frequency bounds.
    #[error("block of {len} samples is too short, at least {required} are required")]
    InvalidInput {
        /// Length of the rejected block.
        len: usize,
        /// Minimum block length for the configured frequency range.
        required: usize,
    },

    /// The sample rate is zero.
    #[error("invalid sample rate: {rate}")]
    InvalidSampleRate {
        /// The invalid sample rate.
        rate: usize,
    },

    /// Estimator or tracker parameters are inconsistent.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}
