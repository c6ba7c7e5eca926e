use crate::error::Result;
use crate::float::Float;

pub mod internals;
pub mod yin;

/// A per-block frequency estimator.
///
/// `Ok(None)` means the block carries no usable periodicity. Errors are reserved
/// for blocks or sample rates that violate the estimator's contract.
pub trait PitchEstimator<T>
where
    T: Float,
{
    fn estimate(&mut self, signal: &[T], sample_rate: usize) -> Result<Option<T>>;
}
