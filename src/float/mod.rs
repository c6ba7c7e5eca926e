//! Generic [Float] type which acts as a stand-in for `f32` or `f64`.
use rustfft::num_traits::float::Float as NumFloat;
use rustfft::num_traits::FromPrimitive;
use std::fmt::{Debug, Display};
use std::iter::Sum;

/// Signals are processed as arrays of [Float]s. A [Float] is normally `f32` or `f64`.
pub trait Float: Display + Debug + NumFloat + FromPrimitive + Sum + Send + Sync + 'static {
    /// Convert an `f64` literal. Never fails for `f32` or `f64`.
    fn lit(value: f64) -> Self {
        Self::from_f64(value).unwrap_or_else(Self::nan)
    }

    /// Convert a sample count or lag.
    fn from_len(value: usize) -> Self {
        Self::from_usize(value).unwrap_or_else(Self::nan)
    }
}

impl Float for f64 {}
impl Float for f32 {}
