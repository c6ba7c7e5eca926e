use std::sync::Arc;

use rustfft::num_complex::Complex;
use rustfft::{Fft, FftNum, FftPlanner};

use crate::float::Float;
use crate::utils::buffer::{copy_complex_to_real, copy_real_to_complex, new_complex_buffer, square_sum};

/// Lag range searched for a period, derived from the frequency bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagRange {
    /// `floor(sample_rate / max_frequency)`.
    pub min_tau: usize,
    /// `min(ceil(sample_rate / min_frequency), window_size)`, exclusive.
    pub max_tau: usize,
}

impl LagRange {
    pub fn new(sample_rate: usize, min_frequency: f64, max_frequency: f64, window_size: usize) -> Self {
        let sample_rate = sample_rate as f64;
        let min_tau = (sample_rate / max_frequency).floor() as usize;
        let max_tau = ((sample_rate / min_frequency).ceil() as usize).min(window_size);
        LagRange { min_tau, max_tau }
    }
}

/// Compute the square difference function, _d(t)_, of `signal` directly. For a window
/// size of _w_ and a signal _x=(x_0,x_1,...)_, this is defined by
///
///  > d(t) = sum_{i=0}^{w-1} (x_i - x_{i+t})^2
///
/// for every lag `t` in `0..result.len()`. This is the quadratic reference computation;
/// `result.len() + window_size` must not exceed `signal.len() + 1`.
pub fn square_difference<T: Float>(signal: &[T], window_size: usize, result: &mut [T]) {
    assert!(
        result.len() + window_size <= signal.len() + 1,
        "Lags beyond the signal length were requested"
    );

    let window = &signal[..window_size];
    result.iter_mut().enumerate().for_each(|(tau, d)| {
        *d = window
            .iter()
            .zip(&signal[tau..tau + window_size])
            .map(|(&a, &b)| {
                let delta = a - b;
                delta * delta
            })
            .sum();
    });
}

/// Planned transforms and scratch space for [FftDifference::windowed_square_error].
///
/// Transforms are planned once per signal length so that a real-time caller
/// does not allocate or plan inside its audio callback.
pub struct FftDifference<T>
where
    T: Float + FftNum,
{
    size: usize,
    forward: Arc<dyn Fft<T>>,
    inverse: Arc<dyn Fft<T>>,
    signal: Vec<Complex<T>>,
    window: Vec<Complex<T>>,
    scratch: Vec<Complex<T>>,
}

impl<T> FftDifference<T>
where
    T: Float + FftNum,
{
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        FftDifference {
            size,
            forward,
            inverse,
            signal: new_complex_buffer(size),
            window: new_complex_buffer(size),
            scratch: new_complex_buffer(scratch_len),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Compute the windowed autocorrelation of `signal` and put the result in `result`.
    /// For a signal _x=(x_0,x_1,...)_, the windowed autocorrelation with window size _w_ is
    /// the function
    ///
    /// > r(t) = sum_{i=0}^{w-1} x_i*x_{i+t}
    ///
    /// This function assumes `window_size` is at most half of the length of `signal`.
    pub fn windowed_autocorrelation(&mut self, signal: &[T], window_size: usize, result: &mut [T]) {
        assert_eq!(signal.len(), self.size, "Signal length differs from the planned size");

        // Cross correlate the signal with its first `window_size` samples.
        copy_real_to_complex(signal, &mut self.signal);
        copy_real_to_complex(&signal[..window_size], &mut self.window);
        self.forward
            .process_with_scratch(&mut self.signal, &mut self.scratch);
        self.forward
            .process_with_scratch(&mut self.window, &mut self.scratch);

        // rustfft does not normalize, so forward + inverse scales by `size`.
        let normalization = T::one() / T::from_len(self.size);
        self.signal
            .iter_mut()
            .zip(self.window.iter())
            .for_each(|(a, b)| *a = *a * normalization * b.conj());
        self.inverse
            .process_with_scratch(&mut self.signal, &mut self.scratch);

        // Only lags below `window_size` are valid.
        let valid = window_size.min(result.len());
        copy_complex_to_real(&self.signal[..valid], result);
    }

    /// Same function as [square_difference], computed in O(n log n) through
    /// `d(t) = pow_0^w + pow_t^{t+w} - 2 r(t)` where `pow_a^b` is the energy of
    /// `signal[a..b]`. Agrees with the direct sum up to rounding.
    pub fn windowed_square_error(&mut self, signal: &[T], window_size: usize, result: &mut [T]) {
        assert!(
            2 * window_size <= signal.len(),
            "The window size cannot be more than half the signal length"
        );
        assert!(result.len() <= window_size);

        let two = T::lit(2.0);
        self.windowed_autocorrelation(signal, window_size, result);

        let power = square_sum(&signal[..window_size]);
        let mut windowed_power = power;
        result.iter_mut().enumerate().for_each(|(i, a)| {
            *a = power + windowed_power - two * *a;
            // Slide pow_t^{t+w} to pow_{t+1}^{t+1+w}.
            windowed_power = windowed_power - signal[i] * signal[i]
                + signal[i + window_size] * signal[i + window_size];
        })
    }
}

/// Calculate the "cumulative mean normalized difference function" in place.
/// If _d(t)_ is the square difference function, _d'(0) = 1_ and for _t > 0_
///
///  > d'(t) = d(t) * t / sum_{i=1}^t d(i)
///
/// Lags whose running sum is still zero (a silent block) are set to 1.
pub fn yin_normalize_square_error<T: Float>(square_error: &mut [T]) {
    let Some((first, rest)) = square_error.split_first_mut() else {
        return;
    };
    *first = T::one();

    let mut sum = T::zero();
    rest.iter_mut().enumerate().for_each(|(i, d)| {
        sum = sum + *d;
        *d = if sum > T::zero() {
            *d * T::from_len(i + 1) / sum
        } else {
            T::one()
        };
    });
}
