//! The YIN pitch detection algorithm is based on the algorithm from the paper
//! *[YIN, a fundamental frequency estimator for speech and music](http://recherche.ircam.fr/equipes/pcm/cheveign/ps/2002_JASA_YIN_proof.pdf)*.
//!
//! Let $S=(s_0,s_1,\ldots,s_N)$ be a discrete signal and $w = N/2$. The *square difference function*
//! at lag $t$ is
//! $$ d(t) = \sum_{i=0}^{w-1} (s_i-s_{i+t})^2. $$
//! It is close to zero when the signal "lines up" with itself, but its scale depends on volume.
//! The *cumulative mean normalized difference function*
//! $$ d\'(t) = \begin{cases}1&\text{if }t=0\\\\ d(t) / \left[ \tfrac{1}{t}\sum_{i=1}^t d(i) \right] & \text{otherwise}\end{cases} $$
//! removes that dependency so that a fixed threshold works for quiet and loud input alike.
//!
//! ## Candidate selection
//! The paper takes the first dip of $d\'$ below the threshold. A note with a strong second
//! harmonic produces a dip at half the period that is often just as deep, so this
//! implementation collects the bottom of *every* dip below the threshold and folds over them
//! left to right: a later dip wins if it is clearly deeper, or if it is comparably deep and
//! at a much longer lag. The second rule biases the choice toward the fundamental.
//! Dips at integer multiples of the current best lag are echoes of the same period; by
//! default they only win when clearly deeper (see [YinParameters::candidate_multiple_margin]).
//!
//! The chosen lag is refined with parabolic interpolation before being converted to Hz.
//!
//! ## Implementation
//! By default the difference function is evaluated directly, which costs
//! $O(w \cdot \tau_{max})$ per block. [DifferenceMethod::Fft] evaluates the same function through
//! an [FFT](https://en.wikipedia.org/wiki/Fast_Fourier_transform) based windowed autocorrelation,
//! which is faster for large blocks and equal up to rounding.

use log::trace;
use rustfft::FftNum;

use crate::detector::internals::{
    square_difference, yin_normalize_square_error, FftDifference, LagRange,
};
use crate::detector::PitchEstimator;
use crate::error::{PitchError, Result};
use crate::float::Float;
use crate::utils::buffer::new_real_buffer;
use crate::utils::peak::{choose_candidate, collect_candidates, refine_tau, SelectionFactors};

/// How the square difference function is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DifferenceMethod {
    /// Direct quadratic sum.
    #[default]
    Direct,
    /// Windowed autocorrelation through rustfft.
    Fft,
}

/// Frequency range, threshold and candidate selection weights of a [YinEstimator].
#[derive(Debug, Clone)]
pub struct YinParameters {
    /// Lowest detectable frequency in Hz. Bounds the longest lag searched.
    pub min_frequency: f64,
    /// Highest detectable frequency in Hz. Bounds the shortest lag searched.
    pub max_frequency: f64,
    /// Dips of the normalized difference function must fall below this value.
    pub threshold: f64,
    /// A later candidate below `best * candidate_strong_factor` always wins.
    pub candidate_strong_factor: f64,
    /// A later candidate below `best * candidate_similar_factor` wins if its lag is
    /// longer than `best.tau * candidate_fundamental_tau_factor`.
    pub candidate_similar_factor: f64,
    /// Lag ratio a comparably deep candidate must exceed to count as the fundamental.
    pub candidate_fundamental_tau_factor: f64,
    /// A later candidate at a multiple of the best lag must be `candidate_strong_factor`
    /// deeper and below the best by this absolute margin. `None` disables the check.
    pub candidate_multiple_margin: Option<f64>,
    /// How the square difference function is evaluated.
    pub difference: DifferenceMethod,
}

impl Default for YinParameters {
    fn default() -> Self {
        Self {
            min_frequency: 60.0,
            max_frequency: 2000.0,
            threshold: 0.20,
            candidate_strong_factor: 0.8,
            candidate_similar_factor: 1.2,
            candidate_fundamental_tau_factor: 1.5,
            candidate_multiple_margin: Some(0.02),
            difference: DifferenceMethod::Direct,
        }
    }
}

impl YinParameters {
    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.min_frequency) || !positive(self.max_frequency) {
            return Err(PitchError::InvalidParameters(format!(
                "frequency bounds must be positive, got {}..{}",
                self.min_frequency, self.max_frequency
            )));
        }
        if self.min_frequency >= self.max_frequency {
            return Err(PitchError::InvalidParameters(format!(
                "min_frequency {} must be below max_frequency {}",
                self.min_frequency, self.max_frequency
            )));
        }
        if !positive(self.threshold) || self.threshold >= 1.0 {
            return Err(PitchError::InvalidParameters(format!(
                "threshold must lie in (0, 1), got {}",
                self.threshold
            )));
        }
        if self.candidate_multiple_margin.map_or(false, |m| !(m >= 0.0)) {
            return Err(PitchError::InvalidParameters(
                "candidate_multiple_margin must not be negative".into(),
            ));
        }
        if !positive(self.candidate_strong_factor)
            || !positive(self.candidate_similar_factor)
            || !positive(self.candidate_fundamental_tau_factor)
        {
            return Err(PitchError::InvalidParameters(
                "candidate factors must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Pitch estimation based on the YIN algorithm with multi-candidate selection.
///
/// The estimator keeps a scratch buffer for the difference function so that
/// repeated calls with the same block size do not allocate. Nothing computed in
/// one call influences the next.
pub struct YinEstimator<T>
where
    T: Float + FftNum,
{
    parameters: YinParameters,
    threshold: T,
    factors: SelectionFactors<T>,
    difference: Vec<T>,
    fft: Option<FftDifference<T>>,
}

impl<T> YinEstimator<T>
where
    T: Float + FftNum,
{
    pub fn new() -> Self {
        Self::from_valid_parameters(YinParameters::default())
    }

    pub fn with_parameters(parameters: YinParameters) -> Result<Self> {
        parameters.validate()?;
        Ok(Self::from_valid_parameters(parameters))
    }

    fn from_valid_parameters(parameters: YinParameters) -> Self {
        YinEstimator {
            threshold: T::lit(parameters.threshold),
            factors: SelectionFactors {
                strong: T::lit(parameters.candidate_strong_factor),
                similar: T::lit(parameters.candidate_similar_factor),
                fundamental_tau: T::lit(parameters.candidate_fundamental_tau_factor),
                multiple_margin: parameters.candidate_multiple_margin.map(T::lit),
            },
            parameters,
            difference: new_real_buffer(0),
            fft: None,
        }
    }

    pub fn parameters(&self) -> &YinParameters {
        &self.parameters
    }

    /// Lag range searched for a block of `len` samples at `sample_rate`.
    pub fn lag_range(&self, len: usize, sample_rate: usize) -> LagRange {
        LagRange::new(
            sample_rate,
            self.parameters.min_frequency,
            self.parameters.max_frequency,
            len / 2,
        )
    }

    /// Smallest block length accepted at `sample_rate`.
    pub fn required_len(&self, sample_rate: usize) -> usize {
        let min_tau = (sample_rate as f64 / self.parameters.max_frequency).floor() as usize;
        2 * min_tau.max(1)
    }

    /// Fill the scratch buffer with the normalized difference function of `signal`
    /// over `range` and return it.
    fn normalized_difference(&mut self, signal: &[T], range: LagRange) -> &[T] {
        let window_size = signal.len() / 2;
        self.difference.resize(range.max_tau, T::zero());

        match self.parameters.difference {
            DifferenceMethod::Direct => {
                square_difference(signal, window_size, &mut self.difference);
            }
            DifferenceMethod::Fft => {
                if self.fft.as_ref().map_or(true, |fft| fft.size() != signal.len()) {
                    self.fft = Some(FftDifference::new(signal.len()));
                }
                if let Some(fft) = self.fft.as_mut() {
                    fft.windowed_square_error(signal, window_size, &mut self.difference);
                }
            }
        }

        yin_normalize_square_error(&mut self.difference);
        &self.difference
    }
}

impl<T> Default for YinEstimator<T>
where
    T: Float + FftNum,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PitchEstimator<T> for YinEstimator<T>
where
    T: Float + FftNum,
{
    fn estimate(&mut self, signal: &[T], sample_rate: usize) -> Result<Option<T>> {
        if sample_rate == 0 {
            return Err(PitchError::InvalidSampleRate { rate: sample_rate });
        }
        let required = self.required_len(sample_rate);
        if signal.len() < required {
            return Err(PitchError::InvalidInput {
                len: signal.len(),
                required,
            });
        }

        let range = self.lag_range(signal.len(), sample_rate);
        let threshold = self.threshold;
        let factors = self.factors;
        let cmndf = self.normalized_difference(signal, range);

        // d'(0) is pinned to 1, lag 0 is never a period.
        let candidates = collect_candidates(cmndf, range.min_tau.max(1), threshold);
        let Some(best) = choose_candidate(&candidates, &factors) else {
            trace!("no dip below {} in lags {:?}", threshold, range);
            return Ok(None);
        };

        let tau = refine_tau(cmndf, best.tau);
        let frequency = T::from_len(sample_rate) / tau;
        trace!(
            "{} candidates, chose tau {} (d' = {}), refined to {} -> {} Hz",
            candidates.len(),
            best.tau,
            best.value,
            tau,
            frequency
        );

        if frequency.is_finite() && frequency > T::zero() {
            Ok(Some(frequency))
        } else {
            Ok(None)
        }
    }
}
