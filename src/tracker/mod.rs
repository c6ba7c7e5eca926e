//! Block-to-block smoothing of raw pitch estimates.
//!
//! A [PitchTracker] sits downstream of a [PitchEstimator][crate::detector::PitchEstimator].
//! Raw estimates are noisy in two ways: small jitter around the true pitch, and
//! occasional single-block jumps to a harmonic or a transient. The tracker blends the
//! former away exponentially and holds back the latter until several consecutive
//! blocks agree on the new pitch.
//!
//! Cents are smoothed separately, per nearest semitone: crossing to a new note snaps
//! to the new value, small movements inside a deadzone are ignored.

use log::{debug, trace};

use crate::error::{PitchError, Result};
use crate::float::Float;

pub mod session;

#[derive(Debug, Clone)]
pub struct TrackerParameters {
    /// Blocks quieter than this (RMS) report no pitch and reset the tracker.
    pub amplitude_threshold: f64,
    /// Raw estimates at or above this frequency (Hz) are treated as no pitch.
    pub max_frequency: f64,
    /// Weight of the previous value when blending in a new raw estimate.
    pub pitch_smoothing: f64,
    /// Weight of the previous value when blending cents.
    pub cents_smoothing: f64,
    /// Cents changes smaller than this are ignored.
    pub cents_deadzone: f64,
    /// Consecutive agreeing blocks required before a jump is accepted.
    pub jump_confirm_blocks: usize,
    /// `raw / smoothed` above this ratio is a jump.
    pub jump_ratio_high: f64,
    /// `raw / smoothed` below this ratio is a jump.
    pub jump_ratio_low: f64,
    /// Relative distance within which a raw estimate corroborates the pending jump.
    pub jump_match_tolerance: f64,
}

impl Default for TrackerParameters {
    fn default() -> Self {
        Self {
            amplitude_threshold: 0.005,
            max_frequency: 5000.0,
            pitch_smoothing: 0.7,
            cents_smoothing: 0.88,
            cents_deadzone: 1.5,
            jump_confirm_blocks: 3,
            jump_ratio_high: 1.8,
            jump_ratio_low: 0.55,
            jump_match_tolerance: 0.1,
        }
    }
}

impl TrackerParameters {
    pub fn validate(&self) -> Result<()> {
        let unit = |v: f64| (0.0..1.0).contains(&v);
        if !unit(self.pitch_smoothing) || !unit(self.cents_smoothing) {
            return Err(PitchError::InvalidParameters(format!(
                "smoothing factors must lie in [0, 1), got {} and {}",
                self.pitch_smoothing, self.cents_smoothing
            )));
        }
        if !(self.jump_ratio_low > 0.0 && self.jump_ratio_low <= 1.0 && self.jump_ratio_high >= 1.0) {
            return Err(PitchError::InvalidParameters(format!(
                "jump ratio band {}..{} must contain 1",
                self.jump_ratio_low, self.jump_ratio_high
            )));
        }
        if self.jump_confirm_blocks == 0 {
            return Err(PitchError::InvalidParameters(
                "jump_confirm_blocks must be at least 1".into(),
            ));
        }
        if !(self.amplitude_threshold >= 0.0
            && self.cents_deadzone >= 0.0
            && self.jump_match_tolerance >= 0.0
            && self.max_frequency > 0.0)
        {
            return Err(PitchError::InvalidParameters(
                "thresholds and tolerances must not be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Progress of a suspected pitch jump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpState<T: Float> {
    Stable,
    /// `count` consecutive raw estimates within tolerance of `candidate`.
    AwaitingConfirmation { candidate: T, count: usize },
}

/// What the tracker reports for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading<T: Float> {
    /// Smoothed frequency in Hz, `None` when no tone is present.
    pub frequency: Option<T>,
    /// Block amplitude the gate was evaluated on.
    pub amplitude: T,
}

/// Deadzoned exponential smoother for cents, reset on every note change.
#[derive(Debug, Clone)]
pub struct CentsSmoother<T: Float> {
    smoothing: T,
    deadzone: T,
    note: Option<i32>,
    cents: T,
}

impl<T: Float> CentsSmoother<T> {
    pub fn new(smoothing: T, deadzone: T) -> Self {
        CentsSmoother {
            smoothing,
            deadzone,
            note: None,
            cents: T::zero(),
        }
    }

    pub fn smooth(&mut self, note: i32, raw_cents: T) -> T {
        if self.note != Some(note) {
            self.note = Some(note);
            self.cents = raw_cents;
            return raw_cents;
        }

        if (raw_cents - self.cents).abs() < self.deadzone {
            return self.cents;
        }

        self.cents = self.smoothing * self.cents + (T::one() - self.smoothing) * raw_cents;
        self.cents
    }

    /// Note the smoothed value belongs to, `None` after a reset.
    pub fn note(&self) -> Option<i32> {
        self.note
    }

    pub fn reset(&mut self) {
        self.note = None;
    }
}

/// Session state for smoothing a stream of raw estimates.
///
/// Create one when capture starts and drop or [reset][PitchTracker::reset] it when
/// capture stops. It is updated once per block from a single callback.
#[derive(Debug, Clone)]
pub struct PitchTracker<T: Float> {
    parameters: TrackerParameters,
    smoothed: Option<T>,
    jump: JumpState<T>,
    cents: CentsSmoother<T>,
}

impl<T: Float> PitchTracker<T> {
    pub fn new() -> Self {
        Self::from_valid_parameters(TrackerParameters::default())
    }

    pub fn with_parameters(parameters: TrackerParameters) -> Result<Self> {
        parameters.validate()?;
        Ok(Self::from_valid_parameters(parameters))
    }

    fn from_valid_parameters(parameters: TrackerParameters) -> Self {
        PitchTracker {
            cents: CentsSmoother::new(
                T::lit(parameters.cents_smoothing),
                T::lit(parameters.cents_deadzone),
            ),
            parameters,
            smoothed: None,
            jump: JumpState::Stable,
        }
    }

    pub fn parameters(&self) -> &TrackerParameters {
        &self.parameters
    }

    /// Current smoothed pitch, `None` when the last block had no pitch.
    pub fn smoothed(&self) -> Option<T> {
        self.smoothed
    }

    pub fn jump_state(&self) -> JumpState<T> {
        self.jump
    }

    /// Note index of the smoothed cents, `None` when unset.
    pub fn cents_note(&self) -> Option<i32> {
        self.cents.note()
    }

    /// Forget the smoothed pitch, any pending jump and the cents note.
    pub fn reset(&mut self) {
        self.smoothed = None;
        self.jump = JumpState::Stable;
        self.cents.reset();
    }

    /// Feed the raw estimate of one block and its amplitude.
    pub fn update(&mut self, raw: Option<T>, amplitude: T) -> Reading<T> {
        let frequency = self.next_frequency(raw, amplitude);
        Reading {
            frequency,
            amplitude,
        }
    }

    fn next_frequency(&mut self, raw: Option<T>, amplitude: T) -> Option<T> {
        let gate = T::lit(self.parameters.amplitude_threshold);
        let max_frequency = T::lit(self.parameters.max_frequency);

        let raw = match raw {
            Some(hz) if amplitude >= gate && hz > T::zero() && hz < max_frequency => hz,
            _ => {
                if self.smoothed.is_some() {
                    trace!("no pitch (raw {:?}, amplitude {}), resetting", raw, amplitude);
                }
                self.reset();
                return None;
            }
        };

        let Some(current) = self.smoothed else {
            self.smoothed = Some(raw);
            self.jump = JumpState::Stable;
            return self.smoothed;
        };

        let ratio = raw / current;
        let low = T::lit(self.parameters.jump_ratio_low);
        let high = T::lit(self.parameters.jump_ratio_high);
        if ratio >= low && ratio <= high {
            let a = T::lit(self.parameters.pitch_smoothing);
            self.jump = JumpState::Stable;
            self.smoothed = Some(a * current + (T::one() - a) * raw);
            return self.smoothed;
        }

        let tolerance = T::lit(self.parameters.jump_match_tolerance);
        let (candidate, count) = match self.jump {
            JumpState::AwaitingConfirmation { candidate, count }
                if (raw - candidate).abs() <= tolerance * candidate =>
            {
                (candidate, count + 1)
            }
            _ => (raw, 1),
        };

        if count >= self.parameters.jump_confirm_blocks {
            debug!("jump from {} Hz to {} Hz confirmed after {} blocks", current, raw, count);
            self.jump = JumpState::Stable;
            self.smoothed = Some(raw);
        } else {
            trace!("holding {} Hz, jump to {} Hz seen {} times", current, candidate, count);
            self.jump = JumpState::AwaitingConfirmation { candidate, count };
        }
        self.smoothed
    }

    /// Smooth the cents offset of the current reading from semitone `note`.
    ///
    /// The first call after a note change (or after a block without pitch) returns
    /// `raw_cents` unchanged.
    pub fn smooth_cents(&mut self, note: i32, raw_cents: T) -> T {
        self.cents.smooth(note, raw_cents)
    }
}

impl<T: Float> Default for PitchTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}
