use rustfft::FftNum;

use crate::detector::yin::YinEstimator;
use crate::detector::PitchEstimator;
use crate::error::Result;
use crate::float::Float;
use crate::tracker::{PitchTracker, Reading, TrackerParameters};
use crate::utils::buffer::rms;
use crate::utils::note::{nearest_note, REFERENCE_FREQUENCY};

/// Nearest semitone and smoothed cents for a tracked frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteReading<T: Float> {
    pub note: i32,
    /// Unsmoothed offset from `note` in cents.
    pub raw_cents: T,
    /// Offset after the per-note deadzone smoother.
    pub cents: T,
}

/// Estimator and tracker wired together for one capture session.
///
/// Call [process][TrackingSession::process] from the capture callback once per block.
/// Callbacks must not overlap; the session is not meant to be shared between threads
/// while in use.
pub struct TrackingSession<T, E = YinEstimator<T>>
where
    T: Float + FftNum,
{
    estimator: E,
    tracker: PitchTracker<T>,
    reference: T,
}

impl<T> TrackingSession<T>
where
    T: Float + FftNum,
{
    /// A session with the default YIN estimator and tracker parameters.
    pub fn new() -> Self {
        TrackingSession {
            estimator: YinEstimator::new(),
            tracker: PitchTracker::new(),
            reference: T::lit(REFERENCE_FREQUENCY),
        }
    }
}

impl<T> Default for TrackingSession<T>
where
    T: Float + FftNum,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> TrackingSession<T, E>
where
    T: Float + FftNum,
    E: PitchEstimator<T>,
{
    pub fn with_estimator(estimator: E, parameters: TrackerParameters) -> Result<Self> {
        Ok(TrackingSession {
            estimator,
            tracker: PitchTracker::with_parameters(parameters)?,
            reference: T::lit(REFERENCE_FREQUENCY),
        })
    }

    /// Use `reference` Hz for A4 when mapping frequencies to notes.
    pub fn with_reference(mut self, reference: T) -> Self {
        self.reference = reference;
        self
    }

    pub fn tracker(&self) -> &PitchTracker<T> {
        &self.tracker
    }

    pub fn estimator_mut(&mut self) -> &mut E {
        &mut self.estimator
    }

    /// Estimate and track one block. The block's RMS is used as amplitude unless the
    /// capture side supplies one.
    pub fn process(&mut self, block: &[T], sample_rate: usize, amplitude: Option<T>) -> Result<Reading<T>> {
        let amplitude = amplitude.unwrap_or_else(|| rms(block));
        let raw = self.estimator.estimate(block, sample_rate)?;
        Ok(self.tracker.update(raw, amplitude))
    }

    /// Smooth cents for a caller-computed note index.
    pub fn smoothed_cents(&mut self, note: i32, raw_cents: T) -> T {
        self.tracker.smooth_cents(note, raw_cents)
    }

    /// Map `frequency` (normally [Reading::frequency]) to its nearest note and smooth
    /// the cents offset.
    pub fn note_reading(&mut self, frequency: T) -> Option<NoteReading<T>> {
        let nearest = nearest_note(frequency, self.reference)?;
        let cents = self.tracker.smooth_cents(nearest.note, nearest.cents);
        Some(NoteReading {
            note: nearest.note,
            raw_cents: nearest.cents,
            cents,
        })
    }

    /// End of capture: forget all smoothing state.
    pub fn reset(&mut self) {
        self.tracker.reset();
    }
}
