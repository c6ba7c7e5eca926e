//! Frequency to equal-tempered semitone conversion.
//!
//! Semitones are numbered like MIDI notes: A4 (the reference) is 69, middle C is 60.
//! Naming notes is left to the caller.
use crate::float::Float;

/// Concert pitch A4 in Hz.
pub const REFERENCE_FREQUENCY: f64 = 440.0;
/// Semitone number of the reference frequency.
pub const REFERENCE_NOTE: i32 = 69;

/// The nearest semitone to a frequency and the signed offset from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestNote<T: Float> {
    pub note: i32,
    /// Offset from `note` in cents, in `[-50, 50]`. Positive is sharp.
    pub cents: T,
}

/// Map `frequency` to its nearest semitone relative to `reference` (the frequency of
/// note [REFERENCE_NOTE]). Returns `None` for non-positive or non-finite input.
pub fn nearest_note<T: Float>(frequency: T, reference: T) -> Option<NearestNote<T>> {
    if !(frequency > T::zero()) || !frequency.is_finite() || !(reference > T::zero()) {
        return None;
    }

    let semitones = T::lit(12.0) * (frequency / reference).log2();
    let rounded = semitones.round();
    let note = REFERENCE_NOTE + rounded.to_i32()?;
    Some(NearestNote {
        note,
        cents: T::lit(100.0) * (semitones - rounded),
    })
}

/// Frequency of semitone `note` relative to `reference`.
pub fn note_frequency<T: Float>(note: i32, reference: T) -> T {
    let offset = T::from_i32(note - REFERENCE_NOTE).unwrap_or_else(T::nan);
    reference * (offset / T::lit(12.0)).exp2()
}
