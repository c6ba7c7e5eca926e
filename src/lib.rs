//! # Pitch Tracker
//! *pitch_tracker* turns a stream of audio blocks into a stable pitch readout for a
//! tuner-style display. It has two stages:
//!
//!   * An [estimator][detector::yin::YinEstimator] that finds the fundamental frequency
//!     of one block with the YIN method, collecting every plausible period and
//!     preferring the fundamental over its harmonics.
//!   * A [tracker][tracker::PitchTracker] that gates quiet blocks, smooths the estimate,
//!     only accepts large jumps once several blocks agree, and smooths cents per note.
//!
//! [TrackingSession][tracker::session::TrackingSession] wires both together.
//!
//! # Examples
//! ```
//! use pitch_tracker::tracker::session::TrackingSession;
//!
//! const SAMPLE_RATE: usize = 44100;
//! const SIZE: usize = 4096;
//!
//! // Signal coming from some source (microphone, generated, etc...)
//! let dt = 1.0 / SAMPLE_RATE as f32;
//! let freq = 330.0;
//! let block: Vec<f32> = (0..SIZE)
//!     .map(|x| 0.5 * (2.0 * std::f32::consts::PI * x as f32 * dt * freq).sin())
//!     .collect();
//!
//! let mut session = TrackingSession::<f32>::new();
//! let reading = session.process(&block, SAMPLE_RATE, None).unwrap();
//!
//! if let Some(frequency) = reading.frequency {
//!     let note = session.note_reading(frequency).unwrap();
//!     println!("{} Hz: note {} {:+.1} cents", frequency, note.note, note.cents);
//! }
//! ```

pub use detector::PitchEstimator;
pub use error::{PitchError, Result};
pub use tracker::{PitchTracker, Reading};

pub mod detector;
pub mod error;
pub mod float;
pub mod tracker;
pub mod utils;
