//! Error types for pitchform.
//!
//! This module defines the errors that can occur while loading audio and
//! running the AMDF or cepstral analyses. All errors implement
//! `std::error::Error` via the `thiserror` crate.
//!
//! Note that an incomplete formant estimate (fewer than three peaks in the
//! smoothed spectrum) is not an error. It is an ordinary analysis outcome,
//! see [`FormantEstimate`](crate::cepstrum::FormantEstimate).

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using pitchform's Error type.
///
/// # Example
///
/// ```no_run
/// use pitchform::{Result, Sound};
///
/// fn load_and_analyze(path: &str) -> Result<()> {
///     let sound = Sound::from_file(path)?;
///     let pitch = sound.to_amdf_pitch(1.01, 0.030, 100.0, 160.0)?;
///     println!("F0 = {:.2} Hz", pitch.f0());
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during loading and analysis.
#[derive(Error, Debug)]
pub enum Error {
    /// The input path does not resolve to a file.
    #[error("Audio file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Error decoding a WAV file.
    ///
    /// Wraps errors from the `hound` WAV library (malformed header,
    /// unsupported encoding, truncated data).
    #[error("Failed to read audio file: {0}")]
    AudioRead(#[from] hound::Error),

    /// General file system error (e.g. reading a configuration file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested time window does not fit inside the signal.
    ///
    /// Carries the offending sample indices so callers can report how far
    /// past the end of the signal the window reached.
    #[error(
        "Frame [{start_sample}, {end_sample}) exceeds signal length of {n_samples} samples"
    )]
    OutOfRange {
        start_sample: usize,
        end_sample: usize,
        n_samples: usize,
    },

    /// Pitch search bounds are invalid for the sample rate, frame size or FFT size.
    #[error("Invalid lag range: {0}")]
    InvalidRange(String),

    /// Invalid parameter value (non-positive duration, channel out of range, ...).
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Configuration file could not be parsed.
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
