//! Frame - Hamming-windowed analysis frames cut from a Sound.
//!
//! Frame positions are specified in seconds and converted to sample
//! indices with rounding:
//!
//! ```text
//! start_sample = round(start_time_s × sample_rate)
//! frame_size   = round(duration_s × sample_rate)
//! end_sample   = start_sample + frame_size
//! ```
//!
//! A frame that does not fit inside the signal is an `OutOfRange` error when
//! requested on its own, and ends a frame sequence early (without error)
//! when requested as part of one.

use std::f64::consts::PI;

use ndarray::Array1;

use crate::error::{Error, Result};
use crate::sound::Sound;

/// One windowed analysis frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Windowed samples (length = frame size).
    samples: Array1<f64>,
    /// Index of the first sample in the source Sound.
    start_sample: usize,
    /// Sample rate of the source Sound in Hz.
    sample_rate: u32,
}

impl Frame {
    /// Create a frame from already-windowed samples.
    pub fn new(samples: Array1<f64>, start_sample: usize, sample_rate: u32) -> Self {
        Self {
            samples,
            start_sample,
            sample_rate,
        }
    }

    /// Windowed samples.
    #[inline]
    pub fn samples(&self) -> &Array1<f64> {
        &self.samples
    }

    /// Number of samples in the frame.
    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the frame holds no samples.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Index of the first sample in the source Sound.
    #[inline]
    pub fn start_sample(&self) -> usize {
        self.start_sample
    }

    /// Start time of the frame in seconds.
    #[inline]
    pub fn start_time(&self) -> f64 {
        self.start_sample as f64 / self.sample_rate as f64
    }

    /// Sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Generate a symmetric Hamming window of length `n`.
///
/// ```text
/// w[i] = 0.54 - 0.46 × cos(2πi / (n - 1))
/// ```
///
/// A window of length 1 is `[1.0]`; length 0 gives an empty window.
pub fn hamming_window(n: usize) -> Array1<f64> {
    if n <= 1 {
        return Array1::ones(n);
    }
    let denom = (n - 1) as f64;
    Array1::from_iter((0..n).map(|i| 0.54 - 0.46 * (2.0 * PI * i as f64 / denom).cos()))
}

/// Convert a time in seconds to the nearest sample index.
fn seconds_to_samples(seconds: f64, sample_rate: u32) -> usize {
    (seconds * sample_rate as f64).round() as usize
}

/// Validate a start time / duration pair and return (start_sample, frame_size).
fn frame_bounds(start_time_s: f64, duration_s: f64, sample_rate: u32) -> Result<(usize, usize)> {
    if !start_time_s.is_finite() || start_time_s < 0.0 {
        return Err(Error::InvalidParameter(format!(
            "Start time must be a non-negative number of seconds, got {}",
            start_time_s
        )));
    }
    if !duration_s.is_finite() || duration_s <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "Frame duration must be positive, got {}",
            duration_s
        )));
    }

    let frame_size = seconds_to_samples(duration_s, sample_rate);
    if frame_size < 2 {
        return Err(Error::InvalidParameter(format!(
            "Frame duration {}s is shorter than two samples at {} Hz",
            duration_s, sample_rate
        )));
    }

    Ok((seconds_to_samples(start_time_s, sample_rate), frame_size))
}

/// Copy `[start_sample, start_sample + window.len())` and apply the window.
///
/// Returns `None` when the slice runs past the end of the signal or past
/// the addressable sample range.
fn windowed_slice(sound: &Sound, start_sample: usize, window: &Array1<f64>) -> Option<Frame> {
    let end_sample = start_sample.checked_add(window.len())?;
    if end_sample > sound.n_samples() {
        return None;
    }
    let samples = sound.samples().slice(ndarray::s![start_sample..end_sample]).to_owned() * window;
    Some(Frame::new(samples, start_sample, sound.sample_rate()))
}

/// Extract a single Hamming-windowed frame.
///
/// # Errors
///
/// - `Error::InvalidParameter` for a negative start time or a duration
///   shorter than two samples
/// - `Error::OutOfRange` if the frame ends past the end of the signal
pub fn extract_frame(sound: &Sound, start_time_s: f64, duration_s: f64) -> Result<Frame> {
    let (start_sample, frame_size) = frame_bounds(start_time_s, duration_s, sound.sample_rate())?;
    let window = hamming_window(frame_size);

    windowed_slice(sound, start_sample, &window).ok_or(Error::OutOfRange {
        start_sample,
        end_sample: start_sample.saturating_add(frame_size),
        n_samples: sound.n_samples(),
    })
}

/// Extract up to `count` consecutive Hamming-windowed frames.
///
/// Frame `i` starts at `start_sample + i × round(shift_s × sample_rate)`.
/// Extraction stops at the first frame that would run past the end of the
/// signal, so fewer than `count` frames (possibly none) may be returned.
///
/// # Errors
///
/// `Error::InvalidParameter` for invalid start time, duration or shift,
/// including a shift that rounds to zero samples.
pub fn extract_frame_sequence(
    sound: &Sound,
    start_time_s: f64,
    duration_s: f64,
    shift_s: f64,
    count: usize,
) -> Result<Vec<Frame>> {
    let (start_sample, frame_size) = frame_bounds(start_time_s, duration_s, sound.sample_rate())?;
    if !shift_s.is_finite() || shift_s <= 0.0 {
        return Err(Error::InvalidParameter(format!(
            "Frame shift must be positive, got {}",
            shift_s
        )));
    }
    let shift = seconds_to_samples(shift_s, sound.sample_rate());
    if shift == 0 {
        return Err(Error::InvalidParameter(format!(
            "Frame shift {}s is shorter than one sample at {} Hz",
            shift_s,
            sound.sample_rate()
        )));
    }
    let window = hamming_window(frame_size);

    let mut frames = Vec::with_capacity(count);
    for i in 0..count {
        let Some(current_start) = i
            .checked_mul(shift)
            .and_then(|offset| start_sample.checked_add(offset))
        else {
            log::warn!("Frame {} of {} starts past the addressable sample range", i + 1, count);
            break;
        };
        match windowed_slice(sound, current_start, &window) {
            Some(frame) => frames.push(frame),
            None => {
                log::warn!(
                    "Reached end of signal at frame {} of {} (frame would end at sample {}, signal has {})",
                    i + 1,
                    count,
                    current_start.saturating_add(frame_size),
                    sound.n_samples()
                );
                break;
            }
        }
    }

    Ok(frames)
}
