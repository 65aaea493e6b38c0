//! Sound - Audio samples with an integer sample rate.
//!
//! This is the foundation type for every analysis in pitchform.
//!
//! # Channel Handling
//!
//! Analysis always runs on a single channel. `Sound::from_file()` keeps the
//! first channel of a multi-channel recording; `Sound::from_file_channel()`
//! selects another one explicitly.
//!
//! # Sample Format
//!
//! Samples are stored as 64-bit floating point values. Integer formats are
//! divided by the full-scale magnitude of their bit depth (2^(bits-1), e.g.
//! 32768 for 16-bit audio) so that they land in [-1.0, 1.0]. Float formats
//! are passed through unchanged apart from the precision cast.

use std::io;
use std::path::Path;

use ndarray::Array1;

use crate::amdf::AmdfPitch;
use crate::config::CepstralConfig;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::session::CepstralSession;

/// Mono audio samples with sample rate.
///
/// A `Sound` is immutable once created; every analysis borrows it.
///
/// # Example
///
/// ```no_run
/// use pitchform::Sound;
///
/// let sound = Sound::from_file("vowel_a.wav").unwrap();
/// println!("Duration: {:.3}s", sound.duration());
/// ```
#[derive(Debug, Clone)]
pub struct Sound {
    /// Audio samples, normalized to [-1.0, 1.0] for integer sources.
    samples: Array1<f64>,

    /// Sample rate in Hz (typically 44100 for the recordings this targets).
    sample_rate: u32,
}

impl Sound {
    /// Create a Sound from samples and sample rate.
    pub fn new(samples: Array1<f64>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Create a Sound from a slice of samples.
    ///
    /// Convenience constructor that copies data from a slice, mostly used
    /// for synthetic test signals.
    pub fn from_slice(samples: &[f64], sample_rate: u32) -> Self {
        Self {
            samples: Array1::from_vec(samples.to_vec()),
            sample_rate,
        }
    }

    /// Load audio from a WAV file, keeping only the first channel.
    ///
    /// # Errors
    ///
    /// - `Error::FileNotFound` if the path does not resolve
    /// - `Error::AudioRead` if the file cannot be decoded
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_channel(path, 0)
    }

    /// Load a specific channel from a WAV file.
    ///
    /// WAV files store interleaved samples: [L0, R0, L1, R1, ...]. This
    /// takes every Nth sample starting at index `channel`, where N is the
    /// number of channels.
    ///
    /// # Errors
    ///
    /// - `Error::FileNotFound` if the path does not resolve
    /// - `Error::InvalidParameter` if the channel index is out of range
    /// - `Error::AudioRead` if the file cannot be decoded
    pub fn from_file_channel<P: AsRef<Path>>(path: P, channel: usize) -> Result<Self> {
        let path = path.as_ref();
        let reader = hound::WavReader::open(path).map_err(|err| match err {
            hound::Error::IoError(io_err) if io_err.kind() == io::ErrorKind::NotFound => {
                Error::FileNotFound(path.to_path_buf())
            }
            other => Error::AudioRead(other),
        })?;
        let spec = reader.spec();
        let n_channels = spec.channels as usize;

        if channel >= n_channels {
            return Err(Error::InvalidParameter(format!(
                "Channel {} does not exist. File has {} channels.",
                channel, n_channels
            )));
        }

        let interleaved: Vec<f64> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .into_samples::<f32>()
                .map(|s| s.map(f64::from))
                .collect::<std::result::Result<Vec<f64>, _>>()?,
            hound::SampleFormat::Int => {
                let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f64;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f64 / full_scale))
                    .collect::<std::result::Result<Vec<f64>, _>>()?
            }
        };

        let samples: Vec<f64> = interleaved
            .iter()
            .skip(channel)
            .step_by(n_channels)
            .copied()
            .collect();

        log::debug!(
            "Loaded {} ({} Hz, {} channels, {} bit {:?}), kept channel {}: {} samples",
            path.display(),
            spec.sample_rate,
            n_channels,
            spec.bits_per_sample,
            spec.sample_format,
            channel,
            samples.len()
        );

        Ok(Self {
            samples: Array1::from_vec(samples),
            sample_rate: spec.sample_rate,
        })
    }

    /// Get the audio samples.
    #[inline]
    pub fn samples(&self) -> &Array1<f64> {
        &self.samples
    }

    /// Get the sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of samples.
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Get the total duration in seconds.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.n_samples() as f64 / self.sample_rate as f64
    }

    // ========== Analysis Methods ==========
    //
    // Thin wrappers that delegate to the module implementing each step.

    /// Extract a single Hamming-windowed frame.
    ///
    /// See [`extract_frame`](crate::frame::extract_frame).
    pub fn to_frame(&self, start_time_s: f64, duration_s: f64) -> Result<Frame> {
        crate::frame::extract_frame(self, start_time_s, duration_s)
    }

    /// Extract up to `count` consecutive frames spaced `shift_s` apart.
    ///
    /// See [`extract_frame_sequence`](crate::frame::extract_frame_sequence).
    pub fn to_frames(
        &self,
        start_time_s: f64,
        duration_s: f64,
        shift_s: f64,
        count: usize,
    ) -> Result<Vec<Frame>> {
        crate::frame::extract_frame_sequence(self, start_time_s, duration_s, shift_s, count)
    }

    /// Estimate pitch of one frame with the Average Magnitude Difference Function.
    ///
    /// # Arguments
    ///
    /// * `start_time_s` - Start of the analysis window in seconds
    /// * `duration_s` - Frame duration in seconds (typically 0.030)
    /// * `min_pitch_hz` - Lowest pitch to search for
    /// * `max_pitch_hz` - Highest pitch to search for
    pub fn to_amdf_pitch(
        &self,
        start_time_s: f64,
        duration_s: f64,
        min_pitch_hz: f64,
        max_pitch_hz: f64,
    ) -> Result<AmdfPitch> {
        let frame = self.to_frame(start_time_s, duration_s)?;
        crate::amdf::frame_to_amdf_pitch(&frame, min_pitch_hz, max_pitch_hz)
    }

    /// Run the cepstral pitch/formant analysis over consecutive frames.
    ///
    /// See [`sound_to_cepstral_session`](crate::session::sound_to_cepstral_session).
    pub fn to_cepstral_session(
        &self,
        start_time_s: f64,
        config: &CepstralConfig,
    ) -> Result<CepstralSession> {
        crate::session::sound_to_cepstral_session(self, start_time_s, config)
    }
}

impl std::fmt::Display for Sound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Sound({} samples, {} Hz, {:.3}s)",
            self.n_samples(),
            self.sample_rate,
            self.duration()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, spec: hound::WavSpec, frames: &[Vec<i32>]) {
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for frame in frames {
            for &sample in frame {
                match spec.bits_per_sample {
                    8 => writer.write_sample(sample as i8).unwrap(),
                    16 => writer.write_sample(sample as i16).unwrap(),
                    _ => writer.write_sample(sample).unwrap(),
                }
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_missing_file_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does_not_exist.wav");
        match Sound::from_file(&path) {
            Err(Error::FileNotFound(p)) => assert_eq!(p, path),
            other => panic!("expected FileNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_stereo_16bit_keeps_first_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(
            &path,
            spec,
            &[vec![16384, -32768], vec![-8192, 100], vec![32767, 0]],
        );

        let sound = Sound::from_file(&path).unwrap();
        assert_eq!(sound.sample_rate(), 44100);
        assert_eq!(sound.n_samples(), 3);
        assert_eq!(sound.samples()[0], 0.5);
        assert_eq!(sound.samples()[1], -0.25);
        assert!((sound.samples()[2] - 32767.0 / 32768.0).abs() < 1e-12);

        let right = Sound::from_file_channel(&path, 1).unwrap();
        assert_eq!(right.samples()[0], -1.0);
    }

    #[test]
    fn test_24bit_normalized_by_own_full_scale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono24.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 16000,
            bits_per_sample: 24,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&path, spec, &[vec![1 << 22], vec![-(1 << 23)]]);

        let sound = Sound::from_file(&path).unwrap();
        assert_eq!(sound.samples()[0], 0.5);
        assert_eq!(sound.samples()[1], -1.0);
    }

    #[test]
    fn test_float_passes_through() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for v in [0.25f32, -0.75, 0.0] {
            writer.write_sample(v).unwrap();
        }
        writer.finalize().unwrap();

        let sound = Sound::from_file(&path).unwrap();
        assert_eq!(sound.samples().to_vec(), vec![0.25, -0.75, 0.0]);
        assert_eq!(sound.sample_rate(), 8000);
    }

    #[test]
    fn test_channel_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        write_wav(&path, spec, &[vec![0]]);
        assert!(matches!(
            Sound::from_file_channel(&path, 1),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_duration() {
        let sound = Sound::from_slice(&[0.0; 22050], 44100);
        assert!((sound.duration() - 0.5).abs() < 1e-12);
    }
}
