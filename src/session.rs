//! Session - Cepstral analysis over consecutive frames with averaging.
//!
//! A session cuts up to `frame_count` frames spaced `frame_shift_s` apart,
//! runs the cepstral pipeline on each, and averages the results:
//!
//! - F0 is averaged over every analyzed frame
//! - F1, F2 and F3 are each averaged over the frames whose formant
//!   estimate is complete; incomplete frames are left out, not counted
//!   as zero
//!
//! Running out of signal before `frame_count` frames is not an error; the
//! averages are taken over the frames that were obtained.

use crate::cepstrum::{CepstralAnalyzer, CepstralFrame};
use crate::config::CepstralConfig;
use crate::error::Result;
use crate::sound::Sound;

/// Session-level averages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionAverages {
    /// Mean F0 over all frames (None when no frame was analyzed).
    pub f0: Option<f64>,
    /// Mean F1 over frames with a complete formant estimate.
    pub f1: Option<f64>,
    /// Mean F2 over frames with a complete formant estimate.
    pub f2: Option<f64>,
    /// Mean F3 over frames with a complete formant estimate.
    pub f3: Option<f64>,
}

/// Per-frame cepstral results for one analysis session.
#[derive(Debug, Clone)]
pub struct CepstralSession {
    /// Results, one per analyzed frame, in time order.
    frames: Vec<CepstralFrame>,
    /// Number of frames that were asked for.
    requested_frames: usize,
}

impl CepstralSession {
    /// Create a session from already-analyzed frames.
    pub fn new(frames: Vec<CepstralFrame>, requested_frames: usize) -> Self {
        Self {
            frames,
            requested_frames,
        }
    }

    /// Per-frame results.
    #[inline]
    pub fn frames(&self) -> &[CepstralFrame] {
        &self.frames
    }

    /// Number of analyzed frames.
    #[inline]
    pub fn n_frames(&self) -> usize {
        self.frames.len()
    }

    /// Number of frames that were asked for.
    #[inline]
    pub fn requested_frames(&self) -> usize {
        self.requested_frames
    }

    /// Whether the signal ended before every requested frame was cut.
    #[inline]
    pub fn is_truncated(&self) -> bool {
        self.frames.len() < self.requested_frames
    }

    /// Number of frames with a complete F1-F3 estimate.
    pub fn n_complete_formants(&self) -> usize {
        self.frames
            .iter()
            .filter(|f| f.formants.is_complete())
            .count()
    }

    /// Mean F0 over all frames.
    pub fn mean_f0(&self) -> Option<f64> {
        mean(self.frames.iter().map(|f| f.f0))
    }

    /// Mean of formant n (1-based) over the frames where it is present.
    pub fn mean_formant(&self, n: usize) -> Option<f64> {
        mean(self.frames.iter().filter_map(|f| f.formants.formant(n)))
    }

    /// All session averages.
    pub fn averages(&self) -> SessionAverages {
        SessionAverages {
            f0: self.mean_f0(),
            f1: self.mean_formant(1),
            f2: self.mean_formant(2),
            f3: self.mean_formant(3),
        }
    }
}

/// Arithmetic mean, or None for an empty sequence.
fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Run the cepstral analysis over consecutive frames of a Sound.
///
/// # Arguments
///
/// * `sound` - Source signal (known to be voiced over the analyzed span)
/// * `start_time_s` - Start of the first frame in seconds
/// * `config` - Frame, FFT, lifter, pitch and formant parameters
///
/// # Errors
///
/// Configuration errors (`InvalidParameter`, `InvalidRange`) are reported
/// before any frame is analyzed. Running out of signal is not an error.
pub fn sound_to_cepstral_session(
    sound: &Sound,
    start_time_s: f64,
    config: &CepstralConfig,
) -> Result<CepstralSession> {
    let analyzer = CepstralAnalyzer::new(sound.sample_rate(), config)?;

    let frames = crate::frame::extract_frame_sequence(
        sound,
        start_time_s,
        config.frame_duration_s,
        config.frame_shift_s,
        config.frame_count,
    )?;

    log::info!(
        "Analyzing {} of {} requested frames from {:.3}s",
        frames.len(),
        config.frame_count,
        start_time_s
    );

    let results = frames
        .iter()
        .map(|frame| analyzer.analyze(frame))
        .collect::<Result<Vec<_>>>()?;

    let session = CepstralSession::new(results, config.frame_count);

    let averages = session.averages();
    log::info!(
        "Session averages: F0 = {:?} Hz, F1 = {:?} Hz, F2 = {:?} Hz, F3 = {:?} Hz ({} of {} frames with 3 formants)",
        averages.f0,
        averages.f1,
        averages.f2,
        averages.f3,
        session.n_complete_formants(),
        session.n_frames()
    );

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cepstrum::{Cepstrum, FormantEstimate};
    use crate::error::Error;
    use ndarray::Array1;
    use std::f64::consts::PI;

    fn result(f0: f64, peaks: Vec<f64>) -> CepstralFrame {
        CepstralFrame {
            time: 0.0,
            pitch_period: 0,
            f0,
            pitch_peak_value: 0.0,
            formants: FormantEstimate::from_peaks(peaks),
            cepstrum: Cepstrum::new(Array1::zeros(4)),
            smoothed_spectrum: Array1::zeros(3),
            df: 1.0,
            imaginary_residue: 0.0,
        }
    }

    fn pulse_train(period: usize, n: usize) -> Vec<f64> {
        let one_period: Vec<f64> = (0..period)
            .map(|i| {
                (1..=20)
                    .map(|k| (2.0 * PI * k as f64 * i as f64 / period as f64).cos())
                    .sum::<f64>()
                    * 0.02
            })
            .collect();
        (0..n).map(|i| one_period[i % period]).collect()
    }

    fn test_config() -> CepstralConfig {
        CepstralConfig {
            frame_duration_s: 0.040,
            frame_shift_s: 0.010,
            frame_count: 6,
            n_fft: 512,
            lifter_cutoff_samples: 30,
            min_pitch_hz: 100.0,
            max_pitch_hz: 200.0,
            formant_min_separation_hz: 400.0,
        }
    }

    #[test]
    fn test_incomplete_formants_excluded_from_averages() {
        let session = CepstralSession::new(
            vec![
                result(100.0, vec![500.0, 1500.0, 2500.0]),
                result(110.0, vec![700.0]),
                result(120.0, vec![600.0, 1700.0, 2700.0, 3500.0]),
            ],
            3,
        );
        let averages = session.averages();
        assert_eq!(averages.f0, Some(110.0));
        assert_eq!(averages.f1, Some(550.0));
        assert_eq!(averages.f2, Some(1600.0));
        assert_eq!(averages.f3, Some(2600.0));
        assert_eq!(session.n_complete_formants(), 2);
        assert!(!session.is_truncated());
    }

    #[test]
    fn test_no_complete_formants_gives_none() {
        let session = CepstralSession::new(vec![result(100.0, vec![])], 6);
        let averages = session.averages();
        assert_eq!(averages.f0, Some(100.0));
        assert_eq!(averages.f1, None);
        assert!(session.is_truncated());
    }

    #[test]
    fn test_empty_session() {
        let session = CepstralSession::new(Vec::new(), 6);
        assert_eq!(session.averages().f0, None);
    }

    #[test]
    fn test_session_recovers_pitch_on_every_frame() {
        let sound = Sound::from_slice(&pulse_train(50, 8000), 8000);
        let session = sound.to_cepstral_session(0.1, &test_config()).unwrap();

        assert_eq!(session.n_frames(), 6);
        for frame in session.frames() {
            assert!(
                (frame.pitch_period as i64 - 50).abs() <= 1,
                "frame at {:.3}s: period {}",
                frame.time,
                frame.pitch_period
            );
        }
        let f0 = session.mean_f0().unwrap();
        assert!((f0 - 160.0).abs() < 5.0, "mean F0 {} should be near 160", f0);
    }

    #[test]
    fn test_truncated_session_averages_available_frames() {
        // 0.1 s of signal: frames at 0.05, 0.06 fit (end 0.09, 0.10), 0.07 does not.
        let sound = Sound::from_slice(&pulse_train(50, 800), 8000);
        let session = sound.to_cepstral_session(0.05, &test_config()).unwrap();

        assert_eq!(session.n_frames(), 2);
        assert_eq!(session.requested_frames(), 6);
        assert!(session.is_truncated());

        let expected = (session.frames()[0].f0 + session.frames()[1].f0) / 2.0;
        assert!((session.mean_f0().unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_configuration_fails_before_analysis() {
        let sound = Sound::from_slice(&pulse_train(50, 8000), 8000);
        let config = CepstralConfig {
            min_pitch_hz: 300.0,
            max_pitch_hz: 200.0,
            ..test_config()
        };
        assert!(matches!(
            sound.to_cepstral_session(0.1, &config),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn test_shift_below_one_sample_is_rejected() {
        let sound = Sound::from_slice(&pulse_train(50, 8000), 8000);
        let config = CepstralConfig {
            frame_shift_s: 1e-5,
            ..test_config()
        };
        assert!(matches!(
            sound.to_cepstral_session(0.1, &config),
            Err(Error::InvalidParameter(_))
        ));
    }
}
