//! Cepstrum - Joint pitch and formant estimation by real cepstrum analysis.
//!
//! The cepstrum separates the two factors of the source-filter model of
//! speech. In the log-magnitude spectrum the excitation (harmonics of F0)
//! and the vocal tract envelope (formants) add, and after an inverse
//! transform they land at different quefrencies:
//!
//! - **High quefrency**: a peak at the pitch period
//! - **Low quefrency**: the smooth spectral envelope
//!
//! # Per-frame Pipeline
//!
//! 1. X = one-sided DFT of the frame, zero-padded to n_fft points
//! 2. L[k] = ln(|X[k]| + 1e-6)
//! 3. c = inverse one-sided DFT of L (L treated as Hermitian, so c is real)
//! 4. Pitch period = argmax of c over quefrencies [min_lag, max_lag)
//! 5. Low-time lifter: keep c[0..cutoff), zero the rest
//! 6. Smoothed spectrum = real part of the one-sided DFT of the liftered
//!    cepstrum (not exponentiated, not logged again)
//! 7. Formants = first three peaks of the smoothed spectrum that are at
//!    least `formant_min_separation_hz` apart
//!
//! The lifter is one-sided, so the smoothed spectrum equals half the
//! symmetric envelope plus a constant; peak positions are unaffected.

use std::sync::Arc;

use ndarray::Array1;
use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::config::CepstralConfig;
use crate::error::{Error, Result};
use crate::frame::Frame;
use crate::lag::LagRange;
use crate::peaks::find_peaks;

/// Floor added to magnitudes before taking the log.
pub const LOG_EPSILON: f64 = 1e-6;

/// Real cepstrum of one frame.
#[derive(Debug, Clone)]
pub struct Cepstrum {
    /// Cepstral coefficients indexed by quefrency (samples), length n_fft.
    values: Array1<f64>,
}

impl Cepstrum {
    /// Wrap precomputed cepstral coefficients.
    pub fn new(values: Array1<f64>) -> Self {
        Self { values }
    }

    /// Cepstral coefficients.
    #[inline]
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Number of coefficients (the FFT size).
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the cepstrum holds no coefficients.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Largest coefficient over quefrencies `[min_lag, max_lag)`.
    ///
    /// Returns `(quefrency, value)`; the first occurrence wins on ties.
    /// The caller guarantees a non-empty range inside the cepstrum.
    pub fn peak_in(&self, lag_range: LagRange) -> (usize, f64) {
        let mut best = lag_range.min_lag;
        for q in lag_range.min_lag..lag_range.max_lag {
            if self.values[q] > self.values[best] {
                best = q;
            }
        }
        (best, self.values[best])
    }

    /// Apply a low-time lifter: keep quefrencies `[0, cutoff)`, zero the rest.
    pub fn liftered(&self, cutoff: usize) -> Array1<f64> {
        Array1::from_iter(
            self.values
                .iter()
                .enumerate()
                .map(|(q, &c)| if q < cutoff { c } else { 0.0 }),
        )
    }
}

/// Formant frequencies picked from a smoothed spectrum.
///
/// F1-F3 are only defined when at least three peaks survived; otherwise the
/// estimate is incomplete and every formant accessor returns `None`. The
/// raw peak list is kept either way.
#[derive(Debug, Clone, PartialEq)]
pub struct FormantEstimate {
    /// All surviving peak frequencies in Hz, ascending.
    peak_frequencies: Vec<f64>,
}

impl FormantEstimate {
    /// Build an estimate from peak frequencies in ascending order.
    pub fn from_peaks(peak_frequencies: Vec<f64>) -> Self {
        Self { peak_frequencies }
    }

    /// Whether F1, F2 and F3 are all available.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.peak_frequencies.len() >= 3
    }

    /// Formant n in Hz (1-based, n in 1..=3).
    pub fn formant(&self, n: usize) -> Option<f64> {
        if self.is_complete() && (1..=3).contains(&n) {
            Some(self.peak_frequencies[n - 1])
        } else {
            None
        }
    }

    /// First formant in Hz.
    pub fn f1(&self) -> Option<f64> {
        self.formant(1)
    }

    /// Second formant in Hz.
    pub fn f2(&self) -> Option<f64> {
        self.formant(2)
    }

    /// Third formant in Hz.
    pub fn f3(&self) -> Option<f64> {
        self.formant(3)
    }

    /// Every peak that survived the distance check, in Hz.
    #[inline]
    pub fn peak_frequencies(&self) -> &[f64] {
        &self.peak_frequencies
    }
}

/// Cepstral analysis result for one frame.
#[derive(Debug, Clone)]
pub struct CepstralFrame {
    /// Start time of the analyzed frame in seconds.
    pub time: f64,
    /// Pitch period in samples (quefrency of the cepstral peak).
    pub pitch_period: usize,
    /// Fundamental frequency in Hz.
    pub f0: f64,
    /// Cepstral amplitude at the pitch period.
    pub pitch_peak_value: f64,
    /// Formant estimate from the smoothed spectrum.
    pub formants: FormantEstimate,
    /// Full real cepstrum.
    pub cepstrum: Cepstrum,
    /// Cepstrally smoothed spectrum, n_fft / 2 + 1 bins from 0 Hz to Nyquist.
    pub smoothed_spectrum: Array1<f64>,
    /// Bin width of `smoothed_spectrum` in Hz.
    pub df: f64,
    /// Largest |imaginary part| discarded from the smoothed spectrum.
    pub imaginary_residue: f64,
}

impl CepstralFrame {
    /// Frequency axis aligned with `smoothed_spectrum`.
    pub fn frequencies(&self) -> Array1<f64> {
        Array1::from_iter((0..self.smoothed_spectrum.len()).map(|k| k as f64 * self.df))
    }
}

/// Reusable cepstral analyzer for frames at one sample rate.
///
/// Plans the forward and inverse FFTs once and validates the configuration
/// up front, so per-frame analysis only fails for frames that do not match.
pub struct CepstralAnalyzer {
    sample_rate: u32,
    n_fft: usize,
    lifter_cutoff: usize,
    lag_range: LagRange,
    min_separation_bins: usize,
    forward: Arc<dyn Fft<f64>>,
    inverse: Arc<dyn Fft<f64>>,
}

impl std::fmt::Debug for CepstralAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CepstralAnalyzer")
            .field("sample_rate", &self.sample_rate)
            .field("n_fft", &self.n_fft)
            .field("lifter_cutoff", &self.lifter_cutoff)
            .field("lag_range", &self.lag_range)
            .field("min_separation_bins", &self.min_separation_bins)
            .finish()
    }
}

impl CepstralAnalyzer {
    /// Create an analyzer for the given sample rate.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidParameter` if the configuration fails validation
    /// - `Error::InvalidRange` if the pitch bounds give an invalid or empty
    ///   lag range, or `max_lag > n_fft / 2`
    pub fn new(sample_rate: u32, config: &CepstralConfig) -> Result<Self> {
        config.validate()?;
        let n_fft = config.n_fft;

        let lag_range =
            LagRange::from_pitch_range(sample_rate, config.min_pitch_hz, config.max_pitch_hz)?;
        if lag_range.min_lag >= lag_range.max_lag {
            return Err(Error::InvalidRange(format!(
                "quefrency search range [{}, {}) is empty",
                lag_range.min_lag, lag_range.max_lag
            )));
        }
        if lag_range.max_lag > n_fft / 2 {
            return Err(Error::InvalidRange(format!(
                "max_lag {} exceeds n_fft / 2 = {}",
                lag_range.max_lag,
                n_fft / 2
            )));
        }

        let df = sample_rate as f64 / n_fft as f64;
        let min_separation_bins = (config.formant_min_separation_hz / df).round() as usize;

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(n_fft);
        let inverse = planner.plan_fft_inverse(n_fft);

        Ok(Self {
            sample_rate,
            n_fft,
            lifter_cutoff: config.lifter_cutoff_samples,
            lag_range,
            min_separation_bins,
            forward,
            inverse,
        })
    }

    /// Quefrency search range used for pitch.
    #[inline]
    pub fn lag_range(&self) -> LagRange {
        self.lag_range
    }

    /// Minimum formant peak distance in spectrum bins.
    #[inline]
    pub fn min_separation_bins(&self) -> usize {
        self.min_separation_bins
    }

    /// Bin width of the spectra in Hz.
    #[inline]
    pub fn df(&self) -> f64 {
        self.sample_rate as f64 / self.n_fft as f64
    }

    /// One-sided DFT of real input, zero-padded to n_fft (n_fft / 2 + 1 bins).
    fn rfft<'a>(&self, input: impl IntoIterator<Item = &'a f64>) -> Vec<Complex64> {
        let mut buffer = vec![Complex64::new(0.0, 0.0); self.n_fft];
        for (slot, &x) in buffer.iter_mut().zip(input) {
            *slot = Complex64::new(x, 0.0);
        }
        self.forward.process(&mut buffer);
        buffer.truncate(self.n_fft / 2 + 1);
        buffer
    }

    /// Inverse of a one-sided real spectrum, treating it as Hermitian.
    ///
    /// Output has n_fft real samples, scaled by 1/n_fft.
    fn irfft_real(&self, half: &Array1<f64>) -> Array1<f64> {
        let n = self.n_fft;
        let mut buffer: Vec<Complex64> = (0..n)
            .map(|k| {
                let mirrored = if k <= n / 2 { k } else { n - k };
                Complex64::new(half[mirrored], 0.0)
            })
            .collect();
        self.inverse.process(&mut buffer);
        let scale = 1.0 / n as f64;
        Array1::from_iter(buffer.iter().map(|c| c.re * scale))
    }

    /// Log-magnitude spectrum ln(|X[k]| + 1e-6) of a frame.
    pub fn log_magnitude_spectrum(&self, samples: &Array1<f64>) -> Array1<f64> {
        Array1::from_iter(
            self.rfft(samples)
                .iter()
                .map(|c| (c.norm() + LOG_EPSILON).ln()),
        )
    }

    /// Real cepstrum of a frame.
    pub fn cepstrum(&self, samples: &Array1<f64>) -> Cepstrum {
        Cepstrum::new(self.irfft_real(&self.log_magnitude_spectrum(samples)))
    }

    /// Smoothed spectrum from a liftered cepstrum.
    ///
    /// Returns the real part of the one-sided DFT and the largest magnitude
    /// of the discarded imaginary part.
    pub fn smoothed_spectrum(&self, liftered: &Array1<f64>) -> (Array1<f64>, f64) {
        let spectrum = self.rfft(liftered);
        let residue = spectrum.iter().fold(0.0f64, |acc, c| acc.max(c.im.abs()));
        (Array1::from_iter(spectrum.iter().map(|c| c.re)), residue)
    }

    /// Run the full per-frame pipeline.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidParameter` if the frame is longer than n_fft or was
    ///   cut at a different sample rate
    /// - `Error::InvalidRange` if `max_lag >= frame length`
    pub fn analyze(&self, frame: &Frame) -> Result<CepstralFrame> {
        if frame.sample_rate() != self.sample_rate {
            return Err(Error::InvalidParameter(format!(
                "frame sample rate {} Hz does not match analyzer rate {} Hz",
                frame.sample_rate(),
                self.sample_rate
            )));
        }
        if frame.len() > self.n_fft {
            return Err(Error::InvalidParameter(format!(
                "n_fft {} is smaller than the frame size {}",
                self.n_fft,
                frame.len()
            )));
        }
        self.lag_range.check_frame_size(frame.len())?;

        let cepstrum = self.cepstrum(frame.samples());

        let (pitch_period, pitch_peak_value) = cepstrum.peak_in(self.lag_range);
        let f0 = LagRange::lag_to_hz(self.sample_rate, pitch_period);

        let liftered = cepstrum.liftered(self.lifter_cutoff);
        let (smoothed_spectrum, imaginary_residue) = self.smoothed_spectrum(&liftered);

        let real_peak = smoothed_spectrum.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        if imaginary_residue > real_peak {
            log::warn!(
                "Smoothed spectrum at {:.4}s has imaginary residue {:.3e} above its real peak {:.3e}",
                frame.start_time(),
                imaginary_residue,
                real_peak
            );
        }

        let df = self.df();
        let peak_bins = find_peaks(&smoothed_spectrum.to_vec(), self.min_separation_bins);
        let formants =
            FormantEstimate::from_peaks(peak_bins.iter().map(|&k| k as f64 * df).collect());

        if formants.is_complete() {
            log::debug!(
                "Frame at {:.4}s: T0 = {} samples, F0 = {:.2} Hz, F1-F3 = {:.0}/{:.0}/{:.0} Hz",
                frame.start_time(),
                pitch_period,
                f0,
                formants.peak_frequencies[0],
                formants.peak_frequencies[1],
                formants.peak_frequencies[2]
            );
        } else {
            log::warn!(
                "Frame at {:.4}s: could not find 3 formants ({} peaks)",
                frame.start_time(),
                formants.peak_frequencies.len()
            );
        }

        Ok(CepstralFrame {
            time: frame.start_time(),
            pitch_period,
            f0,
            pitch_peak_value,
            formants,
            cepstrum,
            smoothed_spectrum,
            df,
            imaginary_residue,
        })
    }
}

/// Analyze a single frame with a one-off analyzer.
///
/// Prefer [`CepstralAnalyzer`] when analyzing many frames.
pub fn frame_to_cepstral(frame: &Frame, config: &CepstralConfig) -> Result<CepstralFrame> {
    CepstralAnalyzer::new(frame.sample_rate(), config)?.analyze(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sound::Sound;
    use std::f64::consts::PI;

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

    /// Harmonics of 160 Hz at 8 kHz (period 50 samples) shaped by a
    /// log-envelope with bumps at 500, 1500 and 2500 Hz.
    fn vowel_like(n: usize) -> Vec<f64> {
        let sample_rate = 8000.0;
        let f0 = 160.0;
        let envelope = |f: f64| -> f64 {
            let log_amp: f64 = [500.0, 1500.0, 2500.0]
                .iter()
                .map(|&fc| 3.0 * (-(f - fc).powi(2) / (2.0 * 250.0f64.powi(2))).exp())
                .sum();
            log_amp.exp()
        };
        let n_harmonics = 24;
        let one_period: Vec<f64> = (0..50)
            .map(|i| {
                (1..=n_harmonics)
                    .map(|k| {
                        let f = k as f64 * f0;
                        envelope(f) * (2.0 * PI * f * i as f64 / sample_rate).cos()
                    })
                    .sum::<f64>()
                    * 0.01
            })
            .collect();
        (0..n).map(|i| one_period[i % 50]).collect()
    }

    #[test]
    fn test_zero_frame_is_degenerate_but_safe() {
        let config = test_config();
        let analyzer = CepstralAnalyzer::new(8000, &config).unwrap();
        let frame = Frame::new(Array1::zeros(320), 0, 8000);

        let log_spectrum = analyzer.log_magnitude_spectrum(frame.samples());
        assert_eq!(log_spectrum.len(), 257);
        assert!(log_spectrum.iter().all(|&v| v == LOG_EPSILON.ln()));

        let result = analyzer.analyze(&frame).unwrap();
        let c = result.cepstrum.values();
        assert!((c[0] - LOG_EPSILON.ln()).abs() < 1e-9);
        assert!(c.iter().skip(1).all(|v| v.abs() < 1e-9));
        assert!(result.pitch_peak_value.abs() < 1e-9);
        assert!(result.f0.is_finite());
    }

    #[test]
    fn test_recovers_pitch_period() {
        let sound = Sound::from_slice(&vowel_like(8000), 8000);
        let frame = sound.to_frame(0.2, 0.040).unwrap();
        let result = frame_to_cepstral(&frame, &test_config()).unwrap();
        assert!(
            (result.pitch_period as i64 - 50).abs() <= 1,
            "cepstral pitch period {} should be close to 50",
            result.pitch_period
        );
        assert!(result.pitch_peak_value > 0.0);
    }

    #[test]
    fn test_finds_three_formants() {
        let sound = Sound::from_slice(&vowel_like(8000), 8000);
        let frame = sound.to_frame(0.2, 0.040).unwrap();
        let result = frame_to_cepstral(&frame, &test_config()).unwrap();

        assert!(result.formants.is_complete());
        for target in [500.0, 1500.0, 2500.0] {
            assert!(
                result
                    .formants
                    .peak_frequencies()
                    .iter()
                    .any(|&f| (f - target).abs() < 100.0),
                "no peak near {} Hz in {:?}",
                target,
                result.formants.peak_frequencies()
            );
        }
        assert_eq!(result.smoothed_spectrum.len(), 257);
        assert_eq!(result.frequencies()[256], 4000.0);
    }

    #[test]
    fn test_peak_in_uses_half_open_range() {
        let mut values = Array1::zeros(16);
        values[8] = 5.0;
        values[4] = 1.0;
        let cepstrum = Cepstrum::new(values);
        assert_eq!(cepstrum.peak_in(LagRange { min_lag: 3, max_lag: 8 }), (4, 1.0));
        assert_eq!(cepstrum.peak_in(LagRange { min_lag: 3, max_lag: 9 }), (8, 5.0));
    }

    #[test]
    fn test_lifter_keeps_low_quefrencies() {
        let cepstrum = Cepstrum::new(Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]));
        assert_eq!(cepstrum.liftered(2).to_vec(), vec![1.0, 2.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_incomplete_formants() {
        let two = FormantEstimate::from_peaks(vec![700.0, 1200.0]);
        assert!(!two.is_complete());
        assert_eq!(two.f1(), None);
        assert_eq!(two.peak_frequencies().len(), 2);

        let four = FormantEstimate::from_peaks(vec![700.0, 1200.0, 2600.0, 3400.0]);
        assert_eq!(four.f1(), Some(700.0));
        assert_eq!(four.f3(), Some(2600.0));
        assert_eq!(four.formant(4), None);
    }

    #[test]
    fn test_range_validation() {
        // 44100 / 100 = 441 > 2048 / 2 is fine, but not for n_fft = 512.
        let config = CepstralConfig { n_fft: 512, ..Default::default() };
        assert!(matches!(
            CepstralAnalyzer::new(44100, &config),
            Err(Error::InvalidRange(_))
        ));

        let analyzer = CepstralAnalyzer::new(44100, &CepstralConfig::default()).unwrap();
        assert_eq!(analyzer.lag_range(), LagRange { min_lag: 276, max_lag: 441 });
        // 400 Hz / (44100 / 2048) = 18.58 -> 19 bins
        assert_eq!(analyzer.min_separation_bins(), 19);

        let same = CepstralConfig { min_pitch_hz: 150.0, max_pitch_hz: 150.0, ..Default::default() };
        assert!(matches!(
            CepstralAnalyzer::new(44100, &same),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn test_frame_longer_than_fft_is_rejected() {
        let analyzer = CepstralAnalyzer::new(8000, &test_config()).unwrap();
        let frame = Frame::new(Array1::zeros(600), 0, 8000);
        assert!(matches!(
            analyzer.analyze(&frame),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_repeated_analysis_is_identical() {
        let sound = Sound::from_slice(&vowel_like(4000), 8000);
        let frame = sound.to_frame(0.1, 0.040).unwrap();
        let analyzer = CepstralAnalyzer::new(8000, &test_config()).unwrap();
        let a = analyzer.analyze(&frame).unwrap();
        let b = analyzer.analyze(&frame).unwrap();
        assert_eq!(a.pitch_period, b.pitch_period);
        assert_eq!(a.cepstrum.values(), b.cepstrum.values());
        assert_eq!(a.smoothed_spectrum, b.smoothed_spectrum);
        assert_eq!(a.formants, b.formants);
    }
}
