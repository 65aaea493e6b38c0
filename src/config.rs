//! Analysis configuration.
//!
//! Every analysis parameter lives in a plain struct with sensible defaults
//! for adult speech recorded at 44.1 kHz. Configurations can be loaded from
//! JSON; missing fields fall back to their defaults, so a file containing
//! only `{"cepstral": {"lifter_cutoff_samples": 30}}` is valid.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Parameters for single-frame AMDF pitch estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmdfConfig {
    /// Frame duration in seconds.
    pub frame_duration_s: f64,
    /// Lowest pitch to search for in Hz.
    pub min_pitch_hz: f64,
    /// Highest pitch to search for in Hz.
    pub max_pitch_hz: f64,
}

impl Default for AmdfConfig {
    fn default() -> Self {
        Self {
            frame_duration_s: 0.030,
            min_pitch_hz: 100.0,
            max_pitch_hz: 160.0,
        }
    }
}

/// Parameters for the multi-frame cepstral pitch/formant analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CepstralConfig {
    /// Frame duration in seconds.
    pub frame_duration_s: f64,
    /// Shift between consecutive frames in seconds.
    pub frame_shift_s: f64,
    /// Number of consecutive frames to analyze.
    pub frame_count: usize,
    /// FFT size; must be at least the frame size.
    pub n_fft: usize,
    /// Low-time lifter cutoff: cepstral coefficients [0, cutoff) are kept.
    pub lifter_cutoff_samples: usize,
    /// Lowest pitch to search for in Hz.
    pub min_pitch_hz: f64,
    /// Highest pitch to search for in Hz.
    pub max_pitch_hz: f64,
    /// Minimum distance between formant peaks in Hz.
    pub formant_min_separation_hz: f64,
}

impl Default for CepstralConfig {
    fn default() -> Self {
        Self {
            frame_duration_s: 0.030,
            frame_shift_s: 0.010,
            frame_count: 6,
            n_fft: 2048,
            lifter_cutoff_samples: 40,
            min_pitch_hz: 100.0,
            max_pitch_hz: 160.0,
            formant_min_separation_hz: 400.0,
        }
    }
}

impl CepstralConfig {
    /// Check the parameters that do not depend on the sample rate.
    ///
    /// Pitch bounds are checked later against the sample rate and FFT size,
    /// see [`LagRange`](crate::lag::LagRange).
    pub fn validate(&self) -> Result<()> {
        if !(self.frame_duration_s.is_finite() && self.frame_duration_s > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "frame_duration_s must be positive, got {}",
                self.frame_duration_s
            )));
        }
        if !(self.frame_shift_s.is_finite() && self.frame_shift_s > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "frame_shift_s must be positive, got {}",
                self.frame_shift_s
            )));
        }
        if self.frame_count == 0 {
            return Err(Error::InvalidParameter("frame_count must be at least 1".into()));
        }
        if self.n_fft == 0 {
            return Err(Error::InvalidParameter("n_fft must be at least 1".into()));
        }
        if self.lifter_cutoff_samples == 0 || self.lifter_cutoff_samples > self.n_fft {
            return Err(Error::InvalidParameter(format!(
                "lifter_cutoff_samples must be in 1..={}, got {}",
                self.n_fft, self.lifter_cutoff_samples
            )));
        }
        if !(self.formant_min_separation_hz.is_finite() && self.formant_min_separation_hz > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "formant_min_separation_hz must be positive, got {}",
                self.formant_min_separation_hz
            )));
        }
        Ok(())
    }
}

/// Complete analysis configuration for both pitch paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub amdf: AmdfConfig,
    pub cepstral: CepstralConfig,
}

impl AnalysisConfig {
    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// - `Error::Io` if the file cannot be read
    /// - `Error::Config` if the JSON is malformed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&contents)?;
        log::info!("Loaded analysis configuration from {}", path.as_ref().display());
        Ok(config)
    }
}
