//! LagRange - pitch search bounds expressed in samples.
//!
//! A pitch of F Hz repeats every `sample_rate / F` samples, so a search
//! range [min_pitch, max_pitch] in Hz maps to an inclusive lag range
//!
//! ```text
//! min_lag = round(sample_rate / max_pitch)
//! max_lag = round(sample_rate / min_pitch)
//! ```
//!
//! For 44100 Hz and 100-160 Hz this gives lags 276..=441.

use crate::error::{Error, Result};

/// Inclusive lag interval `[min_lag, max_lag]` in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LagRange {
    pub min_lag: usize,
    pub max_lag: usize,
}

impl LagRange {
    /// Derive the lag range from a pitch search range in Hz.
    ///
    /// # Errors
    ///
    /// `Error::InvalidRange` if either bound is not a positive finite
    /// frequency, if `min_lag` would be 0, or if `min_lag > max_lag`
    /// (i.e. `min_pitch_hz > max_pitch_hz`).
    pub fn from_pitch_range(sample_rate: u32, min_pitch_hz: f64, max_pitch_hz: f64) -> Result<Self> {
        for (name, value) in [("min_pitch_hz", min_pitch_hz), ("max_pitch_hz", max_pitch_hz)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidRange(format!(
                    "{} must be a positive frequency, got {}",
                    name, value
                )));
            }
        }

        let sr = sample_rate as f64;
        let range = Self {
            min_lag: (sr / max_pitch_hz).round() as usize,
            max_lag: (sr / min_pitch_hz).round() as usize,
        };

        if range.min_lag < 1 {
            return Err(Error::InvalidRange(format!(
                "max_pitch_hz {} is too high for {} Hz (lag rounds to 0)",
                max_pitch_hz, sample_rate
            )));
        }
        if range.min_lag > range.max_lag {
            return Err(Error::InvalidRange(format!(
                "min_lag {} exceeds max_lag {} (pitch range {}-{} Hz)",
                range.min_lag, range.max_lag, min_pitch_hz, max_pitch_hz
            )));
        }

        Ok(range)
    }

    /// Require every lag to leave at least one overlapping sample pair.
    pub fn check_frame_size(&self, frame_size: usize) -> Result<()> {
        if self.max_lag >= frame_size {
            return Err(Error::InvalidRange(format!(
                "max_lag {} must be smaller than the frame size {}",
                self.max_lag, frame_size
            )));
        }
        Ok(())
    }

    /// Number of lags in the range.
    #[inline]
    pub fn len(&self) -> usize {
        self.max_lag - self.min_lag + 1
    }

    /// Always false: a validated range holds at least one lag.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over every lag, smallest first.
    pub fn lags(&self) -> impl Iterator<Item = usize> {
        self.min_lag..=self.max_lag
    }

    /// Frequency in Hz corresponding to a lag.
    #[inline]
    pub fn lag_to_hz(sample_rate: u32, lag: usize) -> f64 {
        sample_rate as f64 / lag as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_configuration() {
        let range = LagRange::from_pitch_range(44100, 100.0, 160.0).unwrap();
        assert_eq!(range.min_lag, 276);
        assert_eq!(range.max_lag, 441);
        assert_eq!(range.len(), 166);
        assert!(range.check_frame_size(1323).is_ok());
    }

    #[test]
    fn test_inverted_range_is_invalid() {
        assert!(matches!(
            LagRange::from_pitch_range(44100, 200.0, 100.0),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn test_non_positive_pitch_is_invalid() {
        assert!(LagRange::from_pitch_range(44100, 0.0, 160.0).is_err());
        assert!(LagRange::from_pitch_range(44100, 100.0, f64::NAN).is_err());
    }

    #[test]
    fn test_lag_zero_is_invalid() {
        assert!(matches!(
            LagRange::from_pitch_range(8000, 100.0, 50000.0),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn test_max_lag_must_fit_in_frame() {
        let range = LagRange::from_pitch_range(44100, 100.0, 160.0).unwrap();
        assert!(range.check_frame_size(441).is_err());
        assert!(range.check_frame_size(442).is_ok());
    }
}
