//! AMDF - Average Magnitude Difference Function pitch estimation.
//!
//! For a frame x of N samples and a lag η the AMDF is
//!
//! ```text
//! AMDF(η) = Σ_{m=0}^{N-η-1} |x[m] - x[m+η]|
//! ```
//!
//! Only the overlapping region is summed and the sum is not divided by the
//! overlap length, so values at different lags are sums over different
//! numbers of terms. A periodic frame has a deep dip at its period; the
//! pitch estimate is the lag of the global minimum over the search range.
//!
//! # Tie Breaking
//!
//! When several lags share the minimum value the smallest lag wins, so the
//! pitch period is reported at the shortest period matching the deepest dip.

use ndarray::Array1;

use crate::error::Result;
use crate::frame::Frame;
use crate::lag::LagRange;

/// AMDF values over a lag range.
#[derive(Debug, Clone)]
pub struct AmdfCurve {
    /// Lags covered by `values`.
    lag_range: LagRange,
    /// AMDF value for each lag, starting at `lag_range.min_lag`.
    values: Array1<f64>,
}

impl AmdfCurve {
    /// The lag range the curve was computed over.
    #[inline]
    pub fn lag_range(&self) -> LagRange {
        self.lag_range
    }

    /// AMDF values, one per lag, smallest lag first.
    #[inline]
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Lags as an array, aligned with `values()`.
    pub fn lags(&self) -> Array1<usize> {
        Array1::from_iter(self.lag_range.lags())
    }

    /// Iterate over `(lag, value)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.lag_range.lags().zip(self.values.iter().copied())
    }

    /// AMDF value at a lag, or None outside the range.
    pub fn value_at(&self, lag: usize) -> Option<f64> {
        if lag < self.lag_range.min_lag || lag > self.lag_range.max_lag {
            return None;
        }
        Some(self.values[lag - self.lag_range.min_lag])
    }

    /// Number of lags.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the curve holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of AMDF pitch estimation on one frame.
#[derive(Debug, Clone)]
pub struct AmdfPitch {
    /// Lag of the global minimum in samples.
    lag: usize,
    /// Fundamental frequency in Hz (sample_rate / lag).
    f0: f64,
    /// Length of the analyzed frame in samples.
    frame_size: usize,
    /// Full AMDF curve for plotting.
    curve: AmdfCurve,
}

impl AmdfPitch {
    /// Pitch period in samples.
    #[inline]
    pub fn lag(&self) -> usize {
        self.lag
    }

    /// Fundamental frequency in Hz.
    #[inline]
    pub fn f0(&self) -> f64 {
        self.f0
    }

    /// Length of the analyzed frame in samples.
    #[inline]
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// AMDF value at the selected lag.
    #[inline]
    pub fn min_value(&self) -> f64 {
        self.curve.values[self.lag - self.curve.lag_range.min_lag]
    }

    /// The AMDF curve the minimum was taken from.
    #[inline]
    pub fn curve(&self) -> &AmdfCurve {
        &self.curve
    }
}

/// Sum of absolute differences between a frame and itself shifted by `lag`.
///
/// Returns 0 for lags at or beyond the frame length (no overlapping pairs).
pub fn amdf_value(samples: &[f64], lag: usize) -> f64 {
    samples
        .iter()
        .zip(samples.iter().skip(lag))
        .map(|(a, b)| (a - b).abs())
        .sum()
}

/// Compute the AMDF curve of a frame over a lag range.
///
/// # Errors
///
/// `Error::InvalidRange` if `max_lag >= frame length`.
pub fn amdf_curve(frame: &Frame, lag_range: LagRange) -> Result<AmdfCurve> {
    lag_range.check_frame_size(frame.len())?;

    let samples = frame.samples().to_vec();
    let values = Array1::from_iter(lag_range.lags().map(|lag| amdf_value(&samples, lag)));

    Ok(AmdfCurve { lag_range, values })
}

/// Estimate the pitch of a frame from the minimum of its AMDF.
///
/// # Arguments
///
/// * `frame` - Windowed analysis frame
/// * `min_pitch_hz` - Lowest pitch to search for (sets `max_lag`)
/// * `max_pitch_hz` - Highest pitch to search for (sets `min_lag`)
///
/// # Errors
///
/// `Error::InvalidRange` if the pitch bounds give `min_lag > max_lag`,
/// `min_lag < 1`, or `max_lag >= frame length`.
pub fn frame_to_amdf_pitch(frame: &Frame, min_pitch_hz: f64, max_pitch_hz: f64) -> Result<AmdfPitch> {
    let sample_rate = frame.sample_rate();
    let lag_range = LagRange::from_pitch_range(sample_rate, min_pitch_hz, max_pitch_hz)?;
    let curve = amdf_curve(frame, lag_range)?;

    log::debug!(
        "AMDF over lags {}..={} for frame of {} samples at {:.4}s",
        lag_range.min_lag,
        lag_range.max_lag,
        frame.len(),
        frame.start_time()
    );

    // Strict comparison keeps the first (smallest) lag on ties.
    let mut best_index = 0;
    for (i, &v) in curve.values.iter().enumerate() {
        if v < curve.values[best_index] {
            best_index = i;
        }
    }

    let lag = lag_range.min_lag + best_index;
    let f0 = LagRange::lag_to_hz(sample_rate, lag);

    log::debug!(
        "AMDF minimum {:.6} at lag {} -> F0 = {:.2} Hz",
        curve.values[best_index],
        lag,
        f0
    );

    Ok(AmdfPitch {
        lag,
        f0,
        frame_size: frame.len(),
        curve,
    })
}
