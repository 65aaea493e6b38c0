//! # pitchform
//!
//! Pitch (F0) and formant (F1-F3) estimation for short voiced speech
//! segments using two classical techniques:
//!
//! - **AMDF**: time-domain pitch estimation from the minimum of the
//!   Average Magnitude Difference Function over a lag range
//! - **Cepstrum**: joint pitch/formant estimation from the real cepstrum,
//!   with low-time liftering to obtain a smoothed spectral envelope
//!
//! The caller supplies a known-voiced analysis window; there is no
//! voiced/unvoiced detection and no adaptive parameter selection.
//!
//! # Quick Start
//!
//! ```no_run
//! use pitchform::{CepstralConfig, Sound};
//!
//! // Load a WAV file (first channel, normalized to [-1, 1])
//! let sound = Sound::from_file("vowel_a.wav").unwrap();
//!
//! // AMDF pitch of one 30 ms frame at 1.01 s, searching 100-160 Hz
//! let pitch = sound.to_amdf_pitch(1.01, 0.030, 100.0, 160.0).unwrap();
//! println!("AMDF: lag {} samples, F0 = {:.2} Hz", pitch.lag(), pitch.f0());
//!
//! // Cepstral pitch and formants over six consecutive frames from 1.18 s
//! let session = sound.to_cepstral_session(1.18, &CepstralConfig::default()).unwrap();
//! let averages = session.averages();
//! println!("F0 = {:?}, F1 = {:?}", averages.f0, averages.f1);
//! ```
//!
//! # Module Organization
//!
//! Each analysis step has its own module containing a result struct and a
//! conversion function. `Sound` provides convenience methods that delegate
//! to these modules. Every result exposes its numeric series (AMDF curve,
//! cepstrum, smoothed spectrum) so callers can render them.

// Module declarations
pub mod amdf;
pub mod cepstrum;
pub mod config;
pub mod error;
pub mod frame;
pub mod lag;
pub mod peaks;
pub mod session;
pub mod sound;

/// Error types for pitchform operations.
pub use error::{Error, Result};

/// AMDF pitch estimation.
///
/// - `AmdfPitch`: Selected lag, F0 and the full curve
/// - `AmdfCurve`: AMDF values over a lag range
/// - `frame_to_amdf_pitch`: Estimate pitch of one frame
pub use amdf::{frame_to_amdf_pitch, AmdfCurve, AmdfPitch};

/// Cepstral pitch and formant analysis.
///
/// - `CepstralAnalyzer`: Reusable per-frame analyzer
/// - `CepstralFrame`: Per-frame result with cepstrum and smoothed spectrum
/// - `FormantEstimate`: F1-F3, possibly incomplete
/// - `frame_to_cepstral`: Analyze one frame
pub use cepstrum::{frame_to_cepstral, CepstralAnalyzer, CepstralFrame, Cepstrum, FormantEstimate};

/// Analysis parameters.
pub use config::{AmdfConfig, AnalysisConfig, CepstralConfig};

/// Frame extraction.
pub use frame::{extract_frame, extract_frame_sequence, hamming_window, Frame};

/// Pitch search bounds in samples.
pub use lag::LagRange;

/// Multi-frame cepstral sessions and their averages.
pub use session::{sound_to_cepstral_session, CepstralSession, SessionAverages};

/// Sound loading and basic operations.
pub use sound::Sound;
