//! Command-line front end for pitchform.
//!
//! Loads a WAV file, runs the AMDF or cepstral analysis at a given time and
//! prints the estimates as text or JSON. Numeric series can be written as
//! CSV for external plotting.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pitchform::{AmdfPitch, AnalysisConfig, CepstralSession, Sound};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "pitchform",
    about = "AMDF and cepstral pitch/formant estimation for voiced speech segments"
)]
struct Cli {
    /// JSON analysis configuration (missing fields use defaults)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Emit a JSON report instead of text
    #[arg(long, global = true)]
    json: bool,
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print sample rate, length and duration of a WAV file
    Info {
        wav: PathBuf,
    },
    /// Estimate pitch of one frame from the AMDF minimum
    Amdf {
        wav: PathBuf,
        /// Start of the frame in seconds
        #[arg(long)]
        start: f64,
        #[command(flatten)]
        pitch: PitchArgs,
        /// Write the AMDF curve as CSV into this directory
        #[arg(long)]
        series_dir: Option<PathBuf>,
    },
    /// Estimate pitch and formants over consecutive frames from the cepstrum
    Cepstrum {
        wav: PathBuf,
        /// Start of the first frame in seconds
        #[arg(long)]
        start: f64,
        #[command(flatten)]
        pitch: PitchArgs,
        /// Shift between frames in seconds
        #[arg(long)]
        shift: Option<f64>,
        /// Number of frames
        #[arg(long)]
        frames: Option<usize>,
        /// FFT size
        #[arg(long)]
        n_fft: Option<usize>,
        /// Low-time lifter cutoff in samples
        #[arg(long)]
        lifter: Option<usize>,
        /// Minimum distance between formant peaks in Hz
        #[arg(long)]
        separation: Option<f64>,
        /// Write per-frame cepstra and smoothed spectra as CSV into this directory
        #[arg(long)]
        series_dir: Option<PathBuf>,
    },
}

/// Options shared by both pitch paths.
#[derive(Args, Debug)]
struct PitchArgs {
    /// Frame duration in seconds
    #[arg(long)]
    duration: Option<f64>,
    /// Lowest pitch to search for in Hz
    #[arg(long)]
    min_pitch: Option<f64>,
    /// Highest pitch to search for in Hz
    #[arg(long)]
    max_pitch: Option<f64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    match cli.command {
        Commands::Info { wav } => {
            let sound = load(&wav)?;
            emit_info(&wav, &sound, cli.json)
        }
        Commands::Amdf {
            wav,
            start,
            pitch,
            series_dir,
        } => {
            let amdf = &mut config.amdf;
            if let Some(v) = pitch.duration {
                amdf.frame_duration_s = v;
            }
            if let Some(v) = pitch.min_pitch {
                amdf.min_pitch_hz = v;
            }
            if let Some(v) = pitch.max_pitch {
                amdf.max_pitch_hz = v;
            }

            let sound = load(&wav)?;
            let result = sound
                .to_amdf_pitch(start, amdf.frame_duration_s, amdf.min_pitch_hz, amdf.max_pitch_hz)
                .with_context(|| format!("AMDF analysis of {} at {}s", wav.display(), start))?;

            if let Some(dir) = series_dir {
                write_amdf_series(&dir, &result)?;
            }
            emit_amdf(&wav, start, &sound, &result, cli.json)
        }
        Commands::Cepstrum {
            wav,
            start,
            pitch,
            shift,
            frames,
            n_fft,
            lifter,
            separation,
            series_dir,
        } => {
            let cep = &mut config.cepstral;
            if let Some(v) = pitch.duration {
                cep.frame_duration_s = v;
            }
            if let Some(v) = pitch.min_pitch {
                cep.min_pitch_hz = v;
            }
            if let Some(v) = pitch.max_pitch {
                cep.max_pitch_hz = v;
            }
            if let Some(v) = shift {
                cep.frame_shift_s = v;
            }
            if let Some(v) = frames {
                cep.frame_count = v;
            }
            if let Some(v) = n_fft {
                cep.n_fft = v;
            }
            if let Some(v) = lifter {
                cep.lifter_cutoff_samples = v;
            }
            if let Some(v) = separation {
                cep.formant_min_separation_hz = v;
            }

            let sound = load(&wav)?;
            let session = sound
                .to_cepstral_session(start, cep)
                .with_context(|| format!("cepstral analysis of {} at {}s", wav.display(), start))?;

            if let Some(dir) = series_dir {
                write_cepstral_series(&dir, &session)?;
            }
            emit_cepstrum(&wav, start, &sound, &session, cli.json)
        }
    }
}

fn load(path: &Path) -> Result<Sound> {
    let sound = Sound::from_file(path).with_context(|| format!("loading {}", path.display()))?;
    tracing::info!("Loaded {}: {}", path.display(), sound);
    Ok(sound)
}

#[derive(Serialize)]
struct InfoReport<'a> {
    file: &'a str,
    sample_rate: u32,
    n_samples: usize,
    duration_s: f64,
}

fn emit_info(wav: &Path, sound: &Sound, json: bool) -> Result<()> {
    let file = wav.to_string_lossy();
    if json {
        let report = InfoReport {
            file: &file,
            sample_rate: sound.sample_rate(),
            n_samples: sound.n_samples(),
            duration_s: sound.duration(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("File: {}", file);
        println!("Sample rate: {} Hz", sound.sample_rate());
        println!("Samples: {}", sound.n_samples());
        println!("Duration: {:.3} s", sound.duration());
    }
    Ok(())
}

#[derive(Serialize)]
struct AmdfReport<'a> {
    file: &'a str,
    start_time_s: f64,
    sample_rate: u32,
    frame_size: usize,
    min_lag: usize,
    max_lag: usize,
    lag: usize,
    f0_hz: f64,
    min_value: f64,
    curve: Vec<(usize, f64)>,
}

fn emit_amdf(wav: &Path, start: f64, sound: &Sound, result: &AmdfPitch, json: bool) -> Result<()> {
    let file = wav.to_string_lossy();
    let range = result.curve().lag_range();

    if json {
        let report = AmdfReport {
            file: &file,
            start_time_s: start,
            sample_rate: sound.sample_rate(),
            frame_size: result.frame_size(),
            min_lag: range.min_lag,
            max_lag: range.max_lag,
            lag: result.lag(),
            f0_hz: result.f0(),
            min_value: result.min_value(),
            curve: result.curve().points().collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!(
            "Analyzed frame of {} samples from '{}' at {}s",
            result.frame_size(),
            file,
            start
        );
        println!("Checked lags from {} to {} samples", range.min_lag, range.max_lag);
        println!();
        println!("--- Analysis Results ---");
        println!("Minimum AMDF value found at lag (eta): {} samples", result.lag());
        println!("Calculated Fundamental Frequency (F0): {:.2} Hz", result.f0());
    }
    Ok(())
}

#[derive(Serialize)]
struct FrameReport {
    index: usize,
    time_s: f64,
    pitch_period: usize,
    f0_hz: f64,
    f1_hz: Option<f64>,
    f2_hz: Option<f64>,
    f3_hz: Option<f64>,
    peak_frequencies_hz: Vec<f64>,
}

#[derive(Serialize)]
struct AverageReport {
    f0_hz: Option<f64>,
    f1_hz: Option<f64>,
    f2_hz: Option<f64>,
    f3_hz: Option<f64>,
}

#[derive(Serialize)]
struct CepstrumReport<'a> {
    file: &'a str,
    start_time_s: f64,
    sample_rate: u32,
    requested_frames: usize,
    frame_count: usize,
    frames: Vec<FrameReport>,
    averages: AverageReport,
}

fn format_hz(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.2} Hz", v))
}

fn emit_cepstrum(
    wav: &Path,
    start: f64,
    sound: &Sound,
    session: &CepstralSession,
    json: bool,
) -> Result<()> {
    let file = wav.to_string_lossy();
    let averages = session.averages();

    if json {
        let report = CepstrumReport {
            file: &file,
            start_time_s: start,
            sample_rate: sound.sample_rate(),
            requested_frames: session.requested_frames(),
            frame_count: session.n_frames(),
            frames: session
                .frames()
                .iter()
                .enumerate()
                .map(|(i, f)| FrameReport {
                    index: i + 1,
                    time_s: f.time,
                    pitch_period: f.pitch_period,
                    f0_hz: f.f0,
                    f1_hz: f.formants.f1(),
                    f2_hz: f.formants.f2(),
                    f3_hz: f.formants.f3(),
                    peak_frequencies_hz: f.formants.peak_frequencies().to_vec(),
                })
                .collect(),
            averages: AverageReport {
                f0_hz: averages.f0,
                f1_hz: averages.f1,
                f2_hz: averages.f2,
                f3_hz: averages.f3,
            },
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "Analyzed {} of {} frames from '{}' at {}s",
        session.n_frames(),
        session.requested_frames(),
        file,
        start
    );
    for (i, f) in session.frames().iter().enumerate() {
        let formants = if f.formants.is_complete() {
            format!(
                "F1={:.0} Hz, F2={:.0} Hz, F3={:.0} Hz",
                f.formants.f1().unwrap_or_default(),
                f.formants.f2().unwrap_or_default(),
                f.formants.f3().unwrap_or_default()
            )
        } else {
            "Could not find 3 formants".to_string()
        };
        println!(
            "Frame {} ({:.3}s): T0 = {} samples, F0 = {:.2} Hz, {}",
            i + 1,
            f.time,
            f.pitch_period,
            f.f0,
            formants
        );
    }
    println!();
    println!("--- Averages ---");
    println!("Average Pitch (F0): {}", format_hz(averages.f0));
    println!("Average Formant 1 (F1): {}", format_hz(averages.f1));
    println!("Average Formant 2 (F2): {}", format_hz(averages.f2));
    println!("Average Formant 3 (F3): {}", format_hz(averages.f3));
    Ok(())
}

fn write_csv(path: &Path, header: &str, rows: impl Iterator<Item = (f64, f64)>) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "{}", header)?;
    for (x, y) in rows {
        writeln!(out, "{},{}", x, y)?;
    }
    out.flush()
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn write_amdf_series(dir: &Path, result: &AmdfPitch) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let path = dir.join("amdf_curve.csv");
    write_csv(
        &path,
        "lag,amdf",
        result.curve().points().map(|(lag, v)| (lag as f64, v)),
    )?;
    tracing::info!("Wrote AMDF curve to {}", path.display());
    Ok(())
}

fn write_cepstral_series(dir: &Path, session: &CepstralSession) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for (i, frame) in session.frames().iter().enumerate() {
        let cepstrum_path = dir.join(format!("frame{}_cepstrum.csv", i + 1));
        write_csv(
            &cepstrum_path,
            "quefrency,cepstrum",
            frame
                .cepstrum
                .values()
                .iter()
                .enumerate()
                .map(|(q, &c)| (q as f64, c)),
        )?;

        let spectrum_path = dir.join(format!("frame{}_smoothed_spectrum.csv", i + 1));
        let frequencies = frame.frequencies();
        write_csv(
            &spectrum_path,
            "frequency_hz,smoothed",
            frequencies
                .iter()
                .copied()
                .zip(frame.smoothed_spectrum.iter().copied()),
        )?;
    }
    tracing::info!(
        "Wrote {} cepstra and smoothed spectra to {}",
        session.n_frames(),
        dir.display()
    );
    Ok(())
}
