//! focal-calib CLI: run the stereo focal-length correction on recorded or
//! simulated target measurements.

use clap::{Args, Parser, Subcommand};
use focal_calib_core::synthetic::noise::UniformEdgeNoise;
use focal_calib_core::synthetic::target::{project_rect_sides, stereo_poses, PinholeIntrinsics};
use focal_calib_core::{FrameQueue, RecordedFrame, RectSides, TargetSize};
use focal_calib_pipeline::{
    run_focal_length_calibration, FocalCalibConfig, FocalLengthReport, Progress,
};
use serde::{Deserialize, Serialize};
use std::{error::Error, fs, path::Path, path::PathBuf};

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "focal-calib")]
#[command(about = "Stereo focal-length correction from target edge measurements")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the calibration on a recording and print the JSON report.
    Run(RunArgs),
    /// Write a synthetic stereo recording.
    Simulate(SimulateArgs),
}

#[derive(Debug, Clone, Args)]
struct RunArgs {
    /// Path to a JSON recording (`left` and `right` frame lists).
    #[arg(long)]
    input: PathBuf,

    /// Optional path to a JSON FocalCalibConfig. Defaults are used if omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct SimulateArgs {
    /// Path to write the recording (JSON).
    #[arg(long)]
    out: PathBuf,

    /// Frames per sensor.
    #[arg(long, default_value_t = 30)]
    frames: usize,

    /// Target distance, in target units.
    #[arg(long, default_value_t = 700.0)]
    distance: f64,

    /// Target yaw in degrees.
    #[arg(long, default_value_t = 0.0)]
    yaw_deg: f64,

    /// Right sensor focal-length error, in percent.
    #[arg(long, default_value_t = 1.0, allow_negative_numbers = true)]
    fx_error: f64,

    /// Nominal focal length of both sensors, in pixels.
    #[arg(long, default_value_t = 640.0)]
    focal: f64,

    /// Maximum absolute edge noise, in pixels.
    #[arg(long, default_value_t = 0.0)]
    noise: f64,

    /// Noise seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Stereo baseline, in target units.
    #[arg(long, default_value_t = 50.0)]
    baseline: f64,
}

/// Captured detections of both sensors.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Recording {
    left: Vec<RecordedFrame>,
    right: Vec<RecordedFrame>,
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> CliResult<T> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let value = serde_json::from_str(&data)
        .map_err(|e| format!("failed to parse {}: {e}", path.display()))?;
    Ok(value)
}

fn run_from_files(input: &Path, config: Option<&Path>) -> CliResult<FocalLengthReport> {
    let recording: Recording = load_json_file(input)?;
    let config = match config {
        Some(path) => load_json_file::<FocalCalibConfig>(path)?,
        None => FocalCalibConfig::default(),
    };
    tracing::info!(
        "Loaded {} left / {} right frames from {}",
        recording.left.len(),
        recording.right.len(),
        input.display()
    );

    let left: FrameQueue<_> = recording.left.into_iter().collect();
    let right: FrameQueue<_> = recording.right.into_iter().collect();
    let total = left.len() + right.len();
    let mut progress = Progress::with_callback(0, |p| {
        tracing::debug!("processed {p:.0}/{total} frames");
    });

    let report = run_focal_length_calibration(&left, &right, &config, &mut progress)
        .map_err(|e| format!("{e:#}"))?;
    Ok(report)
}

fn simulate(args: &SimulateArgs) -> CliResult<Recording> {
    if args.frames == 0 {
        return Err("--frames must be > 0".into());
    }
    let nominal = PinholeIntrinsics {
        fx: args.focal,
        fy: args.focal,
        cx: 640.0,
        cy: 400.0,
    };
    let right_truth = nominal.with_focal_scale(1.0 + args.fx_error / 100.0);
    let target = TargetSize::default();
    let (left_pose, right_pose) =
        stereo_poses(args.distance, args.yaw_deg.to_radians(), args.baseline);

    let left_sides = project_rect_sides(&nominal, &left_pose, &target)?;
    let right_sides = project_rect_sides(&right_truth, &right_pose, &target)?;
    let noise = UniformEdgeNoise {
        seed: args.seed,
        max_abs_px: args.noise,
    };

    let frames = |sides: RectSides, offset: usize| -> Vec<RecordedFrame> {
        (0..args.frames)
            .map(|i| RecordedFrame::new(nominal.focal_lengths(), noise.apply(offset + i, sides)))
            .collect()
    };

    Ok(Recording {
        left: frames(left_sides, 0),
        right: frames(right_sides, args.frames),
    })
}

fn run_simulate(args: &SimulateArgs) -> CliResult<()> {
    let recording = simulate(args)?;
    fs::write(&args.out, serde_json::to_string_pretty(&recording)?)?;
    tracing::info!(
        "Recording with {} frames per sensor written to {}",
        args.frames,
        args.out.display()
    );
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> CliResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => {
            let report = run_from_files(&args.input, args.config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Commands::Simulate(args) => run_simulate(&args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use focal_calib_core::FocalLengths;
    use tempfile::NamedTempFile;

    fn write_json<T: Serialize>(value: &T, path: &Path) {
        serde_json::to_writer_pretty(fs::File::create(path).unwrap(), value).unwrap();
    }

    fn simulate_args(out: &Path) -> SimulateArgs {
        SimulateArgs {
            out: out.to_path_buf(),
            frames: 12,
            distance: 700.0,
            yaw_deg: 0.0,
            fx_error: 2.0,
            focal: 640.0,
            noise: 0.0,
            seed: 0,
            baseline: 50.0,
        }
    }

    #[test]
    fn simulate_then_run_recovers_the_error() {
        let recording_file = NamedTempFile::new().unwrap();
        run_simulate(&simulate_args(recording_file.path())).unwrap();

        let report = run_from_files(recording_file.path(), None).expect("run should succeed");
        assert_eq!(report.left.frames_used, 12);
        assert!(
            (report.correction.factor - 1.02).abs() < 1e-9,
            "factor {}",
            report.correction.factor
        );

        let json = serde_json::to_string(&report).unwrap();
        let back: FocalLengthReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.right.frames_used, 12);
        assert!((back.correction.factor - report.correction.factor).abs() < 1e-12);
    }

    #[test]
    fn config_file_is_honoured() {
        let recording_file = NamedTempFile::new().unwrap();
        let config_file = NamedTempFile::new().unwrap();
        run_simulate(&simulate_args(recording_file.path())).unwrap();
        write_json(
            &FocalCalibConfig {
                apply: false,
                ..Default::default()
            },
            config_file.path(),
        );

        let report = run_from_files(recording_file.path(), Some(config_file.path())).unwrap();
        assert!(report.corrected.is_none());
    }

    #[test]
    fn pipeline_errors_are_reported() {
        let k = FocalLengths::new(600.0, 600.0);
        let recording = Recording {
            left: vec![RecordedFrame::new(k, RectSides::new(100.0, 100.0, 80.0, 80.0))],
            right: vec![RecordedFrame::failing(k, "target not found")],
        };
        let recording_file = NamedTempFile::new().unwrap();
        write_json(&recording, recording_file.path());

        let err = run_from_files(recording_file.path(), None).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("right sensor"), "{msg}");
        assert!(msg.contains("target not found"), "{msg}");
    }

    #[test]
    fn zero_frames_are_rejected() {
        let out = NamedTempFile::new().unwrap();
        let mut args = simulate_args(out.path());
        args.frames = 0;
        assert!(simulate(&args).is_err());
    }

    #[test]
    fn cli_parses_run_arguments() {
        let cli = Cli::try_parse_from(["focal-calib", "run", "--input", "rec.json"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.input, PathBuf::from("rec.json"));
                assert!(args.config.is_none());
            }
            Commands::Simulate(_) => panic!("expected run"),
        }

        let cli = Cli::try_parse_from([
            "focal-calib",
            "simulate",
            "--out",
            "rec.json",
            "--fx-error",
            "-1.5",
        ])
        .unwrap();
        match cli.command {
            Commands::Simulate(args) => assert_eq!(args.fx_error, -1.5),
            Commands::Run(_) => panic!("expected simulate"),
        }
    }
}
