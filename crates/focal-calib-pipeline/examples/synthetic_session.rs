//! Step-wise session on a synthetic stereo pair.
//!
//! This example shows:
//! - Generating target measurements for a pair whose right sensor's focal
//!   length is off by 1.5 %
//! - Validating the scan parameters
//! - Aggregating both sensors with a shared progress counter
//! - Estimating and exporting the correction
//!
//! Run with: cargo run --example synthetic_session

use focal_calib_core::synthetic::noise::UniformEdgeNoise;
use focal_calib_core::synthetic::target::{project_rect_sides, stereo_poses, PinholeIntrinsics};
use focal_calib_core::{FrameQueue, RecordedFrame};
use focal_calib_pipeline::{FocalCalibConfig, FocalCalibSession, Progress, Sensor};

fn main() -> anyhow::Result<()> {
    let nominal = PinholeIntrinsics {
        fx: 640.0,
        fy: 640.0,
        cx: 640.0,
        cy: 400.0,
    };
    let right_truth = nominal.with_focal_scale(1.015);
    let config = FocalCalibConfig::default();
    let (left_pose, right_pose) = stereo_poses(650.0, 0.05, config.baseline);

    let left_sides = project_rect_sides(&nominal, &left_pose, &config.target)?;
    let right_sides = project_rect_sides(&right_truth, &right_pose, &config.target)?;
    let noise = UniformEdgeNoise {
        seed: 42,
        max_abs_px: 0.25,
    };

    let left: FrameQueue<_> = (0..25)
        .map(|i| RecordedFrame::new(nominal.focal_lengths(), noise.apply(i, left_sides)))
        .collect();
    let right: FrameQueue<_> = (0..25)
        .map(|i| RecordedFrame::new(nominal.focal_lengths(), noise.apply(100 + i, right_sides)))
        .collect();

    let mut session = FocalCalibSession::new(config);
    session.step_validate()?;
    println!("✓ Scan parameters valid");

    let total = (left.len() + right.len()) as f64;
    let mut progress = Progress::with_callback(0, |p| {
        if p as usize % 10 == 0 {
            println!("  progress {:.0}%", 100.0 * p / total);
        }
    });
    let l = session.step_aggregate(Sensor::Left, &left, &mut progress)?;
    println!("✓ Left sides: {:?}", l.sides.0);
    let r = session.step_aggregate(Sensor::Right, &right, &mut progress)?;
    println!("✓ Right sides: {:?}", r.sides.0);

    let correction = session.step_estimate()?;
    println!(
        "✓ Correction factor {:.5} (ratio {:.3}%, tilt {:.2} deg)",
        correction.factor, correction.ratio, correction.angle
    );

    let report = session.export()?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
