//! Step-wise focal-length calibration session.
//!
//! The session enforces the order the device procedure requires:
//! validate scan parameters, aggregate the left and right sensors (the
//! physical scan runs in between, outside this crate), then estimate and
//! optionally apply the correction.
//!
//! # Example
//!
//! ```
//! use focal_calib_core::{FocalLengths, FrameQueue, RecordedFrame, RectSides};
//! use focal_calib_pipeline::{run_focal_length_calibration, FocalCalibConfig, Progress};
//!
//! let k = FocalLengths::new(600.0, 600.0);
//! let left: FrameQueue<_> = (0..4)
//!     .map(|_| RecordedFrame::new(k, RectSides::new(100.0, 100.0, 80.0, 80.0)))
//!     .collect();
//! let right: FrameQueue<_> = (0..4)
//!     .map(|_| RecordedFrame::new(k, RectSides::new(101.0, 101.0, 80.8, 80.8)))
//!     .collect();
//!
//! let report = run_focal_length_calibration(
//!     &left,
//!     &right,
//!     &FocalCalibConfig::default(),
//!     &mut Progress::default(),
//! )
//! .unwrap();
//! assert!((report.correction.factor - 1.01).abs() < 1e-9);
//! ```

use crate::aggregate::{get_target_rect_info, Progress};
use crate::estimate::{apply_correction, focal_length_correction_factor, FocalLengthCorrection};
use anyhow::{ensure, Context, Result};
use focal_calib_core::{FocalLengths, FrameSource, Real, ScanParams, TargetRectInfo, TargetSize};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Configuration of a focal-length calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocalCalibConfig {
    /// Scan-control parameters forwarded to the device.
    pub scan: ScanParams,
    /// Physical target size.
    pub target: TargetSize,
    /// Stereo baseline, same unit as `target`.
    pub baseline: Real,
    /// Compute corrected intrinsics from the estimated factor.
    pub apply: bool,
}

impl Default for FocalCalibConfig {
    fn default() -> Self {
        Self {
            scan: ScanParams::default(),
            target: TargetSize::default(),
            baseline: 50.0,
            apply: true,
        }
    }
}

/// Sensor of the stereo pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensor {
    Left,
    Right,
}

impl fmt::Display for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sensor::Left => write!(f, "left sensor"),
            Sensor::Right => write!(f, "right sensor"),
        }
    }
}

/// Focal lengths after applying the correction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectedIntrinsics {
    pub left: FocalLengths,
    pub right: FocalLengths,
}

/// Outcome of a calibration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocalLengthReport {
    pub left: TargetRectInfo,
    pub right: TargetRectInfo,
    pub correction: FocalLengthCorrection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrected: Option<CorrectedIntrinsics>,
}

/// Calibration state updated by the step functions.
#[derive(Debug, Clone)]
pub struct FocalCalibSession {
    config: FocalCalibConfig,
    validated: bool,
    left: Option<TargetRectInfo>,
    right: Option<TargetRectInfo>,
    correction: Option<FocalLengthCorrection>,
}

impl FocalCalibSession {
    pub fn new(config: FocalCalibConfig) -> Self {
        Self {
            config,
            validated: false,
            left: None,
            right: None,
            correction: None,
        }
    }

    pub fn config(&self) -> &FocalCalibConfig {
        &self.config
    }

    pub fn measurement(&self, sensor: Sensor) -> Option<&TargetRectInfo> {
        match sensor {
            Sensor::Left => self.left.as_ref(),
            Sensor::Right => self.right.as_ref(),
        }
    }

    pub fn correction(&self) -> Option<&FocalLengthCorrection> {
        self.correction.as_ref()
    }

    /// Check the scan parameters. Must succeed before any aggregation.
    pub fn step_validate(&mut self) -> Result<()> {
        self.config
            .scan
            .validate()
            .context("scan parameters rejected")?;
        self.validated = true;
        Ok(())
    }

    /// Average the target measurement of one sensor from its frame queue.
    ///
    /// Re-running a sensor replaces its measurement and drops any estimate.
    pub fn step_aggregate<Q: FrameSource>(
        &mut self,
        sensor: Sensor,
        queue: &Q,
        progress: &mut Progress<'_>,
    ) -> Result<&TargetRectInfo> {
        ensure!(
            self.validated,
            "scan parameters must be validated before aggregating the {sensor}"
        );
        let info = get_target_rect_info(queue, progress)
            .with_context(|| format!("target aggregation failed for the {sensor}"))?;
        self.correction = None;
        let slot = match sensor {
            Sensor::Left => &mut self.left,
            Sensor::Right => &mut self.right,
        };
        Ok(slot.insert(info))
    }

    /// Estimate the correction from both sensor measurements.
    pub fn step_estimate(&mut self) -> Result<FocalLengthCorrection> {
        let (Some(left), Some(right)) = (self.left.as_ref(), self.right.as_ref()) else {
            anyhow::bail!("both sensors must be aggregated before estimating the correction");
        };
        let correction = focal_length_correction_factor(
            &left.sides,
            &right.sides,
            [left.intrinsics.fx, right.intrinsics.fx],
            [left.intrinsics.fy, right.intrinsics.fy],
            &self.config.target,
            self.config.baseline,
        );
        info!(
            "focal length correction: factor {:.6}, ratio {:.4}%, tilt {:.3} deg",
            correction.factor, correction.ratio, correction.angle
        );
        self.correction = Some(correction);
        Ok(correction)
    }

    /// Build the report; applies the correction when configured.
    pub fn export(&self) -> Result<FocalLengthReport> {
        let (Some(left), Some(right), Some(correction)) =
            (self.left, self.right, self.correction)
        else {
            anyhow::bail!("calibration is incomplete: run all steps before exporting");
        };

        let corrected = if self.config.apply {
            let (l, r) = apply_correction(
                &left.intrinsics,
                &right.intrinsics,
                correction.factor,
                self.config.scan.adjusts_both_sides(),
            )
            .context("failed to apply the focal length correction")?;
            Some(CorrectedIntrinsics { left: l, right: r })
        } else {
            None
        };

        Ok(FocalLengthReport {
            left,
            right,
            correction,
            corrected,
        })
    }
}

/// Run every step on a pair of frame queues.
///
/// `progress` is shared by both aggregation passes.
pub fn run_focal_length_calibration<L, R>(
    left_queue: &L,
    right_queue: &R,
    config: &FocalCalibConfig,
    progress: &mut Progress<'_>,
) -> Result<FocalLengthReport>
where
    L: FrameSource,
    R: FrameSource,
{
    let mut session = FocalCalibSession::new(config.clone());
    session.step_validate()?;
    session.step_aggregate(Sensor::Left, left_queue, progress)?;
    session.step_aggregate(Sensor::Right, right_queue, progress)?;
    session.step_estimate()?;
    session.export()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use focal_calib_core::{FocalCalibError, FrameQueue, RecordedFrame, RectSides};

    const K: FocalLengths = FocalLengths::new(600.0, 600.0);

    fn queue(sides: RectSides, n: usize) -> FrameQueue<RecordedFrame> {
        (0..n).map(|_| RecordedFrame::new(K, sides)).collect()
    }

    #[test]
    fn aggregation_requires_validation() {
        let mut session = FocalCalibSession::new(FocalCalibConfig::default());
        let q = queue(RectSides::new(100.0, 100.0, 80.0, 80.0), 2);
        let err = session
            .step_aggregate(Sensor::Left, &q, &mut Progress::default())
            .unwrap_err();
        assert!(err.to_string().contains("validated"));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn invalid_scan_params_stop_before_touching_queues() {
        let config = FocalCalibConfig {
            scan: ScanParams {
                step_count: 300,
                ..Default::default()
            },
            ..Default::default()
        };
        let left = queue(RectSides::new(100.0, 100.0, 80.0, 80.0), 3);
        let right = queue(RectSides::new(100.0, 100.0, 80.0, 80.0), 3);
        let err =
            run_focal_length_calibration(&left, &right, &config, &mut Progress::default())
                .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FocalCalibError>(),
            Some(FocalCalibError::InvalidParameter {
                field: "step_count",
                ..
            })
        ));
        assert_eq!(left.len(), 3);
        assert_eq!(right.len(), 3);
    }

    #[test]
    fn errors_name_the_failing_sensor() {
        let left = queue(RectSides::new(100.0, 100.0, 80.0, 80.0), 3);
        let right = FrameQueue::<RecordedFrame>::new();
        let err = run_focal_length_calibration(
            &left,
            &right,
            &FocalCalibConfig::default(),
            &mut Progress::default(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("right sensor"));
        assert_eq!(
            err.downcast_ref::<FocalCalibError>(),
            Some(&FocalCalibError::EmptyInput)
        );
    }

    #[test]
    fn estimate_and_export_need_all_steps() {
        let mut session = FocalCalibSession::new(FocalCalibConfig::default());
        assert!(session.step_estimate().is_err());
        assert!(session.export().is_err());

        session.step_validate().unwrap();
        let q = queue(RectSides::new(100.0, 100.0, 80.0, 80.0), 1);
        session
            .step_aggregate(Sensor::Left, &q, &mut Progress::default())
            .unwrap();
        assert!(session.step_estimate().is_err());
    }

    #[test]
    fn reaggregation_drops_stale_estimate() {
        let mut session = FocalCalibSession::new(FocalCalibConfig::default());
        session.step_validate().unwrap();
        let sides = RectSides::new(100.0, 100.0, 80.0, 80.0);
        let mut progress = Progress::default();
        session
            .step_aggregate(Sensor::Left, &queue(sides, 2), &mut progress)
            .unwrap();
        session
            .step_aggregate(Sensor::Right, &queue(sides, 2), &mut progress)
            .unwrap();
        session.step_estimate().unwrap();
        assert!(session.correction().is_some());

        session
            .step_aggregate(Sensor::Right, &queue(sides, 1), &mut progress)
            .unwrap();
        assert!(session.correction().is_none());
        assert_eq!(session.measurement(Sensor::Right).unwrap().frames_used, 1);
        assert_eq!(progress.value(), 5);
    }

    #[test]
    fn report_applies_correction_per_config() {
        let left = queue(RectSides::new(100.0, 100.0, 80.0, 80.0), 2);
        let right = queue(RectSides::new(102.0, 102.0, 81.6, 81.6), 2);
        let report = run_focal_length_calibration(
            &left,
            &right,
            &FocalCalibConfig::default(),
            &mut Progress::default(),
        )
        .unwrap();
        assert_relative_eq!(report.correction.factor, 1.02, epsilon = 1e-9);
        let corrected = report.corrected.unwrap();
        assert_eq!(corrected.left, K);
        assert_relative_eq!(corrected.right.fx, 612.0, epsilon = 1e-6);

        let config = FocalCalibConfig {
            apply: false,
            ..Default::default()
        };
        let left = queue(RectSides::new(100.0, 100.0, 80.0, 80.0), 2);
        let right = queue(RectSides::new(102.0, 102.0, 81.6, 81.6), 2);
        let report =
            run_focal_length_calibration(&left, &right, &config, &mut Progress::default())
                .unwrap();
        assert!(report.corrected.is_none());
    }

    #[test]
    fn config_round_trips_with_partial_json() {
        let config: FocalCalibConfig =
            serde_json::from_str(r#"{"baseline": 55.0, "scan": {"adjust_both_sides": 1}}"#)
                .unwrap();
        assert_eq!(config.baseline, 55.0);
        assert!(config.scan.adjusts_both_sides());
        assert_eq!(config.target, TargetSize::default());
        assert!(config.apply);
    }
}
