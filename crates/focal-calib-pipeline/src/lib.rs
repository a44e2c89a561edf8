//! Focal-length calibration pipeline for stereo sensors.
//!
//! Stages, in the order a calibration run uses them:
//! 1. scan-parameter validation ([`focal_calib_core::ScanParams`]),
//! 2. target measurement aggregation per sensor ([`get_target_rect_info`]),
//! 3. correction estimation ([`focal_length_correction_factor`]),
//! 4. optional application to the nominal intrinsics ([`apply_correction`]).
//!
//! [`FocalCalibSession`] runs the stages step by step and
//! [`run_focal_length_calibration`] runs all of them at once.

pub mod aggregate;
pub mod estimate;
pub mod session;

pub use aggregate::{get_target_rect_info, Progress};
pub use estimate::{apply_correction, focal_length_correction_factor, FocalLengthCorrection};
pub use session::{
    run_focal_length_calibration, CorrectedIntrinsics, FocalCalibConfig, FocalCalibSession,
    FocalLengthReport, Sensor,
};
