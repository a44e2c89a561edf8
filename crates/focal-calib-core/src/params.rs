//! Scan-control parameters of the focal-length calibration.
//!
//! The values are forwarded to the device that drives the scan, so they are
//! checked up front: a rejected set never reaches the sensor.

use crate::FocalCalibError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

pub const STEP_COUNT_RANGE: RangeInclusive<i32> = 8..=256;
pub const SCAN_RANGE_RANGE: RangeInclusive<i32> = 1..=60000;
pub const FLAG_RANGE: RangeInclusive<i32> = 0..=1;

/// Scan-control parameters.
///
/// Flags are kept as integers because the device protocol carries them as
/// such; only `0` and `1` are valid.
///
/// # Example
///
/// ```
/// use focal_calib_core::ScanParams;
///
/// let params = ScanParams {
///     step_count: 64,
///     ..Default::default()
/// };
/// assert!(params.validate().is_ok());
///
/// let bad = ScanParams { white_wall_mode: 2, ..params };
/// assert!(bad.validate().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParams {
    /// Number of scan steps.
    pub step_count: i32,
    /// Focal-length scan range.
    pub scan_range: i32,
    /// Keep the new value after a successful scan.
    pub keep_value_after_success: i32,
    /// Interrupt data sampling.
    pub interrupt_data_sampling: i32,
    /// Split the correction between both sensors.
    pub adjust_both_sides: i32,
    /// Scan location selector.
    pub scan_location: i32,
    /// Scan direction selector.
    pub scan_direction: i32,
    /// Calibrate against a textureless wall.
    pub white_wall_mode: i32,
}

impl Default for ScanParams {
    fn default() -> Self {
        Self {
            step_count: 20,
            scan_range: 40,
            keep_value_after_success: 1,
            interrupt_data_sampling: 0,
            adjust_both_sides: 0,
            scan_location: 0,
            scan_direction: 0,
            white_wall_mode: 0,
        }
    }
}

impl ScanParams {
    /// Check every field against its valid range, in declaration order.
    ///
    /// # Errors
    ///
    /// [`FocalCalibError::InvalidParameter`] for the first out-of-range field.
    pub fn validate(&self) -> Result<(), FocalCalibError> {
        check_focal_length_params(
            self.step_count,
            self.scan_range,
            self.keep_value_after_success,
            self.interrupt_data_sampling,
            self.adjust_both_sides,
            self.scan_location,
            self.scan_direction,
            self.white_wall_mode,
        )
    }

    pub fn adjusts_both_sides(&self) -> bool {
        self.adjust_both_sides == 1
    }
}

/// Validate the raw scan-control values; first failing field wins.
#[allow(clippy::too_many_arguments)]
pub fn check_focal_length_params(
    step_count: i32,
    scan_range: i32,
    keep_value_after_success: i32,
    interrupt_data_sampling: i32,
    adjust_both_sides: i32,
    scan_location: i32,
    scan_direction: i32,
    white_wall_mode: i32,
) -> Result<(), FocalCalibError> {
    check_range("step_count", step_count, STEP_COUNT_RANGE)?;
    check_range("scan_range", scan_range, SCAN_RANGE_RANGE)?;
    check_range(
        "keep_value_after_success",
        keep_value_after_success,
        FLAG_RANGE,
    )?;
    check_range(
        "interrupt_data_sampling",
        interrupt_data_sampling,
        FLAG_RANGE,
    )?;
    check_range("adjust_both_sides", adjust_both_sides, FLAG_RANGE)?;
    check_range("scan_location", scan_location, FLAG_RANGE)?;
    check_range("scan_direction", scan_direction, FLAG_RANGE)?;
    check_range("white_wall_mode", white_wall_mode, FLAG_RANGE)?;
    Ok(())
}

fn check_range(
    field: &'static str,
    value: i32,
    range: RangeInclusive<i32>,
) -> Result<(), FocalCalibError> {
    if range.contains(&value) {
        return Ok(());
    }
    debug!("scan parameter '{field}' rejected: {value} not in {range:?}");
    Err(FocalCalibError::InvalidParameter {
        field,
        value,
        min: *range.start(),
        max: *range.end(),
    })
}
