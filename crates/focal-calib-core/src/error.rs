use crate::Real;
use thiserror::Error;

/// Errors raised while validating, aggregating or applying a focal-length calibration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FocalCalibError {
    /// A scan-control parameter is outside its inclusive valid range.
    #[error("auto calibration failed: given value of '{field}' {value} is out of range ({min} - {max})")]
    InvalidParameter {
        field: &'static str,
        value: i32,
        min: i32,
        max: i32,
    },
    /// The frame queue was empty when aggregation started.
    #[error("extract target rectangle info: no frames in input queue")]
    EmptyInput,
    /// The target detector failed on one of the frames.
    #[error("failed to extract target information from the captured frames (frame {frame}: {reason})")]
    DetectionFailure { frame: usize, reason: String },
    /// Frames were present but none of them carried data.
    #[error("failed to extract the target rectangle info")]
    NoValidMeasurements,
    /// A correction factor that cannot be applied to focal lengths.
    #[error("correction factor {0} cannot be applied")]
    InvalidCorrection(Real),
}

/// Failure reported by a target detector for a single frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct DetectionError(pub String);

impl DetectionError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
