//! Core types for stereo focal-length calibration.
//!
//! This crate contains:
//! - math aliases and the denominator guard shared by the estimators,
//! - the measurement data model ([`RectSides`], [`FocalLengths`], [`TargetSize`]),
//! - scan-parameter validation ([`ScanParams`]),
//! - frame capabilities and a synchronized [`FrameQueue`],
//! - deterministic synthetic target projection for tests and simulation.
//!
//! Edge layout used throughout the workspace:
//! `[top, bottom, left, right]`, horizontal edges first (paired with `fx`),
//! vertical edges last (paired with `fy`).

mod error;
/// Frame capabilities, synchronized queue and recorded frames.
pub mod frame;
/// Linear algebra type aliases and helpers.
mod math;
/// Scan-control parameters and their validation.
pub mod params;
/// Deterministic synthetic data generation helpers.
pub mod synthetic;
mod types;

pub use error::*;
pub use frame::{CalibFrame, FrameQueue, FrameSource, RecordedFrame};
pub use math::*;
pub use params::{check_focal_length_params, ScanParams};
pub use types::*;
