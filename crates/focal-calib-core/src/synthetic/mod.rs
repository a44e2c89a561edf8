//! Deterministic synthetic data generation helpers.
//!
//! This module builds synthetic target observations for tests, the CLI
//! `simulate` command and benchmarking:
//! - a pinhole projection of the rectangular target into a sensor,
//! - simple stereo pose generators,
//! - deterministic pseudo-random edge noise.
//!
//! # Example
//!
//! ```
//! use focal_calib_core::synthetic::target::{pose_at_distance, project_rect_sides, PinholeIntrinsics};
//! use focal_calib_core::TargetSize;
//!
//! let k = PinholeIntrinsics { fx: 600.0, fy: 600.0, cx: 320.0, cy: 240.0 };
//! let target = TargetSize { width: 175.0, height: 100.0 };
//! let sides = project_rect_sides(&k, &pose_at_distance(500.0, 0.0), &target).unwrap();
//! assert!((sides[0] - 210.0).abs() < 1e-9);
//! ```

pub mod noise;
pub mod target;
