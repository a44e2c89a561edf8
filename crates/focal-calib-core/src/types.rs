//! Measurement and intrinsics types shared by the calibration stages.

use crate::{guarded_div, Real};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Edge lengths of the target rectangle in pixels.
///
/// Layout:
/// - `[0]`, `[1]`: horizontal edges (top, bottom), scaled by `fx`,
/// - `[2]`, `[3]`: vertical edges (left, right), scaled by `fy`.
///
/// Serialized as a plain 4-element array.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RectSides(pub [Real; 4]);

impl RectSides {
    pub const fn new(top: Real, bottom: Real, left: Real, right: Real) -> Self {
        Self([top, bottom, left, right])
    }

    pub fn horizontal_sum(&self) -> Real {
        self.0[0] + self.0[1]
    }

    pub fn vertical_sum(&self) -> Real {
        self.0[2] + self.0[3]
    }

    /// Horizontal over vertical edge sum, zero when the vertical edges are degenerate.
    pub fn aspect_ratio(&self) -> Real {
        guarded_div(self.horizontal_sum(), self.vertical_sum())
    }

    /// Component-wise arithmetic mean, `None` for an empty slice.
    pub fn mean(samples: &[RectSides]) -> Option<RectSides> {
        if samples.is_empty() {
            return None;
        }
        let mut acc = [0.0; 4];
        for s in samples {
            for (a, v) in acc.iter_mut().zip(s.0.iter()) {
                *a += v;
            }
        }
        let n = samples.len() as Real;
        Some(RectSides(acc.map(|a| a / n)))
    }
}

impl Index<usize> for RectSides {
    type Output = Real;

    fn index(&self, idx: usize) -> &Real {
        &self.0[idx]
    }
}

impl From<[Real; 4]> for RectSides {
    fn from(v: [Real; 4]) -> Self {
        Self(v)
    }
}

/// Focal lengths of one sensor in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocalLengths {
    /// Focal length along X.
    pub fx: Real,
    /// Focal length along Y.
    pub fy: Real,
}

impl FocalLengths {
    pub const fn new(fx: Real, fy: Real) -> Self {
        Self { fx, fy }
    }

    /// Multiply both focal lengths by `factor`.
    pub fn scaled(&self, factor: Real) -> Self {
        Self {
            fx: self.fx * factor,
            fy: self.fy * factor,
        }
    }
}

/// Physical size of the calibration target.
///
/// Units must match the stereo baseline (usually millimetres).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetSize {
    pub width: Real,
    pub height: Real,
}

impl Default for TargetSize {
    fn default() -> Self {
        Self {
            width: 175.0,
            height: 100.0,
        }
    }
}

/// Averaged target measurement of one sensor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRectInfo {
    /// Mean edge lengths over all frames that carried data.
    pub sides: RectSides,
    /// Intrinsics of the first frame that carried data.
    pub intrinsics: FocalLengths,
    /// Number of frames that contributed to the mean.
    pub frames_used: usize,
}
