//! Synthetic rectangular target helpers.
//!
//! The target is a `width x height` rectangle centred on the origin of its
//! own frame (Z=0). Projecting its corners through a pinhole sensor yields
//! the same four edge lengths a target detector reports.

use crate::{FocalLengths, Iso3, Pt2, Pt3, Real, RectSides, TargetSize};
use anyhow::Result;
use nalgebra::{Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Distortion-free pinhole intrinsics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PinholeIntrinsics {
    pub fx: Real,
    pub fy: Real,
    pub cx: Real,
    pub cy: Real,
}

impl PinholeIntrinsics {
    pub fn focal_lengths(&self) -> FocalLengths {
        FocalLengths::new(self.fx, self.fy)
    }

    /// Same principal point, focal lengths multiplied by `factor`.
    pub fn with_focal_scale(&self, factor: Real) -> Self {
        Self {
            fx: self.fx * factor,
            fy: self.fy * factor,
            ..*self
        }
    }

    /// Project a camera-frame point; `None` for points at or behind the camera.
    pub fn project(&self, p: &Pt3) -> Option<Pt2> {
        if p.z <= Real::EPSILON {
            return None;
        }
        let v = crate::from_homogeneous(&p.coords);
        Some(Pt2::new(self.fx * v.x + self.cx, self.fy * v.y + self.cy))
    }
}

/// Target corners in order: top-left, top-right, bottom-right, bottom-left.
pub fn target_corners(size: &TargetSize) -> [Pt3; 4] {
    let hw = 0.5 * size.width;
    let hh = 0.5 * size.height;
    [
        Pt3::new(-hw, -hh, 0.0),
        Pt3::new(hw, -hh, 0.0),
        Pt3::new(hw, hh, 0.0),
        Pt3::new(-hw, hh, 0.0),
    ]
}

/// Project the target and measure its edges in pixels.
///
/// `cam_from_target` must map target-frame points into the camera frame.
pub fn project_rect_sides(
    intrinsics: &PinholeIntrinsics,
    cam_from_target: &Iso3,
    size: &TargetSize,
) -> Result<RectSides> {
    let mut px = [Pt2::origin(); 4];
    for (idx, corner) in target_corners(size).iter().enumerate() {
        let pc = cam_from_target.transform_point(corner);
        let Some(uv) = intrinsics.project(&pc) else {
            anyhow::bail!("target corner {idx} not projectable (z={:.6})", pc.z);
        };
        px[idx] = uv;
    }
    let [tl, tr, br, bl] = px;
    Ok(RectSides::new(
        (tr - tl).norm(),
        (br - bl).norm(),
        (bl - tl).norm(),
        (br - tr).norm(),
    ))
}

/// Target straight ahead at `distance`, rotated by `yaw_rad` around +Y.
pub fn pose_at_distance(distance: Real, yaw_rad: Real) -> Iso3 {
    let rotation = UnitQuaternion::from_scaled_axis(Vector3::new(0.0, 1.0, 0.0) * yaw_rad);
    Iso3::from_parts(Translation3::new(0.0, 0.0, distance), rotation)
}

/// Poses of the same target seen by a left sensor and a right sensor
/// displaced by `baseline` along +X.
pub fn stereo_poses(distance: Real, yaw_rad: Real, baseline: Real) -> (Iso3, Iso3) {
    let left = pose_at_distance(distance, yaw_rad);
    let right = Translation3::new(-baseline, 0.0, 0.0) * left;
    (left, right)
}
