//! Focal-length correction from averaged stereo target measurements.
//!
//! Both sensors of the pair observe the same physical target. With correct
//! focal lengths the right/left edge ratio, normalized by the nominal focal
//! lengths, is one. The deviation of that ratio gives the correction factor
//! for the right sensor; the relative aspect-ratio skew between the views is
//! used as a tilt proxy and partially compensated.
//!
//! Every division is guarded: a term whose denominator is too small
//! contributes zero instead of producing NaN or infinity.

use focal_calib_core::{guarded_div, FocalCalibError, FocalLengths, Real, RectSides, TargetSize};
use log::debug;
use serde::{Deserialize, Serialize};

/// Weight of the alignment term subtracted from the edge ratio.
pub const ALIGNMENT_WEIGHT: Real = 0.5;

/// Result of [`focal_length_correction_factor`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FocalLengthCorrection {
    /// Alignment-compensated focal-length deviation, in percent.
    pub ratio: Real,
    /// Estimated target tilt, in degrees.
    pub angle: Real,
    /// Multiplicative correction, `ratio / 100 + 1`.
    pub factor: Real,
}

/// Compute the focal-length correction of a stereo pair.
///
/// `fx` and `fy` hold the `[left, right]` nominal focal lengths; `target`
/// and `baseline` must share a unit.
///
/// # Example
///
/// ```
/// use focal_calib_core::{RectSides, TargetSize};
/// use focal_calib_pipeline::focal_length_correction_factor;
///
/// let sides = RectSides::new(100.0, 100.0, 80.0, 80.0);
/// let target = TargetSize { width: 50.0, height: 50.0 };
/// let c = focal_length_correction_factor(&sides, &sides, [600.0; 2], [600.0; 2], &target, 50.0);
/// assert_eq!(c.factor, 1.0);
/// ```
pub fn focal_length_correction_factor(
    left: &RectSides,
    right: &RectSides,
    fx: [Real; 2],
    fy: [Real; 2],
    target: &TargetSize,
    baseline: Real,
) -> FocalLengthCorrection {
    let ar_left = left.aspect_ratio();
    let ar_right = right.aspect_ratio();
    let align = if ar_left > 0.0 {
        finite_or_zero(ar_right / ar_left - 1.0)
    } else {
        0.0
    };

    let gt_left = mean_target_distance(left, fx[0], fy[0], target);
    let gt_right = mean_target_distance(right, fx[1], fy[1], target);
    let angle = 0.5 * (tilt_deg(align, gt_left, baseline) + tilt_deg(align, gt_right, baseline));

    let scale_x = guarded_div(fx[0], fx[1]);
    let scale_y = guarded_div(fy[0], fy[1]);
    let scales = [scale_x, scale_x, scale_y, scale_y];
    let mean_ratio = (0..4)
        .map(|i| guarded_div(scales[i] * right[i], left[i]))
        .sum::<Real>()
        / 4.0;
    let ratio_pct = (mean_ratio - 1.0) * 100.0;

    let ratio = ratio_pct - ALIGNMENT_WEIGHT * (align * 100.0);
    let factor = ratio / 100.0 + 1.0;

    debug!(
        "focal correction: align {:.5}, distance l/r {:.2}/{:.2}, edge ratio {:.4}%, ratio {:.4}%, angle {:.4} deg",
        align, gt_left, gt_right, ratio_pct, ratio, angle
    );

    FocalLengthCorrection {
        ratio,
        angle,
        factor,
    }
}

/// Mean of the per-edge pinhole distances `f * size / edge`.
///
/// Non-positive edges, and subnormal ones whose distance overflows,
/// contribute zero but still count in the divisor.
fn mean_target_distance(sides: &RectSides, fx: Real, fy: Real, target: &TargetSize) -> Real {
    let per_edge = |f: Real, dim: Real, edge: Real| {
        if edge > 0.0 {
            finite_or_zero(f * dim / edge)
        } else {
            0.0
        }
    };
    (per_edge(fx, target.width, sides[0])
        + per_edge(fx, target.width, sides[1])
        + per_edge(fy, target.height, sides[2])
        + per_edge(fy, target.height, sides[3]))
        / 4.0
}

fn finite_or_zero(v: Real) -> Real {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

fn tilt_deg(align: Real, distance: Real, baseline: Real) -> Real {
    guarded_div(align * distance, baseline.abs())
        .atan()
        .to_degrees()
}

/// Apply a correction factor to the nominal focal lengths of a stereo pair.
///
/// Without `adjust_both_sides` only the right sensor is scaled by `factor`.
/// Otherwise the factor is split: the left sensor is divided and the right
/// one multiplied by `sqrt(factor)`, which keeps the same right/left ratio.
///
/// # Errors
///
/// [`FocalCalibError::InvalidCorrection`] for a non-finite or non-positive factor.
pub fn apply_correction(
    left: &FocalLengths,
    right: &FocalLengths,
    factor: Real,
    adjust_both_sides: bool,
) -> Result<(FocalLengths, FocalLengths), FocalCalibError> {
    if !factor.is_finite() || factor <= 0.0 {
        return Err(FocalCalibError::InvalidCorrection(factor));
    }
    if adjust_both_sides {
        let half = factor.sqrt();
        Ok((left.scaled(1.0 / half), right.scaled(half)))
    } else {
        Ok((*left, right.scaled(factor)))
    }
}
