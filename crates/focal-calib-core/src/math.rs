use nalgebra::{Isometry3, Point2, Point3, Vector2, Vector3};

pub type Real = f64;

pub type Vec2 = Vector2<Real>;
pub type Vec3 = Vector3<Real>;
pub type Pt2 = Point2<Real>;
pub type Pt3 = Point3<Real>;
pub type Iso3 = Isometry3<Real>;

/// Denominator threshold below which a ratio term is treated as zero.
pub const DENOM_EPS: Real = 0.1;

/// `num / den` when `den` exceeds [`DENOM_EPS`], zero otherwise.
#[inline]
pub fn guarded_div(num: Real, den: Real) -> Real {
    if den > DENOM_EPS {
        num / den
    } else {
        0.0
    }
}

pub fn from_homogeneous(v: &Vec3) -> Pt2 {
    Pt2::new(v.x / v.z, v.y / v.z)
}
