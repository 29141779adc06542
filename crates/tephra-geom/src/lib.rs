//! Geometry primitives shared by the engine crates.
#![forbid(unsafe_code)]

mod frustum;

pub use frustum::{Containment, Frustum, Plane};

use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const UP: Vec3 = Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[inline]
    pub fn dot(self, rhs: Vec3) -> f32 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    #[inline]
    pub fn cross(self, rhs: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    #[inline]
    pub fn length_sq(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.length_sq().sqrt()
    }

    #[inline]
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len > 0.0 { self / len } else { self }
    }

    /// Squared distance to another point.
    #[inline]
    pub fn distance_sq(self, rhs: Vec3) -> f32 {
        (self - rhs).length_sq()
    }

    /// Projection onto the horizontal (XZ) plane.
    #[inline]
    pub fn flattened(self) -> Vec3 {
        Vec3::new(self.x, 0.0, self.z)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    #[inline]
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    #[inline]
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    #[inline]
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    #[inline]
    fn sub_assign(&mut self, rhs: Vec3) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Vec3;
    #[inline]
    fn div(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    #[inline]
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The unit cube occupied by the block at integer grid cell `(bx, by, bz)`.
    #[inline]
    pub fn unit_cube(bx: i32, by: i32, bz: i32) -> Self {
        let min = Vec3::new(bx as f32, by as f32, bz as f32);
        Self {
            min,
            max: min + Vec3::new(1.0, 1.0, 1.0),
        }
    }

    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    /// Per-axis overlap depths against `other`; all positive iff the boxes
    /// truly intersect.
    #[inline]
    pub fn overlap(&self, other: &Aabb) -> Vec3 {
        Vec3::new(
            self.max.x.min(other.max.x) - self.min.x.max(other.min.x),
            self.max.y.min(other.max.y) - self.min.y.max(other.min.y),
            self.max.z.min(other.max.z) - self.min.z.max(other.min.z),
        )
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn cross_follows_right_hand_rule() {
        let x = Vec3::new(1.0, 0.0, 0.0);
        let y = Vec3::new(0.0, 1.0, 0.0);
        assert_eq!(x.cross(y), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn unit_cube_spans_one_block() {
        let c = Aabb::unit_cube(-2, 5, 0);
        assert_eq!(c.min, Vec3::new(-2.0, 5.0, 0.0));
        assert_eq!(c.max, Vec3::new(-1.0, 6.0, 1.0));
    }

    #[test]
    fn overlap_depths_match_intersection() {
        let a = Aabb::new(Vec3::ZERO, Vec3::new(2.0, 2.0, 2.0));
        let b = Aabb::new(Vec3::new(1.5, 1.0, -0.5), Vec3::new(3.0, 3.0, 0.5));
        assert!(a.intersects(&b));
        let o = a.overlap(&b);
        assert!((o.x - 0.5).abs() < 1e-6);
        assert!((o.y - 1.0).abs() < 1e-6);
        assert!((o.z - 0.5).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn intersects_iff_all_overlaps_positive(a: Aabb, b: Aabb) {
            for v in [a.min, a.max, b.min, b.max] {
                prop_assume!(v.x.is_finite() && v.y.is_finite() && v.z.is_finite());
            }
            let o = a.overlap(&b);
            let expected = o.x > 0.0 && o.y > 0.0 && o.z > 0.0;
            prop_assert_eq!(a.intersects(&b), expected);
        }

        #[test]
        fn normalized_is_unit_or_zero(v: Vec3) {
            prop_assume!(v.x.is_finite() && v.y.is_finite() && v.z.is_finite());
            prop_assume!(v.length() < 1e12);
            let n = v.normalized();
            if v.length() > 1e-3 {
                prop_assert!((n.length() - 1.0).abs() < 1e-3);
            }
        }
    }
}
