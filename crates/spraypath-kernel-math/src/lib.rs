#![warn(missing_docs)]

//! Math types for the spraypath geometry kernel.
//!
//! Thin wrappers around nalgebra providing the types shared by the
//! kernel and the path planner: points, vectors, directions, affine
//! transforms, axis-aligned boxes, and explicit modelling tolerances.

use nalgebra::{Matrix4, Unit, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// A point in 2D parameter space.
pub type Point2 = nalgebra::Point2<f64>;

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)` about the origin.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)` about `center`.
    pub fn scale_about(center: &Point3, sx: f64, sy: f64, sz: f64) -> Self {
        Transform::translation(center.x, center.y, center.z)
            .then(&Transform::scale(sx, sy, sz))
            .then(&Transform::translation(-center.x, -center.y, -center.z))
    }

    /// Rotation about an arbitrary axis through the origin by `angle` radians.
    ///
    /// Uses Rodrigues' rotation formula.
    pub fn rotation_about_axis(axis: &Dir3, angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let t = 1.0 - c;
        let (x, y, z) = (axis.as_ref().x, axis.as_ref().y, axis.as_ref().z);
        let mut m = Matrix4::identity();
        m[(0, 0)] = t * x * x + c;
        m[(0, 1)] = t * x * y - s * z;
        m[(0, 2)] = t * x * z + s * y;
        m[(1, 0)] = t * x * y + s * z;
        m[(1, 1)] = t * y * y + c;
        m[(1, 2)] = t * y * z - s * x;
        m[(2, 0)] = t * x * z - s * y;
        m[(2, 1)] = t * y * z + s * x;
        m[(2, 2)] = t * z * z + c;
        Self { matrix: m }
    }

    /// Compose: `self` then `other` (self * other).
    ///
    /// The resulting transform applies `other` first, then `self`.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Modelling tolerances threaded explicitly through every kernel call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Absolute distance tolerance in model units.
    pub linear: f64,
    /// Angular tolerance in radians.
    pub angular: f64,
}

impl Tolerance {
    /// Default modelling tolerances (1e-6 linear, 0.01° angular).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        angular: 0.01 / 180.0 * std::f64::consts::PI,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl BoundingBox3 {
    /// Create a box from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) box suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Smallest box containing every point of the iterator.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.include_point(p);
        }
        bbox
    }

    /// True if no point has been included yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand this box to include another box.
    pub fn union(&mut self, other: &BoundingBox3) {
        if other.is_empty() {
            return;
        }
        self.include_point(&other.min);
        self.include_point(&other.max);
    }

    /// Expand the box by a tolerance in all directions.
    pub fn expand(&mut self, tol: f64) {
        self.min.x -= tol;
        self.min.y -= tol;
        self.min.z -= tol;
        self.max.x += tol;
        self.max.y += tol;
        self.max.z += tol;
    }

    /// Length of the box diagonal (zero for an empty box).
    pub fn diagonal(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            (self.max - self.min).norm()
        }
    }

    /// Squared distance from a point to the box (zero inside).
    pub fn distance_squared(&self, p: &Point3) -> f64 {
        let dx = (self.min.x - p.x).max(0.0).max(p.x - self.max.x);
        let dy = (self.min.y - p.y).max(0.0).max(p.y - self.max.y);
        let dz = (self.min.z - p.z).max(0.0).max(p.z - self.max.z);
        dx * dx + dy * dy + dz * dz
    }

    /// Test if the box is hit by the infinite line `origin + s * dir`.
    pub fn intersects_line(&self, origin: &Point3, dir: &Vec3) -> bool {
        let mut s_min = f64::NEG_INFINITY;
        let mut s_max = f64::INFINITY;
        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() < 1e-15 {
                if o < lo || o > hi {
                    return false;
                }
                continue;
            }
            let s0 = (lo - o) / d;
            let s1 = (hi - o) / d;
            s_min = s_min.max(s0.min(s1));
            s_max = s_max.min(s0.max(s1));
            if s_min > s_max {
                return false;
            }
        }
        true
    }
}

impl Default for BoundingBox3 {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_translation() {
        let t = Transform::translation(10.0, 20.0, 30.0);
        let result = t.apply_point(&Point3::new(1.0, 2.0, 3.0));
        assert_abs_diff_eq!(result, Point3::new(11.0, 22.0, 33.0), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_about_z_90() {
        let t = Transform::rotation_about_axis(&Dir3::new_normalize(Vec3::z()), PI / 2.0);
        let result = t.apply_point(&Point3::new(1.0, 0.0, 4.0));
        assert_abs_diff_eq!(result, Point3::new(0.0, 1.0, 4.0), epsilon = 1e-12);
    }

    #[test]
    fn test_rotation_about_tilted_axis_keeps_axis() {
        let axis = Dir3::new_normalize(Vec3::new(1.0, 1.0, 1.0));
        let t = Transform::rotation_about_axis(&axis, 2.0 * PI / 3.0);
        let on_axis = Point3::new(2.0, 2.0, 2.0);
        assert_abs_diff_eq!(t.apply_point(&on_axis), on_axis, epsilon = 1e-12);
        assert_abs_diff_eq!(t.apply_vec(&Vec3::x()), Vec3::y(), epsilon = 1e-12);
    }

    #[test]
    fn test_scale_about_keeps_center_fixed() {
        let center = Point3::new(5.0, 5.0, 2.0);
        let t = Transform::scale_about(&center, 0.5, 0.5, 1.0);
        assert_abs_diff_eq!(t.apply_point(&center), center, epsilon = 1e-12);
        let p = t.apply_point(&Point3::new(9.0, 1.0, 7.0));
        assert_abs_diff_eq!(p, Point3::new(7.0, 3.0, 7.0), epsilon = 1e-12);
    }

    #[test]
    fn test_tolerance_points_equal() {
        let tol = Tolerance::DEFAULT;
        let a = Point3::new(1.0, 2.0, 3.0);
        assert!(tol.points_equal(&a, &Point3::new(1.0 + 1e-7, 2.0, 3.0)));
        assert!(!tol.points_equal(&a, &Point3::new(1.001, 2.0, 3.0)));
    }

    #[test]
    fn test_bbox_union_and_distance() {
        let mut a = BoundingBox3::from_points(&[Point3::origin(), Point3::new(1.0, 1.0, 1.0)]);
        assert!(!a.is_empty());
        a.union(&BoundingBox3::from_points(&[Point3::new(3.0, 0.5, 0.5)]));
        assert_abs_diff_eq!(a.max.x, 3.0);
        assert_abs_diff_eq!(a.distance_squared(&Point3::new(0.5, 0.5, 0.5)), 0.0);
        assert_abs_diff_eq!(a.distance_squared(&Point3::new(5.0, 0.5, 0.5)), 4.0);
        assert!(BoundingBox3::empty().is_empty());
        a.expand(0.5);
        assert_abs_diff_eq!(a.min.y, -0.5);
    }

    #[test]
    fn test_bbox_line_hit() {
        let b = BoundingBox3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert!(b.intersects_line(&Point3::new(0.5, 0.5, 10.0), &Vec3::z()));
        assert!(!b.intersects_line(&Point3::new(2.0, 0.5, 10.0), &Vec3::z()));
    }
}
