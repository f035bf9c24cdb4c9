//! Oriented planes and boxes aligned to them.

use spraypath_kernel_math::{BoundingBox3, Dir3, Point2, Point3, Transform, Vec3};

/// An oriented plane: origin plus an orthonormal frame.
///
/// Local coordinates `(x, y, z)` of a point are its components along
/// `x_dir`, `y_dir` and `normal_dir` relative to `origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    /// Origin point on the plane.
    pub origin: Point3,
    /// Unit vector along the local x axis.
    pub x_dir: Dir3,
    /// Unit vector along the local y axis.
    pub y_dir: Dir3,
    /// Unit normal (x_dir × y_dir).
    pub normal_dir: Dir3,
}

impl Plane {
    /// Create a plane from origin and two orthogonal direction vectors.
    /// The vectors do not need to be normalized.
    pub fn new(origin: Point3, x_dir: Vec3, y_dir: Vec3) -> Self {
        let x = Dir3::new_normalize(x_dir);
        let y = Dir3::new_normalize(y_dir);
        let n = Dir3::new_normalize(x_dir.cross(&y_dir));
        Self {
            origin,
            x_dir: x,
            y_dir: y,
            normal_dir: n,
        }
    }

    /// Create a plane from origin and normal. X/Y directions are chosen arbitrarily.
    pub fn from_normal(origin: Point3, normal: Vec3) -> Self {
        let n = Dir3::new_normalize(normal);
        let arbitrary = if n.as_ref().x.abs() < 0.9 {
            Vec3::x()
        } else {
            Vec3::y()
        };
        let x = Dir3::new_normalize(arbitrary.cross(n.as_ref()));
        let y = Dir3::new_normalize(n.as_ref().cross(x.as_ref()));
        Self {
            origin,
            x_dir: x,
            y_dir: y,
            normal_dir: n,
        }
    }

    /// World XY plane.
    pub fn xy() -> Self {
        Self::new(Point3::origin(), Vec3::x(), Vec3::y())
    }

    /// World XY plane moved to `origin`.
    pub fn xy_at(origin: Point3) -> Self {
        Self::new(origin, Vec3::x(), Vec3::y())
    }

    /// World YZ plane (normal along +X).
    pub fn yz() -> Self {
        Self::new(Point3::origin(), Vec3::y(), Vec3::z())
    }

    /// The frame a spray pass at `angle` radians is oriented by: the world
    /// YZ plane turned about world Z.
    pub fn spray_frame(angle: f64) -> Self {
        Self::yz().rotated(angle, &Dir3::new_normalize(Vec3::z()))
    }

    /// A copy rotated by `angle` radians about `axis` through the origin point.
    pub fn rotated(&self, angle: f64, axis: &Dir3) -> Self {
        let r = Transform::rotation_about_axis(axis, angle);
        Self::new(
            self.origin,
            r.apply_vec(self.x_dir.as_ref()),
            r.apply_vec(self.y_dir.as_ref()),
        )
    }

    /// Local `(x, y, z)` coordinates of a world point.
    pub fn to_local(&self, p: &Point3) -> Point3 {
        let d = p - self.origin;
        Point3::new(
            d.dot(self.x_dir.as_ref()),
            d.dot(self.y_dir.as_ref()),
            d.dot(self.normal_dir.as_ref()),
        )
    }

    /// World point from local `(x, y, z)` coordinates.
    pub fn to_world(&self, local: &Point3) -> Point3 {
        self.origin
            + local.x * self.x_dir.as_ref()
            + local.y * self.y_dir.as_ref()
            + local.z * self.normal_dir.as_ref()
    }

    /// Project a 3D point onto this plane's `(x, y)` coordinates.
    pub fn project(&self, p: &Point3) -> Point2 {
        let d = p - self.origin;
        Point2::new(d.dot(self.x_dir.as_ref()), d.dot(self.y_dir.as_ref()))
    }

    /// Closest point on the plane.
    pub fn closest_point(&self, p: &Point3) -> Point3 {
        p - self.signed_distance(p) * self.normal_dir.as_ref()
    }

    /// Signed distance from a point to this plane.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(self.normal_dir.as_ref())
    }
}

/// A box aligned to a [`Plane`], stored as an interval box in local coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameBox {
    /// Frame the box is aligned to.
    pub plane: Plane,
    /// Extents in `plane` coordinates.
    pub local: BoundingBox3,
}

impl FrameBox {
    /// Create a box from a plane and local extents.
    pub fn new(plane: Plane, local: BoundingBox3) -> Self {
        Self { plane, local }
    }

    /// Smallest `plane`-aligned box containing all `points`.
    pub fn enclosing<'a>(plane: &Plane, points: impl IntoIterator<Item = &'a Point3>) -> Self {
        let mut local = BoundingBox3::empty();
        for p in points {
            local.include_point(&plane.to_local(p));
        }
        Self::new(plane.clone(), local)
    }

    /// Re-box this box's corners in another frame.
    pub fn rebox(&self, plane: &Plane) -> Self {
        Self::enclosing(plane, self.corners().iter())
    }

    /// The eight corners in world space.
    ///
    /// Corners 0-3 run counter-clockwise around the bottom face (minimum
    /// local z) starting at the minimum corner; 4-7 are the same corners
    /// on the top face.
    pub fn corners(&self) -> [Point3; 8] {
        let (a, b) = (self.local.min, self.local.max);
        let local = [
            Point3::new(a.x, a.y, a.z),
            Point3::new(b.x, a.y, a.z),
            Point3::new(b.x, b.y, a.z),
            Point3::new(a.x, b.y, a.z),
            Point3::new(a.x, a.y, b.z),
            Point3::new(b.x, a.y, b.z),
            Point3::new(b.x, b.y, b.z),
            Point3::new(a.x, b.y, b.z),
        ];
        local.map(|p| self.plane.to_world(&p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_plane_round_trip() {
        let plane = Plane::spray_frame(0.4);
        let p = Point3::new(3.0, -1.0, 2.5);
        assert_abs_diff_eq!(plane.to_world(&plane.to_local(&p)), p, epsilon = 1e-12);
    }

    #[test]
    fn test_spray_frame_zero_is_world_yz() {
        let plane = Plane::spray_frame(0.0);
        assert_abs_diff_eq!(plane.x_dir.into_inner(), Vec3::y(), epsilon = 1e-12);
        assert_abs_diff_eq!(plane.y_dir.into_inner(), Vec3::z(), epsilon = 1e-12);
        assert_abs_diff_eq!(plane.normal_dir.into_inner(), Vec3::x(), epsilon = 1e-12);
    }

    #[test]
    fn test_rotated_keeps_vertical_axis() {
        let plane = Plane::yz().rotated(FRAC_PI_4, &Dir3::new_normalize(Vec3::z()));
        assert_abs_diff_eq!(plane.y_dir.into_inner(), Vec3::z(), epsilon = 1e-12);
        let s = FRAC_PI_4.sin();
        assert_abs_diff_eq!(plane.x_dir.into_inner(), Vec3::new(-s, s, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_rebox_square_at_45_degrees() {
        let square = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 10.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
        ];
        let frame = Plane::xy();
        let rotated = frame.rotated(FRAC_PI_4, &Dir3::new_normalize(Vec3::z()));
        let b = FrameBox::enclosing(&frame, square.iter()).rebox(&rotated).rebox(&frame);
        assert_abs_diff_eq!(b.local.min.x, -5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.local.max.x, 15.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b.local.max.y - b.local.min.y, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_corner_order() {
        let b = FrameBox::new(
            Plane::xy(),
            BoundingBox3::new(Point3::origin(), Point3::new(1.0, 2.0, 3.0)),
        );
        let c = b.corners();
        assert_abs_diff_eq!(c[1], Point3::new(1.0, 0.0, 0.0));
        assert_abs_diff_eq!(c[3], Point3::new(0.0, 2.0, 0.0));
        assert_abs_diff_eq!(c[5], Point3::new(1.0, 0.0, 3.0));
    }
}
