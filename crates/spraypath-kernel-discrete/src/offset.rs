//! Offsetting polylines within a surface.

use spraypath_kernel_geom::{Curve, KernelError, Surface};
use spraypath_kernel_math::{Point3, Vec3};

use crate::polyline::Polyline;
use crate::surface::GridSurface;

/// Maximum miter length as a multiple of the offset distance.
const MITER_LIMIT: f64 = 10.0;

/// Offset every vertex along the in-surface bisector `normal × tangent`
/// and pull the result back onto the surface.
///
/// For a counter-clockwise loop seen from the normal side a positive
/// `distance` moves inwards. No self-intersection repair is attempted.
pub fn offset_on_surface(
    curve: &Polyline,
    surface: &GridSurface,
    distance: f64,
) -> Result<Polyline, KernelError> {
    let pts = curve.points();
    let n = pts.len();
    let closed = curve.is_closed();

    let moved: Vec<Point3> = (0..n)
        .map(|i| {
            let p = pts[i];
            let normal = surface.normal(surface.closest_point(&p).uv).into_inner();
            let prev = (closed || i > 0).then(|| pts[(i + n - 1) % n]);
            let next = (closed || i + 1 < n).then(|| pts[(i + 1) % n]);
            let side = |a: &Point3, b: &Point3| -> Option<Vec3> {
                normal.cross(&(b - a)).try_normalize(1e-15)
            };
            let m_prev = prev.and_then(|q| side(&q, &p));
            let m_next = next.and_then(|q| side(&p, &q));
            let shift = match (m_prev, m_next) {
                (Some(a), Some(b)) => match (a + b).try_normalize(1e-9) {
                    Some(bisector) => {
                        let cos = bisector.dot(&a).max(1.0 / MITER_LIMIT);
                        bisector * (distance / cos)
                    }
                    None => a * distance,
                },
                (Some(a), None) | (None, Some(a)) => a * distance,
                (None, None) => Vec3::zeros(),
            };
            surface.closest_point(&(p + shift)).point
        })
        .collect();

    Polyline::new(moved, closed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn plane() -> GridSurface {
        GridSurface::planar(
            Point3::new(-10.0, -10.0, 0.0),
            Vec3::new(30.0, 0.0, 0.0),
            Vec3::new(0.0, 30.0, 0.0),
        )
        .unwrap()
    }

    fn ccw_square() -> Polyline {
        Polyline::closed(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(10.0, 10.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_positive_offset_moves_ccw_loop_inwards() {
        let inner = offset_on_surface(&ccw_square(), &plane(), 0.5).unwrap();
        assert_abs_diff_eq!(inner.length(), 36.0, epsilon = 1e-9);
        assert_abs_diff_eq!(inner.points()[0], Point3::new(0.5, 0.5, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_reversed_loop_flips_direction() {
        let outer = offset_on_surface(&ccw_square().reversed(), &plane(), 0.5).unwrap();
        assert_abs_diff_eq!(outer.length(), 44.0, epsilon = 1e-9);
    }

    #[test]
    fn test_open_curve_ends_shift_sideways() {
        let line = Polyline::open(vec![Point3::new(0.0, 0.0, 0.0), Point3::new(5.0, 0.0, 0.0)]).unwrap();
        let moved = offset_on_surface(&line, &plane(), 1.0).unwrap();
        assert_abs_diff_eq!(moved.point_at_start(), Point3::new(0.0, 1.0, 0.0), epsilon = 1e-9);
        assert_abs_diff_eq!(moved.point_at_end(), Point3::new(5.0, 1.0, 0.0), epsilon = 1e-9);
    }
}
