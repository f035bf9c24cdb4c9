//! Shortest paths on grid surfaces by curve-shortening relaxation.

use spraypath_kernel_geom::{KernelError, Surface};
use spraypath_kernel_math::{Point2, Point3};

use crate::polyline::Polyline;
use crate::surface::GridSurface;

/// Approximate the shortest path between two parameter points.
///
/// Starts from the straight chord in parameter space, then repeatedly
/// moves every interior node to the surface point nearest the midpoint of
/// its neighbours. Stops when no node moves more than `tol` or after
/// `max_iterations` sweeps.
pub fn shortest_path(
    surface: &GridSurface,
    uv0: Point2,
    uv1: Point2,
    segments: usize,
    max_iterations: usize,
    tol: f64,
) -> Result<Polyline, KernelError> {
    if (uv1 - uv0).norm() <= f64::EPSILON {
        return Err(KernelError::Degenerate("shortest path between one point".into()));
    }
    let segments = segments.max(1);
    let mut pts: Vec<Point3> = (0..=segments)
        .map(|k| surface.evaluate(uv0 + (uv1 - uv0) * (k as f64 / segments as f64)))
        .collect();

    for _ in 0..max_iterations {
        let mut largest_move: f64 = 0.0;
        for k in 1..segments {
            let mid = Point3::from((pts[k - 1].coords + pts[k + 1].coords) * 0.5);
            let target = surface.closest_point(&mid).point;
            largest_move = largest_move.max((target - pts[k]).norm());
            pts[k] = target;
        }
        if largest_move <= tol {
            break;
        }
    }
    Polyline::open(pts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use spraypath_kernel_geom::Curve;
    use spraypath_kernel_math::Vec3;

    #[test]
    fn test_flat_shortest_path_is_straight() {
        let s = GridSurface::planar(Point3::origin(), Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 10.0, 0.0))
            .unwrap();
        let path = shortest_path(&s, Point2::new(0.0, 0.0), Point2::new(6.0, 8.0), 16, 50, 1e-9).unwrap();
        assert_abs_diff_eq!(path.length(), 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(path.point_at_end(), Point3::new(6.0, 8.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_relaxation_shortens_curved_paths() {
        // A ridge along v: the parameter chord climbs over it.
        let s = GridSurface::from_fn(21, 21, (0.0, 10.0), (0.0, 10.0), |u, v| {
            let x = u - 5.0;
            Point3::new(u, v, 3.0 * (-x * x).exp() * (v / 10.0))
        })
        .unwrap();
        let chord = shortest_path(&s, Point2::new(0.0, 10.0), Point2::new(10.0, 0.0), 40, 0, 1e-9).unwrap();
        let relaxed = shortest_path(&s, Point2::new(0.0, 10.0), Point2::new(10.0, 0.0), 40, 200, 1e-9).unwrap();
        assert!(relaxed.length() < chord.length());
        assert_abs_diff_eq!(relaxed.point_at_start(), chord.point_at_start());
    }

    #[test]
    fn test_same_point_is_degenerate() {
        let s = GridSurface::planar(Point3::origin(), Vec3::x(), Vec3::y()).unwrap();
        assert!(shortest_path(&s, Point2::new(0.5, 0.5), Point2::new(0.5, 0.5), 8, 10, 1e-9).is_err());
    }
}
