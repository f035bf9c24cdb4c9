//! Right prisms: a planar polygon swept along a vector.

use spraypath_kernel_geom::{Curve, KernelError, Plane};
use spraypath_kernel_math::{Point2, Point3, Vec3};

use crate::planar;
use crate::polyline::Polyline;

/// A closed solid made by extruding a planar polygon and capping both ends.
#[derive(Debug, Clone)]
pub struct Prism {
    /// Base frame; its normal runs along the extrusion.
    frame: Plane,
    /// Base polygon in `frame` coordinates.
    polygon: Vec<Point2>,
    height: f64,
}

impl Prism {
    /// Extrude the closed polyline `base` along `direction`.
    ///
    /// The base is flattened onto the plane through its first vertex
    /// perpendicular to `direction`.
    pub fn extrude(base: &Polyline, direction: &Vec3) -> Result<Self, KernelError> {
        let height = direction.norm();
        if height <= f64::EPSILON {
            return Err(KernelError::InvalidInput("zero extrusion vector".into()));
        }
        let frame = Plane::from_normal(base.points()[0], *direction);
        let polygon: Vec<Point2> = base.points().iter().map(|p| frame.project(p)).collect();
        if planar::signed_area(&polygon).abs() <= f64::EPSILON {
            return Err(KernelError::Degenerate("extrusion profile has no area".into()));
        }
        Ok(Self {
            frame,
            polygon,
            height,
        })
    }

    /// Extrusion height.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Containment test. With `strict` the boundary (within `tol`) is
    /// outside, otherwise it is inside.
    pub fn contains(&self, p: &Point3, tol: f64, strict: bool) -> bool {
        let local = self.frame.to_local(p);
        let h = local.z;
        let uv = Point2::new(local.x, local.y);
        let on_cap = h.abs() <= tol || (h - self.height).abs() <= tol;
        if h < -tol || h > self.height + tol {
            return false;
        }
        if planar::distance_to_boundary(&uv, &self.polygon) <= tol {
            return !strict;
        }
        let inside = planar::point_in_polygon(&uv, &self.polygon);
        if on_cap && inside {
            return !strict;
        }
        inside
    }

    /// Sorted, de-duplicated parameters where `curve` crosses the prism's
    /// side walls or caps.
    pub fn intersections(&self, curve: &Polyline, tol: f64) -> Vec<f64> {
        let mut params = Vec::new();
        let n = self.polygon.len();
        for k in 0..curve.segment_count() {
            let (a, b) = curve.segment(k);
            let (la, lb) = (self.frame.to_local(&a), self.frame.to_local(&b));
            let (a2, b2) = (Point2::new(la.x, la.y), Point2::new(lb.x, lb.y));

            for e in 0..n {
                let (p, q) = (self.polygon[e], self.polygon[(e + 1) % n]);
                if let Some((s, _)) = planar::segment_intersection(&a2, &b2, &p, &q) {
                    let h = la.z + s * (lb.z - la.z);
                    if h >= -tol && h <= self.height + tol {
                        params.push(k as f64 + s);
                    }
                }
            }

            for cap in [0.0, self.height] {
                let (da, db) = (la.z - cap, lb.z - cap);
                if da * db < 0.0 {
                    let s = da / (da - db);
                    let at = a2 + (b2 - a2) * s;
                    if planar::point_in_polygon(&at, &self.polygon) {
                        params.push(k as f64 + s);
                    }
                }
            }
        }

        params.sort_by(f64::total_cmp);
        let mut merged: Vec<f64> = Vec::with_capacity(params.len());
        for t in params {
            let duplicate = merged
                .last()
                .is_some_and(|&m| (curve.point_at(t) - curve.point_at(m)).norm() <= tol);
            if !duplicate {
                merged.push(t);
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square_prism() -> Prism {
        let base = Polyline::closed(vec![
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(10.0, 0.0, -1.0),
            Point3::new(10.0, 10.0, -1.0),
            Point3::new(0.0, 10.0, -1.0),
        ])
        .unwrap();
        Prism::extrude(&base, &Vec3::new(0.0, 0.0, 3.0)).unwrap()
    }

    #[test]
    fn test_contains_strict_and_loose() {
        let prism = square_prism();
        assert!(prism.contains(&Point3::new(5.0, 5.0, 0.0), 1e-6, true));
        assert!(!prism.contains(&Point3::new(11.0, 5.0, 0.0), 1e-6, false));
        assert!(!prism.contains(&Point3::new(5.0, 5.0, 5.0), 1e-6, false));
        let edge = Point3::new(10.0, 5.0, 0.0);
        assert!(!prism.contains(&edge, 1e-6, true));
        assert!(prism.contains(&edge, 1e-6, false));
    }

    #[test]
    fn test_contains_is_winding_independent() {
        let base = Polyline::closed(vec![
            Point3::new(0.0, 10.0, 0.0),
            Point3::new(10.0, 10.0, 0.0),
            Point3::new(10.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
        ])
        .unwrap();
        let prism = Prism::extrude(&base, &Vec3::new(0.0, 0.0, 1.0)).unwrap();
        assert!(prism.contains(&Point3::new(3.0, 3.0, 0.5), 1e-6, true));
    }

    #[test]
    fn test_side_wall_crossings() {
        let prism = square_prism();
        let line = Polyline::open(vec![Point3::new(-2.0, 5.0, 0.0), Point3::new(12.0, 5.0, 0.0)])
            .unwrap();
        let params = prism.intersections(&line, 1e-6);
        assert_eq!(params.len(), 2);
        assert_abs_diff_eq!(line.point_at(params[0]).x, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(line.point_at(params[1]).x, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn test_crossing_at_vertex_is_reported_once() {
        let prism = square_prism();
        let line = Polyline::open(vec![
            Point3::new(-2.0, 5.0, 0.0),
            Point3::new(0.0, 5.0, 0.0),
            Point3::new(4.0, 5.0, 0.0),
        ])
        .unwrap();
        assert_eq!(prism.intersections(&line, 1e-6).len(), 1);
    }

    #[test]
    fn test_cap_crossing() {
        let prism = square_prism();
        let line = Polyline::open(vec![Point3::new(5.0, 5.0, 0.0), Point3::new(5.0, 5.0, 4.0)])
            .unwrap();
        let params = prism.intersections(&line, 1e-6);
        assert_eq!(params.len(), 1);
        assert_abs_diff_eq!(line.point_at(params[0]).z, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_zero_extrusion_rejected() {
        let base = Polyline::closed(vec![
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
        .unwrap();
        assert!(Prism::extrude(&base, &Vec3::zeros()).is_err());
    }
}
