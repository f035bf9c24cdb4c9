//! Splitting curves into the arcs inside and outside a closed boundary.
//!
//! The boundary is flattened onto a plane just below everything involved
//! and extruded upward into a capped prism, so containment does not depend
//! on the height of the curve being split.

use spraypath_kernel_geom::{Curve, GeometryKernel, Plane};
use spraypath_kernel_math::{Point3, Tolerance, Vec3};
use tracing::debug;

use crate::Result;

/// Arcs of a curve on either side of a boundary, each in curve order.
#[derive(Debug, Clone)]
pub struct TrimResult<C> {
    /// Arcs inside the boundary.
    pub inside: Vec<C>,
    /// Arcs outside the boundary.
    pub outside: Vec<C>,
}

/// Split `curve` at its crossings with the closed curve `bounds`.
///
/// Together the returned arcs cover the whole of `curve`.
///
/// The far reference point used to check the containment orientation is
/// placed off the box around both `curve` and `bounds`, not `curve` alone,
/// so it stays outside even when the boundary is much larger than the curve.
pub fn trim_curve_boundary<K: GeometryKernel>(
    kernel: &K,
    curve: &K::Curve,
    bounds: &K::Curve,
    tol: &Tolerance,
) -> Result<TrimResult<K::Curve>> {
    let mut bbox = curve.bounding_box();
    bbox.union(&bounds.bounding_box());
    let eps = tol.linear;

    let base = Plane::xy_at(Point3::new(0.0, 0.0, bbox.min.z - 2.0 * eps));
    let profile = kernel.project_to_plane(bounds, &base)?;
    let height = bbox.max.z - bbox.min.z + 4.0 * eps;
    let prism = kernel.extrude_and_cap(&profile, &Vec3::new(0.0, 0.0, height), tol)?;

    let (lo, hi) = curve.domain();
    let mut breaks = vec![lo];
    breaks.extend(
        kernel
            .curve_solid_intersections(curve, &prism, tol)
            .into_iter()
            .filter(|&t| t > lo && t < hi),
    );
    breaks.push(hi);

    let mut result = TrimResult {
        inside: Vec::new(),
        outside: Vec::new(),
    };
    for pair in breaks.windows(2) {
        let Some(piece) = curve.trim(pair[0], pair[1]) else {
            continue;
        };
        let mid = piece.point_at_normalized_length(0.5);
        if kernel.point_in_solid(&prism, &mid, tol, true) {
            result.inside.push(piece);
        } else {
            result.outside.push(piece);
        }
    }

    let offset = (10.0 * bbox.diagonal()).max(100.0);
    let reference = bbox.min - Vec3::new(offset, offset, offset);
    if kernel.point_in_solid(&prism, &reference, tol, true) {
        debug!("containment reports the far point inside, swapping sides");
        std::mem::swap(&mut result.inside, &mut result.outside);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::kernel;
    use approx::assert_abs_diff_eq;

    fn square(k: &spraypath_kernel_discrete::DiscreteKernel, z: f64) -> spraypath_kernel_discrete::Polyline {
        k.polyline(
            &[
                Point3::new(0.0, 0.0, z),
                Point3::new(10.0, 0.0, z),
                Point3::new(10.0, 10.0, z),
                Point3::new(0.0, 10.0, z),
            ],
            true,
        )
        .unwrap()
    }

    fn total(curves: &[spraypath_kernel_discrete::Polyline]) -> f64 {
        curves.iter().map(|c| c.length()).sum()
    }

    #[test]
    fn test_line_through_square() {
        let k = kernel();
        let line = k.line(&Point3::new(-5.0, 4.0, 0.0), &Point3::new(15.0, 4.0, 0.0)).unwrap();
        let r = trim_curve_boundary(&k, &line, &square(&k, 0.0), &Tolerance::default()).unwrap();
        assert_eq!(r.inside.len(), 1);
        assert_eq!(r.outside.len(), 2);
        assert_abs_diff_eq!(total(&r.inside), 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(total(&r.inside) + total(&r.outside), line.length(), epsilon = 1e-9);
        assert_abs_diff_eq!(r.outside[0].point_at_end(), Point3::new(0.0, 4.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_boundary_height_is_ignored() {
        let k = kernel();
        let line = k.line(&Point3::new(-5.0, 4.0, 3.0), &Point3::new(15.0, 4.0, 7.0)).unwrap();
        let r = trim_curve_boundary(&k, &line, &square(&k, -2.0), &Tolerance::default()).unwrap();
        assert_eq!(r.inside.len(), 1);
        assert_abs_diff_eq!(total(&r.inside) + total(&r.outside), line.length(), epsilon = 1e-9);
    }

    #[test]
    fn test_winding_does_not_matter() {
        let k = kernel();
        let line = k.line(&Point3::new(5.0, -5.0, 0.0), &Point3::new(5.0, 15.0, 0.0)).unwrap();
        let cw = square(&k, 0.0).reversed();
        let r = trim_curve_boundary(&k, &line, &cw, &Tolerance::default()).unwrap();
        assert_eq!(r.inside.len(), 1);
        assert_abs_diff_eq!(total(&r.inside), 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zigzag_partition_is_complete() {
        let k = kernel();
        let zigzag = k
            .polyline(
                &[
                    Point3::new(-2.0, 1.0, 0.0),
                    Point3::new(12.0, 3.0, 0.0),
                    Point3::new(-2.0, 5.0, 0.0),
                    Point3::new(12.0, 7.0, 0.0),
                    Point3::new(5.0, 12.0, 0.0),
                ],
                false,
            )
            .unwrap();
        let r = trim_curve_boundary(&k, &zigzag, &square(&k, 0.0), &Tolerance::default()).unwrap();
        assert_eq!(r.inside.len(), 4);
        assert_eq!(r.outside.len(), 5);
        assert_abs_diff_eq!(total(&r.inside) + total(&r.outside), zigzag.length(), epsilon = 1e-9);
    }

    #[test]
    fn test_curve_entirely_outside() {
        let k = kernel();
        let line = k.line(&Point3::new(-5.0, -1.0, 0.0), &Point3::new(15.0, -1.0, 0.0)).unwrap();
        let r = trim_curve_boundary(&k, &line, &square(&k, 0.0), &Tolerance::default()).unwrap();
        assert!(r.inside.is_empty());
        assert_eq!(r.outside.len(), 1);
    }
}
