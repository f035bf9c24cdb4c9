//! Geodesic field across the extended surface.

use spraypath_kernel_geom::{Curve, GeometryKernel, Plane, Surface};
use spraypath_kernel_math::{Point2, Tolerance, Vec3};
use tracing::debug;

use crate::extend::{box_outline, rotation_invariant_box, ExtendedSurface};
use crate::{primary, ExtensionSettings, Result, SprayPathError};

/// `count` shortest paths sweeping across the extended surface.
///
/// A rotation-invariant box around `surface` is projected onto the
/// extended surface along world Z. Its first and third edges are the
/// rails; station `i` on the first rail is joined to station
/// `count - 1 - i` on the third, which runs the opposite way.
pub fn geodesics<K: GeometryKernel>(
    kernel: &K,
    surface: &K::Surface,
    extended: &ExtendedSurface<K::Surface>,
    frame: &Plane,
    count: usize,
    settings: &ExtensionSettings,
    tol: &Tolerance,
) -> Result<Vec<K::Curve>> {
    if count < 2 {
        return Err(SprayPathError::InvalidSettings(
            "at least two geodesics are needed".into(),
        ));
    }
    let bounds = rotation_invariant_box(surface, frame, settings.outline_iterations);
    let edges = box_outline(kernel, &bounds)?.segments();
    if edges.len() != 4 {
        return Err(SprayPathError::Degenerate(format!(
            "geodesic outline has {} edges, expected 4",
            edges.len()
        )));
    }

    let ext = extended.surface();
    let mut stations: Vec<Vec<Point2>> = Vec::with_capacity(2);
    for edge in [&edges[0], &edges[2]] {
        let rail = primary(
            kernel.project_to_surface(edge, ext, &Vec3::z(), tol)?,
            "rail projection",
        )?;
        stations.push(
            rail.divide_by_count(count - 1, true)
                .into_iter()
                .map(|t| ext.closest_point(&rail.point_at(t)).uv)
                .collect(),
        );
    }

    let (a, b) = (&stations[0], &stations[1]);
    let n = a.len().min(b.len());
    let curves = (0..n)
        .map(|i| kernel.shortest_path(ext, a[i], b[n - 1 - i], tol))
        .collect::<std::result::Result<Vec<_>, _>>()?;
    debug!(geodesics = curves.len(), "geodesic field");
    Ok(curves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{flat_extension, flat_square, kernel};
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_flat_geodesics_cross_the_box() {
        let k = kernel();
        let curves = geodesics(
            &k,
            &flat_square(),
            &flat_extension(),
            &Plane::spray_frame(0.0),
            10,
            &ExtensionSettings::default(),
            &Tolerance::default(),
        )
        .unwrap();
        assert_eq!(curves.len(), 10);
        for (i, c) in curves.iter().enumerate() {
            let x = -5.0 + 20.0 * i as f64 / 9.0;
            assert_abs_diff_eq!(c.length(), 20.0, epsilon = 1e-6);
            assert_abs_diff_eq!(c.point_at_start().x, x, epsilon = 1e-6);
            assert_abs_diff_eq!(c.point_at_end().x, x, epsilon = 1e-6);
            assert_abs_diff_eq!(c.point_at_start().y, -5.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_single_geodesic_rejected() {
        let k = kernel();
        let result = geodesics(
            &k,
            &flat_square(),
            &flat_extension(),
            &Plane::spray_frame(0.0),
            1,
            &ExtensionSettings::default(),
            &Tolerance::default(),
        );
        assert!(matches!(result, Err(SprayPathError::InvalidSettings(_))));
    }
}
