//! Spray passes resampled from the geodesic field.

use spraypath_kernel_geom::{Curve, GeometryKernel};
use spraypath_kernel_math::{Point3, Tolerance};
use tracing::debug;

use crate::{Result, SprayPathError};

/// Passes spaced `dist` apart along the geodesics.
///
/// Every geodesic is divided every `dist` of arc length, leaving out the
/// start and any trailing remainder. Pass `k` joins the `k`-th station of
/// each geodesic in order; only as many passes as the shortest station
/// list allows are built.
pub fn isolines<K: GeometryKernel>(
    kernel: &K,
    geodesics: &[K::Curve],
    dist: f64,
    _tol: &Tolerance,
) -> Result<Vec<K::Curve>> {
    if geodesics.is_empty() {
        return Err(SprayPathError::EmptyInput("geodesics"));
    }
    if dist <= 0.0 {
        return Err(SprayPathError::InvalidSettings("pass spacing must be positive".into()));
    }

    let stations: Vec<Vec<Point3>> = geodesics
        .iter()
        .map(|g| {
            g.divide_by_length(dist, false)
                .into_iter()
                .map(|t| g.point_at(t))
                .collect()
        })
        .collect();
    let count = stations.iter().map(Vec::len).min().unwrap_or(0);

    let mut passes = Vec::with_capacity(count);
    for k in 0..count {
        let points: Vec<Point3> = stations.iter().map(|s| s[k]).collect();
        passes.push(kernel.polyline(&points, false)?);
    }
    debug!(passes = passes.len(), "isolines");
    Ok(passes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::kernel;
    use approx::assert_abs_diff_eq;

    fn vertical_lines(k: &spraypath_kernel_discrete::DiscreteKernel, lengths: &[f64]) -> Vec<spraypath_kernel_discrete::Polyline> {
        lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| {
                let x = i as f64 * 2.0;
                k.line(&Point3::new(x, 0.0, 0.0), &Point3::new(x, len, 0.0)).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_passes_are_spaced_by_dist() {
        let k = kernel();
        let geos = vertical_lines(&k, &[10.0, 10.0, 10.0]);
        let passes = isolines(&k, &geos, 1.0, &Tolerance::default()).unwrap();
        assert_eq!(passes.len(), 10);
        for (i, pass) in passes.iter().enumerate() {
            assert_abs_diff_eq!(pass.point_at_start().y, (i + 1) as f64, epsilon = 1e-9);
            assert_abs_diff_eq!(pass.length(), 4.0, epsilon = 1e-9);
        }
        let gap = passes[1].point_at_start() - passes[0].point_at_start();
        assert_abs_diff_eq!(gap.norm(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_shortest_geodesic_limits_pass_count() {
        let k = kernel();
        let geos = vertical_lines(&k, &[10.0, 6.5, 10.0]);
        let passes = isolines(&k, &geos, 1.0, &Tolerance::default()).unwrap();
        assert_eq!(passes.len(), 6);
    }

    #[test]
    fn test_empty_geodesics_rejected() {
        let k = kernel();
        assert!(matches!(
            isolines(&k, &[], 1.0, &Tolerance::default()),
            Err(SprayPathError::EmptyInput(_))
        ));
    }
}
