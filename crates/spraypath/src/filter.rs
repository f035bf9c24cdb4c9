//! Dropping passes far from the surface and snapping the rest onto it.

use rayon::prelude::*;
use spraypath_kernel_geom::{Curve, GeometryKernel, Surface};
use spraypath_kernel_math::Tolerance;
use tracing::debug;

use crate::extend::ExtendedSurface;
use crate::Result;

/// Smallest distance from `samples + 1` evenly spaced points of `curve`
/// to `surface`.
pub fn min_distance<C: Curve, S: Surface>(curve: &C, surface: &S, samples: usize) -> f64 {
    curve
        .divide_by_count(samples.max(1), true)
        .into_iter()
        .map(|t| {
            let p = curve.point_at(t);
            (surface.closest_point(&p).point - p).norm()
        })
        .fold(f64::INFINITY, f64::min)
}

/// Keep the curves that come closer than `threshold` to `surface`.
///
/// Order is preserved.
pub fn filter_by_distance<C: Curve, S: Surface>(
    curves: Vec<C>,
    surface: &S,
    threshold: f64,
    samples: usize,
) -> Vec<C> {
    let before = curves.len();
    let kept: Vec<C> = curves
        .into_par_iter()
        .filter(|c| min_distance(c, surface, samples) < threshold)
        .collect();
    debug!(before, kept = kept.len(), threshold, "distance filter");
    kept
}

/// Map each curve into the extended surface's parameter space and back.
pub fn conform_to_surface<K: GeometryKernel>(
    kernel: &K,
    curves: &[K::Curve],
    extended: &ExtendedSurface<K::Surface>,
    tol: &Tolerance,
) -> Result<Vec<K::Curve>> {
    curves
        .iter()
        .map(|c| {
            let uv = kernel.pull_back(c, extended.surface(), tol)?;
            Ok(kernel.push_up(&uv, extended.surface(), tol)?)
        })
        .collect()
}
