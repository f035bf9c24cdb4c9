//! Surface perimeter and its offsets.

use spraypath_kernel_geom::{Curve, GeometryKernel};
use spraypath_kernel_math::{Point3, Tolerance};
use tracing::debug;

use crate::extend::ExtendedSurface;
use crate::{primary, Result};

/// The trimmed surface's boundary joined into one closed curve.
pub fn perimeter<K: GeometryKernel>(
    kernel: &K,
    surface: &K::Surface,
    tol: &Tolerance,
) -> Result<K::Curve> {
    let edges = kernel.boundary_wireframe(surface);
    primary(kernel.join_curves(&edges, tol), "perimeter join")
}

/// The perimeter offset by `dist` within the extended surface.
///
/// Positive distances grow the perimeter, negative ones shrink it. The
/// kernel's offset direction depends on curve winding and surface normal,
/// so a result whose length moved the wrong way is recomputed with the
/// sign flipped. A zero distance returns the perimeter itself.
pub fn offset_bounds<K: GeometryKernel>(
    kernel: &K,
    surface: &K::Surface,
    extended: &ExtendedSurface<K::Surface>,
    dist: f64,
    tol: &Tolerance,
) -> Result<K::Curve> {
    let perim = perimeter(kernel, surface, tol)?;
    if dist == 0.0 {
        return Ok(perim);
    }
    let perim_length = perim.length();

    let bounds = primary(
        kernel.offset_on_surface(&perim, extended.surface(), dist, tol)?,
        "surface offset",
    )?;
    let length = bounds.length();
    if (dist > 0.0 && length < perim_length) || (dist < 0.0 && length > perim_length) {
        debug!(dist, perim_length, length, "offset went the wrong way, flipping");
        return primary(
            kernel.offset_on_surface(&perim, extended.surface(), -dist, tol)?,
            "surface offset",
        );
    }
    Ok(bounds)
}

/// A single pass around the surface edge, offset by `dist` like
/// [`offset_bounds`], starting at the point of the edge nearest `start`.
pub fn spray_edge_path<K: GeometryKernel>(
    kernel: &K,
    surface: &K::Surface,
    extended: &ExtendedSurface<K::Surface>,
    start: &Point3,
    dist: f64,
    tol: &Tolerance,
) -> Result<K::Curve> {
    let edge = offset_bounds(kernel, surface, extended, dist, tol)?;
    let t = edge.closest_param(start);
    let (lo, hi) = edge.domain();
    let pieces: Vec<K::Curve> = [edge.trim(t, hi), edge.trim(lo, t)]
        .into_iter()
        .flatten()
        .collect();
    if pieces.len() < 2 {
        // Nearest point is already the seam.
        return Ok(edge);
    }
    debug!(t, "moving edge path seam");
    primary(kernel.join_curves(&pieces, tol), "seam join")
}
