//! Splitting a finished path into on-surface and off-surface runs.

use spraypath_kernel_geom::{Curve, GeometryKernel, Plane};
use spraypath_kernel_math::{Point3, Tolerance, Transform};
use tracing::{debug, warn};

use crate::extend::ExtendedSurface;
use crate::offset::offset_bounds;
use crate::trim::trim_curve_boundary;
use crate::{Result, SprayPathError};

/// Shrink applied to the classification boundary about its centroid, so
/// runs grazing the edge count as off-surface.
const BOUNDARY_SHRINK: f64 = 0.999;

/// A run of the path and whether it sprays the surface.
#[derive(Debug, Clone)]
pub struct PathSegment<C> {
    /// The run.
    pub curve: C,
    /// `true` when the run lies over the surface.
    pub on_surface: bool,
}

/// Split `path` into runs over and off `surface`, in path order.
///
/// The surface boundary is pulled in by half of `spray_width` before
/// testing.
pub fn classify_path<K: GeometryKernel>(
    kernel: &K,
    path: &K::Curve,
    surface: &K::Surface,
    extended: &ExtendedSurface<K::Surface>,
    spray_width: f64,
    tol: &Tolerance,
) -> Result<Vec<PathSegment<K::Curve>>> {
    let bounds = offset_bounds(kernel, surface, extended, -spray_width / 2.0, tol)?;
    let flat = kernel.project_to_plane(&bounds, &Plane::xy())?;
    let centroid = kernel.area_centroid(&flat).ok_or_else(|| {
        SprayPathError::Degenerate("classification boundary encloses no area".into())
    })?;
    let shrink = Transform::scale_about(&centroid, BOUNDARY_SHRINK, BOUNDARY_SHRINK, 1.0);
    let bounds = bounds.transformed(&shrink);

    let split = trim_curve_boundary(kernel, path, &bounds, tol)?;
    Ok(interleave(path.point_at_start(), split.inside, split.outside))
}

/// Merge ordered inside and outside runs back into path order.
///
/// The list whose first run touches `start` more closely leads; the two
/// then alternate, and whatever is left of the longer list goes last.
pub fn interleave<C: Curve>(start: Point3, inside: Vec<C>, outside: Vec<C>) -> Vec<PathSegment<C>> {
    let gap = |c: &C| {
        (c.point_at_start() - start)
            .norm_squared()
            .min((c.point_at_end() - start).norm_squared())
    };
    let inside_first = match (inside.first(), outside.first()) {
        (Some(i), Some(o)) => gap(i) < gap(o),
        (Some(_), None) => true,
        _ => false,
    };

    let (n_in, n_out) = (inside.len(), outside.len());
    if n_in.abs_diff(n_out) > 1 {
        warn!(inside = n_in, outside = n_out, "unbalanced path split");
    } else {
        debug!(inside = n_in, outside = n_out, "path split");
    }

    let tag = |on_surface: bool| move |curve: C| PathSegment { curve, on_surface };
    let (mut lead, mut follow) = if inside_first {
        (inside.into_iter().map(tag(true)), outside.into_iter().map(tag(false)))
    } else {
        (outside.into_iter().map(tag(false)), inside.into_iter().map(tag(true)))
    };

    let mut segments = Vec::with_capacity(n_in + n_out);
    loop {
        match (lead.next(), follow.next()) {
            (Some(a), Some(b)) => {
                segments.push(a);
                segments.push(b);
            }
            (Some(a), None) => {
                segments.push(a);
                segments.extend(lead.by_ref());
                break;
            }
            (None, Some(b)) => {
                segments.push(b);
                segments.extend(follow.by_ref());
                break;
            }
            (None, None) => break,
        }
    }
    segments
}
