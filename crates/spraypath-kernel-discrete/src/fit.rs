//! Patch fitting: a height field over the outline's best-fit plane.

use nalgebra::Matrix3;
use rayon::prelude::*;
use spraypath_kernel_geom::{Curve, KernelError, PatchOptions, Plane};
use spraypath_kernel_math::{Point2, Point3, Vec3};

use crate::polyline::Polyline;
use crate::surface::GridSurface;

/// Inverse-distance power; higher keeps nodes closer to local samples.
const IDW_POWER: f64 = 3.0;

/// A sample of the height field in fit-plane coordinates.
#[derive(Debug, Clone, Copy)]
struct Sample {
    at: Point2,
    height: f64,
    weight: f64,
}

/// Fit a grid surface through `points`, bounded by the closed `outline`.
///
/// The outline's best-fit plane becomes the parameter plane, oriented
/// with its normal towards +Z and its x axis along the outline's first
/// edge. Node heights are weighted inverse-distance averages of the
/// interior points (weight `surface_pull`) and the outline (weight 1).
/// `tangency` and `flexibility` have no effect on this kernel.
pub fn fit_patch(
    points: &[Point3],
    outline: &Polyline,
    options: &PatchOptions,
) -> Result<GridSurface, KernelError> {
    if !outline.is_closed() {
        return Err(KernelError::InvalidInput("patch outline must be closed".into()));
    }
    if options.u_spans == 0 || options.v_spans == 0 {
        return Err(KernelError::InvalidInput("patch needs at least one span".into()));
    }
    let ring = if options.point_spacing > 0.0 {
        outline.densified(options.point_spacing)
    } else {
        outline.clone()
    };
    let plane = fit_plane(ring.points(), outline.points())?;

    let ring_local: Vec<Point3> = ring.points().iter().map(|p| plane.to_local(p)).collect();
    let ring_uv: Vec<Point2> = ring_local.iter().map(|p| Point2::new(p.x, p.y)).collect();
    let mut u_range = (f64::INFINITY, f64::NEG_INFINITY);
    let mut v_range = (f64::INFINITY, f64::NEG_INFINITY);
    for p in &ring_uv {
        u_range = (u_range.0.min(p.x), u_range.1.max(p.x));
        v_range = (v_range.0.min(p.y), v_range.1.max(p.y));
    }

    let mut samples: Vec<Sample> = ring_local
        .iter()
        .map(|p| Sample {
            at: Point2::new(p.x, p.y),
            height: p.z,
            weight: 1.0,
        })
        .collect();
    samples.extend(points.iter().map(|p| {
        let l = plane.to_local(p);
        Sample {
            at: Point2::new(l.x, l.y),
            height: l.z,
            weight: options.surface_pull.max(f64::EPSILON),
        }
    }));

    let (nu, nv) = (options.u_spans + 1, options.v_spans + 1);
    let du = (u_range.1 - u_range.0) / options.u_spans as f64;
    let dv = (v_range.1 - v_range.0) / options.v_spans as f64;
    let eps2 = (1e-9 * (du + dv)).powi(2);

    let nodes: Vec<Point3> = (0..nu * nv)
        .into_par_iter()
        .map(|k| {
            let (i, j) = (k % nu, k / nu);
            let at = Point2::new(u_range.0 + i as f64 * du, v_range.0 + j as f64 * dv);
            let pinned = (j == 0 && options.fixed_edges[0])
                || (i == nu - 1 && options.fixed_edges[1])
                || (j == nv - 1 && options.fixed_edges[2])
                || (i == 0 && options.fixed_edges[3]);
            let height = if pinned {
                ring_height(&at, &ring_local)
            } else {
                weighted_height(&at, &samples, eps2)
            };
            plane.to_world(&Point3::new(at.x, at.y, height))
        })
        .collect();

    let surface = GridSurface::new(nu, nv, nodes, u_range, v_range)?;
    if options.trim {
        surface.with_trim(ring_uv)
    } else {
        Ok(surface)
    }
}

/// Least-squares plane through `ring`; x axis follows the first edge of
/// `corners`.
fn fit_plane(ring: &[Point3], corners: &[Point3]) -> Result<Plane, KernelError> {
    let n = ring.len() as f64;
    let centroid = Point3::from(ring.iter().map(|p| p.coords).sum::<Vec3>() / n);
    let mut cov = Matrix3::zeros();
    for p in ring {
        let d = p - centroid;
        cov += d * d.transpose();
    }
    let eigen = cov.symmetric_eigen();
    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
    let (middle, largest) = (eigen.eigenvalues[order[1]], eigen.eigenvalues[order[2]]);
    if largest <= 0.0 || middle <= 1e-12 * largest {
        return Err(KernelError::Degenerate("patch outline encloses no area".into()));
    }

    let mut normal: Vec3 = eigen.eigenvectors.column(order[0]).into_owned();
    if normal.z < 0.0 {
        normal = -normal;
    }
    let first_edge = corners[1] - corners[0];
    let in_plane = first_edge - normal * normal.dot(&first_edge);
    if in_plane.norm() <= 1e-12 * first_edge.norm().max(1.0) {
        return Ok(Plane::from_normal(centroid, normal));
    }
    Ok(Plane::new(centroid, in_plane, normal.cross(&in_plane)))
}

fn weighted_height(at: &Point2, samples: &[Sample], eps2: f64) -> f64 {
    let mut num = 0.0;
    let mut den = 0.0;
    for s in samples {
        let d2 = (s.at - at).norm_squared() + eps2;
        let w = s.weight / d2.powf(IDW_POWER / 2.0);
        num += w * s.height;
        den += w;
    }
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Height of the outline point nearest to `at` in the plane.
fn ring_height(at: &Point2, ring: &[Point3]) -> f64 {
    let n = ring.len();
    let mut best = (f64::INFINITY, 0.0);
    for k in 0..n {
        let (a, b) = (ring[k], ring[(k + 1) % n]);
        let (a2, b2) = (Point2::new(a.x, a.y), Point2::new(b.x, b.y));
        let ab = b2 - a2;
        let len2 = ab.norm_squared();
        let f = if len2 > 0.0 {
            ((at - a2).dot(&ab) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let d = (a2 + ab * f - at).norm_squared();
        if d < best.0 {
            best = (d, a.z + f * (b.z - a.z));
        }
    }
    best.1
}
