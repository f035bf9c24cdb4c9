//! Stitching passes into one path along a closed boundary.

use spraypath_kernel_geom::{Curve, GeometryKernel};
use spraypath_kernel_math::{Point3, Tolerance};
use tracing::debug;

use crate::{primary, Result, SprayPathError};

/// One entry of a path to connect.
#[derive(Debug, Clone)]
pub enum PathGeometry<C> {
    /// A curve, traversed start to end.
    Curve(C),
    /// A single point to pass through.
    Point(Point3),
}

impl<C: Curve> PathGeometry<C> {
    /// Where the entry is entered.
    pub fn start(&self) -> Point3 {
        match self {
            Self::Curve(c) => c.point_at_start(),
            Self::Point(p) => *p,
        }
    }

    /// Where the entry is left.
    pub fn end(&self) -> Point3 {
        match self {
            Self::Curve(c) => c.point_at_end(),
            Self::Point(p) => *p,
        }
    }
}

/// The part of `curve` running from `t0` to `t1`.
///
/// On a closed curve with `t0 > t1` the arc wraps through the seam.
/// Returns `None` for an empty arc.
pub fn get_subcurve<K: GeometryKernel>(
    kernel: &K,
    curve: &K::Curve,
    t0: f64,
    t1: f64,
    tol: &Tolerance,
) -> Result<Option<K::Curve>> {
    if t0 <= t1 {
        return Ok(curve.trim(t0, t1));
    }
    if !curve.is_closed() {
        return Ok(curve.trim(t1, t0).map(|c| c.reversed()));
    }
    let (lo, hi) = curve.domain();
    let pieces: Vec<K::Curve> = [curve.trim(t0, hi), curve.trim(lo, t1)]
        .into_iter()
        .flatten()
        .collect();
    match pieces.len() {
        0 => Ok(None),
        1 => Ok(pieces.into_iter().next()),
        _ => primary(kernel.join_curves(&pieces, tol), "seam join").map(Some),
    }
}

/// The shorter of the two arcs of closed `curve` between `t0` and `t1`,
/// oriented from `t0` to `t1`.
///
/// Returns `None` when both parameters land on the same point. On a tie
/// the forward arc wins.
pub fn shortest_subcurve<K: GeometryKernel>(
    kernel: &K,
    curve: &K::Curve,
    t0: f64,
    t1: f64,
    tol: &Tolerance,
) -> Result<Option<K::Curve>> {
    if tol.points_equal(&curve.point_at(t0), &curve.point_at(t1)) {
        return Ok(None);
    }
    let forward = get_subcurve(kernel, curve, t0, t1, tol)?;
    let complement = get_subcurve(kernel, curve, t1, t0, tol)?.map(|c| c.reversed());
    Ok(match (forward, complement) {
        (Some(f), Some(c)) => Some(if c.length() < f.length() { c } else { f }),
        (f, c) => f.or(c),
    })
}

/// Join `geometries` into one curve.
///
/// Between neighbours the path steps straight onto `bounds`, follows its
/// shorter arc and steps straight off again to the next entry.
pub fn connect_geometries<K: GeometryKernel>(
    kernel: &K,
    geometries: &[PathGeometry<K::Curve>],
    bounds: &K::Curve,
    tol: &Tolerance,
) -> Result<K::Curve> {
    let Some(first) = geometries.first() else {
        return Err(SprayPathError::EmptyInput("geometries"));
    };

    let mut pieces: Vec<K::Curve> = Vec::new();
    let push_line = |pieces: &mut Vec<K::Curve>, a: Point3, b: Point3| -> Result<()> {
        if !tol.points_equal(&a, &b) {
            pieces.push(kernel.line(&a, &b)?);
        }
        Ok(())
    };

    if let PathGeometry::Curve(c) = first {
        pieces.push(c.clone());
    }
    for pair in geometries.windows(2) {
        let (p0, p1) = (pair[0].end(), pair[1].start());
        let (t0, t1) = (bounds.closest_param(&p0), bounds.closest_param(&p1));
        match shortest_subcurve(kernel, bounds, t0, t1, tol)? {
            Some(arc) => {
                push_line(&mut pieces, p0, arc.point_at_start())?;
                let arc_end = arc.point_at_end();
                pieces.push(arc);
                push_line(&mut pieces, arc_end, p1)?;
            }
            None => {
                let via = bounds.point_at(t0);
                push_line(&mut pieces, p0, via)?;
                push_line(&mut pieces, via, p1)?;
            }
        }
        if let PathGeometry::Curve(c) = &pair[1] {
            pieces.push(c.clone());
        }
    }

    if pieces.is_empty() {
        return Err(SprayPathError::Degenerate(
            "nothing to connect".into(),
        ));
    }
    debug!(geometries = geometries.len(), pieces = pieces.len(), "connecting path");
    primary(kernel.join_curves(&pieces, tol), "path join")
}
