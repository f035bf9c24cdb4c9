#![warn(missing_docs)]

//! A discrete reference implementation of [`GeometryKernel`].
//!
//! Curves are [`Polyline`]s, surfaces are bilinear [`GridSurface`]s with an
//! optional trim loop, and solids are [`Prism`]s. Accuracy is bounded by
//! grid resolution, which makes this kernel suitable for planar and gently
//! curved patches and for exercising the path planner in tests.

mod fit;
mod geodesic;
mod offset;
mod planar;
mod polyline;
mod prism;
mod surface;

pub use fit::fit_patch;
pub use polyline::Polyline;
pub use prism::Prism;
pub use surface::GridSurface;

use std::collections::VecDeque;

use spraypath_kernel_geom::{
    Curve, GeometryKernel, KernelError, PatchOptions, Plane, Surface,
};
use spraypath_kernel_math::{BoundingBox3, Point2, Point3, Tolerance, Vec3};

/// Reference kernel over polylines, grid surfaces and prisms.
#[derive(Debug, Clone)]
pub struct DiscreteKernel {
    /// Segments in each shortest-path polyline.
    pub geodesic_segments: usize,
    /// Relaxation sweeps allowed per shortest path.
    pub relaxation_iterations: usize,
}

impl Default for DiscreteKernel {
    fn default() -> Self {
        Self {
            geodesic_segments: 64,
            relaxation_iterations: 200,
        }
    }
}

impl DiscreteKernel {
    /// Create a kernel with default resolution.
    pub fn new() -> Self {
        Self::default()
    }
}

impl GeometryKernel for DiscreteKernel {
    type Curve = Polyline;
    type Surface = GridSurface;
    type Solid = Prism;

    fn polyline(&self, points: &[Point3], closed: bool) -> Result<Polyline, KernelError> {
        Polyline::new(points.to_vec(), closed)
    }

    fn boundary_wireframe(&self, surface: &GridSurface) -> Vec<Polyline> {
        if let Some(edge) = surface.trim_edge() {
            return Polyline::closed(edge).into_iter().collect();
        }
        let (nu, nv) = surface.grid_size();
        let rows: [Vec<Point3>; 4] = [
            (0..nu).map(|i| surface.node(i, 0)).collect(),
            (0..nv).map(|j| surface.node(nu - 1, j)).collect(),
            (0..nu).rev().map(|i| surface.node(i, nv - 1)).collect(),
            (0..nv).rev().map(|j| surface.node(0, j)).collect(),
        ];
        rows.into_iter()
            .filter_map(|pts| Polyline::open(pts).ok())
            .collect()
    }

    fn join_curves(&self, curves: &[Polyline], tol: &Tolerance) -> Vec<Polyline> {
        let mut pending: VecDeque<Polyline> = curves.iter().cloned().collect();
        let mut joined = Vec::new();

        while let Some(first) = pending.pop_front() {
            if first.is_closed() {
                joined.push(first);
                continue;
            }
            let mut chain: VecDeque<Point3> = first.points().iter().copied().collect();
            loop {
                let (head, tail) = match (chain.front(), chain.back()) {
                    (Some(h), Some(t)) => (*h, *t),
                    _ => break,
                };
                let found = pending.iter().position(|c| {
                    !c.is_closed()
                        && [c.point_at_start(), c.point_at_end()]
                            .iter()
                            .any(|e| tol.points_equal(e, &tail) || tol.points_equal(e, &head))
                });
                let Some(index) = found else { break };
                let Some(next) = pending.remove(index) else { break };
                let pts = next.points();
                if tol.points_equal(&next.point_at_start(), &tail) {
                    chain.extend(pts[1..].iter().copied());
                } else if tol.points_equal(&next.point_at_end(), &tail) {
                    chain.extend(pts[..pts.len() - 1].iter().rev().copied());
                } else if tol.points_equal(&next.point_at_end(), &head) {
                    for p in pts[..pts.len() - 1].iter().rev() {
                        chain.push_front(*p);
                    }
                } else {
                    for p in pts[1..].iter() {
                        chain.push_front(*p);
                    }
                }
            }

            let pts: Vec<Point3> = chain.into_iter().collect();
            let closes = pts.len() > 3 && tol.points_equal(&pts[0], &pts[pts.len() - 1]);
            let result = if closes {
                Polyline::closed(pts[..pts.len() - 1].to_vec())
            } else {
                Polyline::open(pts)
            };
            if let Ok(curve) = result {
                joined.push(curve);
            }
        }
        joined
    }

    fn patch_fit(
        &self,
        points: &[Point3],
        outline: &Polyline,
        options: &PatchOptions,
        _tol: &Tolerance,
    ) -> Result<Vec<GridSurface>, KernelError> {
        fit_patch(points, outline, options).map(|s| vec![s])
    }

    fn shortest_path(
        &self,
        surface: &GridSurface,
        uv0: Point2,
        uv1: Point2,
        tol: &Tolerance,
    ) -> Result<Polyline, KernelError> {
        geodesic::shortest_path(
            surface,
            uv0,
            uv1,
            self.geodesic_segments,
            self.relaxation_iterations,
            tol.linear,
        )
    }

    fn offset_on_surface(
        &self,
        curve: &Polyline,
        surface: &GridSurface,
        distance: f64,
        _tol: &Tolerance,
    ) -> Result<Vec<Polyline>, KernelError> {
        offset::offset_on_surface(curve, surface, distance).map(|c| vec![c])
    }

    fn project_to_plane(&self, curve: &Polyline, plane: &Plane) -> Result<Polyline, KernelError> {
        let pts = curve.points().iter().map(|p| plane.closest_point(p)).collect();
        Polyline::new(pts, curve.is_closed())
    }

    fn project_to_surface(
        &self,
        curve: &Polyline,
        surface: &GridSurface,
        direction: &Vec3,
        _tol: &Tolerance,
    ) -> Result<Vec<Polyline>, KernelError> {
        if direction.norm() <= f64::EPSILON {
            return Err(KernelError::InvalidInput("zero projection direction".into()));
        }
        let dense = curve.densified(0.5 * surface.cell_size());
        let hits: Vec<Option<Point3>> = dense
            .points()
            .iter()
            .map(|p| surface.ray_hit(p, direction).map(|h| h.point))
            .collect();

        if curve.is_closed() && hits.iter().all(Option::is_some) {
            let pts = hits.into_iter().flatten().collect();
            return Ok(vec![Polyline::closed(pts)?]);
        }

        let mut runs = Vec::new();
        let mut run: Vec<Point3> = Vec::new();
        for hit in hits {
            match hit {
                Some(p) => run.push(p),
                None => runs.push(std::mem::take(&mut run)),
            }
        }
        runs.push(run);
        let pieces: Vec<Polyline> = runs
            .into_iter()
            .filter_map(|pts| Polyline::open(pts).ok())
            .collect();
        if pieces.is_empty() {
            return Err(KernelError::NoResult("projection onto surface"));
        }
        Ok(pieces)
    }

    fn pull_back(
        &self,
        curve: &Polyline,
        surface: &GridSurface,
        _tol: &Tolerance,
    ) -> Result<Vec<Point2>, KernelError> {
        let dense = curve.densified(0.5 * surface.cell_size());
        Ok(dense
            .vertex_loop()
            .iter()
            .map(|p| surface.closest_point(p).uv)
            .collect())
    }

    fn push_up(
        &self,
        uv: &[Point2],
        surface: &GridSurface,
        _tol: &Tolerance,
    ) -> Result<Polyline, KernelError> {
        let step = 0.5 * surface.cell_size();
        let mut pts = Vec::with_capacity(uv.len());
        for pair in uv.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let chord = (surface.evaluate(b) - surface.evaluate(a)).norm();
            let pieces = (chord / step).ceil().clamp(1.0, 10_000.0) as usize;
            for k in 0..pieces {
                pts.push(surface.evaluate(a + (b - a) * (k as f64 / pieces as f64)));
            }
        }
        if let Some(last) = uv.last() {
            pts.push(surface.evaluate(*last));
        }
        Polyline::open(pts)
    }

    fn extrude_and_cap(
        &self,
        curve: &Polyline,
        direction: &Vec3,
        _tol: &Tolerance,
    ) -> Result<Prism, KernelError> {
        if !curve.is_closed() {
            return Err(KernelError::InvalidInput("extrusion profile must be closed".into()));
        }
        Prism::extrude(curve, direction)
    }

    fn curve_solid_intersections(&self, curve: &Polyline, solid: &Prism, tol: &Tolerance) -> Vec<f64> {
        solid.intersections(curve, tol.linear)
    }

    fn point_in_solid(&self, solid: &Prism, point: &Point3, tol: &Tolerance, strict: bool) -> bool {
        solid.contains(point, tol.linear, strict)
    }

    fn area_centroid(&self, curve: &Polyline) -> Option<Point3> {
        if !curve.is_closed() {
            return None;
        }
        let pts = curve.points();
        let n = pts.len();
        let (mut area, mut cx, mut cy) = (0.0, 0.0, 0.0);
        for i in 0..n {
            let (a, b) = (pts[i], pts[(i + 1) % n]);
            let cross = a.x * b.y - b.x * a.y;
            area += cross;
            cx += (a.x + b.x) * cross;
            cy += (a.y + b.y) * cross;
        }
        area *= 0.5;
        if area.abs() <= f64::EPSILON {
            return None;
        }
        let z = BoundingBox3::from_points(pts).min.z;
        Some(Point3::new(cx / (6.0 * area), cy / (6.0 * area), z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square_surface() -> GridSurface {
        GridSurface::planar(Point3::origin(), Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 10.0, 0.0))
            .unwrap()
    }

    #[test]
    fn test_wireframe_joins_into_perimeter() {
        let kernel = DiscreteKernel::new();
        let edges = kernel.boundary_wireframe(&square_surface());
        assert_eq!(edges.len(), 4);
        let joined = kernel.join_curves(&edges, &Tolerance::default());
        assert_eq!(joined.len(), 1);
        assert!(joined[0].is_closed());
        assert_abs_diff_eq!(joined[0].length(), 40.0, epsilon = 1e-12);
    }

    #[test]
    fn test_join_reverses_pieces_as_needed() {
        let kernel = DiscreteKernel::new();
        let a = Polyline::open(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)]).unwrap();
        let b = Polyline::open(vec![Point3::new(2.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)]).unwrap();
        let c = Polyline::open(vec![Point3::new(-1.0, 0.0, 0.0), Point3::origin()]).unwrap();
        let joined = kernel.join_curves(&[a, b, c], &Tolerance::default());
        assert_eq!(joined.len(), 1);
        assert_abs_diff_eq!(joined[0].point_at_start(), Point3::new(-1.0, 0.0, 0.0));
        assert_abs_diff_eq!(joined[0].point_at_end(), Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_trimmed_wireframe_is_single_loop() {
        let kernel = DiscreteKernel::new();
        let trimmed = square_surface()
            .with_trim(vec![
                Point2::new(1.0, 1.0),
                Point2::new(9.0, 1.0),
                Point2::new(5.0, 9.0),
            ])
            .unwrap();
        let edges = kernel.boundary_wireframe(&trimmed);
        assert_eq!(edges.len(), 1);
        assert!(edges[0].is_closed());
    }

    #[test]
    fn test_project_to_surface_splits_on_misses() {
        let kernel = DiscreteKernel::new();
        let line = Polyline::open(vec![Point3::new(-5.0, 5.0, 3.0), Point3::new(15.0, 5.0, 3.0)]).unwrap();
        let pieces = kernel
            .project_to_surface(&line, &square_surface(), &Vec3::z(), &Tolerance::default())
            .unwrap();
        assert_eq!(pieces.len(), 1);
        assert_abs_diff_eq!(pieces[0].point_at_start().z, 0.0);
        assert!(pieces[0].length() <= 10.0 + 1e-9);
    }

    #[test]
    fn test_pull_back_push_up_round_trip() {
        let kernel = DiscreteKernel::new();
        let s = square_surface();
        let tol = Tolerance::default();
        let line = Polyline::open(vec![Point3::new(1.0, 2.0, 0.0), Point3::new(8.0, 2.0, 0.0)]).unwrap();
        let uv = kernel.pull_back(&line, &s, &tol).unwrap();
        let back = kernel.push_up(&uv, &s, &tol).unwrap();
        assert_abs_diff_eq!(back.length(), 7.0, epsilon = 1e-9);
        assert_abs_diff_eq!(back.point_at_end(), Point3::new(8.0, 2.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn test_area_centroid() {
        let kernel = DiscreteKernel::new();
        let sq = kernel
            .polyline(
                &[
                    Point3::new(0.0, 0.0, 1.0),
                    Point3::new(4.0, 0.0, 1.0),
                    Point3::new(4.0, 2.0, 1.0),
                    Point3::new(0.0, 2.0, 1.0),
                ],
                true,
            )
            .unwrap();
        assert_abs_diff_eq!(kernel.area_centroid(&sq).unwrap(), Point3::new(2.0, 1.0, 1.0));
        assert!(kernel.area_centroid(&sq.segments()[0]).is_none());
    }

    #[test]
    fn test_open_profile_cannot_be_extruded() {
        let kernel = DiscreteKernel::new();
        let line = kernel.line(&Point3::origin(), &Point3::new(1.0, 0.0, 0.0)).unwrap();
        assert!(kernel
            .extrude_and_cap(&line, &Vec3::z(), &Tolerance::default())
            .is_err());
    }
}
