//! Sampled surfaces: a node grid evaluated bilinearly per cell.

use spraypath_kernel_geom::{KernelError, Plane, Surface, SurfacePoint};
use spraypath_kernel_math::{BoundingBox3, Dir3, Point2, Point3, Vec3};

use crate::planar;

/// A surface sampled on a regular `nu × nv` node grid.
///
/// Node `(i, j)` sits at parameter `(u0 + i·du, v0 + j·dv)`; inside each
/// cell the surface is the bilinear blend of its four corner nodes. An
/// optional outer trim loop in parameter space restricts the active
/// region.
#[derive(Debug, Clone)]
pub struct GridSurface {
    nu: usize,
    nv: usize,
    nodes: Vec<Point3>,
    u_range: (f64, f64),
    v_range: (f64, f64),
    cell_boxes: Vec<BoundingBox3>,
    trim: Option<TrimLoop>,
}

#[derive(Debug, Clone)]
struct TrimLoop {
    uv: Vec<Point2>,
    /// Dense samples of the loop on the surface, closing sample omitted.
    edge: Vec<SurfacePoint>,
}

impl GridSurface {
    /// Build from nodes stored row by row (`u` fastest).
    pub fn new(
        nu: usize,
        nv: usize,
        nodes: Vec<Point3>,
        u_range: (f64, f64),
        v_range: (f64, f64),
    ) -> Result<Self, KernelError> {
        if nu < 2 || nv < 2 {
            return Err(KernelError::InvalidInput(format!(
                "grid needs at least 2x2 nodes, got {nu}x{nv}"
            )));
        }
        if nodes.len() != nu * nv {
            return Err(KernelError::InvalidInput(format!(
                "expected {} nodes, got {}",
                nu * nv,
                nodes.len()
            )));
        }
        if !(u_range.1 > u_range.0 && v_range.1 > v_range.0) {
            return Err(KernelError::Degenerate("empty parameter domain".into()));
        }

        let mut surface = Self {
            nu,
            nv,
            nodes,
            u_range,
            v_range,
            cell_boxes: Vec::new(),
            trim: None,
        };
        surface.cell_boxes = (0..nv - 1)
            .flat_map(|j| (0..nu - 1).map(move |i| (i, j)))
            .map(|(i, j)| {
                BoundingBox3::from_points(&[
                    surface.node(i, j),
                    surface.node(i + 1, j),
                    surface.node(i + 1, j + 1),
                    surface.node(i, j + 1),
                ])
            })
            .collect();
        Ok(surface)
    }

    /// Sample `f(u, v)` on an `nu × nv` grid over the given ranges.
    pub fn from_fn(
        nu: usize,
        nv: usize,
        u_range: (f64, f64),
        v_range: (f64, f64),
        f: impl Fn(f64, f64) -> Point3,
    ) -> Result<Self, KernelError> {
        let du = (u_range.1 - u_range.0) / (nu.max(2) - 1) as f64;
        let dv = (v_range.1 - v_range.0) / (nv.max(2) - 1) as f64;
        let nodes = (0..nv)
            .flat_map(|j| (0..nu).map(move |i| (i, j)))
            .map(|(i, j)| f(u_range.0 + i as f64 * du, v_range.0 + j as f64 * dv))
            .collect();
        Self::new(nu, nv, nodes, u_range, v_range)
    }

    /// Flat parallelogram spanned by `u_edge` and `v_edge` from `origin`.
    ///
    /// Parameters are arc lengths along the two edges.
    pub fn planar(origin: Point3, u_edge: Vec3, v_edge: Vec3) -> Result<Self, KernelError> {
        let (lu, lv) = (u_edge.norm(), v_edge.norm());
        if u_edge.cross(&v_edge).norm() <= 1e-12 * lu * lv {
            return Err(KernelError::Degenerate("parallel plane edges".into()));
        }
        Self::new(
            2,
            2,
            vec![origin, origin + u_edge, origin + v_edge, origin + u_edge + v_edge],
            (0.0, lu),
            (0.0, lv),
        )
    }

    /// Restrict the active region to the inside of a closed uv loop.
    pub fn with_trim(mut self, loop_uv: Vec<Point2>) -> Result<Self, KernelError> {
        if loop_uv.len() < 3 || planar::signed_area(&loop_uv).abs() <= f64::EPSILON {
            return Err(KernelError::Degenerate("trim loop encloses no area".into()));
        }
        let step = 0.25 * self.du().min(self.dv());
        let n = loop_uv.len();
        let mut edge = Vec::new();
        for k in 0..n {
            let (a, b) = (loop_uv[k], loop_uv[(k + 1) % n]);
            let pieces = ((b - a).norm() / step).ceil().clamp(1.0, 10_000.0) as usize;
            for s in 0..pieces {
                let uv = a + (b - a) * (s as f64 / pieces as f64);
                edge.push(SurfacePoint {
                    point: self.evaluate(uv),
                    uv,
                });
            }
        }
        self.trim = Some(TrimLoop { uv: loop_uv, edge });
        Ok(self)
    }

    /// Node counts `(nu, nv)`.
    pub fn grid_size(&self) -> (usize, usize) {
        (self.nu, self.nv)
    }

    /// Node `(i, j)`.
    pub fn node(&self, i: usize, j: usize) -> Point3 {
        self.nodes[j * self.nu + i]
    }

    /// The trim loop in parameter space, if any.
    pub fn trim_loop(&self) -> Option<&[Point2]> {
        self.trim.as_ref().map(|t| t.uv.as_slice())
    }

    /// Dense 3D samples of the trim loop, if any.
    pub fn trim_edge(&self) -> Option<Vec<Point3>> {
        self.trim
            .as_ref()
            .map(|t| t.edge.iter().map(|s| s.point).collect())
    }

    /// Average 3D node spacing along the shorter grid direction.
    pub fn cell_size(&self) -> f64 {
        let along_u: f64 = (0..self.nu - 1)
            .map(|i| (self.node(i + 1, 0) - self.node(i, 0)).norm())
            .sum::<f64>()
            / (self.nu - 1) as f64;
        let along_v: f64 = (0..self.nv - 1)
            .map(|j| (self.node(0, j + 1) - self.node(0, j)).norm())
            .sum::<f64>()
            / (self.nv - 1) as f64;
        along_u.min(along_v).max(1e-9)
    }

    /// True if `uv` lies in the active region.
    pub fn contains_uv(&self, uv: &Point2) -> bool {
        let slack = 1e-9 * (self.u_range.1 - self.u_range.0 + self.v_range.1 - self.v_range.0);
        if uv.x < self.u_range.0 - slack
            || uv.x > self.u_range.1 + slack
            || uv.y < self.v_range.0 - slack
            || uv.y > self.v_range.1 + slack
        {
            return false;
        }
        match &self.trim {
            None => true,
            Some(t) => {
                planar::point_in_polygon(uv, &t.uv)
                    || planar::distance_to_boundary(uv, &t.uv) <= slack
            }
        }
    }

    /// Nearest intersection of the line `origin + s·dir` (either sense)
    /// with the active region.
    pub fn ray_hit(&self, origin: &Point3, dir: &Vec3) -> Option<SurfacePoint> {
        let mut best: Option<(f64, Point2)> = None;
        for j in 0..self.nv - 1 {
            for i in 0..self.nu - 1 {
                let mut cell = self.cell_boxes[j * (self.nu - 1) + i];
                cell.expand(1e-9);
                if !cell.intersects_line(origin, dir) {
                    continue;
                }
                for (tri, tri_uv) in self.cell_triangles(i, j) {
                    let Some((s, w)) = ray_triangle(origin, dir, &tri) else {
                        continue;
                    };
                    let uv = blend_uv(&tri_uv, &w);
                    if !self.contains_uv(&uv) {
                        continue;
                    }
                    if best.map_or(true, |(bs, _)| s.abs() < bs.abs()) {
                        best = Some((s, uv));
                    }
                }
            }
        }
        best.map(|(_, uv)| SurfacePoint {
            point: self.evaluate(uv),
            uv,
        })
    }

    fn du(&self) -> f64 {
        (self.u_range.1 - self.u_range.0) / (self.nu - 1) as f64
    }

    fn dv(&self) -> f64 {
        (self.v_range.1 - self.v_range.0) / (self.nv - 1) as f64
    }

    fn node_uv(&self, i: usize, j: usize) -> Point2 {
        Point2::new(
            self.u_range.0 + i as f64 * self.du(),
            self.v_range.0 + j as f64 * self.dv(),
        )
    }

    /// Cell containing `uv` (clamped to the grid) and local fractions.
    fn locate(&self, uv: &Point2) -> (usize, usize, f64, f64) {
        let fu = ((uv.x - self.u_range.0) / self.du()).clamp(0.0, (self.nu - 1) as f64);
        let fv = ((uv.y - self.v_range.0) / self.dv()).clamp(0.0, (self.nv - 1) as f64);
        let i = (fu.floor() as usize).min(self.nu - 2);
        let j = (fv.floor() as usize).min(self.nv - 2);
        (i, j, fu - i as f64, fv - j as f64)
    }

    fn cell_triangles(&self, i: usize, j: usize) -> [([Point3; 3], [Point2; 3]); 2] {
        let (a, b, c, d) = (
            self.node(i, j),
            self.node(i + 1, j),
            self.node(i + 1, j + 1),
            self.node(i, j + 1),
        );
        let (ua, ub, uc, ud) = (
            self.node_uv(i, j),
            self.node_uv(i + 1, j),
            self.node_uv(i + 1, j + 1),
            self.node_uv(i, j + 1),
        );
        [([a, b, c], [ua, ub, uc]), ([a, c, d], [ua, uc, ud])]
    }

    /// Closest point over the triangulated grid, optionally restricted to
    /// candidates inside the trim.
    fn closest_on_grid(&self, p: &Point3, inside_only: bool) -> Option<(f64, SurfacePoint)> {
        let mut best: Option<(f64, SurfacePoint)> = None;
        for j in 0..self.nv - 1 {
            for i in 0..self.nu - 1 {
                let bound = best.map_or(f64::INFINITY, |(d, _)| d);
                if self.cell_boxes[j * (self.nu - 1) + i].distance_squared(p) >= bound {
                    continue;
                }
                for (tri, tri_uv) in self.cell_triangles(i, j) {
                    let w = closest_on_triangle(p, &tri);
                    let uv = blend_uv(&tri_uv, &w);
                    if inside_only && !self.contains_uv(&uv) {
                        continue;
                    }
                    let point = self.evaluate(uv);
                    let d = (point - p).norm_squared();
                    if best.map_or(true, |(bd, _)| d < bd) {
                        best = Some((d, SurfacePoint { point, uv }));
                    }
                }
            }
        }
        best
    }

    fn closest_on_trim_edge(&self, p: &Point3, trim: &TrimLoop) -> Option<(f64, SurfacePoint)> {
        let n = trim.edge.len();
        let mut best: Option<(f64, SurfacePoint)> = None;
        for k in 0..n {
            let (a, b) = (&trim.edge[k], &trim.edge[(k + 1) % n]);
            let ab = b.point - a.point;
            let len2 = ab.norm_squared();
            let f = if len2 > 0.0 {
                ((p - a.point).dot(&ab) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let uv = a.uv + (b.uv - a.uv) * f;
            let point = self.evaluate(uv);
            let d = (point - p).norm_squared();
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, SurfacePoint { point, uv }));
            }
        }
        best
    }
}

impl Surface for GridSurface {
    fn domain(&self) -> ((f64, f64), (f64, f64)) {
        (self.u_range, self.v_range)
    }

    fn evaluate(&self, uv: Point2) -> Point3 {
        let (i, j, s, t) = self.locate(&uv);
        let (a, b, c, d) = (
            self.node(i, j),
            self.node(i + 1, j),
            self.node(i + 1, j + 1),
            self.node(i, j + 1),
        );
        Point3::from(
            a.coords * ((1.0 - s) * (1.0 - t))
                + b.coords * (s * (1.0 - t))
                + c.coords * (s * t)
                + d.coords * ((1.0 - s) * t),
        )
    }

    fn normal(&self, uv: Point2) -> Dir3 {
        let (i, j, s, t) = self.locate(&uv);
        let (a, b, c, d) = (
            self.node(i, j),
            self.node(i + 1, j),
            self.node(i + 1, j + 1),
            self.node(i, j + 1),
        );
        let du = ((b - a) * (1.0 - t) + (c - d) * t) / self.du();
        let dv = ((d - a) * (1.0 - s) + (c - b) * s) / self.dv();
        Dir3::try_new(du.cross(&dv), 1e-15).unwrap_or_else(Vec3::z_axis)
    }

    fn closest_point(&self, p: &Point3) -> SurfacePoint {
        let Some(trim) = &self.trim else {
            return self
                .closest_on_grid(p, false)
                .map(|(_, sp)| sp)
                .unwrap_or_else(|| SurfacePoint {
                    point: self.nodes[0],
                    uv: self.node_uv(0, 0),
                });
        };
        let inner = self.closest_on_grid(p, true);
        let edge = self.closest_on_trim_edge(p, trim);
        match (inner, edge) {
            (Some((di, si)), Some((de, se))) => {
                if di <= de {
                    si
                } else {
                    se
                }
            }
            (Some((_, s)), None) | (None, Some((_, s))) => s,
            (None, None) => SurfacePoint {
                point: self.nodes[0],
                uv: self.node_uv(0, 0),
            },
        }
    }

    fn bounding_box_in(&self, plane: &Plane) -> BoundingBox3 {
        let mut bbox = BoundingBox3::empty();
        for j in 0..self.nv {
            for i in 0..self.nu {
                if self.contains_uv(&self.node_uv(i, j)) {
                    bbox.include_point(&plane.to_local(&self.node(i, j)));
                }
            }
        }
        if let Some(trim) = &self.trim {
            for s in &trim.edge {
                bbox.include_point(&plane.to_local(&s.point));
            }
        }
        bbox
    }

    fn is_trimmed(&self) -> bool {
        self.trim.is_some()
    }
}

fn blend_uv(uv: &[Point2; 3], w: &[f64; 3]) -> Point2 {
    Point2::from(uv[0].coords * w[0] + uv[1].coords * w[1] + uv[2].coords * w[2])
}

/// Barycentric weights of the point of triangle `t` closest to `p`.
fn closest_on_triangle(p: &Point3, t: &[Point3; 3]) -> [f64; 3] {
    let [a, b, c] = t;
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return [1.0, 0.0, 0.0];
    }

    let bp = p - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return [0.0, 1.0, 0.0];
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return [1.0 - v, v, 0.0];
    }

    let cp = p - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return [0.0, 0.0, 1.0];
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return [1.0 - w, 0.0, w];
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return [0.0, 1.0 - w, w];
    }

    let sum = va + vb + vc;
    if sum.abs() < 1e-300 {
        return [1.0, 0.0, 0.0];
    }
    let v = vb / sum;
    let w = vc / sum;
    [1.0 - v - w, v, w]
}

/// Möller-Trumbore against the infinite line; returns the line parameter
/// and barycentric weights.
fn ray_triangle(origin: &Point3, dir: &Vec3, t: &[Point3; 3]) -> Option<(f64, [f64; 3])> {
    const EPS: f64 = 1e-9;
    let [a, b, c] = t;
    let e1 = b - a;
    let e2 = c - a;
    let h = dir.cross(&e2);
    let det = e1.dot(&h);
    if det.abs() < 1e-14 {
        return None;
    }
    let inv = 1.0 / det;
    let s = origin - a;
    let v = inv * s.dot(&h);
    if !(-EPS..=1.0 + EPS).contains(&v) {
        return None;
    }
    let q = s.cross(&e1);
    let w = inv * dir.dot(&q);
    if w < -EPS || v + w > 1.0 + EPS {
        return None;
    }
    Some((inv * e2.dot(&q), [1.0 - v - w, v, w]))
}
