//! Piecewise-linear curves.

use spraypath_kernel_geom::{Curve, KernelError};
use spraypath_kernel_math::{BoundingBox3, Point3, Transform};

/// Points closer than this are merged when building a polyline.
const MERGE_EPS: f64 = 1e-12;

/// Direction change (radians) above which a vertex splits [`Curve::segments`].
const KINK_ANGLE: f64 = 5.0 * std::f64::consts::PI / 180.0;

/// An open or closed polyline.
///
/// The parameter of vertex `i` is `i`, so the domain is
/// `[0, segment_count]`. A closed polyline stores each vertex once; the
/// closing segment runs from the last vertex back to the first.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    points: Vec<Point3>,
    closed: bool,
}

impl Polyline {
    /// Build a polyline, merging coincident neighbours.
    ///
    /// Fails when fewer than two distinct points remain (three for a
    /// closed polyline).
    pub fn new(points: Vec<Point3>, closed: bool) -> Result<Self, KernelError> {
        let mut merged: Vec<Point3> = Vec::with_capacity(points.len());
        for p in points {
            if merged.last().map_or(true, |q| (p - q).norm() > MERGE_EPS) {
                merged.push(p);
            }
        }
        if closed && merged.len() > 1 {
            let (first, last) = (merged[0], merged[merged.len() - 1]);
            if (first - last).norm() <= MERGE_EPS {
                merged.pop();
            }
        }
        let required = if closed { 3 } else { 2 };
        if merged.len() < required {
            return Err(KernelError::Degenerate(format!(
                "polyline needs {required} distinct points, got {}",
                merged.len()
            )));
        }
        Ok(Self {
            points: merged,
            closed,
        })
    }

    /// Open polyline through `points`.
    pub fn open(points: Vec<Point3>) -> Result<Self, KernelError> {
        Self::new(points, false)
    }

    /// Closed polyline through `points`.
    pub fn closed(points: Vec<Point3>) -> Result<Self, KernelError> {
        Self::new(points, true)
    }

    /// The distinct vertices.
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    /// Vertices in traversal order, repeating the first one at the end
    /// for closed polylines.
    pub fn vertex_loop(&self) -> Vec<Point3> {
        let mut pts = self.points.clone();
        if self.closed {
            pts.push(self.points[0]);
        }
        pts
    }

    /// Number of straight segments.
    pub fn segment_count(&self) -> usize {
        if self.closed {
            self.points.len()
        } else {
            self.points.len() - 1
        }
    }

    /// Endpoints of segment `i`.
    pub fn segment(&self, i: usize) -> (Point3, Point3) {
        let n = self.points.len();
        (self.points[i % n], self.points[(i + 1) % n])
    }

    /// Arc length at every vertex parameter, starting at zero.
    pub fn cumulative_lengths(&self) -> Vec<f64> {
        let mut acc = Vec::with_capacity(self.segment_count() + 1);
        acc.push(0.0);
        let mut total = 0.0;
        for i in 0..self.segment_count() {
            let (a, b) = self.segment(i);
            total += (b - a).norm();
            acc.push(total);
        }
        acc
    }

    /// A copy whose segments are no longer than `max_step`.
    pub fn densified(&self, max_step: f64) -> Polyline {
        if max_step <= 0.0 {
            return self.clone();
        }
        let mut pts = Vec::with_capacity(self.points.len());
        for i in 0..self.segment_count() {
            let (a, b) = self.segment(i);
            let pieces = ((b - a).norm() / max_step).ceil().clamp(1.0, 10_000.0) as usize;
            for k in 0..pieces {
                pts.push(a + (b - a) * (k as f64 / pieces as f64));
            }
        }
        if !self.closed {
            pts.push(self.points[self.points.len() - 1]);
        }
        Self {
            points: pts,
            closed: self.closed,
        }
    }

    fn clamp_param(&self, t: f64) -> f64 {
        let m = self.segment_count() as f64;
        if self.closed {
            let w = t.rem_euclid(m);
            // rem_euclid maps m itself to 0; keep the domain end reachable.
            if w == 0.0 && t > 0.0 {
                m
            } else {
                w
            }
        } else {
            t.clamp(0.0, m)
        }
    }
}

impl Curve for Polyline {
    fn domain(&self) -> (f64, f64) {
        (0.0, self.segment_count() as f64)
    }

    fn is_closed(&self) -> bool {
        self.closed
    }

    fn length(&self) -> f64 {
        (0..self.segment_count())
            .map(|i| {
                let (a, b) = self.segment(i);
                (b - a).norm()
            })
            .sum()
    }

    fn point_at(&self, t: f64) -> Point3 {
        let t = self.clamp_param(t);
        let m = self.segment_count();
        let i = (t.floor() as usize).min(m - 1);
        let f = t - i as f64;
        let (a, b) = self.segment(i);
        a + (b - a) * f
    }

    fn param_at_length(&self, s: f64) -> f64 {
        let cum = self.cumulative_lengths();
        let total = cum[cum.len() - 1];
        let s = s.clamp(0.0, total);
        let i = match cum.binary_search_by(|c| c.total_cmp(&s)) {
            Ok(i) => return i as f64,
            Err(i) => i.saturating_sub(1).min(self.segment_count() - 1),
        };
        let seg = cum[i + 1] - cum[i];
        if seg <= 0.0 {
            i as f64
        } else {
            i as f64 + (s - cum[i]) / seg
        }
    }

    fn closest_param(&self, p: &Point3) -> f64 {
        let mut best_t = 0.0;
        let mut best_d = f64::INFINITY;
        for i in 0..self.segment_count() {
            let (a, b) = self.segment(i);
            let ab = b - a;
            let len2 = ab.norm_squared();
            let f = if len2 > 0.0 {
                ((p - a).dot(&ab) / len2).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let d = (a + ab * f - p).norm_squared();
            if d < best_d {
                best_d = d;
                best_t = i as f64 + f;
            }
        }
        best_t
    }

    fn reversed(&self) -> Self {
        let mut points = self.points.clone();
        if self.closed {
            points[1..].reverse();
        } else {
            points.reverse();
        }
        Self {
            points,
            closed: self.closed,
        }
    }

    fn trim(&self, t0: f64, t1: f64) -> Option<Self> {
        let (lo, hi) = self.domain();
        let (t0, t1) = (t0.clamp(lo, hi), t1.clamp(lo, hi));
        if t1 - t0 <= MERGE_EPS {
            return None;
        }
        let mut pts = vec![self.point_at(t0)];
        let first = t0.floor() as usize + 1;
        for j in first..self.segment_count() {
            let tj = j as f64;
            if tj >= t1 - MERGE_EPS {
                break;
            }
            if tj > t0 + MERGE_EPS {
                pts.push(self.points[j]);
            }
        }
        pts.push(self.point_at(t1));
        Polyline::open(pts).ok()
    }

    fn bounding_box(&self) -> BoundingBox3 {
        BoundingBox3::from_points(&self.points)
    }

    fn transformed(&self, t: &Transform) -> Self {
        Self {
            points: self.points.iter().map(|p| t.apply_point(p)).collect(),
            closed: self.closed,
        }
    }

    fn segments(&self) -> Vec<Self> {
        let n = self.points.len();
        let m = self.segment_count();
        let kinks: Vec<usize> = (0..n)
            .filter(|&k| {
                if !self.closed && (k == 0 || k == n - 1) {
                    return false;
                }
                let (a, b) = self.segment((k + m - 1) % m);
                let (c, d) = self.segment(k % m);
                (b - a).angle(&(d - c)) > KINK_ANGLE
            })
            .collect();

        let mut breaks = kinks;
        if !self.closed {
            breaks.insert(0, 0);
            breaks.push(n - 1);
        } else if breaks.is_empty() {
            return vec![self.clone()];
        } else {
            breaks.push(breaks[0] + n);
        }
        breaks
            .windows(2)
            .map(|w| Self {
                points: (w[0]..=w[1]).map(|k| self.points[k % n]).collect(),
                closed: false,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn square(size: f64) -> Polyline {
        Polyline::closed(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(size, 0.0, 0.0),
            Point3::new(size, size, 0.0),
            Point3::new(0.0, size, 0.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_closed_square_basics() {
        let sq = square(10.0);
        assert_eq!(sq.domain(), (0.0, 4.0));
        assert_abs_diff_eq!(sq.length(), 40.0);
        assert_abs_diff_eq!(sq.point_at(2.5), Point3::new(5.0, 10.0, 0.0));
        assert_abs_diff_eq!(sq.point_at_end(), sq.point_at_start());
    }

    #[test]
    fn test_repeated_closing_point_is_dropped() {
        let sq = Polyline::closed(vec![
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::origin(),
        ])
        .unwrap();
        assert_eq!(sq.points().len(), 3);
    }

    #[test]
    fn test_degenerate_rejected() {
        assert!(Polyline::open(vec![Point3::origin(), Point3::origin()]).is_err());
    }

    #[test]
    fn test_param_at_length_uneven_segments() {
        let p = Polyline::open(vec![
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
        ])
        .unwrap();
        assert_abs_diff_eq!(p.param_at_length(2.5), 1.5);
        assert_abs_diff_eq!(p.point_at_normalized_length(0.5), Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_reverse_closed_keeps_start() {
        let sq = square(2.0);
        let r = sq.reversed();
        assert_abs_diff_eq!(r.point_at_start(), sq.point_at_start());
        assert_abs_diff_eq!(r.point_at(1.0), Point3::new(0.0, 2.0, 0.0));
        assert_abs_diff_eq!(r.length(), sq.length());
    }

    #[test]
    fn test_trim_interior_and_empty() {
        let sq = square(10.0);
        let sub = sq.trim(0.5, 2.5).unwrap();
        assert_abs_diff_eq!(sub.length(), 20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sub.point_at_start(), Point3::new(5.0, 0.0, 0.0));
        assert_abs_diff_eq!(sub.point_at_end(), Point3::new(5.0, 10.0, 0.0));
        assert!(sq.trim(2.0, 2.0).is_none());
        assert!(sq.trim(3.0, 1.0).is_none());
    }

    #[test]
    fn test_closest_param() {
        let sq = square(10.0);
        assert_abs_diff_eq!(sq.closest_param(&Point3::new(12.0, 5.0, 0.0)), 1.5);
    }

    #[test]
    fn test_divide_by_length_drops_remainder() {
        let p = Polyline::open(vec![Point3::origin(), Point3::new(3.5, 0.0, 0.0)]).unwrap();
        let params = p.divide_by_length(1.0, false);
        assert_eq!(params.len(), 3);
        assert_abs_diff_eq!(p.point_at(params[2]).x, 3.0, epsilon = 1e-12);
        assert_eq!(p.divide_by_length(1.0, true).len(), 4);
    }

    #[test]
    fn test_divide_by_count_closed_and_open() {
        let sq = square(10.0);
        assert_eq!(sq.divide_by_count(8, true).len(), 8);
        let line = Polyline::open(vec![Point3::origin(), Point3::new(9.0, 0.0, 0.0)]).unwrap();
        let params = line.divide_by_count(9, true);
        assert_eq!(params.len(), 10);
        assert_abs_diff_eq!(line.point_at(params[3]).x, 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_densified_keeps_shape() {
        let sq = square(10.0).densified(1.0);
        assert_eq!(sq.points().len(), 40);
        assert_abs_diff_eq!(sq.length(), 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_segments_split_at_corners_only() {
        let pieces = square(10.0).densified(1.0).segments();
        assert_eq!(pieces.len(), 4);
        for piece in &pieces {
            assert_abs_diff_eq!(piece.length(), 10.0, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(pieces[1].point_at_start(), Point3::new(10.0, 0.0, 0.0), epsilon = 1e-12);

        let bent = Polyline::open(vec![
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ])
        .unwrap();
        assert_eq!(bent.segments().len(), 2);
    }
}
