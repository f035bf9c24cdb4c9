//! 2D polygon predicates shared by trims and prisms.

use spraypath_kernel_math::Point2;

/// Winding number test. Points exactly on an edge may land on either side;
/// use [`distance_to_boundary`] when that matters.
pub fn point_in_polygon(point: &Point2, polygon: &[Point2]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut winding = 0i32;
    let n = polygon.len();

    for i in 0..n {
        let p1 = polygon[i];
        let p2 = polygon[(i + 1) % n];

        if p1.y <= point.y {
            if p2.y > point.y && is_left(&p1, &p2, point) > 0.0 {
                winding += 1;
            }
        } else if p2.y <= point.y && is_left(&p1, &p2, point) < 0.0 {
            winding -= 1;
        }
    }

    winding != 0
}

/// Distance from `point` to the closed polygon outline.
pub fn distance_to_boundary(point: &Point2, polygon: &[Point2]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| distance_to_segment(point, &polygon[i], &polygon[(i + 1) % n]))
        .fold(f64::INFINITY, f64::min)
}

/// Distance from `point` to the segment `a`-`b`.
pub fn distance_to_segment(point: &Point2, a: &Point2, b: &Point2) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    let f = if len2 > 0.0 {
        ((point - a).dot(&ab) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (a + ab * f - point).norm()
}

/// Signed area (positive for counter-clockwise polygons).
pub fn signed_area(polygon: &[Point2]) -> f64 {
    let n = polygon.len();
    let mut area = 0.0;
    for i in 0..n {
        let (a, b) = (polygon[i], polygon[(i + 1) % n]);
        area += a.x * b.y - b.x * a.y;
    }
    area * 0.5
}

/// Intersection of segments `a0`-`a1` and `b0`-`b1` as fractions along
/// each, or `None` when they are parallel or miss.
pub fn segment_intersection(
    a0: &Point2,
    a1: &Point2,
    b0: &Point2,
    b1: &Point2,
) -> Option<(f64, f64)> {
    let da = a1 - a0;
    let db = b1 - b0;
    let denom = da.x * db.y - da.y * db.x;
    if denom.abs() < 1e-14 * (da.norm() * db.norm()).max(1e-300) {
        return None;
    }
    let w = b0 - a0;
    let s = (w.x * db.y - w.y * db.x) / denom;
    let r = (w.x * da.y - w.y * da.x) / denom;
    const EPS: f64 = 1e-12;
    if (-EPS..=1.0 + EPS).contains(&s) && (-EPS..=1.0 + EPS).contains(&r) {
        Some((s.clamp(0.0, 1.0), r.clamp(0.0, 1.0)))
    } else {
        None
    }
}

/// Compute the signed area of the triangle (p0, p1, p2).
/// Positive if p2 is to the left of the line p0->p1.
#[inline]
fn is_left(p0: &Point2, p1: &Point2, p2: &Point2) -> f64 {
    (p1.x - p0.x) * (p2.y - p0.y) - (p2.x - p0.x) * (p1.y - p0.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn unit_square() -> Vec<Point2> {
        vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ]
    }

    #[test]
    fn test_point_in_polygon_either_winding() {
        let mut sq = unit_square();
        assert!(point_in_polygon(&Point2::new(0.5, 0.5), &sq));
        assert!(!point_in_polygon(&Point2::new(1.5, 0.5), &sq));
        sq.reverse();
        assert!(point_in_polygon(&Point2::new(0.5, 0.5), &sq));
        assert!(!point_in_polygon(&Point2::new(-0.5, 0.5), &sq));
    }

    #[test]
    fn test_signed_area() {
        let mut sq = unit_square();
        assert_abs_diff_eq!(signed_area(&sq), 1.0);
        sq.reverse();
        assert_abs_diff_eq!(signed_area(&sq), -1.0);
    }

    #[test]
    fn test_segment_intersection() {
        let hit = segment_intersection(
            &Point2::new(-1.0, 0.5),
            &Point2::new(3.0, 0.5),
            &Point2::new(1.0, 0.0),
            &Point2::new(1.0, 1.0),
        )
        .unwrap();
        assert_abs_diff_eq!(hit.0, 0.5);
        assert_abs_diff_eq!(hit.1, 0.5);
        assert!(segment_intersection(
            &Point2::new(0.0, 0.0),
            &Point2::new(1.0, 0.0),
            &Point2::new(0.0, 1.0),
            &Point2::new(1.0, 1.0),
        )
        .is_none());
    }

    #[test]
    fn test_distance_to_boundary() {
        assert_abs_diff_eq!(distance_to_boundary(&Point2::new(0.5, 0.25), &unit_square()), 0.25);
    }
}
