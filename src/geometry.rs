//! Circle and line intersection primitives used to shape edges.

use serde::Serialize;

/// Extra clearance kept between an edge end and the node marker it points at.
pub const BOUNDARY_CLEARANCE: f64 = 8.0;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Intersections of the segment `a`-`b` with a circle, ordered from `a` towards `b`.
///
/// A tangent contact yields a single point.
pub fn circle_segment_intersections(a: Point, b: Point, center: Point, radius: f64) -> Vec<Point> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let qa = dx * dx + dy * dy;
    if qa < EPSILON || radius <= 0.0 {
        return Vec::new();
    }
    let fx = a.x - center.x;
    let fy = a.y - center.y;
    let qb = 2.0 * (fx * dx + fy * dy);
    let qc = fx * fx + fy * fy - radius * radius;
    let disc = qb * qb - 4.0 * qa * qc;
    if disc < 0.0 {
        return Vec::new();
    }

    let root = disc.sqrt();
    let mut params = vec![(-qb - root) / (2.0 * qa)];
    if root > EPSILON {
        params.push((-qb + root) / (2.0 * qa));
    }
    params
        .into_iter()
        .filter(|t| (-EPSILON..=1.0 + EPSILON).contains(t))
        .map(|t| Point::new(a.x + t * dx, a.y + t * dy))
        .collect()
}

/// Boundary intersections of two circles.
///
/// Returns `None` for coincident centers and for circles that are disjoint, nested or
/// only touching. Otherwise the first point lies to the right of the `c0`→`c1`
/// direction (y axis pointing down, as in SVG) and the second to the left.
pub fn circle_circle_intersections(c0: Point, r0: f64, c1: Point, r1: f64) -> Option<(Point, Point)> {
    let d = c0.distance(c1);
    if !d.is_finite() || d < EPSILON {
        return None;
    }
    if d >= r0 + r1 || d <= (r0 - r1).abs() {
        return None;
    }

    let a = (r0 * r0 - r1 * r1 + d * d) / (2.0 * d);
    let h = (r0 * r0 - a * a).max(0.0).sqrt();
    let ux = (c1.x - c0.x) / d;
    let uy = (c1.y - c0.y) / d;
    let mid = Point::new(c0.x + a * ux, c0.y + a * uy);

    Some((
        Point::new(mid.x - h * uy, mid.y + h * ux),
        Point::new(mid.x + h * uy, mid.y - h * ux),
    ))
}

/// Point where the segment from `line_start` to `line_end` first crosses the circle of
/// radius `node_radius + 8` around `line_end`.
///
/// Falls back to `line_end` when the segment never crosses the circle.
pub fn trim_to_boundary(line_start: Point, line_end: Point, node_radius: f64) -> Point {
    circle_segment_intersections(
        line_start,
        line_end,
        line_end,
        node_radius + BOUNDARY_CLEARANCE,
    )
    .into_iter()
    .next()
    .unwrap_or(line_end)
}

/// Control points for a curved edge: the crossings of two circles of radius
/// `curve_strength * |end - start|` centered on each endpoint.
///
/// Degenerate input (zero length edge, circles that do not cross) returns
/// `(start, end)`, which flattens the curve into a straight segment.
pub fn control_points_for(start: Point, end: Point, curve_strength: f64) -> (Point, Point) {
    let radius = curve_strength * start.distance(end);
    if !radius.is_finite() || radius <= 0.0 {
        return (start, end);
    }
    circle_circle_intersections(start, radius, end, radius).unwrap_or((start, end))
}
