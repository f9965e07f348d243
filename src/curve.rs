//! Non-rational B-spline evaluation for curved edges.

use crate::geometry::{Point, control_points_for};

pub const CURVE_DEGREE: usize = 3;
pub const CURVE_SAMPLES: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct BSpline {
    degree: usize,
    control_points: Vec<Point>,
    knots: Vec<f64>,
}

impl BSpline {
    /// Builds a clamped spline with an open uniform knot vector.
    ///
    /// Returns `None` when there are not enough control points for the degree.
    pub fn new(degree: usize, control_points: Vec<Point>) -> Option<Self> {
        if degree == 0 || control_points.len() <= degree {
            return None;
        }
        let knots = open_uniform_knots(degree, control_points.len());
        Some(Self {
            degree,
            control_points,
            knots,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn control_points(&self) -> &[Point] {
        &self.control_points
    }

    /// Parameter range over which the curve is defined.
    pub fn domain(&self) -> (f64, f64) {
        (
            self.knots[self.degree],
            self.knots[self.control_points.len()],
        )
    }

    /// Evaluates the curve at `u` with de Boor's algorithm. `u` is clamped to the domain.
    pub fn evaluate(&self, u: f64) -> Point {
        let (lo, hi) = self.domain();
        let u = u.clamp(lo, hi);
        let p = self.degree;
        let span = self.find_span(u);

        let mut d: Vec<Point> = (0..=p)
            .map(|j| self.control_points[j + span - p])
            .collect();
        for r in 1..=p {
            for j in (r..=p).rev() {
                let i = j + span - p;
                let denom = self.knots[i + p + 1 - r] - self.knots[i];
                let alpha = if denom.abs() < f64::EPSILON {
                    0.0
                } else {
                    (u - self.knots[i]) / denom
                };
                d[j] = Point::new(
                    (1.0 - alpha) * d[j - 1].x + alpha * d[j].x,
                    (1.0 - alpha) * d[j - 1].y + alpha * d[j].y,
                );
            }
        }
        d[p]
    }

    /// `count` evenly spaced evaluations across the domain, both ends included.
    pub fn sample(&self, count: usize) -> Vec<Point> {
        let (lo, hi) = self.domain();
        match count {
            0 => Vec::new(),
            1 => vec![self.evaluate(lo)],
            _ => {
                let step = (hi - lo) / (count - 1) as f64;
                (0..count)
                    .map(|i| {
                        let u = if i == count - 1 { hi } else { lo + step * i as f64 };
                        self.evaluate(u)
                    })
                    .collect()
            }
        }
    }

    fn find_span(&self, u: f64) -> usize {
        let n = self.control_points.len() - 1;
        if u >= self.knots[n + 1] {
            return n;
        }
        let mut span = self.degree;
        while span < n && u >= self.knots[span + 1] {
            span += 1;
        }
        span
    }
}

/// Clamped knot vector of length `count + degree + 1` with uniform interior spacing on
/// `[0, 1]`.
pub fn open_uniform_knots(degree: usize, count: usize) -> Vec<f64> {
    let total = count + degree + 1;
    let interior = count.saturating_sub(degree + 1);
    let mut knots = Vec::with_capacity(total);
    knots.extend(std::iter::repeat_n(0.0, degree + 1));
    for i in 1..=interior {
        knots.push(i as f64 / (interior + 1) as f64);
    }
    knots.extend(std::iter::repeat_n(1.0, total - knots.len()));
    knots
}

/// Samples the cubic edge curve `[start, c1, c2, end]` into a polyline.
pub fn sample_curve(start: Point, c1: Point, c2: Point, end: Point) -> Vec<Point> {
    match BSpline::new(CURVE_DEGREE, vec![start, c1, c2, end]) {
        Some(spline) => spline.sample(CURVE_SAMPLES),
        None => vec![start, end],
    }
}

/// Polyline for a curved edge between two node centers.
pub fn curved_edge(start: Point, end: Point, curve_strength: f64) -> Vec<Point> {
    let (c1, c2) = control_points_for(start, end, curve_strength);
    sample_curve(start, c1, c2, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knot_vector_is_clamped() {
        assert_eq!(
            open_uniform_knots(3, 4),
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0]
        );
        let knots = open_uniform_knots(3, 6);
        assert_eq!(knots.len(), 10);
        assert_eq!(&knots[4..6], &[1.0 / 3.0, 2.0 / 3.0]);
    }

    #[test]
    fn spline_interpolates_end_points() {
        let pts = curved_edge(Point::new(0.0, 0.0), Point::new(100.0, 40.0), 0.6);
        assert_eq!(pts.len(), CURVE_SAMPLES);
        assert_eq!(pts[0], Point::new(0.0, 0.0));
        assert_eq!(pts[CURVE_SAMPLES - 1], Point::new(100.0, 40.0));
    }

    #[test]
    fn cubic_with_four_points_matches_bezier() {
        let ctrl = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 20.0),
            Point::new(30.0, 20.0),
            Point::new(40.0, 0.0),
        ];
        let spline = BSpline::new(3, ctrl.to_vec()).expect("valid spline");
        let mid = spline.evaluate(0.5);
        // Bernstein weights at t = 0.5: 1/8, 3/8, 3/8, 1/8.
        assert!((mid.x - 20.0).abs() < 1e-9);
        assert!((mid.y - 15.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_control_points_give_straight_samples() {
        let start = Point::new(0.0, 0.0);
        let end = Point::new(10.0, 0.0);
        let pts = sample_curve(start, start, end, end);
        assert!(pts.iter().all(|p| p.y.abs() < 1e-12));
        assert!(pts.windows(2).all(|w| w[0].x <= w[1].x));
    }

    #[test]
    fn rejects_too_few_points() {
        assert!(BSpline::new(3, vec![Point::default(); 3]).is_none());
    }
}
