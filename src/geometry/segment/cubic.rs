use super::{casteljau, ClosestPointResult, ControlPolygon, HitInfo, Segment};
use crate::math::polynomial::{solve_linear, solve_quadratic};
use crate::math::{Point2, Rect, TOLERANCE};

/// A cubic Bezier curve with two control points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bezier {
    points: [Point2; 4],
}

impl Bezier {
    /// Creates a new cubic curve.
    #[must_use]
    pub fn new(sp: Point2, cp1: Point2, cp2: Point2, ep: Point2) -> Self {
        Self {
            points: [sp, cp1, cp2, ep],
        }
    }

    #[must_use]
    pub fn sp(&self) -> Point2 {
        self.points[0]
    }

    #[must_use]
    pub fn cp1(&self) -> Point2 {
        self.points[1]
    }

    #[must_use]
    pub fn cp2(&self) -> Point2 {
        self.points[2]
    }

    #[must_use]
    pub fn ep(&self) -> Point2 {
        self.points[3]
    }

    pub(crate) fn points_mut(&mut self) -> &mut [Point2] {
        &mut self.points
    }

    /// Evaluates the curve at `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        casteljau::evaluate(&self.points, t)
    }

    /// Splits the curve at `t`; `left.point_at(1) == right.point_at(0) == point_at(t)`.
    #[must_use]
    pub fn subdivide_at(&self, t: f64) -> (Bezier, Bezier) {
        let (a, b) = casteljau::split(&self.points, t);
        (Bezier { points: a }, Bezier { points: b })
    }

    /// Bisects the curve at `t = 0.5`.
    #[must_use]
    pub fn subdivide(&self) -> (Bezier, Bezier) {
        self.subdivide_at(0.5)
    }

    /// Returns the part of the curve between `t0` and `t1`.
    #[must_use]
    pub fn subsegment(&self, t0: f64, t1: f64) -> Bezier {
        Bezier {
            points: casteljau::subsection(&self.points, t0, t1),
        }
    }

    /// Finds the closest point on the curve to `p` by flatness-bounded
    /// recursive bisection.
    #[must_use]
    pub fn closest_point(&self, p: &Point2) -> ClosestPointResult {
        casteljau::closest_point(&self.points, p)
    }

    #[must_use]
    pub fn distance_to_point(&self, p: &Point2) -> f64 {
        self.closest_point(p).distance
    }

    /// Parameters in `(0, 1)` where the curve reaches an extremum in x or y.
    ///
    /// The derivative is quadratic in `t`; a vanishing leading coefficient
    /// falls back to the linear solve.
    #[must_use]
    pub fn extremities(&self) -> Vec<f64> {
        let [p0, p1, p2, p3] = self.points;
        let mut ts = Vec::with_capacity(4);
        for axis in 0..2 {
            let a = 3.0 * (-p0[axis] + 3.0 * p1[axis] - 3.0 * p2[axis] + p3[axis]);
            let b = 6.0 * (p0[axis] - 2.0 * p1[axis] + p2[axis]);
            let c = 3.0 * (p1[axis] - p0[axis]);
            let roots = if a.abs() < TOLERANCE {
                solve_linear(b, c).into_iter().collect()
            } else {
                solve_quadratic(a, b, c)
            };
            ts.extend(roots.into_iter().filter(|t| *t > 0.0 && *t < 1.0));
        }
        ts
    }

    /// Exact bounds from the endpoints and the derivative roots.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        self.extremities()
            .into_iter()
            .fold(Rect::new(self.sp(), self.ep()), |rect, t| {
                rect.including(&self.point_at(t))
            })
    }

    /// Returns `s(t)`, the arc length from the start to parameter `t`.
    pub fn arc_length_function(&self) -> impl Fn(f64) -> f64 {
        let cubic = *self;
        move |t| cubic.arc_length_to(t)
    }

    /// Returns `t(s)`, the parameter at which the arc length reaches `s`.
    pub fn inverse_arc_length_function(&self) -> impl Fn(f64) -> f64 {
        let cubic = *self;
        move |s| cubic.parameter_at_length(s)
    }

    /// Returns the first crossing between this curve and `other`.
    ///
    /// Flat curves are tested as their chord; otherwise the head and tail
    /// halves are tested recursively and the hit nearest the start wins.
    #[must_use]
    pub fn hit_test(&self, other: &Segment) -> Option<HitInfo> {
        Segment::Cubic(*self).hit_test(other)
    }

    pub(crate) fn flatten(&self, tolerance: f64, out: &mut Vec<Point2>) {
        casteljau::flatten(&self.points, tolerance, out);
    }
}

impl ControlPolygon for Bezier {
    fn control_points(&self) -> &[Point2] {
        &self.points
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn random_cubic_in(rng: &mut StdRng, extent: f64) -> Bezier {
        let mut pt = || p(rng.gen_range(-extent..extent), rng.gen_range(-extent..extent));
        Bezier::new(pt(), pt(), pt(), pt())
    }

    fn random_cubic(rng: &mut StdRng) -> Bezier {
        random_cubic_in(rng, 100.0)
    }

    #[test]
    fn subdivision_round_trip() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let curve = random_cubic(&mut rng);
            let t = rng.gen_range(0.01..0.99);
            let (left, right) = curve.subdivide_at(t);
            let expected = curve.point_at(t);
            assert_abs_diff_eq!(left.point_at(1.0), expected, epsilon = 1e-9);
            assert_abs_diff_eq!(right.point_at(0.0), expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn bounding_box_contains_sampled_points() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let curve = random_cubic(&mut rng);
            let rect = curve.bounding_box();
            for i in 0..=1000 {
                let t = f64::from(i) * 0.001;
                let pt = curve.point_at(t);
                assert!(rect.contains(&pt, 1e-9), "{pt:?} outside {rect:?} for {curve:?}");
            }
        }
    }

    #[test]
    fn bounding_box_of_symmetric_arch() {
        let curve = Bezier::new(p(0.0, 0.0), p(0.0, 4.0), p(4.0, 4.0), p(4.0, 0.0));
        let rect = curve.bounding_box();
        assert_abs_diff_eq!(rect.min, p(0.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(rect.max, p(4.0, 3.0), epsilon = 1e-12);
    }

    #[test]
    fn distance_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50 {
            let curve = random_cubic_in(&mut rng, 10.0);
            let query = p(rng.gen_range(-12.0..12.0), rng.gen_range(-12.0..12.0));
            let brute = (0..=10_000)
                .map(|i| (curve.point_at(f64::from(i) / 10_000.0) - query).norm())
                .fold(f64::INFINITY, f64::min);
            let d = curve.distance_to_point(&query);
            assert!((d - brute).abs() < 1e-3, "d={d} brute={brute}");
        }
    }

    #[test]
    fn closest_point_reports_parameter() {
        let curve = Bezier::new(p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(3.0, 0.0));
        let result = curve.closest_point(&p(1.5, 2.0));
        assert_abs_diff_eq!(result.parameter, 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(result.distance, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn degenerate_curve_distance() {
        let curve = Bezier::new(p(1.0, 1.0), p(1.0, 1.0), p(1.0, 1.0), p(1.0, 1.0));
        assert_abs_diff_eq!(curve.distance_to_point(&p(4.0, 5.0)), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn arc_length_of_straight_cubic() {
        let curve = Bezier::new(p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(3.0, 0.0));
        assert_abs_diff_eq!(curve.arc_length(), 3.0, epsilon = 1e-8);
        let inverse = curve.inverse_arc_length_function();
        assert_abs_diff_eq!(inverse(1.5), 0.5, epsilon = 1e-6);
    }
}
