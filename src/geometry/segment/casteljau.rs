//! Degree-generic control polygon routines shared by every segment kind.
//!
//! Everything here works on two to four control points; fixed-size arrays
//! use const generics, derivative helpers work on slices.

use tracing::debug;

use super::{ClosestPointResult, MAX_SUBDIVISION_DEPTH};
use crate::math::distance_2d::{point_to_segment_dist_sq, project_onto_segment};
use crate::math::integrate::{integrate, invert_monotonic};
use crate::math::{Point2, Rect, Vector2, TOLERANCE};

/// Largest control polygon handled by the slice-based helpers (a cubic).
pub(crate) const MAX_POINTS: usize = 4;

/// Newton iterations used to refine a flat leaf during nearest point search.
const NEAREST_NEWTON_ITERATIONS: usize = 8;

/// Absolute tolerance of arc-length quadrature.
const ARC_LENGTH_TOLERANCE: f64 = 1e-9;

fn lerp(a: &Point2, b: &Point2, t: f64) -> Point2 {
    a + (b - a) * t
}

/// Evaluates the curve defined by `points` at `t`.
pub(crate) fn evaluate<const N: usize>(points: &[Point2; N], t: f64) -> Point2 {
    let mut work = *points;
    for level in 1..N {
        for i in 0..N - level {
            work[i] = lerp(&work[i], &work[i + 1], t);
        }
    }
    work[0]
}

/// Splits the curve at `t`, returning the control polygons of both halves.
pub(crate) fn split<const N: usize>(points: &[Point2; N], t: f64) -> ([Point2; N], [Point2; N]) {
    let mut work = *points;
    let mut left = *points;
    let mut right = *points;
    for level in 1..N {
        for i in 0..N - level {
            work[i] = lerp(&work[i], &work[i + 1], t);
        }
        left[level] = work[0];
        right[N - 1 - level] = work[N - 1 - level];
    }
    (left, right)
}

/// Returns the control polygon of the part of the curve between `t0` and `t1`.
pub(crate) fn subsection<const N: usize>(points: &[Point2; N], t0: f64, t1: f64) -> [Point2; N] {
    if t1 <= t0 {
        let p = evaluate(points, t0);
        return [p; N];
    }
    let (_, tail) = split(points, t0);
    if t0 >= 1.0 {
        return tail;
    }
    let (head, _) = split(&tail, (t1 - t0) / (1.0 - t0));
    head
}

fn casteljau_vectors(work: &mut [Vector2], t: f64) -> Vector2 {
    let n = work.len();
    for level in 1..n {
        for i in 0..n - level {
            work[i] = work[i] + (work[i + 1] - work[i]) * t;
        }
    }
    work[0]
}

/// First derivative `dC/dt` at `t`, built from the first-level differences.
pub(crate) fn derivative(points: &[Point2], t: f64) -> Vector2 {
    let n = points.len();
    debug_assert!(n <= MAX_POINTS);
    if n < 2 {
        return Vector2::zeros();
    }
    #[allow(clippy::cast_precision_loss)]
    let degree = (n - 1) as f64;
    let mut work = [Vector2::zeros(); MAX_POINTS];
    for i in 0..n - 1 {
        work[i] = (points[i + 1] - points[i]) * degree;
    }
    casteljau_vectors(&mut work[..n - 1], t)
}

/// Second derivative `d²C/dt²` at `t`.
pub(crate) fn second_derivative(points: &[Point2], t: f64) -> Vector2 {
    let n = points.len();
    debug_assert!(n <= MAX_POINTS);
    if n < 3 {
        return Vector2::zeros();
    }
    #[allow(clippy::cast_precision_loss)]
    let scale = ((n - 1) * (n - 2)) as f64;
    let mut work = [Vector2::zeros(); MAX_POINTS];
    for i in 0..n - 2 {
        work[i] = (points[i + 2] - points[i + 1] * 2.0 + points[i].coords) * scale;
    }
    casteljau_vectors(&mut work[..n - 2], t)
}

/// Tangent direction (not normalized) at `t`.
///
/// At the ends the control polygon is walked until a point differs from the
/// endpoint, so coincident control points never produce a zero tangent. For
/// interior `t` the de Casteljau triangle is reduced to its last two points.
pub(crate) fn tangent_at(points: &[Point2], t: f64) -> Vector2 {
    let n = points.len();
    debug_assert!(n <= MAX_POINTS);
    if n < 2 {
        return Vector2::zeros();
    }
    let min_len_sq = TOLERANCE * TOLERANCE;

    if t <= 0.0 {
        let sp = points[0];
        return points[1..]
            .iter()
            .map(|p| p - sp)
            .find(|d| d.norm_squared() > min_len_sq)
            .unwrap_or_else(Vector2::zeros);
    }
    if t >= 1.0 {
        let ep = points[n - 1];
        return points[..n - 1]
            .iter()
            .rev()
            .map(|p| ep - p)
            .find(|d| d.norm_squared() > min_len_sq)
            .unwrap_or_else(Vector2::zeros);
    }

    let mut work = [Point2::origin(); MAX_POINTS];
    work[..n].copy_from_slice(points);
    for level in 1..n - 1 {
        for i in 0..n - level {
            work[i] = lerp(&work[i], &work[i + 1], t);
        }
    }
    work[1] - work[0]
}

/// Bounding box of the control polygon (contains the whole curve).
pub(crate) fn control_bounds(points: &[Point2]) -> Rect {
    points[1..]
        .iter()
        .fold(Rect::from_point(points[0]), |rect, p| rect.including(p))
}

/// Returns `true` if every interior control point lies within `tolerance`
/// of the chord joining the endpoints.
pub(crate) fn is_flat(points: &[Point2], tolerance: f64) -> bool {
    let n = points.len();
    if n <= 2 {
        return true;
    }
    let (sp, ep) = (&points[0], &points[n - 1]);
    let tol_sq = tolerance * tolerance;
    points[1..n - 1]
        .iter()
        .all(|cp| point_to_segment_dist_sq(cp, sp, ep) <= tol_sq)
}

/// Finds the point on the curve closest to `p` by recursive bisection.
///
/// Halves are pruned when their control bounds are further away than the
/// best candidate; flat halves (or halves at the depth limit) are resolved
/// against their chord and refined with a few Newton steps on the curve.
pub(crate) fn closest_point<const N: usize>(points: &[Point2; N], p: &Point2) -> ClosestPointResult {
    let start = ClosestPointResult::new(points[0], 0.0, p);
    let end = ClosestPointResult::new(points[N - 1], 1.0, p);
    let mut best = if end.distance < start.distance { end } else { start };
    nearest_recursive(points, p, 0.0, 1.0, 0, &mut best);
    best
}

fn nearest_recursive<const N: usize>(
    points: &[Point2; N],
    p: &Point2,
    t0: f64,
    t1: f64,
    depth: u32,
    best: &mut ClosestPointResult,
) {
    let bound = control_bounds(points).distance_squared_to_point(p);
    if bound >= best.distance * best.distance {
        return;
    }

    let at_limit = depth >= MAX_SUBDIVISION_DEPTH;
    if at_limit || is_flat(points, super::FLATNESS_TOLERANCE) {
        if at_limit {
            debug!(depth, "nearest point search reached subdivision limit");
        }
        let u = refine_nearest(points, p);
        let candidate = ClosestPointResult::new(evaluate(points, u), t0 + (t1 - t0) * u, p);
        if candidate.distance < best.distance {
            *best = candidate;
        }
        return;
    }

    let (head, tail) = split(points, 0.5);
    let tm = 0.5 * (t0 + t1);
    nearest_recursive(&head, p, t0, tm, depth + 1, best);
    nearest_recursive(&tail, p, tm, t1, depth + 1, best);
}

/// Starts from the chord projection and improves the parameter with Newton
/// iterations on `(C(u) - p) · C'(u) = 0`.
fn refine_nearest<const N: usize>(points: &[Point2; N], p: &Point2) -> f64 {
    let mut u = project_onto_segment(p, &points[0], &points[N - 1]);
    let mut best_u = u;
    let mut best_d2 = (evaluate(points, u) - p).norm_squared();

    for _ in 0..NEAREST_NEWTON_ITERATIONS {
        let offset = evaluate(points, u) - p;
        let d1 = derivative(points, u);
        let d2 = second_derivative(points, u);
        let numerator = offset.dot(&d1);
        let denominator = d1.dot(&d1) + offset.dot(&d2);
        if denominator.abs() < f64::EPSILON {
            break;
        }
        u = (u - numerator / denominator).clamp(0.0, 1.0);
        let dist_sq = (evaluate(points, u) - p).norm_squared();
        if dist_sq < best_d2 {
            best_d2 = dist_sq;
            best_u = u;
        }
    }

    for end in [0.0, 1.0] {
        let dist_sq = (evaluate(points, end) - p).norm_squared();
        if dist_sq < best_d2 {
            best_d2 = dist_sq;
            best_u = end;
        }
    }
    best_u
}

/// Appends a polyline approximation of the curve to `out`, excluding the
/// start point.
pub(crate) fn flatten<const N: usize>(points: &[Point2; N], tolerance: f64, out: &mut Vec<Point2>) {
    flatten_recursive(points, tolerance, 0, out);
}

fn flatten_recursive<const N: usize>(
    points: &[Point2; N],
    tolerance: f64,
    depth: u32,
    out: &mut Vec<Point2>,
) {
    if depth >= MAX_SUBDIVISION_DEPTH || is_flat(points, tolerance) {
        out.push(points[N - 1]);
        return;
    }
    let (head, tail) = split(points, 0.5);
    flatten_recursive(&head, tolerance, depth + 1, out);
    flatten_recursive(&tail, tolerance, depth + 1, out);
}

/// Arc length of the curve between parameters `range.start` and `range.end`.
pub(crate) fn arc_length(points: &[Point2], range: std::ops::Range<f64>) -> f64 {
    integrate(|t| derivative(points, t).norm(), range, ARC_LENGTH_TOLERANCE)
}

/// Parameter at which the arc length measured from the start equals `length`.
pub(crate) fn parameter_at_length(points: &[Point2], length: f64) -> f64 {
    invert_monotonic(
        |t| arc_length(points, 0.0..t),
        |t| derivative(points, t).norm(),
        length,
        0.0..1.0,
        ARC_LENGTH_TOLERANCE * 10.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn cubic() -> [Point2; 4] {
        [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 3.0),
            Point2::new(4.0, 3.0),
            Point2::new(5.0, 0.0),
        ]
    }

    #[test]
    fn split_halves_meet_at_curve_point() {
        let pts = cubic();
        for &t in &[0.1, 0.37, 0.5, 0.9] {
            let (left, right) = split(&pts, t);
            let expected = evaluate(&pts, t);
            assert_abs_diff_eq!(left[3], expected, epsilon = 1e-9);
            assert_abs_diff_eq!(right[0], expected, epsilon = 1e-9);
            assert_abs_diff_eq!(left[0], pts[0]);
            assert_abs_diff_eq!(right[3], pts[3]);
        }
    }

    #[test]
    fn subsection_matches_original_curve() {
        let pts = cubic();
        let sub = subsection(&pts, 0.2, 0.7);
        assert_abs_diff_eq!(evaluate(&sub, 0.0), evaluate(&pts, 0.2), epsilon = 1e-9);
        assert_abs_diff_eq!(evaluate(&sub, 1.0), evaluate(&pts, 0.7), epsilon = 1e-9);
        assert_abs_diff_eq!(evaluate(&sub, 0.5), evaluate(&pts, 0.45), epsilon = 1e-9);
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let pts = cubic();
        let h = 1e-6;
        let t = 0.3;
        let fd = (evaluate(&pts, t + h) - evaluate(&pts, t - h)) / (2.0 * h);
        assert_abs_diff_eq!(derivative(&pts, t), fd, epsilon = 1e-5);
    }

    #[test]
    fn tangent_skips_coincident_control_points() {
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(3.0, 0.0),
        ];
        let t0 = tangent_at(&pts, 0.0);
        assert_abs_diff_eq!(t0, Vector2::new(2.0, 1.0));
        let pts = [
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(3.0, 0.0),
            Point2::new(3.0, 0.0),
        ];
        let t1 = tangent_at(&pts, 1.0);
        assert_abs_diff_eq!(t1, Vector2::new(2.0, -1.0));
    }

    #[test]
    fn interior_tangent_is_parallel_to_derivative() {
        let pts = cubic();
        let tangent = tangent_at(&pts, 0.4);
        let d = derivative(&pts, 0.4);
        assert_abs_diff_eq!(tangent.x * d.y - tangent.y * d.x, 0.0, epsilon = 1e-9);
        assert!(tangent.dot(&d) > 0.0);
    }

    #[test]
    fn straight_arc_length() {
        let pts = [Point2::new(0.0, 0.0), Point2::new(3.0, 4.0)];
        assert_abs_diff_eq!(arc_length(&pts, 0.0..1.0), 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(parameter_at_length(&pts, 2.5), 0.5, epsilon = 1e-6);
    }

    #[test]
    fn flatten_ends_at_curve_end() {
        let pts = cubic();
        let mut out = Vec::new();
        flatten(&pts, 0.01, &mut out);
        assert!(out.len() > 4);
        assert_abs_diff_eq!(*out.last().unwrap_or(&Point2::origin()), pts[3]);
    }
}
