use tracing::debug;

use super::{ControlPolygon, Line, Segment, HIT_FLATNESS_TOLERANCE, MAX_SUBDIVISION_DEPTH};
use crate::math::{cross_2d, TOLERANCE};

/// Newton iterations used to polish a hit found on flattened geometry.
const REFINE_ITERATIONS: usize = 12;

/// Where two segments cross.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitInfo {
    /// Parameter of the hit on the first segment, in `[0, 1]`.
    pub r: f64,
    /// Parameter of the hit on the second segment, in `[0, 1]`.
    pub s: f64,
    /// Number of crossings seen while searching (a hint, not an exact count).
    pub intersection_count_hint: usize,
    /// Index of the hit segment when testing against a path.
    pub segment_index: Option<usize>,
}

impl HitInfo {
    pub(crate) fn new(r: f64, s: f64) -> Self {
        Self {
            r,
            s,
            intersection_count_hint: 1,
            segment_index: None,
        }
    }

    /// Exchanges the roles of the two segments.
    #[must_use]
    pub fn swapped(self) -> Self {
        Self {
            r: self.s,
            s: self.r,
            ..self
        }
    }
}

/// Returns the crossing of `a` and `b` nearest the start of `a`.
pub(crate) fn hit_test(a: &Segment, b: &Segment) -> Option<HitInfo> {
    let hit = hit_recursive(a, b, 0)?;
    let (r, s) = refine(a, b, hit.r, hit.s);
    Some(HitInfo { r, s, ..hit })
}

fn hit_recursive(a: &Segment, b: &Segment, depth: u32) -> Option<HitInfo> {
    if !a
        .control_bounds()
        .intersects(&b.control_bounds(), HIT_FLATNESS_TOLERANCE)
    {
        return None;
    }

    match (a, b) {
        (Segment::Line(la), Segment::Line(lb)) => la.intersect(lb),
        (Segment::Line(_), _) => hit_recursive(b, a, depth).map(HitInfo::swapped),
        (curve, _) => {
            let at_limit = depth >= MAX_SUBDIVISION_DEPTH;
            if at_limit || curve.is_flat(HIT_FLATNESS_TOLERANCE) {
                if at_limit {
                    debug!(depth, "hit test reached subdivision limit");
                }
                // The chord parameter stands in for the curve parameter.
                let chord = Segment::Line(Line::new(curve.start(), curve.end()));
                return hit_recursive(&chord, b, depth + 1);
            }

            let (head, tail) = curve.split_at(0.5);
            let head_hit = hit_recursive(&head, b, depth + 1);
            let tail_hit = hit_recursive(&tail, b, depth + 1);
            match (head_hit, tail_hit) {
                (Some(head_hit), tail_hit) => Some(HitInfo {
                    r: head_hit.r * 0.5,
                    intersection_count_hint: head_hit.intersection_count_hint
                        + tail_hit.map_or(0, |hit| hit.intersection_count_hint),
                    ..head_hit
                }),
                (None, Some(tail_hit)) => Some(HitInfo {
                    r: 0.5 + tail_hit.r * 0.5,
                    ..tail_hit
                }),
                (None, None) => None,
            }
        }
    }
}

/// Polishes `(r, s)` with Newton iterations on `a(r) - b(s) = 0`.
///
/// The refined parameters are only kept if they stay in range and reduce the
/// distance between the two points.
fn refine(a: &Segment, b: &Segment, r: f64, s: f64) -> (f64, f64) {
    if matches!((a, b), (Segment::Line(_), Segment::Line(_))) {
        return (r, s);
    }

    let residual = |r: f64, s: f64| (a.point_at(r) - b.point_at(s)).norm_squared();
    let (mut best_r, mut best_s) = (r, s);
    let mut best = residual(r, s);
    let (mut r, mut s) = (r, s);

    for _ in 0..REFINE_ITERATIONS {
        if best < TOLERANCE * TOLERANCE {
            break;
        }
        let f = a.point_at(r) - b.point_at(s);
        let da = a.derivative_at(r);
        let db = -b.derivative_at(s);
        let det = cross_2d(&da, &db);
        if det.abs() < f64::EPSILON {
            break;
        }
        // Cramer's rule for [da db] * [dr ds]^T = -f.
        let dr = -cross_2d(&f, &db) / det;
        let ds = -cross_2d(&da, &f) / det;
        r = (r + dr).clamp(0.0, 1.0);
        s = (s + ds).clamp(0.0, 1.0);
        let value = residual(r, s);
        if value < best {
            best = value;
            best_r = r;
            best_s = s;
        }
    }
    (best_r, best_s)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::segment::{Bezier, Quadratic};
    use crate::math::Point2;
    use approx::assert_abs_diff_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn arch() -> Segment {
        Segment::Cubic(Bezier::new(
            p(0.0, 0.0),
            p(0.0, 10.0),
            p(10.0, 10.0),
            p(10.0, 0.0),
        ))
    }

    #[test]
    fn line_and_curve_agree_on_crossing_point() {
        let curve = arch();
        let line = Segment::Line(Line::new(p(-2.0, 3.0), p(4.0, 6.0)));

        let from_line = line.hit_test(&curve).unwrap();
        let from_curve = curve.hit_test(&line).unwrap();

        let a = line.point_at(from_line.r);
        let b = curve.point_at(from_curve.r);
        assert_abs_diff_eq!(a, b, epsilon = 1e-6);
        assert_abs_diff_eq!(curve.point_at(from_line.s), a, epsilon = 1e-6);
        assert_abs_diff_eq!(line.point_at(from_curve.s), b, epsilon = 1e-6);
    }

    #[test]
    fn picks_hit_nearest_start() {
        let curve = arch();
        // Horizontal line crossing both legs of the arch.
        let line = Segment::Line(Line::new(p(-5.0, 3.0), p(15.0, 3.0)));
        let hit = curve.hit_test(&line).unwrap();
        assert!(hit.r < 0.5, "r={}", hit.r);
        assert!(hit.intersection_count_hint >= 2);
        assert_abs_diff_eq!(curve.point_at(hit.r).y, 3.0, epsilon = 1e-6);
    }

    #[test]
    fn curve_curve_crossing() {
        let a = arch();
        let b = Segment::Quadratic(Quadratic::new(p(0.0, 8.0), p(5.0, -4.0), p(10.0, 8.0)));
        let hit = a.hit_test(&b).unwrap();
        assert_abs_diff_eq!(a.point_at(hit.r), b.point_at(hit.s), epsilon = 1e-6);
    }

    #[test]
    fn disjoint_segments_do_not_hit() {
        let a = arch();
        let line = Segment::Line(Line::new(p(20.0, 0.0), p(30.0, 10.0)));
        assert!(a.hit_test(&line).is_none());
        let above = Segment::Line(Line::new(p(-5.0, 20.0), p(15.0, 20.0)));
        assert!(a.hit_test(&above).is_none());
    }

    #[test]
    fn swapped_exchanges_parameters() {
        let hit = HitInfo::new(0.25, 0.75).swapped();
        assert_abs_diff_eq!(hit.r, 0.75);
        assert_abs_diff_eq!(hit.s, 0.25);
    }
}
