use tracing::debug;

use crate::geometry::segment::{ControlPolygon, Line, Segment};
use crate::math::intersect_2d::line_line_intersect_2d;
use crate::math::Point2;

/// Ends closer than this are considered connected.
const JOIN_TOLERANCE: f64 = 1e-9;

/// Crossings this close to the far ends of the pair are not trimmed to.
const TRIM_EPSILON: f64 = 1e-9;

/// Connects two consecutive offset segments meeting near `corner`.
///
/// Overlapping segments are trimmed to their crossing. Otherwise both are
/// extended along their end tangents to a miter point, unless it lies farther
/// than `miter_limit` from `corner`, in which case a bevel line is used.
/// Returns the connecting segments to insert between `prev` and `next`.
pub(super) fn connect(
    prev: &mut Segment,
    next: &mut Segment,
    corner: Point2,
    miter_limit: f64,
) -> Vec<Segment> {
    if (prev.end() - next.start()).norm() <= JOIN_TOLERANCE {
        next.set_start(prev.end());
        return Vec::new();
    }

    if let Some(hit) = prev.reversed().hit_test(next) {
        let r = 1.0 - hit.r;
        if r > TRIM_EPSILON && hit.s < 1.0 - TRIM_EPSILON {
            *prev = prev.trimmed_end(r);
            *next = next.trimmed_start(hit.s);
            next.set_start(prev.end());
            return Vec::new();
        }
    }

    let from = prev.end();
    let to = next.start();
    let bevel = vec![Segment::Line(Line::new(from, to))];

    let (Some(out_dir), Some(in_dir)) = (prev.unit_tangent_at(1.0), next.unit_tangent_at(0.0))
    else {
        return bevel;
    };
    let Some((a, b)) = line_line_intersect_2d(&from, &out_dir, &to, &in_dir) else {
        return bevel;
    };
    if a < 0.0 || b > 0.0 {
        return bevel;
    }

    let miter = from + out_dir * a;
    let reach = (miter - corner).norm();
    if reach > miter_limit {
        debug!(reach, miter_limit, "miter limit exceeded, using bevel join");
        return bevel;
    }

    [Line::new(from, miter), Line::new(miter, to)]
        .into_iter()
        .filter(|line| line.length() > JOIN_TOLERANCE)
        .map(Segment::Line)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Segment {
        Segment::Line(Line::new(Point2::new(x0, y0), Point2::new(x1, y1)))
    }

    #[test]
    fn overlapping_lines_are_trimmed() {
        let mut prev = line(0.0, 1.0, 10.0, 1.0);
        let mut next = line(9.0, 0.0, 9.0, 10.0);
        let connectors = connect(&mut prev, &mut next, Point2::new(10.0, 0.0), 4.0);
        assert!(connectors.is_empty());
        assert_abs_diff_eq!(prev.end(), Point2::new(9.0, 1.0), epsilon = 1e-12);
        assert_eq!(next.start(), prev.end());
    }

    #[test]
    fn gap_is_closed_with_miter() {
        let mut prev = line(0.0, -1.0, 10.0, -1.0);
        let mut next = line(11.0, 0.0, 11.0, 10.0);
        let connectors = connect(&mut prev, &mut next, Point2::new(10.0, 0.0), 4.0);
        assert_eq!(connectors.len(), 2);
        assert_abs_diff_eq!(connectors[0].end(), Point2::new(11.0, -1.0), epsilon = 1e-12);
        assert_eq!(connectors[1].end(), next.start());
    }

    #[test]
    fn long_miter_falls_back_to_bevel() {
        let mut prev = line(0.0, -1.0, 10.0, -1.0);
        let mut next = line(11.0, 0.0, 11.0, 10.0);
        let connectors = connect(&mut prev, &mut next, Point2::new(10.0, 0.0), 1.0);
        assert_eq!(connectors, vec![line(10.0, -1.0, 11.0, 0.0)]);
    }

    #[test]
    fn touching_ends_need_no_connector() {
        let mut prev = line(0.0, 0.0, 1.0, 0.0);
        let mut next = line(1.0, 0.0, 2.0, 1.0);
        assert!(connect(&mut prev, &mut next, Point2::new(1.0, 0.0), 4.0).is_empty());
    }
}
