use super::{casteljau, ClosestPointResult, ControlPolygon, HitInfo, Segment};
use crate::math::distance_2d::{point_to_segment_dist_sq, project_onto_segment};
use crate::math::intersect_2d::segment_segment_intersect_2d;
use crate::math::{left_normal, try_normalize, Point2, Rect, Vector2};

/// A straight segment from `sp` to `ep`.
///
/// The parametric form is: `P(t) = sp + t * (ep - sp)`, `t ∈ [0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    points: [Point2; 2],
}

impl Line {
    /// Creates a new line segment.
    #[must_use]
    pub fn new(sp: Point2, ep: Point2) -> Self {
        Self { points: [sp, ep] }
    }

    /// Returns the start point.
    #[must_use]
    pub fn sp(&self) -> Point2 {
        self.points[0]
    }

    /// Returns the end point.
    #[must_use]
    pub fn ep(&self) -> Point2 {
        self.points[1]
    }

    pub(crate) fn points_mut(&mut self) -> &mut [Point2] {
        &mut self.points
    }

    /// Returns `ep - sp`.
    #[must_use]
    pub fn direction(&self) -> Vector2 {
        self.ep() - self.sp()
    }

    /// Returns the length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.direction().norm()
    }

    /// Returns the unit normal pointing to the left of the walking direction,
    /// or `None` for a zero-length segment.
    #[must_use]
    pub fn unit_normal(&self) -> Option<Vector2> {
        try_normalize(&self.direction()).map(|dir| left_normal(&dir))
    }

    /// Linear interpolation between the endpoints.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        self.sp() + self.direction() * t
    }

    /// Squared distance from `p` to the closest point of the segment.
    ///
    /// The projection parameter is clamped to `[0, 1]`.
    #[must_use]
    pub fn distance_squared_to_point(&self, p: &Point2) -> f64 {
        point_to_segment_dist_sq(p, &self.sp(), &self.ep())
    }

    /// Distance from `p` to the closest point of the segment.
    #[must_use]
    pub fn distance_to_point(&self, p: &Point2) -> f64 {
        self.distance_squared_to_point(p).sqrt()
    }

    /// Returns the closest point of the segment to `p`.
    #[must_use]
    pub fn closest_point(&self, p: &Point2) -> ClosestPointResult {
        let t = project_onto_segment(p, &self.sp(), &self.ep());
        ClosestPointResult::new(self.point_at(t), t, p)
    }

    /// Intersects two segments.
    ///
    /// Returns `None` if the lines are parallel or if either parameter falls
    /// outside `[0, 1]`.
    #[must_use]
    pub fn intersect(&self, other: &Line) -> Option<HitInfo> {
        segment_segment_intersect_2d(&self.sp(), &self.ep(), &other.sp(), &other.ep())
            .map(|(r, s)| HitInfo::new(r, s))
    }

    /// Returns the first crossing between this line and `other`.
    #[must_use]
    pub fn hit_test(&self, other: &Segment) -> Option<HitInfo> {
        Segment::Line(*self).hit_test(other)
    }

    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        Rect::new(self.sp(), self.ep())
    }

    /// Splits the line at `t`.
    #[must_use]
    pub fn split_at(&self, t: f64) -> (Line, Line) {
        let (a, b) = casteljau::split(&self.points, t);
        (Line { points: a }, Line { points: b })
    }

    /// Returns the part of the line between `t0` and `t1`.
    #[must_use]
    pub fn subsegment(&self, t0: f64, t1: f64) -> Line {
        Line::new(self.point_at(t0), self.point_at(t1))
    }

    #[must_use]
    pub fn reversed(&self) -> Line {
        Line::new(self.ep(), self.sp())
    }

    /// Returns the line moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: &Vector2) -> Line {
        Line::new(self.sp() + *offset, self.ep() + *offset)
    }
}

impl ControlPolygon for Line {
    fn control_points(&self) -> &[Point2] {
        &self.points
    }

    fn arc_length_to(&self, t: f64) -> f64 {
        self.length() * t.clamp(0.0, 1.0)
    }

    fn parameter_at_length(&self, length: f64) -> f64 {
        let total = self.length();
        if total <= 0.0 {
            0.0
        } else {
            (length / total).clamp(0.0, 1.0)
        }
    }
}
