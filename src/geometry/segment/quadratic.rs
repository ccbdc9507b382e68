use super::{casteljau, Bezier, ClosestPointResult, ControlPolygon, HitInfo, Segment};
use crate::math::{Point2, Rect, TOLERANCE};

/// A quadratic Bezier curve with one control point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadratic {
    points: [Point2; 3],
}

impl Quadratic {
    /// Creates a new quadratic curve.
    #[must_use]
    pub fn new(sp: Point2, cp1: Point2, ep: Point2) -> Self {
        Self {
            points: [sp, cp1, ep],
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
    pub fn ep(&self) -> Point2 {
        self.points[2]
    }

    pub(crate) fn points_mut(&mut self) -> &mut [Point2] {
        &mut self.points
    }

    /// Evaluates the curve at `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        casteljau::evaluate(&self.points, t)
    }

    /// Bisects the curve at `t = 0.5`; both halves share the midpoint.
    #[must_use]
    pub fn subdivide(&self) -> (Quadratic, Quadratic) {
        self.split_at(0.5)
    }

    /// Splits the curve at `t` using de Casteljau's construction.
    #[must_use]
    pub fn split_at(&self, t: f64) -> (Quadratic, Quadratic) {
        let (a, b) = casteljau::split(&self.points, t);
        (Quadratic { points: a }, Quadratic { points: b })
    }

    /// Returns the part of the curve between `t0` and `t1`.
    #[must_use]
    pub fn subsegment(&self, t0: f64, t1: f64) -> Quadratic {
        Quadratic {
            points: casteljau::subsection(&self.points, t0, t1),
        }
    }

    /// Finds the closest point on the curve to `p`.
    ///
    /// If the control point is within [`super::FLATNESS_TOLERANCE`] of the
    /// chord the curve is treated as a line, otherwise it is bisected and both
    /// halves are searched.
    #[must_use]
    pub fn closest_point(&self, p: &Point2) -> ClosestPointResult {
        casteljau::closest_point(&self.points, p)
    }

    #[must_use]
    pub fn distance_to_point(&self, p: &Point2) -> f64 {
        self.closest_point(p).distance
    }

    /// Exact bounds: the derivative is linear in `t`, so each axis has at
    /// most one interior extremum.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        let (sp, cp, ep) = (self.sp(), self.cp1(), self.ep());
        let mut rect = Rect::new(sp, ep);
        for axis in 0..2 {
            let a = sp[axis] - 2.0 * cp[axis] + ep[axis];
            if a.abs() < TOLERANCE {
                continue;
            }
            let t = (sp[axis] - cp[axis]) / a;
            if t > 0.0 && t < 1.0 {
                rect = rect.including(&self.point_at(t));
            }
        }
        rect
    }

    /// Returns `s(t)`, the arc length from the start to parameter `t`.
    pub fn arc_length_function(&self) -> impl Fn(f64) -> f64 {
        let quad = *self;
        move |t| quad.arc_length_to(t)
    }

    /// Returns `t(s)`, the parameter at which the arc length reaches `s`.
    pub fn inverse_arc_length_function(&self) -> impl Fn(f64) -> f64 {
        let quad = *self;
        move |s| quad.parameter_at_length(s)
    }

    /// Returns the exactly equivalent cubic curve.
    #[must_use]
    pub fn to_cubic(&self) -> Bezier {
        let (sp, cp, ep) = (self.sp(), self.cp1(), self.ep());
        Bezier::new(
            sp,
            sp + (cp - sp) * (2.0 / 3.0),
            ep + (cp - ep) * (2.0 / 3.0),
            ep,
        )
    }

    /// Returns the first crossing between this curve and `other`.
    #[must_use]
    pub fn hit_test(&self, other: &Segment) -> Option<HitInfo> {
        Segment::Quadratic(*self).hit_test(other)
    }

    pub(crate) fn flatten(&self, tolerance: f64, out: &mut Vec<Point2>) {
        casteljau::flatten(&self.points, tolerance, out);
    }
}

impl ControlPolygon for Quadratic {
    fn control_points(&self) -> &[Point2] {
        &self.points
    }
}
