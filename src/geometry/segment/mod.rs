mod casteljau;
mod cubic;
mod hit;
mod line;
mod quadratic;

pub use cubic::Bezier;
pub use hit::HitInfo;
pub use line::Line;
pub use quadratic::Quadratic;

use crate::error::{PathError, Result};
use crate::math::{try_normalize, Affine2, Point2, Rect, Vector2};

/// Curves whose control points are within this distance of their chord are
/// treated as lines when measuring distance.
pub const FLATNESS_TOLERANCE: f64 = 0.25;

/// Curves whose control points are within this distance of their chord are
/// treated as lines when hit testing.
pub const HIT_FLATNESS_TOLERANCE: f64 = 0.255;

/// Maximum bisection depth of recursive distance, hit and flattening queries.
pub const MAX_SUBDIVISION_DEPTH: u32 = 24;

/// Result of a closest point query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPointResult {
    /// The closest point on the segment.
    pub point: Point2,
    /// The parameter value at the closest point.
    pub parameter: f64,
    /// The distance from the query point to the closest point.
    pub distance: f64,
}

impl ClosestPointResult {
    fn new(point: Point2, parameter: f64, query: &Point2) -> Self {
        Self {
            point,
            parameter,
            distance: (query - point).norm(),
        }
    }
}

/// Uniform view over the control points of a line, quadratic or cubic.
///
/// Degree-generic algorithms (tangents, bounds, flatness, arc length) are
/// provided on top of [`ControlPolygon::control_points`].
pub trait ControlPolygon {
    /// Returns the control points: 2 for a line, 3 for a quadratic, 4 for a cubic.
    fn control_points(&self) -> &[Point2];

    /// Returns the number of control points.
    fn point_count(&self) -> usize {
        self.control_points().len()
    }

    /// Returns the control point at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::IndexOutOfBounds`] if `index >= point_count()`.
    fn control_point(&self, index: usize) -> Result<Point2> {
        let points = self.control_points();
        points.get(index).copied().ok_or_else(|| {
            PathError::IndexOutOfBounds {
                kind: "control point",
                index,
                len: points.len(),
            }
            .into()
        })
    }

    /// Start point (`t = 0`).
    fn start(&self) -> Point2 {
        self.control_points()[0]
    }

    /// End point (`t = 1`).
    fn end(&self) -> Point2 {
        let points = self.control_points();
        points[points.len() - 1]
    }

    /// Tangent direction at `t`, robust to coincident control points at the ends.
    fn tangent_at(&self, t: f64) -> Vector2 {
        casteljau::tangent_at(self.control_points(), t)
    }

    /// Unit tangent at `t`, or `None` for a degenerate segment.
    fn unit_tangent_at(&self, t: f64) -> Option<Vector2> {
        try_normalize(&self.tangent_at(t))
    }

    /// First derivative `dC/dt` at `t`.
    fn derivative_at(&self, t: f64) -> Vector2 {
        casteljau::derivative(self.control_points(), t)
    }

    /// Second derivative at `t`.
    fn second_derivative_at(&self, t: f64) -> Vector2 {
        casteljau::second_derivative(self.control_points(), t)
    }

    /// Bounding box of the control points.
    fn control_bounds(&self) -> Rect {
        casteljau::control_bounds(self.control_points())
    }

    /// Returns `true` if all control points lie within `tolerance` of the chord.
    fn is_flat(&self, tolerance: f64) -> bool {
        casteljau::is_flat(self.control_points(), tolerance)
    }

    /// Arc length from the start to parameter `t`.
    fn arc_length_to(&self, t: f64) -> f64 {
        casteljau::arc_length(self.control_points(), 0.0..t.clamp(0.0, 1.0))
    }

    /// Total arc length.
    fn arc_length(&self) -> f64 {
        self.arc_length_to(1.0)
    }

    /// Parameter at which the arc length from the start equals `length`.
    fn parameter_at_length(&self, length: f64) -> f64 {
        casteljau::parameter_at_length(self.control_points(), length)
    }
}

/// A single path segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line(Line),
    Quadratic(Quadratic),
    Cubic(Bezier),
}

impl ControlPolygon for Segment {
    fn control_points(&self) -> &[Point2] {
        match self {
            Segment::Line(line) => line.control_points(),
            Segment::Quadratic(quad) => quad.control_points(),
            Segment::Cubic(cubic) => cubic.control_points(),
        }
    }
}

impl Segment {
    /// Evaluates the segment at `t`.
    #[must_use]
    pub fn point_at(&self, t: f64) -> Point2 {
        match self {
            Segment::Line(line) => line.point_at(t),
            Segment::Quadratic(quad) => quad.point_at(t),
            Segment::Cubic(cubic) => cubic.point_at(t),
        }
    }

    /// Finds the closest point on the segment to `p`.
    #[must_use]
    pub fn closest_point(&self, p: &Point2) -> ClosestPointResult {
        match self {
            Segment::Line(line) => line.closest_point(p),
            Segment::Quadratic(quad) => quad.closest_point(p),
            Segment::Cubic(cubic) => cubic.closest_point(p),
        }
    }

    /// Distance from `p` to the segment.
    #[must_use]
    pub fn distance_to_point(&self, p: &Point2) -> f64 {
        self.closest_point(p).distance
    }

    /// Exact axis-aligned bounds of the segment.
    #[must_use]
    pub fn bounding_box(&self) -> Rect {
        match self {
            Segment::Line(line) => line.bounding_box(),
            Segment::Quadratic(quad) => quad.bounding_box(),
            Segment::Cubic(cubic) => cubic.bounding_box(),
        }
    }

    /// Splits the segment at `t` into two segments of the same kind.
    #[must_use]
    pub fn split_at(&self, t: f64) -> (Segment, Segment) {
        match self {
            Segment::Line(line) => {
                let (a, b) = line.split_at(t);
                (Segment::Line(a), Segment::Line(b))
            }
            Segment::Quadratic(quad) => {
                let (a, b) = quad.split_at(t);
                (Segment::Quadratic(a), Segment::Quadratic(b))
            }
            Segment::Cubic(cubic) => {
                let (a, b) = cubic.subdivide_at(t);
                (Segment::Cubic(a), Segment::Cubic(b))
            }
        }
    }

    /// Returns the part of the segment between `t0` and `t1`.
    #[must_use]
    pub fn subsegment(&self, t0: f64, t1: f64) -> Segment {
        match self {
            Segment::Line(line) => Segment::Line(line.subsegment(t0, t1)),
            Segment::Quadratic(quad) => Segment::Quadratic(quad.subsegment(t0, t1)),
            Segment::Cubic(cubic) => Segment::Cubic(cubic.subsegment(t0, t1)),
        }
    }

    /// Keeps the part of the segment before `t`.
    #[must_use]
    pub fn trimmed_end(&self, t: f64) -> Segment {
        self.subsegment(0.0, t)
    }

    /// Keeps the part of the segment after `t`.
    #[must_use]
    pub fn trimmed_start(&self, t: f64) -> Segment {
        self.subsegment(t, 1.0)
    }

    /// Returns the segment traversed in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Segment {
        self.map_points(|points| points.reverse())
    }

    /// Returns the segment moved by `offset`.
    #[must_use]
    pub fn translated(&self, offset: &Vector2) -> Segment {
        self.map_points(|points| points.iter_mut().for_each(|p| *p += *offset))
    }

    /// Returns the segment with every control point transformed.
    #[must_use]
    pub fn transformed(&self, transform: &Affine2) -> Segment {
        self.map_points(|points| {
            points
                .iter_mut()
                .for_each(|p| *p = transform.transform_point(p));
        })
    }

    fn map_points<F>(&self, f: F) -> Segment
    where
        F: FnOnce(&mut [Point2]),
    {
        let mut segment = *self;
        f(segment.points_mut());
        segment
    }

    fn points_mut(&mut self) -> &mut [Point2] {
        match self {
            Segment::Line(line) => line.points_mut(),
            Segment::Quadratic(quad) => quad.points_mut(),
            Segment::Cubic(cubic) => cubic.points_mut(),
        }
    }

    /// Moves the start point, leaving the control points in place.
    pub fn set_start(&mut self, p: Point2) {
        self.points_mut()[0] = p;
    }

    /// Moves the end point, leaving the control points in place.
    pub fn set_end(&mut self, p: Point2) {
        let points = self.points_mut();
        points[points.len() - 1] = p;
    }

    /// Appends a polyline approximation to `out`, excluding the start point.
    pub fn flatten(&self, tolerance: f64, out: &mut Vec<Point2>) {
        match self {
            Segment::Line(line) => out.push(line.ep()),
            Segment::Quadratic(quad) => quad.flatten(tolerance, out),
            Segment::Cubic(cubic) => cubic.flatten(tolerance, out),
        }
    }

    /// Returns the first crossing between this segment and `other`.
    ///
    /// `r` is the parameter on `self`, `s` the parameter on `other`.
    #[must_use]
    pub fn hit_test(&self, other: &Segment) -> Option<HitInfo> {
        hit::hit_test(self, other)
    }

    /// Returns `true` if every control point is within `tolerance` of the start.
    #[must_use]
    pub fn is_degenerate(&self, tolerance: f64) -> bool {
        let sp = self.start();
        self.control_points()
            .iter()
            .all(|p| (p - sp).norm() <= tolerance)
    }
}

impl From<Line> for Segment {
    fn from(line: Line) -> Self {
        Segment::Line(line)
    }
}

impl From<Quadratic> for Segment {
    fn from(quad: Quadratic) -> Self {
        Segment::Quadratic(quad)
    }
}

impl From<Bezier> for Segment {
    fn from(cubic: Bezier) -> Self {
        Segment::Cubic(cubic)
    }
}
