mod edit;
mod iter;
mod query;

pub use iter::{PathIter, PathRecord};
pub use query::{Subpath, CONTAINS_FLATTEN_TOLERANCE};

use std::cell::OnceCell;
use std::ops::Range;

use crate::error::{PathError, Result};
use crate::geometry::segment::{ControlPolygon, Segment};
use crate::math::{Point2, Rect, Vector2, TOLERANCE};

/// Kind of a path element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum PathElement {
    MoveTo,
    LineTo,
    QuadTo,
    CurveTo,
    Close,
}

impl PathElement {
    /// Number of points the element consumes from the point buffer.
    #[must_use]
    pub const fn point_count(self) -> usize {
        match self {
            PathElement::MoveTo | PathElement::LineTo => 1,
            PathElement::QuadTo => 2,
            PathElement::CurveTo => 3,
            PathElement::Close => 0,
        }
    }

    /// Returns `true` for elements that draw a segment.
    #[must_use]
    pub const fn is_drawing(self) -> bool {
        matches!(
            self,
            PathElement::LineTo | PathElement::QuadTo | PathElement::CurveTo
        )
    }
}

/// Rule deciding which points are inside a self-intersecting path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub enum WindingRule {
    #[default]
    NonZero,
    EvenOdd,
}

/// An ordered sequence of elements over a flat point buffer.
///
/// Each element consumes a fixed number of points, so the points of element
/// `i` start at the sum of the point counts of the elements before it. The
/// bounding box is cached and recomputed lazily after any mutation.
///
/// A path is not thread-safe: the cache uses a [`OnceCell`].
#[derive(Debug, Clone, Default)]
pub struct Path {
    elements: Vec<PathElement>,
    points: Vec<Point2>,
    winding_rule: WindingRule,
    bounds: OnceCell<Option<Rect>>,
}

/// Element ranges of one subpath, as stored in the buffer.
#[derive(Debug, Clone)]
struct RawSubpath {
    start: Point2,
    /// Index of the opening `MoveTo`, if the subpath has one.
    move_index: Option<usize>,
    /// Drawing elements with their indices and point ranges.
    elements: Vec<(usize, PathElement, Range<usize>)>,
    closed: bool,
}

impl Path {
    /// Creates a new, empty path with the non-zero winding rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new, empty path with the given winding rule.
    #[must_use]
    pub fn with_winding_rule(winding_rule: WindingRule) -> Self {
        Self {
            winding_rule,
            ..Self::default()
        }
    }

    /// Builds a path from consecutive segments.
    ///
    /// A new subpath is started whenever a segment does not begin at the end
    /// of the previous one.
    #[must_use]
    pub fn from_segments(segments: &[Segment]) -> Self {
        let mut path = Self::new();
        for segment in segments {
            path.append_segment(segment);
        }
        path
    }

    /// Appends a segment, inserting a `MoveTo` if it does not start at the
    /// current point.
    pub fn append_segment(&mut self, segment: &Segment) {
        let connected = self
            .current_point()
            .is_some_and(|current| (current - segment.start()).norm() <= TOLERANCE);
        if !connected {
            self.push(PathElement::MoveTo, &[segment.start()]);
        }
        let points = &segment.control_points()[1..];
        let element = match segment {
            Segment::Line(_) => PathElement::LineTo,
            Segment::Quadratic(_) => PathElement::QuadTo,
            Segment::Cubic(_) => PathElement::CurveTo,
        };
        self.push(element, points);
    }

    fn push(&mut self, element: PathElement, points: &[Point2]) {
        debug_assert_eq!(element.point_count(), points.len());
        self.elements.push(element);
        self.points.extend_from_slice(points);
        self.invalidate();
    }

    pub(crate) fn invalidate(&mut self) {
        self.bounds.take();
    }

    fn require_current_point(&self) -> Result<Point2> {
        self.current_point()
            .ok_or_else(|| PathError::NoCurrentPoint.into())
    }

    /// Starts a new subpath at `p`.
    pub fn move_to(&mut self, p: Point2) {
        self.push(PathElement::MoveTo, &[p]);
    }

    /// Adds a line from the current point to `p`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NoCurrentPoint`] on an empty path.
    pub fn line_to(&mut self, p: Point2) -> Result<()> {
        self.require_current_point()?;
        self.push(PathElement::LineTo, &[p]);
        Ok(())
    }

    /// Adds a quadratic curve from the current point to `p`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NoCurrentPoint`] on an empty path.
    pub fn quad_to(&mut self, cp: Point2, p: Point2) -> Result<()> {
        self.require_current_point()?;
        self.push(PathElement::QuadTo, &[cp, p]);
        Ok(())
    }

    /// Adds a cubic curve from the current point to `p`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NoCurrentPoint`] on an empty path.
    pub fn curve_to(&mut self, cp1: Point2, cp2: Point2, p: Point2) -> Result<()> {
        self.require_current_point()?;
        self.push(PathElement::CurveTo, &[cp1, cp2, p]);
        Ok(())
    }

    /// Closes the current subpath. Does nothing on an empty or already
    /// closed path.
    pub fn close_path(&mut self) {
        if matches!(self.elements.last(), None | Some(PathElement::Close)) {
            return;
        }
        self.push(PathElement::Close, &[]);
    }

    /// Starts a new subpath at the current point (or the origin) plus `d`.
    pub fn relative_move_to(&mut self, d: Vector2) {
        let base = self.current_point().unwrap_or_else(Point2::origin);
        self.move_to(base + d);
    }

    /// Adds a line to the current point plus `d`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NoCurrentPoint`] on an empty path.
    pub fn relative_line_to(&mut self, d: Vector2) -> Result<()> {
        let base = self.require_current_point()?;
        self.line_to(base + d)
    }

    /// Adds a quadratic curve with points relative to the current point.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NoCurrentPoint`] on an empty path.
    pub fn relative_quad_to(&mut self, dcp: Vector2, d: Vector2) -> Result<()> {
        let base = self.require_current_point()?;
        self.quad_to(base + dcp, base + d)
    }

    /// Adds a cubic curve with points relative to the current point.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::NoCurrentPoint`] on an empty path.
    pub fn relative_curve_to(&mut self, dcp1: Vector2, dcp2: Vector2, d: Vector2) -> Result<()> {
        let base = self.require_current_point()?;
        self.curve_to(base + dcp1, base + dcp2, base + d)
    }

    /// Returns the point the next drawing element starts from.
    ///
    /// After a `Close` this is the start of the closed subpath.
    #[must_use]
    pub fn current_point(&self) -> Option<Point2> {
        match self.elements.last()? {
            PathElement::Close => self.last_move_point(self.elements.len()),
            _ => self.points.last().copied(),
        }
    }

    /// Point of the last `MoveTo` before element `before`.
    fn last_move_point(&self, before: usize) -> Option<Point2> {
        let mut point_index = self.elements[..before]
            .iter()
            .map(|e| e.point_count())
            .sum::<usize>();
        for element in self.elements[..before].iter().rev() {
            point_index -= element.point_count();
            if *element == PathElement::MoveTo {
                return self.points.get(point_index).copied();
            }
        }
        None
    }

    #[must_use]
    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    #[must_use]
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[must_use]
    pub fn winding_rule(&self) -> WindingRule {
        self.winding_rule
    }

    pub fn set_winding_rule(&mut self, winding_rule: WindingRule) {
        self.winding_rule = winding_rule;
    }

    /// Returns the element at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::IndexOutOfBounds`] if `index` is out of range.
    pub fn element(&self, index: usize) -> Result<PathElement> {
        self.elements.get(index).copied().ok_or_else(|| {
            PathError::IndexOutOfBounds {
                kind: "element",
                index,
                len: self.elements.len(),
            }
            .into()
        })
    }

    /// Returns the point at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::IndexOutOfBounds`] if `index` is out of range.
    pub fn point(&self, index: usize) -> Result<Point2> {
        self.points
            .get(index)
            .copied()
            .ok_or_else(|| self.point_out_of_bounds(index))
    }

    fn point_out_of_bounds(&self, index: usize) -> crate::error::ContourError {
        PathError::IndexOutOfBounds {
            kind: "point",
            index,
            len: self.points.len(),
        }
        .into()
    }

    /// Replaces the point at `index` without touching any other point.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::IndexOutOfBounds`] if `index` is out of range.
    pub fn set_point(&mut self, index: usize, p: Point2) -> Result<()> {
        let len = self.points.len();
        let slot = self.points.get_mut(index).ok_or(PathError::IndexOutOfBounds {
            kind: "point",
            index,
            len,
        })?;
        *slot = p;
        self.invalidate();
        Ok(())
    }

    /// Returns the range of the point buffer consumed by element `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::IndexOutOfBounds`] if `index` is out of range.
    pub fn element_point_range(&self, index: usize) -> Result<Range<usize>> {
        let element = self.element(index)?;
        let start = self.elements[..index]
            .iter()
            .map(|e| e.point_count())
            .sum::<usize>();
        Ok(start..start + element.point_count())
    }

    /// Returns the element owning point `index` and the offset of the point
    /// inside that element.
    fn locate_point(&self, index: usize) -> Result<(usize, usize)> {
        let mut start = 0;
        for (element_index, element) in self.elements.iter().enumerate() {
            let count = element.point_count();
            if index < start + count {
                return Ok((element_index, index - start));
            }
            start += count;
        }
        Err(self.point_out_of_bounds(index))
    }

    /// Splits the element stream into subpaths.
    ///
    /// Drawing elements following a `Close` without a `MoveTo` open a new
    /// subpath at the start of the closed one.
    fn raw_subpaths(&self) -> Vec<RawSubpath> {
        let mut subpaths: Vec<RawSubpath> = Vec::new();
        let mut current: Option<RawSubpath> = None;
        let mut last_start = None;
        let mut point_index = 0;

        for (index, &element) in self.elements.iter().enumerate() {
            let range = point_index..point_index + element.point_count();
            point_index = range.end;
            match element {
                PathElement::MoveTo => {
                    subpaths.extend(current.take());
                    let start = self.points[range.start];
                    last_start = Some(start);
                    current = Some(RawSubpath {
                        start,
                        move_index: Some(index),
                        elements: Vec::new(),
                        closed: false,
                    });
                }
                PathElement::Close => {
                    if let Some(sub) = current.as_mut() {
                        sub.closed = true;
                    }
                    subpaths.extend(current.take());
                }
                _ => {
                    if current.is_none() {
                        let Some(start) = last_start else {
                            continue;
                        };
                        current = Some(RawSubpath {
                            start,
                            move_index: None,
                            elements: Vec::new(),
                            closed: false,
                        });
                    }
                    if let Some(sub) = current.as_mut() {
                        sub.elements.push((index, element, range));
                    }
                }
            }
        }
        subpaths.extend(current);
        subpaths
    }

    /// Axis-aligned bounds of all drawn segments, or `None` if nothing is drawn.
    ///
    /// Curves use their exact bounds rather than their control points.
    pub fn bounding_box(&self) -> Option<Rect> {
        *self.bounds.get_or_init(|| {
            self.segments()
                .iter()
                .map(Segment::bounding_box)
                .reduce(|a, b| a.union(&b))
        })
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
            && self.points == other.points
            && self.winding_rule == other.winding_rule
    }
}
