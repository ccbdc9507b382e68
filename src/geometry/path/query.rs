use nalgebra::Matrix3;

use super::{Path, PathElement, WindingRule};
use crate::geometry::segment::{
    Bezier, ClosestPointResult, ControlPolygon, HitInfo, Line, Quadratic, Segment,
};
use crate::math::polygon_2d::{signed_area_2d, winding_number};
use crate::math::{Affine2, Point2, Rect, TOLERANCE};

/// Flattening tolerance used by [`Path::contains`].
pub const CONTAINS_FLATTEN_TOLERANCE: f64 = 0.01;

/// Segments of one subpath.
#[derive(Debug, Clone, PartialEq)]
pub struct Subpath {
    pub start: Point2,
    /// Segments in drawing order, including the implicit closing line.
    pub segments: Vec<Segment>,
    pub closed: bool,
}

impl Subpath {
    /// End point of the last segment, or the start for an empty subpath.
    #[must_use]
    pub fn end(&self) -> Point2 {
        self.segments.last().map_or(self.start, ControlPolygon::end)
    }
}

impl Path {
    /// Resolves the element stream into subpaths of segments.
    ///
    /// A `Close` becomes a line back to the subpath start unless the last
    /// point already coincides with it. Subpaths consisting of a lone
    /// `MoveTo` are kept with no segments.
    #[must_use]
    pub fn subpaths(&self) -> Vec<Subpath> {
        self.raw_subpaths()
            .into_iter()
            .map(|raw| {
                let mut current = raw.start;
                let mut segments = Vec::with_capacity(raw.elements.len() + 1);
                for (_, element, range) in raw.elements {
                    let p = &self.points[range];
                    let segment = match element {
                        PathElement::LineTo => Segment::Line(Line::new(current, p[0])),
                        PathElement::QuadTo => {
                            Segment::Quadratic(Quadratic::new(current, p[0], p[1]))
                        }
                        PathElement::CurveTo => {
                            Segment::Cubic(Bezier::new(current, p[0], p[1], p[2]))
                        }
                        PathElement::MoveTo | PathElement::Close => continue,
                    };
                    current = segment.end();
                    segments.push(segment);
                }
                if raw.closed && (current - raw.start).norm() > TOLERANCE {
                    segments.push(Segment::Line(Line::new(current, raw.start)));
                }
                Subpath {
                    start: raw.start,
                    segments,
                    closed: raw.closed,
                }
            })
            .collect()
    }

    /// All segments of the path in drawing order.
    #[must_use]
    pub fn segments(&self) -> Vec<Segment> {
        self.subpaths()
            .into_iter()
            .flat_map(|subpath| subpath.segments)
            .collect()
    }

    /// Returns `true` if every drawn subpath is closed, either by a `Close`
    /// or by ending on its start point.
    ///
    /// An empty path (or one with only `MoveTo`s) is not closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        let mut drawn = self
            .subpaths()
            .into_iter()
            .filter(|subpath| !subpath.segments.is_empty())
            .peekable();
        drawn.peek().is_some()
            && drawn.all(|subpath| {
                subpath.closed || (subpath.end() - subpath.start).norm() <= TOLERANCE
            })
    }

    /// Approximates each drawn subpath by a polyline starting at its start
    /// point.
    #[must_use]
    pub fn flattened(&self, tolerance: f64) -> Vec<Vec<Point2>> {
        self.subpaths()
            .into_iter()
            .filter(|subpath| !subpath.segments.is_empty())
            .map(|subpath| {
                let mut polyline = vec![subpath.start];
                for segment in &subpath.segments {
                    segment.flatten(tolerance, &mut polyline);
                }
                polyline
            })
            .collect()
    }

    /// Returns `true` if `p` lies inside the path under its winding rule.
    ///
    /// Open paths contain nothing.
    #[must_use]
    pub fn contains(&self, p: &Point2) -> bool {
        if !self.is_closed() {
            return false;
        }
        match self.bounding_box() {
            Some(rect) if rect.contains(p, 0.0) => {}
            _ => return false,
        }
        let winding: i32 = self
            .flattened(CONTAINS_FLATTEN_TOLERANCE)
            .iter()
            .map(|polygon| winding_number(polygon, p))
            .sum();
        match self.winding_rule {
            WindingRule::NonZero => winding != 0,
            WindingRule::EvenOdd => winding % 2 != 0,
        }
    }

    /// Signed area enclosed by the path, positive for counter-clockwise
    /// outlines.
    #[must_use]
    pub fn signed_area(&self) -> f64 {
        self.flattened(CONTAINS_FLATTEN_TOLERANCE)
            .iter()
            .map(|polygon| signed_area_2d(polygon.as_slice()))
            .sum()
    }

    /// Returns the first crossing of `segment` with the path.
    ///
    /// `r` is the parameter on the hit path segment, `s` the parameter on
    /// `segment`, and `segment_index` the index into [`Path::segments`].
    #[must_use]
    pub fn hit_test(&self, segment: &Segment) -> Option<HitInfo> {
        self.segments()
            .iter()
            .enumerate()
            .find_map(|(index, candidate)| {
                candidate.hit_test(segment).map(|hit| HitInfo {
                    segment_index: Some(index),
                    ..hit
                })
            })
    }

    /// Closest point on any segment of the path, with the segment index.
    #[must_use]
    pub fn closest_point(&self, p: &Point2) -> Option<(usize, ClosestPointResult)> {
        self.segments()
            .iter()
            .map(|segment| segment.closest_point(p))
            .enumerate()
            .min_by(|(_, a), (_, b)| a.distance.total_cmp(&b.distance))
    }

    /// Distance from `p` to the nearest segment, or `None` if nothing is drawn.
    #[must_use]
    pub fn distance_to_point(&self, p: &Point2) -> Option<f64> {
        self.closest_point(p).map(|(_, result)| result.distance)
    }

    /// Applies an affine transform to every point.
    #[must_use]
    pub fn transformed(&self, transform: &Affine2) -> Path {
        let mut path = self.clone();
        for point in &mut path.points {
            *point = transform * *point;
        }
        path.invalidate();
        path
    }

    /// Scales and translates the path so that its bounds fill `rect`.
    ///
    /// Degenerate axes keep their scale. An undrawn path is returned as is.
    #[must_use]
    pub fn path_in_rect(&self, rect: &Rect) -> Path {
        let Some(bounds) = self.bounding_box() else {
            return self.clone();
        };
        let scale = |target: f64, source: f64| {
            if source.abs() < TOLERANCE {
                1.0
            } else {
                target / source
            }
        };
        let sx = scale(rect.width(), bounds.width());
        let sy = scale(rect.height(), bounds.height());
        let matrix = Matrix3::new(
            sx,
            0.0,
            rect.min.x - bounds.min.x * sx,
            0.0,
            sy,
            rect.min.y - bounds.min.y * sy,
            0.0,
            0.0,
            1.0,
        );
        self.transformed(&Affine2::from_matrix_unchecked(matrix))
    }
}
