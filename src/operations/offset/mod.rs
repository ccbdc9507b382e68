mod join;

use tracing::trace;

use crate::error::{OperationError, Result};
use crate::geometry::path::{Path, Subpath};
use crate::geometry::segment::{ControlPolygon, Line, Segment};
use crate::math::{left_normal, Point2, TOLERANCE};
use crate::operations::fit::FitCurve;

/// Tunables of a path offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetParams {
    /// Samples taken along each curved segment before refitting.
    pub samples: usize,
    /// Squared-distance tolerance handed to the curve fit.
    pub fit_tolerance: f64,
    /// Longest allowed miter, as a multiple of the offset distance.
    pub miter_limit: f64,
}

impl Default for OffsetParams {
    fn default() -> Self {
        Self {
            samples: 50,
            fit_tolerance: 1e-4,
            miter_limit: 4.0,
        }
    }
}

/// Offsets every segment of a path by a signed distance.
///
/// Positive distances move along the left normal of the direction of travel,
/// which is the inside of a counter-clockwise outline.
#[derive(Debug, Clone)]
pub struct PathOffset<'a> {
    path: &'a Path,
    distance: f64,
    params: OffsetParams,
}

impl<'a> PathOffset<'a> {
    /// Creates a new `PathOffset` operation with default parameters.
    #[must_use]
    pub fn new(path: &'a Path, distance: f64) -> Self {
        Self {
            path,
            distance,
            params: OffsetParams::default(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: OffsetParams) -> Self {
        self.params = params;
        self
    }

    /// Executes the offset, returning a new path.
    ///
    /// Lines are translated along their normal. Curves are sampled, the
    /// samples moved along the local normal, and the result refitted with
    /// cubics. Consecutive pieces are then joined by trimming or by miter and
    /// bevel connectors; closed subpaths also join their last piece to the
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for a non-finite distance or
    /// invalid parameters, and propagates curve fit errors.
    pub fn execute(&self) -> Result<Path> {
        if !self.distance.is_finite() {
            return Err(OperationError::InvalidInput(format!(
                "offset distance must be finite, got {}",
                self.distance
            ))
            .into());
        }
        let params = &self.params;
        if params.samples < 2 || params.fit_tolerance.is_nan() || params.fit_tolerance <= 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "invalid offset parameters: {params:?}"
            ))
            .into());
        }
        if self.distance.abs() <= TOLERANCE {
            return Ok(self.path.clone());
        }

        let mut result = Path::with_winding_rule(self.path.winding_rule());
        for subpath in self.path.subpaths() {
            let segments = self.offset_subpath(&subpath)?;
            trace!(
                source = subpath.segments.len(),
                offset = segments.len(),
                distance = self.distance,
                "offset subpath"
            );
            if segments.is_empty() {
                continue;
            }
            result.move_to(segments[0].start());
            for segment in &segments {
                result.append_segment(segment);
            }
            if subpath.closed {
                result.close_path();
            }
        }
        Ok(result)
    }

    fn offset_subpath(&self, subpath: &Subpath) -> Result<Vec<Segment>> {
        let miter_limit = self.params.miter_limit * self.distance.abs();
        let mut out: Vec<Segment> = Vec::new();

        for source in &subpath.segments {
            if source.is_degenerate(TOLERANCE) {
                continue;
            }
            let mut piece = self.offset_segment(source)?;
            if piece.is_empty() {
                continue;
            }
            if let Some(prev) = out.last_mut() {
                let connectors = join::connect(prev, &mut piece[0], source.start(), miter_limit);
                out.extend(connectors);
            }
            out.extend(piece);
        }

        let wraps = subpath.closed || (subpath.end() - subpath.start).norm() <= TOLERANCE;
        if wraps && out.len() >= 2 {
            let mut first = out[0];
            if let Some(last) = out.last_mut() {
                let connectors = join::connect(last, &mut first, subpath.start, miter_limit);
                out.extend(connectors);
            }
            out[0] = first;
        }
        Ok(out)
    }

    fn offset_segment(&self, segment: &Segment) -> Result<Vec<Segment>> {
        let d = self.distance;
        if let Segment::Line(line) = segment {
            return Ok(line
                .unit_normal()
                .map(|n| Segment::Line(Line::new(line.sp() + n * d, line.ep() + n * d)))
                .into_iter()
                .collect());
        }

        let samples = self.params.samples;
        #[allow(clippy::cast_precision_loss)]
        let last = (samples - 1) as f64;
        let points: Vec<Point2> = (0..samples)
            .filter_map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f64 / last;
                let tangent = segment.unit_tangent_at(t)?;
                Some(segment.point_at(t) + left_normal(&tangent) * d)
            })
            .collect();
        let (Some(start), Some(end)) = (segment.unit_tangent_at(0.0), segment.unit_tangent_at(1.0))
        else {
            return Ok(Vec::new());
        };

        let curves = FitCurve::new(&points, self.params.fit_tolerance)
            .with_tangents(start, end)
            .execute()?;
        Ok(curves.into_iter().map(Segment::Cubic).collect())
    }
}

/// Offsets `path` by `distance` with default parameters.
///
/// # Errors
///
/// See [`PathOffset::execute`].
pub fn create_offset_path(path: &Path, distance: f64) -> Result<Path> {
    PathOffset::new(path, distance).execute()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn square(size: f64) -> Path {
        let mut path = Path::new();
        path.move_to(p(0.0, 0.0));
        path.line_to(p(size, 0.0)).unwrap();
        path.line_to(p(size, size)).unwrap();
        path.line_to(p(0.0, size)).unwrap();
        path.close_path();
        path
    }

    #[test]
    fn straight_edge_offset_round_trips() {
        let mut path = Path::new();
        path.move_to(p(0.0, 0.0));
        path.line_to(p(10.0, 0.0)).unwrap();

        let shifted = create_offset_path(&path, 2.0).unwrap();
        assert_eq!(shifted.points(), &[p(0.0, 2.0), p(10.0, 2.0)]);

        let back = create_offset_path(&shifted, -2.0).unwrap();
        let segments = back.segments();
        assert_eq!(segments.len(), 1);
        assert_abs_diff_eq!(segments[0].start(), p(0.0, 0.0), epsilon = 1e-6);
        assert_abs_diff_eq!(segments[0].end(), p(10.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn inward_square_offset_trims_corners() {
        let inner = create_offset_path(&square(10.0), 1.0).unwrap();
        assert!(inner.is_closed());
        let bounds = inner.bounding_box().unwrap();
        assert_abs_diff_eq!(bounds.min, p(1.0, 1.0), epsilon = 1e-9);
        assert_abs_diff_eq!(bounds.max, p(9.0, 9.0), epsilon = 1e-9);
        assert_abs_diff_eq!(inner.signed_area(), 64.0, epsilon = 1e-6);
    }

    #[test]
    fn outward_square_offset_uses_miters() {
        let outer = create_offset_path(&square(10.0), -1.0).unwrap();
        assert!(outer.is_closed());
        assert_abs_diff_eq!(outer.signed_area(), 144.0, epsilon = 1e-6);
        assert!(outer.contains(&p(-0.9, -0.9)));
    }

    #[test]
    fn tight_miter_limit_bevels_corners() {
        let params = OffsetParams {
            miter_limit: 1.0,
            ..OffsetParams::default()
        };
        let outer = PathOffset::new(&square(10.0), -1.0)
            .with_params(params)
            .execute()
            .unwrap();
        assert_abs_diff_eq!(outer.signed_area(), 142.0, epsilon = 1e-6);
        assert!(!outer.contains(&p(-0.9, -0.9)));
    }

    #[test]
    fn curve_offset_stays_parallel() {
        let k = 0.552_284_749_8 * 10.0;
        let mut path = Path::new();
        path.move_to(p(10.0, 0.0));
        path.curve_to(p(10.0, k), p(k, 10.0), p(0.0, 10.0)).unwrap();

        let inner = create_offset_path(&path, 2.0).unwrap();
        let segments = inner.segments();
        assert!(!segments.is_empty());
        assert!(segments.iter().all(|s| matches!(s, Segment::Cubic(_))));
        assert_abs_diff_eq!(segments[0].start(), p(8.0, 0.0), epsilon = 1e-9);
        for segment in &segments {
            for i in 0..=20 {
                let radius = segment.point_at(f64::from(i) / 20.0).coords.norm();
                assert_abs_diff_eq!(radius, 8.0, epsilon = 0.02);
            }
        }
    }

    #[test]
    fn quadratic_segments_become_cubics() {
        let mut path = Path::new();
        path.move_to(p(0.0, 0.0));
        path.quad_to(p(5.0, 5.0), p(10.0, 0.0)).unwrap();
        let offset = create_offset_path(&path, 1.0).unwrap();
        assert!(offset.elements().iter().skip(1).all(|e| *e == crate::geometry::path::PathElement::CurveTo));
    }

    #[test]
    fn zero_distance_copies_path() {
        let path = square(3.0);
        assert_eq!(create_offset_path(&path, 0.0).unwrap(), path);
        assert!(create_offset_path(&path, f64::NAN).is_err());
    }
}
