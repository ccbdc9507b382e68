use tracing::trace;

use crate::error::{OperationError, Result};
use crate::geometry::path::{Path, WindingRule};
use crate::geometry::segment::{ControlPolygon, Segment};
use crate::math::{Point2, Point3, Vector3, TOLERANCE};
use crate::operations::offset::PathOffset;

/// Flattening tolerance used for curved walls and caps.
pub const EXTRUDE_FLATTEN_TOLERANCE: f64 = 0.05;

/// Role of an extruded face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceKind {
    /// Planar quad swept by a line segment.
    Wall,
    /// Ruled surface swept by a quadratic or cubic segment.
    CurvedWall,
    /// Cap at the first depth.
    FrontCap,
    /// Cap at the second depth, wound the opposite way.
    BackCap,
}

/// A face of an extruded path.
#[derive(Debug, Clone, PartialEq)]
pub struct Face3D {
    pub kind: FaceKind,
    /// Closed polygons bounding the face. Walls have one; caps have one per
    /// closed subpath, filled with the path's winding rule.
    pub contours: Vec<Vec<Point3>>,
    /// Profile segment of a wall.
    pub segment: Option<Segment>,
    /// Reference point for depth sorting.
    pub center: Point3,
}

impl Face3D {
    /// Unit normal of the first contour (Newell's method), or `None` if it
    /// encloses no area.
    #[must_use]
    pub fn normal(&self) -> Option<Vector3> {
        let points = self.contours.first()?;
        let n = points.len();
        let mut normal = Vector3::zeros();
        for i in 0..n {
            let curr = &points[i];
            let next = &points[(i + 1) % n];
            normal.x += (curr.y - next.y) * (curr.z + next.z);
            normal.y += (curr.z - next.z) * (curr.x + next.x);
            normal.z += (curr.x - next.x) * (curr.y + next.y);
        }
        let len = normal.norm();
        (len >= TOLERANCE).then(|| normal / len)
    }
}

/// Faces produced by [`Extrude`].
#[derive(Debug, Clone, PartialEq)]
pub struct Extrusion {
    faces: Vec<Face3D>,
    winding_rule: WindingRule,
}

impl Extrusion {
    #[must_use]
    pub fn faces(&self) -> &[Face3D] {
        &self.faces
    }

    #[must_use]
    pub fn into_faces(self) -> Vec<Face3D> {
        self.faces
    }

    /// Winding rule for filling the cap contours.
    #[must_use]
    pub fn winding_rule(&self) -> WindingRule {
        self.winding_rule
    }

    /// Iterates over the wall faces.
    pub fn walls(&self) -> impl Iterator<Item = &Face3D> {
        self.faces
            .iter()
            .filter(|face| matches!(face.kind, FaceKind::Wall | FaceKind::CurvedWall))
    }

    /// Orders faces back to front as seen from `eye`.
    pub fn sort_by_depth(&mut self, eye: &Point3) {
        self.faces.sort_by(|a, b| {
            let da = (a.center - eye).norm_squared();
            let db = (b.center - eye).norm_squared();
            db.total_cmp(&da)
        });
    }
}

/// Extrudes a 2D path between two depths.
///
/// Every segment becomes a wall joining its copies at `z1` and `z2`. A closed
/// path also gets a front cap at `z1` and a back cap at `z2`, both inset by
/// `stroke_inset` so they sit inside the stroke outline.
#[derive(Debug, Clone)]
pub struct Extrude<'a> {
    path: &'a Path,
    z1: f64,
    z2: f64,
    stroke_inset: f64,
}

impl<'a> Extrude<'a> {
    /// Creates a new `Extrude` operation.
    #[must_use]
    pub fn new(path: &'a Path, z1: f64, z2: f64, stroke_inset: f64) -> Self {
        Self {
            path,
            z1,
            z2,
            stroke_inset,
        }
    }

    /// Executes the extrusion.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the depths coincide, the
    /// inset is negative or not finite, or the path draws nothing. Propagates
    /// offset errors from the cap inset.
    pub fn execute(&self) -> Result<Extrusion> {
        if !self.z1.is_finite() || !self.z2.is_finite() || (self.z1 - self.z2).abs() < TOLERANCE {
            return Err(OperationError::InvalidInput(format!(
                "extrusion depths must differ, got {} and {}",
                self.z1, self.z2
            ))
            .into());
        }
        if !self.stroke_inset.is_finite() || self.stroke_inset < 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "stroke inset must be non-negative, got {}",
                self.stroke_inset
            ))
            .into());
        }

        let segments: Vec<Segment> = self
            .path
            .segments()
            .into_iter()
            .filter(|segment| !segment.is_degenerate(TOLERANCE))
            .collect();
        if segments.is_empty() {
            return Err(OperationError::InvalidInput("cannot extrude an empty path".into()).into());
        }

        let mut faces: Vec<Face3D> = segments.iter().map(|s| self.wall(s)).collect();
        let walls = faces.len();

        if self.path.is_closed() {
            let cap_path = self.cap_path()?;
            let outlines = cap_path.flattened(EXTRUDE_FLATTEN_TOLERANCE);
            if let Some(bounds) = cap_path.bounding_box() {
                let center = bounds.center();
                faces.push(cap(&outlines, center, self.z1, FaceKind::FrontCap));
                faces.push(cap(&outlines, center, self.z2, FaceKind::BackCap));
            }
        }

        trace!(walls, faces = faces.len(), "extruded path");
        Ok(Extrusion {
            faces,
            winding_rule: self.path.winding_rule(),
        })
    }

    fn wall(&self, segment: &Segment) -> Face3D {
        let mut profile = vec![segment.start()];
        segment.flatten(EXTRUDE_FLATTEN_TOLERANCE, &mut profile);

        let mut outline: Vec<Point3> = profile.iter().map(|p| lift(p, self.z1)).collect();
        outline.extend(profile.iter().rev().map(|p| lift(p, self.z2)));

        let kind = match segment {
            Segment::Line(_) => FaceKind::Wall,
            Segment::Quadratic(_) | Segment::Cubic(_) => FaceKind::CurvedWall,
        };
        Face3D {
            kind,
            contours: vec![outline],
            segment: Some(*segment),
            center: lift(&segment.point_at(0.5), 0.5 * (self.z1 + self.z2)),
        }
    }

    /// The path moved inwards by the stroke inset, judged by its orientation.
    fn cap_path(&self) -> Result<Path> {
        if self.stroke_inset <= TOLERANCE {
            return Ok(self.path.clone());
        }
        let area = self.path.signed_area();
        if area.abs() <= TOLERANCE {
            return Ok(self.path.clone());
        }
        PathOffset::new(self.path, self.stroke_inset * area.signum()).execute()
    }
}

fn lift(p: &Point2, z: f64) -> Point3 {
    Point3::new(p.x, p.y, z)
}

fn cap(outlines: &[Vec<Point2>], center: Point2, z: f64, kind: FaceKind) -> Face3D {
    let contours = outlines
        .iter()
        .map(|outline| {
            let contour = outline.iter().map(|p| lift(p, z));
            if kind == FaceKind::BackCap {
                contour.rev().collect()
            } else {
                contour.collect()
            }
        })
        .collect();
    Face3D {
        kind,
        contours,
        segment: None,
        center: lift(&center, z),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn square(size: f64, ccw: bool) -> Path {
        let corners = [p(0.0, 0.0), p(size, 0.0), p(size, size), p(0.0, size)];
        let mut path = Path::new();
        let mut order: Vec<Point2> = corners.to_vec();
        if !ccw {
            order[1..].reverse();
        }
        path.move_to(order[0]);
        for corner in &order[1..] {
            path.line_to(*corner).unwrap();
        }
        path.close_path();
        path
    }

    fn cap_of(extrusion: &Extrusion, kind: FaceKind) -> &Face3D {
        extrusion.faces().iter().find(|f| f.kind == kind).unwrap()
    }

    // ── Square prism ───────────────────────────────────────────

    #[test]
    fn square_has_four_walls_and_two_caps() {
        let extrusion = Extrude::new(&square(10.0, true), 0.0, 5.0, 0.0)
            .execute()
            .unwrap();
        assert_eq!(extrusion.faces().len(), 6);
        assert_eq!(extrusion.walls().count(), 4);

        let wall = &extrusion.faces()[0];
        assert_eq!(wall.kind, FaceKind::Wall);
        assert_eq!(wall.contours[0].len(), 4);
        assert_abs_diff_eq!(wall.center, Point3::new(5.0, 0.0, 2.5), epsilon = 1e-12);
        let normal = wall.normal().unwrap();
        assert_abs_diff_eq!(normal.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn caps_face_opposite_ways() {
        let extrusion = Extrude::new(&square(10.0, true), 0.0, 5.0, 0.0)
            .execute()
            .unwrap();
        let front = cap_of(&extrusion, FaceKind::FrontCap);
        let back = cap_of(&extrusion, FaceKind::BackCap);
        assert!(front.contours[0].iter().all(|q| q.z == 0.0));
        assert!(back.contours[0].iter().all(|q| q.z == 5.0));
        assert_abs_diff_eq!(front.center, Point3::new(5.0, 5.0, 0.0), epsilon = 1e-12);

        let nf = front.normal().unwrap();
        let nb = back.normal().unwrap();
        assert_abs_diff_eq!(nf.dot(&nb), -1.0, epsilon = 1e-12);
    }

    // ── Stroke inset ───────────────────────────────────────────

    #[test]
    fn caps_are_inset_for_either_orientation() {
        for ccw in [true, false] {
            let extrusion = Extrude::new(&square(10.0, ccw), 0.0, 1.0, 1.0)
                .execute()
                .unwrap();
            let front = cap_of(&extrusion, FaceKind::FrontCap);
            for q in &front.contours[0] {
                assert!(q.x > 0.99 && q.x < 9.01, "{q:?}");
                assert!(q.y > 0.99 && q.y < 9.01, "{q:?}");
            }
        }
    }

    // ── Curves and open paths ──────────────────────────────────

    #[test]
    fn curved_segments_make_curved_walls() {
        let mut path = Path::new();
        path.move_to(p(0.0, 0.0));
        path.curve_to(p(0.0, 5.0), p(5.0, 5.0), p(5.0, 0.0)).unwrap();
        let extrusion = Extrude::new(&path, -1.0, 1.0, 0.0).execute().unwrap();

        assert_eq!(extrusion.faces().len(), 1);
        let wall = &extrusion.faces()[0];
        assert_eq!(wall.kind, FaceKind::CurvedWall);
        assert!(wall.contours[0].len() > 4);
        assert!(matches!(wall.segment, Some(Segment::Cubic(_))));
        assert_abs_diff_eq!(wall.center.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn invalid_input_is_rejected() {
        let path = square(1.0, true);
        assert!(Extrude::new(&path, 2.0, 2.0, 0.0).execute().is_err());
        assert!(Extrude::new(&path, 0.0, 1.0, -1.0).execute().is_err());
        assert!(Extrude::new(&Path::new(), 0.0, 1.0, 0.0).execute().is_err());
    }

    // ── Depth sorting ──────────────────────────────────────────

    #[test]
    fn sort_by_depth_puts_far_faces_first() {
        let mut extrusion = Extrude::new(&square(10.0, true), 0.0, 5.0, 0.0)
            .execute()
            .unwrap();
        extrusion.sort_by_depth(&Point3::new(5.0, 5.0, -20.0));
        let faces = extrusion.faces();
        assert_eq!(faces[0].kind, FaceKind::BackCap);
        assert_eq!(faces[faces.len() - 1].kind, FaceKind::FrontCap);
    }
}
