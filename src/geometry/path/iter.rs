use super::{Path, PathElement, WindingRule};
use crate::error::{PathError, Result};
use crate::math::Point2;

/// Restartable cursor over the elements of a [`Path`].
///
/// Yields each element together with the points it consumes.
#[derive(Debug, Clone)]
pub struct PathIter<'a> {
    path: &'a Path,
    element: usize,
    point: usize,
}

impl<'a> PathIter<'a> {
    pub(super) fn new(path: &'a Path) -> Self {
        Self {
            path,
            element: 0,
            point: 0,
        }
    }

    /// Winding rule of the iterated path.
    #[must_use]
    pub fn winding_rule(&self) -> WindingRule {
        self.path.winding_rule
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.element >= self.path.elements.len()
    }

    /// Moves the cursor back to the first element.
    pub fn rewind(&mut self) {
        self.element = 0;
        self.point = 0;
    }
}

impl<'a> Iterator for PathIter<'a> {
    type Item = (PathElement, &'a [Point2]);

    fn next(&mut self) -> Option<Self::Item> {
        let element = *self.path.elements.get(self.element)?;
        let end = self.point + element.point_count();
        let points = &self.path.points[self.point..end];
        self.element += 1;
        self.point = end;
        Some((element, points))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.path.elements.len() - self.element;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PathIter<'_> {}

impl<'a> IntoIterator for &'a Path {
    type Item = (PathElement, &'a [Point2]);
    type IntoIter = PathIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Flat record of one element, used to persist a path.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialization", derive(serde::Serialize, serde::Deserialize))]
pub struct PathRecord {
    pub element: PathElement,
    /// Interleaved `x, y` coordinates of the element's points.
    pub coords: Vec<f64>,
}

impl Path {
    /// Returns a cursor over the path elements.
    #[must_use]
    pub fn iter(&self) -> PathIter<'_> {
        PathIter::new(self)
    }

    /// Converts the path into a record stream.
    #[must_use]
    pub fn to_records(&self) -> Vec<PathRecord> {
        self.iter()
            .map(|(element, points)| PathRecord {
                element,
                coords: points.iter().flat_map(|p| [p.x, p.y]).collect(),
            })
            .collect()
    }

    /// Rebuilds a path from a record stream.
    ///
    /// # Errors
    ///
    /// Returns [`PathError::MalformedRecord`] if a record carries the wrong
    /// number of coordinates or a drawing element precedes any `MoveTo`.
    pub fn from_records(records: &[PathRecord], winding_rule: WindingRule) -> Result<Path> {
        let mut path = Path::with_winding_rule(winding_rule);
        for (index, record) in records.iter().enumerate() {
            let expected = record.element.point_count() * 2;
            if record.coords.len() != expected {
                return Err(PathError::MalformedRecord(format!(
                    "record {index} ({:?}) has {} coordinates, expected {expected}",
                    record.element,
                    record.coords.len()
                ))
                .into());
            }
            if record.element.is_drawing() && path.current_point().is_none() {
                return Err(PathError::MalformedRecord(format!(
                    "record {index} ({:?}) has no current point",
                    record.element
                ))
                .into());
            }
            let points: Vec<Point2> = record
                .coords
                .chunks_exact(2)
                .map(|c| Point2::new(c[0], c[1]))
                .collect();
            match record.element {
                PathElement::Close => path.close_path(),
                element => path.push(element, &points),
            }
        }
        Ok(path)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Path {
        let mut path = Path::with_winding_rule(WindingRule::EvenOdd);
        path.move_to(Point2::new(0.0, 0.0));
        path.quad_to(Point2::new(1.0, 2.0), Point2::new(2.0, 0.0)).unwrap();
        path.curve_to(
            Point2::new(3.0, -1.0),
            Point2::new(4.0, 1.0),
            Point2::new(5.0, 0.0),
        )
        .unwrap();
        path.close_path();
        path
    }

    #[test]
    fn iteration_matches_buffer() {
        let path = sample();
        let mut iter = path.iter();
        assert_eq!(iter.winding_rule(), WindingRule::EvenOdd);
        assert_eq!(iter.len(), 4);

        let (element, points) = iter.next().unwrap();
        assert_eq!(element, PathElement::MoveTo);
        assert_eq!(points, &[Point2::new(0.0, 0.0)]);
        let (element, points) = iter.next().unwrap();
        assert_eq!(element, PathElement::QuadTo);
        assert_eq!(points.len(), 2);

        iter.rewind();
        assert_eq!(iter.count(), 4);
    }

    #[test]
    fn records_restore_path() {
        let path = sample();
        let records = path.to_records();
        assert_eq!(records[2].coords, vec![3.0, -1.0, 4.0, 1.0, 5.0, 0.0]);
        assert!(records[3].coords.is_empty());

        let restored = Path::from_records(&records, path.winding_rule()).unwrap();
        assert_eq!(restored, path);
    }

    #[test]
    fn malformed_records_are_rejected() {
        let short = [PathRecord {
            element: PathElement::MoveTo,
            coords: vec![1.0],
        }];
        assert!(Path::from_records(&short, WindingRule::NonZero).is_err());

        let orphan = [PathRecord {
            element: PathElement::LineTo,
            coords: vec![1.0, 2.0],
        }];
        assert!(Path::from_records(&orphan, WindingRule::NonZero).is_err());
    }
}
