use super::{Point2, Vector2};

/// An axis-aligned 2D rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Minimum corner.
    pub min: Point2,
    /// Maximum corner.
    pub max: Point2,
}

impl Rect {
    /// Creates a rectangle from two corners in any order.
    #[must_use]
    pub fn new(a: Point2, b: Point2) -> Self {
        Self {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Creates a zero-sized rectangle at `p`.
    #[must_use]
    pub fn from_point(p: Point2) -> Self {
        Self { min: p, max: p }
    }

    /// Returns the smallest rectangle containing every point, or `None` when empty.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point2>,
    {
        let mut iter = points.into_iter();
        let first = Self::from_point(*iter.next()?);
        Some(iter.fold(first, |rect, p| rect.including(p)))
    }

    /// Returns this rectangle grown to include `p`.
    #[must_use]
    pub fn including(&self, p: &Point2) -> Self {
        Self {
            min: Point2::new(self.min.x.min(p.x), self.min.y.min(p.y)),
            max: Point2::new(self.max.x.max(p.x), self.max.y.max(p.y)),
        }
    }

    /// Returns the union of two rectangles.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Self {
        self.including(&other.min).including(&other.max)
    }

    /// Returns `true` if `p` lies inside or on the boundary (with slack `eps`).
    #[must_use]
    pub fn contains(&self, p: &Point2, eps: f64) -> bool {
        p.x >= self.min.x - eps
            && p.x <= self.max.x + eps
            && p.y >= self.min.y - eps
            && p.y <= self.max.y + eps
    }

    /// Returns `true` if the two rectangles overlap (with slack `eps`).
    #[must_use]
    pub fn intersects(&self, other: &Rect, eps: f64) -> bool {
        self.min.x <= other.max.x + eps
            && other.min.x <= self.max.x + eps
            && self.min.y <= other.max.y + eps
            && other.min.y <= self.max.y + eps
    }

    /// Squared distance from `p` to the rectangle (zero inside).
    #[must_use]
    pub fn distance_squared_to_point(&self, p: &Point2) -> f64 {
        let dx = (self.min.x - p.x).max(0.0).max(p.x - self.max.x);
        let dy = (self.min.y - p.y).max(0.0).max(p.y - self.max.y);
        dx * dx + dy * dy
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[must_use]
    pub fn size(&self) -> Vector2 {
        self.max - self.min
    }

    #[must_use]
    pub fn center(&self) -> Point2 {
        nalgebra::center(&self.min, &self.max)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn from_points_covers_all() {
        let pts = [
            Point2::new(1.0, 5.0),
            Point2::new(-2.0, 3.0),
            Point2::new(4.0, -1.0),
        ];
        let rect = Rect::from_points(&pts).unwrap();
        assert_eq!(rect.min, Point2::new(-2.0, -1.0));
        assert_eq!(rect.max, Point2::new(4.0, 5.0));
    }

    #[test]
    fn from_points_empty_is_none() {
        assert!(Rect::from_points(&Vec::<Point2>::new()).is_none());
    }

    #[test]
    fn distance_outside_corner() {
        let rect = Rect::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        let d2 = rect.distance_squared_to_point(&Point2::new(4.0, 5.0));
        assert!((d2 - 25.0).abs() < 1e-12);
        assert!(rect.distance_squared_to_point(&Point2::new(0.5, 0.5)).abs() < 1e-12);
    }

    #[test]
    fn intersects_touching_edges() {
        let a = Rect::new(Point2::new(0.0, 0.0), Point2::new(1.0, 1.0));
        let b = Rect::new(Point2::new(1.0, 0.0), Point2::new(2.0, 1.0));
        let c = Rect::new(Point2::new(1.5, 0.0), Point2::new(2.0, 1.0));
        assert!(a.intersects(&b, 0.0));
        assert!(!a.intersects(&c, 0.0));
    }
}
