pub mod distance_2d;
pub mod integrate;
pub mod intersect_2d;
pub mod polygon_2d;
pub mod polynomial;
mod rect;

pub use rect::Rect;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 2D vector type.
pub type Vector2 = nalgebra::Vector2<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 2D affine transformation.
pub type Affine2 = nalgebra::Affine2<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Returns the left-pointing normal of a direction vector.
#[must_use]
pub fn left_normal(dir: &Vector2) -> Vector2 {
    Vector2::new(-dir.y, dir.x)
}

/// 2D cross product (z component of the 3D cross product).
#[must_use]
pub fn cross_2d(a: &Vector2, b: &Vector2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Normalizes `v`, returning `None` for vectors shorter than [`TOLERANCE`].
#[must_use]
pub fn try_normalize(v: &Vector2) -> Option<Vector2> {
    let len = v.norm();
    if len < TOLERANCE {
        None
    } else {
        Some(v / len)
    }
}
