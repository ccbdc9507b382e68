use super::Point2;

/// Returns the parameter of the projection of `p` onto segment `a`–`b`,
/// clamped to `[0, 1]`. A zero-length segment projects to `0`.
#[must_use]
pub fn project_onto_segment(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let d = b - a;
    let len_sq = d.norm_squared();
    if len_sq < 1e-20 {
        return 0.0;
    }
    ((p - a).dot(&d) / len_sq).clamp(0.0, 1.0)
}

/// Returns the squared distance from `p` to the segment `a`–`b`.
#[must_use]
pub fn point_to_segment_dist_sq(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let t = project_onto_segment(p, a, b);
    let closest = a + (b - a) * t;
    (p - closest).norm_squared()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perpendicular_distance() {
        let d2 = point_to_segment_dist_sq(
            &Point2::new(1.0, 1.0),
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 0.0),
        );
        assert!((d2 - 1.0).abs() < 1e-10);
    }

    #[test]
    fn endpoint_distance() {
        let d2 = point_to_segment_dist_sq(
            &Point2::new(5.0, 0.0),
            &Point2::new(0.0, 0.0),
            &Point2::new(2.0, 0.0),
        );
        assert!((d2 - 9.0).abs() < 1e-10);
    }

    #[test]
    fn degenerate_segment() {
        let d2 = point_to_segment_dist_sq(
            &Point2::new(3.0, 4.0),
            &Point2::new(0.0, 0.0),
            &Point2::new(0.0, 0.0),
        );
        assert!((d2 - 25.0).abs() < 1e-10);
    }
}
