use super::Point2;

/// Computes the signed area of a closed polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Returns the winding number of a closed polygon around `p`.
///
/// Counts signed crossings of a ray cast from `p` towards +x: upward edges
/// passing to the right of `p` add one, downward edges subtract one.
#[must_use]
pub fn winding_number(points: &[Point2], p: &Point2) -> i32 {
    let n = points.len();
    if n < 2 {
        return 0;
    }
    let mut winding = 0;
    for i in 0..n {
        let a = &points[i];
        let b = &points[(i + 1) % n];
        let side = (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y);
        if a.y <= p.y {
            if b.y > p.y && side > 0.0 {
                winding += 1;
            }
        } else if b.y <= p.y && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}
