//! Numeric quadrature and function inversion used by arc-length queries.

use std::ops::Range;

/// Maximum recursion depth of the adaptive Simpson integrator.
const MAX_SIMPSON_DEPTH: u32 = 20;

/// Maximum number of iterations when inverting a monotonic function.
const MAX_INVERSE_ITERATIONS: usize = 64;

/// Integrates `f` over `range` with adaptive Simpson quadrature.
///
/// Recursion stops once the local error estimate drops below `tolerance` or
/// the depth limit is reached, in which case the best estimate is returned.
pub fn integrate<F>(f: F, range: Range<f64>, tolerance: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    let (a, b) = (range.start, range.end);
    if a == b {
        return 0.0;
    }
    let fa = f(a);
    let fb = f(b);
    let m = 0.5 * (a + b);
    let fm = f(m);
    let whole = simpson(a, b, fa, fm, fb);
    simpson_recursive(&f, a, b, fa, fm, fb, whole, tolerance, MAX_SIMPSON_DEPTH)
}

fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

#[allow(clippy::too_many_arguments)]
fn simpson_recursive<F>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    tolerance: f64,
    depth: u32,
) -> f64
where
    F: Fn(f64) -> f64,
{
    let m = 0.5 * (a + b);
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = f(lm);
    let frm = f(rm);
    let left = simpson(a, m, fa, flm, fm);
    let right = simpson(m, b, fm, frm, fb);
    let delta = left + right - whole;

    if depth == 0 || delta.abs() <= 15.0 * tolerance {
        return left + right + delta / 15.0;
    }

    simpson_recursive(f, a, m, fa, flm, fm, left, tolerance * 0.5, depth - 1)
        + simpson_recursive(f, m, b, fm, frm, fb, right, tolerance * 0.5, depth - 1)
}

/// Finds `x` in `range` with `f(x) == target` for a monotonically
/// non-decreasing `f` whose derivative is `df`.
///
/// Uses Newton steps, falling back to bisection whenever a step would leave
/// the current bracket. Targets outside `f(range)` clamp to the range ends.
pub fn invert_monotonic<F, D>(f: F, df: D, target: f64, range: Range<f64>, tolerance: f64) -> f64
where
    F: Fn(f64) -> f64,
    D: Fn(f64) -> f64,
{
    let (mut lo, mut hi) = (range.start, range.end);
    if target <= f(lo) {
        return lo;
    }
    if target >= f(hi) {
        return hi;
    }

    let mut x = 0.5 * (lo + hi);
    for _ in 0..MAX_INVERSE_ITERATIONS {
        let err = f(x) - target;
        if err.abs() <= tolerance {
            return x;
        }
        if err > 0.0 {
            hi = x;
        } else {
            lo = x;
        }

        let slope = df(x);
        let newton = if slope.abs() > f64::EPSILON {
            x - err / slope
        } else {
            f64::NAN
        };
        x = if newton > lo && newton < hi {
            newton
        } else {
            0.5 * (lo + hi)
        };
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn integrates_polynomial_exactly() {
        let area = integrate(|x| 3.0 * x * x, 0.0..2.0, 1e-12);
        assert_abs_diff_eq!(area, 8.0, epsilon = 1e-10);
    }

    #[test]
    fn integrates_sine() {
        let area = integrate(f64::sin, 0.0..std::f64::consts::PI, 1e-10);
        assert_abs_diff_eq!(area, 2.0, epsilon = 1e-8);
    }

    #[test]
    fn empty_range_is_zero() {
        assert_abs_diff_eq!(integrate(|x| x, 1.0..1.0, 1e-9), 0.0);
    }

    #[test]
    fn inverts_cubic() {
        let x = invert_monotonic(|x| x * x * x, |x| 3.0 * x * x, 0.125, 0.0..1.0, 1e-12);
        assert_abs_diff_eq!(x, 0.5, epsilon = 1e-9);
    }

    #[test]
    fn inverse_clamps_out_of_range_targets() {
        let x = invert_monotonic(|x| x, |_| 1.0, 5.0, 0.0..1.0, 1e-12);
        assert_abs_diff_eq!(x, 1.0);
        let x = invert_monotonic(|x| x, |_| 1.0, -5.0, 0.0..1.0, 1e-12);
        assert_abs_diff_eq!(x, 0.0);
    }
}
