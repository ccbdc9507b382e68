//! Closed-form real root extraction for polynomials of degree three or less.

use std::f64::consts::PI;

use crate::error::{GeometryError, Result};

/// Leading coefficients with a magnitude below this are treated as zero.
pub const COEFFICIENT_TOLERANCE: f64 = 1e-6;

/// Discriminants this small relative to the terms they are built from are
/// treated as repeated roots.
const DISCRIMINANT_TOLERANCE: f64 = 1e-10;

/// A polynomial with real coefficients stored in ascending order of power:
/// `c[0] + c[1] x + c[2] x² + ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Creates a polynomial from coefficients in ascending order of power.
    #[must_use]
    pub fn new(coefficients: &[f64]) -> Self {
        Self {
            coefficients: coefficients.to_vec(),
        }
    }

    /// Builds the monic polynomial whose roots are exactly `roots`.
    #[must_use]
    pub fn from_roots(roots: &[f64]) -> Self {
        let mut coefficients = vec![1.0];
        for &root in roots {
            // Multiply by (x - root).
            let mut next = vec![0.0; coefficients.len() + 1];
            for (i, &c) in coefficients.iter().enumerate() {
                next[i + 1] += c;
                next[i] -= c * root;
            }
            coefficients = next;
        }
        Self { coefficients }
    }

    /// Returns the coefficients in ascending order of power.
    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Returns the nominal degree (number of coefficients minus one).
    #[must_use]
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Evaluates the polynomial at `x` using Horner's scheme.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * x + c)
    }

    /// Returns the derivative polynomial.
    #[must_use]
    pub fn derivative(&self) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let coefficients = self
            .coefficients
            .iter()
            .enumerate()
            .skip(1)
            .map(|(power, &c)| c * power as f64)
            .collect();
        Self { coefficients }
    }

    /// Strips leading coefficients whose magnitude is below
    /// [`COEFFICIENT_TOLERANCE`], lowering the degree.
    #[must_use]
    pub fn simplify(&self) -> Self {
        let mut coefficients = self.coefficients.clone();
        while coefficients
            .last()
            .is_some_and(|c| c.abs() < COEFFICIENT_TOLERANCE)
        {
            coefficients.pop();
        }
        Self { coefficients }
    }

    /// Returns the real roots of the polynomial in ascending order.
    ///
    /// Repeated roots are reported once. A constant polynomial has no roots.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::UnsupportedDegree`] if the simplified degree
    /// exceeds three.
    pub fn real_roots(&self) -> Result<Vec<f64>> {
        let simplified = self.simplify();
        let c = simplified.coefficients();
        let mut roots = match c.len() {
            0 | 1 => Vec::new(),
            2 => solve_linear(c[1], c[0]).into_iter().collect(),
            3 => solve_quadratic(c[2], c[1], c[0]),
            4 => solve_cubic(c[3], c[2], c[1], c[0]),
            n => return Err(GeometryError::UnsupportedDegree(n - 1).into()),
        };
        roots.sort_by(f64::total_cmp);
        Ok(roots)
    }
}

/// Solves `a x + b = 0`.
///
/// Returns `None` when `a` is zero.
#[must_use]
pub fn solve_linear(a: f64, b: f64) -> Option<f64> {
    if a == 0.0 {
        None
    } else {
        Some(-b / a)
    }
}

/// Solves `a x² + b x + c = 0`, falling back to the linear solve when `a` is zero.
#[must_use]
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> Vec<f64> {
    if a == 0.0 {
        return solve_linear(b, c).into_iter().collect();
    }

    // Monic form x² + p x + q.
    let p = b / a;
    let q = c / a;
    let discriminant = p * p - 4.0 * q;
    let scale = p.mul_add(p, 4.0 * q.abs());

    if discriminant.abs() <= DISCRIMINANT_TOLERANCE * scale {
        vec![-p * 0.5]
    } else if discriminant < 0.0 {
        Vec::new()
    } else {
        // Avoid cancellation by computing the larger-magnitude root first.
        let sqrt_disc = discriminant.sqrt();
        let big = -0.5 * (p + p.signum() * sqrt_disc);
        vec![big, q / big]
    }
}

/// Solves `a x³ + b x² + c x + d = 0` with Cardano's method, falling back to
/// the quadratic solve when `a` is zero.
#[must_use]
pub fn solve_cubic(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    if a == 0.0 {
        return solve_quadratic(b, c, d);
    }

    // Monic form x³ + a2 x² + a1 x + a0.
    let a2 = b / a;
    let a1 = c / a;
    let a0 = d / a;

    // Depressed cubic y³ + p y + q = 0 with x = y - a2/3.
    let shift = a2 / 3.0;
    let p = a1 - a2 * a2 / 3.0;
    let q = 2.0 * a2 * a2 * a2 / 27.0 - a2 * a1 / 3.0 + a0;

    let half_q = q * 0.5;
    let third_p = p / 3.0;
    let cube = third_p * third_p * third_p;
    let discriminant = half_q * half_q + cube;
    let discriminant_scale = half_q * half_q + cube.abs();
    let p_scale = a2 * a2 / 3.0 + a1.abs();

    if discriminant.abs() <= DISCRIMINANT_TOLERANCE * discriminant_scale {
        if p.abs() <= DISCRIMINANT_TOLERANCE * p_scale {
            // Triple root.
            vec![-shift]
        } else {
            // One simple root and one double root.
            let simple = 3.0 * q / p;
            let double = -1.5 * q / p;
            vec![simple - shift, double - shift]
        }
    } else if discriminant > 0.0 {
        // One real root.
        let sqrt_disc = discriminant.sqrt();
        let u = (-half_q + sqrt_disc).cbrt();
        let v = (-half_q - sqrt_disc).cbrt();
        vec![u + v - shift]
    } else {
        // Three distinct real roots: trigonometric form.
        let r = (-third_p * third_p * third_p).sqrt();
        let phi = (-half_q / r).clamp(-1.0, 1.0).acos();
        let m = 2.0 * r.cbrt();
        (0..3)
            .map(|k| m * ((phi + 2.0 * PI * f64::from(k)) / 3.0).cos() - shift)
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn assert_roots(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len(), "roots={actual:?}");
        let mut actual = actual.to_vec();
        let mut expected = expected.to_vec();
        actual.sort_by(f64::total_cmp);
        expected.sort_by(f64::total_cmp);
        for (a, e) in actual.iter().zip(&expected) {
            assert_abs_diff_eq!(a, e, epsilon = 1e-6);
        }
    }

    #[test]
    fn cubic_from_three_known_roots() {
        let poly = Polynomial::from_roots(&[-2.0, 0.5, 3.0]);
        assert_eq!(poly.degree(), 3);
        assert_roots(&poly.real_roots().unwrap(), &[-2.0, 0.5, 3.0]);
    }

    #[test]
    fn cubic_with_closely_spaced_roots() {
        for roots in [[0.01, 0.02, 0.03], [0.001, 0.002, 0.003]] {
            let poly = Polynomial::from_roots(&roots);
            let found = poly.real_roots().unwrap();
            assert_eq!(found.len(), 3, "roots={found:?}");
            for (a, e) in found.iter().zip(&roots) {
                assert_abs_diff_eq!(a, e, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn cubic_with_small_constant_term_is_not_a_triple_root() {
        // x³ - 1e-9 has the single real root 1e-3.
        let roots = solve_cubic(1.0, 0.0, 0.0, -1e-9);
        assert_roots(&roots, &[1e-3]);
        assert_abs_diff_eq!(roots[0], 1e-3, epsilon = 1e-12);
    }

    #[test]
    fn quadratic_with_closely_spaced_roots() {
        let mut roots = solve_quadratic(1.0, -(1.0e-4 + 1.0001e-4), 1.0e-4 * 1.0001e-4);
        assert_eq!(roots.len(), 2, "roots={roots:?}");
        roots.sort_by(f64::total_cmp);
        assert_abs_diff_eq!(roots[0], 1.0e-4, epsilon = 1e-12);
        assert_abs_diff_eq!(roots[1], 1.0001e-4, epsilon = 1e-12);
    }

    #[test]
    fn cubic_with_one_real_root() {
        // (x - 1)(x² + 1)
        let poly = Polynomial::new(&[-1.0, 1.0, -1.0, 1.0]);
        assert_roots(&poly.real_roots().unwrap(), &[1.0]);
    }

    #[test]
    fn cubic_with_double_root() {
        let poly = Polynomial::from_roots(&[2.0, 2.0, -1.0]);
        assert_roots(&poly.real_roots().unwrap(), &[-1.0, 2.0]);
    }

    #[test]
    fn cubic_with_triple_root() {
        let poly = Polynomial::from_roots(&[1.5, 1.5, 1.5]);
        assert_roots(&poly.real_roots().unwrap(), &[1.5]);
    }

    #[test]
    fn quadratic_two_roots() {
        let poly = Polynomial::from_roots(&[-3.0, 4.0]);
        assert_roots(&poly.real_roots().unwrap(), &[-3.0, 4.0]);
    }

    #[test]
    fn quadratic_tangent_root() {
        let poly = Polynomial::new(&[1.0, -2.0, 1.0]);
        assert_roots(&poly.real_roots().unwrap(), &[1.0]);
    }

    #[test]
    fn quadratic_no_real_roots() {
        let poly = Polynomial::new(&[1.0, 0.0, 1.0]);
        assert!(poly.real_roots().unwrap().is_empty());
    }

    #[test]
    fn linear_root() {
        let poly = Polynomial::new(&[3.0, 2.0]);
        assert_roots(&poly.real_roots().unwrap(), &[-1.5]);
    }

    #[test]
    fn tiny_leading_coefficient_downgrades_degree() {
        // 1e-9 x³ is stripped, leaving x² - 1.
        let poly = Polynomial::new(&[-1.0, 0.0, 1.0, 1e-9]);
        assert_eq!(poly.simplify().degree(), 2);
        assert_roots(&poly.real_roots().unwrap(), &[-1.0, 1.0]);
    }

    #[test]
    fn constant_has_no_roots() {
        assert!(Polynomial::new(&[5.0]).real_roots().unwrap().is_empty());
        assert!(Polynomial::new(&[]).real_roots().unwrap().is_empty());
    }

    #[test]
    fn quartic_is_rejected() {
        let poly = Polynomial::from_roots(&[1.0, 2.0, 3.0, 4.0]);
        assert!(poly.real_roots().is_err());
    }

    #[test]
    fn derivative_and_evaluate() {
        let poly = Polynomial::new(&[1.0, 2.0, 3.0]);
        assert_abs_diff_eq!(poly.evaluate(2.0), 17.0, epsilon = 1e-12);
        let d = poly.derivative();
        assert_eq!(d.coefficients(), &[2.0, 6.0]);
    }
}
