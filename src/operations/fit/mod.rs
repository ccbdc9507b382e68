//! Least-squares fitting of cubic Bezier curves to sampled points.
//!
//! Follows Schneider's algorithm: chord-length parametrization, a 2x2
//! least-squares solve for the handle lengths along fixed end tangents,
//! Newton reparametrization when the fit is close, and a split at the point
//! of maximum error otherwise.

use std::ops::Range;

use nalgebra::Matrix2;
use tracing::{debug, trace};

use crate::error::{OperationError, Result};
use crate::geometry::segment::{Bezier, ControlPolygon, Segment};
use crate::math::polynomial::Polynomial;
use crate::math::{try_normalize, Point2, Vector2, TOLERANCE};

/// Reparametrization rounds attempted before splitting.
pub const MAX_ITERATIONS: usize = 4;

/// A fit whose error is within this multiple of the tolerance is improved by
/// reparametrization instead of being split right away.
pub const ITERATION_ERROR_RATIO: f64 = 4.0;

/// Maximum split depth; deeper ranges keep their best single-curve fit.
pub const MAX_FIT_DEPTH: u32 = 32;

/// Samples taken by [`Segment::arc_length_parametrization`].
const ARC_LENGTH_SAMPLES: usize = 32;

/// Fits a sequence of cubic Bezier curves through a point sample.
///
/// The tolerance bounds the *squared* distance between each sample and the
/// curve point at that sample's parameter.
#[derive(Debug, Clone)]
pub struct FitCurve<'a> {
    points: &'a [Point2],
    tolerance: f64,
    tangents: Option<(Vector2, Vector2)>,
}

impl<'a> FitCurve<'a> {
    /// Creates a new `FitCurve` operation.
    #[must_use]
    pub fn new(points: &'a [Point2], tolerance: f64) -> Self {
        Self {
            points,
            tolerance,
            tangents: None,
        }
    }

    /// Constrains the end tangents, both given in the direction of travel.
    ///
    /// By default they are taken from the first and last pair of samples.
    #[must_use]
    pub fn with_tangents(mut self, start: Vector2, end: Vector2) -> Self {
        self.tangents = Some((start, end));
        self
    }

    /// Executes the fit.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] if the tolerance is not
    /// positive, fewer than two distinct points are given, or a supplied
    /// tangent has zero length.
    pub fn execute(&self) -> Result<Vec<Bezier>> {
        if self.tolerance.is_nan() || self.tolerance <= 0.0 {
            return Err(OperationError::InvalidInput(format!(
                "fit tolerance must be positive, got {}",
                self.tolerance
            ))
            .into());
        }

        let mut points: Vec<Point2> = Vec::with_capacity(self.points.len());
        for p in self.points {
            if !points.last().is_some_and(|last| (p - last).norm() <= TOLERANCE) {
                points.push(*p);
            }
        }
        if points.len() < 2 {
            return Err(OperationError::InvalidInput(
                "curve fitting needs at least two distinct points".into(),
            )
            .into());
        }

        let last = points.len() - 1;
        let (start, end) = match self.tangents {
            Some((start, end)) => (
                try_normalize(&start).ok_or_else(zero_tangent)?,
                -try_normalize(&end).ok_or_else(zero_tangent)?,
            ),
            None => (
                left_tangent(&points, 0),
                right_tangent(&points, last),
            ),
        };

        let curves = fit_cubic(&points, 0, last, start, end, self.tolerance);
        trace!(points = points.len(), curves = curves.len(), "fitted curve");
        Ok(curves)
    }
}

fn zero_tangent() -> crate::error::ContourError {
    OperationError::InvalidInput("fit tangent must be non-zero".into()).into()
}

/// Fits `points[first..=last]` with the classic tangent convention: `t_hat1`
/// points forward from the first sample, `t_hat2` points backward from the
/// last one. Both must be unit vectors.
///
/// Never fails: past [`MAX_FIT_DEPTH`] the best single curve is kept.
#[must_use]
pub fn fit_cubic(
    points: &[Point2],
    first: usize,
    last: usize,
    t_hat1: Vector2,
    t_hat2: Vector2,
    error: f64,
) -> Vec<Bezier> {
    let mut out = Vec::new();
    if first < last && last < points.len() {
        fit_recursive(points, first, last, t_hat1, t_hat2, error, 0, &mut out);
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn fit_recursive(
    points: &[Point2],
    first: usize,
    last: usize,
    t_hat1: Vector2,
    t_hat2: Vector2,
    error: f64,
    depth: u32,
    out: &mut Vec<Bezier>,
) {
    let d = &points[first..=last];
    let p0 = d[0];
    let p3 = d[d.len() - 1];

    if d.len() == 2 {
        let dist = (p3 - p0).norm() / 3.0;
        out.push(Bezier::new(p0, p0 + t_hat1 * dist, p3 + t_hat2 * dist, p3));
        return;
    }

    let mut u = chord_length_parameterize(d);
    let mut curve = generate_bezier(d, &u, t_hat1, t_hat2);
    let (mut max_error, mut split) = compute_max_error(d, &curve, &u);
    if max_error < error {
        out.push(curve);
        return;
    }

    if max_error < error * ITERATION_ERROR_RATIO {
        for _ in 0..MAX_ITERATIONS {
            u = reparameterize(d, &u, &curve);
            curve = generate_bezier(d, &u, t_hat1, t_hat2);
            (max_error, split) = compute_max_error(d, &curve, &u);
            if max_error < error {
                out.push(curve);
                return;
            }
        }
    }

    if depth >= MAX_FIT_DEPTH {
        debug!(depth, max_error, "curve fit depth limit reached");
        out.push(curve);
        return;
    }

    let center = first + split;
    let t_center = center_tangent(points, center);
    fit_recursive(points, first, center, t_hat1, t_center, error, depth + 1, out);
    fit_recursive(points, center, last, -t_center, t_hat2, error, depth + 1, out);
}

/// Unit tangent leaving sample `index` towards the next one.
fn left_tangent(points: &[Point2], index: usize) -> Vector2 {
    try_normalize(&(points[index + 1] - points[index])).unwrap_or_else(Vector2::x)
}

/// Unit tangent leaving sample `index` towards the previous one.
fn right_tangent(points: &[Point2], index: usize) -> Vector2 {
    try_normalize(&(points[index - 1] - points[index])).unwrap_or_else(|| -Vector2::x())
}

/// Tangent at an interior sample, pointing back towards the previous one.
fn center_tangent(points: &[Point2], center: usize) -> Vector2 {
    let v1 = points[center - 1] - points[center];
    let v2 = points[center] - points[center + 1];
    try_normalize(&((v1 + v2) * 0.5)).unwrap_or_else(|| right_tangent(points, center))
}

fn chord_length_parameterize(points: &[Point2]) -> Vec<f64> {
    let mut u = Vec::with_capacity(points.len());
    u.push(0.0);
    for pair in points.windows(2) {
        let previous = u[u.len() - 1];
        u.push(previous + (pair[1] - pair[0]).norm());
    }
    let total = u[u.len() - 1];
    if total > 0.0 {
        for value in &mut u {
            *value /= total;
        }
    }
    u
}

fn bernstein(u: f64) -> [f64; 4] {
    let v = 1.0 - u;
    [v * v * v, 3.0 * u * v * v, 3.0 * u * u * v, u * u * u]
}

/// Least-squares handle lengths along the end tangents.
///
/// Falls back to the Wu/Barsky heuristic (a third of the chord) when the
/// system is singular or yields non-positive lengths.
fn generate_bezier(points: &[Point2], u: &[f64], t_hat1: Vector2, t_hat2: Vector2) -> Bezier {
    let p0 = points[0];
    let p3 = points[points.len() - 1];

    let mut c = Matrix2::<f64>::zeros();
    let mut x = Vector2::zeros();
    for (point, &ui) in points.iter().zip(u) {
        let b = bernstein(ui);
        let a0 = t_hat1 * b[1];
        let a1 = t_hat2 * b[2];
        c[(0, 0)] += a0.dot(&a0);
        c[(0, 1)] += a0.dot(&a1);
        c[(1, 1)] += a1.dot(&a1);
        let tmp = point.coords - (p0.coords * (b[0] + b[1]) + p3.coords * (b[2] + b[3]));
        x[0] += a0.dot(&tmp);
        x[1] += a1.dot(&tmp);
    }
    c[(1, 0)] = c[(0, 1)];

    let chord = (p3 - p0).norm();
    let epsilon = 1e-6 * chord;
    let singular = c.determinant().abs() <= f64::EPSILON * c.norm_squared();
    let (alpha_l, alpha_r) = match c.try_inverse().filter(|_| !singular) {
        Some(inverse) => {
            let alpha = inverse * x;
            (alpha[0], alpha[1])
        }
        None => (0.0, 0.0),
    };
    let (alpha_l, alpha_r) = if alpha_l < epsilon || alpha_r < epsilon {
        (chord / 3.0, chord / 3.0)
    } else {
        (alpha_l, alpha_r)
    };

    Bezier::new(p0, p0 + t_hat1 * alpha_l, p3 + t_hat2 * alpha_r, p3)
}

/// Largest squared distance between a sample and its curve point, and the
/// sample index where it occurs.
fn compute_max_error(points: &[Point2], curve: &Bezier, u: &[f64]) -> (f64, usize) {
    let mut max_error = 0.0;
    let mut split = points.len() / 2;
    for i in 1..points.len() - 1 {
        let dist = (curve.point_at(u[i]) - points[i]).norm_squared();
        if dist >= max_error {
            max_error = dist;
            split = i;
        }
    }
    (max_error, split)
}

fn reparameterize(points: &[Point2], u: &[f64], curve: &Bezier) -> Vec<f64> {
    points
        .iter()
        .zip(u)
        .map(|(p, &ui)| newton_root(curve, p, ui))
        .collect()
}

/// One Newton step towards the parameter of the point on `curve` nearest `p`.
fn newton_root(curve: &Bezier, p: &Point2, u: f64) -> f64 {
    let diff = curve.point_at(u) - p;
    let d1 = curve.derivative_at(u);
    let d2 = curve.second_derivative_at(u);
    let numerator = diff.dot(&d1);
    let denominator = d1.dot(&d1) + diff.dot(&d2);
    if denominator.abs() < f64::EPSILON {
        return u;
    }
    (u - numerator / denominator).clamp(0.0, 1.0)
}

/// A scalar function approximated by curves fitted to `(x, f(x))` samples.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionApproximation {
    curves: Vec<Bezier>,
}

impl FunctionApproximation {
    #[must_use]
    pub fn curves(&self) -> &[Bezier] {
        &self.curves
    }

    /// Domain covered by the approximation.
    #[must_use]
    pub fn domain(&self) -> Range<f64> {
        match (self.curves.first(), self.curves.last()) {
            (Some(first), Some(last)) => first.sp().x..last.ep().x,
            _ => 0.0..0.0,
        }
    }

    /// Evaluates the approximation at `x`, clamping to the fitted domain.
    ///
    /// The curve spanning `x` is inverted in closed form: `x(t) = x` is a
    /// cubic in `t`.
    #[must_use]
    pub fn evaluate(&self, x: f64) -> f64 {
        let (Some(first), Some(last)) = (self.curves.first(), self.curves.last()) else {
            return 0.0;
        };
        if x <= first.sp().x {
            return first.sp().y;
        }
        if x >= last.ep().x {
            return last.ep().y;
        }
        let curve = self
            .curves
            .iter()
            .find(|curve| x <= curve.ep().x)
            .unwrap_or(last);

        let [p0, p1, p2, p3] = [curve.sp().x, curve.cp1().x, curve.cp2().x, curve.ep().x];
        let a = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
        let b = 3.0 * p0 - 6.0 * p1 + 3.0 * p2;
        let c = -3.0 * p0 + 3.0 * p1;
        let t = Polynomial::new(&[p0 - x, c, b, a])
            .real_roots()
            .unwrap_or_default()
            .into_iter()
            .filter(|t| (-1e-9..=1.0 + 1e-9).contains(t))
            .min_by(|l, r| l.total_cmp(r))
            .map_or_else(
                || (x - p0) / (p3 - p0).max(f64::EPSILON),
                |t| t.clamp(0.0, 1.0),
            );
        curve.point_at(t).y
    }
}

/// Approximates `f` over `range` by fitting curves to `samples` evenly
/// spaced points.
///
/// # Errors
///
/// Returns [`OperationError::InvalidInput`] if the range is empty or fewer
/// than two samples are requested, and propagates fit errors.
pub fn fit_function<F>(
    f: F,
    range: Range<f64>,
    samples: usize,
    tolerance: f64,
) -> Result<FunctionApproximation>
where
    F: Fn(f64) -> f64,
{
    if samples < 2 || range.is_empty() {
        return Err(OperationError::InvalidInput(format!(
            "cannot fit a function over {range:?} with {samples} samples"
        ))
        .into());
    }
    #[allow(clippy::cast_precision_loss)]
    let step = (range.end - range.start) / (samples - 1) as f64;
    let points: Vec<Point2> = (0..samples)
        .map(|i| {
            #[allow(clippy::cast_precision_loss)]
            let x = if i + 1 == samples {
                range.end
            } else {
                range.start + step * i as f64
            };
            Point2::new(x, f(x))
        })
        .collect();
    let curves = FitCurve::new(&points, tolerance).execute()?;
    Ok(FunctionApproximation { curves })
}

impl Segment {
    /// Approximates the parameter as a function of arc length, `t(s)`.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for a zero-length segment.
    pub fn arc_length_parametrization(&self, tolerance: f64) -> Result<FunctionApproximation> {
        let length = self.arc_length();
        if length <= TOLERANCE {
            return Err(OperationError::InvalidInput(
                "zero-length segment has no arc length parametrization".into(),
            )
            .into());
        }
        fit_function(
            |s| self.parameter_at_length(s),
            0.0..length,
            ARC_LENGTH_SAMPLES,
            tolerance,
        )
    }
}
