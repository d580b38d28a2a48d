use serde::{
    Deserialize,
    Serialize
};

use crate::math::curve::nonparametriccurve::nonparametriccurve::Point2D;
use crate::math::curve::nonparametriccurve::piecewisepolynomial::{
    PiecewisePolynomial,
    PolynomialType
};

pub trait Curve {
    fn value(&self, x: f64) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f64,
    pub y: f64,
}

impl CurvePoint {
    pub fn new(x: f64, y: f64) -> CurvePoint {
        CurvePoint { x, y }
    }
}

/// `intervals + 1` points spaced evenly in `ln(x)` between `min` and `max`.
///
///   x_i = exp(ln(min) + (i/intervals) * (ln(max) - ln(min)))
pub fn log_spaced_grid(min: f64, max: f64, intervals: usize) -> Vec<f64> {
    let log_min = min.ln();
    let log_span = max.ln() - log_min;
    (0..=intervals)
        .map(|i| (log_min + (i as f64 / intervals as f64) * log_span).exp())
        .collect()
}

// ─────────────────────────────────────────────
// SampledCurve
// ─────────────────────────────────────────────

/// Dense, immutable curve samples ordered by `x`.
///
/// Every input change produces a new `SampledCurve`; nothing is patched in
/// place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampledCurve {
    points: Vec<CurvePoint>,
}

impl SampledCurve {
    pub fn from_points(points: Vec<CurvePoint>) -> SampledCurve {
        SampledCurve { points }
    }

    pub fn from_fn(grid: &[f64], f: impl Fn(f64) -> f64) -> SampledCurve {
        SampledCurve {
            points: grid.iter().map(|&x| CurvePoint::new(x, f(x))).collect(),
        }
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn xs(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.x).collect()
    }

    pub fn ys(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.y).collect()
    }

    pub fn shares_grid_with(&self, other: &SampledCurve, tol: f64) -> bool {
        self.len() == other.len()
            && self.points
                .iter()
                .zip(other.points.iter())
                .all(|(a, b)| (a.x - b.x).abs() <= tol)
    }

    pub fn is_non_decreasing(&self) -> bool {
        self.points.windows(2).all(|w| w[1].y >= w[0].y)
    }

    /// Linear interpolation of this curve onto `grid`, flat beyond both ends.
    ///
    /// Samples whose `x` does not strictly advance are skipped so the
    /// interpolant stays well defined.
    pub fn resample_onto(&self, grid: &[f64]) -> SampledCurve {
        let mut knots: Vec<Point2D> = Vec::with_capacity(self.points.len());
        for p in &self.points {
            if knots.last().is_none_or(|last| p.x > last.x()) {
                knots.push(Point2D::new(p.x, p.y));
            }
        }

        match knots.len() {
            0 => SampledCurve::from_points(Vec::new()),
            1 => {
                let y = knots[0].y();
                SampledCurve::from_fn(grid, |_| y)
            }
            _ => match PiecewisePolynomial::new(PolynomialType::Linear, knots) {
                Some(pp) => SampledCurve::from_fn(grid, |x| pp.value(x)),
                None => SampledCurve::from_points(Vec::new()),
            },
        }
    }
}
