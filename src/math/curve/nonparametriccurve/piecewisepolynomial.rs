use crate::math::curve::curve::Curve;
use crate::math::curve::nonparametriccurve::nonparametriccurve::{
    NonparametricCurve,
    Point2D
};

// ─────────────────────────────────────────────
// Subpolynomial
// ─────────────────────────────────────────────

struct Subpolynomial {
    coefs: Vec<f64>,
    lhs_x: f64,
}

impl Subpolynomial {
    fn new(coefs: Vec<f64>, lhs_x: f64) -> Subpolynomial {
        Subpolynomial { coefs, lhs_x }
    }

    /// Horner 形式，係數由最高次項往下存。
    fn value(&self, x: f64) -> f64 {
        let x_diff = x - self.lhs_x;
        let mut result = self.coefs[0];
        for &beta in &self.coefs[1..] {
            result = f64::mul_add(result, x_diff, beta);
        }
        result
    }
}

// ─────────────────────────────────────────────
// Linear
// ─────────────────────────────────────────────

fn generate_linear_coef_list(points: &[Point2D]) -> Vec<Vec<f64>> {
    (0..(points.len() - 1))
        .map(|i| vec![
            Point2D::slope(&points[i], &points[i + 1]),
            points[i].y(),
        ])
        .collect()
}

// ─────────────────────────────────────────────
// 共用輔助函數
// ─────────────────────────────────────────────

/// 從各節點的一階導數（Hermite slopes）t[0..=n] 計算各區間的三次多項式係數。
///
/// 每段多項式存成 [d, c, b, a]，對應：
///   S_i(x) = a + b*(x-x_i) + c*(x-x_i)^2 + d*(x-x_i)^3
fn cubic_coefs_from_hermite(points: &[Point2D], h: &[f64], t: &[f64]) -> Vec<Vec<f64>> {
    (0..h.len())
        .map(|i| {
            let dy = points[i + 1].y() - points[i].y();
            let a = points[i].y();
            let b = t[i];
            let c = (3.0 * dy / h[i] - 2.0 * t[i] - t[i + 1]) / h[i];
            let d = (-2.0 * dy / h[i] + t[i] + t[i + 1]) / (h[i] * h[i]);
            vec![d, c, b, a]
        })
        .collect()
}

// ─────────────────────────────────────────────
// MonotoneX (Steffen)
// ─────────────────────────────────────────────
//
// 內部節點：
//   p    = (s[i-1]*h[i] + s[i]*h[i-1]) / (h[i-1] + h[i])
//   t[i] = (sgn(s[i-1]) + sgn(s[i])) * min(|s[i-1]|, |s[i]|, |p|/2)
// 其中 sgn(0) = +1，相鄰區間平坦時 t[i] = 0。
//
// 端點使用單側公式 t = (3*s - t_neighbour) / 2。
// 插值結果不會超出資料範圍（no overshoot）。

fn steffen_sign(v: f64) -> f64 {
    if v < 0.0 { -1.0 } else { 1.0 }
}

fn monotone_x_slopes(points: &[Point2D], h: &[f64]) -> Vec<f64> {
    let n = h.len();
    let s: Vec<f64> = (0..n)
        .map(|i| (points[i + 1].y() - points[i].y()) / h[i])
        .collect();

    if n == 1 {
        return vec![s[0], s[0]];
    }

    let mut t = vec![0.0_f64; n + 1];
    for i in 1..n {
        let p = (s[i - 1] * h[i] + s[i] * h[i - 1]) / (h[i - 1] + h[i]);
        let raw = (steffen_sign(s[i - 1]) + steffen_sign(s[i]))
            * s[i - 1].abs().min(s[i].abs()).min(0.5 * p.abs());
        t[i] = if raw.is_finite() { raw } else { 0.0 };
    }
    t[0] = (3.0 * s[0] - t[1]) / 2.0;
    t[n] = (3.0 * s[n - 1] - t[n - 1]) / 2.0;
    t
}

fn generate_monotone_x_coef_list(points: &[Point2D]) -> Vec<Vec<f64>> {
    let n = points.len() - 1;
    let h: Vec<f64> = (0..n).map(|i| points[i + 1].x() - points[i].x()).collect();
    let t = monotone_x_slopes(points, &h);
    cubic_coefs_from_hermite(points, &h, &t)
}

// ─────────────────────────────────────────────
// PolynomialType
// ─────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PolynomialType {
    Linear,
    /// Steffen 斜率的單調三次 Hermite，節點之間不會 overshoot。
    MonotoneX,
}

// ─────────────────────────────────────────────
// PiecewisePolynomial
// ─────────────────────────────────────────────

/// 通過嚴格遞增節點的分段多項式。
///
/// `[min_x, max_x]` 之外為水平外插，直接回傳端點值。
/// 需要其他外插規則的呼叫端請自行處理後再委派到這裡。
pub struct PiecewisePolynomial {
    max_x: f64,
    max_y: f64,
    polynomial_type: PolynomialType,
    subpolynomial_list: Vec<Subpolynomial>,
}

impl PiecewisePolynomial {
    /// 少於兩點、座標非有限值，或 `x` 非嚴格遞增時回傳 `None`。
    pub fn new(
        polynomial_type: PolynomialType,
        points: Vec<Point2D>,
    ) -> Option<PiecewisePolynomial> {
        if points.len() < 2 {
            return None;
        }
        let well_formed = points.iter().all(|p| p.x().is_finite() && p.y().is_finite())
            && points.windows(2).all(|w| w[1].x() > w[0].x());
        if !well_formed {
            return None;
        }

        let coef_list = match polynomial_type {
            PolynomialType::Linear    => generate_linear_coef_list(&points),
            PolynomialType::MonotoneX => generate_monotone_x_coef_list(&points),
        };

        let subpolynomial_list = coef_list
            .into_iter()
            .zip(points.iter())
            .map(|(coefs, pt)| Subpolynomial::new(coefs, pt.x()))
            .collect();

        let last = points.last()?;
        Some(PiecewisePolynomial {
            max_x: last.x(),
            max_y: last.y(),
            polynomial_type,
            subpolynomial_list,
        })
    }

    pub fn polynomial_type(&self) -> PolynomialType {
        self.polynomial_type
    }

    /// 左端點為 `<= x` 之最大節點的區間索引。
    fn find_segment(&self, x: f64) -> usize {
        self.subpolynomial_list
            .partition_point(|s| s.lhs_x <= x)
            .saturating_sub(1)
    }
}

// ─────────────────────────────────────────────
// Trait impls
// ─────────────────────────────────────────────

impl NonparametricCurve for PiecewisePolynomial {
    fn points(&self) -> Vec<Point2D> {
        let mut pts: Vec<Point2D> = self
            .subpolynomial_list
            .iter()
            .map(|s| Point2D::new(s.lhs_x, s.value(s.lhs_x)))
            .collect();
        pts.push(Point2D::new(self.max_x, self.max_y));
        pts
    }

    fn min_x(&self) -> f64 {
        self.subpolynomial_list[0].lhs_x
    }

    fn max_x(&self) -> f64 {
        self.max_x
    }
}

impl Curve for PiecewisePolynomial {
    fn value(&self, x: f64) -> f64 {
        let first = &self.subpolynomial_list[0];
        if x <= first.lhs_x {
            first.value(first.lhs_x)
        } else if x >= self.max_x {
            self.max_y
        } else {
            self.subpolynomial_list[self.find_segment(x)].value(x)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Point2D> {
        raw.iter().map(|&(x, y)| Point2D::new(x, y)).collect()
    }

    #[test]
    fn linear_hits_knots_and_midpoints() {
        let pp = PiecewisePolynomial::new(
            PolynomialType::Linear,
            pts(&[(0.0, 0.0), (1.0, 2.0), (3.0, 3.0)]),
        ).unwrap();
        assert!((pp.value(0.5) - 1.0).abs() < 1e-12);
        assert!((pp.value(1.0) - 2.0).abs() < 1e-12);
        assert!((pp.value(2.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn flat_outside_knots() {
        let pp = PiecewisePolynomial::new(
            PolynomialType::MonotoneX,
            pts(&[(1.0, 1.0), (2.0, 4.0), (4.0, 5.0)]),
        ).unwrap();
        assert_eq!(pp.value(-10.0), 1.0);
        assert_eq!(pp.value(10.0), 5.0);
        assert_eq!(pp.min_x(), 1.0);
        assert_eq!(pp.max_x(), 4.0);
    }

    #[test]
    fn monotone_x_does_not_overshoot() {
        let data = [(0.0, 0.0), (1.0, 0.0), (2.0, 10.0), (3.0, 10.0), (4.0, 11.0)];
        let pp = PiecewisePolynomial::new(PolynomialType::MonotoneX, pts(&data)).unwrap();
        let mut prev = f64::NEG_INFINITY;
        for i in 0..=400 {
            let x = 4.0 * i as f64 / 400.0;
            let v = pp.value(x);
            assert!(v >= prev - 1e-12, "decreasing at x={x}");
            assert!((-1e-12..=11.0 + 1e-12).contains(&v), "overshoot at x={x}: {v}");
            prev = v;
        }
        for &(x, y) in &data {
            assert!((pp.value(x) - y).abs() < 1e-12);
        }
    }

    #[test]
    fn two_points_degenerate_to_a_line() {
        let pp = PiecewisePolynomial::new(
            PolynomialType::MonotoneX,
            pts(&[(0.0, 0.0), (10.0, 5.0)]),
        ).unwrap();
        assert!((pp.value(4.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_unsorted_or_short_input() {
        assert!(PiecewisePolynomial::new(PolynomialType::Linear, pts(&[(0.0, 0.0)])).is_none());
        assert!(PiecewisePolynomial::new(
            PolynomialType::Linear,
            pts(&[(1.0, 0.0), (1.0, 1.0)])
        ).is_none());
        assert!(PiecewisePolynomial::new(
            PolynomialType::Linear,
            pts(&[(0.0, f64::NAN), (1.0, 1.0)])
        ).is_none());
    }
}
