use std::rc::Rc;

use serde::{
    Deserialize,
    Serialize
};
use tracing::debug;

use crate::math::curve::controlpoint::ControlPointSet;
use crate::math::curve::curve::{
    Curve,
    CurvePoint
};
use crate::math::curve::nonparametriccurve::nonparametriccurve::{
    NonparametricCurve,
    Point2D
};
use crate::math::curve::nonparametriccurve::piecewisepolynomial::{
    PiecewisePolynomial,
    PolynomialType
};
use crate::math::curve::resampler::cachebackend::{
    CacheBackend,
    RefCellBackend
};
use crate::revision::Revisioned;

/// 延伸割線的起點：最後一個控制點往前的距離。
pub const TANGENT_OFFSET: f64 = 5.0;
pub const DEFAULT_INVERSE_SAMPLES: usize = 1000;

/// 切線延伸不可超過的繪圖邊界。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResamplerBounds {
    pub x_max: f64,
    pub y_max: f64,
}

// ─────────────────────────────────────────────
// 正向查詢
// ─────────────────────────────────────────────

struct TangentExtension {
    start: Point2D,
    end: Point2D,
    slope: f64,
}

impl TangentExtension {
    fn value(&self, x: f64) -> f64 {
        if x >= self.end.x() {
            self.end.y()
        } else {
            self.start.y() + self.slope * (x - self.start.x())
        }
    }
}

struct ForwardCurve {
    interior: PiecewisePolynomial,
    first: Point2D,
    last: Point2D,
    extension: Option<TangentExtension>,
}

impl ForwardCurve {
    fn build(points: &ControlPointSet, bounds: ResamplerBounds) -> Option<ForwardCurve> {
        let knots = points.to_point2d();
        let first = *knots.first()?;
        let last = *knots.last()?;
        let interior = PiecewisePolynomial::new(PolynomialType::MonotoneX, knots)?;
        let extension = Self::extension(&interior, first, last, bounds);
        Some(ForwardCurve { interior, first, last, extension })
    }

    /// 從最後一點往前 `TANGENT_OFFSET` 取割線，延伸到 `x_max`，並在 `y_max` 截斷。
    /// 割線斜率非有限值時回傳 `None`。
    fn extension(
        interior: &PiecewisePolynomial,
        first: Point2D,
        last: Point2D,
        bounds: ResamplerBounds,
    ) -> Option<TangentExtension> {
        let ref_x = (last.x() - TANGENT_OFFSET).max(first.x());
        let dx = last.x() - ref_x;
        if dx <= 0.0 {
            return None;
        }
        let slope = (last.y() - interior.value(ref_x)) / dx;
        if !slope.is_finite() {
            return None;
        }

        let mut end_x = bounds.x_max.max(last.x());
        let mut end_y = last.y() + slope * (end_x - last.x());
        if end_y > bounds.y_max && slope > 0.0 {
            end_x = (last.x() + (bounds.y_max - last.y()) / slope).max(last.x());
            end_y = last.y() + slope * (end_x - last.x());
        }
        Some(TangentExtension {
            start: last,
            end: Point2D::new(end_x, end_y),
            slope,
        })
    }

    fn value(&self, x: f64) -> f64 {
        if x <= self.first.x() {
            self.first.y()
        } else if x <= self.last.x() {
            self.interior.value(x)
        } else {
            match &self.extension {
                Some(ext) => ext.value(x),
                None => self.last.y(),
            }
        }
    }
}

enum InverseCurve {
    Constant(f64),
    Table(PiecewisePolynomial),
}

impl InverseCurve {
    fn value(&self, y: f64) -> f64 {
        match self {
            InverseCurve::Constant(x) => *x,
            InverseCurve::Table(table) => table.value(y),
        }
    }
}

// ─────────────────────────────────────────────
// CurveResampler
// ─────────────────────────────────────────────

/// Dense forward and inverse lookups over a draggable monotone polyline.
///
/// The resampler owns its points and one cache per direction, both keyed
/// by the point set's revision. Each use site should own its own instance.
pub struct CurveResampler {
    points: ControlPointSet,
    bounds: ResamplerBounds,
    inverse_samples: usize,
    forward_cache: RefCellBackend<Option<Rc<ForwardCurve>>>,
    inverse_cache: RefCellBackend<Option<Rc<InverseCurve>>>,
}

impl CurveResampler {
    pub fn new(points: ControlPointSet, bounds: ResamplerBounds) -> CurveResampler {
        Self::with_inverse_samples(points, bounds, DEFAULT_INVERSE_SAMPLES)
    }

    pub fn with_inverse_samples(
        points: ControlPointSet,
        bounds: ResamplerBounds,
        inverse_samples: usize,
    ) -> CurveResampler {
        CurveResampler {
            points,
            bounds,
            inverse_samples: inverse_samples.max(2),
            forward_cache: RefCellBackend::new(),
            inverse_cache: RefCellBackend::new(),
        }
    }

    pub fn points(&self) -> &ControlPointSet {
        &self.points
    }

    /// 透過這個 handle 的修改會產生新的 revision，下次查詢時兩個 cache 都會重建。
    pub fn points_mut(&mut self) -> &mut ControlPointSet {
        &mut self.points
    }

    pub fn set_points(&mut self, points: ControlPointSet) {
        self.points = points;
    }

    pub fn bounds(&self) -> ResamplerBounds {
        self.bounds
    }

    pub fn set_bounds(&mut self, bounds: ResamplerBounds) {
        self.bounds = bounds;
        self.forward_cache.invalidate();
        self.inverse_cache.invalidate();
    }

    pub fn forward_builds(&self) -> usize {
        self.forward_cache.builds()
    }

    pub fn inverse_builds(&self) -> usize {
        self.inverse_cache.builds()
    }

    fn forward(&self) -> Option<Rc<ForwardCurve>> {
        let revision = self.points.revision();
        self.forward_cache.get_or_build(revision, || {
            debug!(%revision, points = self.points.len(), "rebuilding forward resampler");
            ForwardCurve::build(&self.points, self.bounds).map(Rc::new)
        })
    }

    fn inverse(&self) -> Option<Rc<InverseCurve>> {
        let revision = self.points.revision();
        self.inverse_cache.get_or_build(revision, || {
            debug!(%revision, samples = self.inverse_samples, "rebuilding inverse resampler");
            let forward = self.forward()?;
            let (lo, hi) = (forward.interior.min_x(), forward.interior.max_x());
            let last_index = (self.inverse_samples - 1) as f64;

            let mut knots: Vec<Point2D> = Vec::with_capacity(self.inverse_samples);
            for i in 0..self.inverse_samples {
                let x = lo + (hi - lo) * i as f64 / last_index;
                let y = forward.value(x);
                // 節點存成 (y, x)；平坦區段保留第一個 x
                if knots.last().is_none_or(|k| y > k.x()) {
                    knots.push(Point2D::new(y, x));
                }
            }
            let inverse = if knots.len() == 1 {
                InverseCurve::Constant(knots[0].y())
            } else {
                InverseCurve::Table(PiecewisePolynomial::new(PolynomialType::Linear, knots)?)
            };
            Some(Rc::new(inverse))
        })
    }

    /// `y` at `x`. Before the first point the first `y` is returned; past
    /// the last point the tangent extension applies. `None` for fewer than
    /// two usable points.
    pub fn value_at(&self, x: f64) -> Option<f64> {
        self.forward().map(|f| f.value(x))
    }

    /// 曲線到達 `y` 時的 `x`，限制在取樣範圍內。
    pub fn inverse_at(&self, y: f64) -> Option<f64> {
        self.inverse().map(|inv| inv.value(y))
    }

    /// `[last point, extension end]`, or empty when no extension exists.
    pub fn tangent_extension(&self) -> Vec<CurvePoint> {
        self.forward()
            .and_then(|f| {
                f.extension.as_ref().map(|ext| vec![
                    CurvePoint::new(ext.start.x(), ext.start.y()),
                    CurvePoint::new(ext.end.x(), ext.end.y()),
                ])
            })
            .unwrap_or_default()
    }

    /// Evenly spaced samples of the forward curve over `[from, to]`.
    pub fn sample(&self, from: f64, to: f64, count: usize) -> Vec<CurvePoint> {
        let Some(forward) = self.forward() else {
            return Vec::new();
        };
        let denom = count.saturating_sub(1).max(1) as f64;
        (0..count)
            .map(|i| {
                let x = from + (to - from) * i as f64 / denom;
                CurvePoint::new(x, forward.value(x))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::curve::controlpoint::ControlPoint;

    fn bounds() -> ResamplerBounds {
        ResamplerBounds { x_max: 100.0, y_max: 50.0 }
    }

    fn resampler() -> CurveResampler {
        CurveResampler::new(
            ControlPointSet::new(vec![
                ControlPoint::fixed(0.0, 0.0),
                ControlPoint::new(10.0, 4.0),
                ControlPoint::new(20.0, 10.0),
                ControlPoint::new(40.0, 20.0),
            ]),
            bounds(),
        )
    }

    #[test]
    fn passes_through_control_points() {
        let r = resampler();
        for p in r.points().points() {
            assert!((r.value_at(p.x).unwrap() - p.y).abs() < 1e-9);
        }
        assert_eq!(r.value_at(-3.0), Some(0.0));
    }

    #[test]
    fn extension_follows_last_secant_and_stops_at_bounds() {
        let r = resampler();
        let ext = r.tangent_extension();
        assert_eq!(ext.len(), 2);
        assert_eq!(ext[0], CurvePoint::new(40.0, 20.0));

        let slope = (20.0 - r.value_at(35.0).unwrap()) / 5.0;
        let end = ext[1];
        assert!(end.x <= 100.0 + 1e-9 && end.y <= 50.0 + 1e-9);
        assert!(((end.y - 20.0) / (end.x - 40.0) - slope).abs() < 1e-9);
        assert!((r.value_at(45.0).unwrap() - (20.0 + 5.0 * slope)).abs() < 1e-9);
        assert!((r.value_at(1e6).unwrap() - end.y).abs() < 1e-9);
    }

    #[test]
    fn inverse_round_trips_inside_domain() {
        let r = resampler();
        for i in 1..40 {
            let x = i as f64;
            let y = r.value_at(x).unwrap();
            assert!((r.inverse_at(y).unwrap() - x).abs() < 0.5, "x={x}");
        }
    }

    #[test]
    fn inverse_clamps_outside_range() {
        let r = resampler();
        assert!((r.inverse_at(-5.0).unwrap() - 0.0).abs() < 1e-12);
        assert!((r.inverse_at(500.0).unwrap() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn caches_rebuild_only_on_new_revision() {
        let mut r = resampler();
        for i in 0..50 {
            r.value_at(i as f64);
            r.inverse_at(i as f64 / 5.0);
        }
        assert_eq!(r.forward_builds(), 1);
        assert_eq!(r.inverse_builds(), 1);

        assert!(r.points_mut().move_point(2, 22.0, 11.0));
        r.value_at(5.0);
        r.inverse_at(5.0);
        assert_eq!(r.forward_builds(), 2);
        assert_eq!(r.inverse_builds(), 2);

        let same_content = ControlPointSet::new(r.points().points().to_vec());
        r.set_points(same_content);
        r.value_at(5.0);
        assert_eq!(r.forward_builds(), 3);
    }

    #[test]
    fn degenerate_sets_are_soft() {
        let r = CurveResampler::new(ControlPointSet::new(vec![ControlPoint::fixed(0.0, 0.0)]), bounds());
        assert_eq!(r.value_at(1.0), None);
        assert_eq!(r.inverse_at(1.0), None);
        assert!(r.tangent_extension().is_empty());
        assert!(r.sample(0.0, 1.0, 5).is_empty());
    }

    #[test]
    fn flat_curve_inverse_returns_start() {
        let r = CurveResampler::new(
            ControlPointSet::new(vec![ControlPoint::new(0.0, 2.0), ControlPoint::new(10.0, 2.0)]),
            bounds(),
        );
        assert_eq!(r.inverse_at(2.0), Some(0.0));
        assert_eq!(r.value_at(30.0), Some(2.0));
    }
}
