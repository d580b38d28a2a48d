use tracing::debug;

use crate::math::curve::curve::{
    Curve,
    SampledCurve
};
use crate::math::curve::monotonespline::{
    BoundaryPolicy,
    MonotoneSpline,
    MonotoneSplineFitter,
    SignChangeTangent
};
use crate::model::anchorspec::{
    effort_grid,
    EffortAnchors,
    GRID_MAX_MONTHS
};
use crate::modelerror::ModelError;

/// Cumulative distribution of how long a novice attempt persists.
pub struct EffortCdfModel {
    anchors: EffortAnchors,
    spline: MonotoneSpline,
}

impl EffortCdfModel {
    pub fn new(anchors: EffortAnchors) -> Result<EffortCdfModel, ModelError> {
        Self::with_fitter(anchors, MonotoneSplineFitter::cumulative_distribution())
    }

    /// Same fit with the `min(slope)` tangent at sign changes.
    pub fn with_min_slope_tangents(anchors: EffortAnchors) -> Result<EffortCdfModel, ModelError> {
        let fitter = MonotoneSplineFitter::new(
            BoundaryPolicy::CumulativeDistribution,
            SignChangeTangent::MinSlope,
        );
        Self::with_fitter(anchors, fitter)
    }

    fn with_fitter(
        anchors: EffortAnchors,
        fitter: MonotoneSplineFitter,
    ) -> Result<EffortCdfModel, ModelError> {
        anchors.validate()?;
        let (xs_log, ys) = anchors.fit_points();
        let spline = fitter.fit(&xs_log, &ys)?;
        Ok(EffortCdfModel { anchors, spline })
    }

    pub fn anchors(&self) -> EffortAnchors {
        self.anchors
    }

    pub fn spline(&self) -> &MonotoneSpline {
        &self.spline
    }

    pub fn cumulative_probability(&self, months: f64) -> f64 {
        self.spline.value(months)
    }

    pub fn curve(&self, grid: &[f64]) -> SampledCurve {
        SampledCurve::from_fn(grid, |m| self.cumulative_probability(m))
    }
}

/// `{months, cumulativeProbability}` on the 101-point grid over `[0.1, 60]`.
pub fn compute_effort_cdf(anchors: EffortAnchors) -> Result<SampledCurve, ModelError> {
    let model = EffortCdfModel::new(anchors)?;
    let curve = model.curve(&effort_grid(GRID_MAX_MONTHS));
    debug!(?anchors, points = curve.len(), "effort cdf built");
    Ok(curve)
}
