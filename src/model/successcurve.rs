use tracing::debug;

use crate::math::curve::curve::{
    Curve,
    SampledCurve
};
use crate::math::curve::monotonespline::{
    MonotoneSpline,
    MonotoneSplineFitter
};
use crate::model::anchorspec::{
    effort_grid,
    SuccessAnchors,
    ANCHOR_MONTHS
};
use crate::modelerror::ModelError;

/// Behaviour of the success curve past the last anchor (36 months).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostAnchorPolicy {
    /// The spline's own gentle extrapolation; used for plotting.
    Extrapolate,
    /// The value at the last anchor, held constant; used by the
    /// fatalities pipeline.
    Plateau,
}

/// Probability of success as a function of months of effort.
pub struct SuccessGivenEffortModel {
    anchors: SuccessAnchors,
    spline: MonotoneSpline,
    last_anchor_month: f64,
    plateau: f64,
}

impl SuccessGivenEffortModel {
    pub fn new(anchors: SuccessAnchors) -> Result<SuccessGivenEffortModel, ModelError> {
        anchors.validate()?;
        let (xs_log, ys) = anchors.fit_points();
        let spline = MonotoneSplineFitter::damped_success().fit(&xs_log, &ys)?;
        let last_anchor_month = ANCHOR_MONTHS[ANCHOR_MONTHS.len() - 1];
        let plateau = spline.value(last_anchor_month);
        Ok(SuccessGivenEffortModel { anchors, spline, last_anchor_month, plateau })
    }

    pub fn anchors(&self) -> SuccessAnchors {
        self.anchors
    }

    pub fn spline(&self) -> &MonotoneSpline {
        &self.spline
    }

    pub fn plateau(&self) -> f64 {
        self.plateau
    }

    pub fn probability(&self, months: f64, policy: PostAnchorPolicy) -> f64 {
        match policy {
            PostAnchorPolicy::Plateau if months > self.last_anchor_month => self.plateau,
            _ => self.spline.value(months),
        }
    }

    pub fn curve(&self, grid: &[f64], policy: PostAnchorPolicy) -> SampledCurve {
        SampledCurve::from_fn(grid, |m| self.probability(m, policy))
    }
}

/// `{time, successProbability}` on the 101-point grid over
/// `[0.1, max_time_months]`.
pub fn compute_success_curve(
    anchors: SuccessAnchors,
    max_time_months: f64,
    policy: PostAnchorPolicy,
) -> Result<SampledCurve, ModelError> {
    let max_time_months = ModelError::check_positive("max_time_months", max_time_months)?;
    let model = SuccessGivenEffortModel::new(anchors)?;
    let curve = model.curve(&effort_grid(max_time_months), policy);
    debug!(?anchors, ?policy, points = curve.len(), "success curve built");
    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> SuccessGivenEffortModel {
        SuccessGivenEffortModel::new(SuccessAnchors::new(0.1, 3.0, 10.0)).unwrap()
    }

    #[test]
    fn matches_anchor_values() {
        let m = model();
        let p = PostAnchorPolicy::Extrapolate;
        assert!((m.probability(0.1, p)).abs() < 1e-12);
        assert!((m.probability(3.0, p) - 0.001).abs() < 1e-9);
        assert!((m.probability(12.0, p) - 0.03).abs() < 1e-9);
        assert!((m.probability(36.0, p) - 0.10).abs() < 1e-9);
    }

    #[test]
    fn two_post_anchor_policies_differ() {
        let m = model();
        let plateau = m.probability(60.0, PostAnchorPolicy::Plateau);
        let extrapolated = m.probability(60.0, PostAnchorPolicy::Extrapolate);
        assert_eq!(plateau, m.probability(36.0, PostAnchorPolicy::Extrapolate));
        assert!(extrapolated > plateau);
        assert!(extrapolated <= 1.0);
    }

    #[test]
    fn policies_agree_before_last_anchor() {
        let m = model();
        for months in [0.5, 3.0, 10.0, 30.0, 36.0] {
            assert_eq!(
                m.probability(months, PostAnchorPolicy::Plateau),
                m.probability(months, PostAnchorPolicy::Extrapolate)
            );
        }
    }

    #[test]
    fn curve_respects_max_time() {
        let curve = compute_success_curve(SuccessAnchors::new(1.0, 5.0, 20.0), 48.0, PostAnchorPolicy::Extrapolate).unwrap();
        assert_eq!(curve.len(), 101);
        assert!((curve.points()[100].x - 48.0).abs() < 1e-9);
        assert!(curve.is_non_decreasing());
        assert!(compute_success_curve(SuccessAnchors::new(1.0, 5.0, 20.0), 0.0, PostAnchorPolicy::Plateau).is_err());
    }

    #[test]
    fn rejects_out_of_range_percentages() {
        assert!(SuccessGivenEffortModel::new(SuccessAnchors::new(1.0, 5.0, 120.0)).is_err());
    }
}
