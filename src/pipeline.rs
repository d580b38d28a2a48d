use serde::Serialize;
use tracing::{
    debug,
    warn
};

use crate::configuration::ModelParameters;
use crate::math::curve::controlpoint::ControlPointSet;
use crate::math::curve::curve::SampledCurve;
use crate::math::curve::resampler::curveresampler::CurveResampler;
use crate::model::anchorspec::{
    effort_grid,
    GRID_MAX_MONTHS
};
use crate::model::effortcdf::EffortCdfModel;
use crate::model::fatalities::compute_expected_fatalities;
use crate::model::mitigation::MitigationTransform;
use crate::model::successcurve::{
    compute_success_curve,
    PostAnchorPolicy,
    SuccessGivenEffortModel
};
use crate::modelerror::RiskResult;

/// Everything one evaluation produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelResult {
    pub baseline_fatalities: f64,
    pub pre_mitigation_fatalities: f64,
    pub post_mitigation_fatalities: f64,
    /// `pre - baseline`: what the assistant adds before mitigation.
    pub uplift_fatalities: f64,
    /// `(pre - post) / pre`, 0 when `pre` is 0.
    pub mitigated_fraction: f64,
    pub effort_cdf: SampledCurve,
    pub baseline_success: SampledCurve,
    pub pre_mitigation_success: SampledCurve,
    /// Pre-mitigation probabilities on the stretched time axis.
    pub post_mitigation_success: SampledCurve,
    /// `post_mitigation_success` resampled onto the effort grid.
    pub post_mitigation_on_grid: SampledCurve,
    /// Plotting curves over `[0.1, max_time_months]` with the spline's own
    /// extrapolation past 36 months.
    pub baseline_success_plot: SampledCurve,
    pub pre_mitigation_success_plot: SampledCurve,
}

/// Runs the whole composition for one parameter set.
///
/// Effort CDF and success curves share the 101-point grid; success values
/// past the last anchor are held at their 36-month value. The mitigated
/// curve is moved back onto that grid before aggregation.
pub fn run_pipeline(
    params: &ModelParameters,
    ban_cost: &CurveResampler,
) -> RiskResult<ModelResult> {
    params.validate()?;
    let grid = effort_grid(GRID_MAX_MONTHS);

    let effort_cdf = EffortCdfModel::new(params.effort_anchors)?.curve(&grid);
    let baseline_model = SuccessGivenEffortModel::new(params.baseline_success)?;
    let pre_model = SuccessGivenEffortModel::new(params.pre_mitigation_success)?;
    let baseline_success = baseline_model.curve(&grid, PostAnchorPolicy::Plateau);
    let pre_mitigation_success = pre_model.curve(&grid, PostAnchorPolicy::Plateau);
    debug!(points = grid.len(), "effort and success curves built");

    let post_mitigation_success = MitigationTransform::new(params.queries_per_month)?
        .apply(&pre_mitigation_success, ban_cost)?;
    let post_mitigation_on_grid = post_mitigation_success.resample_onto(&grid);

    let aggregate = |success: &SampledCurve| compute_expected_fatalities(
        &effort_cdf,
        success,
        params.annual_attempts,
        params.expected_damage_per_success,
    );
    let baseline_fatalities = aggregate(&baseline_success);
    let pre_mitigation_fatalities = aggregate(&pre_mitigation_success);
    let post_mitigation_fatalities = aggregate(&post_mitigation_on_grid);
    debug!(
        baseline_fatalities,
        pre_mitigation_fatalities,
        post_mitigation_fatalities,
        "expected fatalities aggregated"
    );

    let mitigated_fraction = if pre_mitigation_fatalities > 0.0 {
        (pre_mitigation_fatalities - post_mitigation_fatalities) / pre_mitigation_fatalities
    } else {
        0.0
    };

    Ok(ModelResult {
        baseline_fatalities,
        pre_mitigation_fatalities,
        post_mitigation_fatalities,
        uplift_fatalities: pre_mitigation_fatalities - baseline_fatalities,
        mitigated_fraction,
        baseline_success_plot: compute_success_curve(
            params.baseline_success, params.max_time_months, PostAnchorPolicy::Extrapolate,
        )?,
        pre_mitigation_success_plot: compute_success_curve(
            params.pre_mitigation_success, params.max_time_months, PostAnchorPolicy::Extrapolate,
        )?,
        effort_cdf,
        baseline_success,
        pre_mitigation_success,
        post_mitigation_success,
        post_mitigation_on_grid,
    })
}

// ─────────────────────────────────────────────
// RiskModelSession
// ─────────────────────────────────────────────

/// Interactive state: current parameters, the ban-cost resampler and the
/// last result that computed successfully.
///
/// A failed recompute reports its error and leaves the previous result in
/// place, so a transient invalid input never blanks the output.
pub struct RiskModelSession {
    params: ModelParameters,
    ban_cost: CurveResampler,
    last_good: Option<ModelResult>,
}

impl RiskModelSession {
    pub fn new(params: ModelParameters) -> RiskModelSession {
        let ban_cost = CurveResampler::new(
            ControlPointSet::new(params.ban_cost_points.clone()),
            params.ban_cost_bounds,
        );
        RiskModelSession { params, ban_cost, last_good: None }
    }

    pub fn parameters(&self) -> &ModelParameters {
        &self.params
    }

    /// Replaces the parameters; the ban-cost points are reloaded from them.
    pub fn set_parameters(&mut self, params: ModelParameters) {
        self.ban_cost.set_points(ControlPointSet::new(params.ban_cost_points.clone()));
        self.params = params;
        self.sync_ban_cost_bounds();
    }

    /// Applies an edit to the parameters. The edit sees the current ban-cost
    /// points, drags included; changed points or bounds are pushed into the
    /// resampler before the next recompute.
    pub fn update(&mut self, edit: impl FnOnce(&mut ModelParameters)) {
        self.params.ban_cost_points = self.ban_cost.points().points().to_vec();
        edit(&mut self.params);
        if self.params.ban_cost_points.as_slice() != self.ban_cost.points().points() {
            debug!(points = self.params.ban_cost_points.len(), "ban cost points reloaded from parameters");
            self.ban_cost.set_points(ControlPointSet::new(self.params.ban_cost_points.clone()));
        }
        self.sync_ban_cost_bounds();
    }

    fn sync_ban_cost_bounds(&mut self) {
        if self.ban_cost.bounds() != self.params.ban_cost_bounds {
            self.ban_cost.set_bounds(self.params.ban_cost_bounds);
        }
    }

    pub fn ban_cost(&self) -> &CurveResampler {
        &self.ban_cost
    }

    pub fn ban_cost_mut(&mut self) -> &mut ControlPointSet {
        self.ban_cost.points_mut()
    }

    pub fn last_result(&self) -> Option<&ModelResult> {
        self.last_good.as_ref()
    }

    pub fn recompute(&mut self) -> RiskResult<&ModelResult> {
        self.params.ban_cost_points = self.ban_cost.points().points().to_vec();
        self.sync_ban_cost_bounds();
        match run_pipeline(&self.params, &self.ban_cost) {
            Ok(result) => Ok(&*self.last_good.insert(result)),
            Err(err) => {
                warn!(error = %err, kept_previous = self.last_good.is_some(), "recompute failed");
                Err(err)
            }
        }
    }
}
