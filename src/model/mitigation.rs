use tracing::debug;

use crate::math::curve::curve::{
    CurvePoint,
    SampledCurve
};
use crate::math::curve::resampler::curveresampler::CurveResampler;
use crate::modelerror::ModelError;

pub const DAYS_PER_MONTH: f64 = 30.0;

/// Stretches the time axis of a success curve by the time bans cost.
///
/// The ban-cost resampler maps cumulative queries executed to cumulative
/// days lost to bans and re-jailbreaking. Probabilities stay paired with
/// the effort increments they came from; only their time moves later.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MitigationTransform {
    queries_per_month: f64,
}

impl MitigationTransform {
    pub fn new(queries_per_month: f64) -> Result<MitigationTransform, ModelError> {
        let queries_per_month = ModelError::check_positive("queries_per_month", queries_per_month)?;
        Ok(MitigationTransform { queries_per_month })
    }

    pub fn queries_per_month(&self) -> f64 {
        self.queries_per_month
    }

    /// Days lost to bans between query totals `from` and `to`; never negative.
    fn jailbreak_days(&self, ban_cost: &CurveResampler, from: f64, to: f64) -> Result<f64, ModelError> {
        let lost = |queries: f64| {
            ban_cost.value_at(queries).ok_or(ModelError::InsufficientControlPoints {
                required: 2,
                given: ban_cost.points().len(),
            })
        };
        Ok((lost(to)? - lost(from)?).max(0.0))
    }

    pub fn apply(
        &self,
        pre_mitigation: &SampledCurve,
        ban_cost: &CurveResampler,
    ) -> Result<SampledCurve, ModelError> {
        let given = ban_cost.points().len();
        if given < 2 {
            return Err(ModelError::InsufficientControlPoints { required: 2, given });
        }
        if !ban_cost.points().is_monotone() {
            return Err(ModelError::InvalidAnchors(
                "ban cost points must increase in x and never decrease in y".to_string()
            ));
        }

        let pre = pre_mitigation.points();
        let Some(first) = pre.first() else {
            return Ok(SampledCurve::from_points(Vec::new()));
        };

        let mut stretched = Vec::with_capacity(pre.len());
        stretched.push(*first);
        let mut jailbreak_months = 0.0;
        for window in pre.windows(2) {
            let (prev, cur) = (window[0], window[1]);
            let queries_prev = prev.x * self.queries_per_month;
            let queries_cur = cur.x * self.queries_per_month;
            jailbreak_months += self.jailbreak_days(ban_cost, queries_prev, queries_cur)? / DAYS_PER_MONTH;
            stretched.push(CurvePoint::new(cur.x + jailbreak_months, cur.y));
        }

        debug!(
            queries_per_month = self.queries_per_month,
            added_months = jailbreak_months,
            "mitigation applied"
        );
        Ok(SampledCurve::from_points(stretched))
    }
}

/// Validated entry point; rejects a non-positive query rate.
pub fn apply_mitigation(
    pre_mitigation: &SampledCurve,
    queries_per_month: f64,
    ban_cost: &CurveResampler,
) -> Result<SampledCurve, ModelError> {
    MitigationTransform::new(queries_per_month)?.apply(pre_mitigation, ban_cost)
}
