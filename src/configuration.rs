use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{
    Deserialize,
    Serialize
};

use crate::math::curve::controlpoint::ControlPoint;
use crate::math::curve::resampler::curveresampler::ResamplerBounds;
use crate::model::anchorspec::{
    EffortAnchors,
    SuccessAnchors,
    GRID_MAX_MONTHS
};
use crate::modelerror::{
    ModelError,
    RiskResult
};

fn default_ban_cost_points() -> Vec<ControlPoint> {
    vec![
        ControlPoint::fixed(0.0, 0.0),
        ControlPoint::new(1000.0, 5.0),
        ControlPoint::new(5000.0, 30.0),
        ControlPoint::new(10000.0, 75.0),
    ]
}

/// Every input of one model evaluation.
///
/// All fields default, so a JSON document only needs the values it
/// overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    pub effort_anchors: EffortAnchors,
    /// Success percentages without assistant uplift.
    pub baseline_success: SuccessAnchors,
    /// Success percentages with assistant uplift, before mitigation.
    pub pre_mitigation_success: SuccessAnchors,
    pub annual_attempts: f64,
    /// In millions of fatalities per successful attempt.
    pub expected_damage_per_success: f64,
    pub queries_per_month: f64,
    /// Cumulative queries executed -> cumulative days lost to bans.
    pub ban_cost_points: Vec<ControlPoint>,
    pub ban_cost_bounds: ResamplerBounds,
    /// Upper end of the plotted success curves.
    pub max_time_months: f64,
}

impl Default for ModelParameters {
    fn default() -> Self {
        ModelParameters {
            effort_anchors: EffortAnchors::default(),
            baseline_success: SuccessAnchors::new(0.1, 3.0, 10.0),
            pre_mitigation_success: SuccessAnchors::new(0.5, 6.0, 20.0),
            annual_attempts: 10.0,
            expected_damage_per_success: 1.0,
            queries_per_month: 300.0,
            ban_cost_points: default_ban_cost_points(),
            ban_cost_bounds: ResamplerBounds { x_max: 20000.0, y_max: 365.0 },
            max_time_months: GRID_MAX_MONTHS,
        }
    }
}

impl ModelParameters {
    pub fn from_reader(file_path: impl AsRef<Path>) -> RiskResult<ModelParameters> {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);
        let params: ModelParameters = serde_json::from_reader(reader)?;
        Ok(params)
    }

    pub fn from_json_str(json: &str) -> RiskResult<ModelParameters> {
        Ok(serde_json::from_str(json)?)
    }

    /// Scalar checks. Anchor checks happen where the curves are built.
    pub fn validate(&self) -> RiskResult<()> {
        ModelError::check_positive("annual_attempts", self.annual_attempts)?;
        ModelError::check_positive("expected_damage_per_success", self.expected_damage_per_success)?;
        ModelError::check_positive("queries_per_month", self.queries_per_month)?;
        ModelError::check_positive("max_time_months", self.max_time_months)?;
        ModelError::check_positive("ban_cost_bounds.x_max", self.ban_cost_bounds.x_max)?;
        ModelError::check_positive("ban_cost_bounds.y_max", self.ban_cost_bounds.y_max)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ModelParameters::default().validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let params = ModelParameters::from_json_str(
            r#"{ "annual_attempts": 25, "effort_anchors": { "kind": "three_point", "p1": 80, "p2": 90, "p3": 99 } }"#
        ).unwrap();
        assert_eq!(params.annual_attempts, 25.0);
        assert_eq!(params.effort_anchors, EffortAnchors::ThreePoint { p1: 80.0, p2: 90.0, p3: 99.0 });
        assert_eq!(params.queries_per_month, 300.0);
        assert_eq!(params.ban_cost_points.len(), 4);
    }

    #[test]
    fn control_points_default_to_movable() {
        let params = ModelParameters::from_json_str(
            r#"{ "ban_cost_points": [ { "x": 0, "y": 0, "fixed": true }, { "x": 50, "y": 2 } ] }"#
        ).unwrap();
        assert!(params.ban_cost_points[0].fixed);
        assert!(!params.ban_cost_points[1].fixed);
    }

    #[test]
    fn scalar_validation() {
        let mut params = ModelParameters::default();
        params.queries_per_month = 0.0;
        assert!(matches!(
            params.validate(),
            Err(ModelError::NonPositiveParameter { name: "queries_per_month", .. })
        ));
    }

    #[test]
    fn bad_json_is_a_parse_error() {
        let err = ModelParameters::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ModelError::JsonParse(_)));
        assert!(!err.is_validation());
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = ModelParameters::from_reader("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }
}
