use thiserror::Error;

/// Errors raised while building curves or loading model parameters.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Effort percentiles not strictly increasing or outside [0, 100].
    #[error("Percentiles must be in increasing order and between 0 and 100")]
    InvalidPercentiles,

    #[error("{name} must be a percentage between 0 and 100, got {value}")]
    PercentageOutOfRange { name: &'static str, value: f64 },

    #[error("{name} must be a positive finite number, got {value}")]
    NonPositiveParameter { name: &'static str, value: f64 },

    /// Spline anchors that cannot be fitted.
    #[error("invalid anchors: {0}")]
    InvalidAnchors(String),

    #[error("at least {required} control points are required, got {given}")]
    InsufficientControlPoints { required: usize, given: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl ModelError {
    /// `true` when the error was caused by user-supplied values rather than
    /// by reading a configuration source.
    pub fn is_validation(&self) -> bool {
        !matches!(self, ModelError::Io(_) | ModelError::JsonParse(_))
    }

    pub(crate) fn check_positive(name: &'static str, value: f64) -> Result<f64, ModelError> {
        if value.is_finite() && value > 0.0 {
            Ok(value)
        } else {
            Err(ModelError::NonPositiveParameter { name, value })
        }
    }

    pub(crate) fn check_percentage(name: &'static str, value: f64) -> Result<f64, ModelError> {
        if value.is_finite() && (0.0..=100.0).contains(&value) {
            Ok(value)
        } else {
            Err(ModelError::PercentageOutOfRange { name, value })
        }
    }
}

pub type RiskResult<T> = Result<T, ModelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_message_is_user_facing() {
        assert_eq!(
            ModelError::InvalidPercentiles.to_string(),
            "Percentiles must be in increasing order and between 0 and 100"
        );
    }

    #[test]
    fn nan_is_not_positive() {
        let err = ModelError::check_positive("queries_per_month", f64::NAN).unwrap_err();
        assert!(err.is_validation());
        assert!(ModelError::check_positive("x", 0.0).is_err());
        assert_eq!(ModelError::check_positive("x", 2.5).unwrap(), 2.5);
    }

    #[test]
    fn percentage_bounds_are_inclusive() {
        assert!(ModelError::check_percentage("p", 0.0).is_ok());
        assert!(ModelError::check_percentage("p", 100.0).is_ok());
        assert!(ModelError::check_percentage("p", 100.5).is_err());
        assert!(ModelError::check_percentage("p", f64::NAN).is_err());
    }
}
