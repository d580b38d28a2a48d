use serde::{
    Deserialize,
    Serialize
};

use crate::math::curve::curve::log_spaced_grid;
use crate::modelerror::ModelError;

pub const GRID_MIN_MONTHS: f64 = 0.1;
pub const GRID_MAX_MONTHS: f64 = 60.0;
pub const GRID_INTERVALS: usize = 100;

/// Months at which user percentages are anchored.
pub const ANCHOR_MONTHS: [f64; 3] = [3.0, 12.0, 36.0];
/// Month of the free top anchor in the four-point effort variant.
pub const FREE_TOP_MONTH: f64 = 60.0;

/// The shared 101-point log grid over `[0.1, max_months]`.
pub fn effort_grid(max_months: f64) -> Vec<f64> {
    log_spaced_grid(GRID_MIN_MONTHS, max_months, GRID_INTERVALS)
}

fn default_top_percentage() -> f64 {
    100.0
}

fn anchor_xs_log(months: &[f64]) -> Vec<f64> {
    std::iter::once(GRID_MIN_MONTHS)
        .chain(months.iter().copied())
        .map(f64::ln)
        .collect()
}

// ─────────────────────────────────────────────
// Effort anchors
// ─────────────────────────────────────────────

/// Percentile anchors of the effort CDF.
///
/// `ThreePoint` validates `p1 < p2 < p3` but fits the curve to 100% at 36
/// months; `FourPoint` keeps a free top value at 60 months.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EffortAnchors {
    ThreePoint { p1: f64, p2: f64, p3: f64 },
    FourPoint {
        p1: f64,
        p2: f64,
        p3: f64,
        #[serde(default = "default_top_percentage")]
        p4: f64,
    },
}

impl Default for EffortAnchors {
    fn default() -> Self {
        EffortAnchors::ThreePoint { p1: 90.0, p2: 95.0, p3: 98.0 }
    }
}

impl EffortAnchors {
    pub fn percentages(&self) -> Vec<f64> {
        match *self {
            EffortAnchors::ThreePoint { p1, p2, p3 } => vec![p1, p2, p3],
            EffortAnchors::FourPoint { p1, p2, p3, p4 } => vec![p1, p2, p3, p4],
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let p = self.percentages();
        let ordered = p.windows(2).all(|w| w[0] < w[1]);
        let in_range = p.iter().all(|v| v.is_finite() && *v >= 0.0 && *v <= 100.0);
        if ordered && in_range {
            Ok(())
        } else {
            Err(ModelError::InvalidPercentiles)
        }
    }

    /// `(ln(month), probability)` pairs, origin included.
    pub fn fit_points(&self) -> (Vec<f64>, Vec<f64>) {
        match *self {
            EffortAnchors::ThreePoint { p1, p2, .. } => (
                anchor_xs_log(&ANCHOR_MONTHS),
                vec![0.0, p1 / 100.0, p2 / 100.0, 1.0],
            ),
            EffortAnchors::FourPoint { p1, p2, p3, p4 } => (
                anchor_xs_log(&[ANCHOR_MONTHS[0], ANCHOR_MONTHS[1], ANCHOR_MONTHS[2], FREE_TOP_MONTH]),
                vec![0.0, p1 / 100.0, p2 / 100.0, p3 / 100.0, p4 / 100.0],
            ),
        }
    }
}

// ─────────────────────────────────────────────
// Success anchors
// ─────────────────────────────────────────────

/// Success percentages at 3, 12 and 36 months of effort.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuccessAnchors {
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

impl SuccessAnchors {
    pub fn new(s1: f64, s2: f64, s3: f64) -> SuccessAnchors {
        SuccessAnchors { s1, s2, s3 }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        ModelError::check_percentage("success percentage at 3 months", self.s1)?;
        ModelError::check_percentage("success percentage at 12 months", self.s2)?;
        ModelError::check_percentage("success percentage at 36 months", self.s3)?;
        Ok(())
    }

    pub fn fit_points(&self) -> (Vec<f64>, Vec<f64>) {
        (
            anchor_xs_log(&ANCHOR_MONTHS),
            vec![0.0, self.s1 / 100.0, self.s2 / 100.0, self.s3 / 100.0],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_point_validation() {
        let ok = EffortAnchors::ThreePoint { p1: 90.0, p2: 95.0, p3: 98.0 };
        assert!(ok.validate().is_ok());

        for bad in [
            EffortAnchors::ThreePoint { p1: 95.0, p2: 95.0, p3: 98.0 },
            EffortAnchors::ThreePoint { p1: 90.0, p2: 99.0, p3: 98.0 },
            EffortAnchors::ThreePoint { p1: -1.0, p2: 95.0, p3: 98.0 },
            EffortAnchors::ThreePoint { p1: 90.0, p2: 95.0, p3: 101.0 },
            EffortAnchors::ThreePoint { p1: f64::NAN, p2: 95.0, p3: 98.0 },
        ] {
            assert!(matches!(bad.validate(), Err(ModelError::InvalidPercentiles)), "{bad:?}");
        }
    }

    #[test]
    fn four_point_validation() {
        assert!(EffortAnchors::FourPoint { p1: 50.0, p2: 70.0, p3: 90.0, p4: 100.0 }.validate().is_ok());
        assert!(EffortAnchors::FourPoint { p1: 50.0, p2: 70.0, p3: 90.0, p4: 90.0 }.validate().is_err());
    }

    #[test]
    fn three_point_forces_top_to_one() {
        let (xs, ys) = EffortAnchors::ThreePoint { p1: 90.0, p2: 95.0, p3: 98.0 }.fit_points();
        assert_eq!(xs.len(), 4);
        assert_eq!(ys, vec![0.0, 0.9, 0.95, 1.0]);
        assert!((xs[3] - 36.0_f64.ln()).abs() < 1e-15);
    }

    #[test]
    fn four_point_keeps_free_top() {
        let (xs, ys) = EffortAnchors::FourPoint { p1: 50.0, p2: 70.0, p3: 90.0, p4: 96.0 }.fit_points();
        assert_eq!(xs.len(), 5);
        assert!((xs[4] - 60.0_f64.ln()).abs() < 1e-15);
        assert_eq!(ys[4], 0.96);
    }

    #[test]
    fn four_point_top_defaults_to_hundred() {
        let anchors: EffortAnchors =
            serde_json::from_str(r#"{"kind":"four_point","p1":10,"p2":20,"p3":30}"#).unwrap();
        assert_eq!(anchors, EffortAnchors::FourPoint { p1: 10.0, p2: 20.0, p3: 30.0, p4: 100.0 });
    }

    #[test]
    fn success_percentages_must_be_in_range() {
        assert!(SuccessAnchors::new(0.1, 3.0, 10.0).validate().is_ok());
        assert!(SuccessAnchors::new(0.1, 300.0, 10.0).validate().is_err());
        assert!(SuccessAnchors::new(f64::NAN, 3.0, 10.0).validate().is_err());
    }
}
