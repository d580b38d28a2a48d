use nalgebra::DVector;
use tracing::warn;

use crate::math::curve::curve::SampledCurve;

/// Damage per success is expressed in millions of people.
pub const DAMAGE_UNIT: f64 = 1e6;

const GRID_TOLERANCE: f64 = 1e-9;

/// Expected annual fatalities from an effort CDF and a success curve
/// sampled on the same grid.
///
///   Σ_{i≥1} (cdf[i] - cdf[i-1]) * success[i] * attempts * damage * 1e6
///
/// Returns 0 when either curve has fewer than two samples. Inputs are
/// assumed valid; curves on different grids are paired index by index up
/// to the shorter length.
pub fn compute_expected_fatalities(
    cdf: &SampledCurve,
    success: &SampledCurve,
    annual_attempts: f64,
    damage_per_success: f64,
) -> f64 {
    if cdf.len() < 2 || success.len() < 2 {
        return 0.0;
    }
    if !cdf.shares_grid_with(success, GRID_TOLERANCE) {
        warn!(
            cdf_points = cdf.len(),
            success_points = success.len(),
            "aggregating curves sampled on different grids"
        );
    }

    // 兩條曲線在共同網格上的 Riemann sum，寫成 ΔF 與 p 兩個向量的內積
    let n = cdf.len().min(success.len());
    let cdf_points = &cdf.points()[..n];
    let increments = DVector::from_iterator(
        n - 1,
        cdf_points.windows(2).map(|w| w[1].y - w[0].y),
    );
    let probabilities = DVector::from_iterator(
        n - 1,
        success.points()[1..n].iter().map(|p| p.y),
    );

    increments.dot(&probabilities) * annual_attempts * damage_per_success * DAMAGE_UNIT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::curve::curve::CurvePoint;

    fn curve(ys: &[f64]) -> SampledCurve {
        SampledCurve::from_points(
            ys.iter().enumerate().map(|(i, &y)| CurvePoint::new(i as f64 + 1.0, y)).collect()
        )
    }

    #[test]
    fn riemann_sum_by_hand() {
        let cdf = curve(&[0.0, 0.5, 0.8, 1.0]);
        let success = curve(&[0.0, 0.1, 0.2, 0.4]);
        // 0.5*0.1 + 0.3*0.2 + 0.2*0.4 = 0.19
        let total = compute_expected_fatalities(&cdf, &success, 10.0, 2.0);
        assert!((total - 0.19 * 10.0 * 2.0 * 1e6).abs() < 1e-3);
    }

    #[test]
    fn fewer_than_two_points_is_zero() {
        assert_eq!(compute_expected_fatalities(&curve(&[0.3]), &curve(&[0.3, 0.4]), 1.0, 1.0), 0.0);
        assert_eq!(compute_expected_fatalities(&curve(&[]), &curve(&[]), 1.0, 1.0), 0.0);
    }

    #[test]
    fn zero_attempts_is_zero() {
        let cdf = curve(&[0.0, 0.5, 1.0]);
        let success = curve(&[0.0, 0.5, 1.0]);
        assert_eq!(compute_expected_fatalities(&cdf, &success, 0.0, 1.0), 0.0);
    }

    #[test]
    fn mismatched_lengths_use_shorter_curve() {
        let cdf = curve(&[0.0, 0.5, 1.0]);
        let success = curve(&[0.0, 1.0]);
        assert!((compute_expected_fatalities(&cdf, &success, 1.0, 1.0) - 0.5e6).abs() < 1e-6);
    }
}
