use crate::math::curve::curve::Curve;
use crate::modelerror::ModelError;

// ─────────────────────────────────────────────
// 邊界策略
// ─────────────────────────────────────────────

/// How the closing tangent and the region past the last anchor behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryPolicy {
    /// Flat closing tangent; the curve holds its last value past the last
    /// anchor. Anchor `y` values must be non-decreasing.
    CumulativeDistribution,
    /// Closing tangent damped to half the last secant, interior tangents
    /// clamped to `[0, 3]` times each neighbouring secant, and a gentle
    /// linear continuation past the last anchor:
    ///   min(1, y_last + t_last * (ln x - ln x_last) * 0.1)
    DampedSuccess,
}

/// 相鄰割線異號時使用的內部切線。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignChangeTangent {
    Zero,
    MinSlope,
}

const INITIAL_TANGENT_BOOST: f64 = 1.5;
const CLOSING_TANGENT_DAMPING: f64 = 0.5;
const EXTRAPOLATION_DAMPING: f64 = 0.1;
const MAX_TANGENT_RATIO: f64 = 3.0;

// ─────────────────────────────────────────────
// MonotoneSplineFitter
// ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonotoneSplineFitter {
    boundary: BoundaryPolicy,
    sign_change: SignChangeTangent,
}

impl MonotoneSplineFitter {
    pub fn new(boundary: BoundaryPolicy, sign_change: SignChangeTangent) -> MonotoneSplineFitter {
        MonotoneSplineFitter { boundary, sign_change }
    }

    pub fn cumulative_distribution() -> MonotoneSplineFitter {
        Self::new(BoundaryPolicy::CumulativeDistribution, SignChangeTangent::Zero)
    }

    pub fn damped_success() -> MonotoneSplineFitter {
        Self::new(BoundaryPolicy::DampedSuccess, SignChangeTangent::Zero)
    }

    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    pub fn sign_change(&self) -> SignChangeTangent {
        self.sign_change
    }

    /// Fits a Hermite spline through `(xs_log[i], ys[i])`.
    ///
    /// `xs_log` holds `ln(x)` and must be strictly increasing; `ys` must lie
    /// in `[0, 1]`. At least two anchors are required.
    pub fn fit(&self, xs_log: &[f64], ys: &[f64]) -> Result<MonotoneSpline, ModelError> {
        self.validate(xs_log, ys)?;

        let n = xs_log.len();
        let slopes: Vec<f64> = (0..n - 1)
            .map(|i| (ys[i + 1] - ys[i]) / (xs_log[i + 1] - xs_log[i]))
            .collect();

        let mut tangents = vec![0.0_f64; n];
        tangents[0] = slopes[0] * INITIAL_TANGENT_BOOST;
        for i in 1..n - 1 {
            tangents[i] = self.interior_tangent(slopes[i - 1], slopes[i]);
        }
        tangents[n - 1] = match self.boundary {
            BoundaryPolicy::CumulativeDistribution => 0.0,
            BoundaryPolicy::DampedSuccess => slopes[n - 2] * CLOSING_TANGENT_DAMPING,
        };

        Ok(MonotoneSpline {
            xs: xs_log.to_vec(),
            ys: ys.to_vec(),
            tangents,
            boundary: self.boundary,
        })
    }

    fn interior_tangent(&self, prev: f64, next: f64) -> f64 {
        let mut tangent = if prev * next > 0.0 {
            let w1 = 2.0 * next + prev;
            let w2 = next + 2.0 * prev;
            (w1 + w2) / (3.0 * (w1 / prev + w2 / next))
        } else {
            match self.sign_change {
                SignChangeTangent::Zero => 0.0,
                SignChangeTangent::MinSlope => prev.min(next),
            }
        };

        if self.boundary == BoundaryPolicy::DampedSuccess {
            for slope in [prev, next] {
                if slope == 0.0 {
                    continue;
                }
                let ratio = tangent / slope;
                if ratio < 0.0 {
                    tangent = 0.0;
                } else if ratio > MAX_TANGENT_RATIO {
                    tangent = MAX_TANGENT_RATIO * slope;
                }
            }
        }
        tangent
    }

    fn validate(&self, xs_log: &[f64], ys: &[f64]) -> Result<(), ModelError> {
        if xs_log.len() != ys.len() {
            return Err(ModelError::InvalidAnchors(format!(
                "{} x values but {} y values", xs_log.len(), ys.len()
            )));
        }
        if xs_log.len() < 2 {
            return Err(ModelError::InvalidAnchors(format!(
                "need at least 2 anchors, got {}", xs_log.len()
            )));
        }
        if xs_log.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(ModelError::InvalidAnchors("anchor values must be finite".to_string()));
        }
        if xs_log.windows(2).any(|w| w[1] <= w[0]) {
            return Err(ModelError::InvalidAnchors(
                "anchor x values must be strictly increasing".to_string()
            ));
        }
        if ys.iter().any(|y| !(0.0..=1.0).contains(y)) {
            return Err(ModelError::InvalidAnchors(
                "anchor probabilities must lie between 0 and 1".to_string()
            ));
        }
        if self.boundary == BoundaryPolicy::CumulativeDistribution
            && ys.windows(2).any(|w| w[1] < w[0]) {
            return Err(ModelError::InvalidAnchors(
                "cumulative anchors must be non-decreasing".to_string()
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────
// MonotoneSpline
// ─────────────────────────────────────────────

/// Fitted spline in log-x space; [`Curve::value`] takes the raw `x > 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct MonotoneSpline {
    xs: Vec<f64>,
    ys: Vec<f64>,
    tangents: Vec<f64>,
    boundary: BoundaryPolicy,
}

impl MonotoneSpline {
    pub fn xs_log(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn tangents(&self) -> &[f64] {
        &self.tangents
    }

    pub fn boundary(&self) -> BoundaryPolicy {
        self.boundary
    }

    /// Evaluates at `ln(x)` directly.
    pub fn value_at_log(&self, log_x: f64) -> f64 {
        let n = self.xs.len();
        let (first_x, last_x) = (self.xs[0], self.xs[n - 1]);

        // 同時處理 NaN，即取 log 前 x <= 0 的情況
        if !(log_x > first_x) {
            return self.ys[0];
        }
        if log_x >= last_x {
            return match self.boundary {
                BoundaryPolicy::CumulativeDistribution => self.ys[n - 1],
                BoundaryPolicy::DampedSuccess => {
                    let tail = self.tangents[n - 1] * (log_x - last_x) * EXTRAPOLATION_DAMPING;
                    (self.ys[n - 1] + tail).clamp(0.0, 1.0)
                }
            };
        }

        let i = (0..n - 1)
            .find(|&i| log_x <= self.xs[i + 1])
            .unwrap_or(n - 2);
        let h = self.xs[i + 1] - self.xs[i];
        let t = (log_x - self.xs[i]) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        let value = h00 * self.ys[i]
            + h10 * h * self.tangents[i]
            + h01 * self.ys[i + 1]
            + h11 * h * self.tangents[i + 1];
        value.clamp(0.0, 1.0)
    }
}

impl Curve for MonotoneSpline {
    fn value(&self, x: f64) -> f64 {
        if x > 0.0 {
            self.value_at_log(x.ln())
        } else {
            self.ys[0]
        }
    }
}
