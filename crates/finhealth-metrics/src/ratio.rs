//! NaN-propagating arithmetic.
//!
//! Missing inputs are NaN. A zero or non-finite denominator gives NaN rather
//! than an infinity or an error, so one bad statement never aborts a batch.

/// `num / den`, NaN when the denominator is zero or not finite.
pub fn div(num: f64, den: f64) -> f64 {
    if den == 0.0 || !den.is_finite() {
        f64::NAN
    } else {
        num / den
    }
}

/// `num / den × 100`.
pub fn pct(num: f64, den: f64) -> f64 {
    div(num, den) * 100.0
}

/// Population moments over the finite values of a window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    /// Sum of present values
    pub sum: f64,
    /// Mean of present values
    pub mean: f64,
    /// Population standard deviation of present values
    pub std: f64,
    /// Number of present values
    pub count: usize,
}

/// Sum, mean and population standard deviation of the finite entries.
///
/// All three are NaN when fewer than `min_count` (at least one) values are
/// present.
pub fn moments(values: &[f64], min_count: usize) -> Moments {
    let present: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let count = present.len();
    if count == 0 || count < min_count {
        return Moments {
            sum: f64::NAN,
            mean: f64::NAN,
            std: f64::NAN,
            count,
        };
    }

    let sum: f64 = present.iter().sum();
    let mean = sum / count as f64;
    let variance = present.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;

    Moments {
        sum,
        mean,
        std: variance.sqrt(),
        count,
    }
}
