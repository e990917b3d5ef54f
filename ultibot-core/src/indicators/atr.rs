//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! ATR is the Wilder-smoothed TR (alpha = 1/period). The first bar has no
//! previous close, so its TR is left out and the first ATR lands at index
//! `period`. This is the volatility series strategies gate on.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

/// True Range per bar; index 0 is NaN (no previous close).
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut tr = vec![f64::NAN; bars.len()];
    for i in 1..bars.len() {
        let (h, l, pc) = (bars[i].high, bars[i].low, bars[i - 1].close);
        if !(h.is_nan() || l.is_nan() || pc.is_nan()) {
            tr[i] = (h - l).max((h - pc).abs()).max((l - pc).abs());
        }
    }
    tr
}

/// Wilder smoothing. Seeded with the mean of the first `period` values after
/// the leading NaNs; any later NaN taints the rest of the series.
pub fn wilder_smooth(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 {
        return result;
    }
    let Some(start) = values.iter().position(|v| !v.is_nan()) else {
        return result;
    };
    let seed_end = start + period;
    if seed_end > n || values[start..seed_end].iter().any(|v| v.is_nan()) {
        return result;
    }

    let mut prev = values[start..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = prev;

    let alpha = 1.0 / period as f64;
    for i in seed_end..n {
        if values[i].is_nan() {
            break;
        }
        prev = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = prev;
    }
    result
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        wilder_smooth(&true_range(bars), self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn true_range_uses_previous_close() {
        let mut bars = make_bars(&[100.0, 100.0]);
        bars[1].high = 101.0;
        bars[1].low = 99.5;
        bars[0].close = 95.0;
        let tr = true_range(&bars);
        assert!(tr[0].is_nan());
        // max(1.5, |101-95|, |99.5-95|) = 6
        assert_approx(tr[1], 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn first_value_at_period() {
        // make_bars on a flat series: every TR = 2.0 (high-low with open == close)
        let bars = make_bars(&[100.0; 6]);
        let atr = Atr::new(3).compute(&bars);
        assert!(atr[..3].iter().all(|v| v.is_nan()));
        assert_approx(atr[3], 2.0, DEFAULT_EPSILON);
        assert_approx(atr[5], 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wilder_step() {
        let out = wilder_smooth(&[f64::NAN, 2.0, 4.0, 6.0], 2);
        assert_approx(out[2], 3.0, DEFAULT_EPSILON);
        // 0.5*6 + 0.5*3
        assert_approx(out[3], 4.5, DEFAULT_EPSILON);
    }

    #[test]
    fn too_short_is_all_nan() {
        let bars = make_bars(&[100.0, 101.0]);
        assert!(Atr::new(5).compute(&bars).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn lookback_is_period() {
        assert_eq!(Atr::new(14).lookback(), 14);
        assert_eq!(Atr::new(14).name(), "atr_14");
    }
}
