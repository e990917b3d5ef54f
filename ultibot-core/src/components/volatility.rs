//! Volatility gate — percentile band over a volatility series.
//!
//! The band is computed over the whole series (typically ATR) and the most
//! recent value is tested against it. Percentile 0 and 100 are the true
//! minimum and maximum; anything in between is linearly interpolated between
//! order statistics, so every percentile in [0, 100] has a defined threshold.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Outcome of one gate check.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolatilityGateResult {
    pub passed: bool,
    pub min_threshold: f64,
    pub max_threshold: f64,
    pub tested_value: f64,
}

/// Stateless percentile-band gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct VolatilityGate;

impl VolatilityGate {
    /// Test the latest value of `series` against its own percentile band.
    ///
    /// NaN entries (indicator warmup) are left out of the band. Fails with
    /// `InsufficientData` when the latest value is NaN or fewer than two finite
    /// values remain, and with `InvalidParameter` unless
    /// `0 <= min_percentile <= max_percentile <= 100`.
    pub fn evaluate(
        series: &[f64],
        min_percentile: f64,
        max_percentile: f64,
    ) -> Result<VolatilityGateResult> {
        if !(0.0..=100.0).contains(&min_percentile)
            || !(0.0..=100.0).contains(&max_percentile)
            || min_percentile > max_percentile
        {
            return Err(Error::InvalidParameter(format!(
                "volatility percentiles must satisfy 0 <= min <= max <= 100, got min={min_percentile}, max={max_percentile}"
            )));
        }

        let tested_value = match series.last() {
            Some(v) if v.is_finite() => *v,
            Some(_) => {
                return Err(Error::InsufficientData(
                    "latest volatility value is not finite".into(),
                ))
            }
            None => return Err(Error::InsufficientData("volatility series is empty".into())),
        };

        let mut sorted: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.len() < 2 {
            return Err(Error::InsufficientData(format!(
                "volatility band needs at least 2 values, got {}",
                sorted.len()
            )));
        }
        sorted.sort_by(f64::total_cmp);

        let min_threshold = percentile_sorted(&sorted, min_percentile);
        let max_threshold = percentile_sorted(&sorted, max_percentile);

        Ok(VolatilityGateResult {
            passed: tested_value >= min_threshold && tested_value <= max_threshold,
            min_threshold,
            max_threshold,
            tested_value,
        })
    }
}

/// Percentile of a sorted, non-empty slice.
///
/// 0 and 100 map to the endpoints; other values use linear interpolation
/// between the two nearest order statistics.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    debug_assert!(n > 0, "percentile of an empty slice");
    if n == 1 {
        return sorted[0];
    }
    if p <= 0.0 {
        return sorted[0];
    }
    if p >= 100.0 {
        return sorted[n - 1];
    }
    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_band_is_min_max() {
        let series = [10.0, 12.0, 11.0, 50.0, 13.0, 12.0, 11.0];
        let r = VolatilityGate::evaluate(&series, 0.0, 100.0).unwrap();
        assert!(r.passed);
        assert_eq!(r.min_threshold, 10.0);
        assert_eq!(r.max_threshold, 50.0);
        assert_eq!(r.tested_value, 11.0);
    }

    #[test]
    fn interpolates_between_order_statistics() {
        // sorted: 1 2 3 4 5 → p25 rank=1.0 → 2.0, p90 rank=3.6 → 4.6
        let series = [5.0, 1.0, 4.0, 2.0, 3.0];
        let r = VolatilityGate::evaluate(&series, 25.0, 90.0).unwrap();
        assert_eq!(r.min_threshold, 2.0);
        assert!((r.max_threshold - 4.6).abs() < 1e-12);
        assert!(r.passed); // latest = 3.0
    }

    #[test]
    fn rejects_latest_above_band() {
        let series = [1.0, 1.1, 0.9, 1.0, 1.05, 3.0];
        let r = VolatilityGate::evaluate(&series, 10.0, 80.0).unwrap();
        assert!(!r.passed);
        assert_eq!(r.tested_value, 3.0);
    }

    #[test]
    fn rejects_latest_below_band() {
        let series = [2.0, 2.1, 1.9, 2.0, 2.05, 0.5];
        let r = VolatilityGate::evaluate(&series, 20.0, 100.0).unwrap();
        assert!(!r.passed);
    }

    #[test]
    fn percentile_99_9_does_not_overflow_index() {
        let series = [1.0, 2.0];
        let r = VolatilityGate::evaluate(&series, 99.9, 99.9).unwrap();
        assert!(r.min_threshold <= 2.0 && r.min_threshold >= 1.0);
    }

    #[test]
    fn single_element_is_insufficient() {
        assert!(matches!(
            VolatilityGate::evaluate(&[1.0], 0.0, 100.0),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn empty_is_insufficient() {
        assert!(matches!(
            VolatilityGate::evaluate(&[], 0.0, 100.0),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn nan_warmup_is_ignored() {
        let series = [f64::NAN, f64::NAN, 3.0, 4.0, 5.0];
        let r = VolatilityGate::evaluate(&series, 0.0, 100.0).unwrap();
        assert_eq!(r.min_threshold, 3.0);
        assert_eq!(r.max_threshold, 5.0);
    }

    #[test]
    fn nan_latest_is_insufficient() {
        let series = [1.0, 2.0, f64::NAN];
        assert!(matches!(
            VolatilityGate::evaluate(&series, 0.0, 100.0),
            Err(Error::InsufficientData(_))
        ));
    }

    #[test]
    fn inverted_percentiles_are_invalid() {
        assert!(matches!(
            VolatilityGate::evaluate(&[1.0, 2.0], 60.0, 40.0),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            VolatilityGate::evaluate(&[1.0, 2.0], f64::NAN, 40.0),
            Err(Error::InvalidParameter(_))
        ));
    }
}
