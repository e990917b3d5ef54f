//! Bollinger Bands — SMA of close +/- multiplier * population stddev.
//!
//! Each band is a separate Indicator instance. Lookback: period - 1.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

use super::rolling;

/// Which band of the Bollinger Bands to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BollingerBand {
    Upper,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Bollinger {
    period: usize,
    multiplier: f64,
    band: BollingerBand,
    name: String,
}

impl Bollinger {
    pub fn new(period: usize, multiplier: f64, band: BollingerBand) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        let label = match band {
            BollingerBand::Upper => "upper",
            BollingerBand::Lower => "lower",
        };
        Self {
            period,
            multiplier,
            band,
            name: format!("bollinger_{label}_{period}_{multiplier}"),
        }
    }

    pub fn upper(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Upper)
    }

    pub fn lower(period: usize, multiplier: f64) -> Self {
        Self::new(period, multiplier, BollingerBand::Lower)
    }
}

impl Indicator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        rolling(&closes, self.period, |w| {
            let len = w.len() as f64;
            let mean = w.iter().sum::<f64>() / len;
            let stddev = (w.iter().map(|c| (c - mean) * (c - mean)).sum::<f64>() / len).sqrt();
            match self.band {
                BollingerBand::Upper => mean + self.multiplier * stddev,
                BollingerBand::Lower => mean - self.multiplier * stddev,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_bars, DEFAULT_EPSILON};

    #[test]
    fn bands_around_mean() {
        // window [1, 3]: mean 2, population stddev 1
        let bars = make_bars(&[1.0, 3.0]);
        assert_approx(Bollinger::upper(2, 2.0).compute(&bars)[1], 4.0, DEFAULT_EPSILON);
        assert_approx(Bollinger::lower(2, 2.0).compute(&bars)[1], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn names_match_strategy_keys() {
        assert_eq!(Bollinger::upper(20, 2.0).name(), "bollinger_upper_20_2");
        assert_eq!(Bollinger::lower(20, 2.5).name(), "bollinger_lower_20_2.5");
    }
}
