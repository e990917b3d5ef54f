//! Donchian Channel — highest high / lowest low over a lookback window.
//!
//! The window includes the current bar. Lookback: period - 1.

use crate::components::indicator::Indicator;
use crate::domain::Bar;

use super::rolling;

/// Which band of the Donchian channel to compute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DonchianBand {
    Upper,
    Lower,
}

#[derive(Debug, Clone)]
pub struct Donchian {
    period: usize,
    band: DonchianBand,
    name: String,
}

impl Donchian {
    pub fn upper(period: usize) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        Self {
            period,
            band: DonchianBand::Upper,
            name: format!("donchian_upper_{period}"),
        }
    }

    pub fn lower(period: usize) -> Self {
        assert!(period >= 1, "Donchian period must be >= 1");
        Self {
            period,
            band: DonchianBand::Lower,
            name: format!("donchian_lower_{period}"),
        }
    }
}

impl Indicator for Donchian {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        match self.band {
            DonchianBand::Upper => {
                let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
                rolling(&highs, self.period, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            }
            DonchianBand::Lower => {
                let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();
                rolling(&lows, self.period, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
            }
        }
    }
}
