//! Pit-filling strategy.
//!
//! Within the last `lookback` closes, take the dominant local peak P before the
//! target and the deepest local trough T between P and the target. Hit when the
//! drop was deep enough, `(P - T) / P > min_drawdown`, and the target close C
//! has recovered past `(C - T) / (P - T) > recovery_fraction`.

use crate::domain::error::ScreenError;
use crate::domain::indicator::IndicatorBundle;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::params::StrategyParams;
use crate::domain::strategy::{require_history, Strategy};
use crate::domain::window_stats::{local_peaks, local_troughs};
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub struct PitFilling {
    pub lookback: usize,
    pub radius: usize,
    pub min_drawdown: f64,
    pub recovery_fraction: f64,
}

impl PitFilling {
    pub fn from_params(params: &StrategyParams) -> Result<Self, ScreenError> {
        let lookback = params.usize_or("lookback", 60)?;
        if lookback < 3 {
            return Err(ScreenError::invalid_param(
                params.section(),
                "lookback",
                "must be at least 3",
            ));
        }
        let recovery_fraction = params.f64_or("recovery_fraction", 0.5)?;
        if recovery_fraction < 0.0 {
            return Err(ScreenError::invalid_param(
                params.section(),
                "recovery_fraction",
                "must be non-negative",
            ));
        }
        Ok(Self {
            lookback,
            radius: params.count_or("radius", 2)?,
            min_drawdown: params.fraction_or("min_drawdown", 0.10)?,
            recovery_fraction,
        })
    }
}

/// Highest (or lowest) value among `candidates`; the earliest index wins ties.
fn dominant(
    values: &[f64],
    candidates: impl Iterator<Item = usize>,
    higher: bool,
) -> Option<usize> {
    candidates.fold(None, |best: Option<usize>, i| match best {
        Some(b) if (higher && values[i] <= values[b]) || (!higher && values[i] >= values[b]) => {
            Some(b)
        }
        _ => Some(i),
    })
}

impl Strategy for PitFilling {
    fn evaluate_at(
        &self,
        bars: &[OhlcvBar],
        _bundle: &IndicatorBundle,
        index: usize,
    ) -> Result<bool, ScreenError> {
        require_history(index, self.lookback)?;
        let closes: Vec<f64> = bars[..=index].iter().map(|b| b.close).collect();

        let peaks = local_peaks(&closes, index, self.lookback, self.radius)?;
        let Some(peak) = dominant(&closes, peaks.into_iter().filter(|&p| p < index), true) else {
            return Ok(false);
        };

        let troughs = local_troughs(&closes, index, self.lookback, self.radius)?;
        let after_peak = troughs.into_iter().filter(|&t| t > peak && t < index);
        let Some(trough) = dominant(&closes, after_peak, false) else {
            return Ok(false);
        };

        let (p, t, c) = (closes[peak], closes[trough], closes[index]);
        if p <= 0.0 || p <= t {
            return Ok(false);
        }
        let drawdown = (p - t) / p;
        let recovery = (c - t) / (p - t);
        trace!(peak, trough, drawdown, recovery, "pit_filling");

        Ok(drawdown > self.min_drawdown && recovery > self.recovery_fraction)
    }
}
