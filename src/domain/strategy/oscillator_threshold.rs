//! Oscillator-threshold strategy.
//!
//! Hit when J is oversold on the target bar and BBI has been trending up into
//! it. The two checks are evaluated independently and AND-combined.
//!
//! J is oversold when `J < j_threshold`, or, if `j_q_threshold` is set, when J
//! is at or below its own `j_q_threshold` quantile over the last
//! `j_q_lookback` bars.
//!
//! BBI uptrend: for some window length `w` in `[bbi_min_window,
//! bbi_max_window]` ending at the target, the `bbi_q_threshold` quantile of the
//! bar-to-bar BBI changes (scaled by the window's first BBI) is at least
//! `-bbi_tolerance`. With the default q = 0 and tolerance = 0 this reads
//! "BBI never fell over the last `bbi_min_window` bars".

use crate::domain::error::ScreenError;
use crate::domain::indicator::{IndicatorBundle, IndicatorField, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::params::StrategyParams;
use crate::domain::strategy::Strategy;
use crate::domain::window_stats::{quantile, quantile_at};

#[derive(Debug, Clone, PartialEq)]
pub struct JCondition {
    pub threshold: f64,
    pub q_threshold: Option<f64>,
    pub q_lookback: usize,
}

impl JCondition {
    pub fn from_params(params: &StrategyParams) -> Result<Self, ScreenError> {
        Ok(Self {
            threshold: params.f64_or("j_threshold", 10.0)?,
            q_threshold: params.optional_fraction("j_q_threshold")?,
            q_lookback: params.usize_or("j_q_lookback", 120)?,
        })
    }

    pub fn holds(&self, kdj: &IndicatorSeries, index: usize) -> Result<bool, ScreenError> {
        let j = kdj.try_field_at(index, IndicatorField::J)?;
        if j < self.threshold {
            return Ok(true);
        }
        match self.q_threshold {
            Some(q) => {
                let history = kdj.field_values(IndicatorField::J);
                let limit = quantile_at(&history[..=index], index, self.q_lookback, q)?;
                Ok(j <= limit)
            }
            None => Ok(false),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OscillatorThreshold {
    pub j: JCondition,
    pub bbi_min_window: usize,
    pub bbi_max_window: usize,
    pub bbi_q_threshold: f64,
    pub bbi_tolerance: f64,
}

impl OscillatorThreshold {
    pub fn from_params(params: &StrategyParams) -> Result<Self, ScreenError> {
        let bbi_min_window = params.usize_or("bbi_min_window", 20)?;
        if bbi_min_window < 2 {
            return Err(ScreenError::invalid_param(
                params.section(),
                "bbi_min_window",
                "must be at least 2",
            ));
        }
        let bbi_max_window = params.usize_or("bbi_max_window", bbi_min_window)?;
        if bbi_max_window < bbi_min_window {
            return Err(ScreenError::invalid_param(
                params.section(),
                "bbi_max_window",
                "must not be below bbi_min_window",
            ));
        }
        let bbi_tolerance = params.f64_or("bbi_tolerance", 0.0)?;
        if bbi_tolerance < 0.0 {
            return Err(ScreenError::invalid_param(
                params.section(),
                "bbi_tolerance",
                "must be non-negative",
            ));
        }

        Ok(Self {
            j: JCondition::from_params(params)?,
            bbi_min_window,
            bbi_max_window,
            bbi_q_threshold: params.fraction_or("bbi_q_threshold", 0.0)?,
            bbi_tolerance,
        })
    }

    fn bbi_uptrend(&self, bbi: &IndicatorSeries, index: usize) -> Result<bool, ScreenError> {
        // Longest window first; any passing window is enough.
        let mut tested = false;
        let longest = self.bbi_max_window.min(index + 1);
        for window in (self.bbi_min_window..=longest).rev() {
            let start = index + 1 - window;
            let line: Option<Vec<f64>> = (start..=index).map(|i| bbi.value_at(i)).collect();
            let Some(line) = line else {
                continue;
            };

            tested = true;

            let base = line[0].abs();
            let scale = if base > 0.0 { base } else { 1.0 };
            let changes: Vec<f64> = line.windows(2).map(|w| (w[1] - w[0]) / scale).collect();
            if quantile(&changes, self.bbi_q_threshold)? >= -self.bbi_tolerance {
                return Ok(true);
            }
        }

        if tested {
            return Ok(false);
        }
        Err(ScreenError::InsufficientHistory {
            needed: bbi
                .indicator_type
                .min_bars()
                .saturating_add(self.bbi_min_window - 1),
            available: index + 1,
        })
    }
}

impl Strategy for OscillatorThreshold {
    fn evaluate_at(
        &self,
        _bars: &[OhlcvBar],
        bundle: &IndicatorBundle,
        index: usize,
    ) -> Result<bool, ScreenError> {
        let oversold = self.j.holds(&bundle.kdj, index)?;
        let uptrend = self.bbi_uptrend(&bundle.bbi, index)?;
        Ok(oversold && uptrend)
    }
}
