//! Composite-bias-crossover strategy.
//!
//! Two BBI lines: a short-horizon one (`short_periods`) and a long-horizon one
//! (`long_periods`). A crossover at bar i means short[i-1] <= long[i-1] and
//! short[i] > long[i]. Hit when, among all crosses in the last `cross_window`
//! bars, the most recent one is upward and short is still above long on the
//! target bar.

use crate::domain::error::ScreenError;
use crate::domain::indicator::{IndicatorBundle, IndicatorField, IndicatorSeries};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::params::StrategyParams;
use crate::domain::strategy::{require_history, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cross {
    Up,
    Down,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BiasCrossover {
    pub short_periods: Vec<usize>,
    pub long_periods: Vec<usize>,
    pub cross_window: usize,
}

impl BiasCrossover {
    pub fn from_params(params: &StrategyParams) -> Result<Self, ScreenError> {
        let short_periods = params.periods_or("short_periods", &[3, 6, 12, 24])?;
        let long_periods = params.periods_or("long_periods", &[6, 12, 24, 48])?;
        if short_periods == long_periods {
            return Err(ScreenError::invalid_param(
                params.section(),
                "long_periods",
                "must differ from short_periods",
            ));
        }
        Ok(Self {
            short_periods,
            long_periods,
            cross_window: params.usize_or("cross_window", 5)?,
        })
    }

    fn cross_at(
        short: &IndicatorSeries,
        long: &IndicatorSeries,
        i: usize,
    ) -> Result<Option<Cross>, ScreenError> {
        let s_prev = short.try_field_at(i - 1, IndicatorField::Value)?;
        let l_prev = long.try_field_at(i - 1, IndicatorField::Value)?;
        let s = short.try_field_at(i, IndicatorField::Value)?;
        let l = long.try_field_at(i, IndicatorField::Value)?;

        Ok(if s_prev <= l_prev && s > l {
            Some(Cross::Up)
        } else if s_prev >= l_prev && s < l {
            Some(Cross::Down)
        } else {
            None
        })
    }
}

impl Strategy for BiasCrossover {
    fn evaluate_at(
        &self,
        bars: &[OhlcvBar],
        bundle: &IndicatorBundle,
        index: usize,
    ) -> Result<bool, ScreenError> {
        require_history(index, self.cross_window.saturating_add(1))?;
        let short = bundle.bbi_for(bars, &self.short_periods);
        let long = bundle.bbi_for(bars, &self.long_periods);

        let first = index + 1 - self.cross_window;
        for i in (first..=index).rev() {
            match Self::cross_at(&short, &long, i)? {
                Some(Cross::Up) => {
                    let s = short.try_field_at(index, IndicatorField::Value)?;
                    let l = long.try_field_at(index, IndicatorField::Value)?;
                    return Ok(s > l);
                }
                Some(Cross::Down) => return Ok(false),
                None => {}
            }
        }
        Ok(false)
    }
}
