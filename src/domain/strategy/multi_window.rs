//! Multi-window strategy.
//!
//! Runs the J-oversold condition once per configured KDJ lookback and hits only
//! when every window agrees. Each window gets its own KDJ series.

use crate::domain::error::ScreenError;
use crate::domain::indicator::IndicatorBundle;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::params::StrategyParams;
use crate::domain::strategy::{require_history, JCondition, Strategy};

#[derive(Debug, Clone, PartialEq)]
pub struct MultiWindow {
    pub windows: Vec<usize>,
    pub j: JCondition,
}

impl MultiWindow {
    pub fn from_params(params: &StrategyParams) -> Result<Self, ScreenError> {
        let windows = params.periods_or("windows", &[9, 14, 21])?;
        if windows.len() < 2 {
            return Err(ScreenError::invalid_param(
                params.section(),
                "windows",
                "needs at least 2 windows",
            ));
        }
        Ok(Self {
            windows,
            j: JCondition::from_params(params)?,
        })
    }
}

impl Strategy for MultiWindow {
    fn evaluate_at(
        &self,
        bars: &[OhlcvBar],
        bundle: &IndicatorBundle,
        index: usize,
    ) -> Result<bool, ScreenError> {
        let longest = self.windows.iter().copied().max().unwrap_or(1);
        require_history(index, longest)?;

        let mut all = true;
        for &window in &self.windows {
            let kdj = bundle.kdj_for(bars, window);
            all &= self.j.holds(&kdj, index)?;
        }
        Ok(all)
    }
}
