//! Moving-average crossover with volume expansion.
//!
//! Hit when the close crossed above its `ma_period` SMA on some bar `j` within
//! the last `cross_window` bars, and volume on `j` or one of the
//! `volume_lookahead` bars after it (never past the target) exceeds
//! `volume_multiple` times that bar's trailing average volume. The trailing
//! average for bar `m` covers `[m - volume_window, m - 1]`.

use crate::domain::error::ScreenError;
use crate::domain::indicator::sma::{calculate_sma, rolling_mean};
use crate::domain::indicator::{IndicatorBundle, IndicatorField};
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::params::StrategyParams;
use crate::domain::strategy::{require_history, Strategy};

#[derive(Debug, Clone, PartialEq)]
pub struct MaVolume {
    pub ma_period: usize,
    pub cross_window: usize,
    pub volume_lookahead: usize,
    pub volume_window: usize,
    pub volume_multiple: f64,
}

impl MaVolume {
    pub fn from_params(params: &StrategyParams) -> Result<Self, ScreenError> {
        let volume_multiple = params.f64_or("volume_multiple", 1.5)?;
        if volume_multiple <= 0.0 {
            return Err(ScreenError::invalid_param(
                params.section(),
                "volume_multiple",
                "must be positive",
            ));
        }
        Ok(Self {
            ma_period: params.usize_or("ma_period", 60)?,
            cross_window: params.usize_or("cross_window", 5)?,
            volume_lookahead: params.count_or("volume_lookahead", 2)?,
            volume_window: params.usize_or("volume_window", 20)?,
            volume_multiple,
        })
    }

    /// Bars needed so that every cross candidate has a prior MA value and a
    /// full trailing volume window.
    fn history_needed(&self) -> usize {
        self.ma_period
            .max(self.volume_window)
            .saturating_add(self.cross_window)
    }
}

impl Strategy for MaVolume {
    fn evaluate_at(
        &self,
        bars: &[OhlcvBar],
        _bundle: &IndicatorBundle,
        index: usize,
    ) -> Result<bool, ScreenError> {
        require_history(index, self.history_needed())?;
        let bars = &bars[..=index];
        let ma = calculate_sma(bars, self.ma_period);
        let volumes: Vec<f64> = bars.iter().map(|b| b.volume).collect();
        let volume_avg = rolling_mean(&volumes, self.volume_window);

        let expanded = |m: usize| -> Result<bool, ScreenError> {
            let trailing = volume_avg[m - 1].ok_or(ScreenError::InsufficientHistory {
                needed: self.volume_window.saturating_add(1),
                available: m + 1,
            })?;
            Ok(volumes[m] > self.volume_multiple * trailing)
        };

        let first = index + 1 - self.cross_window;
        for j in first..=index {
            let prev_ma = ma.try_field_at(j - 1, IndicatorField::Value)?;
            let cur_ma = ma.try_field_at(j, IndicatorField::Value)?;
            let crossed = bars[j - 1].close <= prev_ma && bars[j].close > cur_ma;
            if !crossed {
                continue;
            }
            let last = j.saturating_add(self.volume_lookahead).min(index);
            for m in j..=last {
                if expanded(m)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::make_bars;
    use crate::domain::indicator::IndicatorConfig;

    fn strategy(lookahead: &str) -> MaVolume {
        MaVolume::from_params(&StrategyParams::from_pairs(
            "strategy.mav",
            &[
                ("ma_period", "5"),
                ("cross_window", "3"),
                ("volume_lookahead", lookahead),
                ("volume_window", "5"),
                ("volume_multiple", "1.5"),
            ],
        ))
        .unwrap()
    }

    /// Flat at 10 for ten bars, then a breakout to 12 on bar 10.
    fn breakout(extra: &[f64], volumes: &[(usize, f64)]) -> Vec<OhlcvBar> {
        let mut prices = vec![10.0; 10];
        prices.extend([12.0, 12.0]);
        prices.extend_from_slice(extra);
        let mut bars = make_bars(&prices);
        for &(i, v) in volumes {
            bars[i].volume = v;
        }
        bars
    }

    fn run_at(s: &MaVolume, bars: &[OhlcvBar], index: usize) -> Result<bool, ScreenError> {
        let bundle = IndicatorBundle::compute(bars, &IndicatorConfig::default());
        s.evaluate_at(bars, &bundle, index)
    }

    #[test]
    fn volume_on_cross_bar_hits() {
        let bars = breakout(&[], &[(10, 1600.0)]);
        assert!(run_at(&strategy("0"), &bars, 11).unwrap());
    }

    #[test]
    fn volume_after_cross_needs_lookahead() {
        let bars = breakout(&[], &[(11, 2000.0)]);
        assert!(!run_at(&strategy("0"), &bars, 11).unwrap());
        assert!(run_at(&strategy("1"), &bars, 11).unwrap());
    }

    #[test]
    fn cross_without_volume_is_no_hit() {
        let bars = breakout(&[], &[(10, 1400.0)]);
        assert!(!run_at(&strategy("2"), &bars, 11).unwrap());
    }

    #[test]
    fn volume_after_target_is_ignored() {
        let bars = breakout(&[12.0], &[(12, 5000.0)]);
        assert!(!run_at(&strategy("5"), &bars, 11).unwrap());
        assert!(run_at(&strategy("5"), &bars, 12).unwrap());
    }

    #[test]
    fn steady_uptrend_never_crosses() {
        let prices: Vec<f64> = (0..15).map(|i| 10.0 + i as f64).collect();
        let mut bars = make_bars(&prices);
        for bar in &mut bars {
            bar.volume *= 3.0;
        }
        assert!(!run_at(&strategy("2"), &bars, 14).unwrap());
    }

    #[test]
    fn short_history_is_insufficient() {
        let bars = breakout(&[], &[]);
        let err = run_at(&strategy("2"), &bars, 6).unwrap_err();
        assert!(err.is_insufficient_history());
    }

    #[test]
    fn huge_windows_do_not_overflow() {
        let bars = breakout(&[], &[(11, 2000.0)]);
        let huge = usize::MAX.to_string();
        assert!(run_at(&strategy(&huge), &bars, 11).unwrap());

        let p = StrategyParams::from_pairs("s", &[("cross_window", huge.as_str())]);
        let s = MaVolume::from_params(&p).unwrap();
        assert!(run_at(&s, &bars, 11).unwrap_err().is_insufficient_history());
    }

    #[test]
    fn zero_lookahead_allowed_but_not_zero_multiple() {
        let p = StrategyParams::from_pairs("s", &[("volume_lookahead", "0")]);
        assert_eq!(MaVolume::from_params(&p).unwrap().volume_lookahead, 0);
        let p = StrategyParams::from_pairs("s", &[("volume_multiple", "0")]);
        assert!(MaVolume::from_params(&p).is_err());
    }
}
