//! Raw Stochastic Value.
//!
//! RSV(n)[i] = (C[i] - LL) / (HH - LL) * 100 over the last n bars.
//! A flat window (HH == LL) carries the previous RSV forward, or 50 when there
//! is none yet.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

const FLAT_RSV: f64 = 50.0;

pub fn calculate_rsv(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    if period == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Rsv(period));
    }

    let mut values = Vec::with_capacity(bars.len());
    let mut prev: Option<f64> = None;

    for (i, bar) in bars.iter().enumerate() {
        if i + 1 < period {
            values.push(IndicatorPoint {
                date: bar.date,
                valid: false,
                value: IndicatorValue::Simple(0.0),
            });
            continue;
        }

        let window = &bars[i + 1 - period..=i];
        let lowest = window.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
        let highest = window.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
        let range = highest - lowest;

        let rsv = if range > 0.0 {
            (bar.close - lowest) / range * 100.0
        } else {
            prev.unwrap_or(FLAT_RSV)
        };
        prev = Some(rsv);

        values.push(IndicatorPoint {
            date: bar.date,
            valid: true,
            value: IndicatorValue::Simple(rsv),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsv(period),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::{make_bars, make_hlc_bars};
    use approx::assert_relative_eq;

    #[test]
    fn rsv_warmup() {
        let bars = make_hlc_bars(&[(11.0, 9.0, 10.0); 5]);
        let series = calculate_rsv(&bars, 3);

        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
        assert!(series.values[4].valid);
    }

    #[test]
    fn rsv_known_value() {
        let bars = make_hlc_bars(&[(12.0, 8.0, 10.0), (14.0, 9.0, 13.0), (13.0, 10.0, 11.0)]);
        let series = calculate_rsv(&bars, 3);

        // HH = 14, LL = 8, C = 11 → 3/6 * 100
        assert_relative_eq!(series.value_at(2).unwrap(), 50.0);
    }

    #[test]
    fn rsv_close_at_high_is_100() {
        let bars = make_hlc_bars(&[(10.0, 8.0, 9.0), (12.0, 9.0, 12.0)]);
        let series = calculate_rsv(&bars, 2);
        assert_relative_eq!(series.value_at(1).unwrap(), 100.0);
    }

    #[test]
    fn rsv_flat_market_without_history_is_50() {
        let bars = make_bars(&[10.0, 10.0, 10.0]);
        let series = calculate_rsv(&bars, 2);
        assert_relative_eq!(series.value_at(1).unwrap(), 50.0);
        assert_relative_eq!(series.value_at(2).unwrap(), 50.0);
    }

    #[test]
    fn rsv_flat_market_carries_previous() {
        let bars = make_hlc_bars(&[
            (10.0, 8.0, 10.0),
            (10.0, 8.0, 10.0),
            (10.0, 10.0, 10.0),
            (10.0, 10.0, 10.0),
        ]);
        let series = calculate_rsv(&bars, 2);

        // [2]: HH 10, LL 8, C 10 → 100; [3]: flat window → carry 100
        assert_relative_eq!(series.value_at(2).unwrap(), 100.0);
        assert_relative_eq!(series.value_at(3).unwrap(), 100.0);
    }

    #[test]
    fn rsv_short_history_is_undefined() {
        let bars = make_bars(&[10.0, 11.0]);
        let series = calculate_rsv(&bars, 9);
        assert!(series.values.iter().all(|p| !p.valid));
    }

    #[test]
    fn rsv_empty_and_zero_period() {
        assert!(calculate_rsv(&[], 9).is_empty());
        assert!(calculate_rsv(&make_bars(&[1.0]), 0).is_empty());
    }
}
