//! Bull and Bear Index (BBI).
//!
//! BBI[i] = mean(SMA(p1)[i], ..., SMA(pk)[i]).
//! Warmup: defined only once every constituent SMA has a full window,
//! i.e. the first (max(p) - 1) bars are invalid.

use crate::domain::indicator::sma::rolling_mean;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_bbi(bars: &[OhlcvBar], periods: &[usize]) -> IndicatorSeries {
    let indicator_type = IndicatorType::Bbi(periods.to_vec());
    if periods.is_empty() || periods.contains(&0) || bars.is_empty() {
        return IndicatorSeries::empty(indicator_type);
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let averages: Vec<Vec<Option<f64>>> =
        periods.iter().map(|&p| rolling_mean(&closes, p)).collect();

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            let parts: Option<Vec<f64>> = averages.iter().map(|ma| ma[i]).collect();
            match parts {
                Some(parts) => IndicatorPoint {
                    date: bar.date,
                    valid: true,
                    value: IndicatorValue::Simple(parts.iter().sum::<f64>() / parts.len() as f64),
                },
                None => IndicatorPoint {
                    date: bar.date,
                    valid: false,
                    value: IndicatorValue::Simple(0.0),
                },
            }
        })
        .collect();

    IndicatorSeries {
        indicator_type,
        values,
    }
}
