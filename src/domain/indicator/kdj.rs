//! KDJ oscillator.
//!
//! K and D start at 50 on the first bar with a defined RSV, then
//! K[i] = 2/3 * K[i-1] + 1/3 * RSV[i], D[i] = 2/3 * D[i-1] + 1/3 * K[i],
//! J[i] = 3K - 2D.
//! Warmup: same as RSV(n), first (n-1) bars are invalid.

use crate::domain::indicator::rsv::calculate_rsv;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::OhlcvBar;

const SEED: f64 = 50.0;

pub fn calculate_kdj(bars: &[OhlcvBar], period: usize) -> IndicatorSeries {
    kdj_from_rsv(&calculate_rsv(bars, period), period)
}

pub fn kdj_from_rsv(rsv: &IndicatorSeries, period: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(rsv.len());
    let mut state: Option<(f64, f64)> = None;

    for (i, point) in rsv.values.iter().enumerate() {
        let Some(raw) = rsv.value_at(i) else {
            values.push(IndicatorPoint {
                date: point.date,
                valid: false,
                value: IndicatorValue::Kdj {
                    k: 0.0,
                    d: 0.0,
                    j: 0.0,
                },
            });
            continue;
        };

        let (k, d) = match state {
            None => (SEED, SEED),
            Some((prev_k, prev_d)) => {
                let k = 2.0 / 3.0 * prev_k + raw / 3.0;
                (k, 2.0 / 3.0 * prev_d + k / 3.0)
            }
        };
        state = Some((k, d));

        values.push(IndicatorPoint {
            date: point.date,
            valid: true,
            value: IndicatorValue::Kdj {
                k,
                d,
                j: 3.0 * k - 2.0 * d,
            },
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Kdj(period),
        values,
    }
}
