//! Property tests for indicator bounds, window statistics and runner ordering.

mod common;

use common::*;
use proptest::prelude::*;
use stockpick::domain::code_data::CodeData;
use stockpick::domain::indicator::bbi::calculate_bbi;
use stockpick::domain::indicator::kdj::calculate_kdj;
use stockpick::domain::indicator::rsv::calculate_rsv;
use stockpick::domain::indicator::{IndicatorConfig, IndicatorField};
use stockpick::domain::selection::SelectionRunner;
use stockpick::domain::window_stats::quantile;

const EPS: f64 = 1e-9;

/// (low, range, close position within the range)
fn bar_shape() -> impl Strategy<Value = (f64, f64, f64)> {
    (1.0f64..100.0, 0.0f64..20.0, 0.0f64..=1.0)
}

fn bars_from_shapes(shapes: &[(f64, f64, f64)]) -> Vec<OhlcvBar> {
    let start = date(2024, 1, 1);
    shapes
        .iter()
        .enumerate()
        .map(|(i, &(low, range, pos))| {
            let close = low + range * pos;
            OhlcvBar {
                code: "PROP".into(),
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: low + range,
                low,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn rsv_and_kd_stay_in_percent_range(
        shapes in prop::collection::vec(bar_shape(), 1..80),
        period in 1usize..15,
    ) {
        let bars = bars_from_shapes(&shapes);
        let rsv = calculate_rsv(&bars, period);
        let kdj = calculate_kdj(&bars, period);
        prop_assert_eq!(rsv.len(), bars.len());
        prop_assert_eq!(kdj.len(), bars.len());

        for i in 0..bars.len() {
            prop_assert_eq!(rsv.value_at(i).is_some(), i + 1 >= period);
            if let Some(v) = rsv.value_at(i) {
                prop_assert!((-EPS..=100.0 + EPS).contains(&v), "rsv {} at {}", v, i);
            }
            for field in [IndicatorField::K, IndicatorField::D] {
                if let Some(v) = kdj.field_at(i, field) {
                    prop_assert!((-EPS..=100.0 + EPS).contains(&v), "{:?} {} at {}", field, v, i);
                }
            }
            if let (Some(k), Some(d), Some(j)) = (
                kdj.field_at(i, IndicatorField::K),
                kdj.field_at(i, IndicatorField::D),
                kdj.field_at(i, IndicatorField::J),
            ) {
                prop_assert!((j - (3.0 * k - 2.0 * d)).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn bbi_lies_between_min_and_max_close(
        closes in prop::collection::vec(0.0f64..500.0, 1..60),
    ) {
        let bars = bars_from_closes("PROP", "2024-01-01", &closes);
        let periods = [3usize, 6, 12, 24];
        let bbi = calculate_bbi(&bars, &periods);

        for i in 0..bars.len() {
            match bbi.value_at(i) {
                Some(v) => {
                    prop_assert!(i + 1 >= 24);
                    let window = &closes[i + 1 - 24..=i];
                    let lo = window.iter().copied().fold(f64::INFINITY, f64::min);
                    let hi = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    prop_assert!(
                        v >= lo - 1e-6 && v <= hi + 1e-6,
                        "bbi {} outside [{}, {}]",
                        v,
                        lo,
                        hi
                    );
                }
                None => prop_assert!(i + 1 < 24),
            }
        }
    }

    #[test]
    fn median_of_odd_sample_is_middle_element(
        sample in prop::collection::vec(-1000.0f64..1000.0, 1..40)
            .prop_filter("odd length", |v| v.len() % 2 == 1),
    ) {
        let mut sorted = sample.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median = quantile(&sample, 0.5).unwrap();
        prop_assert!((median - sorted[sorted.len() / 2]).abs() < 1e-9);
    }

    #[test]
    fn quantile_is_monotonic_and_bounded(
        sample in prop::collection::vec(-1000.0f64..1000.0, 1..40),
        a in 0.0f64..=1.0,
        b in 0.0f64..=1.0,
    ) {
        let (lo_q, hi_q) = if a <= b { (a, b) } else { (b, a) };
        let lo = quantile(&sample, lo_q).unwrap();
        let hi = quantile(&sample, hi_q).unwrap();
        let min = sample.iter().copied().fold(f64::INFINITY, f64::min);
        let max = sample.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        prop_assert!(lo <= hi + 1e-9);
        prop_assert!(lo >= min - 1e-9 && hi <= max + 1e-9);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn runner_output_is_sorted_and_order_independent(
        series in prop::collection::vec(prop::collection::vec(5.0f64..15.0, 30..40), 1..8),
        rotate in 0usize..8,
    ) {
        let universe: Vec<CodeData> = series
            .iter()
            .enumerate()
            .map(|(i, closes)| {
                let code = format!("{:06}", 600000 + i * 7);
                make_code_data(&code, bars_from_closes(&code, "2024-01-01", closes))
            })
            .collect();
        let target = date(2024, 1, 30);
        let strategies = vec![
            pit_strategy("Loose", "0.3"),
            active(
                "pit_filling",
                "Deep",
                &[("lookback", "30"), ("radius", "2"), ("min_drawdown", "0.2")],
            ),
        ];

        let runner = SelectionRunner::new(strategies, IndicatorConfig::default());
        let baseline = runner.run(&universe, target).unwrap();

        let mut shuffled = universe.clone();
        let len = shuffled.len();
        shuffled.rotate_left(rotate % len);
        let rotated = runner.run(&shuffled, target).unwrap();
        prop_assert_eq!(&baseline, &rotated);

        let keys: Vec<(String, usize)> = baseline
            .results
            .iter()
            .map(|r| {
                let pos = if r.strategy_alias == "Loose" { 0 } else { 1 };
                (r.code.clone(), pos)
            })
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
        prop_assert_eq!(baseline.evaluated, universe.len());
    }
}
