#![allow(dead_code)]

use chrono::NaiveDate;
use stockpick::domain::code_data::CodeData;
use stockpick::domain::error::ScreenError;
pub use stockpick::domain::ohlcv::OhlcvBar;
use stockpick::domain::params::StrategyParams;
use stockpick::domain::strategy::{ActiveStrategy, ConfiguredStrategy, StrategyDescriptor};
use stockpick::ports::data_port::DataPort;
use std::collections::HashMap;

/// Closes of a drop-and-recover pattern: peak 12, trough 8, last close 11.
pub const PIT_CLOSES: [f64; 11] = [10.0, 10.0, 10.0, 12.0, 12.0, 8.0, 8.0, 9.0, 9.0, 11.0, 11.0];

pub struct MockDataPort {
    pub data: HashMap<String, Vec<OhlcvBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(ScreenError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(code) {
            Some(bars) => Ok(bars
                .iter()
                .filter(|b| b.date >= start_date && b.date <= end_date)
                .cloned()
                .collect()),
            None => Err(ScreenError::NoData {
                code: code.to_string(),
            }),
        }
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScreenError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScreenError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(ScreenError::Data {
                reason: reason.clone(),
            });
        }
        match self.data.get(code) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(code: &str, date: &str, close: f64) -> OhlcvBar {
    OhlcvBar {
        code: code.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
    }
}

/// Daily bars from `start_date` whose close follows `closes`; high = low = close.
pub fn bars_from_closes(code: &str, start_date: &str, closes: &[f64]) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| OhlcvBar {
            code: code.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000.0,
        })
        .collect()
}

pub fn generate_bars(
    code: &str,
    start_date: &str,
    count: usize,
    start_price: f64,
) -> Vec<OhlcvBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| OhlcvBar {
            code: code.to_string(),
            date: start + chrono::Duration::days(i as i64),
            open: start_price + i as f64,
            high: start_price + i as f64 + 1.0,
            low: start_price + i as f64 - 1.0,
            close: start_price + i as f64,
            volume: 1000.0,
        })
        .collect()
}

pub fn make_code_data(code: &str, bars: Vec<OhlcvBar>) -> CodeData {
    CodeData::new(code.to_string(), bars)
}

pub fn descriptor(identifier: &str, alias: &str, pairs: &[(&str, &str)]) -> StrategyDescriptor {
    StrategyDescriptor {
        identifier: identifier.to_string(),
        alias: alias.to_string(),
        enabled: true,
        params: StrategyParams::from_pairs(&format!("strategy.{}", alias.to_lowercase()), pairs),
    }
}

pub fn active(identifier: &str, alias: &str, pairs: &[(&str, &str)]) -> ActiveStrategy {
    ActiveStrategy {
        alias: alias.to_string(),
        strategy: ConfiguredStrategy::from_descriptor(&descriptor(identifier, alias, pairs))
            .unwrap(),
    }
}

/// Pit-filling over the 11-bar pattern with a given recovery fraction.
pub fn pit_strategy(alias: &str, recovery_fraction: &str) -> ActiveStrategy {
    active(
        "pit_filling",
        alias,
        &[("lookback", "11"), ("radius", "1"), ("recovery_fraction", recovery_fraction)],
    )
}
