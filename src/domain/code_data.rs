//! Per-ticker bar sequence with a date index.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone)]
pub struct CodeData {
    pub code: String,
    pub ohlcv: Vec<OhlcvBar>,
    pub date_index: HashMap<NaiveDate, usize>,
}

impl CodeData {
    pub fn new(code: String, ohlcv: Vec<OhlcvBar>) -> Self {
        let date_index = ohlcv
            .iter()
            .enumerate()
            .map(|(i, bar)| (bar.date, i))
            .collect();
        Self {
            code,
            ohlcv,
            date_index,
        }
    }

    pub fn get_bar_index(&self, date: NaiveDate) -> Option<usize> {
        self.date_index.get(&date).copied()
    }

    /// Newest bar date, whatever the bar order.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.date_index.keys().max().copied()
    }
}

/// Build one `CodeData` per entry of a ticker -> bars mapping, in ticker order.
pub fn from_map(universe: BTreeMap<String, Vec<OhlcvBar>>) -> Vec<CodeData> {
    universe
        .into_iter()
        .map(|(code, bars)| CodeData::new(code, bars))
        .collect()
}

/// Newest date present in any ticker; resolves `target_date = latest`.
pub fn latest_date(codes: &[CodeData]) -> Option<NaiveDate> {
    codes.iter().filter_map(CodeData::last_date).max()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bar(code: &str, date: &str, close: f64) -> OhlcvBar {
        OhlcvBar {
            code: code.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1000.0,
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn code_data_new_builds_date_index() {
        let bars = vec![
            make_bar("600519", "2024-01-01", 100.0),
            make_bar("600519", "2024-01-02", 101.0),
            make_bar("600519", "2024-01-03", 102.0),
        ];
        let cd = CodeData::new("600519".into(), bars);

        assert_eq!(cd.date_index.len(), 3);
        assert_eq!(cd.get_bar_index(day("2024-01-01")), Some(0));
        assert_eq!(cd.get_bar_index(day("2024-01-03")), Some(2));
        assert_eq!(cd.get_bar_index(day("2024-01-05")), None);
        assert_eq!(cd.last_date(), Some(day("2024-01-03")));
    }

    #[test]
    fn latest_date_across_tickers() {
        let a = CodeData::new(
            "000001".into(),
            vec![
                make_bar("000001", "2024-01-05", 101.0),
                make_bar("000001", "2024-01-02", 100.0),
            ],
        );
        let b = CodeData::new(
            "600519".into(),
            vec![
                make_bar("600519", "2024-01-01", 50.0),
                make_bar("600519", "2024-01-03", 51.0),
            ],
        );

        assert_eq!(latest_date(&[a, b]), Some(day("2024-01-05")));
    }

    #[test]
    fn empty_universe_has_no_dates() {
        assert_eq!(latest_date(&[]), None);
        assert_eq!(latest_date(&[CodeData::new("X".into(), vec![])]), None);
    }

    #[test]
    fn from_map_keeps_ticker_order() {
        let mut map = BTreeMap::new();
        map.insert("600519".to_string(), vec![make_bar("600519", "2024-01-01", 1.0)]);
        map.insert("000001".to_string(), vec![]);
        let codes = from_map(map);
        assert_eq!(codes[0].code, "000001");
        assert_eq!(codes[1].ohlcv.len(), 1);
    }
}
