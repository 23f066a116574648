//! CSV file data adapter.
//!
//! One file per ticker, `<base_path>/<code>.csv`, with a header row. Columns are
//! located by name, so `date,open,close,high,low,volume` and
//! `date,open,high,low,close,volume` both work. Bar invariants are not checked
//! here; the selection runner does that per ticker.

use crate::domain::error::ScreenError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use csv::StringRecord;
use std::fs;
use std::path::PathBuf;

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

/// Position of each of [`COLUMNS`] in the header.
struct ColumnMap([usize; 6]);

impl ColumnMap {
    fn from_header(header: &StringRecord, path: &str) -> Result<Self, ScreenError> {
        let mut positions = [0usize; 6];
        for (slot, name) in positions.iter_mut().zip(COLUMNS) {
            *slot = header
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
                .ok_or_else(|| ScreenError::Data {
                    reason: format!("{path}: missing {name} column"),
                })?;
        }
        Ok(Self(positions))
    }

    fn field<'r>(&self, record: &'r StringRecord, column: usize) -> Result<&'r str, ScreenError> {
        record
            .get(self.0[column])
            .map(str::trim)
            .ok_or_else(|| ScreenError::Data {
                reason: format!("missing {} value", COLUMNS[column]),
            })
    }

    fn number(&self, record: &StringRecord, column: usize) -> Result<f64, ScreenError> {
        let raw = self.field(record, column)?;
        raw.parse().map_err(|_| ScreenError::Data {
            reason: format!("invalid {} value '{}'", COLUMNS[column], raw),
        })
    }
}

/// `2024-01-15`, `20240115`, or either followed by a time part.
pub fn parse_bar_date(raw: &str) -> Result<NaiveDate, ScreenError> {
    let day = raw
        .trim()
        .split(|c: char| c == ' ' || c == 'T')
        .next()
        .unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%Y%m%d"))
        .map_err(|_| ScreenError::Data {
            reason: format!("invalid date '{}'", raw),
        })
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, code: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", code))
    }

    fn read_all(&self, code: &str) -> Result<Vec<OhlcvBar>, ScreenError> {
        let path = self.csv_path(code);
        let display = path.display().to_string();
        let content = fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScreenError::NoData {
                code: code.to_string(),
            },
            _ => ScreenError::Data {
                reason: format!("failed to read {}: {}", display, e),
            },
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let header = rdr.headers().map_err(|e| ScreenError::Data {
            reason: format!("{}: CSV header error: {}", display, e),
        })?;
        let columns = ColumnMap::from_header(header, &display)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| ScreenError::Data {
                reason: format!("{}: CSV parse error: {}", display, e),
            })?;
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            bars.push(OhlcvBar {
                code: code.to_string(),
                date: parse_bar_date(columns.field(&record, 0)?)?,
                open: columns.number(&record, 1)?,
                high: columns.number(&record, 2)?,
                low: columns.number(&record, 3)?,
                close: columns.number(&record, 4)?,
                volume: columns.number(&record, 5)?,
            });
        }

        bars.sort_by_key(|b| b.date);
        Ok(bars)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenError> {
        let mut bars = self.read_all(code)?;
        bars.retain(|b| b.date >= start_date && b.date <= end_date);
        Ok(bars)
    }

    fn list_symbols(&self) -> Result<Vec<String>, ScreenError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| ScreenError::Data {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ScreenError::Data {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();
            if let Some(code) = name_str.strip_suffix(".csv") {
                if !code.is_empty() {
                    symbols.push(code.to_string());
                }
            }
        }

        symbols.sort();
        Ok(symbols)
    }

    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScreenError> {
        let bars = self.read_all(code)?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
