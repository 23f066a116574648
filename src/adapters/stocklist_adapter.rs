//! Listing file reader.
//!
//! A CSV with a `symbol` column (or only `ts_code`, e.g. `000001.SZ`), and
//! optionally a name column: the first of `name`, `stock_name`, `stockname`.
//! Numeric symbols are zero-padded to six digits; repeated symbols keep their
//! first row.

use crate::domain::error::ScreenError;
use crate::domain::universe::{ListedStock, Stocklist};
use csv::StringRecord;
use std::collections::HashSet;
use std::path::Path;

const NAME_COLUMNS: [&str; 3] = ["name", "stock_name", "stockname"];

fn column(header: &StringRecord, name: &str) -> Option<usize> {
    header.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

fn cell(record: &StringRecord, column: Option<usize>) -> Option<String> {
    column
        .and_then(|c| record.get(c))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn normalize_symbol(raw: &str) -> String {
    if !raw.is_empty() && raw.len() < 6 && raw.bytes().all(|b| b.is_ascii_digit()) {
        format!("{:0>6}", raw)
    } else {
        raw.to_uppercase()
    }
}

pub fn load_stocklist(path: &Path) -> Result<Stocklist, ScreenError> {
    let display = path.display().to_string();
    let mut rdr = csv::Reader::from_path(path).map_err(|e| ScreenError::Data {
        reason: format!("failed to read stocklist {}: {}", display, e),
    })?;
    let header = rdr
        .headers()
        .map_err(|e| ScreenError::Data {
            reason: format!("{}: CSV header error: {}", display, e),
        })?
        .clone();

    let symbol = column(&header, "symbol");
    let ts_code = column(&header, "ts_code");
    if symbol.is_none() && ts_code.is_none() {
        return Err(ScreenError::Data {
            reason: format!("{}: missing symbol column", display),
        });
    }
    let name_column = NAME_COLUMNS
        .iter()
        .find_map(|n| column(&header, n).map(|c| (c, n.to_string())));

    let mut stocks = Vec::new();
    let mut seen = HashSet::new();
    for result in rdr.records() {
        let record = result.map_err(|e| ScreenError::Data {
            reason: format!("{}: CSV parse error: {}", display, e),
        })?;
        let ts = cell(&record, ts_code).map(|t| t.to_uppercase());
        let raw = cell(&record, symbol).or_else(|| {
            ts.as_deref()
                .and_then(|t| t.split('.').next())
                .map(str::to_string)
        });
        let Some(raw) = raw else {
            continue;
        };
        let code = normalize_symbol(&raw);
        if !seen.insert(code.clone()) {
            continue;
        }
        stocks.push(ListedStock {
            code,
            ts_code: ts,
            name: cell(&record, name_column.as_ref().map(|(c, _)| *c)),
        });
    }

    Ok(Stocklist {
        stocks,
        name_column: name_column.map(|(_, n)| n),
    })
}
