//! CSV report adapter implementing ReportPort.
//!
//! Writes one `date,code,strategy` row per selection result, in the order given.

use std::fs;
use std::path::Path;

use crate::domain::error::ScreenError;
use crate::domain::selection::SelectionResult;
use crate::ports::report_port::ReportPort;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    fn write_err(path: &str, e: impl std::fmt::Display) -> ScreenError {
        ScreenError::Data {
            reason: format!("failed to write report {}: {}", path, e),
        }
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, results: &[SelectionResult], output_path: &str) -> Result<(), ScreenError> {
        if let Some(parent) = Path::new(output_path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut writer =
            csv::Writer::from_path(output_path).map_err(|e| Self::write_err(output_path, e))?;
        writer
            .write_record(["date", "code", "strategy"])
            .map_err(|e| Self::write_err(output_path, e))?;
        for result in results {
            let date = result.date.format("%Y-%m-%d").to_string();
            writer
                .write_record([date.as_str(), result.code.as_str(), result.strategy_alias.as_str()])
                .map_err(|e| Self::write_err(output_path, e))?;
        }
        writer.flush()?;
        Ok(())
    }
}
