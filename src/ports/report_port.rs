//! Report generation port trait.

use crate::domain::error::ScreenError;
use crate::domain::selection::SelectionResult;

/// Port for persisting selection results.
pub trait ReportPort {
    fn write(&self, results: &[SelectionResult], output_path: &str) -> Result<(), ScreenError>;
}
