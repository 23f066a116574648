//! Data access port trait.

use crate::domain::error::ScreenError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars for `code` within `[start_date, end_date]`, sorted by date.
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, ScreenError>;

    fn list_symbols(&self) -> Result<Vec<String>, ScreenError>;

    /// First date, last date and bar count, or `None` when there are no bars.
    fn get_data_range(
        &self,
        code: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, ScreenError>;
}
