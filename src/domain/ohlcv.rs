//! OHLCV bar representation.

use crate::domain::error::ScreenError;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl OhlcvBar {
    /// Check the per-bar value invariants: finite prices, `low <= open,close <= high`,
    /// non-negative volume.
    pub fn validate(&self) -> Result<(), ScreenError> {
        let fields = [self.open, self.high, self.low, self.close, self.volume];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(self.malformed("non-finite value"));
        }
        if self.high < self.low {
            return Err(self.malformed("high < low"));
        }
        if self.open < self.low || self.open > self.high {
            return Err(self.malformed("open outside [low, high]"));
        }
        if self.close < self.low || self.close > self.high {
            return Err(self.malformed("close outside [low, high]"));
        }
        if self.volume < 0.0 {
            return Err(self.malformed("negative volume"));
        }
        Ok(())
    }

    fn malformed(&self, reason: &str) -> ScreenError {
        ScreenError::MalformedBar {
            code: self.code.clone(),
            date: self.date,
            reason: reason.to_string(),
        }
    }
}

/// Validate every bar plus the sequence invariant: strictly ascending dates
/// (no duplicates). Gaps between dates are fine.
pub fn validate_series(bars: &[OhlcvBar]) -> Result<(), ScreenError> {
    for (i, bar) in bars.iter().enumerate() {
        bar.validate()?;
        if i > 0 && bars[i - 1].date >= bar.date {
            let reason = if bars[i - 1].date == bar.date {
                "duplicate date"
            } else {
                "dates out of order"
            };
            return Err(bar.malformed(reason));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bar() -> OhlcvBar {
        OhlcvBar {
            code: "600519".into(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            open: 100.0,
            high: 110.0,
            low: 90.0,
            close: 105.0,
            volume: 50_000.0,
        }
    }

    #[test]
    fn valid_bar_passes() {
        assert!(sample_bar().validate().is_ok());
    }

    #[test]
    fn high_below_low_rejected() {
        let mut bar = sample_bar();
        bar.high = 80.0;
        let err = bar.validate().unwrap_err();
        assert!(matches!(
            err,
            ScreenError::MalformedBar { ref reason, .. } if reason == "high < low"
        ));
    }

    #[test]
    fn close_outside_range_rejected() {
        let mut bar = sample_bar();
        bar.close = 111.0;
        assert!(bar.validate().is_err());
    }

    #[test]
    fn negative_volume_rejected() {
        let mut bar = sample_bar();
        bar.volume = -1.0;
        assert!(bar.validate().is_err());
    }

    #[test]
    fn nan_rejected() {
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        assert!(bar.validate().is_err());
    }

    #[test]
    fn series_with_gaps_is_valid() {
        let a = sample_bar();
        let mut b = sample_bar();
        b.date = NaiveDate::from_ymd_opt(2024, 1, 19).unwrap();
        assert!(validate_series(&[a, b]).is_ok());
    }

    #[test]
    fn series_duplicate_date_rejected() {
        let a = sample_bar();
        let b = sample_bar();
        let err = validate_series(&[a, b]).unwrap_err();
        assert!(matches!(
            err,
            ScreenError::MalformedBar { ref reason, .. } if reason == "duplicate date"
        ));
    }

    #[test]
    fn series_out_of_order_rejected() {
        let a = sample_bar();
        let mut b = sample_bar();
        b.date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert!(validate_series(&[a, b]).is_err());
    }
}
