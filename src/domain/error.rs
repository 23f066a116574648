//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for stockpick.
#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("unknown strategy identifier '{identifier}' in [{section}]")]
    UnknownStrategy { section: String, identifier: String },

    #[error("no data for {code}")]
    NoData { code: String },

    #[error("insufficient history: need {needed} bars, have {available}")]
    InsufficientHistory { needed: usize, available: usize },

    #[error("malformed bar for {code} on {date}: {reason}")]
    MalformedBar {
        code: String,
        date: NaiveDate,
        reason: String,
    },

    #[error("worker pool error: {reason}")]
    WorkerPool { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScreenError {
    pub fn invalid_param(section: &str, key: &str, reason: impl Into<String>) -> Self {
        ScreenError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_insufficient_history(&self) -> bool {
        matches!(self, ScreenError::InsufficientHistory { .. })
    }
}

impl From<&ScreenError> for std::process::ExitCode {
    fn from(err: &ScreenError) -> Self {
        let code: u8 = match err {
            ScreenError::Io(_) | ScreenError::WorkerPool { .. } => 1,
            ScreenError::ConfigParse { .. }
            | ScreenError::ConfigMissing { .. }
            | ScreenError::ConfigInvalid { .. } => 2,
            ScreenError::Data { .. } => 3,
            ScreenError::UnknownStrategy { .. } => 4,
            ScreenError::NoData { .. }
            | ScreenError::InsufficientHistory { .. }
            | ScreenError::MalformedBar { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_history_message() {
        let err = ScreenError::InsufficientHistory {
            needed: 60,
            available: 12,
        };
        assert_eq!(err.to_string(), "insufficient history: need 60 bars, have 12");
        assert!(err.is_insufficient_history());
    }

    #[test]
    fn malformed_bar_message() {
        let err = ScreenError::MalformedBar {
            code: "600519".into(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            reason: "high < low".into(),
        };
        assert_eq!(
            err.to_string(),
            "malformed bar for 600519 on 2024-03-01: high < low"
        );
        assert!(!err.is_insufficient_history());
    }

    #[test]
    fn exit_codes_by_category() {
        use std::process::ExitCode;

        let code = |e: &ScreenError| format!("{:?}", ExitCode::from(e));
        let expect = |n: u8| format!("{:?}", ExitCode::from(n));

        let cfg = ScreenError::invalid_param("screen", "workers", "must be >= 1");
        assert_eq!(code(&cfg), expect(2));

        let unknown = ScreenError::UnknownStrategy {
            section: "strategy.x".into(),
            identifier: "nope".into(),
        };
        assert_eq!(code(&unknown), expect(4));

        let data = ScreenError::Data {
            reason: "boom".into(),
        };
        assert_eq!(code(&data), expect(3));
    }
}
