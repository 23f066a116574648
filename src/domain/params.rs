//! Strategy parameter maps.
//!
//! Parameters arrive as raw strings (one INI section per strategy) and are
//! parsed once into each strategy's config struct. Every getter takes the
//! default used when the key is absent; a present but unparseable value is a
//! `ConfigInvalid` error naming the section and key.

use crate::domain::error::ScreenError;
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyParams {
    section: String,
    values: BTreeMap<String, String>,
}

impl StrategyParams {
    pub fn new(section: impl Into<String>, values: BTreeMap<String, String>) -> Self {
        Self {
            section: section.into(),
            values,
        }
    }

    /// Convenience constructor for code-built descriptors and tests.
    pub fn from_pairs(section: &str, pairs: &[(&str, &str)]) -> Self {
        let values = pairs
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.to_string()))
            .collect();
        Self::new(section, values)
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    fn parse<T: FromStr>(&self, key: &str, expected: &str) -> Result<Option<T>, ScreenError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw.parse::<T>().map(Some).map_err(|_| {
                let reason = format!("expected {expected}, got '{raw}'");
                ScreenError::invalid_param(&self.section, key, reason)
            }),
        }
    }

    /// A window length or count; must be at least 1.
    pub fn usize_or(&self, key: &str, default: usize) -> Result<usize, ScreenError> {
        let value = self.parse::<usize>(key, "a positive integer")?.unwrap_or(default);
        if value == 0 {
            return Err(ScreenError::invalid_param(&self.section, key, "must be at least 1"));
        }
        Ok(value)
    }

    /// A count that may be zero.
    pub fn count_or(&self, key: &str, default: usize) -> Result<usize, ScreenError> {
        Ok(self.parse::<usize>(key, "a non-negative integer")?.unwrap_or(default))
    }

    pub fn f64_or(&self, key: &str, default: f64) -> Result<f64, ScreenError> {
        Ok(self.optional_f64(key)?.unwrap_or(default))
    }

    pub fn optional_f64(&self, key: &str) -> Result<Option<f64>, ScreenError> {
        match self.parse::<f64>(key, "a number")? {
            Some(v) if !v.is_finite() => {
                Err(ScreenError::invalid_param(&self.section, key, "must be finite"))
            }
            other => Ok(other),
        }
    }

    /// A quantile level or ratio in [0, 1].
    pub fn fraction_or(&self, key: &str, default: f64) -> Result<f64, ScreenError> {
        let value = self.f64_or(key, default)?;
        check_fraction(&self.section, key, value)
    }

    pub fn optional_fraction(&self, key: &str) -> Result<Option<f64>, ScreenError> {
        self.optional_f64(key)?
            .map(|v| check_fraction(&self.section, key, v))
            .transpose()
    }

    /// A comma-separated list of window lengths, each at least 1.
    pub fn periods_or(&self, key: &str, default: &[usize]) -> Result<Vec<usize>, ScreenError> {
        match self.get(key) {
            None => Ok(default.to_vec()),
            Some(raw) => parse_periods(raw)
                .map_err(|reason| ScreenError::invalid_param(&self.section, key, reason)),
        }
    }
}

fn check_fraction(section: &str, key: &str, value: f64) -> Result<f64, ScreenError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ScreenError::invalid_param(section, key, "must be between 0 and 1"));
    }
    Ok(value)
}

/// Parse "3,6,12,24" into window lengths. Also used for `[screen] bbi_periods`.
pub fn parse_periods(raw: &str) -> Result<Vec<usize>, String> {
    let mut periods = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        let period: usize = token
            .parse()
            .map_err(|_| format!("invalid period '{token}'"))?;
        if period == 0 {
            return Err("periods must be at least 1".to_string());
        }
        periods.push(period);
    }
    Ok(periods)
}
