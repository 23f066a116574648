//! Configuration validation.
//!
//! Reads and checks the `[screen]` section and every strategy section it names
//! before any data is loaded. Strategy parameters are parsed here once, so a
//! bad value fails the run up front rather than per ticker.

use crate::domain::error::ScreenError;
use crate::domain::indicator::{IndicatorConfig, DEFAULT_BBI_PERIODS, DEFAULT_KDJ_PERIOD};
use crate::domain::params::{parse_periods, StrategyParams};
use crate::domain::strategy::{ConfiguredStrategy, StrategyDescriptor};
use crate::domain::universe::{parse_boards, parse_codes, Board};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::path::PathBuf;

pub const SCREEN_SECTION: &str = "screen";
pub const STRATEGY_PREFIX: &str = "strategy.";

const RESERVED_KEYS: [&str; 3] = ["identifier", "alias", "enabled"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetDate {
    /// Newest date present in the loaded data.
    Latest,
    On(NaiveDate),
}

impl TargetDate {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("latest") {
            return Ok(TargetDate::Latest);
        }
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(TargetDate::On)
            .map_err(|_| format!("invalid date '{}', expected YYYY-MM-DD or 'latest'", raw))
    }
}

/// Validated `[screen]` settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenConfig {
    pub data_dir: PathBuf,
    pub target_date: TargetDate,
    pub codes: Option<Vec<String>>,
    /// Listing CSV used when `codes` is not set.
    pub stocklist: Option<PathBuf>,
    pub exclude_boards: Vec<Board>,
    /// Drop special-treatment names from the stocklist.
    pub exclude_st: bool,
    pub workers: Option<usize>,
    pub output: Option<String>,
    pub indicators: IndicatorConfig,
    /// Strategy names in run order, without the `strategy.` prefix.
    pub strategies: Vec<String>,
}

fn invalid(key: &str, reason: impl Into<String>) -> ScreenError {
    ScreenError::invalid_param(SCREEN_SECTION, key, reason)
}

fn missing(section: &str, key: &str) -> ScreenError {
    ScreenError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

/// Non-blank value of `[section] key`.
fn get_value(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(section: &str, key: &str, raw: &str) -> Result<bool, ScreenError> {
    match raw.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        _ => Err(ScreenError::invalid_param(
            section,
            key,
            format!("expected true or false, got '{}'", raw),
        )),
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<usize, ScreenError> {
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(invalid(key, format!("{} must be a positive integer, got '{}'", key, raw))),
    }
}

pub fn validate_screen_config(config: &dyn ConfigPort) -> Result<ScreenConfig, ScreenError> {
    let data_dir = get_value(config, SCREEN_SECTION, "data_dir")
        .map(PathBuf::from)
        .ok_or_else(|| missing(SCREEN_SECTION, "data_dir"))?;

    let target_date = match get_value(config, SCREEN_SECTION, "target_date") {
        None => TargetDate::Latest,
        Some(raw) => TargetDate::parse(&raw).map_err(|reason| invalid("target_date", reason))?,
    };

    let codes = get_value(config, SCREEN_SECTION, "codes")
        .map(|raw| parse_codes(&raw).map_err(|e| invalid("codes", e.to_string())))
        .transpose()?;

    let stocklist = get_value(config, SCREEN_SECTION, "stocklist").map(PathBuf::from);

    let exclude_boards = match get_value(config, SCREEN_SECTION, "exclude_boards") {
        None => Vec::new(),
        Some(raw) => parse_boards(&raw).map_err(|e| invalid("exclude_boards", e.to_string()))?,
    };

    let exclude_st = match get_value(config, SCREEN_SECTION, "exclude_st") {
        None => true,
        Some(raw) => parse_flag(SCREEN_SECTION, "exclude_st", &raw)?,
    };

    let workers = get_value(config, SCREEN_SECTION, "workers")
        .map(|raw| parse_positive("workers", &raw))
        .transpose()?;

    let output = get_value(config, SCREEN_SECTION, "output");

    let kdj_period = match get_value(config, SCREEN_SECTION, "kdj_period") {
        None => DEFAULT_KDJ_PERIOD,
        Some(raw) => parse_positive("kdj_period", &raw)?,
    };
    let bbi_periods = match get_value(config, SCREEN_SECTION, "bbi_periods") {
        None => DEFAULT_BBI_PERIODS.to_vec(),
        Some(raw) => parse_periods(&raw).map_err(|reason| invalid("bbi_periods", reason))?,
    };

    let strategies = validate_strategy_list(config)?;

    Ok(ScreenConfig {
        data_dir,
        target_date,
        codes,
        stocklist,
        exclude_boards,
        exclude_st,
        workers,
        output,
        indicators: IndicatorConfig {
            kdj_period,
            bbi_periods,
        },
        strategies,
    })
}

fn validate_strategy_list(config: &dyn ConfigPort) -> Result<Vec<String>, ScreenError> {
    let raw = get_value(config, SCREEN_SECTION, "strategies")
        .ok_or_else(|| missing(SCREEN_SECTION, "strategies"))?;

    let mut names = Vec::new();
    let mut seen = HashSet::new();
    for token in raw.split(',') {
        let name = token.trim().to_lowercase();
        let name = name.strip_prefix(STRATEGY_PREFIX).unwrap_or(&name).to_string();
        if name.is_empty() {
            return Err(invalid("strategies", "empty strategy name"));
        }
        if !seen.insert(name.clone()) {
            return Err(invalid("strategies", format!("duplicate strategy '{}'", name)));
        }
        names.push(name);
    }
    Ok(names)
}

/// Build the descriptor for `[strategy.<name>]`.
pub fn load_strategy_descriptor(
    config: &dyn ConfigPort,
    name: &str,
) -> Result<StrategyDescriptor, ScreenError> {
    let section = format!("{}{}", STRATEGY_PREFIX, name);
    let entries = config
        .section_entries(&section)
        .ok_or_else(|| missing(&section, "identifier"))?;

    let identifier = get_value(config, &section, "identifier")
        .ok_or_else(|| missing(&section, "identifier"))?;
    let alias = get_value(config, &section, "alias").ok_or_else(|| missing(&section, "alias"))?;
    let enabled = match get_value(config, &section, "enabled") {
        None => true,
        Some(raw) => parse_flag(&section, "enabled", &raw)?,
    };

    let params = entries
        .into_iter()
        .filter(|(k, _)| !RESERVED_KEYS.contains(&k.as_str()))
        .collect();

    Ok(StrategyDescriptor {
        identifier,
        alias,
        enabled,
        params: StrategyParams::new(section, params),
    })
}

/// Load every strategy named in `[screen] strategies`, in that order, and check
/// that each one (enabled or not) has a known identifier and valid parameters.
pub fn validate_strategy_config(
    config: &dyn ConfigPort,
    screen: &ScreenConfig,
) -> Result<Vec<StrategyDescriptor>, ScreenError> {
    let mut descriptors = Vec::with_capacity(screen.strategies.len());
    let mut aliases = HashSet::new();
    for name in &screen.strategies {
        let descriptor = load_strategy_descriptor(config, name)?;
        ConfiguredStrategy::from_descriptor(&descriptor)?;
        if !aliases.insert(descriptor.alias.clone()) {
            return Err(ScreenError::invalid_param(
                descriptor.params.section(),
                "alias",
                format!("alias '{}' is used by another strategy", descriptor.alias),
            ));
        }
        descriptors.push(descriptor);
    }
    Ok(descriptors)
}
