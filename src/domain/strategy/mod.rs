//! Screening strategies.
//!
//! Every variant implements [`Strategy`]: a predicate over one ticker's bars and
//! its [`IndicatorBundle`] at a single target bar. Variants read only bars at or
//! before the target. Missing history surfaces as `InsufficientHistory` from
//! [`Strategy::evaluate_at`] and as "no hit" from [`Strategy::evaluate`].
//!
//! [`ConfiguredStrategy`] is the registry: it maps a descriptor's identifier to
//! the variant and parses its parameters once, up front.

pub mod bias_crossover;
pub mod ma_volume;
pub mod multi_window;
pub mod oscillator_threshold;
pub mod pit_filling;

use crate::domain::error::ScreenError;
use crate::domain::indicator::IndicatorBundle;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::params::StrategyParams;
use chrono::NaiveDate;

pub use bias_crossover::BiasCrossover;
pub use ma_volume::MaVolume;
pub use multi_window::MultiWindow;
pub use oscillator_threshold::{JCondition, OscillatorThreshold};
pub use pit_filling::PitFilling;

/// One configured strategy entry: `{identifier, alias, enabled, parameters}`.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyDescriptor {
    pub identifier: String,
    pub alias: String,
    pub enabled: bool,
    pub params: StrategyParams,
}

pub trait Strategy {
    /// Evaluate at bar `index`. Implementations must not read past `index`.
    fn evaluate_at(
        &self,
        bars: &[OhlcvBar],
        bundle: &IndicatorBundle,
        index: usize,
    ) -> Result<bool, ScreenError>;

    /// Evaluate on `target_date`; absent dates and short histories are no hit.
    fn evaluate(
        &self,
        bars: &[OhlcvBar],
        bundle: &IndicatorBundle,
        target_date: NaiveDate,
    ) -> bool {
        match target_index(bars, target_date) {
            Some(index) => self.evaluate_at(bars, bundle, index).unwrap_or(false),
            None => false,
        }
    }
}

/// Position of `date` in date-sorted bars.
pub fn target_index(bars: &[OhlcvBar], date: NaiveDate) -> Option<usize> {
    bars.binary_search_by_key(&date, |b| b.date).ok()
}

/// Fails with `InsufficientHistory` unless bars `[index + 1 - needed, index]` exist.
pub(crate) fn require_history(index: usize, needed: usize) -> Result<(), ScreenError> {
    if index + 1 < needed {
        return Err(ScreenError::InsufficientHistory {
            needed,
            available: index + 1,
        });
    }
    Ok(())
}

pub const OSCILLATOR_THRESHOLD: &str = "oscillator_threshold";
pub const BIAS_CROSSOVER: &str = "bias_crossover";
pub const PIT_FILLING: &str = "pit_filling";
pub const MULTI_WINDOW: &str = "multi_window";
pub const MA_VOLUME: &str = "ma_volume";

pub const IDENTIFIERS: [&str; 5] = [
    OSCILLATOR_THRESHOLD,
    BIAS_CROSSOVER,
    PIT_FILLING,
    MULTI_WINDOW,
    MA_VOLUME,
];

#[derive(Debug, Clone, PartialEq)]
pub enum ConfiguredStrategy {
    OscillatorThreshold(OscillatorThreshold),
    BiasCrossover(BiasCrossover),
    PitFilling(PitFilling),
    MultiWindow(MultiWindow),
    MaVolume(MaVolume),
    /// Hits on every ticker except the named one, where it panics.
    #[cfg(test)]
    PanicOn(String),
}

impl ConfiguredStrategy {
    pub fn from_descriptor(descriptor: &StrategyDescriptor) -> Result<Self, ScreenError> {
        let params = &descriptor.params;
        match descriptor.identifier.trim().to_lowercase().as_str() {
            OSCILLATOR_THRESHOLD => {
                Ok(Self::OscillatorThreshold(OscillatorThreshold::from_params(params)?))
            }
            BIAS_CROSSOVER => Ok(Self::BiasCrossover(BiasCrossover::from_params(params)?)),
            PIT_FILLING => Ok(Self::PitFilling(PitFilling::from_params(params)?)),
            MULTI_WINDOW => Ok(Self::MultiWindow(MultiWindow::from_params(params)?)),
            MA_VOLUME => Ok(Self::MaVolume(MaVolume::from_params(params)?)),
            _ => Err(ScreenError::UnknownStrategy {
                section: params.section().to_string(),
                identifier: descriptor.identifier.clone(),
            }),
        }
    }

    pub fn identifier(&self) -> &'static str {
        match self {
            Self::OscillatorThreshold(_) => OSCILLATOR_THRESHOLD,
            Self::BiasCrossover(_) => BIAS_CROSSOVER,
            Self::PitFilling(_) => PIT_FILLING,
            Self::MultiWindow(_) => MULTI_WINDOW,
            Self::MaVolume(_) => MA_VOLUME,
            #[cfg(test)]
            Self::PanicOn(_) => "panic_on",
        }
    }
}

impl Strategy for ConfiguredStrategy {
    fn evaluate_at(
        &self,
        bars: &[OhlcvBar],
        bundle: &IndicatorBundle,
        index: usize,
    ) -> Result<bool, ScreenError> {
        match self {
            Self::OscillatorThreshold(s) => s.evaluate_at(bars, bundle, index),
            Self::BiasCrossover(s) => s.evaluate_at(bars, bundle, index),
            Self::PitFilling(s) => s.evaluate_at(bars, bundle, index),
            Self::MultiWindow(s) => s.evaluate_at(bars, bundle, index),
            Self::MaVolume(s) => s.evaluate_at(bars, bundle, index),
            #[cfg(test)]
            Self::PanicOn(code) => {
                if bars.first().is_some_and(|b| &b.code == code) {
                    panic!("evaluation failed for {code}");
                }
                Ok(true)
            }
        }
    }
}

/// An enabled strategy ready to run, labelled with its display alias.
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveStrategy {
    pub alias: String,
    pub strategy: ConfiguredStrategy,
}

/// Build the enabled strategies in descriptor order. Disabled descriptors are
/// dropped without parsing their parameters.
pub fn activate(descriptors: &[StrategyDescriptor]) -> Result<Vec<ActiveStrategy>, ScreenError> {
    descriptors
        .iter()
        .filter(|d| d.enabled)
        .map(|d| {
            Ok(ActiveStrategy {
                alias: d.alias.clone(),
                strategy: ConfiguredStrategy::from_descriptor(d)?,
            })
        })
        .collect()
}
