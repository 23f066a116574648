//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorSeries`: A time series of indicator values, aligned 1:1 with its bars
//! - `IndicatorBundle`: The per-ticker RSV / KDJ / BBI set shared by all strategies
//!
//! Warm-up points are stored with `valid == false` and must be read as
//! "not evaluable", never as zero.

pub mod bbi;
pub mod kdj;
pub mod rsv;
pub mod sma;

use crate::domain::error::ScreenError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::borrow::Cow;

pub const DEFAULT_KDJ_PERIOD: usize = 9;
pub const DEFAULT_BBI_PERIODS: [usize; 4] = [3, 6, 12, 24];

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Kdj { k: f64, d: f64, j: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorField {
    Value,
    K,
    D,
    J,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsv(usize),
    Kdj(usize),
    Bbi(Vec<usize>),
}

impl IndicatorType {
    /// Number of bars needed before the first defined value.
    pub fn min_bars(&self) -> usize {
        match self {
            IndicatorType::Sma(n) | IndicatorType::Rsv(n) | IndicatorType::Kdj(n) => *n,
            IndicatorType::Bbi(periods) => periods.iter().copied().max().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub(crate) fn empty(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read one field at `index`, failing with `InsufficientHistory` inside the
    /// warm-up region (or past the end of the series).
    pub fn try_field_at(&self, index: usize, field: IndicatorField) -> Result<f64, ScreenError> {
        let insufficient = || ScreenError::InsufficientHistory {
            needed: self.indicator_type.min_bars(),
            available: index + 1,
        };
        let point = self.values.get(index).ok_or_else(insufficient)?;
        if !point.valid {
            return Err(insufficient());
        }
        extract_field(&point.value, field).ok_or_else(insufficient)
    }

    pub fn field_at(&self, index: usize, field: IndicatorField) -> Option<f64> {
        self.try_field_at(index, field).ok()
    }

    pub fn value_at(&self, index: usize) -> Option<f64> {
        self.field_at(index, IndicatorField::Value)
    }

    /// The whole series projected onto one field; warm-up points become `None`.
    pub fn field_values(&self, field: IndicatorField) -> Vec<Option<f64>> {
        (0..self.values.len())
            .map(|i| self.field_at(i, field))
            .collect()
    }
}

fn extract_field(value: &IndicatorValue, field: IndicatorField) -> Option<f64> {
    match (value, field) {
        (IndicatorValue::Simple(v), IndicatorField::Value) => Some(*v),
        (IndicatorValue::Kdj { k, .. }, IndicatorField::K) => Some(*k),
        (IndicatorValue::Kdj { d, .. }, IndicatorField::D) => Some(*d),
        (IndicatorValue::Kdj { j, .. }, IndicatorField::J) => Some(*j),
        _ => None,
    }
}

/// Indicator settings shared by every strategy in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub kdj_period: usize,
    pub bbi_periods: Vec<usize>,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            kdj_period: DEFAULT_KDJ_PERIOD,
            bbi_periods: DEFAULT_BBI_PERIODS.to_vec(),
        }
    }
}

/// Derived series for one ticker. Computed once per run and read-only afterwards.
#[derive(Debug, Clone)]
pub struct IndicatorBundle {
    pub config: IndicatorConfig,
    pub rsv: IndicatorSeries,
    pub kdj: IndicatorSeries,
    pub bbi: IndicatorSeries,
}

impl IndicatorBundle {
    pub fn compute(bars: &[OhlcvBar], config: &IndicatorConfig) -> Self {
        let rsv = rsv::calculate_rsv(bars, config.kdj_period);
        let kdj = kdj::kdj_from_rsv(&rsv, config.kdj_period);
        let bbi = bbi::calculate_bbi(bars, &config.bbi_periods);
        Self {
            config: config.clone(),
            rsv,
            kdj,
            bbi,
        }
    }

    /// KDJ for `period`, reusing the bundled series when the period matches.
    pub fn kdj_for(&self, bars: &[OhlcvBar], period: usize) -> Cow<'_, IndicatorSeries> {
        if period == self.config.kdj_period {
            Cow::Borrowed(&self.kdj)
        } else {
            Cow::Owned(kdj::calculate_kdj(bars, period))
        }
    }

    /// BBI for `periods`, reusing the bundled series when the periods match.
    pub fn bbi_for(&self, bars: &[OhlcvBar], periods: &[usize]) -> Cow<'_, IndicatorSeries> {
        if periods == self.config.bbi_periods.as_slice() {
            Cow::Borrowed(&self.bbi)
        } else {
            Cow::Owned(bbi::calculate_bbi(bars, periods))
        }
    }
}
