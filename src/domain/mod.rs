//! Core domain types and logic.

pub mod ohlcv;
pub mod indicator;
pub mod window_stats;
pub mod params;
pub mod strategy;
pub mod selection;
pub mod universe;
pub mod code_data;
pub mod config_validation;
pub mod error;
