//! Selection runner.
//!
//! Applies the enabled strategies to every ticker for one target date. Each
//! ticker is independent: its bars are validated, its indicator bundle is
//! computed once and shared by all strategies, and every strategy evaluation is
//! isolated so that a failure (or panic) in one ticker/strategy pair becomes a
//! diagnostic instead of aborting the batch.
//!
//! Tickers are dispatched to a rayon pool. Output is ordered by ticker, then by
//! strategy order, whatever the scheduling.

use crate::domain::code_data::{self, CodeData};
use crate::domain::error::ScreenError;
use crate::domain::indicator::{IndicatorBundle, IndicatorConfig};
use crate::domain::ohlcv::{validate_series, OhlcvBar};
use crate::domain::strategy::{ActiveStrategy, Strategy};
use chrono::NaiveDate;
use rayon::prelude::*;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, info, warn};

/// One ticker x strategy hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionResult {
    pub date: NaiveDate,
    pub code: String,
    pub strategy_alias: String,
}

/// A ticker (or one of its strategies) that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerDiagnostic {
    pub code: String,
    /// `None` when the whole ticker was rejected.
    pub strategy_alias: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionReport {
    pub results: Vec<SelectionResult>,
    pub diagnostics: Vec<TickerDiagnostic>,
    /// Tickers without a bar on the target date.
    pub skipped: Vec<String>,
    pub evaluated: usize,
}

impl SelectionReport {
    /// Hit codes per strategy alias, in strategy order.
    pub fn hits_by_alias(&self, strategies: &[ActiveStrategy]) -> Vec<(String, Vec<String>)> {
        strategies
            .iter()
            .map(|s| {
                let codes = self
                    .results
                    .iter()
                    .filter(|r| r.strategy_alias == s.alias)
                    .map(|r| r.code.clone())
                    .collect();
                (s.alias.clone(), codes)
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickerOutcome {
    Skipped,
    Rejected(TickerDiagnostic),
    Evaluated {
        hits: Vec<SelectionResult>,
        diagnostics: Vec<TickerDiagnostic>,
    },
}

pub struct SelectionRunner {
    strategies: Vec<ActiveStrategy>,
    indicator_config: IndicatorConfig,
    workers: Option<usize>,
}

impl SelectionRunner {
    pub fn new(strategies: Vec<ActiveStrategy>, indicator_config: IndicatorConfig) -> Self {
        Self {
            strategies,
            indicator_config,
            workers: None,
        }
    }

    /// Run on a dedicated pool of `workers` threads instead of rayon's global pool.
    pub fn with_workers(mut self, workers: Option<usize>) -> Self {
        self.workers = workers;
        self
    }

    pub fn run(
        &self,
        universe: &[CodeData],
        target_date: NaiveDate,
    ) -> Result<SelectionReport, ScreenError> {
        let mut ordered: Vec<&CodeData> = universe.iter().collect();
        ordered.sort_by(|a, b| a.code.cmp(&b.code));

        info!(
            tickers = ordered.len(),
            strategies = self.strategies.len(),
            %target_date,
            "running selection"
        );

        let evaluate_all = || -> Vec<TickerOutcome> {
            ordered
                .par_iter()
                .map(|cd| self.evaluate_ticker(cd, target_date))
                .collect()
        };

        let outcomes = match self.workers {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ScreenError::WorkerPool {
                        reason: e.to_string(),
                    })?;
                pool.install(evaluate_all)
            }
            None => evaluate_all(),
        };

        let mut report = SelectionReport::default();
        for (cd, outcome) in ordered.iter().zip(outcomes) {
            match outcome {
                TickerOutcome::Skipped => report.skipped.push(cd.code.clone()),
                TickerOutcome::Rejected(diag) => report.diagnostics.push(diag),
                TickerOutcome::Evaluated { hits, diagnostics } => {
                    report.evaluated += 1;
                    report.results.extend(hits);
                    report.diagnostics.extend(diagnostics);
                }
            }
        }

        info!(
            hits = report.results.len(),
            evaluated = report.evaluated,
            skipped = report.skipped.len(),
            diagnostics = report.diagnostics.len(),
            "selection finished"
        );
        Ok(report)
    }

    /// Evaluate every strategy for one ticker.
    pub fn evaluate_ticker(&self, cd: &CodeData, target_date: NaiveDate) -> TickerOutcome {
        if let Err(e) = validate_series(&cd.ohlcv) {
            warn!(code = %cd.code, error = %e, "skipping ticker with malformed bars");
            return TickerOutcome::Rejected(TickerDiagnostic {
                code: cd.code.clone(),
                strategy_alias: None,
                reason: e.to_string(),
            });
        }

        let Some(index) = cd.get_bar_index(target_date) else {
            debug!(code = %cd.code, %target_date, "no bar on target date");
            return TickerOutcome::Skipped;
        };

        let bars = &cd.ohlcv[..];
        let computed = catch_unwind(AssertUnwindSafe(|| {
            IndicatorBundle::compute(bars, &self.indicator_config)
        }));
        let bundle = match computed {
            Ok(bundle) => bundle,
            Err(payload) => {
                let reason =
                    format!("indicator computation panicked: {}", panic_message(&*payload));
                warn!(code = %cd.code, %reason, "skipping ticker");
                return TickerOutcome::Rejected(TickerDiagnostic {
                    code: cd.code.clone(),
                    strategy_alias: None,
                    reason,
                });
            }
        };

        let mut hits = Vec::new();
        let mut diagnostics = Vec::new();
        for active in &self.strategies {
            let kind = active.strategy.identifier();
            let outcome = catch_unwind(AssertUnwindSafe(|| {
                active.strategy.evaluate_at(bars, &bundle, index)
            }));
            let reason = match outcome {
                Ok(Ok(true)) => {
                    debug!(code = %cd.code, strategy = %active.alias, "hit");
                    hits.push(SelectionResult {
                        date: target_date,
                        code: cd.code.clone(),
                        strategy_alias: active.alias.clone(),
                    });
                    continue;
                }
                Ok(Ok(false)) => continue,
                Ok(Err(e)) if e.is_insufficient_history() => {
                    debug!(code = %cd.code, strategy = %active.alias, error = %e, "not evaluable");
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(payload) => format!("strategy panicked: {}", panic_message(&*payload)),
            };
            warn!(code = %cd.code, strategy = %active.alias, kind, %reason, "strategy failed");
            diagnostics.push(TickerDiagnostic {
                code: cd.code.clone(),
                strategy_alias: Some(active.alias.clone()),
                reason,
            });
        }

        TickerOutcome::Evaluated { hits, diagnostics }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run the strategies over a ticker -> bars mapping on rayon's global pool.
pub fn run_selection(
    universe: BTreeMap<String, Vec<OhlcvBar>>,
    strategies: Vec<ActiveStrategy>,
    target_date: NaiveDate,
    indicator_config: IndicatorConfig,
) -> Result<SelectionReport, ScreenError> {
    let codes = code_data::from_map(universe);
    SelectionRunner::new(strategies, indicator_config).run(&codes, target_date)
}
