//! CLI definition and dispatch.
//!
//! Results go to stdout; progress and errors go through `tracing` (stderr).

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::stocklist_adapter::load_stocklist;
use crate::domain::code_data::{latest_date, CodeData};
use crate::domain::config_validation::{
    validate_screen_config, validate_strategy_config, ScreenConfig, TargetDate,
};
use crate::domain::error::ScreenError;
use crate::domain::selection::{SelectionReport, SelectionRunner, TickerDiagnostic};
use crate::domain::strategy::{activate, ActiveStrategy, StrategyDescriptor};
use crate::domain::universe::{filter_boards, parse_codes};
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stockpick", about = "Technical-indicator stock screener")]
pub struct Cli {
    /// Log progress (info level)
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Log everything (debug level)
    #[arg(long, global = true)]
    pub debug: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Screen the universe on one date
    Select {
        #[arg(short, long)]
        config: PathBuf,
        /// Target date (YYYY-MM-DD or "latest"); overrides [screen] target_date
        #[arg(long)]
        date: Option<String>,
        /// Screen only these codes (comma separated); overrides [screen] codes
        #[arg(long)]
        code: Option<String>,
        /// CSV report path; overrides [screen] output
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration and list its strategies
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List codes available in the data directory
    ListCodes {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for code(s)
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        code: Option<String>,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Select {
            config,
            date,
            code,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, code.as_deref())
            } else {
                run_select(&config, date.as_deref(), code.as_deref(), output.as_ref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::ListCodes { config } => run_list_codes(&config),
        Command::Info { config, code } => run_info(&config, code.as_deref()),
    }
}

fn fail(err: ScreenError) -> ExitCode {
    error!("{err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ScreenError> {
    FileConfigAdapter::from_file(path).map_err(|e| ScreenError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Validated configuration: `[screen]` plus every named strategy.
pub struct LoadedConfig {
    pub screen: ScreenConfig,
    pub descriptors: Vec<StrategyDescriptor>,
    pub active: Vec<ActiveStrategy>,
}

pub fn load_and_validate(path: &Path) -> Result<LoadedConfig, ScreenError> {
    info!("Loading config from {}", path.display());
    let adapter = load_config(path)?;
    let screen = validate_screen_config(&adapter)?;
    let descriptors = validate_strategy_config(&adapter, &screen)?;
    let active = activate(&descriptors)?;
    Ok(LoadedConfig {
        screen,
        descriptors,
        active,
    })
}

/// Codes to screen: the override, else `[screen] codes`, else the stocklist
/// (with ST exclusion), else every code in the data directory; then board
/// exclusions.
pub fn resolve_codes(
    code_override: Option<&str>,
    screen: &ScreenConfig,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, ScreenError> {
    let codes = match (code_override, &screen.codes) {
        (Some(raw), _) => parse_codes(raw).map_err(|e| ScreenError::ConfigInvalid {
            section: "cli".into(),
            key: "code".into(),
            reason: e.to_string(),
        })?,
        (None, Some(codes)) => codes.clone(),
        (None, None) => match &screen.stocklist {
            Some(path) => {
                let codes =
                    load_stocklist(path)?.codes(&screen.exclude_boards, screen.exclude_st);
                info!("{} codes from stocklist {}", codes.len(), path.display());
                codes
            }
            None => data_port.list_symbols()?,
        },
    };
    Ok(filter_boards(codes, &screen.exclude_boards))
}

/// Load bars, resolve the target date, run the strategies.
///
/// Codes that fail to load are reported as diagnostics.
pub fn run_select_pipeline(
    data_port: &dyn DataPort,
    screen: &ScreenConfig,
    strategies: Vec<ActiveStrategy>,
    codes: &[String],
    target: TargetDate,
) -> Result<(NaiveDate, SelectionReport), ScreenError> {
    let end = match target {
        TargetDate::On(date) => date,
        TargetDate::Latest => NaiveDate::MAX,
    };

    let mut universe: Vec<CodeData> = Vec::with_capacity(codes.len());
    let mut load_failures = Vec::new();
    for code in codes {
        match data_port.fetch_ohlcv(code, NaiveDate::MIN, end) {
            Ok(bars) if bars.is_empty() => {
                warn!("skipping {} (no bars)", code);
                load_failures.push(TickerDiagnostic {
                    code: code.clone(),
                    strategy_alias: None,
                    reason: ScreenError::NoData { code: code.clone() }.to_string(),
                });
            }
            Ok(bars) => universe.push(CodeData::new(code.clone(), bars)),
            Err(e) => {
                warn!("skipping {} ({})", code, e);
                load_failures.push(TickerDiagnostic {
                    code: code.clone(),
                    strategy_alias: None,
                    reason: e.to_string(),
                });
            }
        }
    }

    let target_date = match target {
        TargetDate::On(date) => date,
        TargetDate::Latest => latest_date(&universe).ok_or_else(|| ScreenError::Data {
            reason: "no bars loaded; cannot resolve latest date".into(),
        })?,
    };
    info!("Loaded {} of {} codes, target date {}", universe.len(), codes.len(), target_date);

    let runner =
        SelectionRunner::new(strategies, screen.indicators.clone()).with_workers(screen.workers);
    let mut report = runner.run(&universe, target_date)?;
    report.diagnostics.extend(load_failures);
    report.diagnostics.sort_by(|a, b| a.code.cmp(&b.code));
    Ok((target_date, report))
}

/// Human-readable summary: per-alias hits, then diagnostics.
pub fn format_summary(
    target_date: NaiveDate,
    report: &SelectionReport,
    strategies: &[ActiveStrategy],
) -> String {
    let mut out = format!(
        "Selection for {}: {} evaluated, {} skipped\n",
        target_date,
        report.evaluated,
        report.skipped.len()
    );
    for (alias, codes) in report.hits_by_alias(strategies) {
        let noun = if codes.len() == 1 { "hit" } else { "hits" };
        out.push_str(&format!("{}: {} {}\n", alias, codes.len(), noun));
        if !codes.is_empty() {
            out.push_str(&format!("  {}\n", codes.join(", ")));
        }
    }
    for diag in &report.diagnostics {
        match &diag.strategy_alias {
            Some(alias) => out.push_str(&format!("! {} [{}]: {}\n", diag.code, alias, diag.reason)),
            None => out.push_str(&format!("! {}: {}\n", diag.code, diag.reason)),
        }
    }
    out
}

fn run_select(
    config_path: &Path,
    date_override: Option<&str>,
    code_override: Option<&str>,
    output_override: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load and validate config
    let loaded = match load_and_validate(config_path) {
        Ok(l) => l,
        Err(e) => return fail(e),
    };

    let target = match date_override {
        Some(raw) => match TargetDate::parse(raw) {
            Ok(t) => t,
            Err(reason) => {
                return fail(ScreenError::ConfigInvalid {
                    section: "cli".into(),
                    key: "date".into(),
                    reason,
                })
            }
        },
        None => loaded.screen.target_date,
    };

    if loaded.active.is_empty() {
        warn!("no enabled strategies; nothing to do");
    }

    // Stage 2: Resolve universe
    let data_port = CsvAdapter::new(loaded.screen.data_dir.clone());
    let codes = match resolve_codes(code_override, &loaded.screen, &data_port) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    if codes.is_empty() {
        return fail(ScreenError::Data {
            reason: "no codes to screen".into(),
        });
    }

    // Stage 3: Load bars and run
    let active = loaded.active.clone();
    let outcome = run_select_pipeline(&data_port, &loaded.screen, active, &codes, target);
    let (target_date, report) = match outcome {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    // Stage 4: Print and persist
    print!("{}", format_summary(target_date, &report, &loaded.active));

    let output = output_override
        .map(|p| p.display().to_string())
        .or_else(|| loaded.screen.output.clone());
    if let Some(path) = output {
        if let Err(e) = CsvReportAdapter.write(&report.results, &path) {
            return fail(e);
        }
        info!("Report written to: {}", path);
    }

    ExitCode::SUCCESS
}

fn print_strategies(descriptors: &[StrategyDescriptor]) {
    for d in descriptors {
        let state = if d.enabled { "enabled" } else { "disabled" };
        let params: Vec<String> = d
            .params
            .keys()
            .filter_map(|k| d.params.get(k).map(|v| format!("{}={}", k, v)))
            .collect();
        println!("  {} ({}, {}) {}", d.alias, d.identifier, state, params.join(" "));
    }
}

fn run_dry_run(config_path: &Path, code_override: Option<&str>) -> ExitCode {
    let loaded = match load_and_validate(config_path) {
        Ok(l) => l,
        Err(e) => return fail(e),
    };

    println!("Strategies:");
    print_strategies(&loaded.descriptors);

    let data_port = CsvAdapter::new(loaded.screen.data_dir.clone());
    let codes = match resolve_codes(code_override, &loaded.screen, &data_port) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    println!("Universe: {} codes", codes.len());
    if codes.is_empty() {
        return fail(ScreenError::Data {
            reason: "no codes to screen".into(),
        });
    }

    println!("Dry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let loaded = match load_and_validate(config_path) {
        Ok(l) => l,
        Err(e) => return fail(e),
    };

    println!("Strategies:");
    print_strategies(&loaded.descriptors);
    println!(
        "Configuration is valid: {} of {} strategies enabled",
        loaded.active.len(),
        loaded.descriptors.len()
    );
    ExitCode::SUCCESS
}

fn run_list_codes(config_path: &Path) -> ExitCode {
    let loaded = match load_and_validate(config_path) {
        Ok(l) => l,
        Err(e) => return fail(e),
    };

    let data_port = CsvAdapter::new(loaded.screen.data_dir.clone());
    let symbols = match data_port.list_symbols() {
        Ok(s) => filter_boards(s, &loaded.screen.exclude_boards),
        Err(e) => return fail(e),
    };

    if symbols.is_empty() {
        warn!("No codes found in {}", loaded.screen.data_dir.display());
    }
    for symbol in &symbols {
        println!("{}", symbol);
    }
    info!("{} codes found", symbols.len());
    ExitCode::SUCCESS
}

fn run_info(config_path: &Path, code: Option<&str>) -> ExitCode {
    let loaded = match load_and_validate(config_path) {
        Ok(l) => l,
        Err(e) => return fail(e),
    };

    let data_port = CsvAdapter::new(loaded.screen.data_dir.clone());
    let codes = match resolve_codes(code, &loaded.screen, &data_port) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    for c in &codes {
        match data_port.get_data_range(c) {
            Ok(Some((min_date, max_date, count))) => {
                println!("{}: {} bars, {} to {}", c, count, min_date, max_date);
            }
            Ok(None) => println!("{}: no data found", c),
            Err(e) => warn!("error querying {}: {}", c, e),
        }
    }
    ExitCode::SUCCESS
}
