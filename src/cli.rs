//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::price_cache::{PriceCache, DEFAULT_CACHE_ENTRIES};
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config_validation::{validate_backtest_config, validate_strategy_config};
use crate::domain::error::EodtraderError;
use crate::domain::indicator::IndicatorType;
use crate::domain::metrics::{self, MetricsReport};
use crate::domain::ohlcv::close_series;
use crate::domain::series::TimeSeries;
use crate::domain::strategy::{trade_markers, MarkerKind, PositionPolicy, SmaRsiPolicy, TradeMarker};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

/// A return needs two closes.
pub const MIN_PRICE_BARS: usize = 2;

#[derive(Parser, Debug)]
#[command(name = "eodtrader", about = "End-of-day strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Override [backtest] symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Write per-period series to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for a symbol
    Info {
        #[arg(long)]
        symbol: Option<String>,
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Everything a backtest run produces, before presentation.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub prices: TimeSeries,
    pub result: BacktestResult,
    pub metrics: MetricsReport,
    pub markers: Vec<TradeMarker>,
    pub final_capital: f64,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            symbol,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, symbol.as_deref())
            } else {
                run_backtest(&config, symbol.as_deref(), output.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
        Command::Info { symbol, config } => run_info(symbol.as_deref(), &config),
    }
}

fn fail(err: EodtraderError) -> ExitCode {
    eprintln!("error: {err}");
    (&err).into()
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, EodtraderError> {
    FileConfigAdapter::from_file(path)
}

pub fn build_backtest_config(
    adapter: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<BacktestConfig, EodtraderError> {
    let symbol = resolve_symbol(symbol_override, adapter).ok_or_else(|| {
        EodtraderError::ConfigMissing {
            section: "backtest".into(),
            key: "symbol".into(),
        }
    })?;

    Ok(BacktestConfig {
        symbol,
        start_date: adapter.get_date("backtest", "start_date")?,
        end_date: adapter.get_date("backtest", "end_date")?,
        initial_capital: adapter.get_double("backtest", "initial_capital", 10_000.0),
        risk_free_rate: adapter.get_double("backtest", "risk_free_rate", 0.0),
    })
}

pub fn build_policy(adapter: &dyn ConfigPort) -> SmaRsiPolicy {
    let defaults = SmaRsiPolicy::default();
    let length = |key: &str, default: usize| {
        usize::try_from(adapter.get_int("strategy", key, default as i64)).unwrap_or(default)
    };

    SmaRsiPolicy {
        fast: length("fast_sma", defaults.fast),
        slow: length("slow_sma", defaults.slow),
        rsi_length: length("rsi_length", defaults.rsi_length),
        rsi_low: adapter.get_double("strategy", "rsi_low", defaults.rsi_low),
        rsi_high: adapter.get_double("strategy", "rsi_high", defaults.rsi_high),
    }
}

pub fn build_data_port(adapter: &dyn ConfigPort) -> Result<PriceCache<CsvAdapter>, EodtraderError> {
    let dir = adapter
        .get_string("data", "csv_dir")
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| EodtraderError::ConfigMissing {
            section: "data".into(),
            key: "csv_dir".into(),
        })?;
    let entries = adapter.get_int("data", "cache_entries", DEFAULT_CACHE_ENTRIES as i64);
    let capacity = usize::try_from(entries).unwrap_or(DEFAULT_CACHE_ENTRIES);

    Ok(PriceCache::new(CsvAdapter::new(PathBuf::from(dir.trim())), capacity))
}

pub fn resolve_symbol(symbol_override: Option<&str>, config: &dyn ConfigPort) -> Option<String> {
    symbol_override
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "symbol"))
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
}

fn run_backtest(config_path: &Path, symbol: Option<&str>, output_path: Option<&Path>) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(e);
    }

    // Stage 2: Build run parameters
    let bt_config = match build_backtest_config(&adapter, symbol) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let policy = build_policy(&adapter);
    eprintln!("Strategy: {}", policy.name());

    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    // Stages 3-6: Fetch, signal, backtest, metrics
    let output = match run_backtest_pipeline(&data_port, &policy, &bt_config) {
        Ok(o) => o,
        Err(e) => return fail(e),
    };

    print_summary(&bt_config, &output);

    // Stage 7: Optional export
    if let Some(path) = output_path {
        if let Err(e) = CsvReportAdapter.write(&output.prices, &output.result, &path.to_string_lossy()) {
            return fail(e);
        }
        eprintln!("\nReport written to: {}", path.display());
    }

    ExitCode::SUCCESS
}

pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    policy: &dyn PositionPolicy,
    bt_config: &BacktestConfig,
) -> Result<PipelineOutput, EodtraderError> {
    let symbol = &bt_config.symbol;

    // Stage 3: Fetch prices
    let bars = data_port.fetch_ohlcv(symbol, bt_config.start_date, bt_config.end_date)?;
    if bars.is_empty() {
        return Err(EodtraderError::NoData {
            symbol: symbol.clone(),
        });
    }
    if bars.len() < MIN_PRICE_BARS {
        return Err(EodtraderError::InsufficientData {
            symbol: symbol.clone(),
            bars: bars.len(),
            minimum: MIN_PRICE_BARS,
        });
    }
    let prices = close_series(&bars)?;

    eprintln!(
        "Running backtest: {} from {} to {} ({} bars)",
        symbol,
        bt_config.start_date,
        bt_config.end_date,
        prices.len()
    );

    // Stage 4: Signals
    let positions = policy.positions(&prices)?;

    // Stage 5: Backtest
    let result = backtest_engine::backtest(&prices, &positions, bt_config.risk_free_rate)?;

    // Stage 6: Metrics
    let metrics = metrics::report(&result.equity_curve, &result.returns, &result.risk_free_series);
    let markers = trade_markers(&positions);
    let final_capital = bt_config.initial_capital * result.final_equity();

    tracing::info!(
        symbol = %symbol,
        bars = prices.len(),
        entries = markers.iter().filter(|m| m.kind == MarkerKind::Entry).count(),
        total_return_pct = metrics.total_return_pct,
        sharpe = metrics.sharpe,
        "backtest finished"
    );

    Ok(PipelineOutput {
        prices,
        result,
        metrics,
        markers,
        final_capital,
    })
}

fn print_summary(bt_config: &BacktestConfig, output: &PipelineOutput) {
    let m = &output.metrics;
    let entries = output
        .markers
        .iter()
        .filter(|mk| mk.kind == MarkerKind::Entry)
        .count();
    let exits = output.markers.len() - entries;

    eprintln!("\n=== Performance: {} ===", bt_config.symbol);
    eprintln!("Total Return:     {:.2}%", m.total_return_pct);
    eprintln!("CAGR:             {:.2}%", m.cagr_pct);
    eprintln!("Max Drawdown:     {:.2}%", m.max_drawdown_pct);
    eprintln!("Sharpe (annual):  {:.2}", m.sharpe);
    eprintln!(
        "Final Capital:    ${:.2} (from ${:.2})",
        output.final_capital, bt_config.initial_capital
    );
    eprintln!("Entries / Exits:  {} / {}", entries, exits);
}

pub fn run_dry_run(config_path: &Path, symbol: Option<&str>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(e);
    }
    eprintln!("Config validated successfully");

    let bt_config = match build_backtest_config(&adapter, symbol) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };
    let policy = build_policy(&adapter);

    eprintln!("\nStrategy rule:");
    eprintln!("  {}", policy.name());

    let mut indicators = vec![
        IndicatorType::Sma(policy.fast),
        IndicatorType::Sma(policy.slow),
        IndicatorType::Rsi(policy.rsi_length),
    ];
    indicators.dedup();

    eprintln!("\nIndicators to compute:");
    for ind in &indicators {
        eprintln!("  {}", ind);
    }

    eprintln!("\nRun:");
    eprintln!("  symbol: {}", bt_config.symbol);
    eprintln!("  period: {} to {}", bt_config.start_date, bt_config.end_date);
    eprintln!("  risk-free rate: {:.2}%", bt_config.risk_free_rate * 100.0);
    eprintln!("  warmup bars: {}", policy.warmup_bars());

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating configuration: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    if let Err(e) = validate_backtest_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        return fail(e);
    }
    if let Err(e) = build_backtest_config(&adapter, None) {
        return fail(e);
    }

    eprintln!("  Strategy: {}", build_policy(&adapter).name());
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_list_symbols(config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    let symbols = match data_port.list_symbols() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    ExitCode::SUCCESS
}

fn run_info(symbol: Option<&str>, config_path: &Path) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };

    let Some(symbol) = resolve_symbol(symbol, &adapter) else {
        eprintln!("error: symbol is required (use --symbol or set in config)");
        return ExitCode::from(2);
    };

    let data_port = match build_data_port(&adapter) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    match data_port.get_data_range(&symbol) {
        Ok(Some((min_date, max_date, count))) => {
            println!("{}: {} bars, {} to {}", symbol, count, min_date, max_date);
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("{}: no data found", symbol);
            ExitCode::from(5)
        }
        Err(e) => fail(e),
    }
}
