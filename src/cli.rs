//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report::JsonReportAdapter;
use crate::domain::config::SimConfig;
use crate::domain::config_validation::{validate_simulation_config, validate_strategy_config};
use crate::domain::error::StratsimError;
use crate::domain::policy::{PolicyKind, PolicyParams, ReferencePolicy, StrategyPolicy};
use crate::domain::report::Report;
use crate::domain::simulation;
use crate::domain::sizing::SizingMode;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "stratsim", about = "Deterministic multi-asset strategy simulator")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a simulation
    Simulate {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        asset: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration without running
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show data range for configured assets
    Info {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        asset: Option<String>,
    },
    /// List assets available in the data directory
    Assets {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Simulate {
            config,
            output,
            asset,
            dry_run,
        } => {
            if dry_run {
                run_validate(&config)
            } else {
                run_simulate(&config, output.as_ref(), asset.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Info { config, asset } => run_info(&config, asset.as_deref()),
        Command::Assets { config } => run_assets(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = StratsimError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Build the engine configuration from the `[simulation]` section.
pub fn build_sim_config(adapter: &dyn ConfigPort) -> Result<SimConfig, StratsimError> {
    let defaults = SimConfig::default();

    let sizing_mode = match adapter.get_string("simulation", "sizing_mode") {
        Some(raw) => raw
            .parse::<SizingMode>()
            .map_err(|reason| StratsimError::ConfigInvalid {
                section: "simulation".into(),
                key: "sizing_mode".into(),
                reason,
            })?,
        None => defaults.sizing_mode,
    };

    let config = SimConfig {
        initial_capital: adapter.get_double(
            "simulation",
            "initial_capital",
            defaults.initial_capital,
        ),
        risk_fraction: adapter.get_double("simulation", "risk_fraction", defaults.risk_fraction),
        sizing_mode,
        entry_commission_rate: adapter.get_double(
            "simulation",
            "entry_commission_rate",
            defaults.entry_commission_rate,
        ),
        exit_commission_rate: adapter.get_double(
            "simulation",
            "exit_commission_rate",
            defaults.exit_commission_rate,
        ),
        warmup_bars: adapter.get_int("simulation", "warmup_bars", defaults.warmup_bars as i64)
            as usize,
        time_stop_bars: adapter.get_int(
            "simulation",
            "time_stop_bars",
            defaults.time_stop_bars as i64,
        ) as usize,
        min_trade_capital: adapter.get_double(
            "simulation",
            "min_trade_capital",
            defaults.min_trade_capital,
        ),
    };
    config.validate()?;
    Ok(config)
}

/// Build the reference policy from the `[strategy]` section.
pub fn build_policy(adapter: &dyn ConfigPort) -> Result<ReferencePolicy, StratsimError> {
    let kind_raw = adapter
        .get_string("strategy", "kind")
        .ok_or_else(|| StratsimError::ConfigMissing {
            section: "strategy".into(),
            key: "kind".into(),
        })?;
    let kind = kind_raw
        .parse::<PolicyKind>()
        .map_err(|reason| StratsimError::ConfigInvalid {
            section: "strategy".into(),
            key: "kind".into(),
            reason,
        })?;

    let defaults = PolicyParams::default();
    let params = PolicyParams {
        rsi_period: adapter.get_int("strategy", "rsi_period", defaults.rsi_period as i64) as usize,
        ema_period: adapter.get_int("strategy", "ema_period", defaults.ema_period as i64) as usize,
        bollinger_period: adapter.get_int(
            "strategy",
            "bollinger_period",
            defaults.bollinger_period as i64,
        ) as usize,
        bollinger_mult: adapter.get_double("strategy", "bollinger_mult", defaults.bollinger_mult),
        rsi_oversold: adapter.get_double("strategy", "rsi_oversold", defaults.rsi_oversold),
        rsi_overbought: adapter.get_double("strategy", "rsi_overbought", defaults.rsi_overbought),
        target_pct: adapter.get_double("strategy", "target_pct", defaults.target_pct),
        stop_pct: adapter.get_double("strategy", "stop_pct", defaults.stop_pct),
        panic_drop_pct: adapter.get_double("strategy", "panic_drop_pct", defaults.panic_drop_pct),
    };

    Ok(ReferencePolicy::new(kind, params))
}

/// Asset universe: a single override, or the configured comma list.
/// Duplicates are rejected.
pub fn resolve_assets(
    asset_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, StratsimError> {
    let assets: Vec<String> = match asset_override {
        Some(a) => vec![a.trim().to_uppercase()],
        None => config
            .get_list("simulation", "assets")
            .into_iter()
            .map(|a| a.to_uppercase())
            .collect(),
    };

    if assets.is_empty() {
        return Err(StratsimError::ConfigMissing {
            section: "simulation".into(),
            key: "assets".into(),
        });
    }

    let mut seen = std::collections::BTreeSet::new();
    for asset in &assets {
        if !seen.insert(asset.clone()) {
            return Err(StratsimError::DuplicateAsset {
                asset: asset.clone(),
            });
        }
    }
    Ok(assets)
}

/// Asset → category label map from the `[categories]` section. Keys are
/// uppercased to match asset naming.
pub fn build_category_map(config: &dyn ConfigPort) -> BTreeMap<String, String> {
    config
        .get_section("categories")
        .into_iter()
        .map(|(asset, label)| (asset.to_uppercase(), label))
        .collect()
}

/// Fetch candle data and run the simulation. Assets whose data cannot be
/// loaded or is shorter than the warmup window are skipped with a warning;
/// the run fails only when nothing usable remains.
pub fn run_pipeline(
    data_port: &dyn DataPort,
    assets: &[String],
    policy: &dyn StrategyPolicy,
    config: &SimConfig,
    categories: &BTreeMap<String, String>,
) -> Result<Report, StratsimError> {
    let mut series = Vec::with_capacity(assets.len());
    for asset in assets {
        match data_port.fetch_series(asset) {
            Ok(s) if s.len() >= config.warmup_bars => series.push(s),
            Ok(s) => {
                let err = StratsimError::InsufficientData {
                    asset: asset.clone(),
                    bars: s.len(),
                    minimum: config.warmup_bars,
                };
                eprintln!("warning: skipping {asset} ({err})");
            }
            Err(e) => {
                eprintln!("warning: skipping {asset} ({e})");
            }
        }
    }

    if series.is_empty() {
        return Err(StratsimError::Data {
            reason: "no assets with usable data".into(),
        });
    }

    let categorize = |asset: &str| {
        categories
            .get(asset)
            .cloned()
            .unwrap_or_else(|| "uncategorized".to_string())
    };

    simulation::run(&series, policy, config, &categorize)
}

fn run_simulate(
    config_path: &PathBuf,
    output_path: Option<&PathBuf>,
    asset_override: Option<&str>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_simulation_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let sim_config = match build_sim_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let policy = match build_policy(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let assets = match resolve_assets(asset_override, &adapter) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let categories = build_category_map(&adapter);

    let data_dir = adapter
        .get_string("data", "dir")
        .unwrap_or_else(|| "data".to_string());
    let data_port = CsvAdapter::new(PathBuf::from(data_dir));

    eprintln!(
        "Running simulation: {} assets, {} strategy",
        assets.len(),
        policy.name(),
    );

    let report = match run_pipeline(&data_port, &assets, &policy, &sim_config, &categories) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_summary(&report);

    let output = output_path
        .cloned()
        .unwrap_or_else(|| PathBuf::from("report.json"));
    match JsonReportAdapter.write(&report, &output) {
        Ok(()) => {
            eprintln!("\nReport written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write report: {e}");
            (&e).into()
        }
    }
}

fn print_summary(report: &Report) {
    eprintln!("\n=== Aggregate Results ===");
    eprintln!("ROI:              {:.2}%", report.roi);
    eprintln!("Final Capital:    {:.2}", report.final_capital);
    eprintln!("Total Trades:     {}", report.trades);
    eprintln!("Win Rate:         {:.1}%", report.win_rate * 100.0);
    eprintln!("Max Drawdown:     -{:.1}%", report.max_drawdown_percent);
    eprintln!("Profit Factor:    {}", report.profit_factor);
    eprintln!("Calmar Ratio:     {}", report.calmar_ratio);

    if !report.per_asset.is_empty() {
        eprintln!("\n=== Per-Asset ===");
        for (asset, stats) in &report.per_asset {
            let sign = if stats.pnl_absolute >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {}: {} trades, {:.1}% win rate, {}{:.2}",
                asset,
                stats.trades,
                stats.win_rate * 100.0,
                sign,
                stats.pnl_absolute,
            );
        }
    }

    if !report.per_category.is_empty() {
        eprintln!("\n=== Per-Category ===");
        for (category, stats) in &report.per_category {
            let sign = if stats.pnl_absolute >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {}: {} trades, {}{:.2}",
                category, stats.trades, sign, stats.pnl_absolute,
            );
        }
    }

    if !report.skipped.is_empty() {
        eprintln!("\n{} actions skipped:", report.skipped.len());
        for action in &report.skipped {
            eprintln!("  [{}] {}: {}", action.index, action.asset, action.reason);
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_simulation_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    if let Err(e) = validate_strategy_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let policy = match build_policy(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let assets = match resolve_assets(None, &adapter) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nStrategy: {}", policy.name());
    let params = policy.params();
    eprintln!("  target: +{:.2}%  stop: -{:.2}%", params.target_pct, params.stop_pct);
    eprintln!(
        "  rsi({}) ema({}) bollinger({}, {:.1})",
        params.rsi_period, params.ema_period, params.bollinger_period, params.bollinger_mult,
    );
    eprintln!("\nUniverse: {}", assets.join(", "));

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_assets(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let data_dir = adapter
        .get_string("data", "dir")
        .unwrap_or_else(|| "data".to_string());
    let data_port = CsvAdapter::new(PathBuf::from(data_dir));

    match data_port.list_assets() {
        Ok(assets) if assets.is_empty() => {
            eprintln!("No assets found");
            ExitCode::SUCCESS
        }
        Ok(assets) => {
            for asset in &assets {
                println!("{asset}");
            }
            eprintln!("{} assets found", assets.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_info(config_path: &PathBuf, asset_override: Option<&str>) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let assets = match resolve_assets(asset_override, &adapter) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_dir = adapter
        .get_string("data", "dir")
        .unwrap_or_else(|| "data".to_string());
    let data_port = CsvAdapter::new(PathBuf::from(data_dir));

    for asset in &assets {
        match data_port.data_range(asset) {
            Ok(Some((first, last, count))) => {
                println!("{asset}: {count} bars, {first} to {last}");
            }
            Ok(None) => {
                eprintln!("{asset}: no data found");
            }
            Err(e) => {
                eprintln!("error querying {asset}: {e}");
            }
        }
    }
    ExitCode::SUCCESS
}
