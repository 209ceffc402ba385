//! CLI definition and dispatch.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvMarketDataAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_store_adapter::JsonStoreAdapter;
use crate::adapters::paper_broker_adapter::PaperBrokerAdapter;
use crate::domain::config_validation::{
    broker_kind, data_kind, store_path, validate_config, BrokerKind, DataKind,
    DEFAULT_INITIAL_CASH, DEFAULT_LEDGER_PATH,
};
use crate::domain::daily_run::{run_daily, RunContext, RunSummary};
use crate::domain::error::RotatraderError;
use crate::domain::execution::{HaltReason, SkipReason};
use crate::domain::params::Params;
use crate::domain::ranking::rank;
use crate::domain::symbol_record::Store;
use crate::domain::targets::select_targets;
use crate::domain::watchlist::Watchlist;
use crate::ports::broker_port::BrokerPort;
use crate::ports::config_port::ConfigPort;
use crate::ports::market_data_port::MarketDataPort;
use crate::ports::store_port::StorePort;

pub const ENV_KEY_ID: &str = "APCA_API_KEY_ID";
pub const ENV_SECRET_KEY: &str = "APCA_API_SECRET_KEY";

#[derive(Parser, Debug)]
#[command(name = "rotatrader", about = "Daily long/short momentum rotation bot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the daily rotation once
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Decide but submit no orders
        #[arg(long)]
        dry_run: bool,
        /// Treat this date as today (CSV data is cut off at it)
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Validate a configuration file and print the resolved parameters
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Check broker credentials, account access and market data
    CheckConnection {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Show stored scores and indicators without fetching anything
    Status {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            dry_run,
            as_of,
        } => run_rotation(&config, dry_run, as_of),
        Command::Validate { config } => run_validate(&config),
        Command::CheckConnection { config } => run_check_connection(&config),
        Command::Status { config } => run_status(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: RotatraderError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(&err)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key_id: String,
    pub secret_key: String,
}

/// Keys from `[alpaca]` win; otherwise both environment variables must be
/// set. `env` is injected so callers decide where variables come from.
pub fn resolve_credentials<F>(config: &dyn ConfigPort, env: F) -> Result<Credentials, RotatraderError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());

    let from_config = (
        non_empty(config.get_string("alpaca", "key_id")),
        non_empty(config.get_string("alpaca", "secret_key")),
    );
    if let (Some(key_id), Some(secret_key)) = from_config {
        return Ok(Credentials { key_id, secret_key });
    }

    match (non_empty(env(ENV_KEY_ID)), non_empty(env(ENV_SECRET_KEY))) {
        (Some(key_id), Some(secret_key)) => Ok(Credentials { key_id, secret_key }),
        _ => Err(RotatraderError::MissingCredentials),
    }
}

#[cfg(feature = "alpaca")]
fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[cfg(feature = "alpaca")]
fn alpaca_adapter(
    config: &dyn ConfigPort,
) -> Result<crate::adapters::alpaca_adapter::AlpacaAdapter, RotatraderError> {
    use crate::adapters::alpaca_adapter::{
        AlpacaAdapter, DATA_BASE_URL, LIVE_BASE_URL, PAPER_BASE_URL,
    };

    let creds = resolve_credentials(config, process_env)?;
    let default_base = if config.get_bool("alpaca", "paper", true) {
        PAPER_BASE_URL
    } else {
        LIVE_BASE_URL
    };
    let base_url = config
        .get_string("alpaca", "base_url")
        .unwrap_or_else(|| default_base.to_string());
    let data_url = config
        .get_string("alpaca", "data_url")
        .unwrap_or_else(|| DATA_BASE_URL.to_string());
    AlpacaAdapter::new(&creds.key_id, &creds.secret_key, &base_url, &data_url)
}

#[cfg(not(feature = "alpaca"))]
fn alpaca_unavailable(section: &str) -> RotatraderError {
    RotatraderError::ConfigInvalid {
        section: section.to_string(),
        key: "kind".to_string(),
        reason: "built without the alpaca feature".to_string(),
    }
}

pub fn build_market_data(
    config: &dyn ConfigPort,
    as_of: Option<NaiveDate>,
) -> Result<Box<dyn MarketDataPort>, RotatraderError> {
    match data_kind(config)? {
        DataKind::Csv => {
            let dir = config.require_string("data", "csv_dir")?;
            let adapter = CsvMarketDataAdapter::new(PathBuf::from(dir));
            Ok(Box::new(match as_of {
                Some(date) => adapter.with_as_of(date),
                None => adapter,
            }))
        }
        #[cfg(feature = "alpaca")]
        DataKind::Alpaca => Ok(Box::new(alpaca_adapter(config)?)),
        #[cfg(not(feature = "alpaca"))]
        DataKind::Alpaca => Err(alpaca_unavailable("data")),
    }
}

pub fn build_broker<'a>(
    config: &dyn ConfigPort,
    market_data: &'a dyn MarketDataPort,
) -> Result<Box<dyn BrokerPort + 'a>, RotatraderError> {
    match broker_kind(config)? {
        BrokerKind::Paper => {
            let path = config
                .get_string("broker", "ledger_path")
                .unwrap_or_else(|| DEFAULT_LEDGER_PATH.to_string());
            let cash = config.get_double("broker", "initial_cash", DEFAULT_INITIAL_CASH);
            Ok(Box::new(PaperBrokerAdapter::open(path, cash, market_data)?))
        }
        #[cfg(feature = "alpaca")]
        BrokerKind::Alpaca => Ok(Box::new(alpaca_adapter(config)?)),
        #[cfg(not(feature = "alpaca"))]
        BrokerKind::Alpaca => Err(alpaca_unavailable("broker")),
    }
}

fn run_rotation(config_path: &PathBuf, dry_run: bool, as_of: Option<NaiveDate>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let (watchlist, params) = match validate_config(&config) {
        Ok(v) => v,
        Err(e) => return fail(e),
    };

    let market_data = match build_market_data(&config, as_of) {
        Ok(m) => m,
        Err(e) => return fail(e),
    };
    let broker = match build_broker(&config, market_data.as_ref()) {
        Ok(b) => b,
        Err(e) => return fail(e),
    };
    let store = JsonStoreAdapter::new(store_path(&config));

    let ctx = RunContext {
        watchlist: &watchlist,
        params: &params,
        market_data: market_data.as_ref(),
        broker: broker.as_ref(),
        store: &store,
    };
    let today = as_of.unwrap_or_else(|| Local::now().date_naive());

    match run_daily(&ctx, today, dry_run) {
        Ok(summary) => {
            print!("{}", format_summary(&summary));
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let (watchlist, params) = match validate_config(&config) {
        Ok(v) => v,
        Err(e) => return fail(e),
    };
    // both already checked by validate_config
    let broker = broker_kind(&config).unwrap_or(BrokerKind::Alpaca);
    let data = data_kind(&config).unwrap_or(DataKind::Alpaca);

    print!("{}", format_params(&watchlist, &params));
    println!("broker:             {broker:?}");
    println!("data:               {data:?}");
    println!("store:              {}", store_path(&config));
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

fn run_check_connection(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let probe = config
        .get_string("watchlist", "symbols")
        .and_then(|s| {
            s.split(',')
                .map(|t| t.trim().to_uppercase())
                .find(|t| !t.is_empty())
        })
        .unwrap_or_else(|| "TQQQ".to_string());

    let market_data = match build_market_data(&config, None) {
        Ok(m) => m,
        Err(e) => return fail(e),
    };
    let broker = match build_broker(&config, market_data.as_ref()) {
        Ok(b) => b,
        Err(e) => return fail(e),
    };

    let account = match broker.account() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Connection failed.");
            return fail(e);
        }
    };
    println!("Connection successful.");
    println!("Account status:  {}", account.status);
    println!("Buying power:    {:.2}", account.buying_power);
    println!("Portfolio value: {:.2}", account.portfolio_value);
    println!("Cash:            {:.2}", account.cash);

    match market_data.latest_close(&probe) {
        Ok(Some(quote)) => {
            println!("Latest {probe} close: {:.2} ({})", quote.close, quote.date);
            ExitCode::SUCCESS
        }
        Ok(None) => fail(RotatraderError::MarketData {
            symbol: probe,
            reason: "no data returned".to_string(),
        }),
        Err(e) => fail(e),
    }
}

fn run_status(config_path: &PathBuf) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    let (watchlist, params) = match validate_config(&config) {
        Ok(v) => v,
        Err(e) => return fail(e),
    };
    let store = match JsonStoreAdapter::new(store_path(&config)).load() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    print!("{}", format_status(&watchlist, &store, &params));
    ExitCode::SUCCESS
}

pub fn format_params(watchlist: &Watchlist, params: &Params) -> String {
    let mut out = String::new();
    out.push_str(&format!("watchlist:          {}\n", watchlist.symbols().join(", ")));
    out.push_str(&format!("sma_fast:           {}\n", params.sma_fast));
    out.push_str(&format!("sma_slow:           {}\n", params.sma_slow));
    out.push_str(&format!("roc_period:         {}\n", params.roc_period));
    out.push_str(&format!("top_longs:          {}\n", params.top_longs));
    out.push_str(&format!("bottom_shorts:      {}\n", params.bottom_shorts));
    out.push_str(&format!("take_profit_pct:    {}\n", params.take_profit_pct));
    out.push_str(&format!("cooldown_days:      {}\n", params.cooldown_days));
    out.push_str(&format!("max_trades_per_day: {}\n", params.max_trades_per_day));
    out.push_str(&format!("max_position_pct:   {}\n", params.max_position_pct));
    out.push_str(&format!("max_gross_exposure: {}\n", params.max_gross_exposure));
    out
}

pub fn format_summary(summary: &RunSummary) -> String {
    let decision = &summary.decision;
    let mut out = String::new();

    out.push_str(&format!("Date:            {}\n", summary.date));
    out.push_str(&format!("Portfolio value: {:.2}\n", summary.portfolio_value));
    let ranking: Vec<String> = decision.ranked.iter().map(ToString::to_string).collect();
    out.push_str(&format!("Ranking:         {}\n", ranking.join(", ")));
    let targets: Vec<String> = decision
        .targets
        .iter()
        .map(|(symbol, side)| format!("{side} {symbol}"))
        .collect();
    out.push_str(&format!("Targets:         {}\n", targets.join(", ")));

    let Some(exec) = &summary.execution else {
        let close: Vec<&str> = decision.close.iter().map(String::as_str).collect();
        let open: Vec<String> = decision
            .open
            .iter()
            .map(|o| format!("{} {}", o.side, o.symbol))
            .collect();
        out.push_str(&format!("Would close:     {}\n", close.join(", ")));
        out.push_str(&format!("Would open:      {}\n", open.join(", ")));
        out.push_str("Dry run: no orders submitted\n");
        return out;
    };

    for symbol in &exec.closed {
        out.push_str(&format!("Closed:          {symbol}\n"));
    }
    for opened in &exec.opened {
        out.push_str(&format!(
            "Opened:          {} {} x {} @ {:.2}\n",
            opened.side, opened.symbol, opened.shares, opened.price
        ));
    }
    for skipped in &exec.skipped {
        let reason = match skipped.reason {
            SkipReason::NoPrice => "no stored price",
            SkipReason::TooSmall => "size too small",
        };
        out.push_str(&format!("Skipped:         {} ({reason})\n", skipped.symbol));
    }
    for failed in &exec.failed {
        out.push_str(&format!("Failed:          {} ({})\n", failed.symbol, failed.reason));
    }
    if let Some(halt) = exec.halt {
        let reason = match halt {
            HaltReason::TradeCap => "max trades per day reached",
            HaltReason::Exposure => "gross exposure limit",
        };
        out.push_str(&format!("Halted:          {reason}\n"));
    }
    out.push_str(&format!("Trades:          {}\n", exec.trades));
    out
}

pub fn format_status(watchlist: &Watchlist, store: &Store, params: &Params) -> String {
    let mut out = format!(
        "{:<10} {:>5} {:>12} {:>12} {:>10} {:>8}  {:<10}  {:<10}\n",
        "symbol", "score", "sma_fast", "sma_slow", "close", "roc", "last_close", "last_trade"
    );
    let date = |d: Option<NaiveDate>| d.map_or_else(|| "-".to_string(), |d| d.to_string());

    for symbol in watchlist {
        let Some(record) = store.get(symbol) else {
            out.push_str(&format!("{symbol:<10} {:>5}\n", "-"));
            continue;
        };
        let score = record
            .valid_score()
            .map_or_else(|| "-".to_string(), |s| s.to_string());
        let close = record
            .latest_price()
            .map_or_else(|| "-".to_string(), |p| format!("{p:.2}"));
        let (fast, slow, roc) = match record.indicators {
            Some(ind) => (
                format!("{:.2}", ind.sma_fast),
                format!("{:.2}", ind.sma_slow),
                format!("{:.2}%", ind.roc * 100.0),
            ),
            None => ("-".to_string(), "-".to_string(), "-".to_string()),
        };
        out.push_str(&format!(
            "{symbol:<10} {score:>5} {fast:>12} {slow:>12} {close:>10} {roc:>8}  {:<10}  {:<10}\n",
            date(record.last_close_date),
            date(record.last_trade_date),
        ));
    }

    let ranked = rank(watchlist.iter().filter_map(|symbol| {
        store
            .get(symbol)
            .and_then(|r| r.valid_score())
            .map(|score| (symbol.as_str(), score))
    }));
    let targets = select_targets(&ranked, params.top_longs, params.bottom_shorts);
    out.push_str(&format!("\nLongs:  {}\n", targets.longs().join(", ")));
    out.push_str(&format!("Shorts: {}\n", targets.shorts().join(", ")));
    out
}
