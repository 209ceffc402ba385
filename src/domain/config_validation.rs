//! Configuration validation.
//!
//! Every value is checked before a run with section/key precise errors.
//! Absent keys take the shipped defaults from [`Params::default`]; present
//! but unparseable values are errors rather than silent defaults.

use crate::domain::error::RotatraderError;
use crate::domain::params::Params;
use crate::domain::watchlist::{parse_watchlist, Watchlist};
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_STORE_PATH: &str = "bot_store.json";
pub const DEFAULT_LEDGER_PATH: &str = "paper_ledger.json";
pub const DEFAULT_INITIAL_CASH: f64 = 100_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerKind {
    Alpaca,
    Paper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Alpaca,
    Csv,
}

/// Validate the whole file and return the resolved run inputs.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(Watchlist, Params), RotatraderError> {
    let watchlist = watchlist_from_config(config)?;
    let params = params_from_config(config)?;
    broker_kind(config)?;
    let data = data_kind(config)?;
    if data == DataKind::Csv {
        config.require_string("data", "csv_dir")?;
    }
    let cash = double_value(config, "broker", "initial_cash", DEFAULT_INITIAL_CASH)?;
    if cash <= 0.0 {
        return Err(invalid("broker", "initial_cash", "initial_cash must be positive"));
    }
    Ok((watchlist, params))
}

pub fn watchlist_from_config(config: &dyn ConfigPort) -> Result<Watchlist, RotatraderError> {
    let symbols = config.require_string("watchlist", "symbols")?;
    Ok(parse_watchlist(&symbols)?)
}

pub fn params_from_config(config: &dyn ConfigPort) -> Result<Params, RotatraderError> {
    let d = Params::default();

    let sma_fast = count_value(config, "strategy", "sma_fast", d.sma_fast, 1)?;
    let sma_slow = count_value(config, "strategy", "sma_slow", d.sma_slow, 1)?;
    if sma_fast > sma_slow {
        return Err(invalid(
            "strategy",
            "sma_fast",
            "sma_fast must not exceed sma_slow",
        ));
    }
    let roc_period = count_value(config, "strategy", "roc_period", d.roc_period, 1)?;
    let top_longs = count_value(config, "strategy", "top_longs", d.top_longs, 0)?;
    let bottom_shorts = count_value(config, "strategy", "bottom_shorts", d.bottom_shorts, 0)?;

    let take_profit_pct = double_value(config, "strategy", "take_profit_pct", d.take_profit_pct)?;
    if take_profit_pct <= 0.0 {
        return Err(invalid(
            "strategy",
            "take_profit_pct",
            "take_profit_pct must be positive",
        ));
    }

    let cooldown_days = int_value(config, "risk", "cooldown_days", d.cooldown_days)?;
    if cooldown_days < 0 {
        return Err(invalid(
            "risk",
            "cooldown_days",
            "cooldown_days must be non-negative",
        ));
    }
    let max_trades_per_day =
        count_value(config, "risk", "max_trades_per_day", d.max_trades_per_day, 0)?;

    let max_position_pct = double_value(config, "risk", "max_position_pct", d.max_position_pct)?;
    if max_position_pct <= 0.0 || max_position_pct > 1.0 {
        return Err(invalid(
            "risk",
            "max_position_pct",
            "max_position_pct must be between 0 and 1",
        ));
    }
    let max_gross_exposure =
        double_value(config, "risk", "max_gross_exposure", d.max_gross_exposure)?;
    if max_gross_exposure <= 0.0 {
        return Err(invalid(
            "risk",
            "max_gross_exposure",
            "max_gross_exposure must be positive",
        ));
    }

    Ok(Params {
        sma_fast,
        sma_slow,
        roc_period,
        top_longs,
        bottom_shorts,
        take_profit_pct,
        cooldown_days,
        max_trades_per_day,
        max_position_pct,
        max_gross_exposure,
    })
}

pub fn broker_kind(config: &dyn ConfigPort) -> Result<BrokerKind, RotatraderError> {
    match lowercase(config, "broker", "kind").as_deref() {
        None | Some("alpaca") => Ok(BrokerKind::Alpaca),
        Some("paper") => Ok(BrokerKind::Paper),
        Some(other) => Err(invalid(
            "broker",
            "kind",
            &format!("unknown broker '{other}', expected alpaca or paper"),
        )),
    }
}

pub fn data_kind(config: &dyn ConfigPort) -> Result<DataKind, RotatraderError> {
    match lowercase(config, "data", "kind").as_deref() {
        None | Some("alpaca") => Ok(DataKind::Alpaca),
        Some("csv") => Ok(DataKind::Csv),
        Some(other) => Err(invalid(
            "data",
            "kind",
            &format!("unknown data source '{other}', expected alpaca or csv"),
        )),
    }
}

pub fn store_path(config: &dyn ConfigPort) -> String {
    config
        .get_string("store", "path")
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| DEFAULT_STORE_PATH.to_string())
}

fn lowercase(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

fn raw(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn int_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, RotatraderError> {
    match raw(config, section, key) {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| invalid(section, key, &format!("'{v}' is not an integer"))),
    }
}

fn count_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
    min: usize,
) -> Result<usize, RotatraderError> {
    let value = int_value(config, section, key, default as i64)?;
    usize::try_from(value)
        .ok()
        .filter(|v| *v >= min)
        .ok_or_else(|| invalid(section, key, &format!("{key} must be at least {min}")))
}

fn double_value(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, RotatraderError> {
    match raw(config, section, key) {
        None => Ok(default),
        Some(v) => v
            .parse::<f64>()
            .ok()
            .filter(|x| x.is_finite())
            .ok_or_else(|| invalid(section, key, &format!("'{v}' is not a number"))),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> RotatraderError {
    RotatraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn valid_config_passes() {
        let config = make_config(
            r#"
[watchlist]
symbols = TQQQ,SOXL,UPRO,BTC-USD

[strategy]
sma_fast = 20
sma_slow = 50
roc_period = 10
top_longs = 2
bottom_shorts = 1
take_profit_pct = 0.10

[risk]
cooldown_days = 2
max_trades_per_day = 10
max_position_pct = 0.30
max_gross_exposure = 1.5
"#,
        );
        let (watchlist, params) = validate_config(&config).unwrap();
        assert_eq!(watchlist.len(), 4);
        assert_eq!(params, Params::default());
    }

    #[test]
    fn absent_keys_use_defaults() {
        let config = make_config("[watchlist]\nsymbols = SPY\n");
        let params = params_from_config(&config).unwrap();
        assert_eq!(params, Params::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = make_config("[strategy]\nsma_fast = 5\nsma_slow = 10\n[risk]\ncooldown_days = 0\n");
        let params = params_from_config(&config).unwrap();
        assert_eq!(params.sma_fast, 5);
        assert_eq!(params.sma_slow, 10);
        assert_eq!(params.cooldown_days, 0);
    }

    #[test]
    fn missing_watchlist_fails() {
        let config = make_config("[strategy]\nsma_fast = 20\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, RotatraderError::ConfigMissing { key, .. } if key == "symbols"));
    }

    #[test]
    fn duplicate_watchlist_symbol_fails() {
        let config = make_config("[watchlist]\nsymbols = SPY,QQQ,spy\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, RotatraderError::Watchlist(_)));
    }

    #[test]
    fn non_numeric_value_fails() {
        let config = make_config("[strategy]\nsma_slow = fifty\n");
        let err = params_from_config(&config).unwrap_err();
        assert!(matches!(err, RotatraderError::ConfigInvalid { key, .. } if key == "sma_slow"));
    }

    #[test]
    fn zero_period_fails() {
        let config = make_config("[strategy]\nroc_period = 0\n");
        let err = params_from_config(&config).unwrap_err();
        assert!(matches!(err, RotatraderError::ConfigInvalid { key, .. } if key == "roc_period"));
    }

    #[test]
    fn fast_above_slow_fails() {
        let config = make_config("[strategy]\nsma_fast = 60\nsma_slow = 50\n");
        let err = params_from_config(&config).unwrap_err();
        assert!(matches!(err, RotatraderError::ConfigInvalid { key, .. } if key == "sma_fast"));
    }

    #[test]
    fn negative_cooldown_fails() {
        let config = make_config("[risk]\ncooldown_days = -1\n");
        let err = params_from_config(&config).unwrap_err();
        assert!(matches!(err, RotatraderError::ConfigInvalid { key, .. } if key == "cooldown_days"));
    }

    #[test]
    fn negative_count_fails() {
        let config = make_config("[strategy]\ntop_longs = -2\n");
        let err = params_from_config(&config).unwrap_err();
        assert!(matches!(err, RotatraderError::ConfigInvalid { key, .. } if key == "top_longs"));
    }

    #[test]
    fn position_pct_out_of_range_fails() {
        let config = make_config("[risk]\nmax_position_pct = 1.5\n");
        let err = params_from_config(&config).unwrap_err();
        assert!(
            matches!(err, RotatraderError::ConfigInvalid { key, .. } if key == "max_position_pct")
        );
    }

    #[test]
    fn zero_exposure_fails() {
        let config = make_config("[risk]\nmax_gross_exposure = 0\n");
        let err = params_from_config(&config).unwrap_err();
        assert!(
            matches!(err, RotatraderError::ConfigInvalid { key, .. } if key == "max_gross_exposure")
        );
    }

    #[test]
    fn take_profit_must_be_positive() {
        let config = make_config("[strategy]\ntake_profit_pct = 0\n");
        let err = params_from_config(&config).unwrap_err();
        assert!(
            matches!(err, RotatraderError::ConfigInvalid { key, .. } if key == "take_profit_pct")
        );
    }

    #[test]
    fn broker_and_data_kinds() {
        let config = make_config("[broker]\nkind = Paper\n[data]\nkind = csv\ncsv_dir = prices\n");
        assert_eq!(broker_kind(&config).unwrap(), BrokerKind::Paper);
        assert_eq!(data_kind(&config).unwrap(), DataKind::Csv);

        let defaults = make_config("[watchlist]\nsymbols = SPY\n");
        assert_eq!(broker_kind(&defaults).unwrap(), BrokerKind::Alpaca);
        assert_eq!(data_kind(&defaults).unwrap(), DataKind::Alpaca);
    }

    #[test]
    fn unknown_broker_fails() {
        let config = make_config("[broker]\nkind = ibkr\n");
        let err = broker_kind(&config).unwrap_err();
        assert!(matches!(err, RotatraderError::ConfigInvalid { key, .. } if key == "kind"));
    }

    #[test]
    fn csv_data_requires_directory() {
        let config = make_config("[watchlist]\nsymbols = SPY\n[data]\nkind = csv\n");
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, RotatraderError::ConfigMissing { key, .. } if key == "csv_dir"));
    }

    #[test]
    fn store_path_defaults() {
        assert_eq!(store_path(&make_config("[store]\n")), DEFAULT_STORE_PATH);
        assert_eq!(
            store_path(&make_config("[store]\npath = /tmp/s.json\n")),
            "/tmp/s.json"
        );
    }
}
