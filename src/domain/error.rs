//! Domain error types.

use crate::domain::watchlist::WatchlistError;

/// Top-level error type for rotatrader.
#[derive(Debug, thiserror::Error)]
pub enum RotatraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(
        "missing broker credentials: set [alpaca] key_id/secret_key or APCA_API_KEY_ID/APCA_API_SECRET_KEY"
    )]
    MissingCredentials,

    #[error(transparent)]
    Watchlist(#[from] WatchlistError),

    #[error("market data error for {symbol}: {reason}")]
    MarketData { symbol: String, reason: String },

    #[error("broker error: {reason}")]
    Broker { reason: String },

    #[error("store error: {reason}")]
    Store { reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RotatraderError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        RotatraderError::InvalidInput {
            reason: reason.into(),
        }
    }
}

impl From<&RotatraderError> for std::process::ExitCode {
    fn from(err: &RotatraderError) -> Self {
        let code: u8 = match err {
            RotatraderError::Io(_) => 1,
            RotatraderError::ConfigParse { .. }
            | RotatraderError::ConfigMissing { .. }
            | RotatraderError::ConfigInvalid { .. }
            | RotatraderError::MissingCredentials
            | RotatraderError::Watchlist(_) => 2,
            RotatraderError::MarketData { .. } | RotatraderError::Broker { .. } => 3,
            RotatraderError::Store { .. } => 4,
            RotatraderError::InvalidInput { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
