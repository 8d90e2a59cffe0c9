use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::provider::SourceError;

/// Validation and contract errors exposed by `tickerboard-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("columns must be greater than zero")]
    ZeroColumns,
    #[error("max concurrency must be greater than zero")]
    ZeroConcurrency,
    #[error("rate limit must be greater than zero requests per minute")]
    ZeroRateLimit,
    #[error("request timeout must be greater than zero milliseconds")]
    ZeroTimeout,

    #[error("invalid value '{value}' for {field}")]
    InvalidSetting { field: &'static str, value: String },
    #[error("invalid scheme '{value}', expected one of fine, coarse")]
    InvalidScheme { value: String },

    #[error("holdings source has no 'Ticker' column (found: {headers})")]
    MissingTickerColumn { headers: String },
}

/// Top-level error type for holdings loading and configuration.
///
/// The board pipeline itself never returns this; per-symbol failures are data.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a symbol could not be turned into a percent change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvableReason {
    EmptySymbol,
    NoSessions,
    ZeroOpen,
    NonFinite,
    Provider(SourceError),
}

impl UnresolvableReason {
    pub const fn code(&self) -> &'static str {
        match self {
            Self::EmptySymbol => "symbol.empty",
            Self::NoSessions => "symbol.no_sessions",
            Self::ZeroOpen => "symbol.zero_open",
            Self::NonFinite => "symbol.non_finite",
            Self::Provider(error) => error.code(),
        }
    }
}

impl Display for UnresolvableReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySymbol => f.write_str("symbol is empty"),
            Self::NoSessions => f.write_str("provider returned no trading sessions"),
            Self::ZeroOpen => f.write_str("session open price is zero"),
            Self::NonFinite => f.write_str("session prices are not finite"),
            Self::Provider(error) => write!(f, "provider error: {error}"),
        }
    }
}

/// Why a detail view could not be produced for a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailUnavailable {
    NoQuoteHandle,
    Provider(SourceError),
}

impl Display for DetailUnavailable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoQuoteHandle => f.write_str("no detail available for an unresolved cell"),
            Self::Provider(error) => write!(f, "provider error: {error}"),
        }
    }
}
