//! Quote provider contract and its error type.
//!
//! The board pipeline never talks to the network directly. It consumes a
//! [`QuoteProvider`], which exposes the two capabilities the pipeline needs:
//!
//! | Method | Returns | Used by |
//! |--------|---------|---------|
//! | [`history`](QuoteProvider::history) | Ordered daily sessions, possibly empty | Resolver, Detail Lookup |
//! | [`info`](QuoteProvider::info) | Descriptive fields, any key may be missing | Detail Lookup |
//!
//! # Example
//!
//! ```rust,ignore
//! use tickerboard_core::{CanonicalSymbol, Period, QuoteProvider, YahooProvider};
//!
//! async fn last_close(provider: &YahooProvider) -> Option<f64> {
//!     let symbol = CanonicalSymbol::normalize("BRK.B");
//!     let sessions = provider.history(&symbol, Period::OneDay).await.ok()?;
//!     sessions.last().map(|session| session.close)
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use crate::{CanonicalSymbol, InfoMap, Period, Session};

/// Provider-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceErrorKind {
    Unavailable,
    RateLimited,
    InvalidRequest,
    NotFound,
    Malformed,
    Internal,
}

/// Structured provider error. Swallowed per symbol by the pipeline and logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
    retryable: bool,
}

impl SourceError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::InvalidRequest,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::NotFound,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Malformed,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: SourceErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            SourceErrorKind::Unavailable => "source.unavailable",
            SourceErrorKind::RateLimited => "source.rate_limited",
            SourceErrorKind::InvalidRequest => "source.invalid_request",
            SourceErrorKind::NotFound => "source.not_found",
            SourceErrorKind::Malformed => "source.malformed",
            SourceErrorKind::Internal => "source.internal",
        }
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Boxed future returned by provider calls.
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Quote provider contract.
///
/// Implementations must be `Send + Sync`; the board builder shares one
/// provider across concurrent per-symbol resolutions.
pub trait QuoteProvider: Send + Sync {
    /// Short provider identifier used in logs.
    fn id(&self) -> &'static str;

    /// Daily sessions for `symbol` within `period`, oldest first.
    ///
    /// An unknown, delisted, or closed-market symbol may legitimately return
    /// an empty vector rather than an error.
    fn history<'a>(
        &'a self,
        symbol: &'a CanonicalSymbol,
        period: Period,
    ) -> ProviderFuture<'a, Vec<Session>>;

    /// Descriptive fields for `symbol` (`longName`, `previousClose`, ...).
    fn info<'a>(&'a self, symbol: &'a CanonicalSymbol) -> ProviderFuture<'a, InfoMap>;
}
