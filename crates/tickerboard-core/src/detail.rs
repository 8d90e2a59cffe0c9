//! Detail Lookup for a selected cell.
//!
//! Independent of board construction: every lookup hits the provider again
//! and nothing is cached. Missing descriptive fields fall back to
//! placeholders; provider errors produce [`DetailOutcome::Unavailable`].

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::board::Cell;
use crate::provider::{ProviderFuture, QuoteProvider, SourceError};
use crate::resolver::QuoteHandle;
use crate::throttling::RequestThrottle;
use crate::{CanonicalSymbol, ClosePoint, DetailUnavailable, Period};

pub const UNKNOWN_NAME: &str = "Unknown Name";
pub const NO_DATA: &str = "No Data";

/// Recent closes, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "sessions", rename_all = "snake_case")]
pub enum PriceHistory {
    Sessions(Vec<ClosePoint>),
    Empty,
}

impl PriceHistory {
    fn from_points(mut points: Vec<ClosePoint>) -> Self {
        if points.is_empty() {
            return Self::Empty;
        }
        points.sort_by_key(|point| point.date);
        let keep = Period::FiveDays.sessions();
        if points.len() > keep {
            points.drain(..points.len() - keep);
        }
        Self::Sessions(points)
    }

    pub fn points(&self) -> &[ClosePoint] {
        match self {
            Self::Sessions(points) => points,
            Self::Empty => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub symbol: CanonicalSymbol,
    pub full_name: String,
    pub previous_close: Option<f64>,
    pub history: PriceHistory,
}

impl Display for DetailView {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Ticker: {}", self.symbol)?;
        writeln!(f, "Full Name: {}", self.full_name)?;
        match self.previous_close {
            Some(close) => writeln!(f, "Last Close Price: ${close:.2}")?,
            None => writeln!(f, "Last Close Price: {NO_DATA}")?,
        }
        writeln!(f, "Price History (Last 5 Days):")?;
        match &self.history {
            PriceHistory::Sessions(points) => {
                for point in points {
                    writeln!(f, "{}: ${:.2}", point.date, point.close)?;
                }
                Ok(())
            }
            PriceHistory::Empty => writeln!(f, "No price history available."),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetailOutcome {
    Available(DetailView),
    Unavailable {
        symbol: CanonicalSymbol,
        reason: DetailUnavailable,
    },
}

impl DetailOutcome {
    pub fn view(&self) -> Option<&DetailView> {
        match self {
            Self::Available(view) => Some(view),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn symbol(&self) -> &CanonicalSymbol {
        match self {
            Self::Available(view) => &view.symbol,
            Self::Unavailable { symbol, .. } => symbol,
        }
    }
}

impl Display for DetailOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available(view) => view.fmt(f),
            Self::Unavailable { symbol, reason } => {
                writeln!(f, "Ticker: {symbol}")?;
                writeln!(f, "{reason}")
            }
        }
    }
}

#[derive(Clone)]
pub struct DetailLookup {
    provider: Arc<dyn QuoteProvider>,
    throttle: Option<RequestThrottle>,
}

impl DetailLookup {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self {
            provider,
            throttle: None,
        }
    }

    pub fn with_throttle(mut self, throttle: RequestThrottle) -> Self {
        self.throttle = Some(throttle);
        self
    }

    /// Detail for a cell; cells without a quote handle are answered with
    /// [`DetailUnavailable::NoQuoteHandle`] without touching the provider.
    pub async fn lookup_cell(&self, cell: &Cell) -> DetailOutcome {
        match cell.quote_handle() {
            Some(handle) => self.lookup(handle).await,
            None => DetailOutcome::Unavailable {
                symbol: cell.symbol().clone(),
                reason: DetailUnavailable::NoQuoteHandle,
            },
        }
    }

    pub async fn lookup(&self, handle: &QuoteHandle) -> DetailOutcome {
        let symbol = handle.symbol();

        debug!(symbol = %symbol, provider = self.provider.id(), "fetching detail");
        let (info, history) = tokio::join!(
            self.throttled(self.provider.info(symbol)),
            self.throttled(self.provider.history(symbol, Period::FiveDays))
        );

        let result = info.and_then(|info| history.map(|sessions| (info, sessions)));
        match result {
            Ok((info, sessions)) => DetailOutcome::Available(DetailView {
                symbol: symbol.clone(),
                full_name: info
                    .get_str("longName")
                    .unwrap_or(UNKNOWN_NAME)
                    .to_owned(),
                previous_close: info.get_f64("previousClose"),
                history: PriceHistory::from_points(
                    sessions.into_iter().map(ClosePoint::from).collect(),
                ),
            }),
            Err(error) => {
                warn!(
                    symbol = %symbol,
                    code = error.code(),
                    error = %error,
                    "detail lookup failed"
                );
                DetailOutcome::Unavailable {
                    symbol: symbol.clone(),
                    reason: DetailUnavailable::Provider(error),
                }
            }
        }
    }

    /// Runs one provider request under its own throttle permit.
    async fn throttled<T>(&self, request: ProviderFuture<'_, T>) -> Result<T, SourceError> {
        let _permit = match &self.throttle {
            Some(throttle) => Some(throttle.acquire().await),
            None => None,
        };
        request.await
    }
}

impl std::fmt::Debug for DetailLookup {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetailLookup")
            .field("provider", &self.provider.id())
            .field("throttled", &self.throttle.is_some())
            .finish()
    }
}
