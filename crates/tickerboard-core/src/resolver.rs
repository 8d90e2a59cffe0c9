//! Quote Resolver: canonical symbol to typed quote result.
//!
//! Provider failures never escape [`QuoteResolver::resolve`]. They are folded
//! into [`QuoteResult::Unavailable`] together with the reason, so one bad
//! symbol cannot abort a board build.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::provider::QuoteProvider;
use crate::throttling::RequestThrottle;
use crate::{CanonicalSymbol, Period, Session, UnresolvableReason};

/// Opaque reference to a resolved quote, handed back for detail lookups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuoteHandle {
    symbol: CanonicalSymbol,
    session: Session,
}

impl QuoteHandle {
    pub fn symbol(&self) -> &CanonicalSymbol {
        &self.symbol
    }

    /// Session the percent change was computed from.
    pub fn session(&self) -> &Session {
        &self.session
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuoteResult {
    Success {
        symbol: CanonicalSymbol,
        percent_change: f64,
        handle: QuoteHandle,
    },
    Unavailable {
        symbol: CanonicalSymbol,
        reason: UnresolvableReason,
    },
}

impl QuoteResult {
    pub fn symbol(&self) -> &CanonicalSymbol {
        match self {
            Self::Success { symbol, .. } | Self::Unavailable { symbol, .. } => symbol,
        }
    }

    pub fn percent_change(&self) -> Option<f64> {
        match self {
            Self::Success { percent_change, .. } => Some(*percent_change),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn handle(&self) -> Option<&QuoteHandle> {
        match self {
            Self::Success { handle, .. } => Some(handle),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn unresolvable_reason(&self) -> Option<&UnresolvableReason> {
        match self {
            Self::Success { .. } => None,
            Self::Unavailable { reason, .. } => Some(reason),
        }
    }

    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// `(close - open) / open * 100`, or `None` for a zero open or a non-finite result.
pub fn percent_change(open: f64, close: f64) -> Option<f64> {
    session_change(open, close).ok()
}

fn session_change(open: f64, close: f64) -> Result<f64, UnresolvableReason> {
    if open == 0.0 {
        return Err(UnresolvableReason::ZeroOpen);
    }
    let change = (close - open) / open * 100.0;
    if change.is_finite() {
        Ok(change)
    } else {
        Err(UnresolvableReason::NonFinite)
    }
}

/// Resolves symbols against a shared provider, one request per call.
#[derive(Clone)]
pub struct QuoteResolver {
    provider: Arc<dyn QuoteProvider>,
    throttle: Option<RequestThrottle>,
}

impl QuoteResolver {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self {
            provider,
            throttle: None,
        }
    }

    /// Every provider call first takes a permit from `throttle`.
    pub fn with_throttle(mut self, throttle: RequestThrottle) -> Self {
        self.throttle = Some(throttle);
        self
    }

    pub fn provider(&self) -> &Arc<dyn QuoteProvider> {
        &self.provider
    }

    pub async fn resolve(&self, symbol: CanonicalSymbol) -> QuoteResult {
        if symbol.is_empty() {
            return QuoteResult::Unavailable {
                symbol,
                reason: UnresolvableReason::EmptySymbol,
            };
        }

        let _permit = match &self.throttle {
            Some(throttle) => Some(throttle.acquire().await),
            None => None,
        };

        debug!(
            symbol = %symbol,
            provider = self.provider.id(),
            "requesting latest session"
        );
        let outcome = self
            .provider
            .history(&symbol, Period::OneDay)
            .await
            .map_err(UnresolvableReason::Provider)
            .and_then(|sessions| latest_session(sessions).ok_or(UnresolvableReason::NoSessions))
            .and_then(|session| {
                session_change(session.open, session.close).map(|change| (change, session))
            });

        match outcome {
            Ok((percent_change, session)) => QuoteResult::Success {
                handle: QuoteHandle {
                    symbol: symbol.clone(),
                    session,
                },
                symbol,
                percent_change,
            },
            Err(reason) => QuoteResult::Unavailable { symbol, reason },
        }
    }
}

impl std::fmt::Debug for QuoteResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteResolver")
            .field("provider", &self.provider.id())
            .field("throttled", &self.throttle.is_some())
            .finish()
    }
}

/// Latest session by date; ties keep the last row returned.
fn latest_session(sessions: Vec<Session>) -> Option<Session> {
    sessions.into_iter().reduce(|latest, candidate| {
        if candidate.date >= latest.date {
            candidate
        } else {
            latest
        }
    })
}
