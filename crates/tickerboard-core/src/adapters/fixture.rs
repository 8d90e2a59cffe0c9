use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use time::{Date, OffsetDateTime, Weekday};

use crate::provider::{ProviderFuture, QuoteProvider, SourceError};
use crate::{CanonicalSymbol, InfoMap, Period, Session};

/// Deterministic in-memory provider.
///
/// Symbols are keyed by their canonical form, so `with_quote("BRK.B", ..)`
/// answers requests for `BRK-B`. Unknown symbols return an empty history,
/// unless the provider is [`seeded`](FixtureProvider::seeded), in which case
/// synthetic sessions are derived from the symbol text.
#[derive(Debug, Default)]
pub struct FixtureProvider {
    entries: HashMap<String, FixtureEntry>,
    seeded: bool,
    history_calls: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

#[derive(Debug, Default, Clone)]
struct FixtureEntry {
    history: Option<Result<Vec<Session>, SourceError>>,
    info: Option<Result<InfoMap, SourceError>>,
    delay: Option<Duration>,
}

/// Date stamped on sessions registered through [`FixtureProvider::with_quote`].
pub const FIXTURE_DATE: Date = time::macros::date!(2024 - 06 - 03);

impl FixtureProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that invents stable data for any non-empty symbol.
    pub fn seeded() -> Self {
        Self {
            seeded: true,
            ..Self::default()
        }
    }

    fn entry(&mut self, symbol: &str) -> &mut FixtureEntry {
        let key = CanonicalSymbol::normalize(symbol).as_str().to_owned();
        self.entries.entry(key).or_default()
    }

    /// Single session on [`FIXTURE_DATE`].
    pub fn with_quote(self, symbol: &str, open: f64, close: f64) -> Self {
        self.with_sessions(symbol, vec![Session::new(FIXTURE_DATE, open, close)])
    }

    pub fn with_sessions(mut self, symbol: &str, sessions: Vec<Session>) -> Self {
        self.entry(symbol).history = Some(Ok(sessions));
        self
    }

    pub fn with_history_error(mut self, symbol: &str, error: SourceError) -> Self {
        self.entry(symbol).history = Some(Err(error));
        self
    }

    pub fn with_info(mut self, symbol: &str, info: InfoMap) -> Self {
        self.entry(symbol).info = Some(Ok(info));
        self
    }

    pub fn with_info_error(mut self, symbol: &str, error: SourceError) -> Self {
        self.entry(symbol).info = Some(Err(error));
        self
    }

    /// Delays every call for `symbol`, to force out-of-order completion.
    pub fn with_delay(mut self, symbol: &str, delay: Duration) -> Self {
        self.entry(symbol).delay = Some(delay);
        self
    }

    /// Symbols passed to `history`, in call order.
    pub fn history_calls(&self) -> Vec<String> {
        self.history_calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    /// Highest number of simultaneously running provider calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn enter(&self, symbol: &CanonicalSymbol) -> InFlight<'_> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        let delay = self
            .entries
            .get(symbol.as_str())
            .and_then(|entry| entry.delay)
            .unwrap_or(Duration::from_millis(1));
        tokio::time::sleep(delay).await;

        InFlight(&self.in_flight)
    }

    fn sessions_for(&self, symbol: &CanonicalSymbol) -> Result<Vec<Session>, SourceError> {
        match self.entries.get(symbol.as_str()).and_then(|e| e.history.clone()) {
            Some(result) => result,
            None if self.seeded && !symbol.is_empty() => Ok(seeded_sessions(symbol)),
            None => Ok(Vec::new()),
        }
    }

    fn info_for(&self, symbol: &CanonicalSymbol) -> Result<InfoMap, SourceError> {
        match self.entries.get(symbol.as_str()).and_then(|e| e.info.clone()) {
            Some(result) => result,
            None if self.seeded && !symbol.is_empty() => Ok(seeded_info(symbol)),
            None => Ok(InfoMap::new()),
        }
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl QuoteProvider for FixtureProvider {
    fn id(&self) -> &'static str {
        "fixture"
    }

    fn history<'a>(
        &'a self,
        symbol: &'a CanonicalSymbol,
        period: Period,
    ) -> ProviderFuture<'a, Vec<Session>> {
        Box::pin(async move {
            if let Ok(mut calls) = self.history_calls.lock() {
                calls.push(symbol.as_str().to_owned());
            }
            let _guard = self.enter(symbol).await;

            let mut sessions = self.sessions_for(symbol)?;
            let keep = period.sessions();
            if sessions.len() > keep {
                sessions.drain(..sessions.len() - keep);
            }
            Ok(sessions)
        })
    }

    fn info<'a>(&'a self, symbol: &'a CanonicalSymbol) -> ProviderFuture<'a, InfoMap> {
        Box::pin(async move {
            let _guard = self.enter(symbol).await;
            self.info_for(symbol)
        })
    }
}

fn symbol_seed(symbol: &CanonicalSymbol) -> u64 {
    symbol.as_str().bytes().fold(0_u64, |acc, byte| {
        acc.wrapping_mul(33).wrapping_add(u64::from(byte))
    })
}

fn seeded_sessions(symbol: &CanonicalSymbol) -> Vec<Session> {
    let seed = symbol_seed(symbol);
    let dates = recent_weekdays(OffsetDateTime::now_utc().date(), 5);
    let mut close = 90.0 + (seed % 350) as f64 / 10.0;

    dates
        .into_iter()
        .enumerate()
        .map(|(index, date)| {
            let open = close;
            // Daily move in [-4.5%, +4.5%) so every bucket shows up on a board.
            let pct = ((seed.wrapping_add(index as u64 * 97)) % 900) as f64 / 100.0 - 4.5;
            close = open * (1.0 + pct / 100.0);
            Session::new(date, open, close)
        })
        .collect()
}

fn seeded_info(symbol: &CanonicalSymbol) -> InfoMap {
    let sessions = seeded_sessions(symbol);
    let mut info = InfoMap::new()
        .with("longName", format!("{symbol} Holdings Inc."))
        .with("shortName", symbol.as_str())
        .with("currency", "USD");
    if let Some(previous) = sessions.iter().rev().nth(1) {
        info.insert("previousClose", previous.close);
    }
    info
}

/// The `count` most recent weekdays up to and including `end`, oldest first.
fn recent_weekdays(end: Date, count: usize) -> Vec<Date> {
    let mut dates = Vec::with_capacity(count);
    let mut cursor = end;
    while dates.len() < count {
        if !matches!(cursor.weekday(), Weekday::Saturday | Weekday::Sunday) {
            dates.push(cursor);
        }
        match cursor.previous_day() {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    dates.reverse();
    dates
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[tokio::test]
    async fn registered_symbols_are_normalized() {
        let provider = FixtureProvider::new().with_quote("BRK.B", 50.0, 49.4);
        let symbol = CanonicalSymbol::normalize("BRK-B");

        let sessions = provider
            .history(&symbol, Period::OneDay)
            .await
            .expect("fixture history");

        assert_eq!(sessions, vec![Session::new(FIXTURE_DATE, 50.0, 49.4)]);
        assert_eq!(provider.history_calls(), vec![String::from("BRK-B")]);
    }

    #[tokio::test]
    async fn unknown_symbols_have_no_sessions() {
        let provider = FixtureProvider::new();
        let symbol = CanonicalSymbol::normalize("ZZZQQQ");

        let sessions = provider
            .history(&symbol, Period::FiveDays)
            .await
            .expect("fixture history");

        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn seeded_provider_is_deterministic() {
        let provider = FixtureProvider::seeded();
        let symbol = CanonicalSymbol::normalize("MSFT");

        let first = provider.history(&symbol, Period::FiveDays).await.expect("seeded");
        let second = provider.history(&symbol, Period::FiveDays).await.expect("seeded");

        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
        assert!(first.iter().all(|s| s.open > 0.0 && s.close > 0.0));
        assert!(first.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn recent_weekdays_skip_weekends() {
        // 2024-06-10 is a Monday.
        let dates = recent_weekdays(date!(2024 - 06 - 10), 3);
        assert_eq!(
            dates,
            vec![date!(2024 - 06 - 06), date!(2024 - 06 - 07), date!(2024 - 06 - 10)]
        );
    }
}
