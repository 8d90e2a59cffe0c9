use std::sync::Arc;

use serde::Deserialize;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::debug;

use crate::http_client::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::provider::{ProviderFuture, QuoteProvider, SourceError};
use crate::{CanonicalSymbol, InfoMap, Period, Session};

const CHART_ENDPOINT: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SUMMARY_ENDPOINT: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const COOKIE_ENDPOINT: &str = "https://fc.yahoo.com";
const CRUMB_ENDPOINTS: [&str; 2] = [
    "https://query1.finance.yahoo.com/v1/test/getcrumb",
    "https://query2.finance.yahoo.com/v1/test/getcrumb",
];
const REFERER: &str = "https://finance.yahoo.com/";

// ============================================================================
// Yahoo session - cookie/crumb handshake
// ============================================================================

/// Cached crumb for Yahoo endpoints that require one.
///
/// The session cookie lives in the transport's cookie store; only the crumb
/// needs to be carried in query strings.
#[derive(Debug, Default)]
struct YahooSession {
    crumb: Mutex<Option<String>>,
}

impl YahooSession {
    async fn crumb(
        &self,
        http_client: &Arc<dyn HttpClient>,
        timeout_ms: u64,
    ) -> Result<String, SourceError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        let cookie_request = HttpRequest::get(COOKIE_ENDPOINT)
            .with_header("referer", REFERER)
            .with_timeout_ms(timeout_ms);
        // fc.yahoo.com answers 404 but still sets the session cookie.
        http_client.execute(cookie_request).await.map_err(|e| {
            SourceError::unavailable(format!("failed to fetch yahoo cookie: {}", e.message()))
        })?;

        for endpoint in CRUMB_ENDPOINTS {
            let request = HttpRequest::get(endpoint)
                .with_header("referer", REFERER)
                .with_timeout_ms(timeout_ms);

            match http_client.execute(request).await {
                Ok(response) if response.status == 429 => {
                    return Err(SourceError::rate_limited(
                        "yahoo rate limited while fetching crumb",
                    ));
                }
                Ok(response) if response.is_success() => {
                    if let Some(crumb) = parse_crumb(&response.body) {
                        *cached = Some(crumb.clone());
                        return Ok(crumb);
                    }
                }
                Ok(_) | Err(_) => continue,
            }
        }

        Err(SourceError::unavailable(
            "failed to fetch yahoo crumb from all endpoints",
        ))
    }

    async fn invalidate(&self) {
        *self.crumb.lock().await = None;
    }
}

fn parse_crumb(body: &str) -> Option<String> {
    let body = body.trim();
    let looks_like_html = body.contains("<html") || body.contains("<!DOCTYPE");
    if body.is_empty() || body.len() >= 100 || body.contains(' ') || looks_like_html {
        return None;
    }
    Some(body.to_owned())
}

// ============================================================================
// Yahoo provider
// ============================================================================

/// Quote provider backed by Yahoo Finance's chart and quoteSummary endpoints.
pub struct YahooProvider {
    http_client: Arc<dyn HttpClient>,
    session: YahooSession,
    timeout_ms: u64,
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()))
    }
}

impl YahooProvider {
    pub fn with_http_client(http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            http_client,
            session: YahooSession::default(),
            timeout_ms: 10_000,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    async fn get(&self, url: &str) -> Result<HttpResponse, SourceError> {
        let request = HttpRequest::get(url)
            .with_header("referer", REFERER)
            .with_timeout_ms(self.timeout_ms);

        self.http_client.execute(request).await.map_err(|error| {
            if error.retryable() {
                SourceError::unavailable(format!("yahoo transport error: {}", error.message()))
            } else {
                SourceError::internal(format!("yahoo transport error: {}", error.message()))
            }
        })
    }

    async fn fetch_sessions(
        &self,
        symbol: &CanonicalSymbol,
        period: Period,
    ) -> Result<Vec<Session>, SourceError> {
        let url = format!(
            "{CHART_ENDPOINT}/{}?range={}&interval=1d&includePrePost=false",
            urlencoding::encode(symbol.as_str()),
            period.as_str()
        );
        debug!(symbol = %symbol, period = %period, "requesting yahoo chart");

        let response = self.get(&url).await?;
        if !response.is_success() && response.status != 404 {
            return Err(status_error(response.status));
        }

        let chart: ChartResponse = serde_json::from_str(&response.body)
            .map_err(|e| SourceError::malformed(format!("failed to parse yahoo chart: {e}")))?;

        if let Some(error) = chart.chart.error {
            if error.code.eq_ignore_ascii_case("Not Found") {
                // Unknown or delisted symbols carry no sessions.
                return Ok(Vec::new());
            }
            return Err(SourceError::unavailable(format!(
                "yahoo chart error: {}",
                error.description.unwrap_or(error.code)
            )));
        }

        let Some(result) = chart.chart.result.and_then(|results| results.into_iter().next())
        else {
            return Ok(Vec::new());
        };

        sessions_from_chart(result, period)
    }

    async fn fetch_info(&self, symbol: &CanonicalSymbol) -> Result<InfoMap, SourceError> {
        let mut refreshed = false;
        loop {
            let crumb = self
                .session
                .crumb(&self.http_client, self.timeout_ms)
                .await?;
            let url = format!(
                "{SUMMARY_ENDPOINT}/{}?modules=price,summaryDetail&crumb={}",
                urlencoding::encode(symbol.as_str()),
                urlencoding::encode(&crumb)
            );
            debug!(symbol = %symbol, "requesting yahoo quote summary");

            let response = self.get(&url).await?;
            if matches!(response.status, 401 | 403 | 429) && !refreshed {
                // Stale crumb; handshake again once.
                self.session.invalidate().await;
                refreshed = true;
                continue;
            }
            if response.status == 404 {
                return Err(SourceError::not_found(format!(
                    "yahoo has no summary for '{symbol}'"
                )));
            }
            if !response.is_success() {
                return Err(status_error(response.status));
            }

            return parse_summary(&response.body);
        }
    }
}

impl QuoteProvider for YahooProvider {
    fn id(&self) -> &'static str {
        "yahoo"
    }

    fn history<'a>(
        &'a self,
        symbol: &'a CanonicalSymbol,
        period: Period,
    ) -> ProviderFuture<'a, Vec<Session>> {
        Box::pin(async move {
            if symbol.is_empty() {
                return Err(SourceError::invalid_request(
                    "yahoo history request requires a symbol",
                ));
            }
            self.fetch_sessions(symbol, period).await
        })
    }

    fn info<'a>(&'a self, symbol: &'a CanonicalSymbol) -> ProviderFuture<'a, InfoMap> {
        Box::pin(async move {
            if symbol.is_empty() {
                return Err(SourceError::invalid_request(
                    "yahoo info request requires a symbol",
                ));
            }
            self.fetch_info(symbol).await
        })
    }
}

fn status_error(status: u16) -> SourceError {
    if status == 429 {
        SourceError::rate_limited("yahoo returned status 429")
    } else {
        SourceError::unavailable(format!("yahoo returned status {status}"))
    }
}

fn sessions_from_chart(result: ChartResult, period: Period) -> Result<Vec<Session>, SourceError> {
    let offset = result.meta.and_then(|meta| meta.gmtoffset).unwrap_or(0);
    let timestamps = result.timestamp.unwrap_or_default();
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let mut sessions = Vec::with_capacity(timestamps.len());
    for (index, ts) in timestamps.into_iter().enumerate() {
        let open = quote.open.get(index).copied().flatten();
        let close = quote.close.get(index).copied().flatten();
        let (Some(open), Some(close)) = (open, close) else {
            continue;
        };

        let date = OffsetDateTime::from_unix_timestamp(ts + offset)
            .map_err(|e| SourceError::malformed(format!("invalid yahoo timestamp {ts}: {e}")))?
            .date();
        sessions.push(Session::new(date, open, close));
    }

    sessions.sort_by_key(|session| session.date);
    // Yahoo can emit the live session twice; keep the later row per date.
    sessions.reverse();
    sessions.dedup_by_key(|session| session.date);
    sessions.reverse();

    let keep = period.sessions();
    if sessions.len() > keep {
        sessions.drain(..sessions.len() - keep);
    }
    Ok(sessions)
}

fn parse_summary(body: &str) -> Result<InfoMap, SourceError> {
    let summary: SummaryResponse = serde_json::from_str(body)
        .map_err(|e| SourceError::malformed(format!("failed to parse yahoo summary: {e}")))?;

    if let Some(error) = summary.quote_summary.error {
        return Err(SourceError::unavailable(format!(
            "yahoo summary error: {}",
            error.description.unwrap_or(error.code)
        )));
    }

    let mut info = InfoMap::new();
    let Some(result) = summary
        .quote_summary
        .result
        .and_then(|results| results.into_iter().next())
    else {
        return Ok(info);
    };

    let mut previous_close = None;
    if let Some(price) = result.price {
        if let Some(name) = price.long_name {
            info.insert("longName", name);
        }
        if let Some(name) = price.short_name {
            info.insert("shortName", name);
        }
        if let Some(currency) = price.currency {
            info.insert("currency", currency);
        }
        previous_close = price.regular_market_previous_close.and_then(|v| v.raw);
    }
    if let Some(detail) = result.summary_detail {
        previous_close = detail.previous_close.and_then(|v| v.raw).or(previous_close);
    }
    if let Some(value) = previous_close.filter(|v| v.is_finite()) {
        info.insert("previousClose", value);
    }

    Ok(info)
}

// Yahoo Finance API response structures
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: SummaryData,
}

#[derive(Debug, Deserialize)]
struct SummaryData {
    #[serde(default)]
    result: Option<Vec<SummaryResult>>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    #[serde(default)]
    price: Option<SummaryPrice>,
    #[serde(rename = "summaryDetail", default)]
    summary_detail: Option<SummaryDetail>,
}

#[derive(Debug, Deserialize)]
struct SummaryPrice {
    #[serde(rename = "longName", default)]
    long_name: Option<String>,
    #[serde(rename = "shortName", default)]
    short_name: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(rename = "regularMarketPreviousClose", default)]
    regular_market_previous_close: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
struct SummaryDetail {
    #[serde(rename = "previousClose", default)]
    previous_close: Option<RawValue>,
}

/// Yahoo wraps numbers as `{ "raw": 1.0, "fmt": "1.00" }`.
#[derive(Debug, Deserialize)]
struct RawValue {
    #[serde(default)]
    raw: Option<f64>,
}
