//! Holdings source: CSV rows to [`Holding`] values, in file order.
//!
//! Header names are matched after trimming whitespace (and a UTF-8 BOM) and
//! ignoring case. Only `Ticker` is required; `Holdings`/`Name`, `Shares` and
//! `Market value` are picked up when present.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::{CoreError, Holding, ValidationError};

const TICKER: &str = "ticker";
const NAME_ALIASES: [&str; 2] = ["holdings", "name"];
const SHARES: &str = "shares";
const MARKET_VALUE: &str = "market value";

struct Columns {
    ticker: usize,
    name: Option<usize>,
    shares: Option<usize>,
    market_value: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Result<Self, ValidationError> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let position = |wanted: &str| normalized.iter().position(|header| header == wanted);

        let ticker = position(TICKER).ok_or_else(|| ValidationError::MissingTickerColumn {
            headers: normalized.join(", "),
        })?;

        Ok(Self {
            ticker,
            name: NAME_ALIASES.iter().find_map(|alias| position(alias)),
            shares: position(SHARES),
            market_value: position(MARKET_VALUE),
        })
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// `"$1,234.50"` -> `1234.5`; anything unparsable is treated as absent.
fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|ch| *ch != '$' && *ch != ',')
        .collect();
    cleaned
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn field<'r>(record: &'r StringRecord, index: Option<usize>) -> Option<&'r str> {
    index
        .and_then(|index| record.get(index))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// Reads holdings from any CSV byte source.
pub fn read_holdings<R: Read>(reader: R) -> Result<Vec<Holding>, CoreError> {
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = Columns::locate(reader.headers()?)?;
    let mut holdings = Vec::new();

    for record in reader.records() {
        let record = record?;
        holdings.push(Holding {
            raw_ticker: record.get(columns.ticker).unwrap_or_default().to_owned(),
            name: field(&record, columns.name).map(str::to_owned),
            shares: field(&record, columns.shares).and_then(parse_amount),
            market_value: field(&record, columns.market_value).and_then(parse_amount),
        });
    }

    debug!(count = holdings.len(), "holdings read");
    Ok(holdings)
}

pub fn load_holdings(path: impl AsRef<Path>) -> Result<Vec<Holding>, CoreError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading holdings");
    read_holdings(File::open(path)?)
}
