use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::Date;

/// History window requested from a quote provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "5d")]
    FiveDays,
}

impl Period {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
        }
    }

    /// Number of trading sessions the window covers.
    pub const fn sessions(self) -> usize {
        match self {
            Self::OneDay => 1,
            Self::FiveDays => 5,
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

time::serde::format_description!(session_date, Date, "[year]-[month]-[day]");

/// One trading session as returned by `history`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(with = "session_date")]
    pub date: Date,
    pub open: f64,
    pub close: f64,
}

impl Session {
    pub const fn new(date: Date, open: f64, close: f64) -> Self {
        Self { date, open, close }
    }
}

/// Dated closing price shown in a detail view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClosePoint {
    #[serde(with = "session_date")]
    pub date: Date,
    pub close: f64,
}

impl From<Session> for ClosePoint {
    fn from(session: Session) -> Self {
        Self {
            date: session.date,
            close: session.close,
        }
    }
}

/// Loosely-typed descriptive fields returned by `info`.
///
/// Any key may be missing; readers pick typed values out defensively.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InfoMap(BTreeMap<String, Value>);

impl InfoMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Non-empty string value for `key`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Finite numeric value for `key`.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.0
            .get(key)
            .and_then(Value::as_f64)
            .filter(|value| value.is_finite())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
