use serde::{Deserialize, Serialize};

/// One row of the holdings source, as read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub raw_ticker: String,
    pub name: Option<String>,
    pub shares: Option<f64>,
    pub market_value: Option<f64>,
}

impl Holding {
    pub fn new(raw_ticker: impl Into<String>) -> Self {
        Self {
            raw_ticker: raw_ticker.into(),
            name: None,
            shares: None,
            market_value: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_shares(mut self, shares: f64) -> Self {
        self.shares = Some(shares);
        self
    }

    pub fn with_market_value(mut self, market_value: f64) -> Self {
        self.market_value = Some(market_value);
        self
    }
}

impl From<&str> for Holding {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
