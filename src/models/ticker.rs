use serde::{Deserialize, Serialize};
use std::fmt;

/// Ticker symbol as listed by the data source (e.g. `AAPL`, `BRK-B`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticker(String);

impl Ticker {
    /// Build a ticker from one line of input. Returns `None` for blank lines.
    pub fn parse(raw: &str) -> Option<Self> {
        let symbol = raw.trim();
        if symbol.is_empty() {
            None
        } else {
            Some(Self(symbol.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered list of tickers read once per run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Watchlist {
    tickers: Vec<Ticker>,
}

impl Watchlist {
    pub fn new(tickers: Vec<Ticker>) -> Self {
        Self { tickers }
    }

    pub fn tickers(&self) -> &[Ticker] {
        &self.tickers
    }

    pub fn iter(&self) -> impl Iterator<Item = &Ticker> {
        self.tickers.iter()
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

impl FromIterator<Ticker> for Watchlist {
    fn from_iter<I: IntoIterator<Item = Ticker>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
