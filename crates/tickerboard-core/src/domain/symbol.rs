use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Marker that some holdings exports put in front of a ticker (`$BRK.B`).
const MARKER_PREFIX: char = '$';

/// Canonical tradable symbol derived from a raw holdings ticker.
///
/// Construction never fails: an empty or whitespace-only ticker yields an
/// empty symbol, which the resolver reports as unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CanonicalSymbol(String);

impl CanonicalSymbol {
    /// Normalizes a raw ticker.
    ///
    /// Trims surrounding whitespace, drops the leading `$` marker run together
    /// with any whitespace next to it, then rewrites exchange-class dots as
    /// dashes (`BRK.B` -> `BRK-B`). The result never starts with whitespace or
    /// a marker and never contains a dot, so normalizing twice is a no-op.
    pub fn normalize(raw: &str) -> Self {
        let stripped = raw
            .trim_start_matches(|ch: char| ch == MARKER_PREFIX || ch.is_whitespace())
            .trim_end();

        Self(stripped.replace('.', "-"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for CanonicalSymbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for CanonicalSymbol {
    fn from(value: String) -> Self {
        Self::normalize(&value)
    }
}

impl From<&str> for CanonicalSymbol {
    fn from(value: &str) -> Self {
        Self::normalize(value)
    }
}

impl From<CanonicalSymbol> for String {
    fn from(value: CanonicalSymbol) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_rewrites_class_suffix() {
        assert_eq!(CanonicalSymbol::normalize("  BRK.B ").as_str(), "BRK-B");
    }

    #[test]
    fn strips_leading_marker() {
        assert_eq!(CanonicalSymbol::normalize("$BF.B").as_str(), "BF-B");
        assert_eq!(CanonicalSymbol::normalize(" $ AAPL").as_str(), "AAPL");
    }

    #[test]
    fn replaces_every_dot() {
        let symbol = CanonicalSymbol::normalize("A.B.C");
        assert_eq!(symbol.as_str(), "A-B-C");
        assert!(!symbol.as_str().contains('.'));
    }

    #[test]
    fn keeps_case_and_inner_characters() {
        assert_eq!(CanonicalSymbol::normalize("aapl").as_str(), "aapl");
        assert_eq!(CanonicalSymbol::normalize("BTC-USD").as_str(), "BTC-USD");
    }

    #[test]
    fn empty_input_yields_empty_symbol() {
        assert!(CanonicalSymbol::normalize("").is_empty());
        assert!(CanonicalSymbol::normalize("   ").is_empty());
        assert!(CanonicalSymbol::normalize("$").is_empty());
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "AAPL", " BRK.B ", "$BRK.B", "$$ $X.Y", "$ $A", " . ", "..", "\tMSFT\n", "", "$",
        ] {
            let once = CanonicalSymbol::normalize(raw);
            let twice = CanonicalSymbol::normalize(once.as_str());
            assert_eq!(once, twice, "normalize must be idempotent for {raw:?}");
        }
    }

    #[test]
    fn serde_round_trips_as_plain_string() {
        let symbol = CanonicalSymbol::normalize("BRK.B");
        let json = serde_json::to_string(&symbol).expect("serialize");
        assert_eq!(json, "\"BRK-B\"");
    }
}
