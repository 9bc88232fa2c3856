//! ISO 4217 style currency codes

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Three-letter upper-case currency code (`EUR`, `USD`, `BTC`, ...)
///
/// Crypto tickers are accepted as long as they are 3 to 5 ASCII letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Currency(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid currency code: {0}")]
pub struct CurrencyParseError(String);

impl Currency {
    pub fn eur() -> Self {
        Self("EUR".to_string())
    }

    pub fn new(code: &str) -> Result<Self, CurrencyParseError> {
        let code = code.trim().to_ascii_uppercase();
        if (3..=5).contains(&code.len()) && code.chars().all(|c| c.is_ascii_uppercase()) {
            Ok(Self(code))
        } else {
            Err(CurrencyParseError(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::eur()
    }
}

impl FromStr for Currency {
    type Err = CurrencyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Currency {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Currency::new(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_normalized() {
        assert_eq!(Currency::new(" eur ").unwrap(), Currency::eur());
        assert_eq!(Currency::new("usdt").unwrap().as_str(), "USDT");
    }

    #[test]
    fn test_currency_invalid() {
        assert!(Currency::new("E").is_err());
        assert!(Currency::new("EURO12").is_err());
        assert!(Currency::new("EU1").is_err());
    }

    #[test]
    fn test_currency_deserialize_rejects_garbage() {
        assert!(serde_json::from_str::<Currency>("\"eur\"").is_ok());
        assert!(serde_json::from_str::<Currency>("\"$$\"").is_err());
    }
}
