//! Monetary types for the Corridor engine.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A monetary amount with currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// The amount value (high precision decimal).
    pub value: Decimal,
    /// Currency code.
    pub currency: Currency,
}

impl Money {
    /// Create a new Money instance.
    pub fn new(value: Decimal, currency: Currency) -> Self {
        Self { value, currency }
    }

    /// Create a zero amount in the given currency.
    pub fn zero(currency: Currency) -> Self {
        Self {
            value: Decimal::ZERO,
            currency,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency.round(self.value), self.currency)
    }
}

/// Currency or asset code, always upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Currency(String);

impl Currency {
    /// Create a new currency from code.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    /// Get the standard decimal places for this currency.
    pub fn decimal_places(&self) -> u32 {
        match self.0.as_str() {
            "USDT" => 6,
            _ => 2,
        }
    }

    /// Round a value to this currency's decimal places.
    pub fn round(&self, value: Decimal) -> Decimal {
        value.round_dp(self.decimal_places())
    }

    /// Home currency.
    pub fn rub() -> Self {
        Self::new("RUB")
    }

    pub fn eur() -> Self {
        Self::new("EUR")
    }

    /// Newly issued USD notes.
    pub fn usd_white() -> Self {
        Self::new("USD_WHITE")
    }

    /// Older USD notes, quoted at a discount.
    pub fn usd_blue() -> Self {
        Self::new("USD_BLUE")
    }

    pub fn rsd() -> Self {
        Self::new("RSD")
    }

    /// Settlement asset.
    pub fn usdt() -> Self {
        Self::new("USDT")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Currency {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Currency {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.0
    }
}

/// Destination/origin country key used for settlement coefficients.
///
/// Names are trimmed and lower-cased, including when deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Country(String);

impl Country {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into().trim().to_lowercase())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Country {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Country {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<Country> for String {
    fn from(country: Country) -> Self {
        country.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_display_rounds() {
        let m = Money::new(dec!(8530.266528), Currency::eur());
        assert_eq!(m.to_string(), "8530.27 EUR");
    }

    #[test]
    fn test_currency_decimal_places() {
        assert_eq!(Currency::rub().decimal_places(), 2);
        assert_eq!(Currency::usdt().decimal_places(), 6);
        assert_eq!(Currency::new("usd_white"), Currency::usd_white());
    }

    #[test]
    fn test_country_normalized() {
        assert_eq!(Country::new(" Serbia "), Country::from("serbia"));
    }

    #[test]
    fn test_deserialize_normalizes_codes() {
        let country: Country = serde_json::from_str(r#"" Serbia""#).unwrap();
        assert_eq!(country, Country::new("serbia"));
        assert_eq!(serde_json::to_string(&country).unwrap(), r#""serbia""#);

        let currency: Currency = serde_json::from_str(r#""usd_white""#).unwrap();
        assert_eq!(currency, Currency::usd_white());
        assert_eq!(serde_json::to_string(&currency).unwrap(), r#""USD_WHITE""#);
    }
}
