//! Rate snapshot types shared between the engine and quote collectors.
//!
//! A [`RatesSnapshot`] is assembled by whoever fetches quotes and handed to the
//! engine whole. The engine only ever reads from it.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::monetary::Country;

/// One quoted number with its provenance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RateValue {
    /// Quoted value. `None` when the source had nothing to offer.
    #[serde(default)]
    pub value: Option<Decimal>,
    /// Value was entered by an operator instead of coming from the feed.
    #[serde(default, rename = "override")]
    pub is_override: bool,
    /// Value came from a secondary source after the primary failed.
    #[serde(default)]
    pub fallback_used: bool,
    /// Human-readable source label.
    #[serde(default)]
    pub source: String,
}

impl RateValue {
    /// A rate quoted by a live source.
    pub fn quoted(value: Decimal, source: impl Into<String>) -> Self {
        Self {
            value: Some(value),
            is_override: false,
            fallback_used: false,
            source: source.into(),
        }
    }

    /// A rate the source could not provide.
    pub fn missing(source: impl Into<String>) -> Self {
        Self {
            value: None,
            is_override: false,
            fallback_used: false,
            source: source.into(),
        }
    }

    /// A rate entered by hand.
    pub fn manual(value: Decimal) -> Self {
        Self {
            value: Some(value),
            is_override: true,
            fallback_used: false,
            source: "manual".to_string(),
        }
    }

    /// Mark the rate as coming from a fallback source.
    pub fn with_fallback(mut self) -> Self {
        self.fallback_used = true;
        self
    }

    /// The value, if present and strictly positive.
    pub fn positive(&self) -> Option<Decimal> {
        self.value.filter(|v| *v > Decimal::ZERO)
    }
}

/// Cash quotes of the home exchange for one side of the book.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CashQuotes {
    /// RUB per EUR.
    pub eur: RateValue,
    /// RUB per newly issued USD.
    pub usd_white: RateValue,
    /// RUB per older USD.
    pub usd_blue: RateValue,
}

/// Home-exchange buy/sell quotes.
///
/// `buy` is what the exchange pays in RUB for one unit of foreign cash,
/// `sell` is what it charges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeExchangeRates {
    pub buy: CashQuotes,
    pub sell: CashQuotes,
}

fn default_fee_multiplier() -> Decimal {
    dec!(0.999)
}

/// Crypto-exchange quote for the settlement asset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoExchangeRate {
    /// RUB per unit of settlement asset.
    pub rate: RateValue,
    /// Share of the amount the exchange lets through (slightly below 1).
    pub fee_multiplier: Decimal,
}

impl Default for CryptoExchangeRate {
    fn default() -> Self {
        Self {
            rate: RateValue::default(),
            fee_multiplier: default_fee_multiplier(),
        }
    }
}

/// Fixed cross-rates configured by the business.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossRates {
    /// RSD per EUR.
    pub rsd_per_eur: RateValue,
}

/// One profit bracket, sized in EUR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginTier {
    /// Inclusive lower bound.
    pub min: Decimal,
    /// Exclusive upper bound, `None` for unbounded.
    #[serde(default)]
    pub max: Option<Decimal>,
    /// Multiplier applied to the amount.
    pub coefficient: Decimal,
}

impl MarginTier {
    pub fn new(min: Decimal, max: Option<Decimal>, coefficient: Decimal) -> Self {
        Self {
            min,
            max,
            coefficient,
        }
    }

    /// Whether `amount` lies inside `[min, max)`.
    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min && self.max.map_or(true, |max| amount < max)
    }
}

/// Point-in-time set of quotes used for a calculation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RatesSnapshot {
    #[serde(default)]
    pub home_exchange: HomeExchangeRates,
    #[serde(default)]
    pub crypto_exchange: CryptoExchangeRate,
    /// EUR per unit of settlement asset.
    #[serde(default)]
    pub international: RateValue,
    /// Per-country multipliers on the international rate.
    #[serde(default)]
    pub settlement_coefficients: BTreeMap<Country, RateValue>,
    #[serde(default)]
    pub cross_rates: CrossRates,
    /// Central-bank RUB per EUR.
    #[serde(default)]
    pub central_bank: RateValue,
    #[serde(default)]
    pub margin_tiers: Vec<MarginTier>,
    /// When the settlement leg quotes were posted.
    #[serde(default)]
    pub fintech_timestamp: Option<DateTime<Utc>>,
    /// When the snapshot was last refreshed.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RatesSnapshot {
    /// Settlement coefficient for a country, if configured.
    pub fn settlement_coefficient(&self, country: &Country) -> Option<&RateValue> {
        self.settlement_coefficients.get(country)
    }

    /// Time elapsed since the snapshot was refreshed.
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.updated_at.map(|at| now.signed_duration_since(at))
    }
}
