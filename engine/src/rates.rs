//! Rate resolution against a snapshot.

use corridor_common::{CashQuotes, RateValue, RatesSnapshot};
use rust_decimal::Decimal;

use crate::error::Issues;
use crate::input::HomeCurrency;
use crate::trace::RateDescriptor;

/// Extract a usable rate, or record `label` as an issue.
///
/// Missing rates, null values and values `<= 0` are rejected. Never fails by
/// itself; call [`Issues::check`] at the next checkpoint.
pub fn resolve(rate: Option<&RateValue>, label: &str, issues: &mut Issues) -> Option<Decimal> {
    match rate.and_then(RateValue::positive) {
        Some(value) => Some(value),
        None => {
            issues.push(label);
            None
        }
    }
}

/// A rate resolved from the snapshot together with its provenance.
#[derive(Debug, Clone)]
pub struct ResolvedRate {
    pub value: Decimal,
    pub descriptor: RateDescriptor,
}

/// Like [`resolve`], keeping the provenance for the trace.
pub fn resolve_described(
    rate: Option<&RateValue>,
    label: &str,
    issues: &mut Issues,
) -> Option<ResolvedRate> {
    let value = resolve(rate, label, issues)?;
    let descriptor = match rate {
        Some(rate) => RateDescriptor::from_rate(label, value, rate),
        None => RateDescriptor::fixed(label, value, "unknown"),
    };
    Some(ResolvedRate { value, descriptor })
}

/// Which side of the home exchange's book to quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    /// Exchange buys foreign cash from the client.
    Buy,
    /// Exchange sells foreign cash to the client.
    Sell,
}

impl BookSide {
    fn quotes<'a>(&self, snapshot: &'a RatesSnapshot) -> &'a CashQuotes {
        match self {
            BookSide::Buy => &snapshot.home_exchange.buy,
            BookSide::Sell => &snapshot.home_exchange.sell,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            BookSide::Buy => "buy",
            BookSide::Sell => "sell",
        }
    }
}

/// Home-exchange cash quote for a non-home currency.
///
/// Returns `None` for the home currency itself, which has no quote.
pub fn cash_quote(
    snapshot: &RatesSnapshot,
    side: BookSide,
    currency: HomeCurrency,
) -> Option<&RateValue> {
    let quotes = side.quotes(snapshot);
    match currency {
        HomeCurrency::Rub => None,
        HomeCurrency::Eur => Some(&quotes.eur),
        HomeCurrency::UsdWhite => Some(&quotes.usd_white),
        HomeCurrency::UsdBlue => Some(&quotes.usd_blue),
    }
}

/// Label used in issues and traces for a cash quote.
pub fn cash_quote_label(side: BookSide, currency: HomeCurrency) -> String {
    format!("Home exchange {} {} rate", currency, side.name())
}

/// Label of the USD quote the handler commission is converted with.
pub const USD_BUY_LABEL: &str = "Home exchange USD buy rate";

/// Home-exchange USD buy quote used for the handler commission.
pub fn usd_buy_quote(snapshot: &RatesSnapshot) -> &RateValue {
    &snapshot.home_exchange.buy.usd_white
}

pub const CENTRAL_BANK_LABEL: &str = "Central bank RUB/EUR rate";
pub const CRYPTO_RATE_LABEL: &str = "Crypto exchange rate";
pub const CRYPTO_MULTIPLIER_LABEL: &str = "Crypto exchange fee multiplier";
pub const INTERNATIONAL_LABEL: &str = "International EUR/USDT rate";
pub const CROSS_RATE_LABEL: &str = "Fixed RSD/EUR cross-rate";
pub const MANUAL_RATE_LABEL: &str = "Manual settlement rate";

/// Label of a country's settlement coefficient.
pub fn coefficient_label(country: &corridor_common::Country) -> String {
    format!("Settlement coefficient ({})", country)
}
