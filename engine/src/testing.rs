//! Synthetic snapshot for tests.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use corridor_common::{
    CashQuotes, Country, CrossRates, CryptoExchangeRate, HomeExchangeRates, MarginTier, RateValue,
    RatesSnapshot,
};
use rust_decimal_macros::dec;

/// Snapshot with round numbers that make expected amounts easy to derive.
///
/// USD 80/82, EUR 95/97, crypto 90 × 0.999, international 0.85, Serbia 0.93,
/// central bank 100, RSD 117.2 per EUR, tiers `[0, 5000) → 0.95` and
/// `[5000, ∞) → 0.98`.
pub fn demo_snapshot() -> RatesSnapshot {
    let exchange = |value| RateValue::quoted(value, "TEST_EXCHANGE");

    let mut settlement_coefficients = BTreeMap::new();
    settlement_coefficients.insert(Country::new("serbia"), RateValue::quoted(dec!(0.93), "TEST"));
    settlement_coefficients.insert(
        Country::new("montenegro"),
        RateValue::quoted(dec!(0.95), "TEST"),
    );

    RatesSnapshot {
        home_exchange: HomeExchangeRates {
            buy: CashQuotes {
                eur: exchange(dec!(95)),
                usd_white: exchange(dec!(80)),
                usd_blue: exchange(dec!(78)),
            },
            sell: CashQuotes {
                eur: exchange(dec!(97)),
                usd_white: exchange(dec!(82)),
                usd_blue: exchange(dec!(81)),
            },
        },
        crypto_exchange: CryptoExchangeRate {
            rate: RateValue::quoted(dec!(90), "TEST_P2P"),
            fee_multiplier: dec!(0.999),
        },
        international: RateValue::quoted(dec!(0.85), "TEST_FX"),
        settlement_coefficients,
        cross_rates: CrossRates {
            rsd_per_eur: RateValue::quoted(dec!(117.2), "config"),
        },
        central_bank: RateValue::quoted(dec!(100), "TEST_CBR"),
        margin_tiers: vec![
            MarginTier::new(dec!(0), Some(dec!(5000)), dec!(0.95)),
            MarginTier::new(dec!(5000), None, dec!(0.98)),
        ],
        fintech_timestamp: Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).single(),
        updated_at: Utc.with_ymd_and_hms(2026, 3, 2, 9, 31, 0).single(),
    }
}
