//! Handler commission schedule.

use corridor_common::Currency;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{CalcResult, CalculationError, ErrorKind};
use crate::input::MeetingChannel;
use crate::pipeline::product;
use crate::rates::ResolvedRate;
use crate::trace::{CalculationStep, Trace};

/// One row of the commission schedule.
#[derive(Debug, Clone, Copy)]
struct CommissionTier {
    channel: MeetingChannel,
    /// EUR-equivalent size from which the row applies.
    threshold_eur: u32,
    commission_usd: u32,
}

const fn row(channel: MeetingChannel, threshold_eur: u32, commission_usd: u32) -> CommissionTier {
    CommissionTier {
        channel,
        threshold_eur,
        commission_usd,
    }
}

const COMMISSION_TABLE: &[CommissionTier] = &[
    row(MeetingChannel::Office, 500, 30),
    row(MeetingChannel::Office, 2_000, 50),
    row(MeetingChannel::Office, 5_000, 80),
    row(MeetingChannel::Office, 20_000, 120),
    row(MeetingChannel::Office, 50_000, 200),
    row(MeetingChannel::Field, 500, 50),
    row(MeetingChannel::Field, 2_000, 70),
    row(MeetingChannel::Field, 5_000, 100),
    row(MeetingChannel::Field, 20_000, 150),
    row(MeetingChannel::Field, 50_000, 250),
    row(MeetingChannel::Regional, 1_000, 100),
    row(MeetingChannel::Regional, 5_000, 150),
    row(MeetingChannel::Regional, 20_000, 250),
    row(MeetingChannel::Regional, 50_000, 400),
];

/// Tiered part of the handler commission, in USD.
///
/// Amounts below the channel's lowest threshold still pay the lowest row.
pub fn employee_commission(eur_amount: Decimal, channel: MeetingChannel) -> Decimal {
    let mut rows: Vec<&CommissionTier> = COMMISSION_TABLE
        .iter()
        .filter(|row| row.channel == channel)
        .collect();
    rows.sort_by(|a, b| b.threshold_eur.cmp(&a.threshold_eur));

    rows.iter()
        .find(|row| Decimal::from(row.threshold_eur) <= eur_amount)
        .or_else(|| rows.last())
        .map_or(Decimal::ZERO, |row| Decimal::from(row.commission_usd))
}

/// Lowest commission a channel can charge, in USD, excluding the fixed base.
pub fn minimum_commission(channel: MeetingChannel) -> Decimal {
    employee_commission(Decimal::ZERO, channel)
}

/// Commission charged for one calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionBreakdown {
    /// EUR-equivalent size the tier was picked with.
    pub basis_eur: Decimal,
    pub base_usd: Decimal,
    pub tier_usd: Decimal,
    pub total_usd: Decimal,
    /// RUB per USD used to convert the commission.
    pub usd_rate: Decimal,
    pub total_home: Decimal,
}

/// Subtract the handler commission from a home-currency amount.
///
/// Fails when the amount does not cover the commission.
pub(crate) fn deduct_commission(
    amount_home: Decimal,
    basis_eur: Decimal,
    channel: MeetingChannel,
    usd_rate: &ResolvedRate,
    config: &EngineConfig,
    trace: &mut Trace,
) -> CalcResult<(Decimal, CommissionBreakdown)> {
    let tier_usd = employee_commission(basis_eur, channel);
    let total_usd = config.base_commission_usd + tier_usd;
    let total_home = product(total_usd, usd_rate.value)?;
    let remaining = amount_home - total_home;

    if remaining < Decimal::ZERO {
        return Err(CalculationError::new(
            ErrorKind::InsufficientAmount,
            format!(
                "Amount {} RUB does not cover the handler commission; minimum required is {} RUB",
                Currency::rub().round(amount_home),
                Currency::rub().round(total_home)
            ),
        ));
    }

    trace.record(|| {
        CalculationStep::new("After handler commission", remaining, Currency::rub())
            .with_rate(usd_rate.descriptor.clone())
            .with_formula(format!(
                "{} − ({} + {}) USD × {}",
                Currency::rub().round(amount_home),
                config.base_commission_usd,
                tier_usd,
                usd_rate.value
            ))
            .with_note(format!(
                "{} channel tier sized at {} EUR",
                channel,
                Currency::eur().round(basis_eur)
            ))
    });

    Ok((
        remaining,
        CommissionBreakdown {
            basis_eur,
            base_usd: config.base_commission_usd,
            tier_usd,
            total_usd,
            usd_rate: usd_rate.value,
            total_home,
        },
    ))
}

/// Record the commission sizing step.
pub(crate) fn record_basis(
    trace: &mut Trace,
    amount_home: Decimal,
    basis_eur: Decimal,
    central_bank: &ResolvedRate,
) {
    trace.record(|| {
        CalculationStep::new("Commission basis", basis_eur, Currency::eur())
            .with_rate(central_bank.descriptor.clone())
            .with_formula(format!(
                "{} / {}",
                Currency::rub().round(amount_home),
                central_bank.value
            ))
            .with_note("Sizing only, not deducted")
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::RateDescriptor;
    use rust_decimal_macros::dec;

    fn usd_rate(value: Decimal) -> ResolvedRate {
        ResolvedRate {
            value,
            descriptor: RateDescriptor::fixed("USD buy", value, "TEST"),
        }
    }

    #[test]
    fn test_commission_tiers() {
        assert_eq!(employee_commission(dec!(10000), MeetingChannel::Office), dec!(80));
        assert_eq!(employee_commission(dec!(5000), MeetingChannel::Office), dec!(80));
        assert_eq!(employee_commission(dec!(4999.99), MeetingChannel::Office), dec!(50));
        assert_eq!(employee_commission(dec!(75000), MeetingChannel::Field), dec!(250));
        assert_eq!(employee_commission(dec!(20000), MeetingChannel::Regional), dec!(250));
    }

    #[test]
    fn test_commission_floor() {
        assert_eq!(employee_commission(dec!(0), MeetingChannel::Office), dec!(30));
        assert_eq!(employee_commission(dec!(0), MeetingChannel::Field), dec!(50));
        assert_eq!(employee_commission(dec!(999), MeetingChannel::Regional), dec!(100));

        for channel in MeetingChannel::ALL {
            assert!(minimum_commission(channel) > Decimal::ZERO);
        }
    }

    #[test]
    fn test_deduct_commission() {
        let mut trace = Trace::enabled();
        let (remaining, breakdown) = deduct_commission(
            dec!(1000000),
            dec!(10000),
            MeetingChannel::Office,
            &usd_rate(dec!(80)),
            &EngineConfig::default(),
            &mut trace,
        )
        .unwrap();

        assert_eq!(remaining, dec!(992000));
        assert_eq!(breakdown.total_usd, dec!(100));
        assert_eq!(breakdown.total_home, dec!(8000));
        assert_eq!(trace.into_steps().len(), 1);
    }

    #[test]
    fn test_deduct_commission_insufficient() {
        let err = deduct_commission(
            dec!(3000),
            dec!(30),
            MeetingChannel::Office,
            &usd_rate(dec!(80)),
            &EngineConfig::default(),
            &mut Trace::disabled(),
        )
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::InsufficientAmount);
        assert!(err.mentions("4000"));
    }
}
