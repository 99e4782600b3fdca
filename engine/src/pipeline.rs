//! Stages shared by the sale and purchase pipelines.

use corridor_common::{Currency, Money, RateValue, RatesSnapshot};
use rust_decimal::Decimal;

use crate::commission::CommissionBreakdown;
use crate::error::{CalcResult, CalculationError, Issues};
use crate::input::{MeetingChannel, TransactionParams};
use crate::margin::ProfitSelection;
use crate::rates::{
    coefficient_label, resolve_described, ResolvedRate, CRYPTO_MULTIPLIER_LABEL,
    CRYPTO_RATE_LABEL, INTERNATIONAL_LABEL, MANUAL_RATE_LABEL,
};
use crate::result::{ExpenseBreakdown, MarginSummary};
use crate::trace::{CalculationStep, RateDescriptor};

/// What a forward pipeline produces before the result envelope is built.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Unrounded output amount.
    pub output_amount: Decimal,
    pub commission: CommissionBreakdown,
    pub expenses: ExpenseBreakdown,
    pub profit: ProfitSelection,
    pub margin: MarginSummary,
    pub warnings: Vec<String>,
    pub steps: Vec<CalculationStep>,
    pub rub_per_eur_calc: Option<Decimal>,
}

/// `a × b`, failing instead of overflowing.
pub(crate) fn product(a: Decimal, b: Decimal) -> CalcResult<Decimal> {
    a.checked_mul(b).ok_or_else(|| out_of_range(a, '×', b))
}

/// `a / b`, failing instead of overflowing.
pub(crate) fn quotient(a: Decimal, b: Decimal) -> CalcResult<Decimal> {
    a.checked_div(b).ok_or_else(|| out_of_range(a, '/', b))
}

fn out_of_range(a: Decimal, op: char, b: Decimal) -> CalculationError {
    CalculationError::invalid_input(format!("Amount out of range: {} {} {} overflows", a, op, b))
}

/// EUR per unit of settlement asset for the transaction's country.
///
/// A manual rate from the caller replaces the market rate and adds a warning.
pub(crate) fn effective_settlement_rate(
    params: &TransactionParams,
    snapshot: &RatesSnapshot,
    warnings: &mut Vec<String>,
) -> CalcResult<ResolvedRate> {
    let mut issues = Issues::new();

    if let Some(manual) = params.manual_settlement_rate {
        if manual <= Decimal::ZERO {
            issues.push(MANUAL_RATE_LABEL);
        }
        issues.check()?;
        warnings.push(format!(
            "Manual settlement rate {} used instead of the market rate",
            manual
        ));
        return Ok(ResolvedRate {
            value: manual,
            descriptor: RateDescriptor::manual(MANUAL_RATE_LABEL, manual),
        });
    }

    let country_label = coefficient_label(&params.country);
    let international = resolve_described(
        Some(&snapshot.international),
        INTERNATIONAL_LABEL,
        &mut issues,
    );
    let coefficient = resolve_described(
        snapshot.settlement_coefficient(&params.country),
        &country_label,
        &mut issues,
    );
    let (international, coefficient) = issues.settle(international.zip(coefficient))?;

    let value = product(international.value, coefficient.value)?;
    let descriptor = RateDescriptor {
        label: format!("{} × {}", INTERNATIONAL_LABEL, country_label),
        value,
        source: format!(
            "{} × {}",
            international.descriptor.source, coefficient.descriptor.source
        ),
        is_override: international.descriptor.is_override || coefficient.descriptor.is_override,
        fallback_used: international.descriptor.fallback_used
            || coefficient.descriptor.fallback_used,
    };

    Ok(ResolvedRate { value, descriptor })
}

/// Crypto-exchange rate and its fee multiplier.
pub(crate) struct CryptoLeg {
    pub rate: ResolvedRate,
    pub multiplier: Decimal,
}

pub(crate) fn crypto_leg(snapshot: &RatesSnapshot) -> CalcResult<CryptoLeg> {
    let mut issues = Issues::new();
    let rate = resolve_described(
        Some(&snapshot.crypto_exchange.rate),
        CRYPTO_RATE_LABEL,
        &mut issues,
    );
    let multiplier = snapshot.crypto_exchange.fee_multiplier;
    if multiplier <= Decimal::ZERO {
        issues.push(CRYPTO_MULTIPLIER_LABEL);
    }
    let rate = issues.settle(rate)?;
    Ok(CryptoLeg { rate, multiplier })
}

/// Subtract the courier expense for regional meetings, clamped at zero.
///
/// `to_output` converts the home-currency expense into `currency`.
pub(crate) fn deduct_expenses(
    amount: Decimal,
    currency: &Currency,
    params: &TransactionParams,
    to_output: impl FnOnce(Decimal) -> CalcResult<Decimal>,
) -> CalcResult<(Decimal, ExpenseBreakdown)> {
    let expense_home = params.expenses_home;
    if params.meeting_channel != MeetingChannel::Regional || expense_home <= Decimal::ZERO {
        return Ok((amount, ExpenseBreakdown::none(expense_home, currency.clone())));
    }

    let expense = to_output(expense_home)?;
    let remaining = (amount - expense).max(Decimal::ZERO);
    Ok((
        remaining,
        ExpenseBreakdown {
            applied: true,
            amount_home: expense_home,
            deducted: Money::new(expense, currency.clone()),
        },
    ))
}

/// Resolve a single snapshot rate at its own checkpoint.
pub(crate) fn resolve_single(rate: Option<&RateValue>, label: &str) -> CalcResult<ResolvedRate> {
    let mut issues = Issues::new();
    let resolved = resolve_described(rate, label, &mut issues);
    issues.settle(resolved)
}
