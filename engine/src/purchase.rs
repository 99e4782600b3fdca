//! Purchase pipeline: money enters abroad, value leaves at home.

use corridor_common::{Currency, Money, RatesSnapshot};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::commission::deduct_commission;
use crate::config::EngineConfig;
use crate::error::{CalcResult, ErrorKind, Issues};
use crate::input::{ForeignCurrency, HomeCurrency, PurchaseInput};
use crate::margin::select_profit;
use crate::pipeline::{
    crypto_leg, deduct_expenses, effective_settlement_rate, product, quotient, resolve_single,
    PipelineOutcome,
};
use crate::rates::{
    cash_quote, cash_quote_label, resolve_described, usd_buy_quote, BookSide, ResolvedRate,
    CROSS_RATE_LABEL, USD_BUY_LABEL,
};
use crate::result::MarginSummary;
use crate::trace::{CalculationStep, RateDescriptor, Trace};

/// Run the purchase pipeline for `amount` units of the input currency.
#[instrument(level = "debug", skip_all, fields(amount = %amount, traced = trace.is_enabled()))]
pub fn run_purchase(
    input: &PurchaseInput,
    amount: Decimal,
    snapshot: &RatesSnapshot,
    config: &EngineConfig,
    mut trace: Trace,
) -> CalcResult<PipelineOutcome> {
    let params = &input.params;
    let output_currency = input.output_currency;
    let output_code = output_currency.currency();
    let mut warnings = Vec::new();

    trace.record(|| CalculationStep::new("Input", amount, input.input_currency.currency()));

    // 1. Fixed cross-rate to EUR
    let amount_eur = match input.input_currency {
        ForeignCurrency::Eur => amount,
        ForeignCurrency::Rsd => {
            let mut issues = Issues::new();
            let cross = resolve_described(
                Some(&snapshot.cross_rates.rsd_per_eur),
                CROSS_RATE_LABEL,
                &mut issues,
            );
            let cross = issues.settle_as(ErrorKind::MissingCrossRate, cross)?;
            let converted = quotient(amount, cross.value)?;
            trace.record(|| {
                CalculationStep::new("Converted to EUR", converted, Currency::eur())
                    .with_rate(cross.descriptor.clone())
                    .with_formula(format!("{} RSD / {}", amount, cross.value))
            });
            converted
        }
    };

    // 2. EUR to settlement asset
    let settlement = effective_settlement_rate(params, snapshot, &mut warnings)?;
    let asset = quotient(amount_eur, settlement.value)?;
    trace.record(|| {
        CalculationStep::new("Settlement asset", asset, Currency::usdt())
            .with_rate(settlement.descriptor.clone())
            .with_formula(format!(
                "{} / {}",
                Currency::eur().round(amount_eur),
                settlement.value
            ))
    });

    // 3. Settlement asset to home currency
    let crypto = crypto_leg(snapshot)?;
    let amount_home = product(product(asset, crypto.rate.value)?, crypto.multiplier)?;
    trace.record(|| {
        CalculationStep::new("Received at home", amount_home, Currency::rub())
            .with_rate(crypto.rate.descriptor.clone())
            .with_formula(format!(
                "{} × {} × {}",
                Currency::usdt().round(asset),
                crypto.rate.value,
                crypto.multiplier
            ))
    });

    // 4. Handler commission, sized by the EUR amount
    let usd_buy = resolve_single(Some(usd_buy_quote(snapshot)), USD_BUY_LABEL)?;
    let (amount_home, commission) = deduct_commission(
        amount_home,
        amount_eur,
        params.meeting_channel,
        &usd_buy,
        config,
        &mut trace,
    )?;

    // 5. Home currency to output currency
    let sell = sell_rate(snapshot, output_currency)?;
    let amount_out = match &sell {
        None => amount_home,
        Some(sell) => {
            let converted = quotient(amount_home, sell.value)?;
            trace.record(|| {
                let label = format!("Converted to {}", output_code);
                CalculationStep::new(label, converted, output_code.clone())
                    .with_rate(sell.descriptor.clone())
                    .with_formula(format!(
                        "{} / {}",
                        Currency::rub().round(amount_home),
                        sell.value
                    ))
            });
            converted
        }
    };

    // 6. Margin, sized by the EUR amount
    let profit = select_profit(&params.profit, amount_eur, &snapshot.margin_tiers, config)?;
    let after_margin = product(amount_out, profit.coefficient)?;
    trace.record(|| {
        CalculationStep::new("After margin", after_margin, output_code.clone())
            .with_rate(RateDescriptor::fixed(
                "Profit coefficient",
                profit.coefficient,
                profit.mode.to_string(),
            ))
            .with_formula(format!(
                "{} × {}",
                output_code.round(amount_out),
                profit.coefficient
            ))
    });
    let margin = MarginSummary {
        before: Money::new(amount_out, output_code.clone()),
        after: Money::new(after_margin, output_code.clone()),
    };

    // 7. Courier expense
    let (output_amount, expenses) =
        deduct_expenses(after_margin, &output_code, params, |expense_home| match &sell {
            None => Ok(expense_home),
            Some(sell) => quotient(expense_home, sell.value),
        })?;
    if expenses.applied {
        trace.record(|| {
            CalculationStep::new("After courier expense", output_amount, output_code.clone())
                .with_formula(format!(
                    "{} − {}",
                    output_code.round(after_margin),
                    expenses.deducted
                ))
        });
    }

    let rub_per_eur_calc = match (input.input_currency, output_currency) {
        (ForeignCurrency::Eur, HomeCurrency::Rub) => output_amount.checked_div(amount),
        _ => None,
    };

    debug!(output_amount = %output_amount, "Purchase pipeline finished");

    Ok(PipelineOutcome {
        output_amount,
        commission,
        expenses,
        profit,
        margin,
        warnings,
        steps: trace.into_steps(),
        rub_per_eur_calc,
    })
}

/// Home-exchange sell rate for the output currency; `None` for RUB.
fn sell_rate(snapshot: &RatesSnapshot, currency: HomeCurrency) -> CalcResult<Option<ResolvedRate>> {
    if currency.is_home() {
        return Ok(None);
    }
    let label = cash_quote_label(BookSide::Sell, currency);
    resolve_single(cash_quote(snapshot, BookSide::Sell, currency), &label).map(Some)
}
