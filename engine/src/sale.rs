//! Sale pipeline: money enters at home, value leaves abroad.

use corridor_common::{Currency, Money, RateValue, RatesSnapshot};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use crate::commission::{deduct_commission, minimum_commission, record_basis};
use crate::config::EngineConfig;
use crate::error::{CalcResult, ErrorKind, Issues};
use crate::input::{ForeignCurrency, HomeCurrency, SaleInput};
use crate::margin::select_profit;
use crate::pipeline::{
    crypto_leg, deduct_expenses, effective_settlement_rate, product, quotient, resolve_single,
    PipelineOutcome,
};
use crate::rates::{
    cash_quote, cash_quote_label, resolve_described, usd_buy_quote, BookSide, CENTRAL_BANK_LABEL,
    CROSS_RATE_LABEL, USD_BUY_LABEL,
};
use crate::result::MarginSummary;
use crate::trace::{CalculationStep, RateDescriptor, Trace};

/// Run the sale pipeline for `amount` units of the input currency.
#[instrument(level = "debug", skip_all, fields(amount = %amount, traced = trace.is_enabled()))]
pub fn run_sale(
    input: &SaleInput,
    amount: Decimal,
    snapshot: &RatesSnapshot,
    config: &EngineConfig,
    mut trace: Trace,
) -> CalcResult<PipelineOutcome> {
    let params = &input.params;
    let input_currency = input.input_currency;
    let mut warnings = Vec::new();

    if let Some(warning) = commission_shortfall_warning(input, amount, snapshot, config) {
        warnings.push(warning);
    }

    trace.record(|| CalculationStep::new("Input", amount, input_currency.currency()));

    // 1. Local conversion to home currency
    let amount_home = if input_currency.is_home() {
        amount
    } else {
        let label = cash_quote_label(BookSide::Buy, input_currency);
        let buy = resolve_single(cash_quote(snapshot, BookSide::Buy, input_currency), &label)?;
        let converted = product(amount, buy.value)?;
        trace.record(|| {
            CalculationStep::new("Converted to RUB", converted, Currency::rub())
                .with_rate(buy.descriptor.clone())
                .with_formula(format!("{} {} × {}", amount, input_currency, buy.value))
        });
        converted
    };

    // 2. Commission basis
    let mut issues = Issues::new();
    let central_bank =
        resolve_described(Some(&snapshot.central_bank), CENTRAL_BANK_LABEL, &mut issues);
    let usd_buy = resolve_described(Some(usd_buy_quote(snapshot)), USD_BUY_LABEL, &mut issues);
    let (central_bank, usd_buy) = issues.settle(central_bank.zip(usd_buy))?;

    let basis_eur = quotient(amount_home, central_bank.value)?;
    record_basis(&mut trace, amount_home, basis_eur, &central_bank);

    // 3. Handler commission
    let (amount_home, commission) = deduct_commission(
        amount_home,
        basis_eur,
        params.meeting_channel,
        &usd_buy,
        config,
        &mut trace,
    )?;

    // 4. Courier expense
    let (amount_home, expenses) = deduct_expenses(amount_home, &Currency::rub(), params, Ok)?;
    if expenses.applied {
        trace.record(|| {
            CalculationStep::new("After courier expense", amount_home, Currency::rub())
                .with_formula(format!("− {} RUB", expenses.amount_home))
        });
    }

    // 5. Home currency to settlement asset
    let crypto = crypto_leg(snapshot)?;
    let asset = product(quotient(amount_home, crypto.rate.value)?, crypto.multiplier)?;
    trace.record(|| {
        CalculationStep::new("Settlement asset", asset, Currency::usdt())
            .with_rate(crypto.rate.descriptor.clone())
            .with_formula(format!(
                "{} / {} × {}",
                Currency::rub().round(amount_home),
                crypto.rate.value,
                crypto.multiplier
            ))
    });

    // 6. Settlement asset to EUR
    let settlement = effective_settlement_rate(params, snapshot, &mut warnings)?;
    let amount_eur = product(asset, settlement.value)?;
    trace.record(|| {
        CalculationStep::new("Received abroad before margin", amount_eur, Currency::eur())
            .with_rate(settlement.descriptor.clone())
            .with_formula(format!("{} × {}", Currency::usdt().round(asset), settlement.value))
    });

    // 7. Margin
    let profit = select_profit(&params.profit, amount_eur, &snapshot.margin_tiers, config)?;
    let after_margin = product(amount_eur, profit.coefficient)?;
    trace.record(|| {
        CalculationStep::new("After margin", after_margin, Currency::eur())
            .with_rate(RateDescriptor::fixed(
                "Profit coefficient",
                profit.coefficient,
                profit.mode.to_string(),
            ))
            .with_formula(format!(
                "{} × {}",
                Currency::eur().round(amount_eur),
                profit.coefficient
            ))
    });
    let margin = MarginSummary {
        before: Money::new(amount_eur, Currency::eur()),
        after: Money::new(after_margin, Currency::eur()),
    };

    // 8. Fixed cross-rate
    let output_amount = match input.output_currency {
        ForeignCurrency::Eur => after_margin,
        ForeignCurrency::Rsd => {
            let mut issues = Issues::new();
            let cross = resolve_described(
                Some(&snapshot.cross_rates.rsd_per_eur),
                CROSS_RATE_LABEL,
                &mut issues,
            );
            let cross = issues.settle_as(ErrorKind::MissingCrossRate, cross)?;
            let converted = product(after_margin, cross.value)?;
            trace.record(|| {
                CalculationStep::new("Converted to RSD", converted, Currency::rsd())
                    .with_rate(cross.descriptor.clone())
                    .with_formula(format!(
                        "{} × {}",
                        Currency::eur().round(after_margin),
                        cross.value
                    ))
            });
            converted
        }
    };

    debug!(output_amount = %output_amount, "Sale pipeline finished");

    Ok(PipelineOutcome {
        output_amount,
        commission,
        expenses,
        profit,
        margin,
        warnings,
        steps: trace.into_steps(),
        rub_per_eur_calc: None,
    })
}

/// Warn when the input looks too small to cover the cheapest commission.
///
/// Uses its own rate fallbacks (buy, then sell, then central bank or the
/// configured USD rate) and never fails.
fn commission_shortfall_warning(
    input: &SaleInput,
    amount: Decimal,
    snapshot: &RatesSnapshot,
    config: &EngineConfig,
) -> Option<String> {
    let usd_rate = usd_buy_quote(snapshot)
        .positive()
        .or_else(|| snapshot.home_exchange.sell.usd_white.positive())
        .unwrap_or(config.warning_fallback_usd_rate);

    let estimated_home = match input.input_currency {
        HomeCurrency::Rub => amount,
        currency => {
            let rate = cash_quote(snapshot, BookSide::Buy, currency)
                .and_then(RateValue::positive)
                .or_else(|| {
                    cash_quote(snapshot, BookSide::Sell, currency).and_then(RateValue::positive)
                })
                .or_else(|| match currency {
                    HomeCurrency::Eur => snapshot.central_bank.positive(),
                    _ => Some(usd_rate),
                })?;
            amount.checked_mul(rate)?
        }
    };

    let minimum_home = (config.base_commission_usd
        + minimum_commission(input.params.meeting_channel))
    .checked_mul(usd_rate)?;

    (estimated_home < minimum_home).then(|| {
        format!(
            "Amount of about {} RUB may not cover the minimum handler commission of {} RUB",
            Currency::rub().round(estimated_home),
            Currency::rub().round(minimum_home)
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{MeetingChannel, ProfitConfig, TransactionParams};
    use crate::testing::demo_snapshot;
    use rust_decimal_macros::dec;

    fn sale(
        input_currency: HomeCurrency,
        output: ForeignCurrency,
        params: TransactionParams,
    ) -> SaleInput {
        SaleInput {
            input_currency,
            output_currency: output,
            params,
        }
    }

    fn office() -> TransactionParams {
        TransactionParams::new("serbia", MeetingChannel::Office)
    }

    fn run(input: &SaleInput, amount: Decimal) -> CalcResult<PipelineOutcome> {
        run_sale(input, amount, &demo_snapshot(), &EngineConfig::default(), Trace::enabled())
    }

    #[test]
    fn test_reference_scenario() {
        let input = sale(HomeCurrency::Rub, ForeignCurrency::Eur, office());

        let outcome = run(&input, dec!(1000000)).unwrap();

        assert_eq!(outcome.commission.basis_eur, dec!(10000));
        assert_eq!(outcome.commission.total_usd, dec!(100));
        assert_eq!(outcome.commission.total_home, dec!(8000));
        assert_eq!(outcome.margin.before.value.round_dp(4), dec!(8704.3536));
        assert_eq!(outcome.profit.coefficient, dec!(0.98));
        assert_eq!(outcome.profit.tier.as_ref().unwrap().min, dec!(5000));
        assert_eq!(outcome.output_amount.round_dp(2), dec!(8530.27));
        assert!(outcome.warnings.is_empty());
        assert!(!outcome.expenses.applied);
    }

    #[test]
    fn test_trace_covers_each_stage() {
        let input = sale(HomeCurrency::Eur, ForeignCurrency::Rsd, office());

        let outcome = run(&input, dec!(5000)).unwrap();

        let labels: Vec<&str> = outcome.steps.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Input",
                "Converted to RUB",
                "Commission basis",
                "After handler commission",
                "Settlement asset",
                "Received abroad before margin",
                "After margin",
                "Converted to RSD",
            ]
        );
        assert_eq!(outcome.steps[1].amount, dec!(475000));
        assert_eq!(outcome.steps.last().unwrap().currency, Currency::rsd());
    }

    #[test]
    fn test_tracing_does_not_change_output() {
        let input = sale(HomeCurrency::UsdBlue, ForeignCurrency::Eur, office());
        let snapshot = demo_snapshot();
        let config = EngineConfig::default();

        let traced = run_sale(&input, dec!(4000), &snapshot, &config, Trace::enabled()).unwrap();
        let untraced = run_sale(&input, dec!(4000), &snapshot, &config, Trace::disabled()).unwrap();

        assert_eq!(traced.output_amount, untraced.output_amount);
        assert!(!traced.steps.is_empty());
        assert!(untraced.steps.is_empty());
    }

    #[test]
    fn test_regional_expense_deducted() {
        let params =
            TransactionParams::new("serbia", MeetingChannel::Regional).expenses(dec!(10000));
        let input = sale(HomeCurrency::Rub, ForeignCurrency::Eur, params);
        let with_expense = run(&input, dec!(1000000)).unwrap();
        let params = TransactionParams::new("serbia", MeetingChannel::Regional);
        let input = sale(HomeCurrency::Rub, ForeignCurrency::Eur, params);
        let without = run(&input, dec!(1000000)).unwrap();

        assert!(with_expense.expenses.applied);
        assert!(with_expense.output_amount < without.output_amount);
    }

    #[test]
    fn test_missing_input_rate() {
        let mut snapshot = demo_snapshot();
        snapshot.home_exchange.buy.usd_white = RateValue::missing("exchange");
        let input = sale(HomeCurrency::UsdWhite, ForeignCurrency::Eur, office());

        let err = run_sale(
            &input,
            dec!(1000),
            &snapshot,
            &EngineConfig::default(),
            Trace::disabled(),
        )
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::MissingRates);
        assert!(err.mentions("Home exchange USD_WHITE buy rate"));
    }

    #[test]
    fn test_missing_cross_rate() {
        let mut snapshot = demo_snapshot();
        snapshot.cross_rates.rsd_per_eur = RateValue::missing("config");
        let input = sale(HomeCurrency::Rub, ForeignCurrency::Rsd, office());

        let err = run_sale(
            &input,
            dec!(1000000),
            &snapshot,
            &EngineConfig::default(),
            Trace::disabled(),
        )
        .unwrap_err();

        assert_eq!(err.kind, ErrorKind::MissingCrossRate);
        assert!(err.mentions(CROSS_RATE_LABEL));
    }

    #[test]
    fn test_insufficient_amount() {
        let input = sale(HomeCurrency::Rub, ForeignCurrency::Eur, office());

        let err = run(&input, dec!(3000)).unwrap_err();

        assert_eq!(err.kind, ErrorKind::InsufficientAmount);
    }

    #[test]
    fn test_small_amount_warning() {
        let input = sale(HomeCurrency::Rub, ForeignCurrency::Eur, office());
        // Minimum commission is (20 + 30) USD × 80 = 4000 RUB
        let err = run(&input, dec!(3999)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InsufficientAmount);

        let snapshot = demo_snapshot();
        let warning =
            commission_shortfall_warning(&input, dec!(3999), &snapshot, &EngineConfig::default());
        assert!(warning.unwrap().contains("4000"));
        assert!(
            commission_shortfall_warning(&input, dec!(4000), &snapshot, &EngineConfig::default())
                .is_none()
        );
    }

    #[test]
    fn test_warning_uses_fallback_rates() {
        let mut snapshot = demo_snapshot();
        snapshot.home_exchange.buy.eur = RateValue::missing("exchange");
        snapshot.home_exchange.sell.eur = RateValue::missing("exchange");
        let input = sale(HomeCurrency::Eur, ForeignCurrency::Eur, office());

        // Central bank rate of 100 values 30 EUR at 3000 RUB
        let warning =
            commission_shortfall_warning(&input, dec!(30), &snapshot, &EngineConfig::default());
        assert!(warning.unwrap().contains("3000"));
    }

    #[test]
    fn test_custom_coefficient_applied_verbatim() {
        let params = office().profit(ProfitConfig::Custom {
            coefficient: dec!(0.97),
        });
        let input = sale(HomeCurrency::Rub, ForeignCurrency::Eur, params);

        let outcome = run(&input, dec!(1000000)).unwrap();

        assert_eq!(outcome.profit.coefficient, dec!(0.97));
        assert_eq!(
            outcome.margin.after.value,
            outcome.margin.before.value * dec!(0.97)
        );
    }
}
