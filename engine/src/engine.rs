//! Calculation entrypoint.

use corridor_common::RatesSnapshot;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use crate::config::EngineConfig;
use crate::error::{CalcResult, ErrorKind, Issues};
use crate::input::{CalculatorInput, TransactionParams};
use crate::pipeline::PipelineOutcome;
use crate::purchase::run_purchase;
use crate::result::{CalculationResult, SolverReport};
use crate::sale::run_sale;
use crate::solver::solve;
use crate::trace::Trace;

/// Per-call options.
#[derive(Debug, Clone, Copy)]
pub struct CalculationOptions {
    /// Record the step-by-step trace in the result.
    pub trace: bool,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self { trace: true }
    }
}

/// The calculation engine.
///
/// Holds only configuration; every call works on the snapshot it is given.
#[derive(Debug, Clone, Default)]
pub struct Calculator {
    config: EngineConfig,
}

impl Calculator {
    /// Create a new calculator with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Run a calculation with the step trace enabled.
    pub fn calculate(
        &self,
        input: &CalculatorInput,
        snapshot: &RatesSnapshot,
    ) -> CalcResult<CalculationResult> {
        self.calculate_with(input, snapshot, CalculationOptions::default())
    }

    /// Run a calculation.
    ///
    /// In reverse mode the input amount is found by the solver first and the
    /// pipeline is then run once more at that amount.
    #[instrument(skip_all, fields(
        scenario = ?input.scenario(),
        country = %input.params().country,
        reverse = input.params().reverse_mode
    ))]
    pub fn calculate_with(
        &self,
        input: &CalculatorInput,
        snapshot: &RatesSnapshot,
        options: CalculationOptions,
    ) -> CalcResult<CalculationResult> {
        let params = input.params();
        let requested = validate(params)?;

        let (input_amount, solver) = if params.reverse_mode {
            let solution = solve(requested, &self.config.solver, |guess| {
                run_forward(input, guess, snapshot, &self.config, Trace::disabled())
                    .map(|outcome| outcome.output_amount)
            })?;
            let report = SolverReport {
                target_amount: requested,
                iterations: solution.iterations,
                converged: solution.converged,
            };
            (solution.amount, Some(report))
        } else {
            (requested, None)
        };

        let mut outcome = run_forward(
            input,
            input_amount,
            snapshot,
            &self.config,
            Trace::new(options.trace),
        )?;

        if let Some(report) = solver.as_ref().filter(|report| !report.converged) {
            outcome.warnings.push(format!(
                "Reverse calculation did not converge after {} iterations; amounts are approximate",
                report.iterations
            ));
        }
        for warning in &outcome.warnings {
            warn!(warning = %warning, "Calculation warning");
        }

        let input_currency = input.input_currency();
        let output_currency = input.output_currency();
        let result = CalculationResult {
            scenario: input.scenario(),
            country: params.country.clone(),
            meeting_channel: params.meeting_channel,
            input_amount: input_currency.round(input_amount),
            output_amount: output_currency.round(outcome.output_amount),
            input_currency,
            output_currency,
            reverse_mode: params.reverse_mode,
            steps: outcome.steps,
            commission: outcome.commission,
            expenses: outcome.expenses,
            margin_tier: outcome.profit.tier,
            profit_coefficient: outcome.profit.coefficient,
            profit_mode: outcome.profit.mode,
            margin: outcome.margin,
            warnings: outcome.warnings,
            fintech_timestamp: snapshot.fintech_timestamp,
            cbr_rub_per_eur: snapshot.central_bank.positive(),
            rub_per_eur_calc: outcome.rub_per_eur_calc,
            solver,
        };

        info!(
            input_amount = %result.input_amount,
            input_currency = %result.input_currency,
            output_amount = %result.output_amount,
            output_currency = %result.output_currency,
            "Calculation completed"
        );

        Ok(result)
    }
}

/// Run a calculation with the default configuration.
pub fn calculate(
    input: &CalculatorInput,
    snapshot: &RatesSnapshot,
) -> CalcResult<CalculationResult> {
    Calculator::default().calculate(input, snapshot)
}

/// Check request fields and return the amount to start from.
///
/// That is the target in reverse mode and the input amount otherwise.
fn validate(params: &TransactionParams) -> CalcResult<Decimal> {
    let mut issues = Issues::new();

    if params.expenses_home < Decimal::ZERO {
        issues.push("Courier expense cannot be negative");
    }

    let requested = if params.reverse_mode {
        match params.target_amount {
            Some(target) if target > Decimal::ZERO => Some(target),
            _ => {
                issues.push("Reverse mode requires a positive target amount");
                None
            }
        }
    } else {
        match params.amount {
            Some(amount) if amount >= Decimal::ZERO => Some(amount),
            Some(_) => {
                issues.push("Amount cannot be negative");
                None
            }
            None => {
                issues.push("Amount is required");
                None
            }
        }
    };

    issues.settle_as(ErrorKind::InvalidInput, requested)
}

fn run_forward(
    input: &CalculatorInput,
    amount: Decimal,
    snapshot: &RatesSnapshot,
    config: &EngineConfig,
    trace: Trace,
) -> CalcResult<PipelineOutcome> {
    match input {
        CalculatorInput::Sale(sale) => run_sale(sale, amount, snapshot, config, trace),
        CalculatorInput::Purchase(purchase) => {
            run_purchase(purchase, amount, snapshot, config, trace)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{
        ForeignCurrency, HomeCurrency, MeetingChannel, ProfitConfig, ProfitMode, Scenario,
    };
    use crate::testing::demo_snapshot;
    use corridor_common::{Currency, RateValue};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn office() -> TransactionParams {
        TransactionParams::new("serbia", MeetingChannel::Office)
    }

    fn sale_rub_eur(params: TransactionParams) -> CalculatorInput {
        CalculatorInput::sale(HomeCurrency::Rub, ForeignCurrency::Eur, params)
    }

    fn relative_error(actual: Decimal, expected: Decimal) -> Decimal {
        ((actual - expected) / expected).abs()
    }

    #[test]
    fn test_reference_sale() {
        let input = sale_rub_eur(office().amount(dec!(1000000)));

        let result = calculate(&input, &demo_snapshot()).unwrap();

        assert_eq!(result.scenario, Scenario::Sale);
        assert_eq!(result.output_amount, dec!(8530.27));
        assert_eq!(result.input_amount, dec!(1000000));
        assert_eq!(result.input_currency, Currency::rub());
        assert_eq!(result.output_currency, Currency::eur());
        assert_eq!(result.profit_mode, ProfitMode::Tier);
        assert_eq!(result.profit_coefficient, dec!(0.98));
        assert_eq!(result.margin_tier.as_ref().unwrap().min, dec!(5000));
        assert_eq!(result.commission.total_usd, dec!(100));
        assert_eq!(result.cbr_rub_per_eur, Some(dec!(100)));
        assert!(result.fintech_timestamp.is_some());
        assert!(result.solver.is_none());
        assert!(!result.steps.is_empty());
    }

    #[test]
    fn test_trace_toggle_keeps_output() {
        let input = sale_rub_eur(office().amount(dec!(250000)));
        let snapshot = demo_snapshot();
        let calculator = Calculator::default();

        let traced = calculator
            .calculate_with(&input, &snapshot, CalculationOptions { trace: true })
            .unwrap();
        let untraced = calculator
            .calculate_with(&input, &snapshot, CalculationOptions { trace: false })
            .unwrap();

        assert_eq!(traced.output_amount, untraced.output_amount);
        assert!(untraced.steps.is_empty());
        assert!(!traced.steps.is_empty());
    }

    #[test]
    fn test_reverse_sale_round_trip() {
        let snapshot = demo_snapshot();
        let forward = calculate(&sale_rub_eur(office().amount(dec!(1000000))), &snapshot).unwrap();

        let reverse =
            calculate(&sale_rub_eur(office().target(forward.output_amount)), &snapshot).unwrap();

        assert!(reverse.reverse_mode);
        assert!(relative_error(reverse.input_amount, dec!(1000000)) < dec!(0.0001));
        assert!(relative_error(reverse.output_amount, forward.output_amount) < dec!(0.0001));
        let report = reverse.solver.unwrap();
        assert!(report.converged);
        assert!(report.iterations <= 20);
        assert!(!reverse.steps.is_empty());
    }

    #[test]
    fn test_reverse_purchase_round_trip() {
        let snapshot = demo_snapshot();
        let purchase = |params| {
            CalculatorInput::purchase(ForeignCurrency::Rsd, HomeCurrency::UsdWhite, params)
        };
        let params = TransactionParams::new("serbia", MeetingChannel::Field);

        let forward_input = purchase(params.clone().amount(dec!(2000000)));
        let forward = calculate(&forward_input, &snapshot).unwrap();
        let reverse_input = purchase(params.target(forward.output_amount));
        let reverse = calculate(&reverse_input, &snapshot).unwrap();

        assert!(relative_error(reverse.input_amount, dec!(2000000)) < dec!(0.0001));
    }

    #[test]
    fn test_reverse_requires_positive_target() {
        let mut params = office().target(dec!(0));
        let err = calculate(&sale_rub_eur(params.clone()), &demo_snapshot()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);

        params.target_amount = None;
        let err = calculate(&sale_rub_eur(params), &demo_snapshot()).unwrap_err();
        assert!(err.mentions("positive target amount"));
    }

    #[test]
    fn test_forward_requires_amount() {
        let err = calculate(&sale_rub_eur(office()), &demo_snapshot()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert!(err.mentions("Amount is required"));

        let params = office().amount(dec!(1000)).expenses(dec!(-1));
        let err = calculate(&sale_rub_eur(params), &demo_snapshot()).unwrap_err();
        assert!(err.mentions("Courier expense"));
    }

    #[test]
    fn test_reverse_seed_below_commission_fails() {
        let params = TransactionParams::new("serbia", MeetingChannel::Regional).target(dec!(5000));

        let err = calculate(&sale_rub_eur(params), &demo_snapshot()).unwrap_err();

        assert_eq!(err.kind, ErrorKind::InsufficientAmount);
        assert!(err.mentions("9600 RUB"));
    }

    #[test]
    fn test_amount_beyond_decimal_range_is_rejected() {
        let huge = Decimal::from_i128_with_scale(10i128.pow(27), 0);

        let sale = CalculatorInput::sale(
            HomeCurrency::UsdWhite,
            ForeignCurrency::Eur,
            office().amount(huge),
        );
        let err = calculate(&sale, &demo_snapshot()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
        assert!(err.mentions("out of range"));

        let purchase = CalculatorInput::purchase(
            ForeignCurrency::Eur,
            HomeCurrency::Rub,
            office().amount(huge),
        );
        let err = calculate(&purchase, &demo_snapshot()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn test_missing_rate_reported_with_label() {
        let mut snapshot = demo_snapshot();
        snapshot.crypto_exchange.rate = RateValue::missing("p2p");

        let err = calculate(&sale_rub_eur(office().amount(dec!(1000000))), &snapshot).unwrap_err();

        assert_eq!(err.kind, ErrorKind::MissingRates);
        assert!(err.mentions("Crypto exchange rate"));
    }

    #[test]
    fn test_missing_rates_batched_at_checkpoint() {
        let mut snapshot = demo_snapshot();
        snapshot.central_bank = RateValue::missing("cbr");
        snapshot.home_exchange.buy.usd_white = RateValue::quoted(dec!(0), "exchange");

        let err = calculate(&sale_rub_eur(office().amount(dec!(1000000))), &snapshot).unwrap_err();

        assert_eq!(err.issues.len(), 2);
        assert!(err.mentions("Central bank RUB/EUR rate"));
        assert!(err.mentions("Home exchange USD buy rate"));
    }

    #[test]
    fn test_custom_coefficient_out_of_range() {
        let params = office()
            .amount(dec!(1000000))
            .profit(ProfitConfig::Custom { coefficient: dec!(1.5) });

        let err = calculate(&sale_rub_eur(params), &demo_snapshot()).unwrap_err();

        assert_eq!(err.kind, ErrorKind::InvalidCoefficient);
    }

    #[test]
    fn test_purchase_reference_rates() {
        let input = CalculatorInput::purchase(
            ForeignCurrency::Eur,
            HomeCurrency::Rub,
            office().amount(dec!(10000)),
        );

        let result = calculate(&input, &demo_snapshot()).unwrap();

        assert_eq!(result.scenario, Scenario::Purchase);
        assert!(result.rub_per_eur_calc.is_some());
        assert_eq!(result.cbr_rub_per_eur, Some(dec!(100)));
    }

    #[test]
    fn test_non_converging_solver_warns() {
        let mut config = EngineConfig::default();
        config.solver.max_iterations = 1;
        let calculator = Calculator::new(config);
        let input = sale_rub_eur(office().target(dec!(8000)));

        let result = calculator.calculate(&input, &demo_snapshot()).unwrap();

        assert!(!result.solver.unwrap().converged);
        assert!(result.warnings.iter().any(|w| w.contains("did not converge")));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        // Amounts stay inside one commission and one margin tier
        #[test]
        fn prop_sale_round_trip(amount in 600_000u64..1_900_000) {
            let snapshot = demo_snapshot();
            let amount = Decimal::from(amount);
            let forward = calculate(&sale_rub_eur(office().amount(amount)), &snapshot).unwrap();
            let target = sale_rub_eur(office().target(forward.output_amount));
            let reverse = calculate(&target, &snapshot).unwrap();
            prop_assert!(relative_error(reverse.input_amount, amount) < dec!(0.0001));
        }
    }
}
