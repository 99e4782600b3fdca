//! Calculation result envelope.

use chrono::{DateTime, Utc};
use corridor_common::{Country, Currency, MarginTier, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::commission::CommissionBreakdown;
use crate::input::{MeetingChannel, ProfitMode, Scenario};
use crate::trace::CalculationStep;

/// Courier expense applied to a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseBreakdown {
    /// Whether the expense was deducted at all.
    pub applied: bool,
    /// Expense as supplied, in home currency.
    pub amount_home: Decimal,
    /// Expense in the currency it was deducted from.
    pub deducted: Money,
}

impl ExpenseBreakdown {
    pub fn none(amount_home: Decimal, currency: Currency) -> Self {
        Self {
            applied: false,
            amount_home,
            deducted: Money::zero(currency),
        }
    }
}

/// Amount before and after the profit coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginSummary {
    pub before: Money,
    pub after: Money,
}

/// How the reverse solver got to the input amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverReport {
    pub target_amount: Decimal,
    pub iterations: usize,
    pub converged: bool,
}

/// Full response of one calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResult {
    pub scenario: Scenario,
    pub country: Country,
    pub meeting_channel: MeetingChannel,
    pub input_currency: Currency,
    pub output_currency: Currency,
    pub input_amount: Decimal,
    pub output_amount: Decimal,
    pub reverse_mode: bool,
    pub steps: Vec<CalculationStep>,
    pub commission: CommissionBreakdown,
    pub expenses: ExpenseBreakdown,
    pub margin_tier: Option<MarginTier>,
    pub profit_coefficient: Decimal,
    pub profit_mode: ProfitMode,
    pub margin: MarginSummary,
    pub warnings: Vec<String>,
    pub fintech_timestamp: Option<DateTime<Utc>>,
    pub cbr_rub_per_eur: Option<Decimal>,
    /// Effective RUB per EUR, only for EUR-in / RUB-out purchases.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rub_per_eur_calc: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solver: Option<SolverReport>,
}
