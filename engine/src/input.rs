//! Calculation request types.

use corridor_common::{Country, Currency};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currencies handled on the home side of the corridor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HomeCurrency {
    /// Home currency itself.
    Rub,
    /// EUR cash.
    Eur,
    /// Newly issued USD notes.
    UsdWhite,
    /// Older USD notes.
    UsdBlue,
}

impl HomeCurrency {
    pub fn currency(&self) -> Currency {
        match self {
            HomeCurrency::Rub => Currency::rub(),
            HomeCurrency::Eur => Currency::eur(),
            HomeCurrency::UsdWhite => Currency::usd_white(),
            HomeCurrency::UsdBlue => Currency::usd_blue(),
        }
    }

    pub fn is_home(&self) -> bool {
        matches!(self, HomeCurrency::Rub)
    }
}

impl fmt::Display for HomeCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.currency())
    }
}

/// Currencies handled on the foreign side of the corridor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ForeignCurrency {
    Eur,
    /// Fixed to EUR through a configured cross-rate.
    Rsd,
}

impl ForeignCurrency {
    pub fn currency(&self) -> Currency {
        match self {
            ForeignCurrency::Eur => Currency::eur(),
            ForeignCurrency::Rsd => Currency::rsd(),
        }
    }
}

impl fmt::Display for ForeignCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.currency())
    }
}

/// How the counterparty is served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingChannel {
    /// In the office.
    Office,
    /// Local visit.
    Field,
    /// Long-distance delivery; the only channel that carries courier expenses.
    Regional,
}

impl MeetingChannel {
    pub const ALL: [MeetingChannel; 3] = [
        MeetingChannel::Office,
        MeetingChannel::Field,
        MeetingChannel::Regional,
    ];
}

impl fmt::Display for MeetingChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MeetingChannel::Office => "office",
            MeetingChannel::Field => "field",
            MeetingChannel::Regional => "regional",
        };
        f.write_str(name)
    }
}

/// How the profit coefficient is chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ProfitConfig {
    /// Coefficient of the margin tier matching the amount.
    Tier,
    /// Fixed coefficient for trusted counterparties.
    Trusted,
    /// Caller-supplied coefficient.
    Custom { coefficient: Decimal },
}

impl Default for ProfitConfig {
    fn default() -> Self {
        ProfitConfig::Tier
    }
}

impl ProfitConfig {
    pub fn mode(&self) -> ProfitMode {
        match self {
            ProfitConfig::Tier => ProfitMode::Tier,
            ProfitConfig::Trusted => ProfitMode::Trusted,
            ProfitConfig::Custom { .. } => ProfitMode::Custom,
        }
    }
}

/// Profit mode echoed in results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfitMode {
    Tier,
    Trusted,
    Custom,
}

impl fmt::Display for ProfitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProfitMode::Tier => "tier",
            ProfitMode::Trusted => "trusted",
            ProfitMode::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Fields shared by both scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionParams {
    /// Destination country for a sale, origin country for a purchase.
    pub country: Country,
    pub meeting_channel: MeetingChannel,
    /// Courier expense in home currency.
    #[serde(default)]
    pub expenses_home: Decimal,
    #[serde(default)]
    pub profit: ProfitConfig,
    #[serde(default)]
    pub reverse_mode: bool,
    /// Amount supplied by the counterparty. Required unless `reverse_mode`.
    #[serde(default)]
    pub amount: Option<Decimal>,
    /// Amount the counterparty should end up with. Required iff `reverse_mode`.
    #[serde(default)]
    pub target_amount: Option<Decimal>,
    /// Replaces the international rate times the country coefficient.
    #[serde(default)]
    pub manual_settlement_rate: Option<Decimal>,
}

impl TransactionParams {
    pub fn new(country: impl Into<Country>, meeting_channel: MeetingChannel) -> Self {
        Self {
            country: country.into(),
            meeting_channel,
            expenses_home: Decimal::ZERO,
            profit: ProfitConfig::Tier,
            reverse_mode: false,
            amount: None,
            target_amount: None,
            manual_settlement_rate: None,
        }
    }

    /// Forward calculation from the given amount.
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self.reverse_mode = false;
        self
    }

    /// Reverse calculation towards the given output.
    pub fn target(mut self, target: Decimal) -> Self {
        self.target_amount = Some(target);
        self.reverse_mode = true;
        self
    }

    pub fn profit(mut self, profit: ProfitConfig) -> Self {
        self.profit = profit;
        self
    }

    pub fn expenses(mut self, expenses_home: Decimal) -> Self {
        self.expenses_home = expenses_home;
        self
    }

    pub fn manual_rate(mut self, rate: Decimal) -> Self {
        self.manual_settlement_rate = Some(rate);
        self
    }
}

/// Money enters at home and leaves abroad.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleInput {
    pub input_currency: HomeCurrency,
    pub output_currency: ForeignCurrency,
    #[serde(flatten)]
    pub params: TransactionParams,
}

/// Money enters abroad and leaves at home.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseInput {
    pub input_currency: ForeignCurrency,
    pub output_currency: HomeCurrency,
    #[serde(flatten)]
    pub params: TransactionParams,
}

/// Scenario tag echoed in results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    Sale,
    Purchase,
}

/// One requested transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "scenario", rename_all = "lowercase")]
pub enum CalculatorInput {
    Sale(SaleInput),
    Purchase(PurchaseInput),
}

impl CalculatorInput {
    pub fn sale(
        input_currency: HomeCurrency,
        output_currency: ForeignCurrency,
        params: TransactionParams,
    ) -> Self {
        CalculatorInput::Sale(SaleInput {
            input_currency,
            output_currency,
            params,
        })
    }

    pub fn purchase(
        input_currency: ForeignCurrency,
        output_currency: HomeCurrency,
        params: TransactionParams,
    ) -> Self {
        CalculatorInput::Purchase(PurchaseInput {
            input_currency,
            output_currency,
            params,
        })
    }

    pub fn scenario(&self) -> Scenario {
        match self {
            CalculatorInput::Sale(_) => Scenario::Sale,
            CalculatorInput::Purchase(_) => Scenario::Purchase,
        }
    }

    pub fn params(&self) -> &TransactionParams {
        match self {
            CalculatorInput::Sale(sale) => &sale.params,
            CalculatorInput::Purchase(purchase) => &purchase.params,
        }
    }

    pub fn params_mut(&mut self) -> &mut TransactionParams {
        match self {
            CalculatorInput::Sale(sale) => &mut sale.params,
            CalculatorInput::Purchase(purchase) => &mut purchase.params,
        }
    }

    pub fn input_currency(&self) -> Currency {
        match self {
            CalculatorInput::Sale(sale) => sale.input_currency.currency(),
            CalculatorInput::Purchase(purchase) => purchase.input_currency.currency(),
        }
    }

    pub fn output_currency(&self) -> Currency {
        match self {
            CalculatorInput::Sale(sale) => sale.output_currency.currency(),
            CalculatorInput::Purchase(purchase) => purchase.output_currency.currency(),
        }
    }
}
