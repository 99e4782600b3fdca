//! Built-in demo scenarios.

use corridor_common::RatesSnapshot;
use corridor_engine::{
    CalculatorInput, ForeignCurrency, HomeCurrency, MeetingChannel, ProfitConfig,
    TransactionParams,
};
use rust_decimal::Decimal;

const DEMO_SNAPSHOT: &str = include_str!("../demo/snapshot.json");

/// A named calculation run against the demo snapshot.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Scenario name.
    pub name: &'static str,
    /// Description.
    pub description: &'static str,
    /// Request to calculate.
    pub input: CalculatorInput,
}

impl Scenario {
    pub const NAMES: [&'static str; 5] = [
        "sale-office",
        "sale-regional",
        "purchase-rub",
        "purchase-rsd",
        "reverse-sale",
    ];

    /// Load a scenario by name.
    pub fn load(name: &str) -> anyhow::Result<Self> {
        match name {
            "sale-office" => Ok(Self::sale_office()),
            "sale-regional" => Ok(Self::sale_regional()),
            "purchase-rub" => Ok(Self::purchase_rub()),
            "purchase-rsd" => Ok(Self::purchase_rsd()),
            "reverse-sale" => Ok(Self::reverse_sale()),
            _ => Err(anyhow::anyhow!(
                "Unknown scenario: {} (available: {})",
                name,
                Self::NAMES.join(", ")
            )),
        }
    }

    /// RUB cash handed over in the office, EUR received in Serbia.
    fn sale_office() -> Self {
        let params = TransactionParams::new("serbia", MeetingChannel::Office)
            .amount(Decimal::from(1_000_000));
        Self {
            name: "sale-office",
            description: "1,000,000 RUB to EUR in Serbia, office meeting",
            input: CalculatorInput::sale(HomeCurrency::Rub, ForeignCurrency::Eur, params),
        }
    }

    /// White USD collected by courier, RSD received with a custom coefficient.
    fn sale_regional() -> Self {
        let params = TransactionParams::new("serbia", MeetingChannel::Regional)
            .amount(Decimal::from(5_000))
            .expenses(Decimal::from(3_000))
            .profit(ProfitConfig::Custom {
                coefficient: Decimal::new(97, 2),
            });
        Self {
            name: "sale-regional",
            description: "5,000 USD_WHITE to RSD in Serbia, regional courier",
            input: CalculatorInput::sale(HomeCurrency::UsdWhite, ForeignCurrency::Rsd, params),
        }
    }

    /// EUR received in Montenegro, RUB paid out at home.
    fn purchase_rub() -> Self {
        let params = TransactionParams::new("montenegro", MeetingChannel::Field)
            .amount(Decimal::from(8_000));
        Self {
            name: "purchase-rub",
            description: "8,000 EUR from Montenegro to RUB, field meeting",
            input: CalculatorInput::purchase(ForeignCurrency::Eur, HomeCurrency::Rub, params),
        }
    }

    /// RSD received in Serbia, EUR cash paid out at home for a trusted client.
    fn purchase_rsd() -> Self {
        let params = TransactionParams::new("serbia", MeetingChannel::Office)
            .amount(Decimal::from(1_200_000))
            .profit(ProfitConfig::Trusted);
        Self {
            name: "purchase-rsd",
            description: "1,200,000 RSD from Serbia to EUR cash, trusted client",
            input: CalculatorInput::purchase(ForeignCurrency::Rsd, HomeCurrency::Eur, params),
        }
    }

    /// RUB needed for exactly 10,000 EUR to arrive in Serbia.
    fn reverse_sale() -> Self {
        let params =
            TransactionParams::new("serbia", MeetingChannel::Office).target(Decimal::from(10_000));
        Self {
            name: "reverse-sale",
            description: "RUB required to deliver 10,000 EUR in Serbia",
            input: CalculatorInput::sale(HomeCurrency::Rub, ForeignCurrency::Eur, params),
        }
    }
}

/// Snapshot every demo scenario runs against.
pub fn demo_snapshot() -> anyhow::Result<RatesSnapshot> {
    Ok(serde_json::from_str(DEMO_SNAPSHOT)?)
}
