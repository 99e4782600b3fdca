//! Margin tiers and profit coefficients.

use corridor_common::MarginTier;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::EngineConfig;
use crate::error::{CalcResult, ErrorKind, Issues};
use crate::input::{ProfitConfig, ProfitMode};

/// Pick the margin tier for an EUR-equivalent amount.
///
/// Tiers are scanned in ascending order of `min`. The first tier whose range
/// contains the amount wins. When the table has a gap around the amount, the
/// highest tier whose lower bound the amount reaches is returned instead.
pub fn pick_margin_tier(amount_eur: Decimal, tiers: &[MarginTier]) -> Option<&MarginTier> {
    let mut sorted: Vec<&MarginTier> = tiers.iter().collect();
    sorted.sort_by(|a, b| a.min.cmp(&b.min));

    let mut selected = None;
    for tier in sorted {
        if tier.contains(amount_eur) {
            return Some(tier);
        }
        if amount_eur >= tier.min {
            selected = Some(tier);
        }
    }

    if let Some(tier) = selected {
        warn!(
            amount_eur = %amount_eur,
            tier_min = %tier.min,
            "No margin tier contains amount, falling back to nearest lower tier"
        );
    }
    selected
}

/// Profit coefficient chosen for a calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitSelection {
    pub mode: ProfitMode,
    pub coefficient: Decimal,
    pub tier: Option<MarginTier>,
}

/// Select the tier for `amount_eur` and resolve the coefficient for `profit`.
///
/// A custom coefficient outside `(0, max_custom_coefficient]` aborts.
pub fn select_profit(
    profit: &ProfitConfig,
    amount_eur: Decimal,
    tiers: &[MarginTier],
    config: &EngineConfig,
) -> CalcResult<ProfitSelection> {
    let tier = pick_margin_tier(amount_eur, tiers).cloned();

    let coefficient = match profit {
        ProfitConfig::Trusted => config.trusted_coefficient,
        ProfitConfig::Custom { coefficient } => {
            let mut issues = Issues::new();
            if *coefficient <= Decimal::ZERO || *coefficient > config.max_custom_coefficient {
                issues.push(format!(
                    "Custom profit coefficient {} must be in (0, {}]",
                    coefficient, config.max_custom_coefficient
                ));
            }
            issues.check_as(ErrorKind::InvalidCoefficient)?;
            *coefficient
        }
        ProfitConfig::Tier => tier.as_ref().map_or(Decimal::ONE, |t| t.coefficient),
    };

    Ok(ProfitSelection {
        mode: profit.mode(),
        coefficient,
        tier,
    })
}
