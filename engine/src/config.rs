//! Engine configuration.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Reverse solver configuration.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Maximum forward simulations before giving up on convergence.
    pub max_iterations: usize,
    /// Relative change between guesses below which the solver stops.
    pub tolerance: Decimal,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            tolerance: dec!(0.000001),
        }
    }
}

/// Main engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fixed part of the handler commission, in USD.
    pub base_commission_usd: Decimal,
    /// Profit coefficient used for trusted counterparties.
    pub trusted_coefficient: Decimal,
    /// Upper bound (inclusive) for a caller-supplied coefficient.
    pub max_custom_coefficient: Decimal,
    /// RUB per USD assumed by the minimum-commission warning when no quote is usable.
    pub warning_fallback_usd_rate: Decimal,
    /// Reverse solver configuration.
    pub solver: SolverConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_commission_usd: dec!(20),
            trusted_coefficient: dec!(0.99),
            max_custom_coefficient: dec!(1.2),
            warning_fallback_usd_rate: dec!(100),
            solver: SolverConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("CORRIDOR_BASE_COMMISSION_USD") {
            if let Ok(value) = value.parse() {
                config.base_commission_usd = value;
            }
        }

        if let Ok(value) = std::env::var("CORRIDOR_TRUSTED_COEFFICIENT") {
            if let Ok(value) = value.parse() {
                config.trusted_coefficient = value;
            }
        }

        if let Ok(value) = std::env::var("CORRIDOR_SOLVER_MAX_ITERATIONS") {
            if let Ok(value) = value.parse() {
                config.solver.max_iterations = value;
            }
        }

        if let Ok(value) = std::env::var("CORRIDOR_SOLVER_TOLERANCE") {
            if let Ok(value) = value.parse() {
                config.solver.tolerance = value;
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_commission_usd < Decimal::ZERO {
            return Err("Base commission cannot be negative".to_string());
        }

        if self.trusted_coefficient <= Decimal::ZERO
            || self.trusted_coefficient > self.max_custom_coefficient
        {
            return Err(format!(
                "Trusted coefficient must be in (0, {}]",
                self.max_custom_coefficient
            ));
        }

        if self.warning_fallback_usd_rate <= Decimal::ZERO {
            return Err("Warning fallback USD rate must be positive".to_string());
        }

        if self.solver.max_iterations == 0 {
            return Err("Solver needs at least one iteration".to_string());
        }

        if self.solver.tolerance <= Decimal::ZERO {
            return Err("Solver tolerance must be positive".to_string());
        }

        Ok(())
    }
}
