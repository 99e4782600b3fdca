//! Step-by-step calculation trace.

use corridor_common::{Currency, RateValue};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Rate used by a step, with provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateDescriptor {
    pub label: String,
    pub value: Decimal,
    pub source: String,
    #[serde(rename = "override")]
    pub is_override: bool,
    pub fallback_used: bool,
}

impl RateDescriptor {
    /// Describe a snapshot rate that resolved to `value`.
    pub fn from_rate(label: impl Into<String>, value: Decimal, rate: &RateValue) -> Self {
        Self {
            label: label.into(),
            value,
            source: rate.source.clone(),
            is_override: rate.is_override,
            fallback_used: rate.fallback_used,
        }
    }

    /// Describe a value that does not come from the snapshot.
    pub fn fixed(label: impl Into<String>, value: Decimal, source: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value,
            source: source.into(),
            is_override: false,
            fallback_used: false,
        }
    }

    /// Describe a value entered by the caller.
    pub fn manual(label: impl Into<String>, value: Decimal) -> Self {
        Self {
            label: label.into(),
            value,
            source: "manual".to_string(),
            is_override: true,
            fallback_used: false,
        }
    }
}

/// One trace entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationStep {
    pub label: String,
    pub amount: Decimal,
    pub currency: Currency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<RateDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CalculationStep {
    pub fn new(label: impl Into<String>, amount: Decimal, currency: Currency) -> Self {
        Self {
            amount: currency.round(amount),
            label: label.into(),
            currency,
            rate: None,
            formula: None,
            note: None,
        }
    }

    pub fn with_rate(mut self, rate: RateDescriptor) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_formula(mut self, formula: impl Into<String>) -> Self {
        self.formula = Some(formula.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Collects steps when enabled, discards them otherwise.
///
/// Steps are built lazily so untraced solver simulations do no formatting work.
#[derive(Debug, Default)]
pub struct Trace {
    enabled: bool,
    steps: Vec<CalculationStep>,
}

impl Trace {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            steps: Vec::new(),
        }
    }

    pub fn enabled() -> Self {
        Self::new(true)
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn record(&mut self, step: impl FnOnce() -> CalculationStep) {
        if self.enabled {
            let step = step();
            tracing::debug!(
                label = %step.label,
                amount = %step.amount,
                currency = %step.currency,
                "Calculation step"
            );
            self.steps.push(step);
        }
    }

    pub fn into_steps(self) -> Vec<CalculationStep> {
        self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_disabled_trace_skips_steps() {
        let mut trace = Trace::disabled();
        trace.record(|| panic!("step should not be built"));
        assert!(trace.into_steps().is_empty());
    }

    #[test]
    fn test_step_amount_rounded() {
        let mut trace = Trace::enabled();
        trace.record(|| {
            CalculationStep::new("Settlement asset", dec!(11011.2000004), Currency::usdt())
                .with_formula("992000 / 90 × 0.999")
        });
        trace.record(|| CalculationStep::new("EUR", dec!(8704.3536), Currency::eur()));

        let steps = trace.into_steps();

        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].amount, dec!(11011.200000));
        assert_eq!(steps[1].amount, dec!(8704.35));
    }

    #[test]
    fn test_rate_descriptor_provenance() {
        let rate = RateValue::quoted(dec!(80), "exchange").with_fallback();
        let descriptor = RateDescriptor::from_rate("USD buy", dec!(80), &rate);
        assert!(descriptor.fallback_used);
        assert!(!descriptor.is_override);
        assert_eq!(descriptor.source, "exchange");
    }
}
