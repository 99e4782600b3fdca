//! Human-readable rendering of calculation results.

use std::fmt;

use corridor_engine::CalculationResult;

/// Step table followed by a short summary.
pub struct StepTable<'a> {
    result: &'a CalculationResult,
}

impl<'a> StepTable<'a> {
    pub fn new(result: &'a CalculationResult) -> Self {
        Self { result }
    }
}

impl fmt::Display for StepTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;

        for (index, step) in result.steps.iter().enumerate() {
            write!(
                f,
                "{:>2}. {:<32} {:>16} {:<9}",
                index + 1,
                step.label,
                step.amount.to_string(),
                step.currency.code()
            )?;
            if let Some(rate) = &step.rate {
                write!(f, " @ {} ({})", rate.value, rate.label)?;
            }
            writeln!(f)?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "Input:      {} {}",
            result.input_amount, result.input_currency
        )?;
        writeln!(
            f,
            "Output:     {} {}",
            result.output_amount, result.output_currency
        )?;
        writeln!(
            f,
            "Commission: {} USD ({} RUB)",
            result.commission.total_usd, result.commission.total_home
        )?;
        writeln!(
            f,
            "Profit:     x{} ({})",
            result.profit_coefficient, result.profit_mode
        )?;

        if let Some(solver) = &result.solver {
            writeln!(
                f,
                "Solver:     {} iterations, converged: {}",
                solver.iterations, solver.converged
            )?;
        }
        for warning in &result.warnings {
            writeln!(f, "Warning:    {}", warning)?;
        }

        Ok(())
    }
}
