//! Reverse solver: find the input that produces a target output.

use rust_decimal::Decimal;
use tracing::{debug, instrument, warn};

use crate::config::SolverConfig;
use crate::error::{CalcResult, CalculationError};

/// Where the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// Input amount to run the traced calculation with.
    pub amount: Decimal,
    /// Forward simulations performed.
    pub iterations: usize,
    /// Whether the relative step fell below the tolerance.
    pub converged: bool,
}

/// Invert a forward calculation by multiplicative fixed-point iteration.
///
/// Starting from `max(target, 1)`, each guess is rescaled by
/// `target / simulate(guess)` until the relative change drops below the
/// tolerance or the iteration cap is reached. Forward calculations are linear
/// or piecewise linear in the amount, so this settles in a few steps except
/// near tier boundaries.
///
/// The seed is read in input-currency units. When that first trial run is
/// already below the commission floor the simulation fails and the error is
/// returned as is: a regional 5000 EUR reverse sale seeds 5000 RUB, under the
/// 9600 RUB commission, and reports `InsufficientAmount`.
#[instrument(level = "debug", skip(config, simulate))]
pub fn solve<F>(target: Decimal, config: &SolverConfig, mut simulate: F) -> CalcResult<Solution>
where
    F: FnMut(Decimal) -> CalcResult<Decimal>,
{
    let mut guess = target.max(Decimal::ONE);

    for iteration in 1..=config.max_iterations {
        let simulated = simulate(guess)?;
        if simulated <= Decimal::ZERO {
            return Err(CalculationError::solver(format!(
                "Input {} produces no output; target {} is unreachable",
                guess, target
            )));
        }

        let next = target
            .checked_div(simulated)
            .and_then(|ratio| guess.checked_mul(ratio))
            .filter(|next| *next > Decimal::ZERO)
            .ok_or_else(|| {
                CalculationError::solver(format!(
                    "Solver produced an unusable guess after {} iterations",
                    iteration
                ))
            })?;

        let change = (next - guess).abs().checked_div(guess).ok_or_else(|| {
            CalculationError::solver(format!("Solver step from {} to {} overflowed", guess, next))
        })?;
        debug!(iteration, guess = %guess, simulated = %simulated, next = %next, "Solver step");

        if change < config.tolerance {
            return Ok(Solution {
                amount: next,
                iterations: iteration,
                converged: true,
            });
        }
        guess = next;
    }

    warn!(
        target = %target,
        guess = %guess,
        max_iterations = config.max_iterations,
        "Solver did not converge"
    );
    Ok(Solution {
        amount: guess,
        iterations: config.max_iterations,
        converged: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rust_decimal_macros::dec;

    fn within(actual: Decimal, expected: Decimal, tolerance: Decimal) -> bool {
        ((actual - expected) / expected).abs() < tolerance
    }

    #[test]
    fn test_solves_linear() {
        let solution = solve(dec!(500), &SolverConfig::default(), |x| Ok(x * dec!(0.5))).unwrap();

        assert!(solution.converged);
        assert!(within(solution.amount, dec!(1000), dec!(0.000001)));
    }

    #[test]
    fn test_solves_affine_with_deduction() {
        // Output = (x − 8000) × 0.0087
        let f = |x: Decimal| Ok((x - dec!(8000)) * dec!(0.0087));
        let solution = solve(dec!(8700), &SolverConfig::default(), f).unwrap();

        assert!(solution.converged);
        assert!(within(solution.amount, dec!(1008000), dec!(0.00001)));
    }

    #[test]
    fn test_seed_is_at_least_one() {
        let mut first = None;
        solve(dec!(0.25), &SolverConfig::default(), |x| {
            first.get_or_insert(x);
            Ok(x)
        })
        .unwrap();

        assert_eq!(first, Some(Decimal::ONE));
    }

    #[test]
    fn test_non_positive_output_aborts() {
        let err = solve(dec!(100), &SolverConfig::default(), |_| Ok(Decimal::ZERO)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SolverDiverged);
    }

    #[test]
    fn test_overflowing_guess_aborts() {
        let tiny = dec!(0.0000000000000000000000000001);
        let err = solve(dec!(100), &SolverConfig::default(), |_| Ok(tiny)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::SolverDiverged);
    }

    #[test]
    fn test_forward_errors_propagate() {
        let err = solve(dec!(100), &SolverConfig::default(), |_| {
            Err(CalculationError::invalid_input("boom"))
        })
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn test_iteration_cap() {
        let config = SolverConfig {
            max_iterations: 3,
            ..Default::default()
        };
        let mut calls = 0;
        // Guesses alternate between 100 and 1
        let solution = solve(dec!(100), &config, |x| {
            calls += 1;
            Ok(x * x)
        })
        .unwrap();

        assert!(!solution.converged);
        assert_eq!(solution.iterations, 3);
        assert_eq!(calls, 3);
    }
}
