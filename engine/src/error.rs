//! Calculation error types.

use std::fmt;

use thiserror::Error;

/// Which checkpoint rejected the calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input fields are missing or out of range.
    InvalidInput,
    /// One or more required rates are missing or non-positive.
    MissingRates,
    /// Custom profit coefficient outside the allowed range.
    InvalidCoefficient,
    /// Amount does not cover the handler commission.
    InsufficientAmount,
    /// A fixed cross-rate needed for the conversion is missing.
    MissingCrossRate,
    /// The reverse solver could not produce a usable guess.
    SolverDiverged,
}

impl ErrorKind {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::MissingRates => "MISSING_RATES",
            ErrorKind::InvalidCoefficient => "INVALID_COEFFICIENT",
            ErrorKind::InsufficientAmount => "INSUFFICIENT_AMOUNT",
            ErrorKind::MissingCrossRate => "MISSING_CROSS_RATE",
            ErrorKind::SolverDiverged => "SOLVER_DIVERGED",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The single error produced by the engine.
///
/// Always carries at least one human-readable issue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Calculation failed ({kind}): {}", .issues.join("; "))]
pub struct CalculationError {
    pub kind: ErrorKind,
    pub issues: Vec<String>,
}

impl CalculationError {
    /// Create an error with a single issue.
    pub fn new(kind: ErrorKind, issue: impl Into<String>) -> Self {
        Self {
            kind,
            issues: vec![issue.into()],
        }
    }

    /// Create an error from a batch of issues.
    ///
    /// An empty batch is replaced by a generic issue so the list is never empty.
    pub fn from_issues(kind: ErrorKind, issues: Vec<String>) -> Self {
        let issues = if issues.is_empty() {
            vec!["Unspecified calculation issue".to_string()]
        } else {
            issues
        };
        Self { kind, issues }
    }

    pub fn invalid_input(issue: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, issue)
    }

    pub fn solver(issue: impl Into<String>) -> Self {
        Self::new(ErrorKind::SolverDiverged, issue)
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Whether any issue mentions the given label.
    pub fn mentions(&self, label: &str) -> bool {
        self.issues.iter().any(|issue| issue.contains(label))
    }
}

/// Result type for engine operations.
pub type CalcResult<T> = Result<T, CalculationError>;

/// Accumulates issues between validation checkpoints.
#[derive(Debug, Default)]
pub struct Issues {
    items: Vec<String>,
}

impl Issues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, issue: impl Into<String>) {
        self.items.push(issue.into());
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(String::as_str)
    }

    /// Fail with every issue collected so far, as missing rates.
    pub fn check(&mut self) -> CalcResult<()> {
        self.check_as(ErrorKind::MissingRates)
    }

    /// Checkpoint that also hands back the values resolved before it.
    pub fn settle<T>(&mut self, resolved: Option<T>) -> CalcResult<T> {
        self.settle_as(ErrorKind::MissingRates, resolved)
    }

    /// Like [`Issues::settle`], classifying a failure as `kind`.
    pub fn settle_as<T>(&mut self, kind: ErrorKind, resolved: Option<T>) -> CalcResult<T> {
        self.check_as(kind)?;
        resolved
            .ok_or_else(|| CalculationError::new(kind, "Value missing without a recorded issue"))
    }

    /// Fail with every issue collected so far, classified as `kind`.
    pub fn check_as(&mut self, kind: ErrorKind) -> CalcResult<()> {
        if self.items.is_empty() {
            return Ok(());
        }
        Err(CalculationError::from_issues(
            kind,
            std::mem::take(&mut self.items),
        ))
    }
}
