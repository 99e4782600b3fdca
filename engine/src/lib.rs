//! Corridor Calculation Engine
//!
//! Computes what a counterparty pays or receives when moving funds between the
//! home jurisdiction and a foreign one through a crypto settlement leg.
//!
//! # Features
//!
//! - Sale (home → abroad) and purchase (abroad → home) pipelines
//! - Tiered handler commission and margin schedules
//! - Rate validation that reports every missing rate at once
//! - Reverse calculation from a target output amount
//!
//! # Example
//!
//! ```rust,ignore
//! use corridor_engine::{calculate, CalculatorInput, ForeignCurrency, HomeCurrency};
//! use corridor_engine::{MeetingChannel, TransactionParams};
//!
//! let params = TransactionParams::new("serbia", MeetingChannel::Office).amount(dec!(1000000));
//! let input = CalculatorInput::sale(HomeCurrency::Rub, ForeignCurrency::Eur, params);
//!
//! let result = calculate(&input, &snapshot)?;
//! println!("{} {}", result.output_amount, result.output_currency);
//! ```

pub mod commission;
pub mod config;
pub mod engine;
pub mod error;
pub mod input;
pub mod margin;
pub mod pipeline;
pub mod purchase;
pub mod rates;
pub mod result;
pub mod sale;
pub mod solver;
pub mod trace;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use commission::{employee_commission, CommissionBreakdown};
pub use config::{EngineConfig, SolverConfig};
pub use engine::{calculate, CalculationOptions, Calculator};
pub use error::{CalcResult, CalculationError, ErrorKind, Issues};
pub use input::{
    CalculatorInput, ForeignCurrency, HomeCurrency, MeetingChannel, ProfitConfig, ProfitMode,
    PurchaseInput, SaleInput, Scenario, TransactionParams,
};
pub use margin::pick_margin_tier;
pub use rates::resolve;
pub use result::{CalculationResult, ExpenseBreakdown, MarginSummary, SolverReport};
pub use solver::solve;
pub use trace::{CalculationStep, RateDescriptor};
