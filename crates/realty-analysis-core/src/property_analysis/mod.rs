//! Residential property investment analysis.
//!
//! Pipeline, leaves first: [`expenses`] and [`loan`] build the monthly cost
//! picture, [`cash_flow`] nets it against rent, [`metrics`] derives the
//! standard ratios and the flip/BRRRR figures, [`tax`] adds the first-year
//! tax picture, [`risk`] and [`projection`] stress and extend those figures,
//! and [`scoring`] maps everything to a strategy-specific score and grade.
//! [`analysis`] sequences the steps and compares strategies; [`summary`]
//! turns the result into headline findings.

pub mod analysis;
pub mod assumptions;
pub mod cash_flow;
pub mod expenses;
pub mod inputs;
pub mod loan;
pub mod metrics;
pub mod projection;
pub mod risk;
pub mod scoring;
pub mod summary;
pub mod tax;

pub use analysis::{analyze, analyze_property, analyze_with, AnalysisResult, PropertyAnalysisInput};
pub use assumptions::AnalysisAssumptions;
pub use inputs::{AnalysisConfig, LoanType, MarketStatistics, PropertyRecord, Strategy};
pub use scoring::{LetterGrade, Recommendation, StrategyScore};
pub use tax::TaxAnalysis;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Round a money amount to cents.
pub(crate) fn cents(value: Decimal) -> Decimal {
    value.round_dp(2)
}

/// Round a ratio for reporting.
pub(crate) fn ratio(value: Decimal) -> Decimal {
    value.round_dp(6)
}

/// Render a fraction as a percentage for warning text, e.g. `0.035` as `3.5%`.
pub(crate) fn pct(value: Decimal) -> String {
    format!("{}%", (value * dec!(100)).round_dp(2).normalize())
}
