use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Money;

use super::expenses::ExpenseBreakdown;
use super::loan::LoanDetails;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowResult {
    pub monthly_rent: Money,
    /// P&I plus mortgage insurance
    pub monthly_debt_service: Money,
    pub monthly_operating_expenses: Money,
    pub monthly_cash_flow: Money,
    pub annual_cash_flow: Money,
}

impl CashFlowResult {
    pub fn is_negative(&self) -> bool {
        self.monthly_cash_flow < Decimal::ZERO
    }
}

/// Net monthly cash flow.
///
/// Tax and insurance sit in both the total monthly payment and the expense
/// breakdown; they are charged once, through the expenses. The result may
/// be negative.
pub fn compute_cash_flow(monthly_rent: Money, loan: &LoanDetails, expenses: &ExpenseBreakdown) -> CashFlowResult {
    net_cash_flow(monthly_rent, loan.monthly_debt_service(), expenses.total_monthly_expenses)
}

pub(crate) fn net_cash_flow(monthly_rent: Money, debt_service: Money, operating_expenses: Money) -> CashFlowResult {
    let monthly_cash_flow = monthly_rent - debt_service - operating_expenses;
    CashFlowResult {
        monthly_rent,
        monthly_debt_service: debt_service,
        monthly_operating_expenses: operating_expenses,
        monthly_cash_flow,
        annual_cash_flow: monthly_cash_flow * dec!(12),
    }
}
