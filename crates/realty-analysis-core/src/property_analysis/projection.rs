use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::time_value::{irr, npv};
use crate::types::{safe_ratio, Money, Multiple, Rate};
use crate::RealtyResult;

use super::assumptions::ProjectionAssumptions;
use super::expenses::ExpenseBreakdown;
use super::inputs::DealInputs;
use super::loan::LoanDetails;
use super::tax::TaxAnalysis;
use super::{cents, ratio};

const MONTHS_PER_YEAR: Decimal = dec!(12);
const IRR_GUESS: Rate = dec!(0.10);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionYear {
    pub year: u32,
    pub gross_rent: Money,
    pub operating_expenses: Money,
    pub debt_service: Money,
    pub cash_flow: Money,
    pub property_value: Money,
    pub loan_balance: Money,
    pub equity: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldProjection {
    pub hold_years: u32,
    pub appreciation_rate: Rate,
    pub rent_growth_rate: Rate,
    pub expense_growth_rate: Rate,
    pub years: Vec<ProjectionYear>,
    pub sale_price: Money,
    pub selling_costs: Money,
    pub loan_payoff: Money,
    pub accumulated_depreciation: Money,
    pub depreciation_recapture_tax: Money,
    /// Sale price less selling costs, loan payoff and recapture tax
    pub net_sale_proceeds: Money,
    pub total_cash_flow: Money,
    /// Cash flows plus net sale proceeds, less cash invested
    pub total_profit: Money,
    pub irr: Option<Rate>,
    pub npv: Money,
    pub equity_multiple: Option<Multiple>,
}

/// Year-by-year hold projection with an exit at the end of `hold_years`.
///
/// Rent and the rent-linked expenses grow at the rent growth rate; tax,
/// insurance and HOA grow at the expense growth rate; debt service is fixed
/// until the loan is paid off. With a tax analysis, the depreciation taken
/// over the hold is recaptured at sale.
pub fn project_hold(
    deal: &DealInputs,
    loan: &LoanDetails,
    expenses: &ExpenseBreakdown,
    total_cash_invested: Money,
    tax: Option<&TaxAnalysis>,
    assumptions: &ProjectionAssumptions,
    warnings: &mut Vec<String>,
) -> RealtyResult<HoldProjection> {
    let hold_years = deal.hold_years;
    let start_value = deal.after_repair_value.unwrap_or(deal.property_value);

    let rent_linked_pct = expenses.rent_linked_pct();
    let fixed = expenses.fixed();

    let mut rent = deal.monthly_rent;
    let mut fixed_expenses = fixed;
    let mut value = start_value;

    let mut years = Vec::with_capacity(hold_years as usize);
    let mut flows = Vec::with_capacity(hold_years as usize + 1);
    flows.push(-total_cash_invested);

    for year in 1..=hold_years {
        if year > 1 {
            rent *= Decimal::ONE + deal.rent_growth_rate;
            fixed_expenses *= Decimal::ONE + deal.expense_growth_rate;
        }
        value *= Decimal::ONE + deal.appreciation_rate;

        let gross_rent = rent * MONTHS_PER_YEAR;
        let operating_expenses = (rent * rent_linked_pct + fixed_expenses) * MONTHS_PER_YEAR;
        let debt_service = if year <= loan.loan_term_years {
            loan.monthly_debt_service() * MONTHS_PER_YEAR
        } else {
            Decimal::ZERO
        };
        let cash_flow = gross_rent - operating_expenses - debt_service;
        let loan_balance = loan.balance_at_year(year);

        flows.push(cash_flow);
        years.push(ProjectionYear {
            year,
            gross_rent: cents(gross_rent),
            operating_expenses: cents(operating_expenses),
            debt_service: cents(debt_service),
            cash_flow: cents(cash_flow),
            property_value: cents(value),
            loan_balance,
            equity: cents(value - loan_balance),
        });
    }

    let sale_price = value;
    let selling_costs = sale_price * assumptions.exit_selling_cost_pct;
    let loan_payoff = loan.balance_at_year(hold_years);
    let accumulated_depreciation = tax.map_or(Decimal::ZERO, |t| t.accumulated_depreciation(hold_years));
    let depreciation_recapture_tax = tax.map_or(Decimal::ZERO, |t| t.recapture_tax(hold_years));
    let net_sale_proceeds = sale_price - selling_costs - loan_payoff - depreciation_recapture_tax;

    if let Some(last) = flows.last_mut() {
        *last += net_sale_proceeds;
    }

    let total_cash_flow: Money = years.iter().map(|y| y.cash_flow).sum();
    let total_return = total_cash_flow + net_sale_proceeds;

    let projected_irr = if total_cash_invested <= Decimal::ZERO {
        warnings.push("Projected IRR not applicable: no cash invested".into());
        None
    } else {
        match irr(&flows, IRR_GUESS) {
            Ok(rate) => Some(ratio(rate)),
            Err(e) => {
                warnings.push(format!("Projected IRR unavailable: {e}"));
                None
            }
        }
    };

    Ok(HoldProjection {
        hold_years,
        appreciation_rate: deal.appreciation_rate,
        rent_growth_rate: deal.rent_growth_rate,
        expense_growth_rate: deal.expense_growth_rate,
        years,
        sale_price: cents(sale_price),
        selling_costs: cents(selling_costs),
        loan_payoff,
        accumulated_depreciation,
        depreciation_recapture_tax,
        net_sale_proceeds: cents(net_sale_proceeds),
        total_cash_flow,
        total_profit: cents(total_return - total_cash_invested),
        irr: projected_irr,
        npv: cents(npv(assumptions.discount_rate, &flows)?),
        equity_multiple: safe_ratio(total_return, total_cash_invested).map(ratio),
    })
}
