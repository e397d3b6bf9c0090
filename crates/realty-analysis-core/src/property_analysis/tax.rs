//! First-year income-tax picture of a rental: straight-line depreciation,
//! the mortgage-interest deduction and the resulting paper loss.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

use super::assumptions::TaxAssumptions;
use super::cash_flow::CashFlowResult;
use super::inputs::DealInputs;
use super::loan::LoanDetails;
use super::metrics::InvestmentMetrics;
use super::cents;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxAnalysis {
    pub land_value: Money,
    /// Building share of the price plus the renovation budget
    pub depreciable_basis: Money,
    pub depreciation_years: Decimal,
    pub annual_depreciation: Money,
    pub mortgage_interest_year1: Money,
    pub net_operating_income: Money,
    /// NOI less depreciation and interest; negative is a paper loss
    pub taxable_income: Money,
    /// Zero or negative
    pub paper_loss: Money,
    /// Tax sheltered elsewhere by the paper loss
    pub tax_savings: Money,
    pub tax_owed: Money,
    pub annual_cash_flow: Money,
    pub after_tax_cash_flow: Money,
    pub marginal_tax_rate: Rate,
    pub recapture_tax_rate: Rate,
}

impl TaxAnalysis {
    pub fn has_paper_loss(&self) -> bool {
        self.paper_loss < Decimal::ZERO
    }

    /// Depreciation taken over `years`, capped at the basis.
    pub fn accumulated_depreciation(&self, years: u32) -> Money {
        (self.annual_depreciation * Decimal::from(years)).min(self.depreciable_basis)
    }

    /// Tax due at sale on the depreciation taken over `years`.
    pub fn recapture_tax(&self, years: u32) -> Money {
        cents(self.accumulated_depreciation(years) * self.recapture_tax_rate)
    }
}

/// Year-one taxable income and after-tax cash flow.
///
/// A paper loss is assumed usable against other income at the marginal
/// rate; passive-activity limits are not modelled.
pub fn analyze_taxes(
    deal: &DealInputs,
    loan: &LoanDetails,
    metrics: &InvestmentMetrics,
    cash_flow: &CashFlowResult,
    assumptions: &TaxAssumptions,
) -> TaxAnalysis {
    let land_value = cents(deal.purchase_price * assumptions.land_value_pct);
    let depreciable_basis = deal.purchase_price - land_value + deal.renovation_budget;
    let annual_depreciation = cents(depreciable_basis / assumptions.depreciation_years);

    let mortgage_interest_year1 = loan
        .amortization
        .first()
        .map_or(Decimal::ZERO, |year| year.interest_paid);

    let noi = metrics.net_operating_income;
    let taxable_income = noi - annual_depreciation - mortgage_interest_year1;

    let paper_loss = taxable_income.min(Decimal::ZERO);
    let tax_savings = cents(-paper_loss * assumptions.marginal_tax_rate);
    let tax_owed = cents(taxable_income.max(Decimal::ZERO) * assumptions.marginal_tax_rate);

    TaxAnalysis {
        land_value,
        depreciable_basis,
        depreciation_years: assumptions.depreciation_years,
        annual_depreciation,
        mortgage_interest_year1,
        net_operating_income: noi,
        taxable_income,
        paper_loss,
        tax_savings,
        tax_owed,
        annual_cash_flow: cash_flow.annual_cash_flow,
        after_tax_cash_flow: cash_flow.annual_cash_flow - tax_owed + tax_savings,
        marginal_tax_rate: assumptions.marginal_tax_rate,
        recapture_tax_rate: assumptions.recapture_tax_rate,
    }
}
