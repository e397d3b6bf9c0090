use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{safe_ratio, Money, Multiple, Rate};
use crate::RealtyResult;

use super::assumptions::DealAssumptions;
use super::cash_flow::CashFlowResult;
use super::expenses::ExpenseBreakdown;
use super::inputs::{DealInputs, Strategy};
use super::loan::{balance_after, monthly_payment, LoanDetails};
use super::{cents, ratio};

const MONTHS_PER_YEAR: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Standard investment ratios plus the strategy-specific figures.
/// `None` means not applicable (zero denominator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentMetrics {
    /// Down payment + closing costs (incl. cash-paid program fees) + renovation
    pub total_cash_invested: Money,
    pub net_operating_income: Money,
    pub annual_debt_service: Money,
    pub cash_on_cash_return: Option<Rate>,
    pub cap_rate: Option<Rate>,
    pub rental_yield: Option<Rate>,
    pub rent_to_value: Option<Rate>,
    pub dscr: Option<Multiple>,
    pub operating_expense_ratio: Option<Rate>,
    pub break_even_occupancy: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flip: Option<FlipMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brrrr: Option<BrrrrMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub house_hack: Option<HouseHackMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlipMetrics {
    pub after_repair_value: Money,
    pub purchase_price: Money,
    pub renovation_budget: Money,
    pub selling_costs: Money,
    pub net_profit: Money,
    /// Net profit / (purchase + renovation)
    pub profit_margin: Option<Rate>,
    /// Net profit / total cash invested
    pub return_on_cash: Option<Rate>,
    pub renovation_to_arv: Option<Rate>,
    /// Highest price satisfying the cost-to-ARV rule given the renovation
    pub max_allowable_offer: Money,
    pub meets_cost_rule: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrrrrMetrics {
    pub after_repair_value: Money,
    pub refinance_ltv: Rate,
    pub refinance_loan_amount: Money,
    /// Purchase-loan balance at the end of the seasoning period
    pub original_loan_balance: Money,
    pub cash_out: Money,
    /// Cash still tied up after the refinance; negative when the refinance
    /// returns more than was invested
    pub cash_left_in_deal: Money,
    pub cash_left_ratio: Option<Rate>,
    pub post_refinance_monthly_payment: Money,
    pub post_refinance_cash_flow: Money,
    pub refinance_dscr: Option<Multiple>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HouseHackMetrics {
    /// Rent / total monthly payment
    pub rent_coverage: Option<Rate>,
    /// What the owner-occupant still pays each month out of pocket
    pub effective_housing_cost: Money,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

/// Derive every ratio from the loan, expense and cash-flow results. Ratios
/// with a zero base come back as `None`; this never fails on division.
pub fn compute_metrics(
    strategy: Strategy,
    deal: &DealInputs,
    loan: &LoanDetails,
    expenses: &ExpenseBreakdown,
    cash_flow: &CashFlowResult,
    deal_assumptions: &DealAssumptions,
) -> RealtyResult<InvestmentMetrics> {
    let rent = deal.monthly_rent;
    let value = deal.property_value;

    let total_cash_invested = loan.down_payment_amount + loan.closing_costs + deal.renovation_budget;
    let net_operating_income = (rent - expenses.total_monthly_expenses) * MONTHS_PER_YEAR;
    let annual_debt_service = loan.monthly_debt_service() * MONTHS_PER_YEAR;
    let gross_annual_rent = rent * MONTHS_PER_YEAR;

    let flip = match strategy {
        Strategy::Flip => Some(flip_metrics(deal, total_cash_invested, deal_assumptions)),
        _ => None,
    };
    let brrrr = match strategy {
        Strategy::Brrrr => Some(brrrr_metrics(
            deal,
            loan,
            expenses,
            total_cash_invested,
            net_operating_income,
        )?),
        _ => None,
    };
    let house_hack = match strategy {
        Strategy::HouseHack => Some(HouseHackMetrics {
            rent_coverage: safe_ratio(rent, loan.total_monthly_payment).map(ratio),
            effective_housing_cost: (-cash_flow.monthly_cash_flow).max(Decimal::ZERO),
        }),
        _ => None,
    };

    Ok(InvestmentMetrics {
        total_cash_invested: cents(total_cash_invested),
        net_operating_income: cents(net_operating_income),
        annual_debt_service: cents(annual_debt_service),
        cash_on_cash_return: safe_ratio(cash_flow.annual_cash_flow, total_cash_invested).map(ratio),
        cap_rate: safe_ratio(net_operating_income, value).map(ratio),
        rental_yield: safe_ratio(gross_annual_rent, value).map(ratio),
        rent_to_value: safe_ratio(rent, value).map(ratio),
        dscr: safe_ratio(net_operating_income, annual_debt_service).map(ratio),
        operating_expense_ratio: safe_ratio(expenses.total_monthly_expenses, rent).map(ratio),
        break_even_occupancy: safe_ratio(
            expenses.total_monthly_expenses + loan.monthly_debt_service(),
            rent,
        )
        .map(ratio),
        flip,
        brrrr,
        house_hack,
    })
}

fn flip_metrics(deal: &DealInputs, total_cash_invested: Money, rules: &DealAssumptions) -> FlipMetrics {
    let arv = deal.after_repair_value.unwrap_or(deal.property_value);
    let purchase = deal.purchase_price;
    let renovation = deal.renovation_budget;
    let all_in = purchase + renovation;

    let selling_costs = arv * deal.selling_cost_pct;
    let net_profit = arv - all_in - selling_costs;

    FlipMetrics {
        after_repair_value: arv,
        purchase_price: purchase,
        renovation_budget: renovation,
        selling_costs: cents(selling_costs),
        net_profit: cents(net_profit),
        profit_margin: safe_ratio(net_profit, all_in).map(ratio),
        return_on_cash: safe_ratio(net_profit, total_cash_invested).map(ratio),
        renovation_to_arv: safe_ratio(renovation, arv).map(ratio),
        max_allowable_offer: cents(arv * rules.flip_max_cost_to_arv - renovation),
        meets_cost_rule: all_in <= arv * rules.flip_max_cost_to_arv,
    }
}

fn brrrr_metrics(
    deal: &DealInputs,
    loan: &LoanDetails,
    expenses: &ExpenseBreakdown,
    total_cash_invested: Money,
    net_operating_income: Money,
) -> RealtyResult<BrrrrMetrics> {
    let arv = deal.after_repair_value.unwrap_or(deal.property_value);
    let refinance_loan_amount = cents(arv * deal.refinance_ltv);

    let original_loan_balance = balance_after(
        loan.loan_amount,
        loan.interest_rate,
        loan.loan_term_years,
        deal.refinance_seasoning_months,
    )?;
    let cash_out = refinance_loan_amount - original_loan_balance;
    let cash_left_in_deal = total_cash_invested - cash_out;

    // Conventional cash-out refinance at the same rate and term, no MI
    let post_refinance_monthly_payment = cents(monthly_payment(
        refinance_loan_amount,
        loan.interest_rate,
        loan.loan_term_years,
    )?);
    let post_refinance_cash_flow =
        deal.monthly_rent - post_refinance_monthly_payment - expenses.total_monthly_expenses;

    Ok(BrrrrMetrics {
        after_repair_value: arv,
        refinance_ltv: deal.refinance_ltv,
        refinance_loan_amount,
        original_loan_balance,
        cash_out,
        cash_left_in_deal: cents(cash_left_in_deal),
        cash_left_ratio: safe_ratio(cash_left_in_deal, total_cash_invested).map(ratio),
        post_refinance_monthly_payment,
        post_refinance_cash_flow,
        refinance_dscr: safe_ratio(
            net_operating_income,
            post_refinance_monthly_payment * MONTHS_PER_YEAR,
        )
        .map(ratio),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property_analysis::assumptions::{AnalysisAssumptions, ExpenseAssumptions, LoanAssumptions};
    use crate::property_analysis::cash_flow::compute_cash_flow;
    use crate::property_analysis::expenses::estimate_expenses;
    use crate::property_analysis::inputs::{AnalysisConfig, LoanType, PropertyRecord};
    use crate::property_analysis::loan::{calculate_loan, LoanTerms};
    use rust_decimal_macros::dec;

    fn run(property: &PropertyRecord, config: &AnalysisConfig) -> InvestmentMetrics {
        let assumptions = AnalysisAssumptions::default();
        let mut warnings = Vec::new();
        let deal = DealInputs::resolve(property, None, config, &assumptions, &mut warnings).unwrap();
        let expenses = estimate_expenses(property, config, None, &ExpenseAssumptions::default()).unwrap();
        let terms = LoanTerms::from_config(deal.purchase_price, config, deal.closing_cost_pct, &expenses);
        let loan = calculate_loan(&terms, &LoanAssumptions::default(), &mut warnings).unwrap();
        let cf = compute_cash_flow(deal.monthly_rent, &loan, &expenses);
        compute_metrics(config.strategy, &deal, &loan, &expenses, &cf, &assumptions.deal).unwrap()
    }

    fn sample_property() -> PropertyRecord {
        PropertyRecord::new("123 Main St", dec!(300000), dec!(2200))
    }

    #[test]
    fn test_rental_worked_example() {
        let m = run(&sample_property(), &AnalysisConfig::new(Strategy::Rental, LoanType::Conventional));
        // (2200 - 821) * 12
        assert_eq!(m.net_operating_income, dec!(16548));
        assert_eq!(m.total_cash_invested, dec!(69000));
        assert_eq!(m.cap_rate, Some(dec!(0.05516)));
        assert_eq!(m.rental_yield, Some(dec!(0.088)));
        let dscr = m.dscr.unwrap();
        assert!(dscr > dec!(0.90) && dscr < dec!(0.92), "dscr {dscr}");
        assert!(m.cash_on_cash_return.unwrap() < Decimal::ZERO);
        assert!(m.flip.is_none() && m.brrrr.is_none());
    }

    #[test]
    fn test_zero_cash_invested_gives_na_coc() {
        let mut cfg = AnalysisConfig::new(Strategy::Rental, LoanType::Va);
        cfg.finance_upfront_fees = true;
        cfg.closing_cost_pct = Some(Decimal::ZERO);
        let m = run(&sample_property(), &cfg);
        assert_eq!(m.total_cash_invested, Decimal::ZERO);
        assert_eq!(m.cash_on_cash_return, None);
        assert!(m.cap_rate.is_some());
        assert!(m.dscr.is_some());
    }

    #[test]
    fn test_flip_profit() {
        let property = PropertyRecord::new("9 Elm St", dec!(280000), dec!(2000));
        let mut cfg = AnalysisConfig::new(Strategy::Flip, LoanType::Conventional);
        cfg.after_repair_value = Some(dec!(350000));
        cfg.renovation_budget = Some(dec!(30000));
        let flip = run(&property, &cfg).flip.unwrap();
        assert_eq!(flip.selling_costs, dec!(28000));
        assert_eq!(flip.net_profit, dec!(12000));
        // 12,000 / 310,000
        assert_eq!(flip.profit_margin, Some(dec!(0.038710)));
        assert!(!flip.meets_cost_rule);
        assert_eq!(flip.max_allowable_offer, dec!(215000));
    }

    #[test]
    fn test_brrrr_refinance() {
        let property = PropertyRecord::new("5 Oak Ave", dec!(200000), dec!(2400));
        let mut cfg = AnalysisConfig::new(Strategy::Brrrr, LoanType::Conventional);
        cfg.after_repair_value = Some(dec!(300000));
        cfg.renovation_budget = Some(dec!(40000));
        let b = run(&property, &cfg).brrrr.unwrap();
        assert_eq!(b.refinance_loan_amount, dec!(225000));
        assert!(b.original_loan_balance < dec!(160000) && b.original_loan_balance > dec!(157000));
        assert_eq!(b.cash_out, b.refinance_loan_amount - b.original_loan_balance);
        // invested: 40,000 down + 6,000 closing + 40,000 rehab = 86,000
        assert_eq!(b.cash_left_in_deal, cents(dec!(86000) - b.cash_out));
        assert!(b.cash_left_ratio.unwrap() < dec!(0.25));
        assert!(b.refinance_dscr.is_some());
    }

    #[test]
    fn test_brrrr_full_cash_out_reported_as_is() {
        let property = PropertyRecord::new("5 Oak Ave", dec!(200000), dec!(2400));
        let mut cfg = AnalysisConfig::new(Strategy::Brrrr, LoanType::Conventional);
        cfg.after_repair_value = Some(dec!(400000));
        cfg.renovation_budget = Some(dec!(40000));
        let b = run(&property, &cfg).brrrr.unwrap();
        assert_eq!(b.refinance_loan_amount, dec!(300000));
        assert!(b.cash_out > dec!(86000));
        assert_eq!(b.cash_left_in_deal, cents(dec!(86000) - b.cash_out));
        assert!(b.cash_left_in_deal < Decimal::ZERO);
        assert!(b.cash_left_ratio.unwrap() < Decimal::ZERO);
    }

    #[test]
    fn test_house_hack_coverage() {
        let cfg = AnalysisConfig::new(Strategy::HouseHack, LoanType::Fha);
        let m = run(&sample_property(), &cfg);
        let hh = m.house_hack.unwrap();
        assert!(hh.rent_coverage.unwrap() > Decimal::ZERO);
        assert!(hh.effective_housing_cost >= Decimal::ZERO);
    }
}
