//! Stress scenarios and break-even figures for a financed rental.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{safe_ratio, Money, Multiple, Rate};
use crate::RealtyResult;

use super::assumptions::{RiskAssumptions, StressScenarioSpec};
use super::expenses::ExpenseBreakdown;
use super::loan::{monthly_payment, LoanDetails};
use super::{cents, ratio};

const MONTHS_PER_YEAR: Decimal = dec!(12);
const BISECTION_ITERATIONS: u32 = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressTestResult {
    pub name: String,
    pub description: String,
    pub monthly_rent: Money,
    pub monthly_cash_flow: Money,
    pub dscr: Option<Multiple>,
    pub cash_on_cash_return: Option<Rate>,
    /// Cash flow stays non-negative and DSCR stays at or above 1.0
    pub passes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakEvenMetrics {
    /// Rent at which monthly cash flow is zero
    pub minimum_rent: Option<Money>,
    /// Share of current rent that could be lost before cash flow turns negative
    pub rent_cushion: Option<Rate>,
    /// Highest vacancy rate with non-negative cash flow
    pub maximum_vacancy_rate: Option<Rate>,
    /// Highest interest rate at which NOI still covers debt service;
    /// `None` without a loan
    pub maximum_interest_rate: Option<Rate>,
    /// Highest price that still earns the target cash-on-cash return;
    /// `None` when no positive price does
    pub max_purchase_price: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAnalysis {
    pub scenarios: Vec<StressTestResult>,
    pub scenarios_passed: usize,
    pub scenarios_failed: usize,
    /// Failing scenarios as a share of all scenarios, 0-100
    pub risk_score: Decimal,
    pub break_even: BreakEvenMetrics,
}

impl RiskAnalysis {
    pub fn failed(&self) -> impl Iterator<Item = &StressTestResult> {
        self.scenarios.iter().filter(|s| !s.passes)
    }
}

// ---------------------------------------------------------------------------
// Stress scenarios
// ---------------------------------------------------------------------------

fn stress_one(
    scenario: &StressScenarioSpec,
    monthly_rent: Money,
    loan: &LoanDetails,
    expenses: &ExpenseBreakdown,
    total_cash_invested: Money,
) -> RealtyResult<StressTestResult> {
    let rent = monthly_rent * scenario.rent_multiplier;
    let vacancy_rate = (expenses.vacancy_rate * scenario.vacancy_multiplier).min(Decimal::ONE);

    let vacancy = rent * vacancy_rate;
    let management = rent * expenses.management_fee_pct;
    let maintenance = rent * expenses.maintenance_pct * scenario.expense_multiplier;
    let fixed = expenses.fixed() * scenario.expense_multiplier;
    let operating = vacancy + management + maintenance + fixed;

    let shocked_rate = (loan.interest_rate + scenario.rate_shift).max(Decimal::ZERO);
    let principal_interest = if scenario.rate_shift.is_zero() {
        loan.monthly_principal_interest
    } else {
        monthly_payment(loan.loan_amount, shocked_rate, loan.loan_term_years)?
    };
    let debt_service = principal_interest + loan.monthly_mortgage_insurance;

    let monthly_cash_flow = rent - operating - debt_service;
    let noi = (rent - operating) * MONTHS_PER_YEAR;
    let dscr = safe_ratio(noi, debt_service * MONTHS_PER_YEAR);

    let passes = monthly_cash_flow >= Decimal::ZERO && dscr.map_or(true, |d| d >= Decimal::ONE);

    Ok(StressTestResult {
        name: scenario.name.clone(),
        description: scenario.description.clone(),
        monthly_rent: cents(rent),
        monthly_cash_flow: cents(monthly_cash_flow),
        dscr: dscr.map(ratio),
        cash_on_cash_return: safe_ratio(monthly_cash_flow * MONTHS_PER_YEAR, total_cash_invested).map(ratio),
        passes,
    })
}

/// Re-run the monthly numbers under each configured scenario and compute
/// break-even figures for the base case.
pub fn run_stress_tests(
    monthly_rent: Money,
    loan: &LoanDetails,
    expenses: &ExpenseBreakdown,
    total_cash_invested: Money,
    renovation_budget: Money,
    assumptions: &RiskAssumptions,
) -> RealtyResult<RiskAnalysis> {
    let scenarios = assumptions
        .scenarios
        .iter()
        .map(|scenario| stress_one(scenario, monthly_rent, loan, expenses, total_cash_invested))
        .collect::<RealtyResult<Vec<_>>>()?;

    let scenarios_failed = scenarios.iter().filter(|s| !s.passes).count();
    let scenarios_passed = scenarios.len() - scenarios_failed;
    let risk_score = safe_ratio(Decimal::from(scenarios_failed as u64) * dec!(100), Decimal::from(scenarios.len() as u64))
        .map(|s| s.round_dp(2))
        .unwrap_or(Decimal::ZERO);

    let break_even = break_even_metrics(
        monthly_rent,
        loan,
        expenses,
        total_cash_invested,
        renovation_budget,
        assumptions,
    )?;

    Ok(RiskAnalysis {
        scenarios,
        scenarios_passed,
        scenarios_failed,
        risk_score,
        break_even,
    })
}

// ---------------------------------------------------------------------------
// Break-even
// ---------------------------------------------------------------------------

pub fn break_even_metrics(
    monthly_rent: Money,
    loan: &LoanDetails,
    expenses: &ExpenseBreakdown,
    total_cash_invested: Money,
    renovation_budget: Money,
    assumptions: &RiskAssumptions,
) -> RealtyResult<BreakEvenMetrics> {
    let fixed_and_debt = expenses.fixed() + loan.monthly_debt_service();
    let rent_share_left = Decimal::ONE - expenses.rent_linked_pct();

    // rent * (1 - v - m - maint) = fixed + debt service
    let minimum_rent = if rent_share_left > Decimal::ZERO {
        Some(cents(fixed_and_debt / rent_share_left))
    } else {
        None
    };
    let rent_cushion = minimum_rent
        .and_then(|min| safe_ratio(monthly_rent - min, monthly_rent))
        .map(ratio);

    let maximum_vacancy_rate = safe_ratio(fixed_and_debt, monthly_rent).map(|burden| {
        let other_linked = expenses.management_fee_pct + expenses.maintenance_pct;
        ratio((Decimal::ONE - other_linked - burden).clamp(Decimal::ZERO, Decimal::ONE))
    });

    let monthly_noi = monthly_rent - expenses.total_monthly_expenses;
    let maximum_interest_rate = max_interest_rate(monthly_noi, loan, assumptions.max_rate_search_ceiling)?;

    let max_purchase_price = max_purchase_price(
        monthly_rent,
        loan,
        expenses,
        total_cash_invested,
        renovation_budget,
        assumptions.target_cash_on_cash,
    );

    Ok(BreakEvenMetrics {
        minimum_rent,
        rent_cushion,
        maximum_vacancy_rate,
        maximum_interest_rate,
        max_purchase_price,
    })
}

/// Price at which cash-on-cash return equals `target`.
///
/// Debt service, tax, insurance, down payment and closing costs scale with
/// the price at the same down-payment share and rate; rent, the rent-linked
/// expenses, HOA and the renovation budget do not. With price scale `s`:
/// `12 * (A - s*B) = target * (s*C + R)`.
fn max_purchase_price(
    monthly_rent: Money,
    loan: &LoanDetails,
    expenses: &ExpenseBreakdown,
    total_cash_invested: Money,
    renovation_budget: Money,
    target: Rate,
) -> Option<Money> {
    let unscaled = monthly_rent - expenses.rent_linked() - expenses.hoa;
    let scaled = expenses.property_tax + expenses.insurance + loan.monthly_debt_service();
    let price_linked_cash = total_cash_invested - renovation_budget;

    let numerator = MONTHS_PER_YEAR * unscaled - target * renovation_budget;
    let denominator = MONTHS_PER_YEAR * scaled + target * price_linked_cash;
    if numerator <= Decimal::ZERO || denominator <= Decimal::ZERO {
        return None;
    }
    Some(cents(loan.purchase_price * numerator / denominator))
}

/// Bisection on the annual rate for P&I + MI = monthly NOI.
fn max_interest_rate(monthly_noi: Money, loan: &LoanDetails, ceiling: Rate) -> RealtyResult<Option<Rate>> {
    if loan.loan_amount <= Decimal::ZERO {
        return Ok(None);
    }

    let covers = |rate: Rate| -> RealtyResult<bool> {
        let pi = monthly_payment(loan.loan_amount, rate, loan.loan_term_years)?;
        Ok(pi + loan.monthly_mortgage_insurance <= monthly_noi)
    };

    if !covers(Decimal::ZERO)? {
        return Ok(Some(Decimal::ZERO));
    }
    if covers(ceiling)? {
        return Ok(Some(ceiling));
    }

    let mut low = Decimal::ZERO;
    let mut high = ceiling;
    for _ in 0..BISECTION_ITERATIONS {
        let mid = (low + high) / dec!(2);
        if covers(mid)? {
            low = mid;
        } else {
            high = mid;
        }
        if high - low < dec!(0.000001) {
            break;
        }
    }

    Ok(Some(low.round_dp(4)))
}
