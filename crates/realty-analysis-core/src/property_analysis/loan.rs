use rust_decimal::prelude::MathematicalOps;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::RealtyError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::RealtyResult;

use super::assumptions::{LoanAssumptions, LoanProgram};
use super::expenses::ExpenseBreakdown;
use super::inputs::{validate_loan_parameters, validate_payment_parameters, AnalysisConfig, LoanType, MAX_LOAN_TERM_YEARS};
use super::{cents, pct, ratio};

const MONTHS_PER_YEAR: u32 = 12;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Which kind of monthly insurance or guarantee fee the loan carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MortgageInsuranceKind {
    None,
    /// Conventional private mortgage insurance
    Pmi,
    /// FHA mortgage insurance premium
    FhaMip,
    /// USDA annual guarantee fee
    UsdaGuaranteeFee,
}

/// Everything the loan calculator needs, already resolved from config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub purchase_price: Money,
    pub loan_type: LoanType,
    pub interest_rate: Rate,
    pub loan_term_years: u32,
    /// `None` uses the program default
    pub down_payment_pct: Option<Rate>,
    pub closing_cost_pct: Rate,
    pub finance_upfront_fees: bool,
    pub monthly_property_tax: Money,
    pub monthly_insurance: Money,
}

impl LoanTerms {
    /// Terms for `price`, taking tax and insurance from the expense estimate
    /// so they are counted identically in the payment and the expenses.
    pub fn from_config(
        purchase_price: Money,
        config: &AnalysisConfig,
        closing_cost_pct: Rate,
        expenses: &ExpenseBreakdown,
    ) -> Self {
        Self {
            purchase_price,
            loan_type: config.loan_type,
            interest_rate: config.interest_rate,
            loan_term_years: config.loan_term_years,
            down_payment_pct: config.down_payment_pct,
            closing_cost_pct,
            finance_upfront_fees: config.finance_upfront_fees,
            monthly_property_tax: expenses.property_tax,
            monthly_insurance: expenses.insurance,
        }
    }
}

/// One year of the amortization schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmortizationYear {
    pub year: u32,
    pub principal_paid: Money,
    pub interest_paid: Money,
    pub mortgage_insurance_paid: Money,
    pub ending_balance: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanDetails {
    pub loan_type: LoanType,
    pub purchase_price: Money,
    /// Effective down payment after applying the program minimum
    pub down_payment_pct: Rate,
    pub down_payment_amount: Money,
    /// Price less down payment, before any financed fees
    pub base_loan_amount: Money,
    /// Upfront program fees added to the loan balance
    pub financed_fees: Money,
    pub loan_amount: Money,
    pub loan_to_value: Rate,
    pub interest_rate: Rate,
    pub loan_term_years: u32,
    pub monthly_principal_interest: Money,
    pub mortgage_insurance_kind: MortgageInsuranceKind,
    pub monthly_mortgage_insurance: Money,
    pub monthly_property_tax: Money,
    pub monthly_insurance: Money,
    /// P&I + tax + insurance + mortgage insurance
    pub total_monthly_payment: Money,
    /// Upfront MIP, VA funding fee or USDA guarantee fee
    pub upfront_fees: Money,
    /// Purchase closing costs plus upfront fees paid in cash
    pub closing_costs: Money,
    pub total_interest: Money,
    pub total_cost_of_loan: Money,
    pub amortization: Vec<AmortizationYear>,
}

impl LoanDetails {
    /// Monthly P&I plus mortgage insurance.
    pub fn monthly_debt_service(&self) -> Money {
        self.monthly_principal_interest + self.monthly_mortgage_insurance
    }

    /// Balance remaining after `year` full years, zero once paid off.
    pub fn balance_at_year(&self, year: u32) -> Money {
        if year == 0 {
            return self.loan_amount;
        }
        self.amortization
            .iter()
            .find(|row| row.year == year)
            .map(|row| row.ending_balance)
            .unwrap_or(Decimal::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Payment math
// ---------------------------------------------------------------------------

/// Fixed monthly principal-and-interest payment:
/// `M = P * r(1+r)^n / ((1+r)^n - 1)` with `r = annual_rate / 12` and
/// `n = term_years * 12`. A zero rate amortises straight-line (`P / n`).
pub fn monthly_payment(principal: Money, annual_rate: Rate, term_years: u32) -> RealtyResult<Money> {
    if principal < Decimal::ZERO {
        return Err(RealtyError::invalid_loan("principal", "Loan principal cannot be negative"));
    }
    if annual_rate < Decimal::ZERO {
        return Err(RealtyError::invalid_loan("interest_rate", "Interest rate cannot be negative"));
    }
    if term_years == 0 {
        return Err(RealtyError::invalid_loan(
            "loan_term_years",
            "Loan term must be at least 1 year",
        ));
    }
    if term_years > MAX_LOAN_TERM_YEARS {
        return Err(RealtyError::invalid_loan(
            "loan_term_years",
            format!("Loan term cannot exceed {MAX_LOAN_TERM_YEARS} years"),
        ));
    }

    let total_months = term_years * MONTHS_PER_YEAR;
    let monthly_rate = annual_rate / Decimal::from(MONTHS_PER_YEAR);

    if monthly_rate.is_zero() {
        return Ok(principal / Decimal::from(total_months));
    }

    let overflow = || {
        RealtyError::invalid_loan(
            "interest_rate",
            format!("Payment overflows at rate {annual_rate} over {term_years} years; rates are fractions (0.065 = 6.5%)"),
        )
    };

    let compound = (Decimal::ONE + monthly_rate)
        .checked_powu(u64::from(total_months))
        .ok_or_else(overflow)?;

    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return Err(RealtyError::DivisionByZero {
            context: "mortgage payment denominator".into(),
        });
    }

    let numerator = principal
        .checked_mul(monthly_rate)
        .and_then(|v| v.checked_mul(compound))
        .ok_or_else(overflow)?;
    Ok(numerator / denominator)
}

/// Yearly amortization rows for a fully amortising loan. Mortgage insurance
/// is charged flat for the life of the loan.
pub fn amortization_schedule(
    principal: Money,
    annual_rate: Rate,
    term_years: u32,
    monthly_mortgage_insurance: Money,
) -> RealtyResult<Vec<AmortizationYear>> {
    let payment = monthly_payment(principal, annual_rate, term_years)?;
    let monthly_rate = annual_rate / Decimal::from(MONTHS_PER_YEAR);

    let mut balance = principal;
    let mut rows = Vec::with_capacity(term_years as usize);

    for year in 1..=term_years {
        let mut principal_paid = Decimal::ZERO;
        let mut interest_paid = Decimal::ZERO;

        for _ in 0..MONTHS_PER_YEAR {
            let interest = balance * monthly_rate;
            let towards_principal = (payment - interest).min(balance);
            interest_paid += interest;
            principal_paid += towards_principal;
            balance -= towards_principal;
        }

        rows.push(AmortizationYear {
            year,
            principal_paid: cents(principal_paid),
            interest_paid: cents(interest_paid),
            mortgage_insurance_paid: cents(monthly_mortgage_insurance * Decimal::from(MONTHS_PER_YEAR)),
            ending_balance: cents(balance.max(Decimal::ZERO)),
        });
    }

    Ok(rows)
}

/// Remaining balance after `months` scheduled payments.
pub fn balance_after(principal: Money, annual_rate: Rate, term_years: u32, months: u32) -> RealtyResult<Money> {
    let payment = monthly_payment(principal, annual_rate, term_years)?;
    let monthly_rate = annual_rate / Decimal::from(MONTHS_PER_YEAR);
    let months = months.min(term_years * MONTHS_PER_YEAR);

    let mut balance = principal;
    for _ in 0..months {
        let interest = balance * monthly_rate;
        balance -= (payment - interest).min(balance);
    }

    Ok(cents(balance.max(Decimal::ZERO)))
}

/// Standalone payment summary for a plain amortising loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSchedule {
    pub principal: Money,
    pub interest_rate: Rate,
    pub loan_term_years: u32,
    pub monthly_payment: Money,
    pub total_paid: Money,
    pub total_interest: Money,
    pub schedule: Vec<AmortizationYear>,
}

/// Monthly payment, lifetime interest and the yearly schedule for
/// `principal` at `annual_rate` over `term_years`.
pub fn summarize_payment(
    principal: Money,
    annual_rate: Rate,
    term_years: u32,
) -> RealtyResult<ComputationOutput<PaymentSchedule>> {
    let start = Instant::now();
    let mut warnings = Vec::new();

    validate_payment_parameters(annual_rate, term_years)?;
    let payment = monthly_payment(principal, annual_rate, term_years)?;
    let schedule = amortization_schedule(principal, annual_rate, term_years, Decimal::ZERO)?;
    let total_paid = payment * Decimal::from(term_years * MONTHS_PER_YEAR);

    if annual_rate.is_zero() {
        warnings.push("Zero interest rate: payment is straight-line principal".to_string());
    }

    let output = PaymentSchedule {
        principal,
        interest_rate: annual_rate,
        loan_term_years: term_years,
        monthly_payment: cents(payment),
        total_paid: cents(total_paid),
        total_interest: cents(total_paid - principal),
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-rate amortising loan",
        &serde_json::json!({
            "principal": principal.to_string(),
            "interest_rate": annual_rate.to_string(),
            "loan_term_years": term_years,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Loan-type adjustments
// ---------------------------------------------------------------------------

fn insurance_kind(loan_type: LoanType) -> MortgageInsuranceKind {
    match loan_type {
        LoanType::Conventional => MortgageInsuranceKind::Pmi,
        LoanType::Fha => MortgageInsuranceKind::FhaMip,
        LoanType::Usda => MortgageInsuranceKind::UsdaGuaranteeFee,
        LoanType::Va => MortgageInsuranceKind::None,
    }
}

/// Monthly insurance applies unless the program has none or the down
/// payment reaches the waiver threshold.
fn insurance_applies(program: &LoanProgram, down_payment_pct: Rate) -> bool {
    if program.annual_insurance_rate <= Decimal::ZERO {
        return false;
    }
    match program.insurance_waived_at_down_pct {
        Some(waiver) => down_payment_pct < waiver,
        None => true,
    }
}

fn resolve_down_payment(
    terms: &LoanTerms,
    program: &LoanProgram,
    warnings: &mut Vec<String>,
) -> Rate {
    let requested = terms
        .down_payment_pct
        .unwrap_or(program.default_down_payment_pct);

    if requested < program.min_down_payment_pct {
        warnings.push(format!(
            "Down payment of {} is below the {} minimum of {}; using {}",
            pct(requested),
            terms.loan_type.as_str().to_uppercase(),
            pct(program.min_down_payment_pct),
            pct(program.min_down_payment_pct),
        ));
        program.min_down_payment_pct
    } else {
        requested
    }
}

/// Full loan picture for one purchase: down payment, program fees, monthly
/// payment components and the amortization schedule.
pub fn calculate_loan(
    terms: &LoanTerms,
    programs: &LoanAssumptions,
    warnings: &mut Vec<String>,
) -> RealtyResult<LoanDetails> {
    validate_loan_parameters(terms.interest_rate, terms.loan_term_years, terms.down_payment_pct)?;
    if terms.purchase_price <= Decimal::ZERO {
        return Err(RealtyError::invalid_input(
            "purchase_price",
            "Purchase price must be positive",
        ));
    }

    let program = programs.program(terms.loan_type);
    let down_payment_pct = resolve_down_payment(terms, program, warnings);
    let down_payment_amount = terms.purchase_price * down_payment_pct;
    let base_loan_amount = terms.purchase_price - down_payment_amount;

    if let Some(limit) = program.loan_limit {
        if base_loan_amount > limit {
            warnings.push(format!(
                "Loan amount {} exceeds the {} loan limit of {}",
                cents(base_loan_amount),
                terms.loan_type.as_str().to_uppercase(),
                limit
            ));
        }
    }

    let upfront_fees = base_loan_amount * program.upfront_fee_pct;
    let financed_fees = if terms.finance_upfront_fees {
        upfront_fees
    } else {
        Decimal::ZERO
    };
    let loan_amount = base_loan_amount + financed_fees;

    let purchase_closing = terms.purchase_price * terms.closing_cost_pct;
    let closing_costs = purchase_closing + (upfront_fees - financed_fees);

    let (mortgage_insurance_kind, monthly_mortgage_insurance) =
        if insurance_applies(program, down_payment_pct) && loan_amount > Decimal::ZERO {
            (
                insurance_kind(terms.loan_type),
                loan_amount * program.annual_insurance_rate / Decimal::from(MONTHS_PER_YEAR),
            )
        } else {
            (MortgageInsuranceKind::None, Decimal::ZERO)
        };

    let monthly_pi = monthly_payment(loan_amount, terms.interest_rate, terms.loan_term_years)?;
    let amortization = amortization_schedule(
        loan_amount,
        terms.interest_rate,
        terms.loan_term_years,
        cents(monthly_mortgage_insurance),
    )?;

    let total_payments = Decimal::from(terms.loan_term_years * MONTHS_PER_YEAR);
    let total_interest = (monthly_pi * total_payments - loan_amount).max(Decimal::ZERO);

    let monthly_principal_interest = cents(monthly_pi);
    let monthly_mortgage_insurance = cents(monthly_mortgage_insurance);
    let total_monthly_payment = monthly_principal_interest
        + monthly_mortgage_insurance
        + terms.monthly_property_tax
        + terms.monthly_insurance;

    Ok(LoanDetails {
        loan_type: terms.loan_type,
        purchase_price: terms.purchase_price,
        down_payment_pct,
        down_payment_amount: cents(down_payment_amount),
        base_loan_amount: cents(base_loan_amount),
        financed_fees: cents(financed_fees),
        loan_amount: cents(loan_amount),
        loan_to_value: ratio(loan_amount / terms.purchase_price),
        interest_rate: terms.interest_rate,
        loan_term_years: terms.loan_term_years,
        monthly_principal_interest,
        mortgage_insurance_kind,
        monthly_mortgage_insurance,
        monthly_property_tax: terms.monthly_property_tax,
        monthly_insurance: terms.monthly_insurance,
        total_monthly_payment: cents(total_monthly_payment),
        upfront_fees: cents(upfront_fees),
        closing_costs: cents(closing_costs),
        total_interest: cents(total_interest),
        total_cost_of_loan: cents(loan_amount + total_interest),
        amortization,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn terms(loan_type: LoanType, down: Option<Rate>) -> LoanTerms {
        LoanTerms {
            purchase_price: dec!(300000),
            loan_type,
            interest_rate: dec!(0.065),
            loan_term_years: 30,
            down_payment_pct: down,
            closing_cost_pct: dec!(0.03),
            finance_upfront_fees: false,
            monthly_property_tax: dec!(300),
            monthly_insurance: dec!(125),
        }
    }

    #[test]
    fn test_monthly_payment_known_value() {
        let pmt = monthly_payment(dec!(240000), dec!(0.065), 30).unwrap();
        assert!((pmt - dec!(1516.96)).abs() < dec!(0.01), "got {pmt}");
    }

    #[test]
    fn test_zero_rate_is_straight_line() {
        let pmt = monthly_payment(dec!(120000), Decimal::ZERO, 10).unwrap();
        assert_eq!(pmt, dec!(1000));
    }

    #[test]
    fn test_payment_rejects_bad_parameters() {
        assert!(matches!(
            monthly_payment(dec!(1000), dec!(-0.01), 30),
            Err(RealtyError::InvalidLoanParameters { .. })
        ));
        assert!(matches!(
            monthly_payment(dec!(1000), dec!(0.05), 0),
            Err(RealtyError::InvalidLoanParameters { .. })
        ));
        assert!(matches!(
            monthly_payment(dec!(-1), dec!(0.05), 30),
            Err(RealtyError::InvalidLoanParameters { .. })
        ));
    }

    #[test]
    fn test_payment_overflow_is_an_error() {
        // A percentage passed where a fraction is expected
        assert!(matches!(
            monthly_payment(dec!(240000), dec!(6.5), 30),
            Err(RealtyError::InvalidLoanParameters { .. })
        ));
        assert!(matches!(
            monthly_payment(dec!(240000), dec!(0.9), 100),
            Err(RealtyError::InvalidLoanParameters { .. })
        ));
    }

    #[test]
    fn test_summarize_payment_validates_rate_and_term() {
        assert!(matches!(
            summarize_payment(dec!(240000), dec!(6.5), 30),
            Err(RealtyError::InvalidLoanParameters { .. })
        ));
        assert!(matches!(
            summarize_payment(dec!(240000), dec!(0.065), 51),
            Err(RealtyError::InvalidLoanParameters { .. })
        ));
        let zero = summarize_payment(dec!(120000), Decimal::ZERO, 10).unwrap();
        assert_eq!(zero.result.monthly_payment, dec!(1000));
        assert_eq!(zero.warnings.len(), 1);
    }

    #[test]
    fn test_amortization_pays_off_loan() {
        let rows = amortization_schedule(dec!(240000), dec!(0.065), 30, Decimal::ZERO).unwrap();
        assert_eq!(rows.len(), 30);
        let principal: Decimal = rows.iter().map(|r| r.principal_paid).sum();
        assert!((principal - dec!(240000)).abs() < dec!(1));
        assert!(rows.last().unwrap().ending_balance < dec!(1));
        // Early years are interest-heavy
        assert!(rows[0].interest_paid > rows[0].principal_paid);
    }

    #[test]
    fn test_balance_after_twelve_months() {
        let balance = balance_after(dec!(240000), dec!(0.065), 30, 12).unwrap();
        let rows = amortization_schedule(dec!(240000), dec!(0.065), 30, Decimal::ZERO).unwrap();
        assert!((balance - rows[0].ending_balance).abs() <= dec!(0.01));
        assert!(balance < dec!(240000) && balance > dec!(237000));
    }

    #[test]
    fn test_summarize_payment() {
        let out = summarize_payment(dec!(240000), dec!(0.065), 30).unwrap();
        assert_eq!(out.result.monthly_payment, dec!(1516.96));
        assert_eq!(out.result.schedule.len(), 30);
        assert!(out.result.total_interest > dec!(300000));
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_conventional_twenty_percent_no_pmi() {
        let mut warnings = Vec::new();
        let loan = calculate_loan(
            &terms(LoanType::Conventional, None),
            &LoanAssumptions::default(),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(loan.down_payment_pct, dec!(0.20));
        assert_eq!(loan.loan_amount, dec!(240000));
        assert_eq!(loan.monthly_mortgage_insurance, Decimal::ZERO);
        assert_eq!(loan.mortgage_insurance_kind, MortgageInsuranceKind::None);
        assert_eq!(loan.closing_costs, dec!(9000));
        assert_eq!(
            loan.total_monthly_payment,
            loan.monthly_principal_interest + dec!(425)
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_conventional_low_down_adds_pmi() {
        let mut warnings = Vec::new();
        let loan = calculate_loan(
            &terms(LoanType::Conventional, Some(dec!(0.10))),
            &LoanAssumptions::default(),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(loan.mortgage_insurance_kind, MortgageInsuranceKind::Pmi);
        // 270,000 * 0.005 / 12
        assert_eq!(loan.monthly_mortgage_insurance, dec!(112.50));
    }

    #[test]
    fn test_fha_mip_and_upfront_fee() {
        let mut warnings = Vec::new();
        let loan = calculate_loan(
            &terms(LoanType::Fha, Some(dec!(0.035))),
            &LoanAssumptions::default(),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(loan.loan_amount, dec!(289500));
        assert_eq!(loan.mortgage_insurance_kind, MortgageInsuranceKind::FhaMip);
        assert_eq!(loan.monthly_mortgage_insurance, cents(dec!(289500) * dec!(0.0085) / dec!(12)));
        assert_eq!(loan.upfront_fees, dec!(5066.25));
        assert_eq!(loan.closing_costs, dec!(9000) + dec!(5066.25));
    }

    #[test]
    fn test_down_payment_raised_to_program_minimum() {
        let mut warnings = Vec::new();
        let loan = calculate_loan(
            &terms(LoanType::Fha, Some(dec!(0.01))),
            &LoanAssumptions::default(),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(loan.down_payment_pct, dec!(0.035));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("below the FHA minimum"));
    }

    #[test]
    fn test_va_financed_funding_fee() {
        let mut t = terms(LoanType::Va, None);
        t.finance_upfront_fees = true;
        t.closing_cost_pct = Decimal::ZERO;
        let mut warnings = Vec::new();
        let loan = calculate_loan(&t, &LoanAssumptions::default(), &mut warnings).unwrap();
        assert_eq!(loan.down_payment_amount, Decimal::ZERO);
        assert_eq!(loan.financed_fees, dec!(6450));
        assert_eq!(loan.loan_amount, dec!(306450));
        assert_eq!(loan.closing_costs, Decimal::ZERO);
        assert_eq!(loan.monthly_mortgage_insurance, Decimal::ZERO);
    }

    #[test]
    fn test_usda_guarantee_fee_is_separate_kind() {
        let mut warnings = Vec::new();
        let loan = calculate_loan(&terms(LoanType::Usda, None), &LoanAssumptions::default(), &mut warnings)
            .unwrap();
        assert_eq!(loan.mortgage_insurance_kind, MortgageInsuranceKind::UsdaGuaranteeFee);
        assert_eq!(loan.monthly_mortgage_insurance, dec!(87.50));
        assert_eq!(loan.upfront_fees, dec!(3000));
    }

    #[test]
    fn test_loan_limit_warning() {
        let mut t = terms(LoanType::Fha, None);
        t.purchase_price = dec!(600000);
        let mut warnings = Vec::new();
        calculate_loan(&t, &LoanAssumptions::default(), &mut warnings).unwrap();
        assert!(warnings.iter().any(|w| w.contains("loan limit")));
    }

    #[test]
    fn test_calculate_loan_rejects_zero_rate() {
        let mut t = terms(LoanType::Conventional, None);
        t.interest_rate = Decimal::ZERO;
        let mut warnings = Vec::new();
        assert!(matches!(
            calculate_loan(&t, &LoanAssumptions::default(), &mut warnings),
            Err(RealtyError::InvalidLoanParameters { .. })
        ));
    }
}
