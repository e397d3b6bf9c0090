//! Every default rate, loan-program parameter and scoring threshold used by
//! the analysis, gathered in one serde value object.
//!
//! The defaults are product decisions rather than derived constants. They
//! are passed explicitly to the estimator, loan calculator and scorer so a
//! caller can override any of them per analysis.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RealtyError;
use crate::types::{Money, Rate};
use crate::RealtyResult;

use super::inputs::{
    check_fraction, check_growth_rate, check_hold_years, check_non_negative, LoanType, MAX_LOAN_TERM_YEARS,
};

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisAssumptions {
    pub expenses: ExpenseAssumptions,
    pub loans: LoanAssumptions,
    pub deal: DealAssumptions,
    pub projection: ProjectionAssumptions,
    pub risk: RiskAssumptions,
    pub tax: TaxAssumptions,
    pub scoring: ScoringRules,
}

impl AnalysisAssumptions {
    /// Reject overrides the arithmetic cannot use: rates outside their
    /// ranges, negative multipliers, bands out of order.
    pub fn validate(&self) -> RealtyResult<()> {
        let e = &self.expenses;
        for (value, field) in [
            (e.property_tax_rate, "expenses.property_tax_rate"),
            (e.insurance_rate, "expenses.insurance_rate"),
            (e.maintenance_pct, "expenses.maintenance_pct"),
            (e.vacancy_rate, "expenses.vacancy_rate"),
            (e.management_fee_pct, "expenses.management_fee_pct"),
            (e.house_hack_management_fee_pct, "expenses.house_hack_management_fee_pct"),
            (e.min_prudent_vacancy_rate, "expenses.min_prudent_vacancy_rate"),
        ] {
            check_fraction(value, field)?;
        }

        for (name, program) in [
            ("conventional", &self.loans.conventional),
            ("fha", &self.loans.fha),
            ("va", &self.loans.va),
            ("usda", &self.loans.usda),
        ] {
            program.validate(name)?;
        }

        let d = &self.deal;
        check_fraction(d.closing_cost_pct, "deal.closing_cost_pct")?;
        check_fraction(d.flip_selling_cost_pct, "deal.flip_selling_cost_pct")?;
        check_unit_interval(d.flip_max_cost_to_arv, "deal.flip_max_cost_to_arv")?;
        check_unit_interval(d.refinance_ltv, "deal.refinance_ltv")?;
        if d.refinance_seasoning_months > MAX_LOAN_TERM_YEARS * 12 {
            return Err(RealtyError::invalid_input(
                "deal.refinance_seasoning_months",
                "Seasoning period cannot exceed the longest loan term",
            ));
        }

        let p = &self.projection;
        check_hold_years(p.hold_years)?;
        check_growth_rate(p.appreciation_rate, "projection.appreciation_rate")?;
        check_growth_rate(p.rent_growth_rate, "projection.rent_growth_rate")?;
        check_growth_rate(p.expense_growth_rate, "projection.expense_growth_rate")?;
        check_growth_rate(p.discount_rate, "projection.discount_rate")?;
        check_fraction(p.exit_selling_cost_pct, "projection.exit_selling_cost_pct")?;

        for scenario in &self.risk.scenarios {
            scenario.validate()?;
        }
        let ceiling = self.risk.max_rate_search_ceiling;
        if ceiling <= Decimal::ZERO || ceiling >= Decimal::ONE {
            return Err(RealtyError::invalid_input(
                "risk.max_rate_search_ceiling",
                format!("Expected a rate in (0, 1), got {ceiling}"),
            ));
        }
        check_unit_interval(self.risk.target_cash_on_cash, "risk.target_cash_on_cash")?;

        self.tax.validate()?;
        self.scoring.bands.validate()
    }
}

/// `(0, 1]`
fn check_unit_interval(value: Rate, field: &str) -> RealtyResult<()> {
    if value <= Decimal::ZERO || value > Decimal::ONE {
        return Err(RealtyError::invalid_input(
            field,
            format!("Expected a fraction in (0, 1], got {value}"),
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Expenses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpenseAssumptions {
    /// Annual property tax as a fraction of value, when the record has none
    pub property_tax_rate: Rate,
    /// Annual hazard insurance as a fraction of value
    pub insurance_rate: Rate,
    /// Maintenance reserve as a fraction of monthly rent
    pub maintenance_pct: Rate,
    /// Vacancy reserve as a fraction of monthly rent
    pub vacancy_rate: Rate,
    /// Property-management fee as a fraction of monthly rent
    pub management_fee_pct: Rate,
    /// Management fee for an owner-occupied house hack
    pub house_hack_management_fee_pct: Rate,
    /// Vacancy assumptions below this trigger a warning
    pub min_prudent_vacancy_rate: Rate,
}

impl Default for ExpenseAssumptions {
    fn default() -> Self {
        Self {
            property_tax_rate: dec!(0.012),
            insurance_rate: dec!(0.005),
            maintenance_pct: dec!(0.05),
            vacancy_rate: dec!(0.05),
            management_fee_pct: dec!(0.08),
            house_hack_management_fee_pct: Decimal::ZERO,
            min_prudent_vacancy_rate: dec!(0.03),
        }
    }
}

// ---------------------------------------------------------------------------
// Loan programs
// ---------------------------------------------------------------------------

/// Parameters of one loan program (conventional, FHA, VA, USDA).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanProgram {
    pub default_down_payment_pct: Rate,
    /// Down payments below this are raised to it
    pub min_down_payment_pct: Rate,
    /// Annual mortgage insurance / guarantee fee as a fraction of the loan
    pub annual_insurance_rate: Rate,
    /// Down payment at or above which monthly insurance is waived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insurance_waived_at_down_pct: Option<Rate>,
    /// One-time fee as a fraction of the base loan (UFMIP, funding fee)
    pub upfront_fee_pct: Rate,
    /// Program loan limit; exceeding it is reported as a warning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_limit: Option<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanAssumptions {
    pub conventional: LoanProgram,
    pub fha: LoanProgram,
    pub va: LoanProgram,
    pub usda: LoanProgram,
}

impl LoanProgram {
    fn validate(&self, name: &str) -> RealtyResult<()> {
        check_fraction(self.default_down_payment_pct, &format!("loans.{name}.default_down_payment_pct"))?;
        check_fraction(self.min_down_payment_pct, &format!("loans.{name}.min_down_payment_pct"))?;
        check_fraction(self.annual_insurance_rate, &format!("loans.{name}.annual_insurance_rate"))?;
        check_fraction(self.upfront_fee_pct, &format!("loans.{name}.upfront_fee_pct"))?;
        if let Some(waiver) = self.insurance_waived_at_down_pct {
            check_fraction(waiver, &format!("loans.{name}.insurance_waived_at_down_pct"))?;
        }
        if let Some(limit) = self.loan_limit {
            check_non_negative(limit, &format!("loans.{name}.loan_limit"))?;
        }
        Ok(())
    }
}

impl LoanAssumptions {
    pub fn program(&self, loan_type: LoanType) -> &LoanProgram {
        match loan_type {
            LoanType::Conventional => &self.conventional,
            LoanType::Fha => &self.fha,
            LoanType::Va => &self.va,
            LoanType::Usda => &self.usda,
        }
    }
}

impl Default for LoanAssumptions {
    fn default() -> Self {
        Self {
            conventional: LoanProgram {
                default_down_payment_pct: dec!(0.20),
                min_down_payment_pct: dec!(0.05),
                annual_insurance_rate: dec!(0.005),
                insurance_waived_at_down_pct: Some(dec!(0.20)),
                upfront_fee_pct: Decimal::ZERO,
                loan_limit: Some(dec!(766550)),
            },
            fha: LoanProgram {
                default_down_payment_pct: dec!(0.035),
                min_down_payment_pct: dec!(0.035),
                annual_insurance_rate: dec!(0.0085),
                insurance_waived_at_down_pct: None,
                upfront_fee_pct: dec!(0.0175),
                loan_limit: Some(dec!(498257)),
            },
            va: LoanProgram {
                default_down_payment_pct: Decimal::ZERO,
                min_down_payment_pct: Decimal::ZERO,
                annual_insurance_rate: Decimal::ZERO,
                insurance_waived_at_down_pct: None,
                upfront_fee_pct: dec!(0.0215),
                loan_limit: None,
            },
            usda: LoanProgram {
                default_down_payment_pct: Decimal::ZERO,
                min_down_payment_pct: Decimal::ZERO,
                annual_insurance_rate: dec!(0.0035),
                insurance_waived_at_down_pct: None,
                upfront_fee_pct: dec!(0.01),
                loan_limit: None,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Deal-level defaults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealAssumptions {
    /// Purchase closing costs as a fraction of price (excl. program fees)
    pub closing_cost_pct: Rate,
    /// Flip selling costs (commission + closing) as a fraction of ARV
    pub flip_selling_cost_pct: Rate,
    /// "70% rule": purchase + renovation should not exceed this share of ARV
    pub flip_max_cost_to_arv: Rate,
    /// BRRRR cash-out refinance loan-to-value
    pub refinance_ltv: Rate,
    /// Months of payments on the purchase loan before the refinance
    pub refinance_seasoning_months: u32,
}

impl Default for DealAssumptions {
    fn default() -> Self {
        Self {
            closing_cost_pct: dec!(0.03),
            flip_selling_cost_pct: dec!(0.08),
            flip_max_cost_to_arv: dec!(0.70),
            refinance_ltv: dec!(0.75),
            refinance_seasoning_months: 12,
        }
    }
}

// ---------------------------------------------------------------------------
// Hold projection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionAssumptions {
    pub hold_years: u32,
    pub appreciation_rate: Rate,
    pub rent_growth_rate: Rate,
    pub expense_growth_rate: Rate,
    /// Selling costs at exit as a fraction of sale price
    pub exit_selling_cost_pct: Rate,
    /// Discount rate for the NPV of the hold
    pub discount_rate: Rate,
}

impl Default for ProjectionAssumptions {
    fn default() -> Self {
        Self {
            hold_years: 10,
            appreciation_rate: dec!(0.04),
            rent_growth_rate: dec!(0.03),
            expense_growth_rate: dec!(0.02),
            exit_selling_cost_pct: dec!(0.06),
            discount_rate: dec!(0.08),
        }
    }
}

// ---------------------------------------------------------------------------
// Stress testing
// ---------------------------------------------------------------------------

/// One stress scenario, expressed as shocks to the base case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressScenarioSpec {
    pub name: String,
    pub description: String,
    /// Multiplier on the vacancy rate
    pub vacancy_multiplier: Decimal,
    /// Multiplier on gross rent
    pub rent_multiplier: Decimal,
    /// Multiplier on non-rent-linked expenses (tax, insurance, HOA, maintenance)
    pub expense_multiplier: Decimal,
    /// Added to the annual interest rate
    pub rate_shift: Rate,
}

impl StressScenarioSpec {
    fn new(name: &str, description: &str, vacancy: Decimal, rent: Decimal, expense: Decimal, rate: Rate) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            vacancy_multiplier: vacancy,
            rent_multiplier: rent,
            expense_multiplier: expense,
            rate_shift: rate,
        }
    }
}

impl StressScenarioSpec {
    fn validate(&self) -> RealtyResult<()> {
        for (value, what) in [
            (self.vacancy_multiplier, "vacancy_multiplier"),
            (self.rent_multiplier, "rent_multiplier"),
            (self.expense_multiplier, "expense_multiplier"),
        ] {
            check_non_negative(value, &format!("risk.scenarios[{}].{what}", self.name))?;
        }
        if self.rate_shift <= dec!(-1) || self.rate_shift >= Decimal::ONE {
            return Err(RealtyError::invalid_input(
                &format!("risk.scenarios[{}].rate_shift", self.name),
                "Rate shift must be a fraction in (-1, 1)",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskAssumptions {
    pub scenarios: Vec<StressScenarioSpec>,
    /// Upper bound for the break-even interest-rate search
    pub max_rate_search_ceiling: Rate,
    /// Cash-on-cash return the maximum purchase price is solved for
    pub target_cash_on_cash: Rate,
}

impl Default for RiskAssumptions {
    fn default() -> Self {
        let one = Decimal::ONE;
        Self {
            scenarios: vec![
                StressScenarioSpec::new("Vacancy Doubles", "Vacancy rate doubles", dec!(2), one, one, Decimal::ZERO),
                StressScenarioSpec::new("Rate +2%", "Interest rate rises by 2 points", one, one, one, dec!(0.02)),
                StressScenarioSpec::new("Rent -10%", "Rents decline 10%", one, dec!(0.90), one, Decimal::ZERO),
                StressScenarioSpec::new("Rent -20%", "Rents decline 20%", one, dec!(0.80), one, Decimal::ZERO),
                StressScenarioSpec::new("Expense Surge", "Operating expenses increase 50%", one, one, dec!(1.50), Decimal::ZERO),
                StressScenarioSpec::new(
                    "Combined Downturn",
                    "Vacancy +50%, rent -10%, expenses +20%",
                    dec!(1.5),
                    dec!(0.90),
                    dec!(1.20),
                    Decimal::ZERO,
                ),
            ],
            max_rate_search_ceiling: dec!(0.25),
            target_cash_on_cash: dec!(0.08),
        }
    }
}

// ---------------------------------------------------------------------------
// Income tax
// ---------------------------------------------------------------------------

/// Federal income-tax treatment of a residential rental.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxAssumptions {
    /// Share of the purchase price attributed to land (not depreciable)
    pub land_value_pct: Rate,
    /// Straight-line recovery period for residential rental property
    pub depreciation_years: Decimal,
    pub marginal_tax_rate: Rate,
    /// Rate applied to depreciation taken, at sale
    pub recapture_tax_rate: Rate,
}

impl Default for TaxAssumptions {
    fn default() -> Self {
        Self {
            land_value_pct: dec!(0.20),
            depreciation_years: dec!(27.5),
            marginal_tax_rate: dec!(0.22),
            recapture_tax_rate: dec!(0.25),
        }
    }
}

impl TaxAssumptions {
    fn validate(&self) -> RealtyResult<()> {
        check_fraction(self.land_value_pct, "tax.land_value_pct")?;
        check_fraction(self.marginal_tax_rate, "tax.marginal_tax_rate")?;
        check_fraction(self.recapture_tax_rate, "tax.recapture_tax_rate")?;
        if self.depreciation_years <= Decimal::ZERO || self.depreciation_years > dec!(100) {
            return Err(RealtyError::invalid_input(
                "tax.depreciation_years",
                format!("Recovery period must be in (0, 100] years, got {}", self.depreciation_years),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Whether a tier is met by values at or above, or at or below, its bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierDirection {
    AtLeast,
    AtMost,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTier {
    pub bound: Decimal,
    pub points: Decimal,
}

/// Tiered points for one metric. Tiers are checked in order; the first one
/// met awards its points, otherwise `otherwise` applies (may be negative).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TieredRubric {
    pub direction: TierDirection,
    pub tiers: Vec<ScoreTier>,
    pub otherwise: Decimal,
}

impl TieredRubric {
    pub fn at_least(tiers: &[(Decimal, Decimal)], otherwise: Decimal) -> Self {
        Self::build(TierDirection::AtLeast, tiers, otherwise)
    }

    pub fn at_most(tiers: &[(Decimal, Decimal)], otherwise: Decimal) -> Self {
        Self::build(TierDirection::AtMost, tiers, otherwise)
    }

    fn build(direction: TierDirection, tiers: &[(Decimal, Decimal)], otherwise: Decimal) -> Self {
        Self {
            direction,
            tiers: tiers
                .iter()
                .map(|&(bound, points)| ScoreTier { bound, points })
                .collect(),
            otherwise,
        }
    }

    pub fn points(&self, value: Decimal) -> Decimal {
        self.tiers
            .iter()
            .find(|tier| match self.direction {
                TierDirection::AtLeast => value >= tier.bound,
                TierDirection::AtMost => value <= tier.bound,
            })
            .map(|tier| tier.points)
            .unwrap_or(self.otherwise)
    }

    /// Highest points any value can earn.
    pub fn max_points(&self) -> Decimal {
        self.tiers
            .iter()
            .map(|t| t.points)
            .fold(self.otherwise, Decimal::max)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentalRubric {
    pub cash_on_cash: TieredRubric,
    pub cap_rate: TieredRubric,
    pub dscr: TieredRubric,
    pub monthly_cash_flow: TieredRubric,
    pub rental_yield: TieredRubric,
    /// DSCR below this caps the score at `dscr_score_cap`
    pub min_dscr: Decimal,
    pub dscr_score_cap: Decimal,
}

impl Default for RentalRubric {
    fn default() -> Self {
        Self {
            cash_on_cash: TieredRubric::at_least(
                &[(dec!(0.12), dec!(30)), (dec!(0.08), dec!(20)), (dec!(0.04), dec!(10)), (Decimal::ZERO, Decimal::ZERO)],
                dec!(-20),
            ),
            cap_rate: TieredRubric::at_least(
                &[(dec!(0.08), dec!(20)), (dec!(0.06), dec!(15)), (dec!(0.04), dec!(5))],
                Decimal::ZERO,
            ),
            dscr: TieredRubric::at_least(&[(dec!(1.25), dec!(20)), (dec!(1.0), dec!(10))], Decimal::ZERO),
            monthly_cash_flow: TieredRubric::at_least(
                &[(dec!(200), dec!(15)), (Decimal::ZERO, dec!(10))],
                dec!(-10),
            ),
            rental_yield: TieredRubric::at_least(
                &[(dec!(0.10), dec!(15)), (dec!(0.08), dec!(10)), (dec!(0.06), dec!(5))],
                Decimal::ZERO,
            ),
            min_dscr: Decimal::ONE,
            dscr_score_cap: dec!(40),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipRubric {
    /// Net profit / (purchase + renovation)
    pub profit_margin: TieredRubric,
    /// Renovation budget / ARV (lower is better)
    pub renovation_to_arv: TieredRubric,
    /// Points awarded when purchase + renovation is within the 70% rule
    pub cost_rule_points: Decimal,
    /// Renovation above this share of ARV triggers a warning
    pub max_renovation_to_arv: Rate,
}

impl Default for FlipRubric {
    fn default() -> Self {
        Self {
            profit_margin: TieredRubric::at_least(
                &[
                    (dec!(0.20), dec!(50)),
                    (dec!(0.15), dec!(40)),
                    (dec!(0.10), dec!(30)),
                    (dec!(0.05), dec!(15)),
                    (Decimal::ZERO, dec!(5)),
                ],
                dec!(-20),
            ),
            renovation_to_arv: TieredRubric::at_most(
                &[(dec!(0.10), dec!(30)), (dec!(0.20), dec!(20)), (dec!(0.30), dec!(10))],
                Decimal::ZERO,
            ),
            cost_rule_points: dec!(20),
            max_renovation_to_arv: dec!(0.30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrrrrRubric {
    /// Cash left in deal / cash invested (lower is better, <= 0 is ideal)
    pub cash_left_ratio: TieredRubric,
    pub refinance_dscr: TieredRubric,
    pub post_refinance_cash_flow: TieredRubric,
    /// Refinance DSCR required for the top recommendation band
    pub top_band_min_dscr: Decimal,
    pub top_band_score_cap: Decimal,
    /// Refinance DSCR below this caps the score at `min_dscr_score_cap`
    pub min_dscr: Decimal,
    pub min_dscr_score_cap: Decimal,
    /// Cash-left ratio above this triggers a trapped-capital warning
    pub max_cash_left_ratio: Rate,
}

impl Default for BrrrrRubric {
    fn default() -> Self {
        Self {
            cash_left_ratio: TieredRubric::at_most(
                &[
                    (Decimal::ZERO, dec!(40)),
                    (dec!(0.25), dec!(30)),
                    (dec!(0.50), dec!(20)),
                    (dec!(0.75), dec!(10)),
                ],
                Decimal::ZERO,
            ),
            refinance_dscr: TieredRubric::at_least(&[(dec!(1.2), dec!(30)), (dec!(1.0), dec!(15))], Decimal::ZERO),
            post_refinance_cash_flow: TieredRubric::at_least(
                &[(dec!(200), dec!(30)), (dec!(100), dec!(20)), (Decimal::ZERO, dec!(10))],
                dec!(-10),
            ),
            top_band_min_dscr: dec!(1.2),
            top_band_score_cap: dec!(79),
            min_dscr: Decimal::ONE,
            min_dscr_score_cap: dec!(40),
            max_cash_left_ratio: dec!(0.50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseHackRubric {
    /// Rent / total monthly payment
    pub rent_coverage: TieredRubric,
    pub monthly_cash_flow: TieredRubric,
    pub cash_on_cash: TieredRubric,
    pub dscr: TieredRubric,
    /// Coverage below this triggers a warning
    pub min_rent_coverage: Rate,
}

impl Default for HouseHackRubric {
    fn default() -> Self {
        Self {
            rent_coverage: TieredRubric::at_least(
                &[(dec!(1.0), dec!(40)), (dec!(0.75), dec!(30)), (dec!(0.50), dec!(20)), (dec!(0.25), dec!(10))],
                Decimal::ZERO,
            ),
            monthly_cash_flow: TieredRubric::at_least(
                &[(Decimal::ZERO, dec!(30)), (dec!(-500), dec!(15))],
                Decimal::ZERO,
            ),
            cash_on_cash: TieredRubric::at_least(&[(dec!(0.08), dec!(15)), (Decimal::ZERO, dec!(5))], Decimal::ZERO),
            dscr: TieredRubric::at_least(&[(dec!(1.0), dec!(15))], Decimal::ZERO),
            min_rent_coverage: dec!(0.50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppreciationRubric {
    pub irr: TieredRubric,
    pub appreciation_rate: TieredRubric,
    pub equity_multiple: TieredRubric,
    pub monthly_cash_flow: TieredRubric,
}

impl Default for AppreciationRubric {
    fn default() -> Self {
        Self {
            irr: TieredRubric::at_least(
                &[(dec!(0.12), dec!(40)), (dec!(0.08), dec!(30)), (dec!(0.05), dec!(20)), (Decimal::ZERO, dec!(10))],
                dec!(-10),
            ),
            appreciation_rate: TieredRubric::at_least(
                &[(dec!(0.05), dec!(20)), (dec!(0.04), dec!(15)), (dec!(0.03), dec!(10))],
                Decimal::ZERO,
            ),
            equity_multiple: TieredRubric::at_least(
                &[(dec!(3), dec!(20)), (dec!(2), dec!(15)), (dec!(1.5), dec!(10))],
                Decimal::ZERO,
            ),
            monthly_cash_flow: TieredRubric::at_least(
                &[(Decimal::ZERO, dec!(20)), (dec!(-200), dec!(10))],
                Decimal::ZERO,
            ),
        }
    }
}

/// Lower bounds (inclusive) of each recommendation band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationBands {
    pub strong_buy: Decimal,
    pub buy: Decimal,
    pub neutral: Decimal,
    pub caution: Decimal,
}

impl Default for RecommendationBands {
    fn default() -> Self {
        Self {
            strong_buy: dec!(80),
            buy: dec!(60),
            neutral: dec!(40),
            caution: dec!(20),
        }
    }
}

impl RecommendationBands {
    /// Bounds must lie in 0-100 and strictly descend from strong buy to
    /// caution.
    pub fn validate(&self) -> RealtyResult<()> {
        let ordered = [self.strong_buy, self.buy, self.neutral, self.caution];
        if ordered.iter().any(|b| *b < Decimal::ZERO || *b > dec!(100)) {
            return Err(RealtyError::invalid_input("scoring.bands", "Band bounds must be within 0-100"));
        }
        if ordered.windows(2).any(|pair| pair[0] <= pair[1]) {
            return Err(RealtyError::invalid_input(
                "scoring.bands",
                "Bands must descend: strong_buy > buy > neutral > caution",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub rental: RentalRubric,
    pub flip: FlipRubric,
    pub brrrr: BrrrrRubric,
    pub house_hack: HouseHackRubric,
    pub appreciation: AppreciationRubric,
    pub bands: RecommendationBands,
}
