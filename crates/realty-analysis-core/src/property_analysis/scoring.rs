use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Money, Rate};

use super::assumptions::{RecommendationBands, ScoringRules, TieredRubric};
use super::cash_flow::CashFlowResult;
use super::inputs::Strategy;
use super::loan::{LoanDetails, MortgageInsuranceKind};
use super::metrics::InvestmentMetrics;
use super::pct;
use super::projection::HoldProjection;
use super::risk::RiskAnalysis;

const MAX_SCORE: Decimal = dec!(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Neutral,
    Caution,
    Avoid,
}

impl Recommendation {
    pub fn label(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "Strong Buy",
            Recommendation::Buy => "Buy",
            Recommendation::Neutral => "Neutral",
            Recommendation::Caution => "Caution",
            Recommendation::Avoid => "Avoid",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Points one metric contributed to the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub metric: String,
    pub value: Option<Decimal>,
    pub points: Decimal,
    pub max_points: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    /// 0-100
    pub score: Decimal,
    pub recommendation: Recommendation,
    pub component_scores: Vec<ComponentScore>,
    pub strengths: Vec<String>,
    pub warnings: Vec<String>,
}

/// Everything the scorer reads. All fields are results of earlier steps.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInputs<'a> {
    pub strategy: Strategy,
    pub metrics: &'a InvestmentMetrics,
    pub cash_flow: &'a CashFlowResult,
    pub loan: &'a LoanDetails,
    pub projection: Option<&'a HoldProjection>,
    pub risk: &'a RiskAnalysis,
    pub vacancy_rate: Rate,
    /// Vacancy assumptions below this are flagged
    pub min_prudent_vacancy_rate: Rate,
    pub appreciation_rate: Rate,
}

// ---------------------------------------------------------------------------
// Bands
// ---------------------------------------------------------------------------

/// Map a 0-100 score to its band. Lower bounds are inclusive.
pub fn recommendation_for(score: Decimal, bands: &RecommendationBands) -> Recommendation {
    if score >= bands.strong_buy {
        Recommendation::StrongBuy
    } else if score >= bands.buy {
        Recommendation::Buy
    } else if score >= bands.neutral {
        Recommendation::Neutral
    } else if score >= bands.caution {
        Recommendation::Caution
    } else {
        Recommendation::Avoid
    }
}

// ---------------------------------------------------------------------------
// Letter grades and strategy comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LetterGrade {
    #[serde(rename = "A+")]
    Ap,
    A,
    #[serde(rename = "A-")]
    Am,
    #[serde(rename = "B+")]
    Bp,
    B,
    #[serde(rename = "B-")]
    Bm,
    #[serde(rename = "C+")]
    Cp,
    C,
    #[serde(rename = "C-")]
    Cm,
    #[serde(rename = "D+")]
    Dp,
    D,
    #[serde(rename = "D-")]
    Dm,
    F,
}

/// Inclusive lower bound of each grade, best first.
const GRADE_FLOORS: [(Decimal, LetterGrade); 12] = [
    (dec!(95), LetterGrade::Ap),
    (dec!(90), LetterGrade::A),
    (dec!(85), LetterGrade::Am),
    (dec!(80), LetterGrade::Bp),
    (dec!(75), LetterGrade::B),
    (dec!(70), LetterGrade::Bm),
    (dec!(65), LetterGrade::Cp),
    (dec!(60), LetterGrade::C),
    (dec!(55), LetterGrade::Cm),
    (dec!(50), LetterGrade::Dp),
    (dec!(45), LetterGrade::D),
    (dec!(40), LetterGrade::Dm),
];

impl LetterGrade {
    pub fn from_score(score: Decimal) -> Self {
        GRADE_FLOORS
            .iter()
            .find(|(floor, _)| score >= *floor)
            .map_or(LetterGrade::F, |(_, grade)| *grade)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ap => "A+",
            Self::A => "A",
            Self::Am => "A-",
            Self::Bp => "B+",
            Self::B => "B",
            Self::Bm => "B-",
            Self::Cp => "C+",
            Self::C => "C",
            Self::Cm => "C-",
            Self::Dp => "D+",
            Self::D => "D",
            Self::Dm => "D-",
            Self::F => "F",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Headline score of the same property under one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyScore {
    pub strategy: Strategy,
    pub score: Decimal,
    pub grade: LetterGrade,
    pub recommendation: Recommendation,
}

impl StrategyScore {
    pub fn from_card(strategy: Strategy, card: &ScoreCard) -> Self {
        Self {
            strategy,
            score: card.score,
            grade: LetterGrade::from_score(card.score),
            recommendation: card.recommendation,
        }
    }
}

/// Highest-scoring strategy; on a tie the earlier entry wins.
pub fn best_strategy(scores: &[StrategyScore]) -> Option<Strategy> {
    scores
        .iter()
        .fold(None::<&StrategyScore>, |best, s| match best {
            Some(b) if b.score >= s.score => Some(b),
            _ => Some(s),
        })
        .map(|s| s.strategy)
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

struct Tally {
    components: Vec<ComponentScore>,
}

impl Tally {
    fn new() -> Self {
        Self { components: Vec::new() }
    }

    /// Score `value` with `rubric`; a missing value earns nothing.
    fn add(&mut self, metric: &str, value: Option<Decimal>, rubric: &TieredRubric) {
        let points = value.map_or(Decimal::ZERO, |v| rubric.points(v));
        self.components.push(ComponentScore {
            metric: metric.into(),
            value,
            points,
            max_points: rubric.max_points(),
        });
    }

    /// Like [`Tally::add`], but a missing value scores the rubric's floor
    /// when `losing` is set, so an undefined metric never beats a bad one.
    fn add_or_floor(&mut self, metric: &str, value: Option<Decimal>, rubric: &TieredRubric, losing: bool) {
        let points = match value {
            Some(v) => rubric.points(v),
            None if losing => rubric.otherwise,
            None => Decimal::ZERO,
        };
        self.components.push(ComponentScore {
            metric: metric.into(),
            value,
            points,
            max_points: rubric.max_points(),
        });
    }

    fn add_flag(&mut self, metric: &str, met: bool, points: Decimal) {
        self.components.push(ComponentScore {
            metric: metric.into(),
            value: Some(if met { Decimal::ONE } else { Decimal::ZERO }),
            points: if met { points } else { Decimal::ZERO },
            max_points: points,
        });
    }

    fn total(&self) -> Decimal {
        self.components.iter().map(|c| c.points).sum()
    }
}

fn money(value: Money) -> String {
    format!("${}", value.round_dp(2))
}

/// Score the analysis for its strategy and collect warnings and strengths.
///
/// Warnings are emitted in a fixed order: debt coverage, cash flow,
/// vacancy assumption, cash-on-cash applicability, mortgage insurance,
/// strategy-specific checks, then stress-test failures.
pub fn score_analysis(inputs: &ScoringInputs<'_>, rules: &ScoringRules) -> ScoreCard {
    let m = inputs.metrics;
    let cf = inputs.cash_flow.monthly_cash_flow;
    let held = inputs.strategy != Strategy::Flip;

    let mut tally = Tally::new();
    let mut cap: Option<Decimal> = None;
    let mut warnings = Vec::new();
    let mut strengths = Vec::new();
    let mut specific = Vec::new();

    match inputs.strategy {
        Strategy::Rental => {
            let r = &rules.rental;
            tally.add("cash_on_cash_return", m.cash_on_cash_return, &r.cash_on_cash);
            tally.add("cap_rate", m.cap_rate, &r.cap_rate);
            tally.add("dscr", m.dscr, &r.dscr);
            tally.add("monthly_cash_flow", Some(cf), &r.monthly_cash_flow);
            tally.add("rental_yield", m.rental_yield, &r.rental_yield);
            if m.dscr.is_some_and(|d| d < r.min_dscr) {
                cap = Some(r.dscr_score_cap);
            }
        }
        Strategy::Flip => {
            let r = &rules.flip;
            if let Some(flip) = &m.flip {
                tally.add("profit_margin", flip.profit_margin, &r.profit_margin);
                tally.add("renovation_to_arv", flip.renovation_to_arv, &r.renovation_to_arv);
                tally.add_flag("meets_cost_rule", flip.meets_cost_rule, r.cost_rule_points);

                if flip.net_profit < Decimal::ZERO {
                    specific.push(format!("Flip projects a loss of {}", money(-flip.net_profit)));
                }
                if flip.renovation_to_arv.is_some_and(|x| x > r.max_renovation_to_arv) {
                    specific.push(format!(
                        "Renovation budget exceeds {} of after-repair value",
                        pct(r.max_renovation_to_arv)
                    ));
                }
                if flip.profit_margin.is_some_and(|x| x >= dec!(0.15)) {
                    strengths.push("Healthy flip profit margin".to_string());
                }
                if flip.meets_cost_rule {
                    strengths.push("Purchase plus renovation within the 70% rule".to_string());
                }
            }
        }
        Strategy::Brrrr => {
            let r = &rules.brrrr;
            if let Some(b) = &m.brrrr {
                // No cash in means nothing can be trapped
                let cash_left_ratio = b
                    .cash_left_ratio
                    .or_else(|| (b.cash_left_in_deal <= Decimal::ZERO).then_some(Decimal::ZERO));
                tally.add("cash_left_ratio", cash_left_ratio, &r.cash_left_ratio);
                tally.add("refinance_dscr", b.refinance_dscr, &r.refinance_dscr);
                tally.add(
                    "post_refinance_cash_flow",
                    Some(b.post_refinance_cash_flow),
                    &r.post_refinance_cash_flow,
                );

                match b.refinance_dscr {
                    Some(d) if d < r.min_dscr => cap = Some(r.min_dscr_score_cap),
                    Some(d) if d < r.top_band_min_dscr => cap = Some(r.top_band_score_cap),
                    _ => {}
                }

                if cash_left_ratio.is_some_and(|x| x > r.max_cash_left_ratio) {
                    specific.push(format!(
                        "Refinance leaves {} of cash trapped in the deal",
                        money(b.cash_left_in_deal)
                    ));
                }
                if b.refinance_dscr.is_some_and(|d| d < r.top_band_min_dscr) {
                    specific.push(format!(
                        "Post-refinance DSCR is below {}",
                        r.top_band_min_dscr.normalize()
                    ));
                }
                if b.cash_left_in_deal <= Decimal::ZERO {
                    strengths.push("Refinance returns all invested capital".to_string());
                }
            }
        }
        Strategy::HouseHack => {
            let r = &rules.house_hack;
            let coverage = m.house_hack.as_ref().and_then(|h| h.rent_coverage);
            tally.add("rent_coverage", coverage, &r.rent_coverage);
            tally.add("monthly_cash_flow", Some(cf), &r.monthly_cash_flow);
            tally.add("cash_on_cash_return", m.cash_on_cash_return, &r.cash_on_cash);
            tally.add("dscr", m.dscr, &r.dscr);

            if coverage.is_some_and(|c| c < r.min_rent_coverage) {
                specific.push(format!(
                    "Rent covers less than {} of the monthly payment",
                    pct(r.min_rent_coverage)
                ));
            }
            if coverage.is_some_and(|c| c >= Decimal::ONE) {
                strengths.push("Rent covers the full monthly payment".to_string());
            }
        }
        Strategy::Appreciation => {
            let r = &rules.appreciation;
            let projection = inputs.projection;
            // All-negative flows have no IRR; they still score as the worst tier
            let losing = projection.is_some_and(|p| p.total_profit < Decimal::ZERO);
            tally.add_or_floor("irr", projection.and_then(|p| p.irr), &r.irr, losing);
            tally.add("appreciation_rate", Some(inputs.appreciation_rate), &r.appreciation_rate);
            tally.add(
                "equity_multiple",
                projection.and_then(|p| p.equity_multiple),
                &r.equity_multiple,
            );
            tally.add("monthly_cash_flow", Some(cf), &r.monthly_cash_flow);

            if projection.and_then(|p| p.irr).is_some_and(|irr| irr >= dec!(0.08)) {
                strengths.push("Projected IRR of 8% or better".to_string());
            }
        }
    }

    // -- Cross-strategy warnings, fixed order --------------------------------
    if held {
        if let Some(dscr) = m.dscr.filter(|d| *d < Decimal::ONE) {
            warnings.push(format!(
                "DSCR of {} is below 1.0: negative debt coverage, rent does not cover the mortgage",
                dscr.round_dp(2)
            ));
        }
        if cf < Decimal::ZERO {
            warnings.push(format!("Negative monthly cash flow of {}", money(cf)));
        }
    }
    if inputs.vacancy_rate < inputs.min_prudent_vacancy_rate {
        warnings.push(format!(
            "Vacancy assumption of {} is below the prudent minimum of {}",
            pct(inputs.vacancy_rate),
            pct(inputs.min_prudent_vacancy_rate)
        ));
    }
    if m.cash_on_cash_return.is_none() {
        warnings.push("Cash-on-cash return not applicable: no cash invested".to_string());
    }
    if inputs.loan.mortgage_insurance_kind != MortgageInsuranceKind::None {
        warnings.push(format!(
            "Mortgage insurance adds {} per month",
            money(inputs.loan.monthly_mortgage_insurance)
        ));
    }
    warnings.extend(specific);
    if held && inputs.risk.scenarios_failed > 0 {
        let names: Vec<&str> = inputs.risk.failed().map(|s| s.name.as_str()).collect();
        warnings.push(format!(
            "Fails {} of {} stress scenarios: {}",
            inputs.risk.scenarios_failed,
            inputs.risk.scenarios.len(),
            names.join(", ")
        ));
    }

    // -- Cross-strategy strengths --------------------------------------------
    if held {
        if m.cash_on_cash_return.is_some_and(|c| c >= dec!(0.08)) {
            strengths.push("Cash-on-cash return of 8% or better".to_string());
        }
        if m.dscr.is_some_and(|d| d >= dec!(1.25)) {
            strengths.push("Comfortable debt coverage (DSCR of 1.25 or better)".to_string());
        }
        if cf >= dec!(200) {
            strengths.push(format!("Positive monthly cash flow of {}", money(cf)));
        }
        if !inputs.risk.scenarios.is_empty() && inputs.risk.scenarios_failed == 0 {
            strengths.push("Passes every stress scenario".to_string());
        }
    }

    let mut score = tally.total();
    if let Some(limit) = cap {
        score = score.min(limit);
    }
    let score = score.clamp(Decimal::ZERO, MAX_SCORE);

    ScoreCard {
        score,
        recommendation: recommendation_for(score, &rules.bands),
        component_scores: tally.components,
        strengths,
        warnings,
    }
}
