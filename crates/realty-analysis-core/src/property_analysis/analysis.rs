use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, debug_span};

use crate::types::{with_metadata, ComputationOutput};
use crate::RealtyResult;

use super::assumptions::AnalysisAssumptions;
use super::cash_flow::{compute_cash_flow, CashFlowResult};
use super::expenses::{estimate_expenses, ExpenseBreakdown};
use super::inputs::{AnalysisConfig, DealInputs, LoanType, MarketStatistics, PropertyRecord, Strategy};
use super::loan::{calculate_loan, LoanDetails, LoanTerms};
use super::metrics::{compute_metrics, InvestmentMetrics};
use super::projection::{project_hold, HoldProjection};
use super::risk::{run_stress_tests, RiskAnalysis};
use super::scoring::{
    best_strategy, score_analysis, ComponentScore, LetterGrade, Recommendation, ScoreCard, ScoringInputs,
    StrategyScore,
};
use super::summary::executive_summary;
use super::tax::{analyze_taxes, TaxAnalysis};

// ---------------------------------------------------------------------------
// Input / output
// ---------------------------------------------------------------------------

/// Everything needed for one analysis, as read by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAnalysisInput {
    pub property: PropertyRecord,
    pub config: AnalysisConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<MarketStatistics>,
    /// Overrides for the built-in defaults; missing fields keep the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assumptions: Option<AnalysisAssumptions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub property: PropertyRecord,
    pub strategy: Strategy,
    pub loan_type: LoanType,
    pub loan: LoanDetails,
    pub expenses: ExpenseBreakdown,
    pub cash_flow: CashFlowResult,
    pub metrics: InvestmentMetrics,
    /// `None` for a flip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax: Option<TaxAnalysis>,
    pub risk: RiskAnalysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projection: Option<HoldProjection>,
    /// 0-100
    pub score: Decimal,
    pub grade: LetterGrade,
    pub recommendation: Recommendation,
    pub component_scores: Vec<ComponentScore>,
    pub strengths: Vec<String>,
    /// Every strategy's headline score for the same property and loan
    pub strategy_scores: Vec<StrategyScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_strategy: Option<Strategy>,
    pub summary: Vec<String>,
    /// Input-resolution warnings first, then scoring warnings
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Analyze with the built-in assumptions and no market data.
pub fn analyze(property: &PropertyRecord, config: &AnalysisConfig) -> RealtyResult<AnalysisResult> {
    analyze_with(property, None, config, &AnalysisAssumptions::default())
}

/// Full analysis: expenses, loan, cash flow, metrics, tax, stress tests,
/// hold projection and score, then the headline score of every other
/// strategy for comparison.
///
/// Inputs are validated before anything is computed; the result is a pure
/// function of the arguments.
pub fn analyze_with(
    property: &PropertyRecord,
    market: Option<&MarketStatistics>,
    config: &AnalysisConfig,
    assumptions: &AnalysisAssumptions,
) -> RealtyResult<AnalysisResult> {
    let span = debug_span!(
        "analyze_property",
        address = %property.address,
        strategy = %config.strategy,
        loan_type = %config.loan_type,
    );
    let _guard = span.enter();

    property.validate()?;
    config.validate()?;
    assumptions.validate()?;

    let mut warnings: Vec<String> = Vec::new();
    let run = evaluate(property, market, config, assumptions, &mut warnings)?;
    warnings.extend(run.card.warnings.iter().cloned());

    let strategy_scores = score_all_strategies(property, market, config, assumptions, &run.card);
    let best = best_strategy(&strategy_scores);

    let mut result = AnalysisResult {
        property: property.clone(),
        strategy: config.strategy,
        loan_type: config.loan_type,
        loan: run.loan,
        expenses: run.expenses,
        cash_flow: run.cash_flow,
        metrics: run.metrics,
        tax: run.tax,
        risk: run.risk,
        projection: run.projection,
        score: run.card.score,
        grade: LetterGrade::from_score(run.card.score),
        recommendation: run.card.recommendation,
        component_scores: run.card.component_scores,
        strengths: run.card.strengths,
        strategy_scores,
        best_strategy: best,
        summary: Vec::new(),
        warnings,
    };
    result.summary = executive_summary(&result);
    Ok(result)
}

/// Headline score of the property under every strategy, in
/// [`Strategy::ALL`] order. The analysed strategy reuses `card`; a strategy
/// whose pipeline fails is left out.
pub fn score_all_strategies(
    property: &PropertyRecord,
    market: Option<&MarketStatistics>,
    config: &AnalysisConfig,
    assumptions: &AnalysisAssumptions,
    card: &ScoreCard,
) -> Vec<StrategyScore> {
    Strategy::ALL
        .iter()
        .filter_map(|&strategy| {
            if strategy == config.strategy {
                return Some(StrategyScore::from_card(strategy, card));
            }
            let alternative = AnalysisConfig {
                strategy,
                ..config.clone()
            };
            let mut scratch = Vec::new();
            match evaluate(property, market, &alternative, assumptions, &mut scratch) {
                Ok(run) => Some(StrategyScore::from_card(strategy, &run.card)),
                Err(e) => {
                    debug!(%strategy, error = %e, "strategy left out of comparison");
                    None
                }
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Intermediate results of one strategy's pipeline.
struct Evaluation {
    loan: LoanDetails,
    expenses: ExpenseBreakdown,
    cash_flow: CashFlowResult,
    metrics: InvestmentMetrics,
    tax: Option<TaxAnalysis>,
    risk: RiskAnalysis,
    projection: Option<HoldProjection>,
    card: ScoreCard,
}

fn evaluate(
    property: &PropertyRecord,
    market: Option<&MarketStatistics>,
    config: &AnalysisConfig,
    assumptions: &AnalysisAssumptions,
    warnings: &mut Vec<String>,
) -> RealtyResult<Evaluation> {
    let deal = DealInputs::resolve(property, market, config, assumptions, warnings)?;
    debug!(
        purchase_price = %deal.purchase_price,
        monthly_rent = %deal.monthly_rent,
        appreciation = %deal.appreciation_rate,
        rent_growth = %deal.rent_growth_rate,
        "resolved deal inputs"
    );

    let expenses = estimate_expenses(property, config, market, &assumptions.expenses)?;
    debug!(
        total = %expenses.total_monthly_expenses,
        vacancy_rate = %expenses.vacancy_rate,
        vacancy_source = ?expenses.vacancy_source,
        "estimated expenses"
    );

    let terms = LoanTerms::from_config(deal.purchase_price, config, deal.closing_cost_pct, &expenses);
    let loan = calculate_loan(&terms, &assumptions.loans, warnings)?;
    debug!(
        loan_amount = %loan.loan_amount,
        principal_interest = %loan.monthly_principal_interest,
        mortgage_insurance = %loan.monthly_mortgage_insurance,
        "calculated loan"
    );

    let cash_flow = compute_cash_flow(deal.monthly_rent, &loan, &expenses);
    let metrics = compute_metrics(config.strategy, &deal, &loan, &expenses, &cash_flow, &assumptions.deal)?;
    debug!(
        cash_flow = %cash_flow.monthly_cash_flow,
        noi = %metrics.net_operating_income,
        dscr = ?metrics.dscr,
        cash_on_cash = ?metrics.cash_on_cash_return,
        "computed metrics"
    );

    let risk = run_stress_tests(
        deal.monthly_rent,
        &loan,
        &expenses,
        metrics.total_cash_invested,
        deal.renovation_budget,
        &assumptions.risk,
    )?;

    // A flip is inventory, not a depreciable rental
    let tax = match config.strategy {
        Strategy::Flip => None,
        _ => Some(analyze_taxes(&deal, &loan, &metrics, &cash_flow, &assumptions.tax)),
    };

    let projection = match config.strategy {
        Strategy::Flip => None,
        _ => Some(project_hold(
            &deal,
            &loan,
            &expenses,
            metrics.total_cash_invested,
            tax.as_ref(),
            &assumptions.projection,
            warnings,
        )?),
    };

    let card = score_analysis(
        &ScoringInputs {
            strategy: config.strategy,
            metrics: &metrics,
            cash_flow: &cash_flow,
            loan: &loan,
            projection: projection.as_ref(),
            risk: &risk,
            vacancy_rate: expenses.vacancy_rate,
            min_prudent_vacancy_rate: assumptions.expenses.min_prudent_vacancy_rate,
            appreciation_rate: deal.appreciation_rate,
        },
        &assumptions.scoring,
    );
    debug!(score = %card.score, recommendation = %card.recommendation, "scored analysis");

    Ok(Evaluation {
        loan,
        expenses,
        cash_flow,
        metrics,
        tax,
        risk,
        projection,
        card,
    })
}

/// Run [`analyze_with`] and wrap the result in the standard output envelope.
pub fn analyze_property(input: &PropertyAnalysisInput) -> RealtyResult<ComputationOutput<AnalysisResult>> {
    let start = Instant::now();
    let assumptions = input.assumptions.clone().unwrap_or_default();

    let result = analyze_with(&input.property, input.market.as_ref(), &input.config, &assumptions)?;

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        &format!("Residential Investment Analysis ({})", input.config.strategy),
        &serde_json::json!({
            "config": &input.config,
            "assumptions": &assumptions,
        }),
        result.warnings.clone(),
        elapsed,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RealtyError;
    use rust_decimal_macros::dec;

    fn sample_property() -> PropertyRecord {
        PropertyRecord::new("123 Main St, Austin, TX", dec!(300000), dec!(2200))
    }

    #[test]
    fn test_worked_example() {
        let config = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
        let result = analyze(&sample_property(), &config).unwrap();
        assert_eq!(result.loan.loan_amount, dec!(240000));
        assert!((result.loan.monthly_principal_interest - dec!(1517)).abs() < dec!(1));
        assert_eq!(result.loan.monthly_mortgage_insurance, Decimal::ZERO);
        assert!(result.metrics.dscr.unwrap() > Decimal::ZERO);
        assert!(result.metrics.cap_rate.unwrap() > Decimal::ZERO);
        assert!(result.projection.is_some());
    }

    #[test]
    fn test_validation_precedes_computation() {
        let mut property = sample_property();
        property.estimated_rent = None;
        let config = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
        assert!(matches!(
            analyze(&property, &config),
            Err(RealtyError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_invalid_assumptions_are_rejected() {
        let config = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
        let mut assumptions = AnalysisAssumptions::default();
        assumptions.scoring.bands.caution = dec!(90);
        assert!(matches!(
            analyze_with(&sample_property(), None, &config, &assumptions),
            Err(RealtyError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_long_hold_is_rejected_not_overflowed() {
        let mut config = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
        config.hold_years = Some(2000);
        assert!(matches!(
            analyze(&sample_property(), &config),
            Err(RealtyError::InvalidInput { .. })
        ));

        config.hold_years = Some(50);
        config.appreciation_rate = Some(dec!(0.15));
        let result = analyze(&sample_property(), &config).unwrap();
        assert_eq!(result.projection.unwrap().years.len(), 50);
    }

    #[test]
    fn test_flip_has_no_projection() {
        let mut config = AnalysisConfig::new(Strategy::Flip, LoanType::Conventional);
        config.after_repair_value = Some(dec!(380000));
        config.renovation_budget = Some(dec!(25000));
        let result = analyze(&sample_property(), &config).unwrap();
        assert!(result.projection.is_none());
        assert!(result.metrics.flip.is_some());
    }

    #[test]
    fn test_every_strategy_is_compared() {
        let mut config = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
        config.after_repair_value = Some(dec!(420000));
        config.renovation_budget = Some(dec!(20000));
        let result = analyze(&sample_property(), &config).unwrap();

        let order: Vec<Strategy> = result.strategy_scores.iter().map(|s| s.strategy).collect();
        assert_eq!(order, Strategy::ALL.to_vec());
        let own = &result.strategy_scores[0];
        assert_eq!(own.score, result.score);
        assert_eq!(own.grade, result.grade);

        // Rental is capped by DSCR; a cheap flip into a high ARV beats it
        let top = result.strategy_scores.iter().map(|s| s.score).max().unwrap();
        let first_top = result.strategy_scores.iter().find(|s| s.score == top).unwrap();
        assert!(top > result.score);
        assert_eq!(result.best_strategy, Some(first_top.strategy));
        assert_ne!(result.best_strategy, Some(Strategy::Rental));
        assert!(result.summary[1].starts_with(&format!("Best-scoring strategy: {} at", first_top.strategy)));
    }

    #[test]
    fn test_comparison_does_not_leak_warnings() {
        let config = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
        let result = analyze(&sample_property(), &config).unwrap();
        assert!(!result.warnings.iter().any(|w| w.starts_with("No after-repair value")));
    }

    #[test]
    fn test_tax_and_recapture_wired_through() {
        let config = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
        let result = analyze(&sample_property(), &config).unwrap();
        let tax = result.tax.as_ref().unwrap();
        assert!(tax.has_paper_loss());
        let projection = result.projection.as_ref().unwrap();
        assert_eq!(projection.depreciation_recapture_tax, tax.recapture_tax(10));
        assert!(result.risk.break_even.max_purchase_price.is_some());

        let mut flip = AnalysisConfig::new(Strategy::Flip, LoanType::Conventional);
        flip.after_repair_value = Some(dec!(380000));
        let result = analyze(&sample_property(), &flip).unwrap();
        assert!(result.tax.is_none());
    }

    #[test]
    fn test_resolution_warnings_come_first() {
        let config = AnalysisConfig::new(Strategy::Brrrr, LoanType::Conventional);
        let result = analyze(&sample_property(), &config).unwrap();
        assert!(result.warnings[0].starts_with("No after-repair value"));
    }

    #[test]
    fn test_envelope_carries_result_warnings() {
        let input = PropertyAnalysisInput {
            property: sample_property(),
            config: AnalysisConfig::new(Strategy::Rental, LoanType::Conventional),
            market: None,
            assumptions: None,
        };
        let out = analyze_property(&input).unwrap();
        assert_eq!(out.warnings, out.result.warnings);
        assert!(out.methodology.contains("rental"));
    }
}
