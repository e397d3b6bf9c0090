use pretty_assertions::assert_eq;
use proptest::prelude::*;
use realty_analysis_core::property_analysis::assumptions::{AnalysisAssumptions, RecommendationBands};
use realty_analysis_core::property_analysis::loan::{monthly_payment, MortgageInsuranceKind};
use realty_analysis_core::property_analysis::scoring::recommendation_for;
use realty_analysis_core::property_analysis::{
    analyze, analyze_property, analyze_with, AnalysisConfig, LoanType, MarketStatistics,
    PropertyAnalysisInput, PropertyRecord, Recommendation, Strategy,
};
use realty_analysis_core::RealtyError;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn austin_duplex() -> PropertyRecord {
    PropertyRecord {
        property_id: Some("tx-78701-0042".into()),
        address: "412 E 6th St, Austin, TX".into(),
        zip_code: Some("78701".into()),
        estimated_value: Some(dec!(300000)),
        estimated_rent: Some(dec!(2200)),
        bedrooms: Some(3),
        bathrooms: Some(dec!(2)),
        square_footage: Some(1450),
        property_type: Some("Single Family".into()),
        year_built: Some(1978),
        ..Default::default()
    }
}

// ===========================================================================
// Loan
// ===========================================================================

#[test]
fn test_worked_example_loan() {
    let config = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
    let result = analyze(&austin_duplex(), &config).unwrap();
    let loan = &result.loan;

    assert_eq!(loan.loan_amount, dec!(240000));
    assert_eq!(loan.down_payment_amount, dec!(60000));
    assert!((loan.monthly_principal_interest - dec!(1517)).abs() < dec!(1));
    assert_eq!(loan.monthly_mortgage_insurance, Decimal::ZERO);
    assert_eq!(loan.amortization.len(), 30);

    let dscr = result.metrics.dscr.unwrap();
    let cap = result.metrics.cap_rate.unwrap();
    assert!(dscr > Decimal::ZERO);
    assert!(cap > Decimal::ZERO);
}

#[test]
fn test_fha_minimum_down_mip() {
    let mut config = AnalysisConfig::new(Strategy::Rental, LoanType::Fha);
    config.down_payment_pct = Some(dec!(0.035));
    let result = analyze(&austin_duplex(), &config).unwrap();

    assert_eq!(result.loan.loan_amount, dec!(289500));
    assert_eq!(result.loan.mortgage_insurance_kind, MortgageInsuranceKind::FhaMip);
    assert_eq!(
        result.loan.monthly_mortgage_insurance,
        (dec!(289500) * dec!(0.0085) / dec!(12)).round_dp(2)
    );
}

#[test]
fn test_zero_rate_payment_is_straight_line() {
    assert_eq!(monthly_payment(dec!(360000), Decimal::ZERO, 30).unwrap(), dec!(1000));
}

#[test]
fn test_invalid_loan_parameters() {
    let mut config = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
    config.interest_rate = dec!(-0.01);
    assert!(matches!(
        analyze(&austin_duplex(), &config),
        Err(RealtyError::InvalidLoanParameters { .. })
    ));

    let mut config = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
    config.loan_term_years = 0;
    assert!(matches!(
        analyze(&austin_duplex(), &config),
        Err(RealtyError::InvalidLoanParameters { .. })
    ));
}

#[test]
fn test_extreme_loan_terms_are_errors_not_panics() {
    let mut config = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
    config.interest_rate = dec!(0.9);
    config.loan_term_years = 100;
    assert!(matches!(
        analyze(&austin_duplex(), &config),
        Err(RealtyError::InvalidLoanParameters { .. })
    ));

    // Within the term bound a steep rate still computes
    config.loan_term_years = 50;
    let result = analyze(&austin_duplex(), &config).unwrap();
    assert!(result.loan.monthly_principal_interest > dec!(14000));
}

// ===========================================================================
// Metrics
// ===========================================================================

#[test]
fn test_zero_cash_invested_is_not_an_error() {
    let mut config = AnalysisConfig::new(Strategy::Rental, LoanType::Va);
    config.finance_upfront_fees = true;
    config.closing_cost_pct = Some(Decimal::ZERO);
    let result = analyze(&austin_duplex(), &config).unwrap();

    assert_eq!(result.metrics.total_cash_invested, Decimal::ZERO);
    assert_eq!(result.metrics.cash_on_cash_return, None);
    assert!(result.metrics.cap_rate.is_some());
    assert!(result.metrics.dscr.is_some());
    assert!(result
        .warnings
        .iter()
        .any(|w| w.starts_with("Cash-on-cash return not applicable")));

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["metrics"]["cash_on_cash_return"].is_null());
}

#[test]
fn test_flip_net_profit() {
    let property = PropertyRecord::new("18 Willow Ct", dec!(280000), dec!(1900));
    let mut config = AnalysisConfig::new(Strategy::Flip, LoanType::Conventional);
    config.after_repair_value = Some(dec!(350000));
    config.renovation_budget = Some(dec!(30000));
    let result = analyze(&property, &config).unwrap();

    let flip = result.metrics.flip.unwrap();
    assert_eq!(flip.net_profit, dec!(12000));
    assert!(result.projection.is_none());
}

#[test]
fn test_negative_dscr_caps_rental_score() {
    let config = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
    let result = analyze(&austin_duplex(), &config).unwrap();

    assert!(result.metrics.dscr.unwrap() < Decimal::ONE);
    assert!(result.score <= dec!(40));
    assert!(result.warnings.iter().any(|w| w.contains("negative debt coverage")));
}

// ===========================================================================
// Orchestration
// ===========================================================================

#[test]
fn test_analysis_is_deterministic() {
    let property = austin_duplex();
    for strategy in Strategy::ALL {
        let mut config = AnalysisConfig::new(strategy, LoanType::Fha);
        config.renovation_budget = Some(dec!(20000));
        config.after_repair_value = Some(dec!(360000));
        let first = analyze(&property, &config).unwrap();
        let second = analyze(&property, &config).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_market_defaults_flow_into_projection() {
    let market = MarketStatistics {
        zip_code: "78701".into(),
        vacancy_rate: Some(dec!(0.07)),
        appreciation_rate: Some(dec!(0.055)),
        rent_growth_rate: Some(dec!(0.045)),
        ..Default::default()
    };
    let mut config = AnalysisConfig::new(Strategy::Appreciation, LoanType::Conventional);
    config.use_market_defaults = true;
    let result = analyze_with(&austin_duplex(), Some(&market), &config, &AnalysisAssumptions::default()).unwrap();

    assert_eq!(result.expenses.vacancy_rate, dec!(0.07));
    let projection = result.projection.unwrap();
    assert_eq!(projection.appreciation_rate, dec!(0.055));
    assert_eq!(projection.rent_growth_rate, dec!(0.045));
}

#[test]
fn test_json_input_round_trip_through_envelope() {
    let json = r#"{
        "property": {
            "address": "412 E 6th St, Austin, TX",
            "estimated_value": "300000",
            "estimated_rent": "2200"
        },
        "config": { "strategy": "house-hack", "loan_type": "FHA" }
    }"#;
    let input: PropertyAnalysisInput = serde_json::from_str(json).unwrap();
    assert_eq!(input.config.strategy, Strategy::HouseHack);

    let out = analyze_property(&input).unwrap();
    assert!(out.result.score >= Decimal::ZERO && out.result.score <= dec!(100));
    assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    assert!(out.result.metrics.house_hack.is_some());
}

#[test]
fn test_unsupported_strategy_in_json() {
    let json = r#"{
        "property": { "address": "x", "estimated_value": "1", "estimated_rent": "1" },
        "config": { "strategy": "wholesale", "loan_type": "conventional" }
    }"#;
    let err = serde_json::from_str::<PropertyAnalysisInput>(json).unwrap_err();
    assert!(err.to_string().contains("Unsupported strategy"));
}

#[test]
fn test_assumption_overrides_change_result() {
    let config = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
    let mut assumptions = AnalysisAssumptions::default();
    assumptions.expenses.management_fee_pct = Decimal::ZERO;
    let base = analyze(&austin_duplex(), &config).unwrap();
    let lean = analyze_with(&austin_duplex(), None, &config, &assumptions).unwrap();

    assert_eq!(
        lean.cash_flow.monthly_cash_flow - base.cash_flow.monthly_cash_flow,
        dec!(176)
    );
}

#[test]
fn test_result_carries_comparison_tax_and_summary() {
    let config = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
    let result = analyze(&austin_duplex(), &config).unwrap();

    assert_eq!(result.strategy_scores.len(), Strategy::ALL.len());
    assert!(result.best_strategy.is_some());
    assert_eq!(result.grade.to_string(), "F");
    assert!(result.tax.as_ref().unwrap().annual_depreciation > Decimal::ZERO);
    assert!(result.summary.len() >= 6);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["grade"], "F");
    assert_eq!(json["strategy_scores"][0]["strategy"], "rental");
    assert!(json["tax"]["paper_loss"].is_string());
}

#[test]
fn test_band_boundaries() {
    let bands = RecommendationBands::default();
    assert_eq!(recommendation_for(dec!(80), &bands), Recommendation::StrongBuy);
    assert_eq!(recommendation_for(dec!(79), &bands), Recommendation::Buy);
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn payment_repays_principal(
        principal in 1_000u64..2_000_000,
        rate_bps in 1i64..2_000,
        term in 1u32..=40,
    ) {
        let principal = Decimal::from(principal);
        let pmt = monthly_payment(principal, Decimal::new(rate_bps, 4), term).unwrap();
        prop_assert!(pmt * Decimal::from(term * 12) >= principal);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn score_stays_in_range(
        value in 60_000u64..1_500_000,
        rent in 500u64..8_000,
        strategy_idx in 0usize..5,
        down_pct in 0i64..40,
    ) {
        let property = PropertyRecord::new("1 Test Rd", Decimal::from(value), Decimal::from(rent));
        let mut config = AnalysisConfig::new(Strategy::ALL[strategy_idx], LoanType::Conventional);
        config.down_payment_pct = Some(Decimal::new(down_pct, 2));
        let result = analyze(&property, &config).unwrap();

        prop_assert!(result.score >= Decimal::ZERO);
        prop_assert!(result.score <= dec!(100));
        prop_assert_eq!(
            result.recommendation,
            recommendation_for(result.score, &RecommendationBands::default())
        );
    }
}
