use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use realty_analysis_core::property_analysis::{
    analyze_property, AnalysisAssumptions, LoanType, PropertyAnalysisInput, Strategy,
};

use crate::input;

/// Arguments for a full property analysis
#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to JSON input file: { property, config, market?, assumptions? }
    #[arg(long)]
    pub input: Option<String>,

    /// Path to a JSON assumptions file (see `realty assumptions`)
    #[arg(long)]
    pub assumptions: Option<String>,

    /// Strategy: rental, flip, brrrr, house_hack, appreciation
    #[arg(long)]
    pub strategy: Option<String>,

    /// Loan type: conventional, fha, va, usda
    #[arg(long)]
    pub loan_type: Option<String>,

    /// Annual interest rate (e.g. 0.065 for 6.5%)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long)]
    pub term: Option<u32>,

    /// Down payment as a fraction of price (e.g. 0.20)
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Offer price if different from the estimated value
    #[arg(long)]
    pub purchase_price: Option<Decimal>,
}

/// Arguments for printing the default assumptions
#[derive(Args)]
pub struct AssumptionsArgs {
    /// Print only one section (expenses, loans, deal, projection, risk, tax, scoring)
    #[arg(long)]
    pub section: Option<String>,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut analysis_input: PropertyAnalysisInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--input <file.json> or stdin required for property analysis".into());
    };

    if let Some(ref path) = args.assumptions {
        let assumptions: AnalysisAssumptions = input::file::read_json(path)?;
        analysis_input.assumptions = Some(assumptions);
    }

    let config = &mut analysis_input.config;
    if let Some(ref s) = args.strategy {
        config.strategy = s.parse::<Strategy>()?;
    }
    if let Some(ref l) = args.loan_type {
        config.loan_type = l.parse::<LoanType>()?;
    }
    if let Some(rate) = args.rate {
        config.interest_rate = rate;
    }
    if let Some(term) = args.term {
        config.loan_term_years = term;
    }
    if args.down_payment.is_some() {
        config.down_payment_pct = args.down_payment;
    }
    if args.purchase_price.is_some() {
        config.purchase_price = args.purchase_price;
    }

    tracing::debug!(
        address = %analysis_input.property.address,
        strategy = %analysis_input.config.strategy,
        "running analysis"
    );

    let result = analyze_property(&analysis_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_assumptions(args: AssumptionsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let value = serde_json::to_value(AnalysisAssumptions::default())?;
    match args.section {
        None => Ok(value),
        Some(section) => value
            .get(section.as_str())
            .cloned()
            .ok_or_else(|| format!("Unknown assumptions section '{section}'").into()),
    }
}
