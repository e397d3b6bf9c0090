use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use realty_analysis_core::property_analysis::loan::summarize_payment;

/// Arguments for a standalone payment calculation
#[derive(Args)]
pub struct PaymentArgs {
    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Purchase price; with --down-payment, the principal is derived from it
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Down payment as a fraction of price (e.g. 0.20)
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Annual interest rate (e.g. 0.065 for 6.5%)
    #[arg(long, default_value = "0.065")]
    pub rate: Decimal,

    /// Loan term in years
    #[arg(long, default_value_t = 30)]
    pub term: u32,
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let principal = match (args.principal, args.price) {
        (Some(p), _) => p,
        (None, Some(price)) => price * (Decimal::ONE - args.down_payment.unwrap_or(dec!(0.20))),
        (None, None) => return Err("--principal or --price is required".into()),
    };

    let result = summarize_payment(principal, args.rate, args.term)?;
    Ok(serde_json::to_value(result)?)
}
