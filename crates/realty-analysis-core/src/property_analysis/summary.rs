//! Plain-language headline findings for a finished analysis.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::Money;

use super::analysis::AnalysisResult;
use super::pct;

const SOLID_CAP_RATE: Decimal = dec!(0.06);
const MODERATE_CAP_RATE: Decimal = dec!(0.04);

fn dollars(value: Money) -> String {
    let rounded = value.round_dp(0);
    if rounded < Decimal::ZERO {
        format!("-${}", -rounded)
    } else {
        format!("${rounded}")
    }
}

/// One line per finding, in a fixed order: score and best strategy, cash
/// flow, hold projection (or flip profit), tax effect, stress tests, cap
/// rate. Lines whose figures are unavailable are left out.
pub fn executive_summary(result: &AnalysisResult) -> Vec<String> {
    let mut lines = Vec::new();

    lines.push(format!(
        "Score under {}: {}/100, grade {} ({})",
        result.strategy,
        result.score.round_dp(0),
        result.grade,
        result.recommendation
    ));
    if let Some(best) = result.strategy_scores.iter().find(|s| Some(s.strategy) == result.best_strategy) {
        if best.strategy == result.strategy {
            lines.push(format!("Best-scoring strategy: {} (the one analysed)", best.strategy));
        } else {
            lines.push(format!(
                "Best-scoring strategy: {} at {}/100, grade {}",
                best.strategy,
                best.score.round_dp(0),
                best.grade
            ));
        }
    }

    let cf = result.cash_flow.monthly_cash_flow;
    if cf >= Decimal::ZERO {
        lines.push(format!("Positive cash flow of {} per month", dollars(cf)));
    } else {
        lines.push(format!("Negative cash flow of {} per month", dollars(-cf)));
    }

    if let Some(p) = &result.projection {
        match p.irr {
            Some(irr) => lines.push(format!(
                "Projected {}-year IRR of {} with {} net sale proceeds",
                p.hold_years,
                pct(irr.round_dp(4)),
                dollars(p.net_sale_proceeds)
            )),
            None => lines.push(format!(
                "Projected {}-year total profit of {}; IRR not available",
                p.hold_years,
                dollars(p.total_profit)
            )),
        }
    }
    if let Some(flip) = &result.metrics.flip {
        lines.push(format!("Flip nets {} after selling costs", dollars(flip.net_profit)));
    }

    if let Some(tax) = &result.tax {
        if tax.has_paper_loss() {
            lines.push(format!(
                "Depreciation and interest create a {} paper loss, saving about {} in tax",
                dollars(-tax.paper_loss),
                dollars(tax.tax_savings)
            ));
        } else {
            lines.push(format!(
                "Taxable rental income of {} after depreciation and interest",
                dollars(tax.taxable_income)
            ));
        }
    }

    if !result.risk.scenarios.is_empty() {
        lines.push(format!(
            "Risk: passes {}/{} stress tests",
            result.risk.scenarios_passed,
            result.risk.scenarios.len()
        ));
    }

    if let Some(cap) = result.metrics.cap_rate {
        let reading = if cap >= SOLID_CAP_RATE {
            "solid"
        } else if cap >= MODERATE_CAP_RATE {
            "moderate"
        } else {
            "low; the deal may be an appreciation play"
        };
        lines.push(format!("Cap rate of {} is {reading}", pct(cap.round_dp(4))));
    }

    lines
}
