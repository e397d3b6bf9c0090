use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RealtyError;
use crate::types::{Money, Rate};
use crate::RealtyResult;

use super::assumptions::AnalysisAssumptions;

/// Longest loan term accepted, in years.
pub const MAX_LOAN_TERM_YEARS: u32 = 50;
/// Longest hold period projected, in years.
pub const MAX_HOLD_YEARS: u32 = 50;

// ---------------------------------------------------------------------------
// Strategy / loan type
// ---------------------------------------------------------------------------

/// Investment strategy the property is evaluated under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Strategy {
    /// Buy and hold for rental income
    Rental,
    /// Buy, renovate, sell
    Flip,
    /// Buy, rehab, rent, refinance, repeat
    Brrrr,
    /// Owner occupies part of the property and rents the rest
    HouseHack,
    /// Hold primarily for long-term appreciation
    Appreciation,
}

impl Strategy {
    pub const ALL: [Strategy; 5] = [
        Strategy::Rental,
        Strategy::Flip,
        Strategy::Brrrr,
        Strategy::HouseHack,
        Strategy::Appreciation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Rental => "rental",
            Strategy::Flip => "flip",
            Strategy::Brrrr => "brrrr",
            Strategy::HouseHack => "house_hack",
            Strategy::Appreciation => "appreciation",
        }
    }

    /// Strategies whose capital budget includes a renovation.
    pub fn uses_renovation(&self) -> bool {
        matches!(self, Strategy::Flip | Strategy::Brrrr)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalise_key(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .replace(['-', ' '], "_")
}

impl FromStr for Strategy {
    type Err = RealtyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_key(s).as_str() {
            "rental" | "buy_and_hold" => Ok(Strategy::Rental),
            "flip" | "fix_and_flip" => Ok(Strategy::Flip),
            "brrrr" => Ok(Strategy::Brrrr),
            "house_hack" | "househack" => Ok(Strategy::HouseHack),
            "appreciation" | "long_term_appreciation" => Ok(Strategy::Appreciation),
            _ => Err(RealtyError::UnsupportedStrategy(s.to_string())),
        }
    }
}

impl TryFrom<String> for Strategy {
    type Error = RealtyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Mortgage program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum LoanType {
    Conventional,
    Fha,
    Va,
    Usda,
}

impl LoanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanType::Conventional => "conventional",
            LoanType::Fha => "fha",
            LoanType::Va => "va",
            LoanType::Usda => "usda",
        }
    }
}

impl fmt::Display for LoanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanType {
    type Err = RealtyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_key(s).as_str() {
            "conventional" | "conv" => Ok(LoanType::Conventional),
            "fha" => Ok(LoanType::Fha),
            "va" => Ok(LoanType::Va),
            "usda" => Ok(LoanType::Usda),
            _ => Err(RealtyError::UnsupportedLoanType(s.to_string())),
        }
    }
}

impl TryFrom<String> for LoanType {
    type Error = RealtyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// External data
// ---------------------------------------------------------------------------

/// Property facts as returned by the property-data source.
///
/// Value and rent are optional here so a missing field is reported as a
/// validation error instead of flowing through the math as zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_id: Option<String>,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    /// Estimated market value
    #[serde(default)]
    pub estimated_value: Option<Money>,
    /// Estimated monthly rent
    #[serde(default)]
    pub estimated_rent: Option<Money>,
    /// Annual property tax as a fraction of value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_tax_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_hoa: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub square_footage: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<u32>,
}

impl PropertyRecord {
    pub fn new(address: impl Into<String>, estimated_value: Money, estimated_rent: Money) -> Self {
        Self {
            address: address.into(),
            estimated_value: Some(estimated_value),
            estimated_rent: Some(estimated_rent),
            ..Self::default()
        }
    }

    /// Estimated value, which must be present and positive.
    pub fn value(&self) -> RealtyResult<Money> {
        require_positive(self.estimated_value, "estimated_value", "Estimated property value")
    }

    /// Estimated monthly rent, which must be present and positive.
    pub fn rent(&self) -> RealtyResult<Money> {
        require_positive(self.estimated_rent, "estimated_rent", "Estimated monthly rent")
    }

    pub fn validate(&self) -> RealtyResult<()> {
        self.value()?;
        self.rent()?;
        if let Some(rate) = self.property_tax_rate {
            check_fraction(rate, "property_tax_rate")?;
        }
        if let Some(hoa) = self.monthly_hoa {
            check_non_negative(hoa, "monthly_hoa")?;
        }
        Ok(())
    }
}

/// Zip-level market figures from the market-statistics source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketStatistics {
    pub zip_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_rent: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacancy_rate: Option<Rate>,
    /// Annual rent growth
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_growth_rate: Option<Rate>,
    /// Annual price appreciation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appreciation_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_days_on_market: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// User configuration
// ---------------------------------------------------------------------------

fn default_interest_rate() -> Rate {
    dec!(0.065)
}

fn default_loan_term_years() -> u32 {
    30
}

/// User-supplied analysis configuration. All percentage fields are
/// fractions (0.05 = 5%).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub strategy: Strategy,
    pub loan_type: LoanType,
    /// Annual interest rate
    #[serde(default = "default_interest_rate")]
    pub interest_rate: Rate,
    #[serde(default = "default_loan_term_years")]
    pub loan_term_years: u32,
    /// Defaults by loan type (see `LoanProgram::default_down_payment_pct`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub down_payment_pct: Option<Rate>,
    /// Offer price; defaults to the estimated value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_hoa: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_pct: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vacancy_rate_pct: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub management_fee_pct: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_cost_pct: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renovation_budget: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_repair_value: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinance_ltv: Option<Rate>,
    /// Flip selling costs as a fraction of ARV
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selling_cost_pct: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_years: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appreciation_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rent_growth_rate: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expense_growth_rate: Option<Rate>,
    /// Roll upfront program fees into the loan instead of paying them in cash
    #[serde(default)]
    pub finance_upfront_fees: bool,
    /// Prefer market statistics over built-in defaults where available
    #[serde(default)]
    pub use_market_defaults: bool,
}

impl AnalysisConfig {
    /// Configuration with the conventional 6.5% / 30-year defaults and no
    /// overrides.
    pub fn new(strategy: Strategy, loan_type: LoanType) -> Self {
        Self {
            strategy,
            loan_type,
            interest_rate: default_interest_rate(),
            loan_term_years: default_loan_term_years(),
            down_payment_pct: None,
            purchase_price: None,
            monthly_hoa: None,
            maintenance_pct: None,
            vacancy_rate_pct: None,
            management_fee_pct: None,
            closing_cost_pct: None,
            renovation_budget: None,
            after_repair_value: None,
            refinance_ltv: None,
            selling_cost_pct: None,
            hold_years: None,
            appreciation_rate: None,
            rent_growth_rate: None,
            expense_growth_rate: None,
            finance_upfront_fees: false,
            use_market_defaults: false,
        }
    }

    /// Loan parameters are checked first and reported as
    /// `InvalidLoanParameters`; everything else as `InvalidInput`.
    pub fn validate(&self) -> RealtyResult<()> {
        validate_loan_parameters(self.interest_rate, self.loan_term_years, self.down_payment_pct)?;

        for (value, field) in [
            (self.maintenance_pct, "maintenance_pct"),
            (self.vacancy_rate_pct, "vacancy_rate_pct"),
            (self.management_fee_pct, "management_fee_pct"),
            (self.closing_cost_pct, "closing_cost_pct"),
            (self.selling_cost_pct, "selling_cost_pct"),
        ] {
            if let Some(v) = value {
                check_fraction(v, field)?;
            }
        }

        if let Some(ltv) = self.refinance_ltv {
            if ltv <= Decimal::ZERO || ltv > Decimal::ONE {
                return Err(RealtyError::invalid_input(
                    "refinance_ltv",
                    "Refinance LTV must be in (0, 1]",
                ));
            }
        }
        if let Some(hoa) = self.monthly_hoa {
            check_non_negative(hoa, "monthly_hoa")?;
        }
        if let Some(budget) = self.renovation_budget {
            check_non_negative(budget, "renovation_budget")?;
        }
        if let Some(arv) = self.after_repair_value {
            require_positive(Some(arv), "after_repair_value", "After-repair value")?;
        }
        if let Some(price) = self.purchase_price {
            require_positive(Some(price), "purchase_price", "Purchase price")?;
        }
        if let Some(years) = self.hold_years {
            check_hold_years(years)?;
        }
        for (value, field) in [
            (self.appreciation_rate, "appreciation_rate"),
            (self.rent_growth_rate, "rent_growth_rate"),
            (self.expense_growth_rate, "expense_growth_rate"),
        ] {
            if let Some(v) = value {
                check_growth_rate(v, field)?;
            }
        }
        Ok(())
    }
}

/// Rate and term bounds for a standalone payment calculation, where a zero
/// rate is allowed.
pub fn validate_payment_parameters(interest_rate: Rate, loan_term_years: u32) -> RealtyResult<()> {
    if interest_rate < Decimal::ZERO {
        return Err(RealtyError::invalid_loan(
            "interest_rate",
            "Interest rate cannot be negative",
        ));
    }
    if interest_rate >= Decimal::ONE {
        return Err(RealtyError::invalid_loan(
            "interest_rate",
            "Interest rate must be a fraction (0.065 = 6.5%)",
        ));
    }
    if loan_term_years == 0 {
        return Err(RealtyError::invalid_loan(
            "loan_term_years",
            "Loan term must be at least 1 year",
        ));
    }
    if loan_term_years > MAX_LOAN_TERM_YEARS {
        return Err(RealtyError::invalid_loan(
            "loan_term_years",
            format!("Loan term cannot exceed {MAX_LOAN_TERM_YEARS} years"),
        ));
    }
    Ok(())
}

/// Shared loan-parameter checks: `0 < rate < 1`,
/// `1 <= term <= MAX_LOAN_TERM_YEARS`, `0 <= down < 1`.
pub fn validate_loan_parameters(
    interest_rate: Rate,
    loan_term_years: u32,
    down_payment_pct: Option<Rate>,
) -> RealtyResult<()> {
    if interest_rate <= Decimal::ZERO {
        return Err(RealtyError::invalid_loan(
            "interest_rate",
            "Interest rate must be positive",
        ));
    }
    validate_payment_parameters(interest_rate, loan_term_years)?;
    if let Some(down) = down_payment_pct {
        if down < Decimal::ZERO || down >= Decimal::ONE {
            return Err(RealtyError::invalid_loan(
                "down_payment_pct",
                "Down payment must be in [0, 1)",
            ));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Resolved deal inputs
// ---------------------------------------------------------------------------

/// Deal-level figures after applying overrides, market data and defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealInputs {
    pub property_value: Money,
    pub purchase_price: Money,
    pub monthly_rent: Money,
    pub closing_cost_pct: Rate,
    pub renovation_budget: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_repair_value: Option<Money>,
    pub selling_cost_pct: Rate,
    pub refinance_ltv: Rate,
    pub refinance_seasoning_months: u32,
    pub hold_years: u32,
    pub appreciation_rate: Rate,
    pub rent_growth_rate: Rate,
    pub expense_growth_rate: Rate,
}

impl DealInputs {
    /// Resolve in order: explicit config, market statistics (only when
    /// `use_market_defaults`), built-in default.
    pub fn resolve(
        property: &PropertyRecord,
        market: Option<&MarketStatistics>,
        config: &AnalysisConfig,
        assumptions: &AnalysisAssumptions,
        warnings: &mut Vec<String>,
    ) -> RealtyResult<Self> {
        let property_value = property.value()?;
        let monthly_rent = property.rent()?;
        let purchase_price = config.purchase_price.unwrap_or(property_value);

        let market = if config.use_market_defaults {
            if market.is_none() {
                warnings.push(
                    "Market-adjusted defaults requested but no market statistics were supplied; using built-in defaults".into(),
                );
            }
            market
        } else {
            None
        };

        let after_repair_value = match (config.after_repair_value, config.strategy.uses_renovation()) {
            (Some(arv), _) => Some(arv),
            (None, true) => {
                warnings.push(format!(
                    "No after-repair value supplied for {} strategy; using the estimated value {}",
                    config.strategy,
                    property_value.round_dp(0)
                ));
                Some(property_value)
            }
            (None, false) => None,
        };

        let renovation_budget = config.renovation_budget.unwrap_or(Decimal::ZERO);
        if config.strategy.uses_renovation() && config.renovation_budget.is_none() {
            warnings.push(format!(
                "No renovation budget supplied for {} strategy; assuming none",
                config.strategy
            ));
        }

        let proj = &assumptions.projection;
        Ok(Self {
            property_value,
            purchase_price,
            monthly_rent,
            closing_cost_pct: config
                .closing_cost_pct
                .unwrap_or(assumptions.deal.closing_cost_pct),
            renovation_budget,
            after_repair_value,
            selling_cost_pct: config
                .selling_cost_pct
                .unwrap_or(assumptions.deal.flip_selling_cost_pct),
            refinance_ltv: config.refinance_ltv.unwrap_or(assumptions.deal.refinance_ltv),
            refinance_seasoning_months: assumptions.deal.refinance_seasoning_months,
            hold_years: config.hold_years.unwrap_or(proj.hold_years),
            appreciation_rate: pick_rate(
                config.appreciation_rate,
                market.and_then(|m| m.appreciation_rate),
                proj.appreciation_rate,
            ),
            rent_growth_rate: pick_rate(
                config.rent_growth_rate,
                market.and_then(|m| m.rent_growth_rate),
                proj.rent_growth_rate,
            ),
            expense_growth_rate: config
                .expense_growth_rate
                .unwrap_or(proj.expense_growth_rate),
        })
    }

    /// Cash the buyer brings to the deal besides the down payment and
    /// closing costs.
    pub fn renovation_cash(&self) -> Money {
        self.renovation_budget
    }
}

/// Explicit value, else market value, else default.
pub fn pick_rate(explicit: Option<Rate>, market: Option<Rate>, default: Rate) -> Rate {
    explicit.or(market).unwrap_or(default)
}

// ---------------------------------------------------------------------------
// Validation helpers
// ---------------------------------------------------------------------------

fn require_positive(value: Option<Decimal>, field: &str, label: &str) -> RealtyResult<Decimal> {
    match value {
        None => Err(RealtyError::invalid_input(field, format!("{label} is required"))),
        Some(v) if v <= Decimal::ZERO => Err(RealtyError::invalid_input(
            field,
            format!("{label} must be positive (got {v})"),
        )),
        Some(v) => Ok(v),
    }
}

pub(crate) fn check_fraction(value: Rate, field: &str) -> RealtyResult<()> {
    if value < Decimal::ZERO || value >= Decimal::ONE {
        return Err(RealtyError::invalid_input(
            field,
            format!("Expected a fraction in [0, 1), got {value}"),
        ));
    }
    Ok(())
}

pub(crate) fn check_non_negative(value: Decimal, field: &str) -> RealtyResult<()> {
    if value < Decimal::ZERO {
        return Err(RealtyError::invalid_input(field, "Must not be negative"));
    }
    Ok(())
}

pub(crate) fn check_hold_years(years: u32) -> RealtyResult<()> {
    if years == 0 || years > MAX_HOLD_YEARS {
        return Err(RealtyError::invalid_input(
            "hold_years",
            format!("Hold period must be between 1 and {MAX_HOLD_YEARS} years (got {years})"),
        ));
    }
    Ok(())
}

pub(crate) fn check_growth_rate(value: Rate, field: &str) -> RealtyResult<()> {
    if value <= dec!(-1) || value >= Decimal::ONE {
        return Err(RealtyError::invalid_input(
            field,
            "Growth rates must be fractions in (-1, 1)",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_strategy_parsing_aliases() {
        assert_eq!("rental".parse::<Strategy>().unwrap(), Strategy::Rental);
        assert_eq!("House-Hack".parse::<Strategy>().unwrap(), Strategy::HouseHack);
        assert_eq!(
            "long_term_appreciation".parse::<Strategy>().unwrap(),
            Strategy::Appreciation
        );
        assert_eq!(" BRRRR ".parse::<Strategy>().unwrap(), Strategy::Brrrr);
    }

    #[test]
    fn test_unknown_strategy_from_json() {
        let err = serde_json::from_str::<Strategy>("\"wholesale\"").unwrap_err();
        assert!(err.to_string().contains("Unsupported strategy"));
        assert!(matches!(
            "wholesale".parse::<Strategy>(),
            Err(RealtyError::UnsupportedStrategy(s)) if s == "wholesale"
        ));
    }

    #[test]
    fn test_unknown_loan_type() {
        assert!(matches!(
            "jumbo".parse::<LoanType>(),
            Err(RealtyError::UnsupportedLoanType(_))
        ));
        assert_eq!(serde_json::from_str::<LoanType>("\"fha\"").unwrap(), LoanType::Fha);
    }

    #[test]
    fn test_strategy_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Strategy::HouseHack).unwrap(), "\"house_hack\"");
    }

    #[test]
    fn test_config_defaults_from_minimal_json() {
        let cfg: AnalysisConfig =
            serde_json::from_str(r#"{ "strategy": "rental", "loan_type": "conventional" }"#).unwrap();
        assert_eq!(cfg, AnalysisConfig::new(Strategy::Rental, LoanType::Conventional));
        assert_eq!(cfg.interest_rate, dec!(0.065));
        assert_eq!(cfg.loan_term_years, 30);
    }

    #[test]
    fn test_missing_value_is_invalid_input() {
        let mut record = PropertyRecord::new("1 Main St", dec!(300000), dec!(2200));
        record.estimated_value = None;
        assert!(matches!(
            record.validate(),
            Err(RealtyError::InvalidInput { field, .. }) if field == "estimated_value"
        ));
    }

    #[test]
    fn test_zero_rent_is_invalid_input() {
        let record = PropertyRecord::new("1 Main St", dec!(300000), Decimal::ZERO);
        assert!(matches!(
            record.validate(),
            Err(RealtyError::InvalidInput { field, .. }) if field == "estimated_rent"
        ));
    }

    #[test]
    fn test_loan_parameter_validation() {
        let mut cfg = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
        cfg.interest_rate = Decimal::ZERO;
        assert!(matches!(cfg.validate(), Err(RealtyError::InvalidLoanParameters { .. })));

        cfg.interest_rate = dec!(0.065);
        cfg.loan_term_years = 0;
        assert!(matches!(cfg.validate(), Err(RealtyError::InvalidLoanParameters { .. })));

        cfg.loan_term_years = 30;
        cfg.down_payment_pct = Some(Decimal::ONE);
        assert!(matches!(cfg.validate(), Err(RealtyError::InvalidLoanParameters { .. })));

        cfg.down_payment_pct = Some(Decimal::ZERO);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_loan_term_upper_bound() {
        let mut cfg = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
        cfg.interest_rate = dec!(0.9);
        cfg.loan_term_years = 100;
        assert!(matches!(cfg.validate(), Err(RealtyError::InvalidLoanParameters { .. })));

        cfg.loan_term_years = MAX_LOAN_TERM_YEARS;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_hold_years_bounds() {
        let mut cfg = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
        cfg.hold_years = Some(2000);
        assert!(matches!(cfg.validate(), Err(RealtyError::InvalidInput { .. })));

        cfg.hold_years = Some(0);
        assert!(matches!(cfg.validate(), Err(RealtyError::InvalidInput { .. })));

        cfg.hold_years = Some(MAX_HOLD_YEARS);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_override_fraction_validation() {
        let mut cfg = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
        cfg.vacancy_rate_pct = Some(dec!(5));
        assert!(matches!(cfg.validate(), Err(RealtyError::InvalidInput { .. })));
    }

    #[test]
    fn test_resolution_prefers_config_then_market() {
        let record = PropertyRecord::new("1 Main St", dec!(300000), dec!(2200));
        let market = MarketStatistics {
            zip_code: "78701".into(),
            appreciation_rate: Some(dec!(0.06)),
            rent_growth_rate: Some(dec!(0.05)),
            ..Default::default()
        };
        let mut cfg = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
        cfg.use_market_defaults = true;
        cfg.rent_growth_rate = Some(dec!(0.01));
        let mut warnings = Vec::new();
        let deal = DealInputs::resolve(
            &record,
            Some(&market),
            &cfg,
            &AnalysisAssumptions::default(),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(deal.appreciation_rate, dec!(0.06));
        assert_eq!(deal.rent_growth_rate, dec!(0.01));
        assert_eq!(deal.purchase_price, dec!(300000));
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_market_ignored_unless_requested() {
        let record = PropertyRecord::new("1 Main St", dec!(300000), dec!(2200));
        let market = MarketStatistics {
            zip_code: "78701".into(),
            appreciation_rate: Some(dec!(0.06)),
            ..Default::default()
        };
        let cfg = AnalysisConfig::new(Strategy::Rental, LoanType::Conventional);
        let mut warnings = Vec::new();
        let deal = DealInputs::resolve(
            &record,
            Some(&market),
            &cfg,
            &AnalysisAssumptions::default(),
            &mut warnings,
        )
        .unwrap();
        assert_eq!(deal.appreciation_rate, dec!(0.04));
    }

    #[test]
    fn test_flip_without_arv_warns() {
        let record = PropertyRecord::new("1 Main St", dec!(300000), dec!(2200));
        let cfg = AnalysisConfig::new(Strategy::Flip, LoanType::Conventional);
        let mut warnings = Vec::new();
        let deal = DealInputs::resolve(&record, None, &cfg, &AnalysisAssumptions::default(), &mut warnings)
            .unwrap();
        assert_eq!(deal.after_repair_value, Some(dec!(300000)));
        assert_eq!(warnings.len(), 2);
    }
}
