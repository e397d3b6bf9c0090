use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};
use crate::RealtyResult;

use super::assumptions::ExpenseAssumptions;
use super::cents;
use super::inputs::{AnalysisConfig, MarketStatistics, PropertyRecord, Strategy};

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Where an expense rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    Config,
    Market,
    Default,
}

/// Monthly operating expenses. `total_monthly_expenses` is the plain sum of
/// the six components; the rates used to derive them are carried alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseBreakdown {
    pub property_tax: Money,
    pub insurance: Money,
    pub hoa: Money,
    pub maintenance: Money,
    pub vacancy_reserve: Money,
    pub management_fee: Money,
    pub total_monthly_expenses: Money,
    pub property_tax_rate: Rate,
    pub insurance_rate: Rate,
    pub maintenance_pct: Rate,
    pub vacancy_rate: Rate,
    pub vacancy_source: RateSource,
    pub management_fee_pct: Rate,
}

impl ExpenseBreakdown {
    /// Components charged as a share of rent (vacancy, management,
    /// maintenance).
    pub fn rent_linked(&self) -> Money {
        self.vacancy_reserve + self.management_fee + self.maintenance
    }

    /// Components independent of rent (tax, insurance, HOA).
    pub fn fixed(&self) -> Money {
        self.property_tax + self.insurance + self.hoa
    }

    /// Rent share consumed by the rent-linked components.
    pub fn rent_linked_pct(&self) -> Rate {
        self.vacancy_rate + self.management_fee_pct + self.maintenance_pct
    }
}

/// Estimate monthly operating expenses from the record, user overrides and
/// (when requested) market statistics.
pub fn estimate_expenses(
    property: &PropertyRecord,
    config: &AnalysisConfig,
    market: Option<&MarketStatistics>,
    defaults: &ExpenseAssumptions,
) -> RealtyResult<ExpenseBreakdown> {
    let value = property.value()?;
    let rent = property.rent()?;

    let property_tax_rate = property
        .property_tax_rate
        .unwrap_or(defaults.property_tax_rate);
    let insurance_rate = defaults.insurance_rate;
    let maintenance_pct = config.maintenance_pct.unwrap_or(defaults.maintenance_pct);

    let market_vacancy = market
        .filter(|_| config.use_market_defaults)
        .and_then(|m| m.vacancy_rate);
    let (vacancy_rate, vacancy_source) = match (config.vacancy_rate_pct, market_vacancy) {
        (Some(v), _) => (v, RateSource::Config),
        (None, Some(v)) => (v, RateSource::Market),
        (None, None) => (defaults.vacancy_rate, RateSource::Default),
    };

    let management_fee_pct = match (config.management_fee_pct, config.strategy) {
        (Some(fee), _) => fee,
        (None, Strategy::HouseHack) => defaults.house_hack_management_fee_pct,
        (None, _) => defaults.management_fee_pct,
    };

    let hoa = config
        .monthly_hoa
        .or(property.monthly_hoa)
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO);

    let property_tax = cents(value * property_tax_rate / MONTHS_PER_YEAR);
    let insurance = cents(value * insurance_rate / MONTHS_PER_YEAR);
    let maintenance = cents(rent * maintenance_pct);
    let vacancy_reserve = cents(rent * vacancy_rate);
    let management_fee = cents(rent * management_fee_pct);

    let total_monthly_expenses =
        property_tax + insurance + hoa + maintenance + vacancy_reserve + management_fee;

    Ok(ExpenseBreakdown {
        property_tax,
        insurance,
        hoa,
        maintenance,
        vacancy_reserve,
        management_fee,
        total_monthly_expenses,
        property_tax_rate,
        insurance_rate,
        maintenance_pct,
        vacancy_rate,
        vacancy_source,
        management_fee_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property_analysis::inputs::LoanType;
    use rust_decimal_macros::dec;

    fn sample_property() -> PropertyRecord {
        PropertyRecord::new("123 Main St", dec!(300000), dec!(2200))
    }

    fn rental_config() -> AnalysisConfig {
        AnalysisConfig::new(Strategy::Rental, LoanType::Conventional)
    }

    #[test]
    fn test_default_expenses() {
        let e = estimate_expenses(&sample_property(), &rental_config(), None, &ExpenseAssumptions::default())
            .unwrap();
        assert_eq!(e.property_tax, dec!(300));
        assert_eq!(e.insurance, dec!(125));
        assert_eq!(e.hoa, Decimal::ZERO);
        assert_eq!(e.maintenance, dec!(110));
        assert_eq!(e.vacancy_reserve, dec!(110));
        assert_eq!(e.management_fee, dec!(176));
        assert_eq!(e.total_monthly_expenses, dec!(821));
        assert_eq!(e.vacancy_source, RateSource::Default);
    }

    #[test]
    fn test_total_is_sum_of_components() {
        let mut property = sample_property();
        property.monthly_hoa = Some(dec!(150));
        property.property_tax_rate = Some(dec!(0.021));
        let e = estimate_expenses(&property, &rental_config(), None, &ExpenseAssumptions::default()).unwrap();
        assert_eq!(
            e.total_monthly_expenses,
            e.property_tax + e.insurance + e.hoa + e.maintenance + e.vacancy_reserve + e.management_fee
        );
        assert_eq!(e.property_tax, dec!(525));
        assert_eq!(e.hoa, dec!(150));
    }

    #[test]
    fn test_config_hoa_overrides_record() {
        let mut property = sample_property();
        property.monthly_hoa = Some(dec!(150));
        let mut cfg = rental_config();
        cfg.monthly_hoa = Some(dec!(75));
        let e = estimate_expenses(&property, &cfg, None, &ExpenseAssumptions::default()).unwrap();
        assert_eq!(e.hoa, dec!(75));
    }

    #[test]
    fn test_house_hack_has_no_management_fee() {
        let cfg = AnalysisConfig::new(Strategy::HouseHack, LoanType::Fha);
        let e = estimate_expenses(&sample_property(), &cfg, None, &ExpenseAssumptions::default()).unwrap();
        assert_eq!(e.management_fee, Decimal::ZERO);
    }

    #[test]
    fn test_market_vacancy_only_when_requested() {
        let market = MarketStatistics {
            zip_code: "78701".into(),
            vacancy_rate: Some(dec!(0.10)),
            ..Default::default()
        };
        let mut cfg = rental_config();
        let e = estimate_expenses(&sample_property(), &cfg, Some(&market), &ExpenseAssumptions::default())
            .unwrap();
        assert_eq!(e.vacancy_rate, dec!(0.05));

        cfg.use_market_defaults = true;
        let e = estimate_expenses(&sample_property(), &cfg, Some(&market), &ExpenseAssumptions::default())
            .unwrap();
        assert_eq!(e.vacancy_rate, dec!(0.10));
        assert_eq!(e.vacancy_source, RateSource::Market);
        assert_eq!(e.vacancy_reserve, dec!(220));

        cfg.vacancy_rate_pct = Some(dec!(0.02));
        let e = estimate_expenses(&sample_property(), &cfg, Some(&market), &ExpenseAssumptions::default())
            .unwrap();
        assert_eq!(e.vacancy_source, RateSource::Config);
    }

    #[test]
    fn test_missing_rent_is_rejected() {
        let mut property = sample_property();
        property.estimated_rent = None;
        assert!(estimate_expenses(&property, &rental_config(), None, &ExpenseAssumptions::default()).is_err());
    }
}
