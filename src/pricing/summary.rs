use serde::Serialize;

use crate::pricing::calculator::item_costs;
use crate::pricing::models::{CalculationItem, LeaseRateFactorsData, Quote};

/// Totals of one quote option
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptionSummary {
    pub total_hardware_value: f64,
    pub total_services_cost: f64,
    pub total_monthly_cost: f64,
    pub total_lease_cost: f64,
    pub bundled_monthly_cost: f64,
    pub bundled_total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedOptionSummary {
    pub name: String,
    pub item_count: usize,
    #[serde(flatten)]
    pub summary: OptionSummary,
}

/// Fold item costs of an option into its totals
pub fn summarize_option(
    items: &[CalculationItem],
    rate_data: &LeaseRateFactorsData,
    partner_commission_percent: f64,
) -> OptionSummary {
    let mut summary = OptionSummary::default();

    for item in items {
        let costs = item_costs(item, rate_data, partner_commission_percent);
        summary.total_hardware_value += costs.hardware_value;
        summary.total_services_cost += costs.total_services_cost;
        summary.total_monthly_cost += costs.monthly_hardware_cost;
        summary.total_lease_cost += costs.total_lease_cost;
        summary.bundled_monthly_cost += costs.bundled_monthly_cost;
        summary.bundled_total_cost += costs.bundled_monthly_cost * item.lease_term as f64;
    }

    summary
}

/// One summary per option, in option order
pub fn summarize_quote(
    quote: &Quote,
    rate_data: &LeaseRateFactorsData,
    partner_commission_percent: f64,
) -> Vec<NamedOptionSummary> {
    quote
        .options
        .iter()
        .map(|option| NamedOptionSummary {
            name: option.name.clone(),
            item_count: option.items.len(),
            summary: summarize_option(&option.items, rate_data, partner_commission_percent),
        })
        .collect()
}
