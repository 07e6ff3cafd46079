use serde::Serialize;
use std::collections::BTreeMap;

use crate::pricing::models::{ActingUser, CalculationItem, LeaseRateFactorsData, RateRow};
use crate::pricing::rate_table::base_factor;

/// Monthly lease rate factor for an item.
///
/// The non-return uplift scales the base factor linearly with the non-return
/// percentage; the partner commission is amortized over the term and added.
pub fn get_lease_rate_factor(
    rates: &BTreeMap<String, RateRow>,
    item: &CalculationItem,
    non_return_uplift_factor: f64,
    partner_commission_percent: f64,
) -> f64 {
    let mut factor = base_factor(rates, item, item.lease_term);

    let non_return = item.non_return_percentage.unwrap_or(0.0);
    if item.asset_type.is_non_return_eligible() && non_return > 0.0 {
        factor *= 1.0 + non_return_uplift_factor * non_return;
    }

    if partner_commission_percent > 0.0 {
        factor += (partner_commission_percent / 100.0) / item.lease_term as f64;
    }

    factor
}

/// Commission applied to the acting user's quotes; admins price without one
pub fn commission_for(user: &ActingUser) -> f64 {
    if user.is_admin() {
        0.0
    } else {
        user.commission_percentage
    }
}

/// Cost figures of one line item
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ItemCosts {
    pub factor: f64,
    pub monthly_hardware_cost_per_unit: f64,
    pub total_services_cost_per_unit: f64,
    pub total_lease_cost_per_unit: f64,
    /// Monthly figure with one-time services spread over the term
    pub bundled_monthly_cost_per_unit: f64,
    pub hardware_value: f64,
    pub monthly_hardware_cost: f64,
    pub total_services_cost: f64,
    pub total_lease_cost: f64,
    pub bundled_monthly_cost: f64,
}

/// Derive an item's per-unit and per-line costs from the current rate data
pub fn item_costs(
    item: &CalculationItem,
    rate_data: &LeaseRateFactorsData,
    partner_commission_percent: f64,
) -> ItemCosts {
    let factor = get_lease_rate_factor(
        &rate_data.rates,
        item,
        rate_data.non_return_uplift_factor,
        partner_commission_percent,
    );
    let term = item.lease_term as f64;
    let quantity = item.quantity as f64;

    let monthly_hardware_cost_per_unit = item.hardware_cost * factor;
    let mut total_services_cost_per_unit = item.services_cost();
    if item.include_packing_service {
        total_services_cost_per_unit += rate_data.packing_service_cost;
    }
    let total_lease_cost_per_unit =
        monthly_hardware_cost_per_unit * term + total_services_cost_per_unit;
    let bundled_monthly_cost_per_unit =
        monthly_hardware_cost_per_unit + total_services_cost_per_unit / term;

    ItemCosts {
        factor,
        monthly_hardware_cost_per_unit,
        total_services_cost_per_unit,
        total_lease_cost_per_unit,
        bundled_monthly_cost_per_unit,
        hardware_value: item.hardware_cost * quantity,
        monthly_hardware_cost: monthly_hardware_cost_per_unit * quantity,
        total_services_cost: total_services_cost_per_unit * quantity,
        total_lease_cost: total_lease_cost_per_unit * quantity,
        bundled_monthly_cost: bundled_monthly_cost_per_unit * quantity,
    }
}
