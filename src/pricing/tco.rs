//! Lease-versus-purchase total cost of ownership.

use serde::Serialize;

use crate::pricing::calculator::{commission_for, get_lease_rate_factor};
use crate::pricing::models::{ActingUser, LeaseRateFactorsData, Quote, TcoSettings};

/// Every figure of the comparison; all of them are displayed and exported
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TcoResult {
    pub total_devices: u64,
    pub total_purchase_price: f64,
    pub total_lease_cost: f64,
    pub weighted_avg_term_months: f64,
    pub weighted_avg_term_years: f64,
    pub wacc: f64,
    pub cost_of_capital: f64,
    pub total_deployment_cost: f64,
    pub total_support_cost: f64,
    pub total_downtime_cost: f64,
    pub total_eold_cost: f64,
    pub total_residual_value: f64,
    pub total_tco_for_purchase: f64,
    pub absolute_savings: f64,
    pub savings_percentage: f64,
}

/// WACC in percent: the custom override, else the industry table value
pub fn effective_wacc(quote: &Quote, settings: &TcoSettings) -> f64 {
    if settings.use_custom_wacc {
        settings.custom_wacc
    } else {
        quote.industry.unwrap_or(settings.industry).wacc()
    }
}

/// Compare leasing every item of the quote against buying it outright.
/// Returns None when no option holds any item.
pub fn calculate_tco(
    quote: &Quote,
    rate_data: &LeaseRateFactorsData,
    settings: &TcoSettings,
    acting_user: &ActingUser,
) -> Option<TcoResult> {
    if quote.is_empty() {
        return None;
    }

    let commission = commission_for(acting_user);

    let mut total_devices: u64 = 0;
    let mut total_purchase_price = 0.0;
    let mut total_lease_cost = 0.0;
    let mut term_value_sum = 0.0;

    for item in quote.all_items() {
        let quantity = item.quantity as f64;
        let term = item.lease_term as f64;
        let factor = get_lease_rate_factor(
            &rate_data.rates,
            item,
            rate_data.non_return_uplift_factor,
            commission,
        );

        total_devices += item.quantity as u64;
        total_purchase_price += item.hardware_cost * quantity;
        total_lease_cost += (item.hardware_cost * factor * term + item.services_cost()) * quantity;
        term_value_sum += term * item.hardware_cost * quantity;
    }

    let weighted_avg_term_months = if total_purchase_price != 0.0 {
        term_value_sum / total_purchase_price
    } else {
        0.0
    };
    let years = weighted_avg_term_months / 12.0;
    let devices = total_devices as f64;

    let wacc = effective_wacc(quote, settings);
    let cost_of_capital = total_purchase_price * ((1.0 + wacc / 100.0).powf(years) - 1.0);
    let total_deployment_cost = settings.deployment_cost_per_device * devices;
    let total_support_cost =
        settings.support_hours_per_device_year * settings.staff_hourly_rate * devices * years;
    let total_downtime_cost = settings.failures_per_device_year
        * settings.downtime_hours_per_failure
        * settings.employee_cost_per_hour
        * devices
        * years;
    let total_eold_cost = settings.eold_cost_per_device * devices;
    let total_residual_value = total_purchase_price * settings.residual_value_percentage / 100.0;

    let total_tco_for_purchase = total_purchase_price
        + cost_of_capital
        + total_deployment_cost
        + total_support_cost
        + total_downtime_cost
        + total_eold_cost
        - total_residual_value;

    let absolute_savings = total_tco_for_purchase - total_lease_cost;
    let savings_percentage = if total_tco_for_purchase != 0.0 {
        absolute_savings / total_tco_for_purchase
    } else {
        0.0
    };

    Some(TcoResult {
        total_devices,
        total_purchase_price,
        total_lease_cost,
        weighted_avg_term_months,
        weighted_avg_term_years: years,
        wacc,
        cost_of_capital,
        total_deployment_cost,
        total_support_cost,
        total_downtime_cost,
        total_eold_cost,
        total_residual_value,
        total_tco_for_purchase,
        absolute_savings,
        savings_percentage,
    })
}
