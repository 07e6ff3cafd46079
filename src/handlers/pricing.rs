use axum::{extract::State, Extension, Json};
use serde::Serialize;

use super::AppState;
use crate::pricing::{
    calculate_tco, commission_for, item_costs,
    models::{ActingUser, CalculationItem, Quote},
    rate_table::{candidate_keys, resolve_factor, ResolvedFactor},
    summarize_quote, ItemCosts, NamedOptionSummary, TcoResult,
};

#[derive(Debug, Serialize)]
pub struct ItemPricingResponse {
    pub candidate_keys: Vec<String>,
    /// Base factor source; None when no candidate defines the term
    pub resolved: Option<ResolvedFactor>,
    pub commission_percentage: f64,
    pub costs: ItemCosts,
}

#[derive(Debug, Serialize)]
pub struct QuotePricingResponse {
    pub commission_percentage: f64,
    pub options: Vec<NamedOptionSummary>,
    pub tco: Option<TcoResult>,
}

/// POST /api/pricing/item
pub async fn price_item(
    State(state): State<AppState>,
    Extension(user): Extension<ActingUser>,
    Json(item): Json<CalculationItem>,
) -> Json<ItemPricingResponse> {
    let rate_data = state.pricing.rate_data();
    let commission = commission_for(&user);
    let candidates = candidate_keys(&item);
    let resolved = resolve_factor(&rate_data.rates, &candidates, item.lease_term);

    Json(ItemPricingResponse {
        costs: item_costs(&item, &rate_data, commission),
        candidate_keys: candidates,
        resolved,
        commission_percentage: commission,
    })
}

/// Option summaries plus the lease-vs-purchase comparison for a quote
pub fn price_quote_with(
    state: &AppState,
    quote: &Quote,
    user: &ActingUser,
) -> QuotePricingResponse {
    let rate_data = state.pricing.rate_data();
    let tco_settings = state.pricing.tco_settings();
    let commission = commission_for(user);

    QuotePricingResponse {
        commission_percentage: commission,
        options: summarize_quote(quote, &rate_data, commission),
        tco: calculate_tco(quote, &rate_data, &tco_settings, user),
    }
}

/// POST /api/pricing/quote
pub async fn price_quote(
    State(state): State<AppState>,
    Extension(user): Extension<ActingUser>,
    Json(quote): Json<Quote>,
) -> Json<QuotePricingResponse> {
    Json(price_quote_with(&state, &quote, &user))
}
