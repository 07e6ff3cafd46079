use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{
    pricing::{price_quote_with, QuotePricingResponse},
    AppState,
};
use crate::{
    error::AppError,
    pricing::{
        calculate_tco,
        models::{ActingUser, Quote, QuoteStatus},
        TcoResult,
    },
    quotes::{QuoteFilter, QuoteListEntry},
};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<QuoteStatus>,
}

/// GET /api/quotes
///
/// Partners only see their own quotes.
pub async fn list_quotes(
    State(state): State<AppState>,
    Extension(user): Extension<ActingUser>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<QuoteListEntry>>, AppError> {
    let filter = QuoteFilter {
        status: query.status,
        created_by: (!user.is_admin()).then(|| user.name.clone()),
    };
    Ok(Json(state.quotes.list(&filter).await?))
}

/// POST /api/quotes
pub async fn create_quote(
    State(state): State<AppState>,
    Extension(user): Extension<ActingUser>,
    Json(mut quote): Json<Quote>,
) -> Result<(StatusCode, Json<Quote>), AppError> {
    // Partners cannot file quotes under someone else's name
    if !user.is_admin() {
        quote.created_by = Some(user.name.clone());
    }
    let quote = state.quotes.create(quote, &user.name).await?;
    Ok((StatusCode::CREATED, Json(quote)))
}

/// GET /api/quotes/:id
pub async fn get_quote(
    State(state): State<AppState>,
    Extension(user): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Quote>, AppError> {
    Ok(Json(load_visible(&state, &user, id).await?))
}

/// PUT /api/quotes/:id
pub async fn update_quote(
    State(state): State<AppState>,
    Extension(user): Extension<ActingUser>,
    Path(id): Path<Uuid>,
    Json(quote): Json<Quote>,
) -> Result<Json<Quote>, AppError> {
    load_visible(&state, &user, id).await?;
    Ok(Json(state.quotes.update(id, quote).await?))
}

/// DELETE /api/quotes/:id
pub async fn delete_quote(
    State(state): State<AppState>,
    Extension(user): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    load_visible(&state, &user, id).await?;
    state.quotes.delete(id).await?;
    tracing::info!(quote_id = %id, user = %user.name, "Quote deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/quotes/:id/summary
pub async fn quote_summary(
    State(state): State<AppState>,
    Extension(user): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<QuotePricingResponse>, AppError> {
    let quote = load_visible(&state, &user, id).await?;
    Ok(Json(price_quote_with(&state, &quote, &user)))
}

/// GET /api/quotes/:id/tco
pub async fn quote_tco(
    State(state): State<AppState>,
    Extension(user): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Option<TcoResult>>, AppError> {
    let quote = load_visible(&state, &user, id).await?;
    let rate_data = state.pricing.rate_data();
    let settings = state.pricing.tco_settings();
    Ok(Json(calculate_tco(&quote, &rate_data, &settings, &user)))
}

/// Load a quote the user may see; other partners' quotes read as missing
async fn load_visible(state: &AppState, user: &ActingUser, id: Uuid) -> Result<Quote, AppError> {
    let quote = state
        .quotes
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Quote {}", id)))?;

    if user.is_admin() || quote.created_by.as_deref() == Some(user.name.as_str()) {
        Ok(quote)
    } else {
        Err(AppError::NotFound(format!("Quote {}", id)))
    }
}
