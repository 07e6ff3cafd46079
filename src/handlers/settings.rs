//! Admin-maintained pricing records: the lease rate factor table and the TCO
//! assumptions. Everyone may read them; only admins may write.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Serialize;
use std::collections::BTreeMap;

use super::AppState;
use crate::{
    auth::require_admin,
    error::AppError,
    pricing::{
        models::{ActingUser, LeaseRateFactorsData, RateTableUpdate, TcoSettings},
        rate_table::{inheritance_preview, ResolvedFactor},
    },
};

/// GET /api/rates
pub async fn get_rates(State(state): State<AppState>) -> Json<LeaseRateFactorsData> {
    Json((*state.pricing.rate_data()).clone())
}

/// PUT /api/rates
pub async fn update_rates(
    State(state): State<AppState>,
    Extension(user): Extension<ActingUser>,
    Json(update): Json<RateTableUpdate>,
) -> Result<Json<LeaseRateFactorsData>, AppError> {
    require_admin(&user)?;
    validate_rate_update(&update)?;

    let data = state.pricing.update_rates(update, &user.name).await?;
    Ok(Json((*data).clone()))
}

#[derive(Debug, Serialize)]
pub struct RatePreviewResponse {
    pub key: String,
    pub terms: BTreeMap<u32, ResolvedFactor>,
}

/// GET /api/rates/preview/:key
pub async fn rate_preview(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<RatePreviewResponse> {
    let data = state.pricing.rate_data();
    let terms = inheritance_preview(&data.rates, &key);
    Json(RatePreviewResponse { key, terms })
}

/// GET /api/tco-settings
pub async fn get_tco_settings(State(state): State<AppState>) -> Json<TcoSettings> {
    Json((*state.pricing.tco_settings()).clone())
}

/// PUT /api/tco-settings
pub async fn update_tco_settings(
    State(state): State<AppState>,
    Extension(user): Extension<ActingUser>,
    Json(settings): Json<TcoSettings>,
) -> Result<Json<TcoSettings>, AppError> {
    require_admin(&user)?;
    if !(0.0..=100.0).contains(&settings.residual_value_percentage) {
        return Err(AppError::BadRequest(
            "residual_value_percentage must be between 0 and 100".to_string(),
        ));
    }

    state.pricing.update_tco_settings(settings.clone()).await?;
    Ok(Json(settings))
}

/// Factors, uplift and packing fee must be finite and non-negative
pub fn validate_rate_update(update: &RateTableUpdate) -> Result<(), AppError> {
    for (key, row) in &update.rates {
        if key.is_empty() {
            return Err(AppError::BadRequest("Rate key cannot be empty".to_string()));
        }
        for (term, factor) in row {
            if !factor.is_finite() || *factor < 0.0 {
                return Err(AppError::BadRequest(format!(
                    "Invalid factor {} for '{}' at {} months",
                    factor, key, term
                )));
            }
        }
    }
    if !update.non_return_uplift_factor.is_finite() || update.non_return_uplift_factor < 0.0 {
        return Err(AppError::BadRequest(
            "non_return_uplift_factor must be a non-negative number".to_string(),
        ));
    }
    if !update.packing_service_cost.is_finite() || update.packing_service_cost < 0.0 {
        return Err(AppError::BadRequest(
            "packing_service_cost must be a non-negative number".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::tests::{admin, partner, test_state};
    use crate::pricing::models::{Industry, RateRow};

    fn update_with(key: &str, factor: f64) -> RateTableUpdate {
        let mut rates = BTreeMap::new();
        rates.insert(key.to_string(), RateRow::from([(24, factor)]));
        RateTableUpdate {
            rates,
            non_return_uplift_factor: 0.008,
            packing_service_cost: 10.0,
            notification_email: Some("pricing@example.com".to_string()),
        }
    }

    #[tokio::test]
    async fn test_admin_updates_rates() {
        let state = test_state().await;
        let Json(data) = update_rates(
            State(state.clone()),
            Extension(admin()),
            Json(update_with("Desktop", 0.031)),
        )
        .await
        .unwrap();

        assert_eq!(data.rates["Desktop"][&24], 0.031);
        assert_eq!(data.last_updated_by.as_deref(), Some("admin"));
        // seed + this update
        assert_eq!(data.update_log.len(), 2);

        let Json(current) = get_rates(State(state)).await;
        assert_eq!(current, data);
    }

    #[tokio::test]
    async fn test_partner_cannot_update_rates() {
        let state = test_state().await;
        let result = update_rates(
            State(state),
            Extension(partner("acme", 3.0)),
            Json(update_with("Desktop", 0.031)),
        )
        .await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_negative_factor_rejected() {
        let state = test_state().await;
        let result = update_rates(
            State(state),
            Extension(admin()),
            Json(update_with("Desktop", -0.01)),
        )
        .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_rate_preview_inherits_from_root() {
        let state = test_state().await;
        let Json(preview) = rate_preview(State(state), Path("Laptop-HP-Windows".to_string())).await;

        assert_eq!(preview.terms.len(), 2);
        assert_eq!(preview.terms[&24].key, "Laptop");
        assert_eq!(preview.terms[&36].factor, 0.03);
    }

    #[tokio::test]
    async fn test_tco_settings_round_trip() {
        let state = test_state().await;
        let settings = TcoSettings {
            industry: Industry::Retail,
            ..TcoSettings::default()
        };

        update_tco_settings(State(state.clone()), Extension(admin()), Json(settings.clone()))
            .await
            .unwrap();
        let Json(current) = get_tco_settings(State(state.clone())).await;
        assert_eq!(current, settings);

        let forbidden = update_tco_settings(
            State(state),
            Extension(partner("acme", 0.0)),
            Json(settings),
        )
        .await;
        assert!(matches!(forbidden, Err(AppError::Forbidden(_))));
    }
}
