use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use super::AppState;

/// Liveness probe: the process is up
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "service": "lease-quote",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}

/// Readiness probe: the database answers and a rate table is loaded
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let database_ok = sqlx::query("SELECT 1")
        .execute(&state.db_pool)
        .await
        .is_ok();
    let rate_keys = state.pricing.rate_data().rates.len();

    let status = if database_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(json!({
        "status": if database_ok { "ready" } else { "unavailable" },
        "database": database_ok,
        "rate_keys": rate_keys,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::tests::test_state;

    #[tokio::test]
    async fn test_health_check_returns_ok() {
        let response = health_check().await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_readiness_check_returns_ok() {
        let response = readiness_check(State(test_state().await)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
