use arc_swap::ArcSwap;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use lease_quote::{
    auth::AuthMiddlewareState,
    config::{Config, DatabaseConfig, ServerConfig, UserConfig},
    handlers::AppState,
    pricing::{PricingService, UserRole},
    server::create_router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN_KEY: &str = "ak-admin-001";
const ACME_KEY: &str = "pk-acme-001";
const GLOBEX_KEY: &str = "pk-globex-001";

fn user(key: &str, name: &str, role: UserRole, commission: f64) -> UserConfig {
    UserConfig {
        key: key.to_string(),
        name: name.to_string(),
        role,
        commission_percentage: commission,
        enabled: true,
    }
}

async fn test_app() -> anyhow::Result<Router> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let pricing = Arc::new(PricingService::new(pool.clone()));
    pricing.load_cache().await?;

    let config = Config {
        server: ServerConfig::default(),
        database: DatabaseConfig::default(),
        users: vec![
            user(ADMIN_KEY, "admin", UserRole::Admin, 0.0),
            user(ACME_KEY, "acme", UserRole::Partner, 5.0),
            user(GLOBEX_KEY, "globex", UserRole::Partner, 0.0),
        ],
    };
    let auth_state = AuthMiddlewareState {
        config: Arc::new(ArcSwap::from_pointee(config)),
    };

    Ok(create_router(AppState::new(pool, pricing), auth_state))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    key: Option<&str>,
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, Value)> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        builder = builder.header("Authorization", format!("Bearer {}", key));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))?,
        None => builder.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

fn rate_update() -> Value {
    json!({
        "rates": {
            "Laptop": { "24": 0.0375, "36": 0.03 },
            "Laptop-HP": { "36": 0.029 }
        },
        "non_return_uplift_factor": 0.008,
        "packing_service_cost": 10.0,
        "notification_email": "pricing@example.com"
    })
}

fn laptop_quote() -> Value {
    json!({
        "customer_name": "Contoso",
        "options": [{
            "name": "Option A",
            "items": [{
                "asset_type": "Laptop",
                "brand": "HP",
                "lease_term": 24,
                "quantity": 2,
                "hardware_cost": 1200.0
            }]
        }]
    })
}

#[tokio::test]
async fn test_health_is_public_and_api_requires_key() -> anyhow::Result<()> {
    let app = test_app().await?;

    let (status, body) = send(&app, "GET", "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, "GET", "/api/rates", None, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["type"], "unauthorized");

    let (status, _) = send(&app, "GET", "/api/rates", Some("pk-unknown"), None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn test_only_admins_edit_rates() -> anyhow::Result<()> {
    let app = test_app().await?;

    let (status, _) = send(&app, "PUT", "/api/rates", Some(ACME_KEY), Some(rate_update())).await?;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) =
        send(&app, "PUT", "/api/rates", Some(ADMIN_KEY), Some(rate_update())).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["last_updated_by"], "admin");

    // Partners read the same table
    let (status, body) = send(&app, "GET", "/api/rates", Some(ACME_KEY), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rates"]["Laptop-HP"]["36"], 0.029);

    let (status, body) =
        send(&app, "GET", "/api/rates/preview/Laptop-HP", Some(ACME_KEY), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["terms"]["24"]["key"], "Laptop");
    assert_eq!(body["terms"]["36"]["key"], "Laptop-HP");
    Ok(())
}

#[tokio::test]
async fn test_partner_quote_priced_with_commission() -> anyhow::Result<()> {
    let app = test_app().await?;
    send(&app, "PUT", "/api/rates", Some(ADMIN_KEY), Some(rate_update())).await?;

    let (status, created) =
        send(&app, "POST", "/api/quotes", Some(ACME_KEY), Some(laptop_quote())).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["created_by"], "acme");
    let id = created["id"].as_str().unwrap_or_default().to_string();

    let (status, summary) =
        send(&app, "GET", &format!("/api/quotes/{}/summary", id), Some(ACME_KEY), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["commission_percentage"], 5.0);
    // (0.0375 + 0.05 / 24) * 1200 * 2
    let monthly = summary["options"][0]["total_monthly_cost"].as_f64().unwrap_or_default();
    assert!((monthly - 95.0).abs() < 1e-9);

    // Admins price the same quote without commission
    let (_, summary) =
        send(&app, "GET", &format!("/api/quotes/{}/summary", id), Some(ADMIN_KEY), None).await?;
    let monthly = summary["options"][0]["total_monthly_cost"].as_f64().unwrap_or_default();
    assert!((monthly - 90.0).abs() < 1e-9);

    let (status, _) =
        send(&app, "GET", &format!("/api/quotes/{}", id), Some(GLOBEX_KEY), None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, tco) =
        send(&app, "GET", &format!("/api/quotes/{}/tco", id), Some(ACME_KEY), None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tco["total_devices"], 2);
    assert_eq!(tco["total_purchase_price"], 2400.0);

    let (status, _) =
        send(&app, "DELETE", &format!("/api/quotes/{}", id), Some(ACME_KEY), None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, listed) = send(&app, "GET", "/api/quotes", Some(ACME_KEY), None).await?;
    assert_eq!(listed.as_array().map(Vec::len), Some(0));
    Ok(())
}

#[tokio::test]
async fn test_price_item_without_rates_is_zero() -> anyhow::Result<()> {
    let app = test_app().await?;

    let item = json!({
        "asset_type": "Desktop",
        "lease_term": 36,
        "quantity": 1,
        "hardware_cost": 700.0
    });
    let (status, body) =
        send(&app, "POST", "/api/pricing/item", Some(GLOBEX_KEY), Some(item)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resolved"], Value::Null);
    assert_eq!(body["costs"]["total_lease_cost"], 0.0);
    assert_eq!(body["candidate_keys"], json!(["Desktop"]));
    Ok(())
}
