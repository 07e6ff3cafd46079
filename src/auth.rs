use crate::{config::Config, error::AppError, pricing::models::ActingUser};
use arc_swap::ArcSwap;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// State for authentication middleware
#[derive(Clone)]
pub struct AuthMiddlewareState {
    /// Configuration (via ArcSwap for hot reload)
    pub config: Arc<ArcSwap<Config>>,
}

/// Authentication middleware
/// Resolves the Bearer token to a configured user and attaches it to the request
/// as the [`ActingUser`].
pub async fn auth_middleware(
    State(state): State<AuthMiddlewareState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = extract_bearer_token(auth_header)?;

    let config = state.config.load();
    let user = config
        .users
        .iter()
        .find(|u| u.enabled && bool::from(u.key.as_bytes().ct_eq(token.as_bytes())))
        .ok_or_else(|| AppError::Unauthorized("Invalid or disabled API key".to_string()))?;

    tracing::debug!(user = %user.name, role = ?user.role, "Request authenticated");
    req.extensions_mut().insert(user.acting_user());

    Ok(next.run(req).await)
}

/// Reject callers that are not administrators
pub fn require_admin(user: &ActingUser) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!(
            "User '{}' is not allowed to change pricing settings",
            user.name
        )))
    }
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(auth_header: &str) -> Result<&str, AppError> {
    const BEARER_PREFIX: &str = "Bearer ";

    let token = auth_header.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
        AppError::Unauthorized("Authorization header must use Bearer scheme".to_string())
    })?;

    if token.is_empty() {
        return Err(AppError::Unauthorized("Bearer token is empty".to_string()));
    }

    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, DatabaseConfig, ServerConfig, UserConfig};
    use crate::pricing::models::UserRole;
    use axum::{body::Body, http::Request, middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    #[test]
    fn test_extract_bearer_token_success() {
        let token = extract_bearer_token("Bearer pk-test-key-123").unwrap();
        assert_eq!(token, "pk-test-key-123");
    }

    #[test]
    fn test_extract_bearer_token_missing_prefix() {
        assert!(extract_bearer_token("pk-test-key-123").is_err());
    }

    #[test]
    fn test_extract_bearer_token_empty() {
        assert!(extract_bearer_token("Bearer ").is_err());
    }

    #[test]
    fn test_require_admin() {
        let mut user = ActingUser {
            name: "p".to_string(),
            role: UserRole::Partner,
            commission_percentage: 2.0,
        };
        assert!(matches!(require_admin(&user), Err(AppError::Forbidden(_))));
        user.role = UserRole::Admin;
        assert!(require_admin(&user).is_ok());
    }

    fn test_app() -> Router {
        let config = Config {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            users: vec![
                UserConfig {
                    key: "pk-partner-001".to_string(),
                    name: "partner".to_string(),
                    role: UserRole::Partner,
                    commission_percentage: 4.0,
                    enabled: true,
                },
                UserConfig {
                    key: "pk-partner-002".to_string(),
                    name: "disabled".to_string(),
                    role: UserRole::Partner,
                    commission_percentage: 0.0,
                    enabled: false,
                },
            ],
        };
        let state = AuthMiddlewareState {
            config: Arc::new(ArcSwap::from_pointee(config)),
        };

        Router::new()
            .route(
                "/whoami",
                get(|Extension(user): Extension<ActingUser>| async move { user.name }),
            )
            .layer(middleware::from_fn_with_state(state, auth_middleware))
    }

    async fn status_for(header: Option<&str>) -> u16 {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(value) = header {
            builder = builder.header("Authorization", value);
        }
        let response = test_app()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.status().as_u16()
    }

    #[tokio::test]
    async fn test_auth_middleware_valid_key() {
        assert_eq!(status_for(Some("Bearer pk-partner-001")).await, 200);
    }

    #[tokio::test]
    async fn test_auth_middleware_disabled_key() {
        assert_eq!(status_for(Some("Bearer pk-partner-002")).await, 401);
    }

    #[tokio::test]
    async fn test_auth_middleware_invalid_or_missing_key() {
        assert_eq!(status_for(Some("Bearer pk-invalid")).await, 401);
        assert_eq!(status_for(None).await, 401);
    }
}
