//! Router assembly and server startup.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{middleware, routing::get, Extension, Router};
use tracing::info;

use super::{auth, handlers};
use crate::config::{BasicAuthConfig, ServerConfig};
use crate::input::Resolver;

/// Read-only state shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub identity: Option<String>,
    pub debug: bool,
    pub resolver: Arc<Resolver>,
}

pub fn build_router(state: AppState, basic_auth: Option<BasicAuthConfig>) -> Router {
    let mut router = Router::new()
        .route("/execute", get(handlers::execute))
        .route("/echo", get(handlers::echo));

    // Applied to the whole router, so both endpoints are gated uniformly.
    if let Some(auth) = basic_auth {
        router = router.layer(middleware::from_fn(move |request, next| {
            auth::require_basic_auth(auth.clone(), request, next)
        }));
    }

    router.layer(Extension(state))
}

/// Binds the listen socket and serves until shutdown. A port already in use
/// surfaces here as an error; the caller treats it as fatal.
pub async fn serve(config: ServerConfig, resolver: Arc<Resolver>) -> Result<()> {
    let state = AppState {
        identity: config.identity.clone(),
        debug: config.debug,
        resolver,
    };
    let app = build_router(state, config.basic_auth.clone());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(
        "listening on {addr}{}",
        if config.debug { " (debug mode)" } else { "" }
    );

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use tower::ServiceExt;

    // None of these requests reach the network or the cache directory, so a
    // plain relative cache root is fine.
    fn test_state(identity: Option<&str>) -> AppState {
        AppState {
            identity: identity.map(String::from),
            debug: false,
            resolver: Arc::new(Resolver::new("tmp", None)),
        }
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn echo_without_identity_returns_none() {
        let app = build_router(test_state(None), None);
        let response = app.oneshot(get("/echo")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "None");
    }

    #[tokio::test]
    async fn echo_returns_the_configured_identity() {
        let app = build_router(test_state(Some("abc")), None);
        let response = app.oneshot(get("/echo")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "abc");
    }

    #[tokio::test]
    async fn malformed_tokens_yield_400_with_the_error_tag() {
        let app = build_router(test_state(None), None);
        let response = app
            .oneshot(get("/execute?--bogus=x&blank=file.pdf"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.starts_with("ParseError: "));
    }

    #[tokio::test]
    async fn empty_query_is_missing_arguments_not_a_crash() {
        let app = build_router(test_state(None), None);
        let response = app.oneshot(get("/execute")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.starts_with("ParseError: "));
    }

    #[tokio::test]
    async fn missing_input_file_is_a_server_side_error_not_400() {
        let app = build_router(test_state(None), None);
        let response = app
            .oneshot(get("/execute?blank=%2Fno%2Fsuch%2Ffile.pdf"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn auth_gates_both_endpoints_when_configured() {
        let auth = BasicAuthConfig {
            username: "user".to_string(),
            password: "pass".to_string(),
        };
        let app = build_router(test_state(Some("abc")), Some(auth));

        let denied = app.clone().oneshot(get("/echo")).await.unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let denied = app
            .clone()
            .oneshot(get("/execute?blank=file.pdf"))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let credentials = STANDARD.encode("user:pass");
        let allowed = app
            .oneshot(
                Request::builder()
                    .uri("/echo")
                    .header(header::AUTHORIZATION, format!("Basic {credentials}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(allowed.status(), StatusCode::OK);
        assert_eq!(body_text(allowed).await, "abc");
    }

    #[tokio::test]
    async fn requests_pass_when_auth_is_not_configured() {
        let app = build_router(test_state(Some("abc")), None);
        let response = app.oneshot(get("/echo")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
