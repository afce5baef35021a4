use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::config::BasicAuthConfig;

const REALM: &str = "get";

/// Challenge-response check run before any handler when credentials are
/// configured. Applies uniformly to every route.
pub async fn require_basic_auth(
    auth: BasicAuthConfig,
    request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if credentials_match(&auth, header) {
        next.run(request).await
    } else {
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, format!("Basic realm=\"{REALM}\""))],
            "Unauthorized",
        )
            .into_response()
    }
}

fn credentials_match(auth: &BasicAuthConfig, header: Option<&str>) -> bool {
    let Some(header) = header else { return false };
    let Some(encoded) = header.strip_prefix("Basic ") else {
        return false;
    };
    let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
        return false;
    };
    let Ok(decoded) = String::from_utf8(decoded) else {
        return false;
    };
    match decoded.split_once(':') {
        Some((username, password)) => username == auth.username && password == auth.password,
        None => false,
    }
}
