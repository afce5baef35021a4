use std::time::Instant;

use axum::extract::{Extension, RawQuery};
use axum::http::StatusCode;
use indexmap::IndexMap;
use tracing::{debug, error, info};

use super::app::AppState;
use crate::extract::{self, ExtractError};

/// Reserved query key marking an intentionally blank flag slot. Its value is
/// still emitted when non-empty; the key itself never is.
const BLANK_KEY: &str = "blank";

/// Ordered multimap of query parameters: keys keep first-occurrence order,
/// values keep arrival order within a key. An empty query yields an empty map.
pub(crate) fn split_query(query: &str) -> IndexMap<String, Vec<String>> {
    let mut pairs: IndexMap<String, Vec<String>> = IndexMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        pairs
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }
    pairs
}

/// Flattens query parameters into command-line-style tokens, preserving order.
pub(crate) fn command_tokens(pairs: &IndexMap<String, Vec<String>>) -> Vec<String> {
    let mut tokens = Vec::new();
    for (key, values) in pairs {
        for value in values {
            if key != BLANK_KEY && !key.is_empty() {
                tokens.push(key.clone());
            }
            if !value.is_empty() {
                tokens.push(value.clone());
            }
        }
    }
    tokens
}

/// `GET /execute` — runs the extraction entry point on tokens built from the
/// query string and returns its output as the response body.
pub async fn execute(
    Extension(state): Extension<AppState>,
    RawQuery(query): RawQuery,
) -> (StatusCode, String) {
    let query = query.unwrap_or_default();
    let started = Instant::now();
    log_started("GET", "/execute", &query);

    let pairs = split_query(&query);
    let tokens = command_tokens(&pairs);
    info!("cmd params: {}", tokens.join(" "));

    let (code, body) = match extract::run_from_tokens(&state.resolver, &tokens).await {
        Ok(output) => (StatusCode::OK, output),
        Err(ExtractError::Args(message)) => {
            let body = format!("ParseError: {message}");
            error!("{body}");
            (StatusCode::BAD_REQUEST, body)
        }
        Err(other) => {
            error!("execute failed: {other}");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {other}"))
        }
    };
    finish(&state, started, code, body)
}

/// `GET /echo` — returns the configured identity string, used to tell which
/// server is listening on a port.
pub async fn echo(
    Extension(state): Extension<AppState>,
    RawQuery(query): RawQuery,
) -> (StatusCode, String) {
    let started = Instant::now();
    log_started("GET", "/echo", query.as_deref().unwrap_or(""));
    let body = state
        .identity
        .clone()
        .unwrap_or_else(|| "None".to_string());
    finish(&state, started, StatusCode::OK, body)
}

fn log_started(method: &str, path: &str, query: &str) {
    let params = if query.is_empty() { "None" } else { query };
    info!("started {method} \"{path}\" params: {params}");
}

fn finish(
    state: &AppState,
    started: Instant,
    code: StatusCode,
    body: String,
) -> (StatusCode, String) {
    if state.debug {
        debug!("response body:\n{body}");
    }
    info!(
        "completed {} in {}ms",
        code.as_u16(),
        started.elapsed().as_millis()
    );
    (code, body)
}
