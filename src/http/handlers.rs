//! HTTP handlers for the gateway.
//!
//! The gating handler sits in front of the real XML-RPC endpoint: permitted
//! requests are forwarded upstream and the upstream response is relayed
//! back; denied requests get a structured error or a loopback redirect.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::gate::{Decision, DenyReason};
use crate::ident;
use crate::status::{permission_status, PermissionStatus};
use crate::token;

use super::server::AppState;

/// Address invalid-token callers are redirected to when the redirect policy
/// is enabled.
const INVALID_TOKEN_REDIRECT: &str = "http://127.0.0.1";

/// Content type assumed when the caller or upstream does not send one.
const DEFAULT_CONTENT_TYPE: &str = "text/xml";

/// Query parameters of the gating endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    /// The presented shared-secret token.
    #[serde(default)]
    pub token: String,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

/// Freshly generated token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Gating endpoint: evaluate admission, then forward or reject.
pub async fn xmlrpc(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let forwarded_for = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok());
    let ip = ident::client_ip(forwarded_for, Some(addr.ip()));
    let now = Utc::now().timestamp();

    debug!(ip = %ip, "Processing XML-RPC request");

    match state
        .gate
        .evaluate(&ip, &query.token, &state.config.protection, now)
        .await
    {
        Decision::Allow => {
            let content_type = headers
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or(DEFAULT_CONTENT_TYPE)
                .to_string();
            forward(&state, &content_type, body).await
        }
        Decision::Deny(reason) => {
            deny_response(reason, state.config.protection.redirect_on_invalid_token)
        }
    }
}

/// Map a deny decision to its HTTP response.
fn deny_response(reason: DenyReason, redirect_on_invalid_token: bool) -> Response {
    if reason == DenyReason::InvalidToken && redirect_on_invalid_token {
        return Redirect::temporary(INVALID_TOKEN_REDIRECT).into_response();
    }

    let status = match reason {
        DenyReason::InvalidToken | DenyReason::NotWhitelisted => StatusCode::FORBIDDEN,
        DenyReason::RateLimited => StatusCode::TOO_MANY_REQUESTS,
    };

    (
        status,
        Json(ErrorResponse {
            error: reason.message().to_string(),
            code: reason.code(),
        }),
    )
        .into_response()
}

/// Forward a permitted request to the real XML-RPC handler and relay the
/// response.
async fn forward(state: &AppState, content_type: &str, body: Bytes) -> Response {
    let result = state
        .client
        .post(&state.config.server.upstream_url)
        .header(reqwest::header::CONTENT_TYPE, content_type)
        .body(body.to_vec())
        .send()
        .await;

    let upstream = match result {
        Ok(upstream) => upstream,
        Err(e) => {
            error!(upstream = %state.config.server.upstream_url, error = %e, "Upstream request failed");
            return upstream_error();
        }
    };

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    match upstream.bytes().await {
        Ok(bytes) => (status, [(header::CONTENT_TYPE, content_type)], bytes).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to read upstream response");
            upstream_error()
        }
    }
}

fn upstream_error() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: "Upstream XML-RPC handler unavailable".to_string(),
            code: "UPSTREAM_UNAVAILABLE",
        }),
    )
        .into_response()
}

/// Administrative status panel.
pub async fn status(State(state): State<Arc<AppState>>) -> Json<PermissionStatus> {
    let now = Utc::now().timestamp();
    Json(permission_status(&state.config, &state.store, now).await)
}

/// Generate a fresh token for the operator to configure. Does not mutate
/// the running configuration.
pub async fn generate_token() -> Json<TokenResponse> {
    Json(TokenResponse {
        token: token::generate(token::DEFAULT_LENGTH),
    })
}

/// Liveness endpoint.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "xmlrpc-warden",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_token_without_redirect_is_forbidden() {
        let response = deny_response(DenyReason::InvalidToken, false);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_invalid_token_with_redirect_points_to_loopback() {
        let response = deny_response(DenyReason::InvalidToken, true);
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            INVALID_TOKEN_REDIRECT
        );
    }

    #[test]
    fn test_redirect_flag_only_affects_token_denials() {
        let response = deny_response(DenyReason::NotWhitelisted, true);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let response = deny_response(DenyReason::RateLimited, true);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_rate_limited_is_too_many_requests() {
        let response = deny_response(DenyReason::RateLimited, false);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }
}
