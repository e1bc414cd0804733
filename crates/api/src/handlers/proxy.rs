//! Pass-through proxy to an external API.
//!
//! Only `authorization` and `content-type` are forwarded. JSON responses are
//! re-serialized; anything else is returned as text with the same status.

use axum::body::Bytes;
use axum::extract::{Path, RawQuery, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use radio_core::error::CoreError;
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::state::AppState;

const FORWARDED_HEADERS: [axum::http::HeaderName; 2] = [AUTHORIZATION, CONTENT_TYPE];

/// GET|POST|PUT|DELETE /api/proxy/{*path}
pub async fn forward(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<Response> {
    let base = state.config.proxy_base_url.as_deref().ok_or_else(|| CoreError::NotFound {
        entity: "Route",
        id: format!("/api/proxy/{path}"),
    })?;

    let mut url = format!("{base}/{}", path.trim_start_matches('/'));
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        url.push('?');
        url.push_str(&query);
    }

    let mut request = state.http.request(method.clone(), &url);
    for name in &FORWARDED_HEADERS {
        if let Some(value) = headers.get(name) {
            request = request.header(name, value);
        }
    }
    if method != Method::GET && method != Method::DELETE {
        request = request.body(body);
    }

    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(url = %url, error = %e, "Proxy request failed");
            return Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to fetch from external API" })),
            )
                .into_response());
        }
    };

    let status = response.status();
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.contains("application/json"));

    let text = response.text().await.unwrap_or_else(|e| {
        tracing::warn!(url = %url, error = %e, "Proxy response body unreadable");
        String::new()
    });
    tracing::debug!(method = %method, url = %url, status = status.as_u16(), "Proxied request");

    if is_json {
        if let Ok(value) = serde_json::from_str::<Value>(&text) {
            return Ok((status, Json(value)).into_response());
        }
    }
    Ok((status, text).into_response())
}
