//! Cookie-based session extractors for Axum handlers.
//!
//! The session token lives in a single cookie (`SESSION_COOKIE_NAME`) and is
//! checked against the BaaS on every request by [`SessionValidator`].
//!
//! [`SessionValidator`]: radio_db::session::SessionValidator

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::SET_COOKIE;
use axum::http::request::Parts;
use axum::http::header::InvalidHeaderValue;
use axum::http::{HeaderMap, HeaderValue};
use axum_extra::extract::cookie::CookieJar;
use radio_core::error::CoreError;
use radio_core::session::SESSION_MAX_AGE_SECS;
use radio_db::models::user::User;
use radio_db::RecordStore;

use crate::config::ServerConfig;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user resolved from the session cookie.
///
/// `client` carries the user's token, so BaaS access rules apply to every
/// read and write made through it.
///
/// ```ignore
/// async fn my_handler(session: SessionUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %session.user.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Clone)]
pub struct SessionUser {
    pub user: User,
    pub client: Arc<dyn RecordStore>,
}

/// Like [`SessionUser`], but a rejected session answers 403 instead of 401.
#[derive(Clone)]
pub struct SubmitterSession(pub SessionUser);

/// Session that may be absent.
///
/// `stale` is set when a cookie was sent but did not validate; the caller
/// should clear it.
#[derive(Clone)]
pub struct OptionalSession {
    pub user: Option<User>,
    pub client: Option<Arc<dyn RecordStore>>,
    pub stale: bool,
}

impl OptionalSession {
    /// The user's store handle, or the anonymous one.
    pub fn store(&self, state: &AppState) -> Arc<dyn RecordStore> {
        self.client.clone().unwrap_or_else(|| Arc::clone(&state.store))
    }
}

fn session_token(parts: &Parts, state: &AppState) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(&state.config.session_cookie_name)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

async fn require_session(
    parts: &Parts,
    state: &AppState,
    rejected: fn(String) -> CoreError,
) -> Result<SessionUser, AppError> {
    let token = session_token(parts, state)
        .ok_or_else(|| CoreError::Unauthorized("Not authenticated".into()))?;

    let check = state.sessions.validate(Some(&token)).await;
    match (check.valid, check.user, check.client) {
        (true, Some(user), Some(client)) => Ok(SessionUser { user, client }),
        _ => Err(rejected("Invalid or expired session".into()).into()),
    }
}

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_session(parts, state, CoreError::Unauthorized).await
    }
}

impl FromRequestParts<AppState> for SubmitterSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_session(parts, state, CoreError::Forbidden)
            .await
            .map(SubmitterSession)
    }
}

impl FromRequestParts<AppState> for OptionalSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(parts, state) else {
            return Ok(OptionalSession {
                user: None,
                client: None,
                stale: false,
            });
        };

        let check = state.sessions.validate(Some(&token)).await;
        if check.valid && check.user.is_some() {
            Ok(OptionalSession {
                user: check.user,
                client: check.client,
                stale: false,
            })
        } else {
            Ok(OptionalSession {
                user: None,
                client: None,
                stale: true,
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Cookies
// ---------------------------------------------------------------------------

fn cookie_header(
    config: &ServerConfig,
    value: &str,
    max_age: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}",
        config.session_cookie_name
    );
    if config.secure_cookies() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// `Set-Cookie` value that stores `token` as the session.
pub fn session_cookie(config: &ServerConfig, token: &str) -> Result<HeaderValue, AppError> {
    cookie_header(config, token, SESSION_MAX_AGE_SECS)
        .map_err(|_| AppError::BadRequest("Session token contains invalid characters".into()))
}

/// `Set-Cookie` value that removes the session.
pub fn clear_session_cookie(config: &ServerConfig) -> HeaderValue {
    cookie_header(config, "", 0)
        .unwrap_or_else(|_| HeaderValue::from_static("token=; Path=/; HttpOnly; Max-Age=0"))
}

/// Headers carrying a session removal, or none when `stale` is false.
pub fn clear_if_stale(config: &ServerConfig, stale: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if stale {
        headers.insert(SET_COOKIE, clear_session_cookie(config));
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secure: bool) -> ServerConfig {
        let mut config = ServerConfig::from_lookup(|_| None);
        config.cookie_secure = secure;
        config
    }

    #[test]
    fn session_cookie_attributes() {
        let value = session_cookie(&config(false), "abc").unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "token=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=604800"
        );
    }

    #[test]
    fn token_with_control_characters_is_rejected() {
        let result = session_cookie(&config(false), "abc\u{1}def");
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn secure_flag_when_configured() {
        let value = clear_session_cookie(&config(true));
        let text = value.to_str().unwrap();
        assert!(text.starts_with("token=; "));
        assert!(text.contains("Max-Age=0"));
        assert!(text.ends_with("; Secure"));
    }

    #[test]
    fn clear_if_stale_only_when_stale() {
        assert!(clear_if_stale(&config(false), false).is_empty());
        assert!(clear_if_stale(&config(false), true).contains_key(SET_COOKIE));
    }
}
