//! Session cookie helpers.

/// Default name of the session cookie.
pub const DEFAULT_COOKIE_NAME: &str = "token";

/// Session cookies live for seven days.
pub const SESSION_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 7;

/// Path a protected page redirects to when the session is invalid.
pub const LOGIN_PATH: &str = "/login";

/// Pages that stay reachable without a session.
///
/// They still lose an invalid cookie, but are not redirected.
pub fn is_public_path(path: &str) -> bool {
    path == "/" || path.starts_with("/track")
}

/// Extract the value of cookie `name` from a raw `Cookie`-style string
/// (`a=1; token=abc; Path=/`).
pub fn extract_cookie_token(cookie: &str, name: &str) -> Option<String> {
    cookie.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        (key.trim() == name && !value.trim().is_empty()).then(|| value.trim().to_string())
    })
}
