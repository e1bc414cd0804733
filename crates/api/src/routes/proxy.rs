//! Route definitions for the pass-through proxy.

use axum::routing::get;
use axum::Router;

use crate::handlers::proxy;
use crate::state::AppState;

/// Routes mounted at `/proxy`. Answer 404 unless `PROXY_BASE_URL` is set.
///
/// ```text
/// GET|POST|PUT|DELETE /{*path}   -> forward
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/{*path}",
        get(proxy::forward)
            .post(proxy::forward)
            .put(proxy::forward)
            .delete(proxy::forward),
    )
}
