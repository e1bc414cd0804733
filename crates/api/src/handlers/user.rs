//! Handlers for the signed-in user's own data.

use axum::extract::Query;
use axum::response::IntoResponse;
use axum::Json;
use radio_db::repositories::TrackRepo;

use crate::error::AppResult;
use crate::handlers::music::TrackPage;
use crate::middleware::auth::SessionUser;
use crate::query::PageParams;

/// GET /api/user/tracks?page=&perPage=
///
/// Tracks generated by the signed-in user, newest first.
pub async fn tracks(
    session: SessionUser,
    Query(params): Query<PageParams>,
) -> AppResult<impl IntoResponse> {
    let (page, per_page) = params.resolve();
    let list = TrackRepo::list_by_user(session.client.as_ref(), &session.user.id, page, per_page).await?;
    Ok(Json(TrackPage::from_page(list)))
}
