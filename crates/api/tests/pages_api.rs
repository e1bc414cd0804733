//! Integration tests for page data, the session cookie endpoints and
//! `/api/user`.

mod common;

use axum::http::header::{LOCATION, SET_COOKIE};
use axum::http::StatusCode;
use axum::response::Response;
use common::{body_json, get, post_json, seed_track, store_with_users, OTHER_TOKEN, TOKEN, USER_ID};
use radio_api::state::Services;
use serde_json::json;

fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string())
}

// ---------------------------------------------------------------------------
// Test: protected pages redirect to the login page
// ---------------------------------------------------------------------------

#[tokio::test]
async fn profile_without_session_redirects() {
    let store = store_with_users().await;
    let app = common::build_test_app(store, Services::default());

    let response = get(&app, "/api/pages/me", None).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()[LOCATION], "/login");
    assert!(set_cookie(&response).is_none());
}

#[tokio::test]
async fn stale_cookie_is_cleared_on_redirect() {
    let store = store_with_users().await;
    let app = common::build_test_app(store, Services::default());

    let response = get(&app, "/api/pages/me", Some("tok-expired")).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let cookie = set_cookie(&response).expect("stale cookie is cleared");
    assert!(cookie.starts_with("token=;"));
    assert!(cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn public_page_clears_stale_cookie_without_redirect() {
    let store = store_with_users().await;
    seed_track(&store, "trk000000000001", "lofi", None).await;
    let app = common::build_test_app(store, Services::default());

    let response = get(&app, "/api/pages/home", Some("tok-expired")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));
    let json = body_json(response).await;
    assert!(json["user"].is_null());
    assert_eq!(json["tracks"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: page payloads
// ---------------------------------------------------------------------------

#[tokio::test]
async fn layout_includes_liked_tracks() {
    let store = store_with_users().await;
    let track = seed_track(&store, "trk000000000001", "lofi", None).await;
    let app = common::build_test_app(store, Services::default());
    post_json(&app, "/api/music/reaction", Some(TOKEN), json!({ "trackId": track, "reaction": "like" })).await;

    let response = get(&app, "/api/pages/layout", Some(TOKEN)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["id"], USER_ID);
    assert_eq!(json["likedTrackIds"], json!([track]));
    assert_eq!(json["playlists"], json!([]));
}

#[tokio::test]
async fn track_page_shows_owner_and_reaction() {
    let store = store_with_users().await;
    let track = seed_track(&store, "trk000000000001", "lofi", Some(USER_ID)).await;
    let app = common::build_test_app(store, Services::default());
    post_json(&app, "/api/music/reaction", Some(OTHER_TOKEN), json!({ "trackId": track, "reaction": "dislike" })).await;

    let json = body_json(get(&app, &format!("/api/pages/track/{track}"), Some(OTHER_TOKEN)).await).await;

    assert_eq!(json["track"]["id"], track.as_str());
    assert_eq!(json["owner"]["id"], USER_ID);
    assert_eq!(json["userReaction"], "dislike");

    let missing = get(&app, "/api/pages/track/nope00000000000", None).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_lists_own_tracks() {
    let store = store_with_users().await;
    seed_track(&store, "trk000000000001", "lofi", Some(USER_ID)).await;
    seed_track(&store, "trk000000000002", "lofi", None).await;
    let app = common::build_test_app(store, Services::default());

    let response = get(&app, "/api/pages/me", Some(TOKEN)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user"]["id"], USER_ID);
    assert_eq!(json["tracks"].as_array().unwrap().len(), 1);

    let page = body_json(get(&app, "/api/user/tracks?perPage=10", Some(TOKEN)).await).await;
    assert_eq!(page["totalItems"], 1);
    assert_eq!(page["tracks"][0]["id"], "trk000000000001");
}

// ---------------------------------------------------------------------------
// Test: session cookie endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn set_cookie_stores_session_token() {
    let store = store_with_users().await;
    let app = common::build_test_app(store, Services::default());

    let response = post_json(
        &app,
        "/api/auth/set-cookie",
        None,
        json!({ "cookie": "theme=dark; token=abc.def; Path=/" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response).unwrap();
    assert!(cookie.starts_with("token=abc.def;"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Max-Age=604800"));
}

#[tokio::test]
async fn set_cookie_requires_token() {
    let store = store_with_users().await;
    let app = common::build_test_app(store, Services::default());

    let empty = post_json(&app, "/api/auth/set-cookie", None, json!({})).await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(empty).await["error"], "Cookie data required");

    let no_token = post_json(&app, "/api/auth/set-cookie", None, json!({ "cookie": "theme=dark" })).await;
    assert_eq!(no_token.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn set_cookie_rejects_token_unfit_for_header() {
    let store = store_with_users().await;
    let app = common::build_test_app(store, Services::default());

    let response = post_json(
        &app,
        "/api/auth/set-cookie",
        None,
        json!({ "cookie": "token=abc\u{1}def" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(set_cookie(&response).is_none());
}

#[tokio::test]
async fn logout_clears_cookie() {
    let store = store_with_users().await;
    let app = common::build_test_app(store, Services::default());

    let response = post_json(&app, "/api/auth/logout", Some(TOKEN), json!({})).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn user_tracks_require_session() {
    let store = store_with_users().await;
    let app = common::build_test_app(store, Services::default());

    let response = get(&app, "/api/user/tracks", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
