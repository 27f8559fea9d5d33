use super::*;
use crate::state::test_helpers::{cookie_for, get, identity_of, json_request, send, test_app_state};

// =============================================================================
// response_cookie
// =============================================================================

#[test]
fn response_cookie_for_identity_lasts_a_day() {
    let identity = identity_of(&cookie_for("ayu.wulandari@kinetic.co.id"));
    let cookie = response_cookie(&SessionCookie::for_identity(&identity).unwrap(), false);
    assert_eq!(cookie.name(), SESSION_KEY);
    assert_eq!(cookie.path(), Some("/"));
    assert_eq!(cookie.max_age(), Some(Duration::hours(24)));
    assert_eq!(cookie.http_only(), None);
    assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    assert_eq!(Identity::from_persisted(cookie.value()).unwrap(), identity);
}

#[test]
fn response_cookie_expired_is_zeroed() {
    let cookie = response_cookie(&SessionCookie::expired(), true);
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
    assert_eq!(cookie.secure(), Some(true));
}

// =============================================================================
// POST /api/auth/login
// =============================================================================

#[tokio::test]
async fn login_known_account_sets_cookie() {
    let body = serde_json::json!({ "email": "dr.budi.santoso@kinetic.co.id", "password": "anything" });
    let res = send(test_app_state(), json_request("POST", "/api/auth/login", None, &body)).await;

    assert_eq!(res.status, StatusCode::OK);
    let json = res.json();
    assert_eq!(json["user"]["id"], "2");
    assert_eq!(json["user"]["role"], "provider");
    assert_eq!(json["redirect"], "/dashboard/provider");

    let cookies = res.set_cookies();
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("kineticUser="));
    assert!(cookies[0].contains("Max-Age=86400"));
}

#[tokio::test]
async fn login_unknown_email_synthesizes_identity() {
    let body = serde_json::json!({ "email": "siti.rahma@example.com", "password": "pw", "portal": "provider" });
    let res = send(test_app_state(), json_request("POST", "/api/auth/login", None, &body)).await;

    assert_eq!(res.status, StatusCode::OK);
    let json = res.json();
    assert_eq!(json["user"]["name"], "Siti Rahma");
    assert_eq!(json["user"]["role"], "provider");
    assert_eq!(json["redirect"], "/dashboard/provider");
}

#[tokio::test]
async fn login_empty_password_for_unknown_email_is_rejected() {
    let body = serde_json::json!({ "email": "nobody@example.com", "password": "" });
    let res = send(test_app_state(), json_request("POST", "/api/auth/login", None, &body)).await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"], "Please enter valid credentials");
    assert!(res.set_cookies().is_empty());
}

#[tokio::test]
async fn login_missing_fields_is_rejected() {
    let res = send(
        test_app_state(),
        json_request("POST", "/api/auth/login", None, &serde_json::json!({})),
    )
    .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

// =============================================================================
// POST /api/auth/logout
// =============================================================================

#[tokio::test]
async fn logout_expires_cookie() {
    let cookie = cookie_for("ayu.wulandari@kinetic.co.id");
    let res = send(
        test_app_state(),
        json_request("POST", "/api/auth/logout", Some(&cookie), &serde_json::json!({})),
    )
    .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["redirect"], "/login");
    let cookies = res.set_cookies();
    assert_eq!(cookies.len(), 1);
    assert!(cookies[0].starts_with("kineticUser=;"));
    assert!(cookies[0].contains("Max-Age=0"));
}

#[tokio::test]
async fn logout_releases_pose_studio() {
    let state = test_app_state();
    let patient = cookie_for("ayu.wulandari@kinetic.co.id");
    let provider = cookie_for("dr.budi.santoso@kinetic.co.id");
    for cookie in [&patient, &provider] {
        let res = send(state.clone(), get("/api/pose/studio", Some(cookie))).await;
        assert_eq!(res.status, StatusCode::OK);
    }
    assert_eq!(state.studios.read().await.len(), 2);

    let res = send(
        state.clone(),
        json_request("POST", "/api/auth/logout", Some(&patient), &serde_json::json!({})),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);

    let studios = state.studios.read().await;
    assert_eq!(studios.len(), 1);
    assert!(!studios.contains("1"));
}

#[tokio::test]
async fn logout_without_cookie_keeps_studios() {
    let state = test_app_state();
    send(state.clone(), get("/api/pose/studio", Some(&cookie_for("ayu.wulandari@kinetic.co.id")))).await;

    let res = send(
        state.clone(),
        json_request("POST", "/api/auth/logout", None, &serde_json::json!({})),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(state.studios.read().await.len(), 1);
}

// =============================================================================
// GET /api/auth/me
// =============================================================================

#[tokio::test]
async fn me_without_cookie_is_unauthorized() {
    let res = send(test_app_state(), get("/api/auth/me", None)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_with_corrupt_cookie_is_unauthorized() {
    let res = send(test_app_state(), get("/api/auth/me", Some("not-json"))).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_cookie_identity() {
    let cookie = cookie_for("agus.pratama@kinetic.co.id");
    let res = send(test_app_state(), get("/api/auth/me", Some(&cookie))).await;

    assert_eq!(res.status, StatusCode::OK);
    let json = res.json();
    assert_eq!(json["id"], "4");
    assert_eq!(json["name"], "Agus Pratama");
    assert_eq!(json["avatar"], "/athletic-man-short-hair.png");
}
