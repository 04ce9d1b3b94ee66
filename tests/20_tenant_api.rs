mod common;

use axum::http::StatusCode;
use tower::ServiceExt;

#[tokio::test]
async fn member_reaches_assigned_shop_by_default() {
    let app = common::spawn_app().await;

    let (status, body) = app.get("/api/tenant", Some(&app.member)).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["tenant"]["id"], "A");
    assert_eq!(body["data"]["principal"]["role"], "TENANT_MEMBER");
    assert_eq!(app.factory.opened(), 1);
}

#[tokio::test]
async fn missing_token_is_unauthorized() {
    let app = common::spawn_app().await;

    let (status, body) = app.get("/api/tenant?tenantId=A", None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
    assert_eq!(app.factory.opened(), 0);
}

#[tokio::test]
async fn subdomain_selects_the_shop() {
    let app = common::spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            axum::http::Request::builder()
                .uri("/api/tenant")
                .header("host", "alpha.shopdesk.io")
                .header("authorization", format!("Bearer {}", common::token_for(&app.member)))
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn path_segment_selects_the_shop() {
    let app = common::spawn_app().await;

    let (status, body) = app.get("/api/tenants/A/info", Some(&app.owner)).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["tenant"]["id"], "A");
}

#[tokio::test]
async fn member_cannot_reach_unassigned_shop() {
    let app = common::spawn_app().await;

    let (status, body) = app.get("/api/tenant?tenantId=B", Some(&app.member)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
    assert_eq!(app.factory.opened(), 0);
}

#[tokio::test]
async fn suspended_shop_is_refused() {
    let app = common::spawn_app().await;

    let (status, _) = app.get("/api/tenant?tenantId=B", Some(&app.owner)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(app.factory.opened(), 0);
}

#[tokio::test]
async fn unknown_shop_is_not_found_for_admin() {
    let app = common::spawn_app().await;

    let (status, _) = app.get("/api/tenant?tenantId=nope", Some(&app.admin)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_without_selector_gets_bad_request() {
    let app = common::spawn_app().await;

    let (status, body) = app.get("/api/tenant", Some(&app.admin)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn repeated_requests_share_one_connection() {
    let app = common::spawn_app().await;

    for _ in 0..3 {
        let (status, _) = app.get("/api/tenant/health", Some(&app.owner)).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(app.factory.opened(), 1);
}
