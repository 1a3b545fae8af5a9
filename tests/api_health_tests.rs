//! HTTP 层集成测试
//!
//! 使用懒连接池构造路由，不需要真实数据库：只覆盖不触库的端点
//! 和提取器层面的拒绝行为

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use itam_system::{middleware::AppState, routes, services};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower::ServiceExt;

mod common;
use common::create_test_config;

/// 构造测试路由；连接池为懒连接，不会真正访问数据库
fn test_router() -> axum::Router {
    let config = create_test_config();
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_lazy(config.database.url.expose_secret())
        .expect("Failed to create lazy pool");

    let state = Arc::new(AppState {
        config: config.clone(),
        db: pool.clone(),
        catalog_service: Arc::new(services::CatalogService::new(pool.clone())),
        asset_service: Arc::new(services::AssetService::new(pool.clone())),
        import_service: Arc::new(services::ImportService::new(pool.clone(), config.import.max_rows)),
        report_service: Arc::new(services::ReportService::new(pool.clone())),
        ticket_service: Arc::new(services::TicketService::new(pool)),
    });

    routes::create_router(state)
}

#[tokio::test]
async fn test_health_endpoint_returns_ok() {
    let router = test_router();

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_responses_carry_trace_headers() {
    let router = test_router();

    let response = router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    // 请求追踪中间件为每个响应注入 trace/request id
    assert!(response.headers().contains_key("x-trace-id"));
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_incoming_trace_id_is_propagated() {
    let router = test_router();

    let response = router
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-trace-id", "trace-abc-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-trace-id").unwrap(),
        "trace-abc-123"
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let router = test_router();

    let response = router
        .oneshot(Request::builder().uri("/api/v1/nonexistent").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_asset_requires_explicit_actor() {
    let router = test_router();

    // 缺少 changed_by 查询参数：提取器直接拒绝，不触库
    let response = router
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/v1/assets/{}", uuid::Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_asset_rejects_malformed_body() {
    let router = test_router();

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/assets")
                .header("content-type", "application/json")
                .body(Body::from("{\"asset_code\": 42}"))
                .unwrap(),
        )
        .await
        .unwrap();

    // Json 提取器在进入服务层之前拒绝残缺的请求体
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
