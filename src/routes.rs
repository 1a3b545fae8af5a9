//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer,
};

use crate::{handlers, middleware::AppState};

/// 请求体大小上限（导入批次也要受此约束）
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 业务端点
    let api_routes = Router::new()
        // 资产
        .route(
            "/api/v1/assets",
            get(handlers::asset::list_assets).post(handlers::asset::create_asset),
        )
        .route(
            "/api/v1/assets/import",
            axum::routing::post(handlers::import::import_assets),
        )
        .route(
            "/api/v1/assets/import/template",
            get(handlers::import::import_template),
        )
        .route(
            "/api/v1/assets/export/csv",
            get(handlers::report::export_assets_csv),
        )
        .route(
            "/api/v1/assets/{id}",
            get(handlers::asset::get_asset)
                .put(handlers::asset::update_asset)
                .delete(handlers::asset::delete_asset),
        )
        .route(
            "/api/v1/assets/{id}/history",
            get(handlers::asset::get_asset_history),
        )

        // 参照目录
        .route(
            "/api/v1/categories",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route(
            "/api/v1/categories/{id}",
            get(handlers::catalog::get_category)
                .put(handlers::catalog::update_category)
                .delete(handlers::catalog::delete_category),
        )
        .route(
            "/api/v1/statuses",
            get(handlers::catalog::list_statuses).post(handlers::catalog::create_status),
        )
        .route(
            "/api/v1/statuses/{id}",
            get(handlers::catalog::get_status)
                .put(handlers::catalog::update_status)
                .delete(handlers::catalog::delete_status),
        )

        // 工单
        .route(
            "/api/v1/tickets",
            get(handlers::ticket::list_tickets).post(handlers::ticket::create_ticket),
        )
        .route(
            "/api/v1/tickets/{id}",
            get(handlers::ticket::get_ticket)
                .put(handlers::ticket::update_ticket)
                .delete(handlers::ticket::delete_ticket),
        )

        // 报表
        .route("/api/v1/reports/assets", get(handlers::report::asset_report))
        .route("/api/v1/reports/tickets", get(handlers::report::ticket_report));

    // 指标端点
    let metrics_routes = Router::new().route("/metrics", get(handlers::metrics::metrics_export));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(metrics_routes)
        .layer(axum::middleware::from_fn(
            crate::middleware::request_tracking_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
