//! 参照目录（类别与状态）的 HTTP 处理器

use crate::{error::AppError, middleware::AppState, models::catalog::*};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

// ==================== Categories ====================

/// 列出类别
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let categories = state.catalog_service.list_categories().await?;

    Ok(Json(json!({
        "categories": categories,
        "count": categories.len()
    })))
}

/// 创建类别
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateReferenceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let category = state.catalog_service.create_category(&req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "类别创建成功",
            "category": category
        })),
    ))
}

/// 获取类别详情
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let category = state.catalog_service.get_category(id).await?;

    Ok(Json(category))
}

/// 更新类别
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReferenceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let category = state.catalog_service.update_category(id, &req).await?;

    Ok(Json(json!({
        "message": "类别更新成功",
        "category": category
    })))
}

/// 删除类别；仍被资产引用时返回 409
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.catalog_service.delete_category(id).await?;

    Ok(Json(json!({
        "message": "类别删除成功"
    })))
}

// ==================== Statuses ====================

/// 列出状态
pub async fn list_statuses(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let statuses = state.catalog_service.list_statuses().await?;

    Ok(Json(json!({
        "statuses": statuses,
        "count": statuses.len()
    })))
}

/// 创建状态
pub async fn create_status(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateReferenceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status = state.catalog_service.create_status(&req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "状态创建成功",
            "status": status
        })),
    ))
}

/// 获取状态详情
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let status = state.catalog_service.get_status(id).await?;

    Ok(Json(status))
}

/// 更新状态
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReferenceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let status = state.catalog_service.update_status(id, &req).await?;

    Ok(Json(json!({
        "message": "状态更新成功",
        "status": status
    })))
}

/// 删除状态；仍被资产引用时返回 409
pub async fn delete_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.catalog_service.delete_status(id).await?;

    Ok(Json(json!({
        "message": "状态删除成功"
    })))
}
