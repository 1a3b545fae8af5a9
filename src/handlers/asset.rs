//! 资产管理的 HTTP 处理器

use crate::{error::AppError, middleware::AppState, models::asset::*};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AssetListQuery {
    pub category_id: Option<Uuid>,
    pub status_id: Option<Uuid>,
    pub location: Option<String>,
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// 删除操作的操作人必须显式传入
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub changed_by: String,
}

/// 列出资产
pub async fn list_assets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AssetListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filters = AssetListFilters {
        category_id: query.category_id,
        status_id: query.status_id,
        location: query.location,
        search: query.search,
    };

    let (assets, total) = state
        .asset_service
        .list(&filters, query.limit, query.offset)
        .await?;

    Ok(Json(json!({
        "assets": assets,
        "count": assets.len(),
        "total": total
    })))
}

/// 创建资产
pub async fn create_asset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAssetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let asset = state.asset_service.create(&req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "资产创建成功",
            "asset": asset
        })),
    ))
}

/// 获取资产详情
pub async fn get_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let asset = state.asset_service.get(id).await?;

    Ok(Json(asset))
}

/// 更新资产
pub async fn update_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateAssetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let asset = state.asset_service.update(id, &req).await?;

    Ok(Json(json!({
        "message": "资产更新成功",
        "asset": asset
    })))
}

/// 删除资产
pub async fn delete_asset(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
) -> Result<impl IntoResponse, AppError> {
    state.asset_service.delete(id, &query.changed_by).await?;

    Ok(Json(json!({
        "message": "资产删除成功"
    })))
}

/// 查询资产变更历史（最新在前）
pub async fn get_asset_history(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let history = state.asset_service.history(id).await?;

    Ok(Json(json!({
        "history": history,
        "count": history.len()
    })))
}
