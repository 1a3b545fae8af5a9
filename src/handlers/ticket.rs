//! 工单管理的 HTTP 处理器

use crate::{error::AppError, middleware::AppState, models::ticket::*};
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
pub struct TicketListQuery {
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub asset_id: Option<Uuid>,
    pub search: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// 列出工单
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TicketListQuery>,
) -> Result<impl IntoResponse, AppError> {
    let filters = TicketListFilters {
        status: query.status,
        priority: query.priority,
        asset_id: query.asset_id,
        search: query.search,
    };

    let (tickets, total) = state
        .ticket_service
        .list(&filters, query.limit, query.offset)
        .await?;

    Ok(Json(json!({
        "tickets": tickets,
        "count": tickets.len(),
        "total": total
    })))
}

/// 创建工单
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = state.ticket_service.create(&req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "工单创建成功",
            "ticket": ticket
        })),
    ))
}

/// 获取工单详情
pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = state.ticket_service.get(id).await?;

    Ok(Json(ticket))
}

/// 更新工单
pub async fn update_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateTicketRequest>,
) -> Result<impl IntoResponse, AppError> {
    let ticket = state.ticket_service.update(id, &req).await?;

    Ok(Json(json!({
        "message": "工单更新成功",
        "ticket": ticket
    })))
}

/// 删除工单
pub async fn delete_ticket(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    state.ticket_service.delete(id).await?;

    Ok(Json(json!({
        "message": "工单删除成功"
    })))
}
