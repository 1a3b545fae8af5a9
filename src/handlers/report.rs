//! 报表与导出的 HTTP 处理器

use crate::{error::AppError, middleware::AppState, models::report::ReportFilters};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

/// 资产报表：分组计数、利用率、告警与维护排期
pub async fn asset_report(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<ReportFilters>,
) -> Result<impl IntoResponse, AppError> {
    let report = state.report_service.asset_report(&filters).await?;

    Ok(Json(report))
}

/// 工单报表
pub async fn ticket_report(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let report = state.report_service.ticket_report().await?;

    Ok(Json(report))
}

/// 资产清单导出为 CSV。
/// 核心只产出表头和显示值行，编码交给 csv 库。
pub async fn export_assets_csv(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<ReportFilters>,
) -> Result<impl IntoResponse, AppError> {
    let (headers, rows) = state.report_service.export_listing(&filters).await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&headers)
        .map_err(|e| AppError::internal_error(&format!("CSV encoding failed: {}", e)))?;
    for row in &rows {
        writer
            .write_record(row)
            .map_err(|e| AppError::internal_error(&format!("CSV encoding failed: {}", e)))?;
    }

    let body = writer
        .into_inner()
        .map_err(|e| AppError::internal_error(&format!("CSV encoding failed: {}", e)))?;

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"assets_export.csv\"",
            ),
        ],
        body,
    ))
}
