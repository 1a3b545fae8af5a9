//! 批量导入的 HTTP 处理器

use crate::{
    error::AppError,
    middleware::AppState,
    models::import::ImportRequest,
    services::import_service::TEMPLATE_COLUMNS,
};
use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;
use std::sync::Arc;

/// 导入资产行。任何一行出错都不会提交，所有诊断一次性返回。
pub async fn import_assets(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ImportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = state.import_service.import(&req).await?;

    let message = if outcome.committed {
        format!("导入完成，共写入 {} 条资产", outcome.imported)
    } else if !outcome.errors.is_empty() {
        "导入存在错误，未提交任何数据".to_string()
    } else {
        "没有可导入的数据行".to_string()
    };

    Ok(Json(json!({
        "message": message,
        "outcome": outcome
    })))
}

/// 导入模板：表头、可用参照名称与示例行
pub async fn import_template(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, AppError> {
    let catalog = state.catalog_service.load_catalog().await?;
    let categories = catalog.category_names();
    let statuses = catalog.status_names();

    let sample_row = vec![
        "LAP-001".to_string(),
        categories.first().cloned().unwrap_or_else(|| "Laptop".to_string()),
        "SN123456789".to_string(),
        "HOSTNAME-001".to_string(),
        "PO-2026-001".to_string(),
        "Jakarta".to_string(),
        "John Doe".to_string(),
        "IT Department".to_string(),
        statuses.first().cloned().unwrap_or_else(|| "Active".to_string()),
        "Sample remark".to_string(),
        "192.168.1.100".to_string(),
        String::new(),
        "2026-01-15".to_string(),
        "TKT-2026-0001".to_string(),
        "Tech Support".to_string(),
        String::new(),
    ];

    Ok(Json(json!({
        "headers": TEMPLATE_COLUMNS,
        "categories": categories,
        "statuses": statuses,
        "sample_data": [sample_row]
    })))
}
