//! 批量导入服务
//! 表头门禁 → 逐行独立求值 → 划分结果 → 无错误才整批提交
//!
//! 每行求值是纯函数，行与行之间没有共享可变状态；任何一行出错都会
//! 阻止整批提交，所有诊断一次性返回给调用方修正。

use crate::{
    error::AppError,
    models::{
        catalog::ReferenceCatalog,
        history::ChangeKind,
        import::*,
    },
    repository::asset_repo::AssetRepository,
    services::{catalog_service::CatalogService, history_service::{self, HistoryService}},
};
use once_cell::sync::Lazy;
use regex::Regex;
use sqlx::PgPool;
use std::collections::HashSet;
use validator::Validate;

/// 必填列；缺任何一列整个导入直接失败
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "Asset Code",
    "Asset Type",
    "Serial Number",
    "Location/Region",
    "Status",
];

/// 导入模板的完整表头
pub const TEMPLATE_COLUMNS: [&str; 16] = [
    "Asset Code",
    "Asset Type",
    "Serial Number",
    "Hostname",
    "PO Number",
    "Location/Region",
    "Current User",
    "Current Office",
    "Status",
    "Remark",
    "IP Address",
    "Previous User",
    "Date Delivered",
    "Ticket Number",
    "Installed By",
    "Replacement Date",
];

static IPV4_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)$")
        .expect("invalid IPv4 regex")
});

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("invalid date regex"));

/// 表头中缺失的必填列
pub fn missing_columns(header: &[String]) -> Vec<&'static str> {
    let present: HashSet<&str> = header.iter().map(|h| h.trim()).collect();
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !present.contains(col))
        .collect()
}

/// 对一行数据求值。纯函数：只依赖表头、单元格和参照快照。
pub fn evaluate_row(
    header: &[String],
    row: &[String],
    row_number: usize,
    catalog: &ReferenceCatalog,
) -> RowOutcome {
    // 整行为空：静默跳过
    if row.iter().all(|cell| cell.trim().is_empty()) {
        return RowOutcome::Skipped;
    }

    let cell = |name: &str| cell_value(header, row, name);

    let mut errors: Vec<String> = Vec::new();
    let mut warnings: Vec<String> = Vec::new();

    // 参照解析：非空但解析失败是行级错误，不是警告
    let category_cell = cell("Asset Type");
    let category_id = match category_cell {
        Some(value) => match catalog.resolve_category(value) {
            Some(entry) => Some(entry.id),
            None => {
                errors.push(format!("invalid asset type \"{}\"", value));
                None
            }
        },
        None => None,
    };

    let status_cell = cell("Status");
    let status_id = match status_cell {
        Some(value) => match catalog.resolve_status(value) {
            Some(entry) => Some(entry.id),
            None => {
                errors.push(format!("invalid status \"{}\"", value));
                None
            }
        },
        None => None,
    };

    // 必填字段：遇到第一个缺失就停止处理这一行
    let asset_code = cell("Asset Code");
    if asset_code.is_none() {
        errors.push("Asset Code is required".to_string());
        return RowOutcome::Rejected { row: row_number, errors };
    }
    let serial_number = cell("Serial Number");
    if serial_number.is_none() {
        errors.push("Serial Number is required".to_string());
        return RowOutcome::Rejected { row: row_number, errors };
    }
    let location_region = cell("Location/Region");
    if location_region.is_none() {
        errors.push("Location/Region is required".to_string());
        return RowOutcome::Rejected { row: row_number, errors };
    }
    if category_cell.is_none() {
        errors.push("Asset Type is required".to_string());
        return RowOutcome::Rejected { row: row_number, errors };
    }
    if status_cell.is_none() {
        errors.push("Status is required".to_string());
        return RowOutcome::Rejected { row: row_number, errors };
    }

    // 参照解析失败的行到这里仍带着错误
    let (
        Some(category_id),
        Some(status_id),
        Some(asset_code),
        Some(serial_number),
        Some(location_region),
    ) = (category_id, status_id, asset_code, serial_number, location_region)
    else {
        return RowOutcome::Rejected { row: row_number, errors };
    };

    // 可选字段的格式检查：不合格是警告，字段被丢弃
    let ip_address = match cell("IP Address") {
        Some(value) if IPV4_RE.is_match(value) => Some(value.to_string()),
        Some(value) => {
            warnings.push(format!("invalid IP address format \"{}\"", value));
            None
        }
        None => None,
    };

    let delivered_at = parse_date_cell(cell("Date Delivered"), "Date Delivered", &mut warnings);
    let replacement_date =
        parse_date_cell(cell("Replacement Date"), "Replacement Date", &mut warnings);

    let owned = |name: &str| cell(name).map(|v| v.to_string());

    let payload = NewAssetRow {
        category_id,
        status_id,
        asset_code: asset_code.to_string(),
        serial_number: serial_number.to_string(),
        location_region: location_region.to_string(),
        hostname: owned("Hostname"),
        assigned_user: owned("Current User"),
        previous_user: owned("Previous User"),
        office: owned("Current Office"),
        ip_address,
        po_number: owned("PO Number"),
        ticket_number: owned("Ticket Number"),
        installed_by: owned("Installed By"),
        replaced_by: None,
        replacement_date,
        delivered_at,
        remark: owned("Remark"),
    };

    RowOutcome::Accepted {
        row: row_number,
        payload: Box::new(payload),
        warnings,
    }
}

/// 对全部数据行求值。第一数据行编号为 2（表头占第 1 行）。
pub fn evaluate_rows(
    header: &[String],
    rows: &[Vec<String>],
    catalog: &ReferenceCatalog,
) -> Vec<RowOutcome> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| evaluate_row(header, row, index + 2, catalog))
        .collect()
}

/// 把逐行结果划分为导入结果（未提交状态）
pub fn partition(outcomes: Vec<RowOutcome>) -> ImportOutcome {
    let mut accepted = Vec::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for outcome in outcomes {
        match outcome {
            RowOutcome::Skipped => {}
            RowOutcome::Accepted { row, payload, warnings: row_warnings } => {
                for message in row_warnings {
                    warnings.push(RowDiagnostic { row, message });
                }
                accepted.push(*payload);
            }
            RowOutcome::Rejected { row, errors: row_errors } => {
                for message in row_errors {
                    errors.push(RowDiagnostic { row, message });
                }
            }
        }
    }

    ImportOutcome {
        accepted,
        errors,
        warnings,
        committed: false,
        imported: 0,
    }
}

/// 按列名取出单元格内容；空白单元格视为缺失
fn cell_value<'a>(header: &[String], row: &'a [String], name: &str) -> Option<&'a str> {
    header
        .iter()
        .position(|h| h.trim() == name)
        .and_then(|i| row.get(i))
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn parse_date_cell(
    value: Option<&str>,
    column: &str,
    warnings: &mut Vec<String>,
) -> Option<chrono::NaiveDate> {
    let value = value?;
    if DATE_RE.is_match(value) {
        if let Ok(date) = chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            return Some(date);
        }
    }
    warnings.push(format!(
        "invalid date format for \"{}\", expected YYYY-MM-DD",
        column
    ));
    None
}

pub struct ImportService {
    db: PgPool,
    max_rows: usize,
}

impl ImportService {
    pub fn new(db: PgPool, max_rows: usize) -> Self {
        Self { db, max_rows }
    }

    /// 执行一次导入
    pub async fn import(&self, req: &ImportRequest) -> Result<ImportOutcome, AppError> {
        req.validate()?;

        if req.rows.len() > self.max_rows {
            return Err(AppError::BadRequest(format!(
                "import exceeds the maximum of {} rows",
                self.max_rows
            )));
        }

        // 表头门禁：缺必填列直接短路，不做任何行处理
        let missing = missing_columns(&req.header);
        if !missing.is_empty() {
            return Ok(ImportOutcome {
                accepted: Vec::new(),
                errors: vec![RowDiagnostic {
                    row: 1,
                    message: format!("Missing required columns: {}", missing.join(", ")),
                }],
                warnings: Vec::new(),
                committed: false,
                imported: 0,
            });
        }

        let catalog = CatalogService::new(self.db.clone()).load_catalog().await?;

        let mut outcomes = evaluate_rows(&req.header, &req.rows, &catalog);

        // 接收时的唯一性检查：对已持久化的数据和本批次内部都生效
        self.check_uniqueness(&mut outcomes).await?;

        let mut outcome = partition(outcomes);

        // 任何一行出错都阻止提交；没有错误时整批在一个事务里落库
        if outcome.errors.is_empty() && !outcome.accepted.is_empty() {
            outcome.imported = self.commit(&outcome.accepted, &req.changed_by).await?;
            outcome.committed = true;
        }

        tracing::info!(
            accepted = outcome.accepted.len(),
            errors = outcome.errors.len(),
            warnings = outcome.warnings.len(),
            committed = outcome.committed,
            "Import evaluated"
        );

        Ok(outcome)
    }

    /// 把重复编码/序列号的已接受行降级为错误行
    async fn check_uniqueness(&self, outcomes: &mut [RowOutcome]) -> Result<(), AppError> {
        let repo = AssetRepository::new(self.db.clone());
        let mut seen_codes: HashSet<String> = HashSet::new();
        let mut seen_serials: HashSet<String> = HashSet::new();

        for outcome in outcomes.iter_mut() {
            let (row, asset_code, serial_number) = match outcome {
                RowOutcome::Accepted { row, payload, .. } => {
                    (*row, payload.asset_code.clone(), payload.serial_number.clone())
                }
                _ => continue,
            };

            let mut errors = Vec::new();

            if !seen_codes.insert(asset_code.clone()) {
                errors.push(format!(
                    "asset code \"{}\" appears more than once in this batch",
                    asset_code
                ));
            } else if repo.code_in_use(&asset_code, None).await? {
                errors.push(format!("asset code \"{}\" already exists", asset_code));
            }

            if !seen_serials.insert(serial_number.clone()) {
                errors.push(format!(
                    "serial number \"{}\" appears more than once in this batch",
                    serial_number
                ));
            } else if repo.serial_in_use(&serial_number, None).await? {
                errors.push(format!("serial number \"{}\" already exists", serial_number));
            }

            if !errors.is_empty() {
                *outcome = RowOutcome::Rejected { row, errors };
            }
        }

        Ok(())
    }

    /// 整批插入，连同每个资产的 "created" 历史记录，单事务提交
    async fn commit(&self, accepted: &[NewAssetRow], changed_by: &str) -> Result<usize, AppError> {
        let asset_repo = AssetRepository::new(self.db.clone());
        let history = HistoryService::new(self.db.clone());

        let mut tx = self.db.begin().await?;

        for payload in accepted {
            let asset = asset_repo.insert(&mut tx, payload).await?;
            let mut records = history_service::build_records(
                asset.id,
                ChangeKind::Created,
                &[],
                changed_by,
                chrono::Utc::now(),
            );
            for record in &mut records {
                record.note = Some("Asset imported from spreadsheet".to_string());
            }
            history.append(&mut tx, &records).await?;
        }

        tx.commit().await?;
        Ok(accepted.len())
    }
}
