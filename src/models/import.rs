//! Spreadsheet import domain models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Import request: a header row plus data rows, already decoded from the
/// spreadsheet by the caller
#[derive(Debug, Deserialize, Validate)]
pub struct ImportRequest {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 操作人（显式传入，不允许隐式默认）
    #[validate(length(min = 1, max = 128))]
    pub changed_by: String,
}

/// Row-scoped diagnostic. Rows are numbered as in the spreadsheet:
/// the header is row 1, the first data row is row 2.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RowDiagnostic {
    pub row: usize,
    pub message: String,
}

/// Resolved payload of one accepted row
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewAssetRow {
    pub category_id: Uuid,
    pub status_id: Uuid,
    pub asset_code: String,
    pub serial_number: String,
    pub location_region: String,
    pub hostname: Option<String>,
    pub assigned_user: Option<String>,
    pub previous_user: Option<String>,
    pub office: Option<String>,
    pub ip_address: Option<String>,
    pub po_number: Option<String>,
    pub ticket_number: Option<String>,
    pub installed_by: Option<String>,
    /// 自引用外键；导入不填写，仅直接创建时使用
    pub replaced_by: Option<Uuid>,
    pub replacement_date: Option<NaiveDate>,
    pub delivered_at: Option<NaiveDate>,
    pub remark: Option<String>,
}

/// Outcome of evaluating one data row
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// 整行为空，静默跳过，不算错误也不算成功
    Skipped,
    Accepted {
        row: usize,
        payload: Box<NewAssetRow>,
        warnings: Vec<String>,
    },
    Rejected {
        row: usize,
        errors: Vec<String>,
    },
}

/// Outcome of a whole import run
#[derive(Debug, Serialize)]
pub struct ImportOutcome {
    pub accepted: Vec<NewAssetRow>,
    pub errors: Vec<RowDiagnostic>,
    pub warnings: Vec<RowDiagnostic>,
    /// 只有在没有任何行错误时才提交；任何一行出错都会阻止整批提交
    pub committed: bool,
    pub imported: usize,
}
