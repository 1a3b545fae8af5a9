//! Reporting domain models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Joined asset row used by the report aggregator and the export listing.
/// Reference names are optional so an unresolved key can render as "Unknown".
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AssetSnapshot {
    pub id: Uuid,
    pub asset_code: String,
    pub serial_number: String,
    pub category_name: Option<String>,
    pub status_name: Option<String>,
    pub location_region: Option<String>,
    pub hostname: Option<String>,
    pub assigned_user: Option<String>,
    pub previous_user: Option<String>,
    pub office: Option<String>,
    pub ip_address: Option<String>,
    pub po_number: Option<String>,
    pub ticket_number: Option<String>,
    pub installed_by: Option<String>,
    pub replaced_by: Option<Uuid>,
    pub replacement_date: Option<NaiveDate>,
    pub delivered_at: Option<NaiveDate>,
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Report filters (all optional)
#[derive(Debug, Default, Deserialize)]
pub struct ReportFilters {
    pub category_id: Option<Uuid>,
    pub status_id: Option<Uuid>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

/// One group-by bucket
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GroupCount {
    pub name: String,
    pub count: usize,
}

/// Per-category utilization
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UtilizationEntry {
    pub category: String,
    pub total: usize,
    pub active: usize,
    /// round(100 * active / total)，total 为 0 时恒为 0
    pub rate: u32,
}

/// Asset shown in an alert list
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AlertEntry {
    pub asset_code: String,
    pub category: String,
    pub status: String,
    pub location: String,
    pub assigned_user: Option<String>,
    pub remark: Option<String>,
}

/// Alert lists
#[derive(Debug, Clone, Serialize)]
pub struct ReportAlerts {
    /// 状态为 Broken / Repair 的资产
    pub maintenance: Vec<AlertEntry>,
    /// 状态为 Disposed，或备注含 "old"/"replace" 的资产。
    /// 备注启发式沿用原有规则，待产品方确认。
    pub replacement: Vec<AlertEntry>,
}

/// Maintenance schedule entry for an active asset
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MaintenanceEntry {
    pub asset_code: String,
    pub category: String,
    pub location: String,
    pub assigned_user: Option<String>,
    pub last_maintenance: Option<NaiveDate>,
    pub next_maintenance: Option<NaiveDate>,
}

/// Headline counts
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReportSummary {
    pub total: usize,
    pub active: usize,
    pub spare: usize,
    pub broken: usize,
    pub repair: usize,
}

/// Full asset report
#[derive(Debug, Serialize)]
pub struct AssetReport {
    pub summary: ReportSummary,
    pub by_category: Vec<GroupCount>,
    pub by_status: Vec<GroupCount>,
    pub by_location: Vec<GroupCount>,
    pub utilization: Vec<UtilizationEntry>,
    pub alerts: ReportAlerts,
    pub maintenance_schedule: Vec<MaintenanceEntry>,
}

/// Ticket report
#[derive(Debug, Serialize)]
pub struct TicketReport {
    pub total: usize,
    pub by_status: Vec<GroupCount>,
    pub by_priority: Vec<GroupCount>,
    /// 已过期且未解决/未关闭的工单数
    pub overdue: usize,
    pub average_resolution_hours: Option<f64>,
}
