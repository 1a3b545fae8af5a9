//! 报表服务
//! 聚合函数是输入的纯函数：不修改输入，可重复、可并发调用

use crate::{
    error::AppError,
    models::{report::*, ticket::*},
    repository::{asset_repo::AssetRepository, ticket_repo::TicketRepository},
};
use chrono::{DateTime, Months, Utc};
use sqlx::PgPool;
use std::collections::BTreeMap;

const UNKNOWN_GROUP: &str = "Unknown";

/// 空/未解析的分组键统一渲染为 "Unknown"
fn group_key(value: &Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.clone(),
        _ => UNKNOWN_GROUP.to_string(),
    }
}

fn status_is(snapshot: &AssetSnapshot, name: &str) -> bool {
    snapshot
        .status_name
        .as_deref()
        .map(|s| s.eq_ignore_ascii_case(name))
        .unwrap_or(false)
}

fn group_counts(map: BTreeMap<String, usize>) -> Vec<GroupCount> {
    let mut counts: Vec<GroupCount> = map
        .into_iter()
        .map(|(name, count)| GroupCount { name, count })
        .collect();
    // 数量降序、名称升序，保证输出确定性
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    counts
}

fn alert_entry(snapshot: &AssetSnapshot) -> AlertEntry {
    AlertEntry {
        asset_code: snapshot.asset_code.clone(),
        category: group_key(&snapshot.category_name),
        status: group_key(&snapshot.status_name),
        location: group_key(&snapshot.location_region),
        assigned_user: snapshot.assigned_user.clone(),
        remark: snapshot.remark.clone(),
    }
}

/// 资产报表聚合。纯函数。
pub fn aggregate_assets(assets: &[AssetSnapshot]) -> AssetReport {
    let mut by_category: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_location: BTreeMap<String, usize> = BTreeMap::new();

    for asset in assets {
        *by_category.entry(group_key(&asset.category_name)).or_insert(0) += 1;
        *by_status.entry(group_key(&asset.status_name)).or_insert(0) += 1;
        *by_location.entry(group_key(&asset.location_region)).or_insert(0) += 1;
    }

    // 每个类别的利用率；total 为 0 时 rate 恒为 0
    let utilization: Vec<UtilizationEntry> = by_category
        .iter()
        .map(|(category, &total)| {
            let active = assets
                .iter()
                .filter(|a| group_key(&a.category_name) == *category && status_is(a, "Active"))
                .count();
            let rate = if total > 0 {
                ((100.0 * active as f64) / total as f64).round() as u32
            } else {
                0
            };
            UtilizationEntry {
                category: category.clone(),
                total,
                active,
                rate,
            }
        })
        .collect();

    let maintenance: Vec<AlertEntry> = assets
        .iter()
        .filter(|a| status_is(a, "Broken") || status_is(a, "Repair"))
        .map(alert_entry)
        .collect();

    // 更换建议沿用原有的占位规则：Disposed 状态，或备注含 old/replace
    let replacement: Vec<AlertEntry> = assets
        .iter()
        .filter(|a| {
            status_is(a, "Disposed")
                || a.remark
                    .as_deref()
                    .map(|r| {
                        let r = r.to_lowercase();
                        r.contains("old") || r.contains("replace")
                    })
                    .unwrap_or(false)
        })
        .map(alert_entry)
        .collect();

    // Active 资产按最近交付日期排期，下次维护 = 交付 + 6 个月
    let maintenance_schedule: Vec<MaintenanceEntry> = assets
        .iter()
        .filter(|a| status_is(a, "Active"))
        .map(|a| MaintenanceEntry {
            asset_code: a.asset_code.clone(),
            category: group_key(&a.category_name),
            location: group_key(&a.location_region),
            assigned_user: a.assigned_user.clone(),
            last_maintenance: a.delivered_at,
            next_maintenance: a
                .delivered_at
                .and_then(|d| d.checked_add_months(Months::new(6))),
        })
        .collect();

    let summary = ReportSummary {
        total: assets.len(),
        active: assets.iter().filter(|a| status_is(a, "Active")).count(),
        spare: assets.iter().filter(|a| status_is(a, "Spare")).count(),
        broken: assets.iter().filter(|a| status_is(a, "Broken")).count(),
        repair: assets.iter().filter(|a| status_is(a, "Repair")).count(),
    };

    AssetReport {
        summary,
        by_category: group_counts(by_category),
        by_status: group_counts(by_status),
        by_location: group_counts(by_location),
        utilization,
        alerts: ReportAlerts {
            maintenance,
            replacement,
        },
        maintenance_schedule,
    }
}

/// 工单报表聚合。纯函数。
pub fn aggregate_tickets(tickets: &[Ticket], now: DateTime<Utc>) -> TicketReport {
    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_priority: BTreeMap<String, usize> = BTreeMap::new();

    for ticket in tickets {
        *by_status.entry(ticket.status.to_string()).or_insert(0) += 1;
        *by_priority.entry(ticket.priority.to_string()).or_insert(0) += 1;
    }

    let today = now.date_naive();
    let overdue = tickets
        .iter()
        .filter(|t| {
            t.due_date.map(|d| d < today).unwrap_or(false)
                && !matches!(t.status, TicketStatus::Resolved | TicketStatus::Closed)
        })
        .count();

    let resolution_hours: Vec<f64> = tickets
        .iter()
        .filter_map(|t| {
            t.completed_at
                .map(|done| (done - t.created_at).num_minutes() as f64 / 60.0)
        })
        .collect();
    let average_resolution_hours = if resolution_hours.is_empty() {
        None
    } else {
        Some(resolution_hours.iter().sum::<f64>() / resolution_hours.len() as f64)
    };

    TicketReport {
        total: tickets.len(),
        by_status: group_counts(by_status),
        by_priority: group_counts(by_priority),
        overdue,
        average_resolution_hours,
    }
}

/// 导出列表的表头（与导入模板一致，外加替换引用）
pub const EXPORT_COLUMNS: [&str; 17] = [
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
    "Replaced By",
    "Replacement Date",
];

/// 把一行快照转换为导出显示值
pub fn export_row(snapshot: &AssetSnapshot) -> Vec<String> {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    vec![
        snapshot.asset_code.clone(),
        text(&snapshot.category_name),
        snapshot.serial_number.clone(),
        text(&snapshot.hostname),
        text(&snapshot.po_number),
        text(&snapshot.location_region),
        text(&snapshot.assigned_user),
        text(&snapshot.office),
        text(&snapshot.status_name),
        text(&snapshot.remark),
        text(&snapshot.ip_address),
        text(&snapshot.previous_user),
        snapshot.delivered_at.map(|d| d.to_string()).unwrap_or_default(),
        text(&snapshot.ticket_number),
        text(&snapshot.installed_by),
        snapshot.replaced_by.map(|id| id.to_string()).unwrap_or_default(),
        snapshot
            .replacement_date
            .map(|d| d.to_string())
            .unwrap_or_default(),
    ]
}

pub struct ReportService {
    db: PgPool,
}

impl ReportService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 资产报表
    pub async fn asset_report(&self, filters: &ReportFilters) -> Result<AssetReport, AppError> {
        let repo = AssetRepository::new(self.db.clone());
        let snapshots = repo.snapshots(filters).await?;
        Ok(aggregate_assets(&snapshots))
    }

    /// 工单报表
    pub async fn ticket_report(&self) -> Result<TicketReport, AppError> {
        let repo = TicketRepository::new(self.db.clone());
        let tickets = repo.list_all().await?;
        Ok(aggregate_tickets(&tickets, Utc::now()))
    }

    /// 导出列表：表头 + 显示值行，编码交给外部协作方
    pub async fn export_listing(
        &self,
        filters: &ReportFilters,
    ) -> Result<(Vec<&'static str>, Vec<Vec<String>>), AppError> {
        let repo = AssetRepository::new(self.db.clone());
        let snapshots = repo.snapshots(filters).await?;
        let rows = snapshots.iter().map(export_row).collect();
        Ok((EXPORT_COLUMNS.to_vec(), rows))
    }
}
