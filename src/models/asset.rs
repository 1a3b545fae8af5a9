//! Asset domain models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

/// Tracked IT asset
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Asset {
    pub id: Uuid,
    pub category_id: Uuid,
    pub status_id: Uuid,
    pub asset_code: String,
    pub serial_number: String,
    pub hostname: Option<String>,
    pub location_region: String,
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
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Field snapshot used by the change recorder, keyed by column name.
/// Values are normalized to the stored string representation.
pub type FieldSnapshot = BTreeMap<String, Option<String>>;

impl Asset {
    /// Snapshot of all mutable fields for diffing against an update
    pub fn field_snapshot(&self) -> FieldSnapshot {
        let mut map = FieldSnapshot::new();
        map.insert("category_id".into(), Some(self.category_id.to_string()));
        map.insert("status_id".into(), Some(self.status_id.to_string()));
        map.insert("asset_code".into(), Some(self.asset_code.clone()));
        map.insert("serial_number".into(), Some(self.serial_number.clone()));
        map.insert("hostname".into(), self.hostname.clone());
        map.insert("location_region".into(), Some(self.location_region.clone()));
        map.insert("assigned_user".into(), self.assigned_user.clone());
        map.insert("previous_user".into(), self.previous_user.clone());
        map.insert("office".into(), self.office.clone());
        map.insert("ip_address".into(), self.ip_address.clone());
        map.insert("po_number".into(), self.po_number.clone());
        map.insert("ticket_number".into(), self.ticket_number.clone());
        map.insert("installed_by".into(), self.installed_by.clone());
        map.insert("replaced_by".into(), self.replaced_by.map(|v| v.to_string()));
        map.insert(
            "replacement_date".into(),
            self.replacement_date.map(|v| v.to_string()),
        );
        map.insert("delivered_at".into(), self.delivered_at.map(|v| v.to_string()));
        map.insert("remark".into(), self.remark.clone());
        map
    }
}

/// Create asset request — enumerates exactly the mutable columns
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateAssetRequest {
    pub category_id: Uuid,
    pub status_id: Uuid,
    #[validate(length(min = 1, max = 64))]
    pub asset_code: String,
    #[validate(length(min = 1, max = 128))]
    pub serial_number: String,
    pub hostname: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub location_region: String,
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
    /// 操作人（显式传入，不允许隐式默认）
    #[validate(length(min = 1, max = 128))]
    pub changed_by: String,
}

/// Update asset request — absent fields are left untouched
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateAssetRequest {
    pub category_id: Option<Uuid>,
    pub status_id: Option<Uuid>,
    #[validate(length(min = 1, max = 64))]
    pub asset_code: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub serial_number: Option<String>,
    pub hostname: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub location_region: Option<String>,
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
    #[validate(length(min = 1, max = 128))]
    pub changed_by: String,
}

impl UpdateAssetRequest {
    /// Snapshot of only the fields present in this request
    pub fn field_snapshot(&self) -> FieldSnapshot {
        let mut map = FieldSnapshot::new();
        if let Some(v) = self.category_id {
            map.insert("category_id".into(), Some(v.to_string()));
        }
        if let Some(v) = self.status_id {
            map.insert("status_id".into(), Some(v.to_string()));
        }
        if let Some(v) = &self.asset_code {
            map.insert("asset_code".into(), Some(v.clone()));
        }
        if let Some(v) = &self.serial_number {
            map.insert("serial_number".into(), Some(v.clone()));
        }
        if let Some(v) = &self.hostname {
            map.insert("hostname".into(), Some(v.clone()));
        }
        if let Some(v) = &self.location_region {
            map.insert("location_region".into(), Some(v.clone()));
        }
        if let Some(v) = &self.assigned_user {
            map.insert("assigned_user".into(), Some(v.clone()));
        }
        if let Some(v) = &self.previous_user {
            map.insert("previous_user".into(), Some(v.clone()));
        }
        if let Some(v) = &self.office {
            map.insert("office".into(), Some(v.clone()));
        }
        if let Some(v) = &self.ip_address {
            map.insert("ip_address".into(), Some(v.clone()));
        }
        if let Some(v) = &self.po_number {
            map.insert("po_number".into(), Some(v.clone()));
        }
        if let Some(v) = &self.ticket_number {
            map.insert("ticket_number".into(), Some(v.clone()));
        }
        if let Some(v) = &self.installed_by {
            map.insert("installed_by".into(), Some(v.clone()));
        }
        if let Some(v) = self.replaced_by {
            map.insert("replaced_by".into(), Some(v.to_string()));
        }
        if let Some(v) = self.replacement_date {
            map.insert("replacement_date".into(), Some(v.to_string()));
        }
        if let Some(v) = self.delivered_at {
            map.insert("delivered_at".into(), Some(v.to_string()));
        }
        if let Some(v) = &self.remark {
            map.insert("remark".into(), Some(v.clone()));
        }
        map
    }
}

/// Asset list filters
#[derive(Debug, Default, Deserialize)]
pub struct AssetListFilters {
    pub category_id: Option<Uuid>,
    pub status_id: Option<Uuid>,
    pub location: Option<String>,
    pub search: Option<String>, // Search in asset_code/serial_number/hostname
}

/// Asset response with resolved reference names
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AssetResponse {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub asset: Asset,
    pub category_name: String,
    pub status_name: String,
}
