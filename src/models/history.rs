//! Asset change history domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One field-level change record. Append-only: never updated or deleted
/// once written.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AssetHistory {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub changed_field: String,
    pub old_value: Option<String>,
    pub new_value: String,
    pub changed_by: String,
    pub note: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Kind of mutation being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "asset.create",
            ChangeKind::Updated => "asset.update",
            ChangeKind::Deleted => "asset.delete",
        }
    }
}

/// A single detected field change (old != new)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange {
    pub field: String,
    pub old: Option<String>,
    pub new: Option<String>,
}
