//! 变更历史服务
//! 计算字段级差异并在实体变更的事务内追加审计记录

use crate::{
    error::AppError,
    models::{
        asset::FieldSnapshot,
        history::{AssetHistory, ChangeKind, FieldChange},
    },
    repository::history_repo::HistoryRepository,
};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// 计算两个字段快照之间的最小差异集。
///
/// 只遍历 `after` 中出现的字段；`after` 中缺失的字段不产生记录。
/// 值在快照构建时已归一化为存储表示（日期为 YYYY-MM-DD，id 为字符串），
/// 因此相等比较即可判定"没有变化"。
pub fn diff_snapshots(before: &FieldSnapshot, after: &FieldSnapshot) -> Vec<FieldChange> {
    let mut changes = Vec::new();

    for (field, new_value) in after {
        let old_value = before.get(field).cloned().unwrap_or(None);
        if old_value != *new_value {
            changes.push(FieldChange {
                field: field.clone(),
                old: old_value,
                new: new_value.clone(),
            });
        }
    }

    changes
}

/// 为一次变更构建历史记录。
///
/// Created 与 Deleted 恒定产生单条记录；Updated 为每个实际变化的
/// 字段产生一条记录，没有变化则不产生任何记录。
pub fn build_records(
    asset_id: Uuid,
    kind: ChangeKind,
    changes: &[FieldChange],
    changed_by: &str,
    changed_at: DateTime<Utc>,
) -> Vec<AssetHistory> {
    match kind {
        ChangeKind::Created => vec![AssetHistory {
            id: Uuid::new_v4(),
            asset_id,
            changed_field: "created".to_string(),
            old_value: None,
            new_value: "Asset created".to_string(),
            changed_by: changed_by.to_string(),
            note: Some("Asset created in system".to_string()),
            changed_at,
        }],
        ChangeKind::Deleted => vec![AssetHistory {
            id: Uuid::new_v4(),
            asset_id,
            changed_field: "deleted".to_string(),
            old_value: Some("Asset exists".to_string()),
            new_value: "Asset deleted".to_string(),
            changed_by: changed_by.to_string(),
            note: Some("Asset deleted from system".to_string()),
            changed_at,
        }],
        ChangeKind::Updated => changes
            .iter()
            .map(|change| AssetHistory {
                id: Uuid::new_v4(),
                asset_id,
                changed_field: change.field.clone(),
                old_value: change.old.clone(),
                new_value: change.new.clone().unwrap_or_default(),
                changed_by: changed_by.to_string(),
                note: Some(format!("Field {} updated", change.field)),
                changed_at,
            })
            .collect(),
    }
}

pub struct HistoryService {
    db: PgPool,
}

impl HistoryService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 追加一批历史记录。
    ///
    /// 必须传入实体变更所在的事务连接：任何一条写入失败都会让整个
    /// 事务回滚，不允许出现与实体状态不一致的部分审计记录。
    pub async fn append(
        &self,
        conn: &mut PgConnection,
        records: &[AssetHistory],
    ) -> Result<(), AppError> {
        let repo = HistoryRepository::new(self.db.clone());
        for record in records {
            repo.insert(conn, record).await?;
        }
        Ok(())
    }

    /// 查询某资产的历史，最新在前
    pub async fn list_for_asset(&self, asset_id: Uuid) -> Result<Vec<AssetHistory>, AppError> {
        let repo = HistoryRepository::new(self.db.clone());
        repo.list_for_asset(asset_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, Option<&str>)]) -> FieldSnapshot {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(|s| s.to_string())))
            .collect()
    }

    #[test]
    fn test_diff_emits_one_change_per_modified_field() {
        let before = snapshot(&[("status_id", Some("a")), ("assigned_user", Some("Alice"))]);
        let after = snapshot(&[("status_id", Some("a")), ("assigned_user", Some("Bob"))]);

        let changes = diff_snapshots(&before, &after);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "assigned_user");
        assert_eq!(changes[0].old.as_deref(), Some("Alice"));
        assert_eq!(changes[0].new.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_diff_ignores_fields_absent_from_after() {
        let before = snapshot(&[("hostname", Some("HOST-1")), ("office", Some("HQ"))]);
        // office 未出现在 after 中，不应产生记录
        let after = snapshot(&[("hostname", Some("HOST-2"))]);

        let changes = diff_snapshots(&before, &after);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].field, "hostname");
    }

    #[test]
    fn test_diff_detects_absent_to_present() {
        let before = snapshot(&[("hostname", None)]);
        let after = snapshot(&[("hostname", Some("HOST-1"))]);

        let changes = diff_snapshots(&before, &after);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].old, None);
        assert_eq!(changes[0].new.as_deref(), Some("HOST-1"));
    }

    #[test]
    fn test_diff_round_trip_is_empty() {
        let before = snapshot(&[("asset_code", Some("LAP-001")), ("remark", None)]);
        let after = before.clone();

        assert!(diff_snapshots(&before, &after).is_empty());
    }

    #[test]
    fn test_created_always_yields_single_record() {
        let asset_id = Uuid::new_v4();
        let records = build_records(asset_id, ChangeKind::Created, &[], "alice", Utc::now());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].changed_field, "created");
        assert_eq!(records[0].old_value, None);
        assert_eq!(records[0].new_value, "Asset created");
        assert_eq!(records[0].changed_by, "alice");
    }

    #[test]
    fn test_deleted_always_yields_single_record() {
        let asset_id = Uuid::new_v4();
        // 即便传入大量字段变化，Deleted 也只产生一条记录
        let changes = vec![FieldChange {
            field: "hostname".to_string(),
            old: Some("a".to_string()),
            new: Some("b".to_string()),
        }];
        let records = build_records(asset_id, ChangeKind::Deleted, &changes, "bob", Utc::now());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].old_value.as_deref(), Some("Asset exists"));
        assert_eq!(records[0].new_value, "Asset deleted");
    }

    #[test]
    fn test_updated_yields_one_record_per_change() {
        let asset_id = Uuid::new_v4();
        let now = Utc::now();
        let changes = vec![
            FieldChange {
                field: "assigned_user".to_string(),
                old: Some("Alice".to_string()),
                new: Some("Bob".to_string()),
            },
            FieldChange {
                field: "office".to_string(),
                old: None,
                new: Some("HQ".to_string()),
            },
        ];

        let records = build_records(asset_id, ChangeKind::Updated, &changes, "carol", now);

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.asset_id == asset_id));
        assert!(records.iter().all(|r| r.changed_at == now));
        assert_eq!(records[0].changed_field, "assigned_user");
        assert_eq!(records[1].changed_field, "office");
        assert_eq!(records[1].old_value, None);
    }

    #[test]
    fn test_updated_with_no_changes_yields_nothing() {
        let records = build_records(Uuid::new_v4(), ChangeKind::Updated, &[], "dave", Utc::now());
        assert!(records.is_empty());
    }
}
