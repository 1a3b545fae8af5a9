//! Asset history repository (变更历史数据访问)
//! 历史记录仅追加，没有更新和删除操作

use crate::{error::AppError, models::history::AssetHistory};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

pub struct HistoryRepository {
    db: PgPool,
}

impl HistoryRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 插入一条历史记录（在调用方的事务中执行）
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        record: &AssetHistory,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO asset_history (
                id, asset_id, changed_field, old_value, new_value,
                changed_by, note, changed_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(record.id)
        .bind(record.asset_id)
        .bind(&record.changed_field)
        .bind(&record.old_value)
        .bind(&record.new_value)
        .bind(&record.changed_by)
        .bind(&record.note)
        .bind(record.changed_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// 查询某资产的全部历史，最新在前
    pub async fn list_for_asset(&self, asset_id: Uuid) -> Result<Vec<AssetHistory>, AppError> {
        let records = sqlx::query_as::<_, AssetHistory>(
            r#"
            SELECT * FROM asset_history
            WHERE asset_id = $1
            ORDER BY changed_at DESC, changed_field ASC
            "#,
        )
        .bind(asset_id)
        .fetch_all(&self.db)
        .await?;

        Ok(records)
    }
}
