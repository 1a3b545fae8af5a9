//! Catalog repository (类别与状态参照表数据访问)

use crate::{
    error::{map_unique_violation, AppError},
    models::catalog::*,
};
use sqlx::{PgPool, Row};
use uuid::Uuid;

pub struct CatalogRepository {
    db: PgPool,
}

impl CatalogRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ==================== Categories ====================

    /// 创建类别
    pub async fn create_category(
        &self,
        req: &CreateReferenceRequest,
    ) -> Result<AssetCategory, AppError> {
        let category = sqlx::query_as::<_, AssetCategory>(
            r#"
            INSERT INTO asset_categories (name, description)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, &format!("category \"{}\" already exists", req.name)))?;

        Ok(category)
    }

    /// 获取类别
    pub async fn get_category(&self, id: Uuid) -> Result<Option<AssetCategory>, AppError> {
        let category =
            sqlx::query_as::<_, AssetCategory>("SELECT * FROM asset_categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        Ok(category)
    }

    /// 列出类别
    pub async fn list_categories(&self) -> Result<Vec<AssetCategory>, AppError> {
        let categories =
            sqlx::query_as::<_, AssetCategory>("SELECT * FROM asset_categories ORDER BY name")
                .fetch_all(&self.db)
                .await?;

        Ok(categories)
    }

    /// 更新类别
    pub async fn update_category(
        &self,
        id: Uuid,
        req: &UpdateReferenceRequest,
    ) -> Result<Option<AssetCategory>, AppError> {
        let category = sqlx::query_as::<_, AssetCategory>(
            r#"
            UPDATE asset_categories
            SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.description)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "category name already exists"))?;

        Ok(category)
    }

    /// 删除类别
    pub async fn delete_category(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM asset_categories WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 统计引用该类别的未删除资产数
    pub async fn count_assets_in_category(&self, id: Uuid) -> Result<i64, AppError> {
        let count: i64 = sqlx::query(
            "SELECT COUNT(*) FROM assets WHERE category_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?
        .get(0);

        Ok(count)
    }

    // ==================== Statuses ====================

    /// 创建状态
    pub async fn create_status(
        &self,
        req: &CreateReferenceRequest,
    ) -> Result<AssetStatus, AppError> {
        let status = sqlx::query_as::<_, AssetStatus>(
            r#"
            INSERT INTO asset_statuses (name, description)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(&req.name)
        .bind(&req.description)
        .fetch_one(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, &format!("status \"{}\" already exists", req.name)))?;

        Ok(status)
    }

    /// 获取状态
    pub async fn get_status(&self, id: Uuid) -> Result<Option<AssetStatus>, AppError> {
        let status = sqlx::query_as::<_, AssetStatus>("SELECT * FROM asset_statuses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(status)
    }

    /// 列出状态
    pub async fn list_statuses(&self) -> Result<Vec<AssetStatus>, AppError> {
        let statuses =
            sqlx::query_as::<_, AssetStatus>("SELECT * FROM asset_statuses ORDER BY name")
                .fetch_all(&self.db)
                .await?;

        Ok(statuses)
    }

    /// 更新状态
    pub async fn update_status(
        &self,
        id: Uuid,
        req: &UpdateReferenceRequest,
    ) -> Result<Option<AssetStatus>, AppError> {
        let status = sqlx::query_as::<_, AssetStatus>(
            r#"
            UPDATE asset_statuses
            SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(&req.description)
        .fetch_optional(&self.db)
        .await
        .map_err(|e| map_unique_violation(e, "status name already exists"))?;

        Ok(status)
    }

    /// 删除状态
    pub async fn delete_status(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM asset_statuses WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 统计引用该状态的未删除资产数
    pub async fn count_assets_in_status(&self, id: Uuid) -> Result<i64, AppError> {
        let count: i64 =
            sqlx::query("SELECT COUNT(*) FROM assets WHERE status_id = $1 AND deleted_at IS NULL")
                .bind(id)
                .fetch_one(&self.db)
                .await?
                .get(0);

        Ok(count)
    }
}
