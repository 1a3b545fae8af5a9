//! 参照目录服务
//! 类别与状态的维护，以及供导入使用的只读快照

use crate::{
    error::AppError,
    models::catalog::*,
    repository::catalog_repo::CatalogRepository,
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

pub struct CatalogService {
    db: PgPool,
}

impl CatalogService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 加载完整参照快照（导入与校验用）
    pub async fn load_catalog(&self) -> Result<ReferenceCatalog, AppError> {
        let repo = CatalogRepository::new(self.db.clone());
        let categories = repo.list_categories().await?;
        let statuses = repo.list_statuses().await?;
        Ok(ReferenceCatalog::new(categories, statuses))
    }

    // ==================== Categories ====================

    /// 列出类别
    pub async fn list_categories(&self) -> Result<Vec<AssetCategory>, AppError> {
        let repo = CatalogRepository::new(self.db.clone());
        repo.list_categories().await
    }

    /// 创建类别
    pub async fn create_category(
        &self,
        req: &CreateReferenceRequest,
    ) -> Result<AssetCategory, AppError> {
        req.validate()?;
        let repo = CatalogRepository::new(self.db.clone());
        repo.create_category(req).await
    }

    /// 获取类别
    pub async fn get_category(&self, id: Uuid) -> Result<AssetCategory, AppError> {
        let repo = CatalogRepository::new(self.db.clone());
        repo.get_category(id)
            .await?
            .ok_or_else(|| AppError::not_found("category"))
    }

    /// 更新类别
    pub async fn update_category(
        &self,
        id: Uuid,
        req: &UpdateReferenceRequest,
    ) -> Result<AssetCategory, AppError> {
        req.validate()?;
        let repo = CatalogRepository::new(self.db.clone());
        repo.update_category(id, req)
            .await?
            .ok_or_else(|| AppError::not_found("category"))
    }

    /// 删除类别；仍被资产引用时拒绝
    pub async fn delete_category(&self, id: Uuid) -> Result<(), AppError> {
        let repo = CatalogRepository::new(self.db.clone());

        if repo.get_category(id).await?.is_none() {
            return Err(AppError::not_found("category"));
        }

        let referencing = repo.count_assets_in_category(id).await?;
        if referencing > 0 {
            return Err(AppError::conflict("Cannot delete category with existing assets"));
        }

        repo.delete_category(id).await?;
        Ok(())
    }

    // ==================== Statuses ====================

    /// 列出状态
    pub async fn list_statuses(&self) -> Result<Vec<AssetStatus>, AppError> {
        let repo = CatalogRepository::new(self.db.clone());
        repo.list_statuses().await
    }

    /// 创建状态
    pub async fn create_status(
        &self,
        req: &CreateReferenceRequest,
    ) -> Result<AssetStatus, AppError> {
        req.validate()?;
        let repo = CatalogRepository::new(self.db.clone());
        repo.create_status(req).await
    }

    /// 获取状态
    pub async fn get_status(&self, id: Uuid) -> Result<AssetStatus, AppError> {
        let repo = CatalogRepository::new(self.db.clone());
        repo.get_status(id)
            .await?
            .ok_or_else(|| AppError::not_found("status"))
    }

    /// 更新状态
    pub async fn update_status(
        &self,
        id: Uuid,
        req: &UpdateReferenceRequest,
    ) -> Result<AssetStatus, AppError> {
        req.validate()?;
        let repo = CatalogRepository::new(self.db.clone());
        repo.update_status(id, req)
            .await?
            .ok_or_else(|| AppError::not_found("status"))
    }

    /// 删除状态；仍被资产引用时拒绝
    pub async fn delete_status(&self, id: Uuid) -> Result<(), AppError> {
        let repo = CatalogRepository::new(self.db.clone());

        if repo.get_status(id).await?.is_none() {
            return Err(AppError::not_found("status"));
        }

        let referencing = repo.count_assets_in_status(id).await?;
        if referencing > 0 {
            return Err(AppError::conflict("Cannot delete status with existing assets"));
        }

        repo.delete_status(id).await?;
        Ok(())
    }
}
