//! 资产服务
//! 创建/更新/删除都与变更历史写入处于同一事务：要么实体与全部
//! 审计记录一起落库，要么整体回滚

use crate::{
    error::AppError,
    models::{asset::*, history::*, import::NewAssetRow},
    repository::{
        asset_repo::AssetRepository, catalog_repo::CatalogRepository,
        ticket_repo::TicketRepository,
    },
    services::history_service::{self, HistoryService},
};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

pub struct AssetService {
    db: PgPool,
}

impl AssetService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 创建资产并记录 "created" 历史
    pub async fn create(&self, req: &CreateAssetRequest) -> Result<Asset, AppError> {
        req.validate()?;

        let catalog_repo = CatalogRepository::new(self.db.clone());
        let asset_repo = AssetRepository::new(self.db.clone());

        // 外键引用必须指向现存的参照数据
        if catalog_repo.get_category(req.category_id).await?.is_none() {
            return Err(AppError::validation(&format!(
                "unknown category id \"{}\"",
                req.category_id
            )));
        }
        if catalog_repo.get_status(req.status_id).await?.is_none() {
            return Err(AppError::validation(&format!(
                "unknown status id \"{}\"",
                req.status_id
            )));
        }
        if let Some(replaced_by) = req.replaced_by {
            if asset_repo.get(replaced_by).await?.is_none() {
                return Err(AppError::validation(&format!(
                    "unknown replacement asset id \"{}\"",
                    replaced_by
                )));
            }
        }

        // 应用层预检查给出友好错误；真正的竞态由存储层唯一索引兜底
        if asset_repo.code_in_use(&req.asset_code, None).await? {
            return Err(AppError::validation(&format!(
                "asset code \"{}\" already exists",
                req.asset_code
            )));
        }
        if asset_repo.serial_in_use(&req.serial_number, None).await? {
            return Err(AppError::validation(&format!(
                "serial number \"{}\" already exists",
                req.serial_number
            )));
        }

        let row = new_asset_row(req);

        let mut tx = self.db.begin().await?;
        let asset = asset_repo.insert(&mut tx, &row).await?;

        let records = history_service::build_records(
            asset.id,
            ChangeKind::Created,
            &[],
            &req.changed_by,
            chrono::Utc::now(),
        );
        HistoryService::new(self.db.clone())
            .append(&mut tx, &records)
            .await?;

        tx.commit().await?;

        tracing::info!(
            action = ChangeKind::Created.as_str(),
            asset_id = %asset.id,
            asset_code = %asset.asset_code,
            "Asset created"
        );
        Ok(asset)
    }

    /// 更新资产；对每个实际变化的字段记录一条历史
    pub async fn update(&self, id: Uuid, req: &UpdateAssetRequest) -> Result<Asset, AppError> {
        req.validate()?;

        let catalog_repo = CatalogRepository::new(self.db.clone());
        let asset_repo = AssetRepository::new(self.db.clone());

        let before = asset_repo
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found("asset"))?;

        if let Some(category_id) = req.category_id {
            if catalog_repo.get_category(category_id).await?.is_none() {
                return Err(AppError::validation(&format!(
                    "unknown category id \"{}\"",
                    category_id
                )));
            }
        }
        if let Some(status_id) = req.status_id {
            if catalog_repo.get_status(status_id).await?.is_none() {
                return Err(AppError::validation(&format!(
                    "unknown status id \"{}\"",
                    status_id
                )));
            }
        }
        if let Some(replaced_by) = req.replaced_by {
            if replaced_by == id {
                return Err(AppError::validation("asset cannot replace itself"));
            }
            if asset_repo.get(replaced_by).await?.is_none() {
                return Err(AppError::validation(&format!(
                    "unknown replacement asset id \"{}\"",
                    replaced_by
                )));
            }
        }

        if let Some(asset_code) = &req.asset_code {
            if asset_repo.code_in_use(asset_code, Some(id)).await? {
                return Err(AppError::validation(&format!(
                    "asset code \"{}\" already exists",
                    asset_code
                )));
            }
        }
        if let Some(serial_number) = &req.serial_number {
            if asset_repo.serial_in_use(serial_number, Some(id)).await? {
                return Err(AppError::validation(&format!(
                    "serial number \"{}\" already exists",
                    serial_number
                )));
            }
        }

        // 先对更新前的快照求差异，再在同一事务中写入实体与历史
        let changes =
            history_service::diff_snapshots(&before.field_snapshot(), &req.field_snapshot());

        let mut tx = self.db.begin().await?;
        let asset = asset_repo
            .update(&mut tx, id, req)
            .await?
            .ok_or_else(|| AppError::not_found("asset"))?;

        let records = history_service::build_records(
            asset.id,
            ChangeKind::Updated,
            &changes,
            &req.changed_by,
            chrono::Utc::now(),
        );
        HistoryService::new(self.db.clone())
            .append(&mut tx, &records)
            .await?;

        tx.commit().await?;

        tracing::info!(
            action = ChangeKind::Updated.as_str(),
            asset_id = %asset.id,
            changed_fields = records.len(),
            "Asset updated"
        );
        Ok(asset)
    }

    /// 删除资产；存在未完结工单时拒绝
    pub async fn delete(&self, id: Uuid, changed_by: &str) -> Result<(), AppError> {
        if changed_by.trim().is_empty() {
            return Err(AppError::validation("changed_by is required"));
        }

        let asset_repo = AssetRepository::new(self.db.clone());
        let ticket_repo = TicketRepository::new(self.db.clone());

        let asset = asset_repo
            .get(id)
            .await?
            .ok_or_else(|| AppError::not_found("asset"))?;

        let open_tickets = ticket_repo.count_open_for_asset(id).await?;
        if open_tickets > 0 {
            return Err(AppError::conflict(&format!(
                "Cannot delete asset with {} open ticket(s)",
                open_tickets
            )));
        }

        let records = history_service::build_records(
            asset.id,
            ChangeKind::Deleted,
            &[],
            changed_by,
            chrono::Utc::now(),
        );

        let mut tx = self.db.begin().await?;
        HistoryService::new(self.db.clone())
            .append(&mut tx, &records)
            .await?;
        asset_repo.soft_delete(&mut tx, id).await?;
        tx.commit().await?;

        tracing::info!(action = ChangeKind::Deleted.as_str(), asset_id = %id, "Asset deleted");
        Ok(())
    }

    /// 获取资产详情（含参照名称）
    pub async fn get(&self, id: Uuid) -> Result<AssetResponse, AppError> {
        let repo = AssetRepository::new(self.db.clone());
        repo.get_response(id)
            .await?
            .ok_or_else(|| AppError::not_found("asset"))
    }

    /// 列出资产
    pub async fn list(
        &self,
        filters: &AssetListFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<AssetResponse>, i64), AppError> {
        let repo = AssetRepository::new(self.db.clone());
        let assets = repo.list(filters, limit, offset).await?;
        let total = repo.count(filters).await?;
        Ok((assets, total))
    }

    /// 查询资产历史（最新在前）。已删除资产的历史仍可查询。
    pub async fn history(&self, id: Uuid) -> Result<Vec<AssetHistory>, AppError> {
        let asset_repo = AssetRepository::new(self.db.clone());
        if !asset_repo.exists_any(id).await? {
            return Err(AppError::not_found("asset"));
        }

        HistoryService::new(self.db.clone()).list_for_asset(id).await
    }
}

/// 把创建请求转换为插入载荷
fn new_asset_row(req: &CreateAssetRequest) -> NewAssetRow {
    NewAssetRow {
        category_id: req.category_id,
        status_id: req.status_id,
        asset_code: req.asset_code.clone(),
        serial_number: req.serial_number.clone(),
        location_region: req.location_region.clone(),
        hostname: req.hostname.clone(),
        assigned_user: req.assigned_user.clone(),
        previous_user: req.previous_user.clone(),
        office: req.office.clone(),
        ip_address: req.ip_address.clone(),
        po_number: req.po_number.clone(),
        ticket_number: req.ticket_number.clone(),
        installed_by: req.installed_by.clone(),
        replaced_by: req.replaced_by,
        replacement_date: req.replacement_date,
        delivered_at: req.delivered_at,
        remark: req.remark.clone(),
    }
}
