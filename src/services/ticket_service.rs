//! 工单服务
//! 工单编号按年份递增生成，唯一索引兜底并发冲突

use crate::{
    error::AppError,
    models::ticket::*,
    repository::{asset_repo::AssetRepository, ticket_repo::TicketRepository},
};
use chrono::{Datelike, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// 生成年度前缀，例如 "TKT-2026-"
pub fn year_prefix(year: i32) -> String {
    format!("TKT-{}-", year)
}

/// 按年度序号格式化工单编号，例如 "TKT-2026-0007"
pub fn format_ticket_number(year: i32, sequence: i64) -> String {
    format!("{}{:04}", year_prefix(year), sequence)
}

pub struct TicketService {
    db: PgPool,
}

impl TicketService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 创建工单
    pub async fn create(&self, req: &CreateTicketRequest) -> Result<Ticket, AppError> {
        req.validate()?;

        if let Some(asset_id) = req.asset_id {
            let asset_repo = AssetRepository::new(self.db.clone());
            if asset_repo.get(asset_id).await?.is_none() {
                return Err(AppError::validation(&format!(
                    "unknown asset id \"{}\"",
                    asset_id
                )));
            }
        }

        let repo = TicketRepository::new(self.db.clone());
        let year = Utc::now().year();

        // 编号生成与插入在同一事务中；并发冲突由唯一索引拦截
        let mut tx = self.db.begin().await?;
        let issued = repo.count_for_year(&mut tx, &year_prefix(year)).await?;
        let ticket_number = format_ticket_number(year, issued + 1);
        let ticket = repo.insert(&mut tx, &ticket_number, req).await?;
        tx.commit().await?;

        tracing::info!(ticket_id = %ticket.id, ticket_number = %ticket.ticket_number, "Ticket created");
        Ok(ticket)
    }

    /// 获取工单
    pub async fn get(&self, id: Uuid) -> Result<Ticket, AppError> {
        let repo = TicketRepository::new(self.db.clone());
        repo.get(id).await?.ok_or_else(|| AppError::not_found("ticket"))
    }

    /// 列出工单
    pub async fn list(
        &self,
        filters: &TicketListFilters,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Ticket>, i64), AppError> {
        let repo = TicketRepository::new(self.db.clone());
        let tickets = repo.list(filters, limit, offset).await?;
        let total = repo.count(filters).await?;
        Ok((tickets, total))
    }

    /// 更新工单；首次进入完结状态时写入完成时间
    pub async fn update(&self, id: Uuid, req: &UpdateTicketRequest) -> Result<Ticket, AppError> {
        req.validate()?;

        let repo = TicketRepository::new(self.db.clone());
        let current = repo.get(id).await?.ok_or_else(|| AppError::not_found("ticket"))?;

        if let Some(asset_id) = req.asset_id {
            let asset_repo = AssetRepository::new(self.db.clone());
            if asset_repo.get(asset_id).await?.is_none() {
                return Err(AppError::validation(&format!(
                    "unknown asset id \"{}\"",
                    asset_id
                )));
            }
        }

        let completed_at = match req.status {
            Some(TicketStatus::Resolved) | Some(TicketStatus::Closed)
                if current.completed_at.is_none() =>
            {
                Some(Utc::now())
            }
            _ => None,
        };

        repo.update(id, req, completed_at)
            .await?
            .ok_or_else(|| AppError::not_found("ticket"))
    }

    /// 删除工单
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let repo = TicketRepository::new(self.db.clone());
        if !repo.delete(id).await? {
            return Err(AppError::not_found("ticket"));
        }
        Ok(())
    }
}
