//! Ticket repository (工单数据访问)

use crate::{
    error::{map_unique_violation, AppError},
    models::ticket::*,
};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

pub struct TicketRepository {
    db: PgPool,
}

impl TicketRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 插入工单（在调用方的事务中执行，编号由服务层生成）
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        ticket_number: &str,
        req: &CreateTicketRequest,
    ) -> Result<Ticket, AppError> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (
                ticket_number, asset_id, technician, title, description,
                priority, due_date, cost, estimated_hours
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(ticket_number)
        .bind(req.asset_id)
        .bind(&req.technician)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.priority)
        .bind(req.due_date)
        .bind(req.cost)
        .bind(req.estimated_hours)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            map_unique_violation(e, &format!("ticket number \"{}\" already exists", ticket_number))
        })?;

        Ok(ticket)
    }

    /// 当年已发放的工单数（在调用方的事务中执行，用于编号生成）
    pub async fn count_for_year(
        &self,
        conn: &mut PgConnection,
        year_prefix: &str,
    ) -> Result<i64, AppError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) FROM tickets WHERE ticket_number LIKE $1")
            .bind(format!("{}%", year_prefix))
            .fetch_one(&mut *conn)
            .await?
            .get(0);

        Ok(count)
    }

    /// 获取工单
    pub async fn get(&self, id: Uuid) -> Result<Option<Ticket>, AppError> {
        let ticket = sqlx::query_as::<_, Ticket>("SELECT * FROM tickets WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(ticket)
    }

    /// 列出工单
    pub async fn list(
        &self,
        filters: &TicketListFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Ticket>, AppError> {
        let mut query = String::from("SELECT * FROM tickets WHERE 1=1");
        let mut index = 0;

        if filters.status.is_some() {
            index += 1;
            query.push_str(&format!(" AND status = ${}", index));
        }
        if filters.priority.is_some() {
            index += 1;
            query.push_str(&format!(" AND priority = ${}", index));
        }
        if filters.asset_id.is_some() {
            index += 1;
            query.push_str(&format!(" AND asset_id = ${}", index));
        }
        if filters.search.is_some() {
            index += 1;
            query.push_str(&format!(
                " AND (ticket_number ILIKE ${} OR title ILIKE ${})",
                index,
                index + 1
            ));
            index += 1;
        }

        query.push_str(&format!(
            " ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            index + 1,
            index + 2
        ));

        let mut query_builder = sqlx::query_as::<_, Ticket>(&query);

        if let Some(status) = filters.status {
            query_builder = query_builder.bind(status);
        }
        if let Some(priority) = filters.priority {
            query_builder = query_builder.bind(priority);
        }
        if let Some(asset_id) = filters.asset_id {
            query_builder = query_builder.bind(asset_id);
        }
        let search_pattern;
        if let Some(search) = &filters.search {
            search_pattern = format!("%{}%", search);
            query_builder = query_builder.bind(&search_pattern);
            query_builder = query_builder.bind(&search_pattern);
        }

        let tickets = query_builder
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

        Ok(tickets)
    }

    /// 统计工单数量
    pub async fn count(&self, filters: &TicketListFilters) -> Result<i64, AppError> {
        let mut query = String::from("SELECT COUNT(*) FROM tickets WHERE 1=1");
        let mut index = 0;

        if filters.status.is_some() {
            index += 1;
            query.push_str(&format!(" AND status = ${}", index));
        }
        if filters.priority.is_some() {
            index += 1;
            query.push_str(&format!(" AND priority = ${}", index));
        }
        if filters.asset_id.is_some() {
            index += 1;
            query.push_str(&format!(" AND asset_id = ${}", index));
        }
        if filters.search.is_some() {
            index += 1;
            query.push_str(&format!(
                " AND (ticket_number ILIKE ${} OR title ILIKE ${})",
                index,
                index + 1
            ));
        }

        let mut query_builder = sqlx::query(&query);

        if let Some(status) = filters.status {
            query_builder = query_builder.bind(status);
        }
        if let Some(priority) = filters.priority {
            query_builder = query_builder.bind(priority);
        }
        if let Some(asset_id) = filters.asset_id {
            query_builder = query_builder.bind(asset_id);
        }
        let search_pattern;
        if let Some(search) = &filters.search {
            search_pattern = format!("%{}%", search);
            query_builder = query_builder.bind(&search_pattern);
            query_builder = query_builder.bind(&search_pattern);
        }

        let count: i64 = query_builder.fetch_one(&self.db).await?.get(0);
        Ok(count)
    }

    /// 全量读取（报表聚合用）
    pub async fn list_all(&self) -> Result<Vec<Ticket>, AppError> {
        let tickets = sqlx::query_as::<_, Ticket>("SELECT * FROM tickets ORDER BY created_at")
            .fetch_all(&self.db)
            .await?;

        Ok(tickets)
    }

    /// 更新工单（缺省字段保持不变）
    pub async fn update(
        &self,
        id: Uuid,
        req: &UpdateTicketRequest,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Option<Ticket>, AppError> {
        let ticket = sqlx::query_as::<_, Ticket>(
            r#"
            UPDATE tickets
            SET
                asset_id = COALESCE($2, asset_id),
                technician = COALESCE($3, technician),
                title = COALESCE($4, title),
                description = COALESCE($5, description),
                priority = COALESCE($6, priority),
                status = COALESCE($7, status),
                due_date = COALESCE($8, due_date),
                completed_at = COALESCE($9, completed_at),
                cost = COALESCE($10, cost),
                estimated_hours = COALESCE($11, estimated_hours),
                actual_hours = COALESCE($12, actual_hours),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(req.asset_id)
        .bind(&req.technician)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.priority)
        .bind(req.status)
        .bind(req.due_date)
        .bind(completed_at)
        .bind(req.cost)
        .bind(req.estimated_hours)
        .bind(req.actual_hours)
        .fetch_optional(&self.db)
        .await?;

        Ok(ticket)
    }

    /// 删除工单
    pub async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 某资产未完结的工单数（open / in_progress）
    pub async fn count_open_for_asset(&self, asset_id: Uuid) -> Result<i64, AppError> {
        let count: i64 = sqlx::query(
            "SELECT COUNT(*) FROM tickets WHERE asset_id = $1 AND status IN ('open', 'in_progress')",
        )
        .bind(asset_id)
        .fetch_one(&self.db)
        .await?
        .get(0);

        Ok(count)
    }
}
