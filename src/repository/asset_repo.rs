//! Asset repository (资产数据访问)

use crate::{
    error::{map_unique_violation, AppError},
    models::{asset::*, import::NewAssetRow, report::*},
};
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

const SELECT_RESPONSE: &str = r#"
    SELECT a.*, c.name AS category_name, s.name AS status_name
    FROM assets a
    JOIN asset_categories c ON c.id = a.category_id
    JOIN asset_statuses s ON s.id = a.status_id
    WHERE a.deleted_at IS NULL
"#;

pub struct AssetRepository {
    db: PgPool,
}

impl AssetRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 插入资产（在调用方的事务中执行）
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        row: &NewAssetRow,
    ) -> Result<Asset, AppError> {
        let asset = sqlx::query_as::<_, Asset>(
            r#"
            INSERT INTO assets (
                category_id, status_id, asset_code, serial_number, hostname,
                location_region, assigned_user, previous_user, office, ip_address,
                po_number, ticket_number, installed_by, replaced_by,
                replacement_date, delivered_at, remark
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(row.category_id)
        .bind(row.status_id)
        .bind(&row.asset_code)
        .bind(&row.serial_number)
        .bind(&row.hostname)
        .bind(&row.location_region)
        .bind(&row.assigned_user)
        .bind(&row.previous_user)
        .bind(&row.office)
        .bind(&row.ip_address)
        .bind(&row.po_number)
        .bind(&row.ticket_number)
        .bind(&row.installed_by)
        .bind(row.replaced_by)
        .bind(row.replacement_date)
        .bind(row.delivered_at)
        .bind(&row.remark)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            map_unique_violation(
                e,
                &format!(
                    "asset code \"{}\" or serial number \"{}\" already exists",
                    row.asset_code, row.serial_number
                ),
            )
        })?;

        Ok(asset)
    }

    /// 获取未删除的资产
    pub async fn get(&self, id: Uuid) -> Result<Option<Asset>, AppError> {
        let asset =
            sqlx::query_as::<_, Asset>("SELECT * FROM assets WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;

        Ok(asset)
    }

    /// 资产是否存在过（含已软删除的，用于历史查询）
    pub async fn exists_any(&self, id: Uuid) -> Result<bool, AppError> {
        let count: i64 = sqlx::query("SELECT COUNT(*) FROM assets WHERE id = $1")
            .bind(id)
            .fetch_one(&self.db)
            .await?
            .get(0);

        Ok(count > 0)
    }

    /// 资产编码是否已被其他未删除资产占用
    pub async fn code_in_use(
        &self,
        asset_code: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let count: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) FROM assets
            WHERE asset_code = $1 AND deleted_at IS NULL AND ($2::uuid IS NULL OR id <> $2)
            "#,
        )
        .bind(asset_code)
        .bind(exclude)
        .fetch_one(&self.db)
        .await?
        .get(0);

        Ok(count > 0)
    }

    /// 序列号是否已被其他未删除资产占用
    pub async fn serial_in_use(
        &self,
        serial_number: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, AppError> {
        let count: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) FROM assets
            WHERE serial_number = $1 AND deleted_at IS NULL AND ($2::uuid IS NULL OR id <> $2)
            "#,
        )
        .bind(serial_number)
        .bind(exclude)
        .fetch_one(&self.db)
        .await?
        .get(0);

        Ok(count > 0)
    }

    /// 获取资产及参照名称
    pub async fn get_response(&self, id: Uuid) -> Result<Option<AssetResponse>, AppError> {
        let sql = format!("{} AND a.id = $1", SELECT_RESPONSE);
        let asset = sqlx::query_as::<_, AssetResponse>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(asset)
    }

    /// 列出资产
    pub async fn list(
        &self,
        filters: &AssetListFilters,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AssetResponse>, AppError> {
        let mut query = String::from(SELECT_RESPONSE);
        let mut index = 0;

        if filters.category_id.is_some() {
            index += 1;
            query.push_str(&format!(" AND a.category_id = ${}", index));
        }
        if filters.status_id.is_some() {
            index += 1;
            query.push_str(&format!(" AND a.status_id = ${}", index));
        }
        if filters.location.is_some() {
            index += 1;
            query.push_str(&format!(" AND a.location_region ILIKE ${}", index));
        }
        if filters.search.is_some() {
            index += 1;
            query.push_str(&format!(
                " AND (a.asset_code ILIKE ${} OR a.serial_number ILIKE ${} OR a.hostname ILIKE ${})",
                index,
                index + 1,
                index + 2
            ));
            index += 2;
        }

        query.push_str(&format!(
            " ORDER BY a.asset_code LIMIT ${} OFFSET ${}",
            index + 1,
            index + 2
        ));

        let mut query_builder = sqlx::query_as::<_, AssetResponse>(&query);

        if let Some(category_id) = filters.category_id {
            query_builder = query_builder.bind(category_id);
        }
        if let Some(status_id) = filters.status_id {
            query_builder = query_builder.bind(status_id);
        }
        let location_pattern;
        if let Some(location) = &filters.location {
            location_pattern = format!("%{}%", location);
            query_builder = query_builder.bind(location_pattern);
        }
        let search_pattern;
        if let Some(search) = &filters.search {
            search_pattern = format!("%{}%", search);
            query_builder = query_builder.bind(&search_pattern);
            query_builder = query_builder.bind(&search_pattern);
            query_builder = query_builder.bind(&search_pattern);
        }

        let assets = query_builder
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;

        Ok(assets)
    }

    /// 统计资产数量
    pub async fn count(&self, filters: &AssetListFilters) -> Result<i64, AppError> {
        let mut query =
            String::from("SELECT COUNT(*) FROM assets a WHERE a.deleted_at IS NULL");
        let mut index = 0;

        if filters.category_id.is_some() {
            index += 1;
            query.push_str(&format!(" AND a.category_id = ${}", index));
        }
        if filters.status_id.is_some() {
            index += 1;
            query.push_str(&format!(" AND a.status_id = ${}", index));
        }
        if filters.location.is_some() {
            index += 1;
            query.push_str(&format!(" AND a.location_region ILIKE ${}", index));
        }
        if filters.search.is_some() {
            index += 1;
            query.push_str(&format!(
                " AND (a.asset_code ILIKE ${} OR a.serial_number ILIKE ${} OR a.hostname ILIKE ${})",
                index,
                index + 1,
                index + 2
            ));
        }

        let mut query_builder = sqlx::query(&query);

        if let Some(category_id) = filters.category_id {
            query_builder = query_builder.bind(category_id);
        }
        if let Some(status_id) = filters.status_id {
            query_builder = query_builder.bind(status_id);
        }
        let location_pattern;
        if let Some(location) = &filters.location {
            location_pattern = format!("%{}%", location);
            query_builder = query_builder.bind(location_pattern);
        }
        let search_pattern;
        if let Some(search) = &filters.search {
            search_pattern = format!("%{}%", search);
            query_builder = query_builder.bind(&search_pattern);
            query_builder = query_builder.bind(&search_pattern);
            query_builder = query_builder.bind(&search_pattern);
        }

        let count: i64 = query_builder.fetch_one(&self.db).await?.get(0);
        Ok(count)
    }

    /// 更新资产（在调用方的事务中执行；缺省字段保持不变）
    pub async fn update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        req: &UpdateAssetRequest,
    ) -> Result<Option<Asset>, AppError> {
        let asset = sqlx::query_as::<_, Asset>(
            r#"
            UPDATE assets
            SET
                category_id = COALESCE($2, category_id),
                status_id = COALESCE($3, status_id),
                asset_code = COALESCE($4, asset_code),
                serial_number = COALESCE($5, serial_number),
                hostname = COALESCE($6, hostname),
                location_region = COALESCE($7, location_region),
                assigned_user = COALESCE($8, assigned_user),
                previous_user = COALESCE($9, previous_user),
                office = COALESCE($10, office),
                ip_address = COALESCE($11, ip_address),
                po_number = COALESCE($12, po_number),
                ticket_number = COALESCE($13, ticket_number),
                installed_by = COALESCE($14, installed_by),
                replaced_by = COALESCE($15, replaced_by),
                replacement_date = COALESCE($16, replacement_date),
                delivered_at = COALESCE($17, delivered_at),
                remark = COALESCE($18, remark),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(req.category_id)
        .bind(req.status_id)
        .bind(&req.asset_code)
        .bind(&req.serial_number)
        .bind(&req.hostname)
        .bind(&req.location_region)
        .bind(&req.assigned_user)
        .bind(&req.previous_user)
        .bind(&req.office)
        .bind(&req.ip_address)
        .bind(&req.po_number)
        .bind(&req.ticket_number)
        .bind(&req.installed_by)
        .bind(req.replaced_by)
        .bind(req.replacement_date)
        .bind(req.delivered_at)
        .bind(&req.remark)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_unique_violation(e, "asset code or serial number already exists"))?;

        Ok(asset)
    }

    /// 软删除资产（在调用方的事务中执行）
    pub async fn soft_delete(&self, conn: &mut PgConnection, id: Uuid) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE assets SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .execute(&mut *conn)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 报表与导出用的联接快照
    pub async fn snapshots(&self, filters: &ReportFilters) -> Result<Vec<AssetSnapshot>, AppError> {
        let mut query = String::from(
            r#"
            SELECT a.id, a.asset_code, a.serial_number,
                   c.name AS category_name, s.name AS status_name,
                   a.location_region, a.hostname, a.assigned_user, a.previous_user,
                   a.office, a.ip_address, a.po_number, a.ticket_number, a.installed_by,
                   a.replaced_by, a.replacement_date, a.delivered_at, a.remark, a.created_at
            FROM assets a
            LEFT JOIN asset_categories c ON c.id = a.category_id
            LEFT JOIN asset_statuses s ON s.id = a.status_id
            WHERE a.deleted_at IS NULL
            "#,
        );
        let mut index = 0;

        if filters.category_id.is_some() {
            index += 1;
            query.push_str(&format!(" AND a.category_id = ${}", index));
        }
        if filters.status_id.is_some() {
            index += 1;
            query.push_str(&format!(" AND a.status_id = ${}", index));
        }
        if filters.date_from.is_some() {
            index += 1;
            query.push_str(&format!(" AND a.created_at >= ${}", index));
        }
        if filters.date_to.is_some() {
            index += 1;
            query.push_str(&format!(" AND a.created_at <= ${}", index));
        }

        query.push_str(" ORDER BY a.asset_code");

        let mut query_builder = sqlx::query_as::<_, AssetSnapshot>(&query);

        if let Some(category_id) = filters.category_id {
            query_builder = query_builder.bind(category_id);
        }
        if let Some(status_id) = filters.status_id {
            query_builder = query_builder.bind(status_id);
        }
        if let Some(date_from) = filters.date_from {
            query_builder = query_builder.bind(date_from);
        }
        if let Some(date_to) = filters.date_to {
            query_builder = query_builder.bind(date_to);
        }

        let snapshots = query_builder.fetch_all(&self.db).await?;

        Ok(snapshots)
    }
}
