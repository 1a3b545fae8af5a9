//! Reference catalog domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

/// Asset category
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AssetCategory {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Asset status
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AssetStatus {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create reference entry request (shared by categories and statuses)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateReferenceRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: String,
    pub description: Option<String>,
}

/// Update reference entry request
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateReferenceRequest {
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A resolved catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub name: String,
}

/// 类别与状态的只读查找视图
///
/// 名称解析是大小写不敏感的精确匹配，不做模糊匹配；
/// 解析失败由调用方视为硬校验失败。
#[derive(Debug, Clone)]
pub struct ReferenceCatalog {
    categories_by_id: HashMap<Uuid, CatalogEntry>,
    categories_by_name: HashMap<String, Uuid>,
    statuses_by_id: HashMap<Uuid, CatalogEntry>,
    statuses_by_name: HashMap<String, Uuid>,
}

impl ReferenceCatalog {
    pub fn new(categories: Vec<AssetCategory>, statuses: Vec<AssetStatus>) -> Self {
        let mut categories_by_id = HashMap::new();
        let mut categories_by_name = HashMap::new();
        for c in categories {
            categories_by_name.insert(c.name.to_lowercase(), c.id);
            categories_by_id.insert(c.id, CatalogEntry { id: c.id, name: c.name });
        }

        let mut statuses_by_id = HashMap::new();
        let mut statuses_by_name = HashMap::new();
        for s in statuses {
            statuses_by_name.insert(s.name.to_lowercase(), s.id);
            statuses_by_id.insert(s.id, CatalogEntry { id: s.id, name: s.name });
        }

        Self {
            categories_by_id,
            categories_by_name,
            statuses_by_id,
            statuses_by_name,
        }
    }

    /// 按 id 或名称解析类别
    pub fn resolve_category(&self, name_or_id: &str) -> Option<&CatalogEntry> {
        Self::resolve(&self.categories_by_id, &self.categories_by_name, name_or_id)
    }

    /// 按 id 或名称解析状态
    pub fn resolve_status(&self, name_or_id: &str) -> Option<&CatalogEntry> {
        Self::resolve(&self.statuses_by_id, &self.statuses_by_name, name_or_id)
    }

    fn resolve<'a>(
        by_id: &'a HashMap<Uuid, CatalogEntry>,
        by_name: &HashMap<String, Uuid>,
        name_or_id: &str,
    ) -> Option<&'a CatalogEntry> {
        let key = name_or_id.trim();
        if key.is_empty() {
            return None;
        }
        if let Ok(id) = Uuid::parse_str(key) {
            if let Some(entry) = by_id.get(&id) {
                return Some(entry);
            }
        }
        by_name.get(&key.to_lowercase()).and_then(|id| by_id.get(id))
    }

    /// 全部类别名称（排序后，用于导入模板）
    pub fn category_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.categories_by_id.values().map(|e| e.name.clone()).collect();
        names.sort();
        names
    }

    /// 全部状态名称（排序后，用于导入模板）
    pub fn status_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.statuses_by_id.values().map(|e| e.name.clone()).collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str) -> AssetCategory {
        AssetCategory {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn status(name: &str) -> AssetStatus {
        AssetStatus {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_resolve_by_name_case_insensitive() {
        let catalog = ReferenceCatalog::new(vec![category("Laptop")], vec![status("Active")]);

        assert_eq!(catalog.resolve_category("laptop").unwrap().name, "Laptop");
        assert_eq!(catalog.resolve_category("LAPTOP").unwrap().name, "Laptop");
        assert_eq!(catalog.resolve_status(" active ").unwrap().name, "Active");
    }

    #[test]
    fn test_resolve_is_exact_not_fuzzy() {
        let catalog = ReferenceCatalog::new(vec![category("Laptop")], vec![status("Active")]);

        // 前缀或部分匹配必须失败
        assert!(catalog.resolve_category("Lap").is_none());
        assert!(catalog.resolve_category("Laptops").is_none());
        assert!(catalog.resolve_status("Act").is_none());
    }

    #[test]
    fn test_resolve_by_id() {
        let laptop = category("Laptop");
        let id = laptop.id;
        let catalog = ReferenceCatalog::new(vec![laptop], vec![]);

        assert_eq!(catalog.resolve_category(&id.to_string()).unwrap().name, "Laptop");
        // 未登记的 id 解析失败
        assert!(catalog.resolve_category(&Uuid::new_v4().to_string()).is_none());
    }

    #[test]
    fn test_resolve_empty_is_none() {
        let catalog = ReferenceCatalog::new(vec![category("Laptop")], vec![]);
        assert!(catalog.resolve_category("").is_none());
        assert!(catalog.resolve_category("   ").is_none());
    }
}
