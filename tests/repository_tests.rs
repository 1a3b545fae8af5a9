//! 仓库与服务层集成测试
//!
//! 这些测试需要真实的 PostgreSQL 实例，通过 TEST_DATABASE_URL 指定，
//! 默认忽略。运行方式：
//!     TEST_DATABASE_URL=postgresql://... cargo test -- --ignored --test-threads=1

use itam_system::models::asset::{AssetListFilters, CreateAssetRequest, UpdateAssetRequest};
use itam_system::models::import::{ImportRequest, NewAssetRow};
use itam_system::models::ticket::{CreateTicketRequest, TicketPriority};
use itam_system::repository::{AssetRepository, TicketRepository};
use itam_system::services::{AssetService, CatalogService, ImportService, TicketService};

mod common;
use common::{create_test_config, seed_category, seed_status, setup_test_db};

fn create_request(
    category_id: uuid::Uuid,
    status_id: uuid::Uuid,
    code: &str,
    serial: &str,
) -> CreateAssetRequest {
    CreateAssetRequest {
        category_id,
        status_id,
        asset_code: code.to_string(),
        serial_number: serial.to_string(),
        hostname: None,
        location_region: "Jakarta".to_string(),
        assigned_user: Some("Alice".to_string()),
        previous_user: None,
        office: None,
        ip_address: None,
        po_number: None,
        ticket_number: None,
        installed_by: None,
        replaced_by: None,
        replacement_date: None,
        delivered_at: None,
        remark: None,
        changed_by: "tester".to_string(),
    }
}

fn empty_update(changed_by: &str) -> UpdateAssetRequest {
    UpdateAssetRequest {
        category_id: None,
        status_id: None,
        asset_code: None,
        serial_number: None,
        hostname: None,
        location_region: None,
        assigned_user: None,
        previous_user: None,
        office: None,
        ip_address: None,
        po_number: None,
        ticket_number: None,
        installed_by: None,
        replaced_by: None,
        replacement_date: None,
        delivered_at: None,
        remark: None,
        changed_by: changed_by.to_string(),
    }
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance via TEST_DATABASE_URL"]
async fn test_create_asset_writes_created_history() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;

    let category = seed_category(&pool, "Laptop").await;
    let status = seed_status(&pool, "Active").await;

    let service = AssetService::new(pool.clone());
    let asset = service
        .create(&create_request(category.id, status.id, "LAP-001", "SN-1"))
        .await
        .unwrap();

    let history = service.history(asset.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].changed_field, "created");
    assert_eq!(history[0].changed_by, "tester");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance via TEST_DATABASE_URL"]
async fn test_duplicate_asset_code_is_rejected() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;

    let category = seed_category(&pool, "Laptop").await;
    let status = seed_status(&pool, "Active").await;

    let service = AssetService::new(pool.clone());
    service
        .create(&create_request(category.id, status.id, "LAP-001", "SN-1"))
        .await
        .unwrap();

    // 相同编码、不同序列号：第二次创建必须失败
    let result = service
        .create(&create_request(category.id, status.id, "LAP-001", "SN-2"))
        .await;

    let err = result.unwrap_err();
    assert_eq!(err.code(), 400);
    assert!(err.user_message().contains("LAP-001"));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance via TEST_DATABASE_URL"]
async fn test_update_records_one_history_row_per_changed_field() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;

    let category = seed_category(&pool, "Laptop").await;
    let status = seed_status(&pool, "Active").await;

    let service = AssetService::new(pool.clone());
    let asset = service
        .create(&create_request(category.id, status.id, "LAP-001", "SN-1"))
        .await
        .unwrap();

    let mut req = empty_update("bob");
    req.assigned_user = Some("Bob".to_string());
    req.hostname = Some("LAPTOP-BOB".to_string());
    // 与原值相同，不应产生记录
    req.location_region = Some("Jakarta".to_string());

    service.update(asset.id, &req).await.unwrap();

    let history = service.history(asset.id).await.unwrap();
    // created + assigned_user + hostname
    assert_eq!(history.len(), 3);
    let fields: Vec<&str> = history.iter().map(|h| h.changed_field.as_str()).collect();
    assert!(fields.contains(&"assigned_user"));
    assert!(fields.contains(&"hostname"));
    assert!(!fields.contains(&"location_region"));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance via TEST_DATABASE_URL"]
async fn test_history_is_ordered_newest_first() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;

    let category = seed_category(&pool, "Laptop").await;
    let status = seed_status(&pool, "Active").await;

    let service = AssetService::new(pool.clone());
    let asset = service
        .create(&create_request(category.id, status.id, "LAP-001", "SN-1"))
        .await
        .unwrap();

    let mut req = empty_update("bob");
    req.assigned_user = Some("Bob".to_string());
    service.update(asset.id, &req).await.unwrap();

    let history = service.history(asset.id).await.unwrap();
    assert!(history.len() >= 2);
    for window in history.windows(2) {
        assert!(window[0].changed_at >= window[1].changed_at);
    }
    assert_eq!(history.last().unwrap().changed_field, "created");
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance via TEST_DATABASE_URL"]
async fn test_uncommitted_transaction_leaves_no_rows() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;

    let category = seed_category(&pool, "Laptop").await;
    let status = seed_status(&pool, "Active").await;

    let repo = AssetRepository::new(pool.clone());

    let row = NewAssetRow {
        category_id: category.id,
        status_id: status.id,
        asset_code: "LAP-TX".to_string(),
        serial_number: "SN-TX".to_string(),
        location_region: "Jakarta".to_string(),
        hostname: None,
        assigned_user: None,
        previous_user: None,
        office: None,
        ip_address: None,
        po_number: None,
        ticket_number: None,
        installed_by: None,
        replaced_by: None,
        replacement_date: None,
        delivered_at: None,
        remark: None,
    };

    // 事务中写入实体后放弃提交：实体和历史都不应落库
    {
        let mut tx = pool.begin().await.unwrap();
        repo.insert(&mut tx, &row).await.unwrap();
        tx.rollback().await.unwrap();
    }

    assert!(!repo.code_in_use("LAP-TX", None).await.unwrap());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance via TEST_DATABASE_URL"]
async fn test_delete_blocked_by_open_ticket() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;

    let category = seed_category(&pool, "Laptop").await;
    let status = seed_status(&pool, "Active").await;

    let asset_service = AssetService::new(pool.clone());
    let asset = asset_service
        .create(&create_request(category.id, status.id, "LAP-001", "SN-1"))
        .await
        .unwrap();

    let ticket_service = TicketService::new(pool.clone());
    ticket_service
        .create(&CreateTicketRequest {
            asset_id: Some(asset.id),
            technician: None,
            title: "Replace keyboard".to_string(),
            description: None,
            priority: TicketPriority::Medium,
            due_date: None,
            cost: None,
            estimated_hours: None,
        })
        .await
        .unwrap();

    let err = asset_service.delete(asset.id, "tester").await.unwrap_err();
    assert_eq!(err.code(), 409);

    // 资产仍然可读
    assert!(asset_service.get(asset.id).await.is_ok());
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance via TEST_DATABASE_URL"]
async fn test_deleted_asset_keeps_history_and_frees_code() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;

    let category = seed_category(&pool, "Laptop").await;
    let status = seed_status(&pool, "Active").await;

    let service = AssetService::new(pool.clone());
    let asset = service
        .create(&create_request(category.id, status.id, "LAP-001", "SN-1"))
        .await
        .unwrap();

    service.delete(asset.id, "admin").await.unwrap();

    // 实体不可读，但历史仍可查询，最新一条是删除记录
    assert_eq!(service.get(asset.id).await.unwrap_err().code(), 404);
    let history = service.history(asset.id).await.unwrap();
    assert_eq!(history[0].changed_field, "deleted");

    // 编码可被新资产复用
    service
        .create(&create_request(category.id, status.id, "LAP-001", "SN-2"))
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance via TEST_DATABASE_URL"]
async fn test_category_delete_blocked_while_referenced() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;

    let category = seed_category(&pool, "Laptop").await;
    let status = seed_status(&pool, "Active").await;

    let asset_service = AssetService::new(pool.clone());
    asset_service
        .create(&create_request(category.id, status.id, "LAP-001", "SN-1"))
        .await
        .unwrap();

    let catalog_service = CatalogService::new(pool.clone());
    let err = catalog_service.delete_category(category.id).await.unwrap_err();
    assert_eq!(err.code(), 409);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance via TEST_DATABASE_URL"]
async fn test_import_commits_all_or_nothing() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;

    seed_category(&pool, "Laptop").await;
    seed_status(&pool, "Active").await;

    let import_service = ImportService::new(pool.clone(), 1000);
    let header: Vec<String> =
        ["Asset Code", "Asset Type", "Serial Number", "Location/Region", "Status"]
            .iter()
            .map(|s| s.to_string())
            .collect();

    // 一行非法：整批不提交
    let req = ImportRequest {
        header: header.clone(),
        rows: vec![
            vec!["LAP-001".into(), "Laptop".into(), "SN-1".into(), "Jakarta".into(), "Active".into()],
            vec!["LAP-002".into(), "NoSuchType".into(), "SN-2".into(), "Jakarta".into(), "Active".into()],
        ],
        changed_by: "importer".to_string(),
    };
    let outcome = import_service.import(&req).await.unwrap();
    assert!(!outcome.committed);
    assert_eq!(outcome.errors.len(), 1);

    let repo = AssetRepository::new(pool.clone());
    assert!(!repo.code_in_use("LAP-001", None).await.unwrap());

    // 全部合法：整批提交，并带上 created 历史
    let req = ImportRequest {
        header,
        rows: vec![
            vec!["LAP-001".into(), "Laptop".into(), "SN-1".into(), "Jakarta".into(), "Active".into()],
            vec!["LAP-002".into(), "Laptop".into(), "SN-2".into(), "Jakarta".into(), "Active".into()],
        ],
        changed_by: "importer".to_string(),
    };
    let outcome = import_service.import(&req).await.unwrap();
    assert!(outcome.committed);
    assert_eq!(outcome.imported, 2);

    let filters = AssetListFilters::default();
    assert_eq!(repo.count(&filters).await.unwrap(), 2);
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance via TEST_DATABASE_URL"]
async fn test_import_rejects_persisted_duplicate_at_accept_time() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;

    let category = seed_category(&pool, "Laptop").await;
    let status = seed_status(&pool, "Active").await;

    let asset_service = AssetService::new(pool.clone());
    asset_service
        .create(&create_request(category.id, status.id, "LAP-001", "SN-1"))
        .await
        .unwrap();

    let import_service = ImportService::new(pool.clone(), 1000);
    let req = ImportRequest {
        header: ["Asset Code", "Asset Type", "Serial Number", "Location/Region", "Status"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        rows: vec![vec![
            "LAP-001".into(),
            "Laptop".into(),
            "SN-9".into(),
            "Jakarta".into(),
            "Active".into(),
        ]],
        changed_by: "importer".to_string(),
    };

    let outcome = import_service.import(&req).await.unwrap();
    assert!(!outcome.committed);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].row, 2);
    assert!(outcome.errors[0].message.contains("already exists"));
}

#[tokio::test]
#[ignore = "requires a PostgreSQL instance via TEST_DATABASE_URL"]
async fn test_ticket_numbers_are_year_prefixed_sequence() {
    let config = create_test_config();
    let pool = setup_test_db(&config).await;

    let service = TicketService::new(pool.clone());
    let request = || CreateTicketRequest {
        asset_id: None,
        technician: None,
        title: "Install license".to_string(),
        description: None,
        priority: TicketPriority::Low,
        due_date: None,
        cost: None,
        estimated_hours: None,
    };

    let first = service.create(&request()).await.unwrap();
    let second = service.create(&request()).await.unwrap();

    let year = chrono::Datelike::year(&chrono::Utc::now());
    assert_eq!(first.ticket_number, format!("TKT-{}-0001", year));
    assert_eq!(second.ticket_number, format!("TKT-{}-0002", year));

    let repo = TicketRepository::new(pool.clone());
    assert_eq!(repo.count_open_for_asset(uuid::Uuid::new_v4()).await.unwrap(), 0);
}
