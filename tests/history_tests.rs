//! 变更历史单元测试
//!
//! 覆盖字段差异的最小性、Created/Deleted 的固定形态，以及
//! 快照归一化后的往返比较

use chrono::{NaiveDate, Utc};
use itam_system::models::asset::{Asset, UpdateAssetRequest};
use itam_system::models::history::ChangeKind;
use itam_system::services::history_service::{build_records, diff_snapshots};
use uuid::Uuid;

fn sample_asset() -> Asset {
    Asset {
        id: Uuid::new_v4(),
        category_id: Uuid::new_v4(),
        status_id: Uuid::new_v4(),
        asset_code: "LAP-001".to_string(),
        serial_number: "SN-0001".to_string(),
        hostname: Some("LAPTOP-ALICE".to_string()),
        location_region: "Jakarta".to_string(),
        assigned_user: Some("Alice".to_string()),
        previous_user: None,
        office: None,
        ip_address: Some("192.168.1.10".to_string()),
        po_number: None,
        ticket_number: None,
        installed_by: None,
        replaced_by: None,
        replacement_date: None,
        delivered_at: Some(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()),
        remark: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
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

#[test]
fn test_diff_minimality_one_record_per_changed_field() {
    let asset = sample_asset();

    // 两个字段提供，只有一个实际变化
    let mut req = empty_update("tester");
    req.assigned_user = Some("Bob".to_string());
    req.location_region = Some("Jakarta".to_string()); // 与原值相同

    let changes = diff_snapshots(&asset.field_snapshot(), &req.field_snapshot());

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].field, "assigned_user");
    assert_eq!(changes[0].old.as_deref(), Some("Alice"));
    assert_eq!(changes[0].new.as_deref(), Some("Bob"));
}

#[test]
fn test_diff_absent_fields_produce_no_records() {
    let asset = sample_asset();
    let req = empty_update("tester");

    // 请求中没有任何字段，不应产生差异
    let changes = diff_snapshots(&asset.field_snapshot(), &req.field_snapshot());
    assert!(changes.is_empty());
}

#[test]
fn test_diff_null_to_value_counts_as_change() {
    let asset = sample_asset();

    let mut req = empty_update("tester");
    req.office = Some("HQ Floor 2".to_string());

    let changes = diff_snapshots(&asset.field_snapshot(), &req.field_snapshot());
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].field, "office");
    assert_eq!(changes[0].old, None);
}

#[test]
fn test_diff_dates_compare_in_normalized_form() {
    let asset = sample_asset();

    // 同一日期往返写回，不应记一条变更
    let mut req = empty_update("tester");
    req.delivered_at = Some(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());

    let changes = diff_snapshots(&asset.field_snapshot(), &req.field_snapshot());
    assert!(changes.is_empty());

    // 不同日期则记一条
    let mut req = empty_update("tester");
    req.delivered_at = Some(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());

    let changes = diff_snapshots(&asset.field_snapshot(), &req.field_snapshot());
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].old.as_deref(), Some("2026-01-15"));
    assert_eq!(changes[0].new.as_deref(), Some("2026-03-01"));
}

#[test]
fn test_created_shape_is_single_record_regardless_of_fields() {
    let records = build_records(Uuid::new_v4(), ChangeKind::Created, &[], "importer", Utc::now());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].changed_field, "created");
    assert_eq!(records[0].old_value, None);
    assert_eq!(records[0].new_value, "Asset created");
}

#[test]
fn test_deleted_shape_is_single_record() {
    let records = build_records(Uuid::new_v4(), ChangeKind::Deleted, &[], "admin", Utc::now());

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].changed_field, "deleted");
    assert_eq!(records[0].old_value.as_deref(), Some("Asset exists"));
    assert_eq!(records[0].new_value, "Asset deleted");
}

#[test]
fn test_update_records_carry_actor_and_field_note() {
    let asset = sample_asset();
    let mut req = empty_update("carol");
    req.hostname = Some("LAPTOP-BOB".to_string());
    req.assigned_user = Some("Bob".to_string());

    let changes = diff_snapshots(&asset.field_snapshot(), &req.field_snapshot());
    let records = build_records(asset.id, ChangeKind::Updated, &changes, &req.changed_by, Utc::now());

    assert_eq!(records.len(), 2);
    for record in &records {
        assert_eq!(record.changed_by, "carol");
        assert_eq!(
            record.note.as_deref(),
            Some(format!("Field {} updated", record.changed_field).as_str())
        );
    }
}
