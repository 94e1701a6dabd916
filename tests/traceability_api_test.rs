// ==========================================
// TraceabilityApi 集成测试
// ==========================================
// 测试目标: 标识解析 -> 取数 -> 时间线 / 检查点，端到端
// ==========================================


use std::sync::Arc;

use factory_trace::api::{ApiError, TraceabilityApi};
use factory_trace::config::CheckpointCatalog;
use factory_trace::domain::{CheckpointDefinition, IdentifierSpace, UnitRecord};
use factory_trace::engine::PlantClock;
use factory_trace::repository::{EventSource, MemoryEventSource};
use factory_trace::{CheckpointState, TimelineResult, TimelineStatus};
use test_helpers::*;

fn catalog() -> CheckpointCatalog {
    CheckpointCatalog::new(vec![
        CheckpointDefinition::new("LABEL_PRINT", ["ST-01"], "COMPLETE"),
        CheckpointDefinition::new("FINAL_QA", ["QA-01", "QA-02"], "PASS"),
    ])
}

fn api_for(db_path: &str) -> TraceabilityApi {
    let source: Arc<dyn EventSource> = sqlite_source(db_path);
    TraceabilityApi::new(source, PlantClock::default(), catalog())
}

/// 两条生产事件 + 一次返修（锚定工序 3）+ 工序 2 已开工、工序 4 未开工
fn seed_reworked_unit(db_path: &str) {
    let conn = open_test_connection(db_path).unwrap();
    insert_unit(&conn, "U-100", "SN-100", Some("MDL-A")).unwrap();
    insert_alias(&conn, "CUST-100", "U-100").unwrap();
    insert_production(&conn, "U-100", "ST-01", "COMPLETE", "2024-03-01 08:00:00").unwrap();
    insert_production(&conn, "U-100", "ST-02", "complete", "2024-03-01T09:00:00+08:00").unwrap();
    insert_rework(
        &conn,
        "U-100",
        3,
        "ST-03",
        "2024-03-01 10:00:00",
        Some("2024-03-01 11:00:00"),
    )
    .unwrap();
    insert_route_stage(&conn, "U-100", 2, "ST-02", Some("2024-03-01 09:00:00")).unwrap();
    insert_route_stage(&conn, "U-100", 4, "ST-04", None).unwrap();
}

#[tokio::test]
async fn test_reworked_unit_timeline_ends_with_single_pending_stage() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_reworked_unit(&db_path);

    let report = api_for(&db_path).get_unit_timeline("SN-100").await.unwrap();

    assert_eq!(report.unit.unit_id, "U-100");
    assert_eq!(report.unit.matched_space, IdentifierSpace::Serial);
    assert_eq!(report.rows.len(), 4);

    let statuses: Vec<String> = report.rows.iter().map(|r| r.status.to_string()).collect();
    assert_eq!(statuses, vec!["ST-01", "ST-02", "REWORK", "PENDING"]);

    let last = report.rows.last().unwrap();
    assert_eq!(last.activity, "ST-04");
    assert!(last.timestamp.is_none());
    assert_eq!(last.result, TimelineResult::Waiting);
    assert!(!report
        .rows
        .iter()
        .any(|r| r.status.is_pending() && r.activity == "ST-02"));

    let rework = &report.rows[2];
    assert_eq!(rework.issue.as_deref(), Some("SCRATCH"));
    assert_eq!(rework.action.as_deref(), Some("POLISH"));
    assert!(rework.action_timestamp.is_some());

    assert_eq!(report.current_stage(), Some(&TimelineStatus::Rework));
    let seqs: Vec<usize> = report.rows.iter().map(|r| r.seq_no).collect();
    assert_eq!(seqs, vec![1, 2, 3, 4]);
    assert!(report.anomalies.is_empty());
}

#[tokio::test]
async fn test_alias_resolves_to_same_timeline() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_reworked_unit(&db_path);

    let api = api_for(&db_path);
    let by_serial = api.get_unit_timeline("SN-100").await.unwrap();
    let by_alias = api.get_unit_timeline("  CUST-100 ").await.unwrap();

    assert_eq!(by_alias.unit.matched_space, IdentifierSpace::Alias);
    assert_eq!(by_alias.unit.matched_identifier, "CUST-100");
    assert_eq!(by_serial.rows, by_alias.rows);
}

#[tokio::test]
async fn test_unknown_identifier_is_not_found() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_reworked_unit(&db_path);

    let err = api_for(&db_path).get_unit_timeline("NOPE-1").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(ref id) if id == "NOPE-1"));
}

#[tokio::test]
async fn test_blank_identifier_is_rejected_before_lookup() {
    let source = Arc::new(MemoryEventSource::new());
    let api = TraceabilityApi::new(source.clone(), PlantClock::default(), catalog());

    let err = api.resolve_unit("   ").await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(source.call_count(), 0);
}

#[tokio::test]
async fn test_resolved_unit_without_events_has_empty_timeline() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    insert_unit(&conn, "U-200", "SN-200", None).unwrap();

    let report = api_for(&db_path).get_unit_timeline("SN-200").await.unwrap();
    assert!(report.is_empty());
    assert!(report.current_stage().is_none());
}

#[tokio::test]
async fn test_checkpoint_status_from_catalog() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_reworked_unit(&db_path);

    let api = api_for(&db_path);
    let unit = api.resolve_unit("SN-100").await.unwrap();
    let status = api.checkpoint_status(&unit).await.unwrap();

    let names: Vec<&str> = status.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["FINAL_QA", "LABEL_PRINT"]);

    let label = &status["LABEL_PRINT"];
    assert_eq!(label.state, CheckpointState::Scanned);
    assert_eq!(
        label.last_timestamp.map(|t| t.to_string()).as_deref(),
        Some("2024-03-01 08:00:00")
    );

    let qa = &status["FINAL_QA"];
    assert_eq!(qa.state, CheckpointState::NotScanned);
    assert!(qa.last_timestamp.is_none());
}

#[tokio::test]
async fn test_upstream_failure_is_not_reported_as_not_found() {
    let source = Arc::new(MemoryEventSource::new());
    source
        .add_serial(
            "SN-1",
            UnitRecord {
                unit_id: "U-1".to_string(),
                material_ref: None,
            },
        )
        .unwrap();
    let api = TraceabilityApi::new(source.clone(), PlantClock::default(), catalog());
    let unit = api.resolve_unit("SN-1").await.unwrap();

    source.fail_all(true);
    assert!(matches!(
        api.resolve_unit("SN-1").await.unwrap_err(),
        ApiError::Upstream(_)
    ));
    assert!(matches!(
        api.build_timeline(&unit).await.unwrap_err(),
        ApiError::Upstream(_)
    ));
}
