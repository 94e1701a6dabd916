// ==========================================
// SqliteEventSource 集成测试
// ==========================================
// 测试目标: 参考事件源的取数、时间戳解析、范围过滤
// ==========================================


use chrono::{DateTime, NaiveTime, Timelike};
use factory_trace::engine::PlantClock;
use factory_trace::repository::{EventSource, RepositoryError};
use test_helpers::*;

fn ts(raw: &str) -> DateTime<chrono::FixedOffset> {
    DateTime::parse_from_rfc3339(raw).unwrap()
}

#[tokio::test]
async fn test_resolve_each_identifier_space() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    insert_unit(&conn, "U-1", "SN-1", Some("MDL-A")).unwrap();
    insert_unit(&conn, "U-2", "SN-2", None).unwrap();
    insert_alias(&conn, "ALIAS-1", "U-1").unwrap();
    insert_label(&conn, "LBL-9", "U-1", "2024-03-01 08:00:00").unwrap();
    insert_label(&conn, "LBL-9", "U-2", "2024-03-02 08:00:00").unwrap();

    let source = sqlite_source(&db_path);

    let serial = source.resolve_by_serial("SN-1").await.unwrap().unwrap();
    assert_eq!(serial.unit_id, "U-1");
    assert_eq!(serial.material_ref.as_deref(), Some("MDL-A"));

    let alias = source.resolve_by_alias("ALIAS-1").await.unwrap().unwrap();
    assert_eq!(alias.unit_id, "U-1");

    // 同一标签码重打时以最近一次打印为准
    let label = source.resolve_by_label_code("LBL-9").await.unwrap().unwrap();
    assert_eq!(label.unit_id, "U-2");

    assert!(source.resolve_by_serial("ALIAS-1").await.unwrap().is_none());
}

#[tokio::test]
async fn test_identifier_is_bound_not_interpolated() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    insert_unit(&conn, "U-1", "SN-1", None).unwrap();

    let source = sqlite_source(&db_path);
    let hostile = "SN-1' OR '1'='1";
    assert!(source.resolve_by_serial(hostile).await.unwrap().is_none());
    assert!(source.resolve_by_alias(hostile).await.unwrap().is_none());
}

#[tokio::test]
async fn test_fetch_unit_events_with_mixed_timestamp_formats() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    insert_unit(&conn, "U-1", "SN-1", None).unwrap();
    insert_production(&conn, "U-1", "ST-01", "COMPLETE", "2024-03-01 08:00:00").unwrap();
    insert_production(&conn, "U-1", "ST-02", "COMPLETE", "2024-03-01T01:30:00Z").unwrap();
    insert_rework(&conn, "U-1", 3, "ST-03", "2024-03-01T10:00:00+08:00", None).unwrap();
    insert_route_stage(&conn, "U-1", 4, "ST-04", None).unwrap();
    insert_route_stage(&conn, "U-1", 2, "ST-02", Some("2024-03-01 09:00")).unwrap();

    let source = sqlite_source(&db_path);
    let clock = PlantClock::default();

    let production = source.fetch_production_events("U-1").await.unwrap();
    assert_eq!(production.len(), 2);
    // 不带偏移的文本按工厂本地时间解释
    assert_eq!(clock.normalize(&production[0].timestamp).hour(), 8);
    // UTC 01:30 = 本地 09:30
    assert_eq!(clock.normalize(&production[1].timestamp).hour(), 9);

    let rework = source.fetch_rework_events("U-1").await.unwrap();
    assert_eq!(rework.len(), 1);
    assert!(rework[0].is_open());
    assert_eq!(rework[0].defect.as_deref(), Some("SCRATCH"));

    let route = source.fetch_route_stages("U-1").await.unwrap();
    let seqs: Vec<i32> = route.iter().map(|s| s.seq_no).collect();
    assert_eq!(seqs, vec![2, 4]);
    assert!(route[0].is_started());
    assert!(!route[1].is_started());

    assert!(source.fetch_production_events("U-404").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_bad_timestamp_is_reported_as_parse_error() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    insert_production(&conn, "U-1", "ST-01", "COMPLETE", "yesterday-ish").unwrap();

    let source = sqlite_source(&db_path);
    let err = source.fetch_production_events("U-1").await.unwrap_err();
    assert!(matches!(err, RepositoryError::TimestampParseError { .. }));
}

#[tokio::test]
async fn test_stoppage_range_filter_uses_normalized_time() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    insert_stoppage(&conn, 1, "S1", "LINE-A", "2024-03-01 08:00:00", Some("2024-03-01 09:00:00")).unwrap();
    // 本地 09:30，偏移存储为 UTC
    insert_stoppage(&conn, 2, "S1", "LINE-A", "2024-03-01T01:30:00Z", Some("2024-03-01T02:00:00Z")).unwrap();
    // 未结束
    insert_stoppage(&conn, 3, "S2", "LINE-A", "2024-03-01 10:00:00", None).unwrap();
    // 等于 to，半开区间外
    insert_stoppage(&conn, 4, "S2", "LINE-A", "2024-03-01 12:00:00", Some("2024-03-01 12:30:00")).unwrap();
    // 其他区域
    insert_stoppage(&conn, 5, "S9", "LINE-B", "2024-03-01 08:00:00", Some("2024-03-01 09:00:00")).unwrap();

    let source = sqlite_source(&db_path);
    let events = source
        .fetch_stoppage_events(
            "LINE-A",
            ts("2024-03-01T08:00:00+08:00"),
            ts("2024-03-01T12:00:00+08:00"),
        )
        .await
        .unwrap();

    let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn test_malformed_stoppage_outside_window_does_not_abort() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    // 早年的脏数据，不在查询窗口内
    insert_stoppage(&conn, 1, "S1", "LINE-A", "1999-01-01 xx:yy", Some("1999-01-01 01:00:00")).unwrap();
    // UTC 前一日 23:30 = 本地 07:30
    insert_stoppage(&conn, 2, "S1", "LINE-A", "2024-02-29T23:30:00Z", Some("2024-03-01T00:10:00Z")).unwrap();
    insert_stoppage(&conn, 3, "S2", "LINE-A", "2024-03-01 09:00:00", Some("2024-03-01 09:20:00")).unwrap();

    let source = sqlite_source(&db_path);
    let from = ts("2024-03-01T07:00:00+08:00");
    let to = ts("2024-03-01T12:00:00+08:00");
    let events = source.fetch_stoppage_events("LINE-A", from, to).await.unwrap();
    let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![2, 3]);

    // 窗口内的脏数据仍然报错
    insert_stoppage(&conn, 4, "S2", "LINE-A", "2024-03-01 25:99:00", Some("2024-03-01 10:00:00")).unwrap();
    let err = source.fetch_stoppage_events("LINE-A", from, to).await.unwrap_err();
    assert!(matches!(err, RepositoryError::TimestampParseError { ref value, .. } if value == "2024-03-01 25:99:00"));
}

#[tokio::test]
async fn test_break_windows_accept_both_time_formats() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    insert_break(&conn, "LINE-A", "LUNCH", "12:00", "12:30:00").unwrap();
    insert_break(&conn, "LINE-A", "NIGHT", "23:45", "00:15").unwrap();
    insert_break(&conn, "LINE-B", "LUNCH", "11:30", "12:00").unwrap();

    let source = sqlite_source(&db_path);
    let windows = source.fetch_break_windows("LINE-A").await.unwrap();
    assert_eq!(windows.len(), 2);
    assert_eq!(windows[0].name, "LUNCH");
    assert_eq!(windows[0].end_of_day, NaiveTime::from_hms_opt(12, 30, 0).unwrap());
    assert_eq!(windows[1].start_of_day, NaiveTime::from_hms_opt(23, 45, 0).unwrap());
}

#[tokio::test]
async fn test_concurrent_fetches_share_the_manager() {
    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let conn = open_test_connection(&db_path).unwrap();
    insert_unit(&conn, "U-1", "SN-1", None).unwrap();
    insert_production(&conn, "U-1", "ST-01", "COMPLETE", "2024-03-01 08:00:00").unwrap();

    let source = sqlite_source(&db_path);
    let (a, b, c) = futures::try_join!(
        source.fetch_production_events("U-1"),
        source.fetch_rework_events("U-1"),
        source.fetch_route_stages("U-1"),
    )
    .unwrap();
    assert_eq!(a.len(), 1);
    assert!(b.is_empty());
    assert!(c.is_empty());
}
