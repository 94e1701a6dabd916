// ==========================================
// 工厂运营追溯核心 - SQLite 事件源（参考实现）
// ==========================================
// 职责: 以 rusqlite 实现 EventSource，供单机部署与集成测试使用
// 红线: 所有查询使用参数绑定；不含业务逻辑，只做取数与类型转换
// 说明: rusqlite 为阻塞调用，统一放到 spawn_blocking 中执行
// ==========================================

use crate::db::ConnectionManager;
use crate::domain::downtime::{BreakWindow, StoppageEvent};
use crate::domain::events::{ProductionEvent, ReworkEvent, RouteStage};
use crate::domain::unit::UnitRecord;
use crate::engine::time_utils::PlantClock;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::event_source::EventSource;
use async_trait::async_trait;
use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::Arc;

/// 单件追溯数据源名称
pub const TRACEABILITY_DESTINATION: &str = "traceability";

/// 停机数据源名称
pub const DOWNTIME_DESTINATION: &str = "downtime";

/// 停机日期粗筛的放宽天数
const STORED_DATE_SLACK_DAYS: u64 = 2;

// ==========================================
// SqliteEventSource
// ==========================================
pub struct SqliteEventSource {
    manager: Arc<ConnectionManager>,
    clock: PlantClock,
}

impl SqliteEventSource {
    /// 创建事件源
    ///
    /// `manager` 需配置 `traceability` 与 `downtime` 两个数据源。
    pub fn new(manager: Arc<ConnectionManager>, clock: PlantClock) -> Self {
        Self { manager, clock }
    }

    /// 在阻塞线程池中借出连接并执行查询
    async fn run<T, F>(&self, destination: &'static str, query: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &PlantClock) -> RepositoryResult<T> + Send + 'static,
    {
        let manager = Arc::clone(&self.manager);
        let clock = self.clock;
        tokio::task::spawn_blocking(move || {
            let conn = manager.acquire(destination)?;
            query(&conn, &clock)
        })
        .await?
    }
}

#[async_trait]
impl EventSource for SqliteEventSource {
    async fn fetch_production_events(&self, unit_id: &str) -> RepositoryResult<Vec<ProductionEvent>> {
        let unit_id = unit_id.to_string();
        self.run(TRACEABILITY_DESTINATION, move |conn, clock| {
            query_production_events(conn, clock, &unit_id)
        })
        .await
    }

    async fn fetch_rework_events(&self, unit_id: &str) -> RepositoryResult<Vec<ReworkEvent>> {
        let unit_id = unit_id.to_string();
        self.run(TRACEABILITY_DESTINATION, move |conn, clock| {
            query_rework_events(conn, clock, &unit_id)
        })
        .await
    }

    async fn fetch_route_stages(&self, unit_id: &str) -> RepositoryResult<Vec<RouteStage>> {
        let unit_id = unit_id.to_string();
        self.run(TRACEABILITY_DESTINATION, move |conn, clock| {
            query_route_stages(conn, clock, &unit_id)
        })
        .await
    }

    async fn fetch_stoppage_events(
        &self,
        location: &str,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> RepositoryResult<Vec<StoppageEvent>> {
        let location = location.to_string();
        self.run(DOWNTIME_DESTINATION, move |conn, clock| {
            query_stoppage_events(conn, clock, &location, &from, &to)
        })
        .await
    }

    async fn fetch_break_windows(&self, location: &str) -> RepositoryResult<Vec<BreakWindow>> {
        let location = location.to_string();
        self.run(DOWNTIME_DESTINATION, move |conn, _| {
            query_break_windows(conn, &location)
        })
        .await
    }

    async fn resolve_by_serial(&self, identifier: &str) -> RepositoryResult<Option<UnitRecord>> {
        let identifier = identifier.to_string();
        self.run(TRACEABILITY_DESTINATION, move |conn, _| {
            query_unit(
                conn,
                "SELECT unit_id, material_ref FROM unit WHERE serial_no = ?1",
                &identifier,
            )
        })
        .await
    }

    async fn resolve_by_alias(&self, identifier: &str) -> RepositoryResult<Option<UnitRecord>> {
        let identifier = identifier.to_string();
        self.run(TRACEABILITY_DESTINATION, move |conn, _| {
            query_unit(
                conn,
                r#"
                SELECT u.unit_id, u.material_ref
                FROM unit_alias a
                JOIN unit u ON u.unit_id = a.unit_id
                WHERE a.alias = ?1
                "#,
                &identifier,
            )
        })
        .await
    }

    async fn resolve_by_label_code(&self, identifier: &str) -> RepositoryResult<Option<UnitRecord>> {
        let identifier = identifier.to_string();
        self.run(TRACEABILITY_DESTINATION, move |conn, _| {
            query_unit(
                conn,
                r#"
                SELECT u.unit_id, u.material_ref
                FROM unit_label l
                JOIN unit u ON u.unit_id = l.unit_id
                WHERE l.label_code = ?1
                ORDER BY l.printed_at DESC
                LIMIT 1
                "#,
                &identifier,
            )
        })
        .await
    }
}

// ==========================================
// 同步查询（在阻塞线程中执行）
// ==========================================

fn parse_ts(clock: &PlantClock, field: &str, raw: &str) -> RepositoryResult<DateTime<FixedOffset>> {
    clock
        .parse(raw)
        .map_err(|_| RepositoryError::TimestampParseError {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

fn parse_opt_ts(
    clock: &PlantClock,
    field: &str,
    raw: Option<String>,
) -> RepositoryResult<Option<DateTime<FixedOffset>>> {
    raw.filter(|s| !s.trim().is_empty())
        .map(|s| parse_ts(clock, field, &s))
        .transpose()
}

fn parse_time_of_day(field: &str, raw: &str) -> RepositoryResult<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .map_err(|_| RepositoryError::TimestampParseError {
            field: field.to_string(),
            value: raw.to_string(),
        })
}

fn query_unit(conn: &Connection, sql: &str, identifier: &str) -> RepositoryResult<Option<UnitRecord>> {
    let record = conn
        .query_row(sql, params![identifier], |row| {
            Ok(UnitRecord {
                unit_id: row.get(0)?,
                material_ref: row.get(1)?,
            })
        })
        .optional()?;
    Ok(record)
}

fn query_production_events(
    conn: &Connection,
    clock: &PlantClock,
    unit_id: &str,
) -> RepositoryResult<Vec<ProductionEvent>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT unit_id, station, activity_type, event_ts, operator, checkpoint_info, method
        FROM production_event
        WHERE unit_id = ?1
        ORDER BY id ASC
        "#,
    )?;

    let raw = stmt
        .query_map(params![unit_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<String>>(6)?,
            ))
        })?
        .collect::<SqliteResult<Vec<_>>>()?;

    raw.into_iter()
        .map(
            |(unit_id, station, activity_type, event_ts, operator, checkpoint_info, method)| {
                Ok(ProductionEvent {
                    unit_id,
                    station,
                    activity_type,
                    timestamp: parse_ts(clock, "production_event.event_ts", &event_ts)?,
                    operator,
                    checkpoint_info,
                    method,
                })
            },
        )
        .collect()
}

fn query_rework_events(
    conn: &Connection,
    clock: &PlantClock,
    unit_id: &str,
) -> RepositoryResult<Vec<ReworkEvent>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT unit_id, route_seq_no, station, started_at, ended_at,
               defect, root_cause, resolution, operator
        FROM rework_event
        WHERE unit_id = ?1
        ORDER BY id ASC
        "#,
    )?;

    let raw = stmt
        .query_map(params![unit_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                [
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, Option<String>>(8)?,
                ],
            ))
        })?
        .collect::<SqliteResult<Vec<_>>>()?;

    raw.into_iter()
        .map(|(unit_id, route_seq_no, station, started_at, ended_at, texts)| {
            let [defect, root_cause, resolution, operator] = texts;
            Ok(ReworkEvent {
                unit_id,
                route_seq_no,
                station,
                started_at: parse_ts(clock, "rework_event.started_at", &started_at)?,
                ended_at: parse_opt_ts(clock, "rework_event.ended_at", ended_at)?,
                defect,
                root_cause,
                resolution,
                operator,
            })
        })
        .collect()
}

fn query_route_stages(
    conn: &Connection,
    clock: &PlantClock,
    unit_id: &str,
) -> RepositoryResult<Vec<RouteStage>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT unit_id, seq_no, station, checkpoints, started_on
        FROM route_stage
        WHERE unit_id = ?1
        ORDER BY seq_no ASC
        "#,
    )?;

    let raw = stmt
        .query_map(params![unit_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i32>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?
        .collect::<SqliteResult<Vec<_>>>()?;

    raw.into_iter()
        .map(|(unit_id, seq_no, station, checkpoints, started_on)| {
            Ok(RouteStage {
                unit_id,
                seq_no,
                station,
                checkpoints,
                started_on: parse_opt_ts(clock, "route_stage.started_on", started_on)?,
            })
        })
        .collect()
}

fn query_stoppage_events(
    conn: &Connection,
    clock: &PlantClock,
    location: &str,
    from: &DateTime<FixedOffset>,
    to: &DateTime<FixedOffset>,
) -> RepositoryResult<Vec<StoppageEvent>> {
    // 存储的时间戳偏移不一，精确范围过滤在归一化后进行
    let from_local = clock.normalize(from);
    let to_local = clock.normalize(to);

    // 按日期前缀粗筛，窗口外的行不解析；两端各放宽两天以覆盖任意存储偏移
    let lower = from_local
        .date()
        .checked_sub_days(Days::new(STORED_DATE_SLACK_DAYS))
        .unwrap_or(NaiveDate::MIN);
    let upper = to_local
        .date()
        .checked_add_days(Days::new(STORED_DATE_SLACK_DAYS))
        .unwrap_or(NaiveDate::MAX);

    let mut stmt = conn.prepare(
        r#"
        SELECT id, station, location, on_ts, off_ts
        FROM stoppage_event
        WHERE location = ?1 AND off_ts IS NOT NULL AND off_ts <> ''
          AND substr(ltrim(on_ts), 1, 10) BETWEEN ?2 AND ?3
        ORDER BY id ASC
        "#,
    )?;

    let raw = stmt
        .query_map(
            params![
                location,
                lower.format("%Y-%m-%d").to_string(),
                upper.format("%Y-%m-%d").to_string()
            ],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            },
        )?
        .collect::<SqliteResult<Vec<_>>>()?;

    let mut events = Vec::with_capacity(raw.len());
    for (id, station, location, on_ts, off_ts) in raw {
        let on = parse_ts(clock, "stoppage_event.on_ts", &on_ts)?;
        let on_local = clock.normalize(&on);
        if on_local < from_local || on_local >= to_local {
            continue;
        }
        events.push(StoppageEvent {
            id,
            station,
            location,
            on,
            off: parse_opt_ts(clock, "stoppage_event.off_ts", off_ts)?,
        });
    }
    Ok(events)
}

fn query_break_windows(conn: &Connection, location: &str) -> RepositoryResult<Vec<BreakWindow>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT name, location, start_of_day, end_of_day
        FROM break_window
        WHERE location = ?1
        ORDER BY start_of_day ASC, id ASC
        "#,
    )?;

    let raw = stmt
        .query_map(params![location], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?
        .collect::<SqliteResult<Vec<_>>>()?;

    raw.into_iter()
        .map(|(name, location, start, end)| {
            Ok(BreakWindow {
                name,
                location,
                start_of_day: parse_time_of_day("break_window.start_of_day", &start)?,
                end_of_day: parse_time_of_day("break_window.end_of_day", &end)?,
            })
        })
        .collect()
}
