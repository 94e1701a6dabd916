// ==========================================
// 工厂运营追溯核心 - CSV 导出
// ==========================================
// 时间统一按工厂本地时间输出: YYYY-MM-DD HH:MM:SS
// 空值输出为空单元格
// ==========================================

use std::io::Write;

use chrono::NaiveDateTime;
use csv::Writer;

use crate::domain::downtime::DowntimeReport;
use crate::domain::timeline::TimelineReport;
use crate::export::error::ExportResult;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// CSV 表头（中文列名）
const TIMELINE_HEADER: &[&str] = &[
    "序号",
    "时间",
    "作业",
    "状态",
    "检查点",
    "方式",
    "操作员",
    "问题",
    "处置时间",
    "处置",
    "结果",
];

const DETAIL_HEADER: &[&str] = &[
    "工位",
    "序号",
    "事件ID",
    "日期",
    "停机时刻",
    "恢复时刻",
    "休息扣除(秒)",
    "净停机(秒)",
    "净停机",
];

const SUMMARY_HEADER: &[&str] = &["工位", "停机次数", "净停机(秒)", "净停机合计"];

fn fmt_ts(ts: Option<NaiveDateTime>) -> String {
    ts.map(|t| t.format(TIMESTAMP_FORMAT).to_string())
        .unwrap_or_default()
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

/// 导出单件时间线
pub fn write_timeline_csv<W: Write>(report: &TimelineReport, out: W) -> ExportResult<()> {
    let mut wtr = Writer::from_writer(out);
    wtr.write_record(TIMELINE_HEADER)?;

    for row in &report.rows {
        wtr.write_record([
            row.seq_no.to_string().as_str(),
            fmt_ts(row.timestamp).as_str(),
            row.activity.as_str(),
            row.status.to_string().as_str(),
            opt(&row.checkpoint),
            opt(&row.method),
            opt(&row.operator_name),
            opt(&row.issue),
            fmt_ts(row.action_timestamp).as_str(),
            opt(&row.action),
            row.result.to_string().as_str(),
        ])?;
    }

    wtr.flush()?;
    tracing::debug!(unit_id = %report.unit.unit_id, rows = report.rows.len(), "时间线已导出");
    Ok(())
}

/// 导出停机明细
pub fn write_downtime_detail_csv<W: Write>(report: &DowntimeReport, out: W) -> ExportResult<()> {
    let mut wtr = Writer::from_writer(out);
    wtr.write_record(DETAIL_HEADER)?;

    for row in &report.detail {
        wtr.write_record([
            row.station.clone(),
            row.seq_no.to_string(),
            row.event_id.to_string(),
            row.date.format("%Y-%m-%d").to_string(),
            row.stop_time.format(TIMESTAMP_FORMAT).to_string(),
            row.start_time.format(TIMESTAMP_FORMAT).to_string(),
            row.break_seconds.to_string(),
            row.duration_seconds.to_string(),
            row.duration.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// 导出工位汇总
pub fn write_downtime_summary_csv<W: Write>(report: &DowntimeReport, out: W) -> ExportResult<()> {
    let mut wtr = Writer::from_writer(out);
    wtr.write_record(SUMMARY_HEADER)?;

    for agg in &report.summary {
        wtr.write_record([
            agg.station.clone(),
            agg.stop_count.to_string(),
            agg.total_seconds.to_string(),
            agg.total_duration.clone(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::downtime::{DowntimeDetailRow, StationAggregate};
    use crate::domain::timeline::TimelineRow;
    use crate::domain::types::{IdentifierSpace, TimelineResult, TimelineStatus};
    use crate::domain::unit::UnitHandle;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn handle() -> UnitHandle {
        UnitHandle {
            unit_id: "U-1".to_string(),
            material_ref: None,
            matched_space: IdentifierSpace::Serial,
            matched_identifier: "SN-1".to_string(),
        }
    }

    #[test]
    fn test_timeline_csv_keeps_pending_rows_blank() {
        let report = TimelineReport {
            unit: handle(),
            rows: vec![
                TimelineRow {
                    seq_no: 1,
                    timestamp: Some(at(10, 0)),
                    activity: "ASSEMBLY".to_string(),
                    status: TimelineStatus::Stage("ASM-01".to_string()),
                    checkpoint: None,
                    method: Some("SCAN".to_string()),
                    operator_name: Some("Li, Wei".to_string()),
                    issue: None,
                    action_timestamp: None,
                    action: None,
                    result: TimelineResult::Ok,
                },
                TimelineRow {
                    seq_no: 2,
                    timestamp: None,
                    activity: "PACK".to_string(),
                    status: TimelineStatus::Pending,
                    checkpoint: None,
                    method: None,
                    operator_name: None,
                    issue: None,
                    action_timestamp: None,
                    action: None,
                    result: TimelineResult::Waiting,
                },
            ],
            anomalies: vec![],
        };

        let mut buf = Vec::new();
        write_timeline_csv(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            "1,2024-03-01 10:00:00,ASSEMBLY,ASM-01,,SCAN,\"Li, Wei\",,,,OK"
        );
        assert_eq!(lines[2], "2,,PACK,PENDING,,,,,,,WAITING");
    }

    #[test]
    fn test_downtime_csv_outputs() {
        let report = DowntimeReport {
            location: "LINE-A".to_string(),
            from: at(0, 0),
            to: at(23, 0),
            summary: vec![StationAggregate {
                station: "S1".to_string(),
                total_seconds: 97_500,
                stop_count: 1,
                total_duration: "27h 05m 00s".to_string(),
            }],
            detail: vec![DowntimeDetailRow {
                station: "S1".to_string(),
                seq_no: 1,
                event_id: 42,
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                stop_time: at(10, 0),
                start_time: at(11, 0),
                break_seconds: 600,
                duration_seconds: 3000,
                duration: "00:50:00".to_string(),
            }],
            anomalies: vec![],
        };

        let mut detail = Vec::new();
        write_downtime_detail_csv(&report, &mut detail).unwrap();
        let detail = String::from_utf8(detail).unwrap();
        assert!(detail
            .lines()
            .any(|l| l == "S1,1,42,2024-03-01,2024-03-01 10:00:00,2024-03-01 11:00:00,600,3000,00:50:00"));

        let mut summary = Vec::new();
        write_downtime_summary_csv(&report, &mut summary).unwrap();
        let summary = String::from_utf8(summary).unwrap();
        assert_eq!(summary.lines().nth(1), Some("S1,1,97500,27h 05m 00s"));
    }
}
