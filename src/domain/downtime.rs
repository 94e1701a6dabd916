// ==========================================
// 工厂运营追溯核心 - 停机与休息窗口模型
// ==========================================
// 停机事件: on = 停机时刻, off = 恢复时刻
// 休息窗口: 每日循环，只在与停机事件相交时落到具体日期
// ==========================================

use crate::domain::anomaly::DataAnomaly;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// ==========================================
// StoppageEvent - 停机事件
// ==========================================
// off 为空的停机不参与归因（排除而不是按 0 计）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoppageEvent {
    pub id: i64,
    pub station: String,
    pub location: String,
    pub on: DateTime<FixedOffset>,
    pub off: Option<DateTime<FixedOffset>>,
}

// ==========================================
// BreakWindow - 每日休息窗口
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakWindow {
    pub name: String,
    pub location: String,
    pub start_of_day: NaiveTime,
    pub end_of_day: NaiveTime,
}

impl BreakWindow {
    /// 结束时刻早于开始时刻（如 23:50-00:20）
    pub fn crosses_midnight(&self) -> bool {
        self.end_of_day < self.start_of_day
    }

    /// 将休息窗口落到指定日期
    ///
    /// 跨零点的窗口结束落到次日；开始等于结束的窗口长度为 0。
    pub fn materialize(&self, date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let start = date.and_time(self.start_of_day);
        let mut end = date.and_time(self.end_of_day);
        if self.crosses_midnight() {
            end += chrono::Duration::days(1);
        }
        (start, end)
    }

    /// 可能覆盖 `date` 当天时刻的所有窗口实例
    ///
    /// 跨零点的窗口还包括前一日开始、延续到 `date` 凌晨的那一段。
    pub fn instances_touching(&self, date: NaiveDate) -> Vec<(NaiveDateTime, NaiveDateTime)> {
        let mut instances = Vec::with_capacity(2);
        if self.crosses_midnight() {
            if let Some(prev) = date.pred_opt() {
                instances.push(self.materialize(prev));
            }
        }
        instances.push(self.materialize(date));
        instances
    }
}

// ==========================================
// DowntimeDetailRow - 停机明细行
// ==========================================
/// 停机明细行
///
/// 字段命名沿用现场口径: `stop_time` 为停机时刻，`start_time` 为产线恢复时刻。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DowntimeDetailRow {
    pub station: String,
    pub seq_no: usize,              // 工位内序号（从 1 开始）
    pub event_id: i64,
    pub date: NaiveDate,
    pub stop_time: NaiveDateTime,
    pub start_time: NaiveDateTime,
    pub break_seconds: i64,
    pub duration_seconds: i64,      // 净停机秒数
    pub duration: String,           // HH:MM:SS
}

// ==========================================
// StationAggregate - 工位汇总行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationAggregate {
    pub station: String,
    pub total_seconds: i64,
    pub stop_count: usize,
    pub total_duration: String,     // 时长格式，可超过 24 小时
}

// ==========================================
// DowntimeReport - 停机归因结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DowntimeReport {
    pub location: String,
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
    pub summary: Vec<StationAggregate>,
    pub detail: Vec<DowntimeDetailRow>,
    pub anomalies: Vec<DataAnomaly>,
}

impl DowntimeReport {
    /// 全部工位净停机总秒数
    pub fn total_seconds(&self) -> i64 {
        self.summary.iter().map(|s| s.total_seconds).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(start: (u32, u32), end: (u32, u32)) -> BreakWindow {
        BreakWindow {
            name: "B".to_string(),
            location: "L1".to_string(),
            start_of_day: NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            end_of_day: NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    #[test]
    fn test_midnight_break_rolls_end_to_next_day() {
        let (start, end) = window((23, 50), (0, 20)).materialize(date());
        assert_eq!(start, date().and_hms_opt(23, 50, 0).unwrap());
        assert_eq!(end, date().succ_opt().unwrap().and_hms_opt(0, 20, 0).unwrap());
    }

    #[test]
    fn test_midnight_break_includes_previous_day_instance() {
        let instances = window((23, 50), (0, 20)).instances_touching(date());
        assert_eq!(instances.len(), 2);
        let prev = date().pred_opt().unwrap();
        assert_eq!(instances[0].0, prev.and_hms_opt(23, 50, 0).unwrap());
        assert_eq!(instances[0].1, date().and_hms_opt(0, 20, 0).unwrap());

        assert_eq!(window((12, 0), (12, 30)).instances_touching(date()).len(), 1);
    }

    #[test]
    fn test_equal_start_and_end_is_empty_window() {
        let (start, end) = window((12, 0), (12, 0)).materialize(date());
        assert_eq!(start, end);
        assert!(!window((12, 0), (12, 0)).crosses_midnight());
    }
}
