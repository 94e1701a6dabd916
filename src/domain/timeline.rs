// ==========================================
// 工厂运营追溯核心 - 时间线视图对象
// ==========================================
// 输出为瞬时视图，无独立生命周期
// ==========================================

use crate::domain::anomaly::DataAnomaly;
use crate::domain::types::{TimelineResult, TimelineStatus};
use crate::domain::unit::UnitHandle;
use chrono::NaiveDateTime;
use serde::Serialize;

// ==========================================
// TimelineRow - 时间线行
// ==========================================
/// 时间线行
///
/// 时间均为工厂本地时间（已归一化）。`timestamp` 为空的行只可能是待执行工序。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineRow {
    pub seq_no: usize,                            // 排序后编号（从 1 开始）
    pub timestamp: Option<NaiveDateTime>,
    pub activity: String,
    pub status: TimelineStatus,
    pub checkpoint: Option<String>,
    pub method: Option<String>,
    pub operator_name: Option<String>,
    pub issue: Option<String>,                    // 缺陷描述（返修行）
    pub action_timestamp: Option<NaiveDateTime>,  // 返修结束时间
    pub action: Option<String>,                   // 处置措施（返修行）
    pub result: TimelineResult,
}

// ==========================================
// TimelineReport - 单件时间线
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineReport {
    pub unit: UnitHandle,
    pub rows: Vec<TimelineRow>,
    pub anomalies: Vec<DataAnomaly>,
}

impl TimelineReport {
    /// 当前所处工序：最后一条非待执行行的状态
    pub fn current_stage(&self) -> Option<&TimelineStatus> {
        self.rows
            .iter()
            .rev()
            .find(|r| !r.status.is_pending())
            .map(|r| &r.status)
    }

    /// 待执行工序数量
    pub fn pending_count(&self) -> usize {
        self.rows.iter().filter(|r| r.status.is_pending()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
