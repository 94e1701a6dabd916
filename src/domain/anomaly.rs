// ==========================================
// 工厂运营追溯核心 - 数据异常
// ==========================================
// 数据异常不致命: 记录日志、按约定兜底、随报表输出供审计
// ==========================================

use serde::Serialize;
use std::fmt;

/// 数据异常
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataAnomaly {
    /// 同一单件存在多条未结束返修（兜底: 取最近一条作为锚点）
    MultipleOpenReworks { unit_id: String, open_count: usize },

    /// 停机结束早于开始（兜底: 时长截断为 0，随后被剔除）
    NegativeStoppage { event_id: i64, station: String },

    /// 单次停机净时长超过 24 小时，HH:MM:SS 展示不再是时钟语义
    NetDurationOverDay { event_id: i64, net_seconds: i64 },

    /// 休息窗口互相重叠，逐窗口累加的扣除量大于实际覆盖量
    OverlappingBreaks { event_id: i64, double_counted_seconds: i64 },
}

impl DataAnomaly {
    /// 异常类别代码（用于计数）
    pub fn code(&self) -> &'static str {
        match self {
            DataAnomaly::MultipleOpenReworks { .. } => "MULTIPLE_OPEN_REWORKS",
            DataAnomaly::NegativeStoppage { .. } => "NEGATIVE_STOPPAGE",
            DataAnomaly::NetDurationOverDay { .. } => "NET_DURATION_OVER_DAY",
            DataAnomaly::OverlappingBreaks { .. } => "OVERLAPPING_BREAKS",
        }
    }
}

impl fmt::Display for DataAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataAnomaly::MultipleOpenReworks { unit_id, open_count } => write!(
                f,
                "单件存在多条未结束返修: unit_id={}, open_count={}",
                unit_id, open_count
            ),
            DataAnomaly::NegativeStoppage { event_id, station } => write!(
                f,
                "停机结束时间早于开始时间: event_id={}, station={}",
                event_id, station
            ),
            DataAnomaly::NetDurationOverDay {
                event_id,
                net_seconds,
            } => write!(
                f,
                "单次停机净时长超过24小时: event_id={}, net_seconds={}",
                event_id, net_seconds
            ),
            DataAnomaly::OverlappingBreaks {
                event_id,
                double_counted_seconds,
            } => write!(
                f,
                "休息窗口重叠导致重复扣除: event_id={}, double_counted_seconds={}",
                event_id, double_counted_seconds
            ),
        }
    }
}
