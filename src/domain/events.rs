// ==========================================
// 工厂运营追溯核心 - 单件事件模型
// ==========================================
// 三类事件源: 正常生产 / 返修 / 工艺路线工序
// 时间戳保留原始偏移，比较前必须经 PlantClock 归一化
// ==========================================

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// ==========================================
// ProductionEvent - 生产事件（只追加）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionEvent {
    pub unit_id: String,
    pub station: String,                 // 工位
    pub activity_type: String,           // 活动类型（如 COMPLETE / SCAN）
    pub timestamp: DateTime<FixedOffset>,
    pub operator: Option<String>,
    pub checkpoint_info: Option<String>, // 检查点信息
    pub method: Option<String>,          // 采集方式（自动扫描/人工）
}

// ==========================================
// ReworkEvent - 返修事件
// ==========================================
// ended_at 为空表示返修尚未结束（单件仍在返修中）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReworkEvent {
    pub unit_id: String,
    pub route_seq_no: i32,                    // 返修锚定的工艺序号
    pub station: String,
    pub started_at: DateTime<FixedOffset>,
    pub ended_at: Option<DateTime<FixedOffset>>,
    pub defect: Option<String>,
    pub root_cause: Option<String>,
    pub resolution: Option<String>,
    pub operator: Option<String>,
}

impl ReworkEvent {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}

// ==========================================
// RouteStage - 工艺路线工序
// ==========================================
// 同一单件内 seq_no 唯一且全序；started_on 为空表示尚未执行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStage {
    pub unit_id: String,
    pub seq_no: i32,
    pub station: String,
    pub checkpoints: Option<String>,
    pub started_on: Option<DateTime<FixedOffset>>,
}

impl RouteStage {
    pub fn is_started(&self) -> bool {
        self.started_on.is_some()
    }
}
