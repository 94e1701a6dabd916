// ==========================================
// 工厂运营追溯核心 - 检查点模型
// ==========================================
// 检查点目录是外部配置，不写死在控制流里
// ==========================================

use crate::domain::types::CheckpointState;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ==========================================
// CheckpointDefinition - 检查点定义
// ==========================================
/// 检查点定义
///
/// 任一工位在 `station_set` 中、且活动类型等于 `completion_status` 的生产事件
/// 即视为该检查点已完成。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointDefinition {
    pub name: String,
    pub station_set: BTreeSet<String>,
    pub completion_status: String,
}

impl CheckpointDefinition {
    pub fn new<I, S>(name: &str, stations: I, completion_status: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.to_string(),
            station_set: stations.into_iter().map(Into::into).collect(),
            completion_status: completion_status.to_string(),
        }
    }

    /// 判断事件是否满足本检查点
    pub fn matches(&self, station: &str, activity_type: &str) -> bool {
        self.station_set.contains(station)
            && self.completion_status.eq_ignore_ascii_case(activity_type)
    }
}

// ==========================================
// CheckpointStatus - 检查点状态
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointStatus {
    pub state: CheckpointState,
    pub last_timestamp: Option<NaiveDateTime>,
}

impl CheckpointStatus {
    pub fn not_scanned() -> Self {
        Self {
            state: CheckpointState::NotScanned,
            last_timestamp: None,
        }
    }

    pub fn scanned(at: NaiveDateTime) -> Self {
        Self {
            state: CheckpointState::Scanned,
            last_timestamp: Some(at),
        }
    }
}
