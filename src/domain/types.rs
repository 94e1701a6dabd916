// ==========================================
// 工厂运营追溯核心 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与报表层约定一致)
// ==========================================

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

// ==========================================
// 标识空间 (Identifier Space)
// ==========================================
// 解析顺序固定: Serial -> Alias -> LabelCode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentifierSpace {
    Serial,    // 主序列号
    Alias,     // 别名
    LabelCode, // 最近一次打印的标签码
}

impl IdentifierSpace {
    /// 解析优先级顺序
    pub const PRIORITY: [IdentifierSpace; 3] = [
        IdentifierSpace::Serial,
        IdentifierSpace::Alias,
        IdentifierSpace::LabelCode,
    ];
}

impl fmt::Display for IdentifierSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentifierSpace::Serial => write!(f, "SERIAL"),
            IdentifierSpace::Alias => write!(f, "ALIAS"),
            IdentifierSpace::LabelCode => write!(f, "LABEL_CODE"),
        }
    }
}

// ==========================================
// 时间线行状态 (Timeline Status)
// ==========================================
// 正常生产行以工位名作为状态标签
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineStatus {
    Stage(String), // 工位标签
    Rework,        // 返修
    Pending,       // 待执行
}

impl TimelineStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, TimelineStatus::Pending)
    }
}

impl fmt::Display for TimelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimelineStatus::Stage(label) => write!(f, "{}", label),
            TimelineStatus::Rework => write!(f, "REWORK"),
            TimelineStatus::Pending => write!(f, "PENDING"),
        }
    }
}

impl Serialize for TimelineStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// ==========================================
// 时间线行结果 (Timeline Result)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineResult {
    Ok,       // 正常通过
    Reworked, // 已返修
    Waiting,  // 等待执行
}

impl fmt::Display for TimelineResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimelineResult::Ok => write!(f, "OK"),
            TimelineResult::Reworked => write!(f, "REWORKED"),
            TimelineResult::Waiting => write!(f, "WAITING"),
        }
    }
}

// ==========================================
// 检查点状态 (Checkpoint State)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckpointState {
    Scanned,    // 已扫描
    NotScanned, // 未扫描
}

impl fmt::Display for CheckpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointState::Scanned => write!(f, "SCANNED"),
            CheckpointState::NotScanned => write!(f, "NOT_SCANNED"),
        }
    }
}
