// ==========================================
// 工厂运营追溯核心 - 核心库
// ==========================================
// 职责: 单件追溯时间线、检查点状态、停机归因
// 技术栈: Rust + tokio + SQLite（参考事件源）
// 定位: 只读分析核心，不修改任何上游数据
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与视图对象
pub mod domain;

// 事件源层 - 只读取数
pub mod repository;

// 引擎层 - 纯计算
pub mod engine;

// 配置层 - 工厂时区 / 检查点目录
pub mod config;

// 数据库基础设施（PRAGMA 统一 / 连接管理）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 报表导出
pub mod export;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CheckpointState, IdentifierSpace, TimelineResult, TimelineStatus};

// 领域实体
pub use domain::{
    BreakWindow, CheckpointDefinition, CheckpointStatus, DataAnomaly, DowntimeReport,
    ProductionEvent, ReworkEvent, RouteStage, StoppageEvent, TimelineReport, TimelineRow,
    UnitHandle,
};

// 引擎
pub use engine::{
    CheckpointEvaluator, DowntimeAttributionEngine, PlantClock, TimelineReconstructor,
    UnitResolver,
};

// 事件源
pub use repository::{EventSource, MemoryEventSource, SqliteEventSource};

// API
pub use api::{ApiError, ApiResult, DowntimeApi, TraceabilityApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "工厂运营追溯核心";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
