// ==========================================
// 工厂运营追溯核心 - 领域模型层
// ==========================================
// 职责: 定义单件、事件、停机、检查点等实体与视图对象
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod anomaly;
pub mod checkpoint;
pub mod downtime;
pub mod events;
pub mod timeline;
pub mod types;
pub mod unit;

// 重导出核心类型
pub use anomaly::DataAnomaly;
pub use checkpoint::{CheckpointDefinition, CheckpointStatus};
pub use downtime::{BreakWindow, DowntimeDetailRow, DowntimeReport, StationAggregate, StoppageEvent};
pub use events::{ProductionEvent, ReworkEvent, RouteStage};
pub use timeline::{TimelineReport, TimelineRow};
pub use types::{CheckpointState, IdentifierSpace, TimelineResult, TimelineStatus};
pub use unit::{UnitHandle, UnitRecord};
