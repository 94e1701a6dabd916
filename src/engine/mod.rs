// ==========================================
// 工厂运营追溯核心 - 引擎层
// ==========================================
// 职责: 时间线重建、检查点状态、停机归因、单件解析
// 红线: Engine 不拼 SQL；除单件解析外均为纯计算，不做 I/O
// ==========================================

pub mod anomaly;
pub mod checkpoint;
pub mod downtime;
pub mod time_utils;
pub mod timeline;
pub mod unit_resolver;

// 重导出核心引擎
pub use anomaly::{count_by_kind, AnomalyLog};
pub use checkpoint::CheckpointEvaluator;
pub use downtime::{attribute_event, DowntimeAttributionEngine, EventAttribution};
pub use time_utils::{format_clock, format_span, overlap_seconds, subtract_intervals, PlantClock, Span};
pub use timeline::{pending_stages, TimelineReconstructor};
pub use unit_resolver::UnitResolver;
