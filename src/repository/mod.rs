// ==========================================
// 工厂运营追溯核心 - 事件源层
// ==========================================
// 红线: 只读取数，不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod event_source;
pub mod memory_event_source;
pub mod sqlite_event_source;

// 重导出
pub use error::{RepositoryError, RepositoryResult};
pub use event_source::EventSource;
pub use memory_event_source::MemoryEventSource;
pub use sqlite_event_source::{SqliteEventSource, DOWNTIME_DESTINATION, TRACEABILITY_DESTINATION};
