// ==========================================
// 工厂运营追溯核心 - API 层
// ==========================================
// 职责: 面向调用方的业务接口（参数校验、取数编排、错误归类）
// ==========================================

pub mod downtime_api;
pub mod error;
pub mod trace_api;

// 重导出核心类型
pub use downtime_api::DowntimeApi;
pub use error::{ApiError, ApiResult};
pub use trace_api::TraceabilityApi;
