// ==========================================
// 工厂运营追溯核心 - 报表导出层
// ==========================================
// 职责: 把时间线与停机归因结果写成 CSV
// ==========================================

pub mod csv_export;
pub mod error;

pub use csv_export::{write_downtime_detail_csv, write_downtime_summary_csv, write_timeline_csv};
pub use error::{ExportError, ExportResult};
