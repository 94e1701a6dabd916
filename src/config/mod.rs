// ==========================================
// 工厂运营追溯核心 - 配置层
// ==========================================
// 职责: 工厂时区、检查点目录、连接池参数
// 存储: config_kv 表（scope_id = 'global'）
// ==========================================

pub mod checkpoint_catalog;
pub mod config_manager;

// 重导出核心配置管理器
pub use checkpoint_catalog::CheckpointCatalog;
pub use config_manager::{config_keys, ConfigManager, TraceConfig};
