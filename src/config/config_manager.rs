// ==========================================
// 工厂运营追溯核心 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::checkpoint_catalog::CheckpointCatalog;
use crate::db::{open_sqlite_connection, DEFAULT_IDLE_TIMEOUT_SECS};
use crate::engine::time_utils::{PlantClock, DEFAULT_PLANT_UTC_OFFSET_MINUTES};
use rusqlite::{params, Connection, OptionalExtension};
use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    /// 工厂时区偏移（分钟，如 480 表示 UTC+08:00）
    pub const PLANT_UTC_OFFSET_MINUTES: &str = "plant_utc_offset_minutes";
    /// 检查点目录（JSON 数组）
    pub const CHECKPOINT_CATALOG: &str = "checkpoint_catalog";
    /// 空闲连接超时（秒）
    pub const POOL_IDLE_TIMEOUT_SECS: &str = "pool_idle_timeout_secs";
}

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// TraceConfig - 运行配置快照
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct TraceConfig {
    pub plant_utc_offset_minutes: i32,
    pub checkpoint_catalog: CheckpointCatalog,
    pub pool_idle_timeout_secs: u64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            plant_utc_offset_minutes: DEFAULT_PLANT_UTC_OFFSET_MINUTES,
            checkpoint_catalog: CheckpointCatalog::default(),
            pool_idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
        }
    }
}

impl TraceConfig {
    /// 工厂时钟
    pub fn plant_clock(&self) -> Result<PlantClock, Box<dyn Error>> {
        PlantClock::from_utc_offset_minutes(self.plant_utc_offset_minutes).ok_or_else(|| {
            format!("工厂时区偏移超出范围: {} 分钟", self.plant_utc_offset_minutes).into()
        })
    }

    pub fn pool_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_idle_timeout_secs)
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!("配置已更新: key={}", key);
        Ok(())
    }

    /// 加载运行配置（缺失的键使用默认值）
    pub fn load_trace_config(&self) -> Result<TraceConfig, Box<dyn Error>> {
        let mut config = TraceConfig::default();

        if let Some(raw) = self.get_global_config_value(config_keys::PLANT_UTC_OFFSET_MINUTES)? {
            config.plant_utc_offset_minutes = raw
                .trim()
                .parse()
                .map_err(|e| format!("{} 配置无效 ({}): {}", config_keys::PLANT_UTC_OFFSET_MINUTES, raw, e))?;
        }

        if let Some(raw) = self.get_global_config_value(config_keys::CHECKPOINT_CATALOG)? {
            config.checkpoint_catalog = CheckpointCatalog::from_json(&raw)?;
        }

        if let Some(raw) = self.get_global_config_value(config_keys::POOL_IDLE_TIMEOUT_SECS)? {
            config.pool_idle_timeout_secs = raw
                .trim()
                .parse()
                .map_err(|e| format!("{} 配置无效 ({}): {}", config_keys::POOL_IDLE_TIMEOUT_SECS, raw, e))?;
        }

        // 提前校验时区
        config.plant_clock()?;

        tracing::info!(
            plant_utc_offset_minutes = config.plant_utc_offset_minutes,
            checkpoints = config.checkpoint_catalog.definitions().len(),
            "运行配置已加载"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_defaults_when_empty() {
        let config = manager().load_trace_config().unwrap();
        assert_eq!(config, TraceConfig::default());
        assert_eq!(config.plant_clock().unwrap(), PlantClock::default());
    }

    #[test]
    fn test_overrides_are_loaded() {
        let mgr = manager();
        mgr.set_global_config_value(config_keys::PLANT_UTC_OFFSET_MINUTES, "-300")
            .unwrap();
        mgr.set_global_config_value(
            config_keys::CHECKPOINT_CATALOG,
            r#"[{"name":"UNLOADING","station_set":["UL-01"],"completion_status":"CONFIRMED"}]"#,
        )
        .unwrap();
        mgr.set_global_config_value(config_keys::POOL_IDLE_TIMEOUT_SECS, "30")
            .unwrap();

        let config = mgr.load_trace_config().unwrap();
        assert_eq!(config.plant_utc_offset_minutes, -300);
        assert!(config.checkpoint_catalog.get("UNLOADING").is_some());
        assert_eq!(config.pool_idle_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_invalid_offset_is_rejected() {
        let mgr = manager();
        mgr.set_global_config_value(config_keys::PLANT_UTC_OFFSET_MINUTES, "99999")
            .unwrap();
        assert!(mgr.load_trace_config().is_err());
    }
}
