// ==========================================
// 工厂运营追溯核心 - SQLite 连接管理
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 连接按数据源名称缓存: 惰性创建、显式借还、空闲超时淘汰
// - 数据源名称 -> 路径 由配置给出（白名单），调用方输入不参与路径选择
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 默认空闲连接超时（秒）
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;

/// 每个数据源最多保留的空闲连接数
pub const DEFAULT_MAX_IDLE_PER_DESTINATION: usize = 4;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 FACTORY_TRACE_DB_PATH（非空时优先）
/// - 否则: 用户数据目录/factory-trace/factory_trace.db
/// - 拿不到用户数据目录时: ./factory_trace.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("FACTORY_TRACE_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./factory_trace.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("factory-trace");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("factory_trace.db");
        }
    }

    path.to_string_lossy().to_string()
}

/// 初始化参考数据源的表结构（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS unit (
            unit_id TEXT PRIMARY KEY,
            material_ref TEXT,
            serial_no TEXT UNIQUE
        );

        CREATE TABLE IF NOT EXISTS unit_alias (
            alias TEXT PRIMARY KEY,
            unit_id TEXT NOT NULL REFERENCES unit(unit_id)
        );

        CREATE TABLE IF NOT EXISTS unit_label (
            label_code TEXT NOT NULL,
            unit_id TEXT NOT NULL REFERENCES unit(unit_id),
            printed_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_unit_label_code ON unit_label(label_code, printed_at);

        CREATE TABLE IF NOT EXISTS production_event (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            unit_id TEXT NOT NULL,
            station TEXT NOT NULL,
            activity_type TEXT NOT NULL,
            event_ts TEXT NOT NULL,
            operator TEXT,
            checkpoint_info TEXT,
            method TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_production_event_unit ON production_event(unit_id);

        CREATE TABLE IF NOT EXISTS rework_event (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            unit_id TEXT NOT NULL,
            route_seq_no INTEGER NOT NULL,
            station TEXT NOT NULL,
            started_at TEXT NOT NULL,
            ended_at TEXT,
            defect TEXT,
            root_cause TEXT,
            resolution TEXT,
            operator TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_rework_event_unit ON rework_event(unit_id);

        CREATE TABLE IF NOT EXISTS route_stage (
            unit_id TEXT NOT NULL,
            seq_no INTEGER NOT NULL,
            station TEXT NOT NULL,
            checkpoints TEXT,
            started_on TEXT,
            PRIMARY KEY (unit_id, seq_no)
        );

        CREATE TABLE IF NOT EXISTS stoppage_event (
            id INTEGER PRIMARY KEY,
            station TEXT NOT NULL,
            location TEXT NOT NULL,
            on_ts TEXT NOT NULL,
            off_ts TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_stoppage_event_location ON stoppage_event(location);

        CREATE TABLE IF NOT EXISTS break_window (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            location TEXT NOT NULL,
            name TEXT NOT NULL,
            start_of_day TEXT NOT NULL,
            end_of_day TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )
}

// ==========================================
// ConnectionManager - 按数据源缓存连接
// ==========================================
struct IdleConnection {
    conn: Connection,
    returned_at: Instant,
}

/// 连接管理器
///
/// 以数据源名称为键缓存连接；借出时优先复用未过期的空闲连接，否则新建。
/// 归还由 `PooledConnection` 析构完成。
pub struct ConnectionManager {
    destinations: HashMap<String, String>,
    idle: Mutex<HashMap<String, Vec<IdleConnection>>>,
    idle_timeout: Duration,
    max_idle_per_destination: usize,
}

impl ConnectionManager {
    /// 创建连接管理器
    ///
    /// # 参数
    /// - destinations: 数据源名称 -> 数据库路径
    /// - idle_timeout: 空闲连接超时
    pub fn new(destinations: HashMap<String, String>, idle_timeout: Duration) -> Self {
        Self {
            destinations,
            idle: Mutex::new(HashMap::new()),
            idle_timeout,
            max_idle_per_destination: DEFAULT_MAX_IDLE_PER_DESTINATION,
        }
    }

    /// 所有数据源指向同一个数据库文件
    pub fn single(names: &[&str], db_path: &str, idle_timeout: Duration) -> Self {
        let destinations = names
            .iter()
            .map(|n| (n.to_string(), db_path.to_string()))
            .collect();
        Self::new(destinations, idle_timeout)
    }

    /// 借出连接
    pub fn acquire(self: &Arc<Self>, destination: &str) -> RepositoryResult<PooledConnection> {
        let path = self
            .destinations
            .get(destination)
            .ok_or_else(|| RepositoryError::UnknownDestination(destination.to_string()))?;

        let reused = {
            let mut idle = self.lock_idle()?;
            let now = Instant::now();
            let timeout = self.idle_timeout;
            let pool = idle.entry(destination.to_string()).or_default();
            pool.retain(|c| now.duration_since(c.returned_at) < timeout);
            pool.pop().map(|c| c.conn)
        };

        let conn = match reused {
            Some(conn) => conn,
            None => {
                tracing::debug!(destination, "新建数据库连接");
                open_sqlite_connection(path)
                    .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?
            }
        };

        Ok(PooledConnection {
            conn: Some(conn),
            destination: destination.to_string(),
            manager: Arc::clone(self),
        })
    }

    /// 淘汰所有超时的空闲连接，返回淘汰数量
    pub fn evict_idle(&self) -> usize {
        let Ok(mut idle) = self.idle.lock() else {
            return 0;
        };
        let now = Instant::now();
        let mut evicted = 0;
        for pool in idle.values_mut() {
            let before = pool.len();
            pool.retain(|c| now.duration_since(c.returned_at) < self.idle_timeout);
            evicted += before - pool.len();
        }
        idle.retain(|_, pool| !pool.is_empty());
        if evicted > 0 {
            tracing::debug!(evicted, "已淘汰空闲连接");
        }
        evicted
    }

    /// 指定数据源当前空闲连接数
    pub fn idle_count(&self, destination: &str) -> usize {
        self.idle
            .lock()
            .map(|idle| idle.get(destination).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn release(&self, destination: &str, conn: Connection) {
        match self.idle.lock() {
            Ok(mut idle) => {
                let pool = idle.entry(destination.to_string()).or_default();
                if pool.len() < self.max_idle_per_destination {
                    pool.push(IdleConnection {
                        conn,
                        returned_at: Instant::now(),
                    });
                }
            }
            Err(e) => tracing::warn!("连接归还失败，直接关闭: {}", e),
        }
    }

    fn lock_idle(
        &self,
    ) -> RepositoryResult<std::sync::MutexGuard<'_, HashMap<String, Vec<IdleConnection>>>> {
        self.idle
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

// ==========================================
// PooledConnection - 借出的连接
// ==========================================
/// 借出的连接，析构时归还给 `ConnectionManager`
pub struct PooledConnection {
    conn: Option<Connection>,
    destination: String,
    manager: Arc<ConnectionManager>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        // 仅在 drop 中取走
        self.conn.as_ref().expect("connection already released")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("connection already released")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.manager.release(&self.destination, conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn manager(timeout: Duration) -> (NamedTempFile, Arc<ConnectionManager>) {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let manager = ConnectionManager::single(&["trace", "downtime"], &path, timeout);
        (file, Arc::new(manager))
    }

    #[test]
    fn test_connection_is_reused_after_release() {
        let (_file, manager) = manager(Duration::from_secs(60));
        {
            let conn = manager.acquire("trace").unwrap();
            init_schema(&conn).unwrap();
        }
        assert_eq!(manager.idle_count("trace"), 1);

        let conn = manager.acquire("trace").unwrap();
        assert_eq!(manager.idle_count("trace"), 0);
        let n: i64 = conn
            .query_row("SELECT COUNT(*) FROM unit", [], |row| row.get(0))
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_unknown_destination_is_rejected() {
        let (_file, manager) = manager(Duration::from_secs(60));
        let err = manager.acquire("../../etc/passwd").err().unwrap();
        assert!(matches!(err, RepositoryError::UnknownDestination(_)));
    }

    #[test]
    fn test_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_idle_connections_are_evicted() {
        let (_file, manager) = manager(Duration::from_millis(0));
        drop(manager.acquire("downtime").unwrap());
        assert_eq!(manager.idle_count("downtime"), 1);
        assert_eq!(manager.evict_idle(), 1);
        assert_eq!(manager.idle_count("downtime"), 0);
    }
}
