// ==========================================
// 工厂运营追溯核心 - 内存事件源
// ==========================================
// 用途: 调用方已持有行数据时直接喂给核心；测试中替代数据库
// 支持注入失败，用于验证上游错误的传播
// ==========================================

use crate::domain::downtime::{BreakWindow, StoppageEvent};
use crate::domain::events::{ProductionEvent, ReworkEvent, RouteStage};
use crate::domain::unit::UnitRecord;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::event_source::EventSource;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    serials: HashMap<String, UnitRecord>,
    aliases: HashMap<String, UnitRecord>,
    labels: HashMap<String, UnitRecord>,
    production: Vec<ProductionEvent>,
    rework: Vec<ReworkEvent>,
    route: Vec<RouteStage>,
    stoppages: Vec<StoppageEvent>,
    breaks: Vec<BreakWindow>,
}

/// 内存事件源
#[derive(Debug, Default)]
pub struct MemoryEventSource {
    tables: RwLock<Tables>,
    fail: AtomicBool,
    calls: AtomicUsize,
}

impl MemoryEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 之后的所有取数调用都返回错误
    pub fn fail_all(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// 累计取数调用次数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn add_serial(&self, serial: &str, unit: UnitRecord) -> RepositoryResult<()> {
        self.write(|t| {
            t.serials.insert(serial.to_string(), unit);
        })
    }

    pub fn add_alias(&self, alias: &str, unit: UnitRecord) -> RepositoryResult<()> {
        self.write(|t| {
            t.aliases.insert(alias.to_string(), unit);
        })
    }

    /// 登记最近一次打印的标签码（同码重复登记时以后者为准）
    pub fn add_label_code(&self, code: &str, unit: UnitRecord) -> RepositoryResult<()> {
        self.write(|t| {
            t.labels.insert(code.to_string(), unit);
        })
    }

    pub fn add_production(&self, events: Vec<ProductionEvent>) -> RepositoryResult<()> {
        self.write(|t| t.production.extend(events))
    }

    pub fn add_rework(&self, events: Vec<ReworkEvent>) -> RepositoryResult<()> {
        self.write(|t| t.rework.extend(events))
    }

    pub fn add_route(&self, stages: Vec<RouteStage>) -> RepositoryResult<()> {
        self.write(|t| t.route.extend(stages))
    }

    pub fn add_stoppages(&self, events: Vec<StoppageEvent>) -> RepositoryResult<()> {
        self.write(|t| t.stoppages.extend(events))
    }

    pub fn add_breaks(&self, windows: Vec<BreakWindow>) -> RepositoryResult<()> {
        self.write(|t| t.breaks.extend(windows))
    }

    fn write<F: FnOnce(&mut Tables)>(&self, f: F) -> RepositoryResult<()> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        f(&mut tables);
        Ok(())
    }

    fn read<T, F: FnOnce(&Tables) -> T>(&self, op: &str, f: F) -> RepositoryResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(RepositoryError::DatabaseConnectionError(format!(
                "事件源不可用: {}",
                op
            )));
        }
        let tables = self
            .tables
            .read()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        Ok(f(&tables))
    }
}

#[async_trait]
impl EventSource for MemoryEventSource {
    async fn fetch_production_events(&self, unit_id: &str) -> RepositoryResult<Vec<ProductionEvent>> {
        self.read("fetch_production_events", |t| {
            t.production.iter().filter(|e| e.unit_id == unit_id).cloned().collect()
        })
    }

    async fn fetch_rework_events(&self, unit_id: &str) -> RepositoryResult<Vec<ReworkEvent>> {
        self.read("fetch_rework_events", |t| {
            t.rework.iter().filter(|e| e.unit_id == unit_id).cloned().collect()
        })
    }

    async fn fetch_route_stages(&self, unit_id: &str) -> RepositoryResult<Vec<RouteStage>> {
        self.read("fetch_route_stages", |t| {
            t.route.iter().filter(|s| s.unit_id == unit_id).cloned().collect()
        })
    }

    async fn fetch_stoppage_events(
        &self,
        location: &str,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> RepositoryResult<Vec<StoppageEvent>> {
        // DateTime<FixedOffset> 按瞬时比较，与偏移无关
        self.read("fetch_stoppage_events", |t| {
            t.stoppages
                .iter()
                .filter(|e| e.location == location && e.off.is_some())
                .filter(|e| e.on >= from && e.on < to)
                .cloned()
                .collect()
        })
    }

    async fn fetch_break_windows(&self, location: &str) -> RepositoryResult<Vec<BreakWindow>> {
        self.read("fetch_break_windows", |t| {
            t.breaks.iter().filter(|b| b.location == location).cloned().collect()
        })
    }

    async fn resolve_by_serial(&self, identifier: &str) -> RepositoryResult<Option<UnitRecord>> {
        self.read("resolve_by_serial", |t| t.serials.get(identifier).cloned())
    }

    async fn resolve_by_alias(&self, identifier: &str) -> RepositoryResult<Option<UnitRecord>> {
        self.read("resolve_by_alias", |t| t.aliases.get(identifier).cloned())
    }

    async fn resolve_by_label_code(&self, identifier: &str) -> RepositoryResult<Option<UnitRecord>> {
        self.read("resolve_by_label_code", |t| t.labels.get(identifier).cloned())
    }
}
