// ==========================================
// 工厂运营追溯核心 - 事件源接口
// ==========================================
// 职责: 定义核心所需的只读取数接口（不包含实现）
// 红线: 只读、无副作用；调用方标识只能作为绑定参数，禁止拼接进查询
// 实现者: SqliteEventSource（参考实现）或外部联邦取数适配器
// ==========================================

use crate::domain::downtime::{BreakWindow, StoppageEvent};
use crate::domain::events::{ProductionEvent, ReworkEvent, RouteStage};
use crate::domain::unit::UnitRecord;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

// ==========================================
// EventSource Trait
// ==========================================
#[async_trait]
pub trait EventSource: Send + Sync {
    // ===== 单件追溯 =====

    /// 查询单件的生产事件
    async fn fetch_production_events(&self, unit_id: &str) -> RepositoryResult<Vec<ProductionEvent>>;

    /// 查询单件的返修事件
    async fn fetch_rework_events(&self, unit_id: &str) -> RepositoryResult<Vec<ReworkEvent>>;

    /// 查询单件的工艺路线工序
    async fn fetch_route_stages(&self, unit_id: &str) -> RepositoryResult<Vec<RouteStage>>;

    // ===== 停机归因 =====

    /// 查询区域内 on 落在 [from, to) 且已结束的停机事件
    async fn fetch_stoppage_events(
        &self,
        location: &str,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> RepositoryResult<Vec<StoppageEvent>>;

    /// 查询区域的每日休息窗口
    async fn fetch_break_windows(&self, location: &str) -> RepositoryResult<Vec<BreakWindow>>;

    // ===== 单件解析 =====

    /// 按主序列号精确匹配
    async fn resolve_by_serial(&self, identifier: &str) -> RepositoryResult<Option<UnitRecord>>;

    /// 按别名匹配
    async fn resolve_by_alias(&self, identifier: &str) -> RepositoryResult<Option<UnitRecord>>;

    /// 按最近一次打印的标签码匹配
    async fn resolve_by_label_code(&self, identifier: &str) -> RepositoryResult<Option<UnitRecord>>;
}
