// ==========================================
// 工厂运营追溯核心 - 单件追溯 API
// ==========================================
// 职责: 标识解析 -> 并发取数 -> 时间线重建 / 检查点状态
// 说明: 已解析但无任何事件的单件返回空时间线（不是错误）
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::CheckpointCatalog;
use crate::domain::checkpoint::CheckpointStatus;
use crate::domain::timeline::TimelineReport;
use crate::domain::unit::UnitHandle;
use crate::engine::{CheckpointEvaluator, PlantClock, TimelineReconstructor, UnitResolver};
use crate::repository::EventSource;

// ==========================================
// TraceabilityApi - 单件追溯 API
// ==========================================

/// 单件追溯API
///
/// 职责：
/// 1. 扫描标识解析为单件
/// 2. 重建单件生产/返修/待执行时间线
/// 3. 计算检查点状态
pub struct TraceabilityApi {
    source: Arc<dyn EventSource>,
    reconstructor: TimelineReconstructor,
    evaluator: CheckpointEvaluator,
    catalog: CheckpointCatalog,
}

impl TraceabilityApi {
    pub fn new(source: Arc<dyn EventSource>, clock: PlantClock, catalog: CheckpointCatalog) -> Self {
        Self {
            source,
            reconstructor: TimelineReconstructor::new(clock),
            evaluator: CheckpointEvaluator::new(clock),
            catalog,
        }
    }

    /// 解析扫描到的标识
    ///
    /// # 返回
    /// - Ok(UnitHandle): 命中的单件
    /// - Err(ApiError::Validation): 标识为空
    /// - Err(ApiError::NotFound): 三个标识空间均未命中
    /// - Err(ApiError::Upstream): 事件源失败
    pub async fn resolve_unit(&self, identifier: &str) -> ApiResult<UnitHandle> {
        let identifier = identifier.trim();
        if identifier.is_empty() {
            return Err(ApiError::Validation("单件标识不能为空".to_string()));
        }

        UnitResolver::new(self.source.as_ref())
            .resolve(identifier)
            .await?
            .ok_or_else(|| ApiError::NotFound(identifier.to_string()))
    }

    /// 重建已解析单件的时间线
    pub async fn build_timeline(&self, unit: &UnitHandle) -> ApiResult<TimelineReport> {
        let (production, rework, route) = futures::try_join!(
            self.source.fetch_production_events(&unit.unit_id),
            self.source.fetch_rework_events(&unit.unit_id),
            self.source.fetch_route_stages(&unit.unit_id),
        )?;

        tracing::debug!(
            unit_id = %unit.unit_id,
            production = production.len(),
            rework = rework.len(),
            route = route.len(),
            "单件事件已加载"
        );

        let report = self.reconstructor.build(unit, &production, &rework, &route);
        tracing::info!(
            unit_id = %unit.unit_id,
            rows = report.rows.len(),
            pending = report.pending_count(),
            anomalies = report.anomalies.len(),
            "时间线重建完成"
        );
        Ok(report)
    }

    /// 标识解析 + 时间线重建
    pub async fn get_unit_timeline(&self, identifier: &str) -> ApiResult<TimelineReport> {
        let unit = self.resolve_unit(identifier).await?;
        self.build_timeline(&unit).await
    }

    /// 按检查点目录计算单件的检查点状态
    pub async fn checkpoint_status(
        &self,
        unit: &UnitHandle,
    ) -> ApiResult<BTreeMap<String, CheckpointStatus>> {
        let events = self.source.fetch_production_events(&unit.unit_id).await?;
        Ok(self.evaluator.evaluate(&events, self.catalog.definitions()))
    }
}
