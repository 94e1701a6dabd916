// ==========================================
// 工厂运营追溯核心 - 停机归因 API
// ==========================================
// 职责: 参数校验 -> 并发取数 -> 停机归因
// 约束: 校验失败时不触发任何取数；取数失败时不返回部分结果
// ==========================================

use std::sync::Arc;

use chrono::{DateTime, FixedOffset};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::downtime::DowntimeReport;
use crate::engine::{DowntimeAttributionEngine, PlantClock};
use crate::repository::EventSource;

/// 停机归因API
pub struct DowntimeApi {
    source: Arc<dyn EventSource>,
    clock: PlantClock,
    engine: DowntimeAttributionEngine,
}

impl DowntimeApi {
    pub fn new(source: Arc<dyn EventSource>, clock: PlantClock) -> Self {
        Self {
            source,
            clock,
            engine: DowntimeAttributionEngine::new(clock),
        }
    }

    /// 计算区域在 [from, to) 内的净停机
    ///
    /// # 参数
    /// - location: 区域（不能为空）
    /// - from / to: 任意时区的时刻，要求 from < to
    ///
    /// # 返回
    /// - Ok(DowntimeReport): 汇总 + 明细 + 数据异常
    /// - Err(ApiError::Validation): 参数不合法
    /// - Err(ApiError::Upstream): 事件源失败
    pub async fn attribute_downtime(
        &self,
        location: &str,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> ApiResult<DowntimeReport> {
        let location = location.trim();
        if location.is_empty() {
            return Err(ApiError::Validation("区域不能为空".to_string()));
        }
        if from >= to {
            return Err(ApiError::Validation(format!(
                "时间范围无效: from={} 必须早于 to={}",
                from.to_rfc3339(),
                to.to_rfc3339()
            )));
        }

        let (stoppages, breaks) = futures::try_join!(
            self.source.fetch_stoppage_events(location, from, to),
            self.source.fetch_break_windows(location),
        )?;

        tracing::debug!(
            location,
            stoppages = stoppages.len(),
            breaks = breaks.len(),
            "停机数据已加载"
        );

        let report = self.engine.attribute(
            location,
            self.clock.normalize(&from),
            self.clock.normalize(&to),
            &stoppages,
            &breaks,
        );

        tracing::info!(
            location,
            stations = report.summary.len(),
            stops = report.detail.len(),
            total_seconds = report.total_seconds(),
            "停机归因完成"
        );
        Ok(report)
    }
}
