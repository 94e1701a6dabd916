// ==========================================
// 工厂运营追溯核心 - 单件时间线重建
// ==========================================
// 输入: 生产事件 + 返修事件 + 工艺路线工序（同一读快照）
// 输出: 按时间升序的时间线，待执行工序恒排在最后
// ==========================================
// 排序规则:
// 1. 时间戳升序，空时间戳排在所有非空之后
// 2. 时间相同按插入顺序（生产 -> 返修 -> 待执行）
// 待执行工序: seq_no > 最近一次返修的 route_seq_no 且 started_on 为空
// ==========================================

use crate::domain::anomaly::DataAnomaly;
use crate::domain::events::{ProductionEvent, ReworkEvent, RouteStage};
use crate::domain::timeline::{TimelineReport, TimelineRow};
use crate::domain::types::{TimelineResult, TimelineStatus};
use crate::domain::unit::UnitHandle;
use crate::engine::anomaly::AnomalyLog;
use crate::engine::time_utils::PlantClock;

// ==========================================
// TimelineReconstructor - 时间线重建器
// ==========================================
/// 时间线重建器
///
/// 纯函数式: 不做 I/O，不持有跨请求状态；同一快照重复调用结果完全一致。
#[derive(Debug, Clone, Default)]
pub struct TimelineReconstructor {
    clock: PlantClock,
}

impl TimelineReconstructor {
    pub fn new(clock: PlantClock) -> Self {
        Self { clock }
    }

    /// 重建单件时间线
    ///
    /// # 参数
    /// - `unit`: 已解析的单件句柄
    /// - `production`: 生产事件
    /// - `rework`: 返修事件
    /// - `route`: 工艺路线工序
    ///
    /// # 返回
    /// - 三类行合并排序后的时间线；全部输入为空时返回空时间线（不是错误）
    pub fn build(
        &self,
        unit: &UnitHandle,
        production: &[ProductionEvent],
        rework: &[ReworkEvent],
        route: &[RouteStage],
    ) -> TimelineReport {
        let mut anomalies = AnomalyLog::new();

        let mut rows: Vec<TimelineRow> =
            Vec::with_capacity(production.len() + rework.len() + route.len());

        // 1) 正常生产
        rows.extend(production.iter().map(|e| self.production_row(e)));

        // 2) 返修
        rows.extend(rework.iter().map(|e| self.rework_row(e)));

        // 3) 待执行工序（锚定最近一次返修）
        let open_count = rework.iter().filter(|r| r.is_open()).count();
        if open_count > 1 {
            anomalies.record(DataAnomaly::MultipleOpenReworks {
                unit_id: unit.unit_id.clone(),
                open_count,
            });
        }
        if let Some(anchor) = self.latest_rework(rework) {
            let pending = pending_stages(route, anchor.route_seq_no);
            tracing::debug!(
                unit_id = %unit.unit_id,
                anchor_seq = anchor.route_seq_no,
                pending = pending.len(),
                "返修锚点已确定"
            );
            rows.extend(pending.into_iter().map(pending_row));
        }

        // 4) 稳定排序: 空时间戳排最后
        rows.sort_by(|a, b| match (a.timestamp, b.timestamp) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        // 5) 编号
        for (idx, row) in rows.iter_mut().enumerate() {
            row.seq_no = idx + 1;
        }

        TimelineReport {
            unit: unit.clone(),
            rows,
            anomalies: anomalies.into_vec(),
        }
    }

    /// 最近一次返修: started_at 最大，其次 route_seq_no 最大，再其次输入靠后
    pub fn latest_rework<'a>(&self, rework: &'a [ReworkEvent]) -> Option<&'a ReworkEvent> {
        rework
            .iter()
            .enumerate()
            .max_by_key(|(idx, r)| (self.clock.normalize(&r.started_at), r.route_seq_no, *idx))
            .map(|(_, r)| r)
    }

    fn production_row(&self, e: &ProductionEvent) -> TimelineRow {
        TimelineRow {
            seq_no: 0,
            timestamp: Some(self.clock.normalize(&e.timestamp)),
            activity: e.activity_type.clone(),
            status: TimelineStatus::Stage(e.station.clone()),
            checkpoint: e.checkpoint_info.clone(),
            method: e.method.clone(),
            operator_name: e.operator.clone(),
            issue: None,
            action_timestamp: None,
            action: None,
            result: TimelineResult::Ok,
        }
    }

    fn rework_row(&self, e: &ReworkEvent) -> TimelineRow {
        TimelineRow {
            seq_no: 0,
            timestamp: Some(self.clock.normalize(&e.started_at)),
            activity: e.station.clone(),
            status: TimelineStatus::Rework,
            checkpoint: e.root_cause.clone(),
            method: None,
            operator_name: e.operator.clone(),
            issue: e.defect.clone(),
            action_timestamp: e.ended_at.as_ref().map(|t| self.clock.normalize(t)),
            action: e.resolution.clone(),
            result: TimelineResult::Reworked,
        }
    }
}

/// 计算待执行工序（按 seq_no 升序）
///
/// 当且仅当 `seq_no > anchor_seq` 且尚未开工。
pub fn pending_stages(route: &[RouteStage], anchor_seq: i32) -> Vec<&RouteStage> {
    let mut pending: Vec<&RouteStage> = route
        .iter()
        .filter(|s| s.seq_no > anchor_seq && !s.is_started())
        .collect();
    pending.sort_by_key(|s| s.seq_no);
    pending
}

fn pending_row(stage: &RouteStage) -> TimelineRow {
    TimelineRow {
        seq_no: 0,
        timestamp: None,
        activity: stage.station.clone(),
        status: TimelineStatus::Pending,
        checkpoint: stage.checkpoints.clone(),
        method: None,
        operator_name: None,
        issue: None,
        action_timestamp: None,
        action: None,
        result: TimelineResult::Waiting,
    }
}
