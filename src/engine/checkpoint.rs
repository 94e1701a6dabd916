// ==========================================
// 工厂运营追溯核心 - 检查点状态
// ==========================================
// 每个检查点: 至少一条匹配的完成事件 => SCANNED + 最大时间
//             否则 => NOT_SCANNED + 空时间
// ==========================================

use crate::domain::checkpoint::{CheckpointDefinition, CheckpointStatus};
use crate::domain::events::ProductionEvent;
use crate::engine::time_utils::PlantClock;
use std::collections::BTreeMap;

/// 检查点状态计算器
#[derive(Debug, Clone, Default)]
pub struct CheckpointEvaluator {
    clock: PlantClock,
}

impl CheckpointEvaluator {
    pub fn new(clock: PlantClock) -> Self {
        Self { clock }
    }

    /// 计算目录中每个检查点的状态
    pub fn evaluate(
        &self,
        events: &[ProductionEvent],
        catalog: &[CheckpointDefinition],
    ) -> BTreeMap<String, CheckpointStatus> {
        catalog
            .iter()
            .map(|def| {
                let last = events
                    .iter()
                    .filter(|e| def.matches(&e.station, &e.activity_type))
                    .map(|e| self.clock.normalize(&e.timestamp))
                    .max();
                let status = match last {
                    Some(at) => CheckpointStatus::scanned(at),
                    None => CheckpointStatus::not_scanned(),
                };
                (def.name.clone(), status)
            })
            .collect()
    }
}
