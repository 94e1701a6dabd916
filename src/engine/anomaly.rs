// ==========================================
// 工厂运营追溯核心 - 数据异常登记
// ==========================================
// 职责: 收集一次计算中发现的数据异常，逐条告警并按类别计数
// ==========================================

use crate::domain::anomaly::DataAnomaly;
use std::collections::BTreeMap;

/// 异常登记簿（单次计算内使用）
#[derive(Debug, Default)]
pub struct AnomalyLog {
    entries: Vec<DataAnomaly>,
}

impl AnomalyLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记异常并输出告警日志
    pub fn record(&mut self, anomaly: DataAnomaly) {
        tracing::warn!(code = anomaly.code(), "数据异常: {}", anomaly);
        self.entries.push(anomaly);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按类别计数
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        count_by_kind(&self.entries)
    }

    pub fn into_vec(self) -> Vec<DataAnomaly> {
        if !self.entries.is_empty() {
            tracing::info!("本次计算共登记数据异常: {:?}", self.counts());
        }
        self.entries
    }
}

/// 按类别统计异常数量
pub fn count_by_kind(anomalies: &[DataAnomaly]) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for a in anomalies {
        *counts.entry(a.code()).or_insert(0) += 1;
    }
    counts
}
