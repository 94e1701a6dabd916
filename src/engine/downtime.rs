// ==========================================
// 工厂运营追溯核心 - 停机归因引擎
// ==========================================
// 输入: 某区域在 [from, to) 内的停机事件 + 该区域的每日休息窗口
// 输出: 每次停机的净时长明细 + 按工位汇总
// ==========================================
// 计算口径:
// - 休息窗口落到停机开始时刻所在日期；跨零点窗口另取前一日开始的那一段
// - break_seconds = Σ max(0, min(off, b.end) - max(on, b.start))
// - net_seconds = (off - on) - break_seconds，<= 0 的事件剔除
// - 汇总按 total_seconds 降序
// ==========================================

use crate::domain::anomaly::DataAnomaly;
use crate::domain::downtime::{
    BreakWindow, DowntimeDetailRow, DowntimeReport, StationAggregate, StoppageEvent,
};
use crate::engine::anomaly::AnomalyLog;
use crate::engine::time_utils::{
    format_clock, format_span, overlap_seconds, subtract_intervals, PlantClock, Span,
};
use chrono::NaiveDateTime;
use std::collections::BTreeMap;

const SECONDS_PER_DAY: i64 = 24 * 3600;

// ==========================================
// EventAttribution - 单次停机归因结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventAttribution {
    pub total_seconds: i64, // 停机总秒数（负值截断为 0）
    pub break_seconds: i64, // 与休息窗口重叠的秒数（逐窗口累加）
    pub net_seconds: i64,   // 净停机秒数，恒满足 0 <= net <= total
}

/// 计算单次停机扣除休息时间后的净时长
///
/// `breaks` 为已落到具体日期的休息区间。
pub fn attribute_event(stoppage: &Span, breaks: &[Span]) -> EventAttribution {
    let total_seconds = stoppage.seconds().max(0);
    let break_seconds: i64 = breaks.iter().map(|b| overlap_seconds(stoppage, b)).sum();
    let net_seconds = (total_seconds - break_seconds).clamp(0, total_seconds);
    EventAttribution {
        total_seconds,
        break_seconds,
        net_seconds,
    }
}

/// 已归因的停机（内部中间结果）
#[derive(Debug, Clone)]
struct AttributedStop {
    event_id: i64,
    station: String,
    on: NaiveDateTime,
    off: NaiveDateTime,
    break_seconds: i64,
    net_seconds: i64,
}

// ==========================================
// DowntimeAttributionEngine - 停机归因引擎
// ==========================================
/// 停机归因引擎
///
/// 纯计算，不做 I/O。输入时间会先按工厂时钟归一化再比较。
#[derive(Debug, Clone, Default)]
pub struct DowntimeAttributionEngine {
    clock: PlantClock,
}

impl DowntimeAttributionEngine {
    pub fn new(clock: PlantClock) -> Self {
        Self { clock }
    }

    /// 计算区域停机归因
    ///
    /// # 参数
    /// - `location`: 区域
    /// - `from` / `to`: 工厂本地时间，半开区间 [from, to)
    /// - `stoppages`: 停机事件（未结束的事件会被排除）
    /// - `breaks`: 区域休息窗口
    ///
    /// # 返回
    /// - 明细按工位升序分组、组内按停机时刻编号；汇总按净停机降序
    pub fn attribute(
        &self,
        location: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
        stoppages: &[StoppageEvent],
        breaks: &[BreakWindow],
    ) -> DowntimeReport {
        let window = Span::new(from, to);
        let mut anomalies = AnomalyLog::new();
        let mut by_station: BTreeMap<String, Vec<AttributedStop>> = BTreeMap::new();
        let mut absorbed = 0usize;

        for event in stoppages {
            let Some(off) = event.off.as_ref() else {
                continue;
            };
            let on = self.clock.normalize(&event.on);
            let off = self.clock.normalize(off);
            if !window.contains(on) {
                continue;
            }

            if off < on {
                anomalies.record(DataAnomaly::NegativeStoppage {
                    event_id: event.id,
                    station: event.station.clone(),
                });
            }

            let stop = Span::new(on, off);
            let date = on.date();
            let materialized: Vec<Span> = breaks
                .iter()
                .flat_map(|b| b.instances_touching(date))
                .map(|(start, end)| Span::new(start, end))
                .collect();
            let attribution = attribute_event(&stop, &materialized);

            // 休息窗口互相重叠时，逐窗口累加会重复扣除
            let uncovered: i64 = subtract_intervals(&stop, &materialized)
                .iter()
                .map(Span::seconds)
                .sum();
            let covered = attribution.total_seconds - uncovered;
            if attribution.break_seconds > covered {
                anomalies.record(DataAnomaly::OverlappingBreaks {
                    event_id: event.id,
                    double_counted_seconds: attribution.break_seconds - covered,
                });
            }

            if attribution.net_seconds <= 0 {
                absorbed += 1;
                continue;
            }
            if attribution.net_seconds >= SECONDS_PER_DAY {
                anomalies.record(DataAnomaly::NetDurationOverDay {
                    event_id: event.id,
                    net_seconds: attribution.net_seconds,
                });
            }

            by_station
                .entry(event.station.clone())
                .or_default()
                .push(AttributedStop {
                    event_id: event.id,
                    station: event.station.clone(),
                    on,
                    off,
                    break_seconds: attribution.break_seconds,
                    net_seconds: attribution.net_seconds,
                });
        }

        let mut detail = Vec::new();
        let mut summary = Vec::with_capacity(by_station.len());
        for (station, mut stops) in by_station {
            stops.sort_by(|a, b| a.on.cmp(&b.on).then(a.event_id.cmp(&b.event_id)));

            let total_seconds: i64 = stops.iter().map(|s| s.net_seconds).sum();
            summary.push(StationAggregate {
                station: station.clone(),
                total_seconds,
                stop_count: stops.len(),
                total_duration: format_span(total_seconds),
            });

            detail.extend(stops.into_iter().enumerate().map(|(idx, s)| DowntimeDetailRow {
                station: s.station,
                seq_no: idx + 1,
                event_id: s.event_id,
                date: s.on.date(),
                stop_time: s.on,
                start_time: s.off,
                break_seconds: s.break_seconds,
                duration_seconds: s.net_seconds,
                duration: format_clock(s.net_seconds),
            }));
        }

        summary.sort_by(|a, b| {
            b.total_seconds
                .cmp(&a.total_seconds)
                .then_with(|| a.station.cmp(&b.station))
        });

        tracing::debug!(
            location,
            stations = summary.len(),
            counted = detail.len(),
            absorbed,
            "停机归因完成"
        );

        DowntimeReport {
            location: location.to_string(),
            from,
            to,
            summary,
            detail,
            anomalies: anomalies.into_vec(),
        }
    }
}
