// ==========================================
// 工厂运营追溯核心 - 时间与区间工具
// ==========================================
// 职责: 本地时间归一化、区间重叠/扣减、时长格式化
// 红线: 不同偏移的时间戳禁止直接比较，必须先经 PlantClock 归一化
// ==========================================

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};

/// 默认工厂时区偏移（UTC+08:00，单位: 分钟）
pub const DEFAULT_PLANT_UTC_OFFSET_MINUTES: i32 = 8 * 60;

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

// ==========================================
// PlantClock - 工厂本地时钟
// ==========================================
/// 工厂本地时钟
///
/// 所有时间比较都在同一固定偏移下进行。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlantClock {
    offset: FixedOffset,
}

impl PlantClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// 按 UTC 偏移分钟数创建（超出 ±24h 返回 None）
    pub fn from_utc_offset_minutes(minutes: i32) -> Option<Self> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(Self::new)
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// 归一化为工厂本地时间
    pub fn normalize(&self, ts: &DateTime<FixedOffset>) -> NaiveDateTime {
        ts.with_timezone(&self.offset).naive_local()
    }

    /// 将工厂本地时间还原为带偏移的时间戳
    pub fn localize(&self, local: NaiveDateTime) -> DateTime<FixedOffset> {
        // 固定偏移下本地时间与瞬时一一对应
        let utc = local - chrono::Duration::seconds(i64::from(self.offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc, self.offset)
    }

    /// 解析时间戳文本
    ///
    /// 支持 RFC 3339（带偏移）；不带偏移的文本按工厂本地时间解释。
    pub fn parse(&self, raw: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        let raw = raw.trim();
        match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => Ok(ts),
            Err(rfc_err) => {
                for fmt in NAIVE_FORMATS {
                    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
                        return Ok(self.localize(naive));
                    }
                }
                Err(rfc_err)
            }
        }
    }
}

impl Default for PlantClock {
    fn default() -> Self {
        Self::from_utc_offset_minutes(DEFAULT_PLANT_UTC_OFFSET_MINUTES)
            .unwrap_or_else(|| Self::new(Utc.fix()))
    }
}

// ==========================================
// Span - 本地时间半开区间 [start, end)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Span {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// 区间长度（秒），结束早于开始时为负
    pub fn seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        self.start <= ts && ts < self.end
    }
}

/// 两区间重叠秒数: max(0, min(end) - max(start))
pub fn overlap_seconds(a: &Span, b: &Span) -> i64 {
    let start = a.start.max(b.start);
    let end = a.end.min(b.end);
    (end - start).num_seconds().max(0)
}

/// 从 base 中扣除 to_remove 覆盖的部分
///
/// to_remove 可以无序、可以互相重叠，返回结果按时间升序且互不重叠。
pub fn subtract_intervals(base: &Span, to_remove: &[Span]) -> Vec<Span> {
    if base.is_empty() {
        return Vec::new();
    }

    let mut removals: Vec<Span> = to_remove.iter().copied().filter(|s| !s.is_empty()).collect();
    removals.sort();

    let mut result = Vec::new();
    let mut cursor = base.start;
    for r in removals {
        if r.end <= cursor {
            continue;
        }
        if r.start >= base.end {
            break;
        }
        if r.start > cursor {
            result.push(Span::new(cursor, r.start));
        }
        cursor = cursor.max(r.end);
        if cursor >= base.end {
            return result;
        }
    }
    if cursor < base.end {
        result.push(Span::new(cursor, base.end));
    }
    result
}

/// 时钟格式 HH:MM:SS（假定不足 24 小时）
pub fn format_clock(seconds: i64) -> String {
    let s = seconds.max(0);
    format!("{:02}:{:02}:{:02}", s / 3600, (s % 3600) / 60, s % 60)
}

/// 时长格式，小时数不设上限，如 `27h 05m 00s`
pub fn format_span(seconds: i64) -> String {
    let s = seconds.max(0);
    format!("{}h {:02}m {:02}s", s / 3600, (s % 3600) / 60, s % 60)
}
