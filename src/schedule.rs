// src/schedule.rs

//! 周次与上课时间字符串的解析。

use crate::error::{AppError, AppResult};
use itertools::Itertools;
use regex::Regex;
use std::{collections::BTreeSet, fmt, sync::LazyLock};

static WEEKDAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"星期\s*([一二三四五六日天1-7])").unwrap());
static PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([\d,\-]+)\s*节").unwrap());

/// 一组上课周次。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeekSet(BTreeSet<u32>);

impl WeekSet {
    /// 解析形如 "1-4,6,8-10" 的周次描述，区间两端都包含在内。
    pub fn parse(pattern: &str) -> AppResult<Self> {
        let mut weeks = BTreeSet::new();
        for part in pattern.split([',', '，']).map(str::trim) {
            if part.is_empty() {
                continue;
            }
            if let Some((start, end)) = part.split_once('-') {
                let start = parse_week(start, pattern)?;
                let end = parse_week(end, pattern)?;
                if start > end {
                    return Err(AppError::WeekPattern(format!(
                        "'{}' 中的区间 '{}' 起始周大于结束周",
                        pattern, part
                    )));
                }
                weeks.extend(start..=end);
            } else {
                weeks.insert(parse_week(part, pattern)?);
            }
        }
        Ok(Self(weeks))
    }

    /// 当前集合中的每一周都在 `other` 中出现时返回 true。
    pub fn is_subset(&self, other: &WeekSet) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn extend(&mut self, other: &WeekSet) {
        self.0.extend(other.0.iter().copied());
    }

    pub fn contains(&self, week: u32) -> bool {
        self.0.contains(&week)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// 以压缩后的区间形式输出，如 "1-4,6"。
impl fmt::Display for WeekSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut runs: Vec<(u32, u32)> = Vec::new();
        for &week in &self.0 {
            match runs.last_mut() {
                Some((_, end)) if *end + 1 == week => *end = week,
                _ => runs.push((week, week)),
            }
        }
        let text = runs
            .iter()
            .map(|&(start, end)| {
                if start == end {
                    start.to_string()
                } else {
                    format!("{}-{}", start, end)
                }
            })
            .join(",");
        f.write_str(&text)
    }
}

impl FromIterator<u32> for WeekSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// 一个学期允许出现的最大周次
pub const MAX_WEEK: u32 = 60;

fn parse_week(token: &str, pattern: &str) -> AppResult<u32> {
    let week = token.trim().parse::<u32>().map_err(|_| {
        AppError::WeekPattern(format!("'{}' 中的 '{}' 不是有效的周次", pattern, token.trim()))
    })?;
    if week > MAX_WEEK {
        return Err(AppError::WeekPattern(format!(
            "'{}' 中的周次 {} 超过上限 {}",
            pattern, week, MAX_WEEK
        )));
    }
    Ok(week)
}

/// 上课时间字符串中的一个时间段："<周次>周 星期<X> <节次>节"。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSlot {
    pub weeks: WeekSet,
    pub weekday: Option<u8>,
    pub periods: Option<String>,
}

impl ScheduleSlot {
    /// 没有 "周" 的片段不是时间段，返回 `Ok(None)`。
    pub fn parse(segment: &str) -> AppResult<Option<Self>> {
        let Some((week_part, rest)) = segment.split_once('周') else {
            return Ok(None);
        };
        let weeks = WeekSet::parse(week_part.trim())?;
        let weekday = WEEKDAY_RE
            .captures(rest)
            .and_then(|caps| caps.get(1))
            .and_then(|m| weekday_number(m.as_str()));
        let periods = PERIOD_RE
            .captures(rest)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string());
        Ok(Some(Self {
            weeks,
            weekday,
            periods,
        }))
    }
}

fn weekday_number(text: &str) -> Option<u8> {
    match text {
        "一" | "1" => Some(1),
        "二" | "2" => Some(2),
        "三" | "3" => Some(3),
        "四" | "4" => Some(4),
        "五" | "5" => Some(5),
        "六" | "6" => Some(6),
        "日" | "天" | "7" => Some(7),
        _ => None,
    }
}

/// 拆分后端返回的组合上课时间，一门课可能包含多个用 `<br>` 或 `、` 分隔的时间段。
pub fn parse_schedule(raw: &str) -> AppResult<Vec<ScheduleSlot>> {
    let mut slots = Vec::new();
    for segment in raw.split("<br>").flat_map(|part| part.trim().split('、')) {
        if let Some(slot) = ScheduleSlot::parse(segment.trim())? {
            slots.push(slot);
        }
    }
    Ok(slots)
}

/// 上课时间中所有时间段覆盖的周次合集；字符串中完全没有周次信息时返回 `None`。
pub fn covered_weeks(raw: &str) -> AppResult<Option<WeekSet>> {
    if !raw.contains('周') {
        return Ok(None);
    }
    let mut weeks = WeekSet::default();
    for slot in parse_schedule(raw)? {
        weeks.extend(&slot.weeks);
    }
    Ok(Some(weeks))
}
