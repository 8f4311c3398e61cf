//! 时长解析器
//!
//! 把自由格式的观看时长文本统一换算成分钟数。来源数据混杂了
//! 冒号格式（`01:30:00`）、中英文单位（`1小时30分` / `45 mins`）
//! 和裸数字（`30`），解析失败一律按 0 处理，不让单个脏值中断导入。

use regex::Regex;
use std::sync::LazyLock;

static COLON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d{1,2})(?::(\d{1,2}))?$").expect("colon regex"));

static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:小时|小時|时|hours?|hrs?|h)").expect("hours regex")
});

// 单字母单位要求后面不是字母，避免把 "mb" / "sec" 之外的缩写误判；
// regex crate 不支持环视，用消耗一个非字母字符（或行尾）代替
static MINUTES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:分钟|分|minutes?|mins?|m(?:[^A-Za-z]|$))")
        .expect("minutes regex")
});

static SECONDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*(?:秒钟|秒|seconds?|secs?|s(?:[^A-Za-z]|$))")
        .expect("seconds regex")
});

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("number regex"));

/// 解析时长文本为分钟数
///
/// 解析顺序：
/// 1. 冒号格式。三段按 `HH:MM:SS`；两段时若首段 ≥ 24 按「分:秒」，
///    否则按「时:分」。该启发式与存量数据绑定，必须原样保留——
///    `23:45` 会被读作 23 小时 45 分，`25:45` 读作 25 分 45 秒。
/// 2. 单位标注片段求和（小时 ×60、秒 ÷60），支持小数如 `1.5小时`。
/// 3. 无单位片段时取文本中第一个数字，按分钟解释。
/// 4. 都没有则返回 0。
pub fn parse_duration_minutes(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }

    if let Some(caps) = COLON_RE.captures(text) {
        let first: f64 = caps[1].parse().unwrap_or(0.0);
        let second: f64 = caps[2].parse().unwrap_or(0.0);
        return match caps.get(3) {
            Some(third) => {
                let seconds: f64 = third.as_str().parse().unwrap_or(0.0);
                first * 60.0 + second + seconds / 60.0
            }
            None if first >= 24.0 => first + second / 60.0,
            None => first * 60.0 + second,
        };
    }

    let mut total = 0.0;
    let mut unit_found = false;

    for caps in HOURS_RE.captures_iter(text) {
        total += caps[1].parse::<f64>().unwrap_or(0.0) * 60.0;
        unit_found = true;
    }
    for caps in MINUTES_RE.captures_iter(text) {
        total += caps[1].parse::<f64>().unwrap_or(0.0);
        unit_found = true;
    }
    for caps in SECONDS_RE.captures_iter(text) {
        total += caps[1].parse::<f64>().unwrap_or(0.0) / 60.0;
        unit_found = true;
    }

    if unit_found {
        return total;
    }

    NUMBER_RE
        .find(text)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0.0)
}
