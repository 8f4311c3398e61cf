//! 条件评估器
//!
//! 对单条规则和已解析的列值做命中判定。评估本身是纯函数且不会
//! panic；返回 Err 的情况（如区间条件值格式错误）由调用方按
//! 「该规则本行不命中」处理，不中断整行评估。

use crate::duration::parse_duration_minutes;
use crate::error::{Result, RuleError};
use crate::models::{ConditionType, PointRule};
use serde_json::Value;

/// 条件评估器
pub struct RuleEvaluator;

impl RuleEvaluator {
    /// 评估规则是否命中
    ///
    /// # Arguments
    /// * `rule` - 规则定义
    /// * `value` - 列名解析器取出的单元格值
    ///
    /// 空值（Null / 空白字符串）直接判定为不命中，不进入条件分支。
    pub fn evaluate(rule: &PointRule, value: &Value) -> Result<bool> {
        if Self::is_empty(value) {
            return Ok(false);
        }

        match rule.condition_type {
            ConditionType::Equals => {
                Ok(Self::value_to_string(value).trim() == rule.condition_value.trim())
            }
            ConditionType::NotEquals => {
                Ok(Self::value_to_string(value).trim() != rule.condition_value.trim())
            }
            ConditionType::GreaterThan => Self::compare(rule, value, |a, b| a > b),
            ConditionType::GreaterOrEqual => Self::compare(rule, value, |a, b| a >= b),
            ConditionType::LessThan => Self::compare(rule, value, |a, b| a < b),
            ConditionType::LessOrEqual => Self::compare(rule, value, |a, b| a <= b),
            // 包含判断保持大小写敏感且不做 trim
            ConditionType::Contains => {
                Ok(Self::value_to_string(value).contains(&rule.condition_value))
            }
            ConditionType::Range => Self::in_range(rule, value),
        }
    }

    /// 判断单元格值是否为空
    fn is_empty(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 数值比较
    ///
    /// 行值和条件值都先过时长解析器，这样同一条规则既能匹配
    /// 纯数字列（"45"）也能匹配时长文本列（"0小时45分"）。
    fn compare<F>(rule: &PointRule, value: &Value, cmp: F) -> Result<bool>
    where
        F: Fn(f64, f64) -> bool,
    {
        let actual = parse_duration_minutes(&Self::value_to_string(value));
        let expected = parse_duration_minutes(rule.condition_value.trim());
        Ok(cmp(actual, expected))
    }

    /// 区间判断 (range)
    ///
    /// 条件值须为 "min,max" 两段，min/max 和行值都按时长解析，
    /// 命中条件 min <= value <= max。
    fn in_range(rule: &PointRule, value: &Value) -> Result<bool> {
        let parts: Vec<&str> = rule.condition_value.split(',').collect();
        if parts.len() != 2 {
            return Err(RuleError::InvalidRange(format!(
                "range 条件值需要 \"min,max\" 两段，实际: '{}'",
                rule.condition_value
            )));
        }

        let min = parse_duration_minutes(parts[0].trim());
        let max = parse_duration_minutes(parts[1].trim());
        let actual = parse_duration_minutes(&Self::value_to_string(value));

        Ok(min <= actual && actual <= max)
    }

    /// 单元格值转字符串
    fn value_to_string(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => other.to_string(),
        }
    }
}
