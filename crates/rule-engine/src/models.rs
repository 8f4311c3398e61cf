//! 规则模型定义
//!
//! `PointRule` 是一条「条件 → 积分」映射，由外部规则管理端维护，
//! 导入核心在每个批次开始时取一次快照，整个批次内只读。

use serde::{Deserialize, Serialize};

/// 条件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
    Contains,
    Range,
}

impl ConditionType {
    /// 从存储字符串解析条件类型，未知类型返回 None
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "equals" => Some(Self::Equals),
            "not_equals" => Some(Self::NotEquals),
            "greater_than" => Some(Self::GreaterThan),
            "greater_or_equal" => Some(Self::GreaterOrEqual),
            "less_than" => Some(Self::LessThan),
            "less_or_equal" => Some(Self::LessOrEqual),
            "contains" => Some(Self::Contains),
            "range" => Some(Self::Range),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::GreaterOrEqual => "greater_or_equal",
            Self::LessThan => "less_than",
            Self::LessOrEqual => "less_or_equal",
            Self::Contains => "contains",
            Self::Range => "range",
        }
    }
}

/// 积分规则
///
/// `column_name` 兼容三种历史格式：单个列名、JSON 数组、`,` 或 `|`
/// 分隔的字符串，统一通过 [`PointRule::column_aliases`] 展开。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointRule {
    pub id: i64,
    pub name: String,
    /// 规则作用的数据列，可能是别名列表（见 column_aliases）
    pub column_name: String,
    pub condition_type: ConditionType,
    /// 条件值；range 类型为 "min,max" 形式
    pub condition_value: String,
    /// 命中后的积分变动（可为负）
    pub points: i64,
    /// 积分有效天数，None 表示永久有效
    pub validity_days: Option<i32>,
    /// 优先级，越大越先评估
    pub priority: i32,
    pub enabled: bool,
}

impl PointRule {
    /// 将 column_name 展开为候选列名列表
    ///
    /// 三种格式在一处解析（而不是散落在评估逻辑里）：
    /// 1. JSON 数组：`["直播观看时长", "watch_duration"]`
    /// 2. 分隔字符串：`直播观看时长,watch_duration` 或 `a|b`
    /// 3. 单个字面列名
    pub fn column_aliases(&self) -> Vec<String> {
        let raw = self.column_name.trim();
        if raw.is_empty() {
            return Vec::new();
        }

        // JSON 数组格式
        if raw.starts_with('[') {
            if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
                return list
                    .into_iter()
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
        }

        // 分隔字符串格式
        if raw.contains(',') || raw.contains('|') {
            return raw
                .split([',', '|'])
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        vec![raw.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_with_column(column_name: &str) -> PointRule {
        PointRule {
            id: 1,
            name: "观看时长".to_string(),
            column_name: column_name.to_string(),
            condition_type: ConditionType::GreaterOrEqual,
            condition_value: "30".to_string(),
            points: 10,
            validity_days: None,
            priority: 0,
            enabled: true,
        }
    }

    #[test]
    fn test_condition_type_parse_roundtrip() {
        for s in [
            "equals",
            "not_equals",
            "greater_than",
            "greater_or_equal",
            "less_than",
            "less_or_equal",
            "contains",
            "range",
        ] {
            let ct = ConditionType::parse(s).unwrap();
            assert_eq!(ct.as_str(), s);
        }
        assert!(ConditionType::parse("regex").is_none());
    }

    #[test]
    fn test_column_aliases_literal() {
        assert_eq!(
            rule_with_column("直播观看时长").column_aliases(),
            vec!["直播观看时长"]
        );
    }

    #[test]
    fn test_column_aliases_json_array() {
        let rule = rule_with_column(r#"["直播观看时长", "watch_duration"]"#);
        assert_eq!(rule.column_aliases(), vec!["直播观看时长", "watch_duration"]);
    }

    #[test]
    fn test_column_aliases_delimited() {
        let rule = rule_with_column("直播观看时长,watch_duration|duration");
        assert_eq!(
            rule.column_aliases(),
            vec!["直播观看时长", "watch_duration", "duration"]
        );
    }

    #[test]
    fn test_column_aliases_skips_empty_segments() {
        let rule = rule_with_column("a,,b, ");
        assert_eq!(rule.column_aliases(), vec!["a", "b"]);
    }

    #[test]
    fn test_column_aliases_bad_json_falls_back() {
        // 非法 JSON 按分隔字符串处理
        let rule = rule_with_column(r#"["a", "b""#);
        assert_eq!(rule.column_aliases(), vec![r#"["a""#, r#""b""#]);
    }
}
