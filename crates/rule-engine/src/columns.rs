//! 列名解析器
//!
//! 运营导出的表格列名拼写不稳定：中英文混用、带 BOM、夹杂
//! 全角/半角空白、大小写随意。解析器把行的实际列名和规则配置的
//! 候选列名归一化到同一形态后再查找。

use serde_json::Value;
use std::collections::HashMap;

/// 一行解码后的数据：原始列名 -> 单元格值
pub type Row = serde_json::Map<String, Value>;

/// 归一化列名
///
/// 依次：去掉前导 BOM、移除所有空白字符（包含全角空格 U+3000）、转小写。
pub fn normalize_header(s: &str) -> String {
    s.trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// 单行的列值解析器
///
/// 构造时一次性建立归一化列名 -> 值的映射，之后按候选名顺序查找。
/// 纯数据结构，无副作用。
pub struct ColumnResolver<'a> {
    values: HashMap<String, &'a Value>,
}

impl<'a> ColumnResolver<'a> {
    /// 对一行数据建立归一化索引
    ///
    /// 同一行内归一化后重名的列保留先出现的那个。
    pub fn new(row: &'a Row) -> Self {
        let mut values = HashMap::with_capacity(row.len());
        for (key, value) in row {
            values.entry(normalize_header(key)).or_insert(value);
        }
        Self { values }
    }

    /// 按候选名顺序查找列值，返回第一个命中的值
    pub fn resolve(&self, candidates: &[String]) -> Option<&'a Value> {
        self.resolve_entry(candidates).map(|(_, v)| v)
    }

    /// 按候选名顺序查找，返回 (命中的候选名, 值)
    ///
    /// 命中的候选名用于拼接流水描述，保留调用方传入的原始拼写。
    pub fn resolve_entry<'c>(&self, candidates: &'c [String]) -> Option<(&'c str, &'a Value)> {
        for candidate in candidates {
            if let Some(value) = self.values.get(&normalize_header(candidate)) {
                return Some((candidate.as_str(), value));
            }
        }
        None
    }
}
