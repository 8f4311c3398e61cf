//! 文件解码器
//!
//! 把上传的 .csv / .xlsx / .xls 字节流解码成统一的行结构
//! （原始列名 -> 单元格值），列名归一化与匹配交给下游的规则引擎。
//! 解码阶段失败属于文件级错误，整个请求失败且不产生任何写入。

use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use livepoints_rule_engine::Row;
use serde_json::Value;

use crate::error::{ImportError, Result};

/// 文件解码器
pub struct FileDecoder;

impl FileDecoder {
    /// 按文件扩展名解码字节流
    ///
    /// 第一行视作表头，之后每行映射为 `列名 -> 值`。
    /// 返回的行不含表头行；没有任何数据行时返回 [`ImportError::EmptyFile`]。
    pub fn decode(filename: &str, bytes: &[u8]) -> Result<Vec<Row>> {
        let extension = filename
            .rsplit('.')
            .next()
            .map(str::to_lowercase)
            .unwrap_or_default();

        let rows = match extension.as_str() {
            "csv" => Self::decode_csv(bytes)?,
            "xlsx" | "xls" => Self::decode_excel(bytes)?,
            _ => return Err(ImportError::UnsupportedFileType(filename.to_string())),
        };

        if rows.is_empty() {
            return Err(ImportError::EmptyFile);
        }

        Ok(rows)
    }

    /// 解码 CSV
    ///
    /// flexible 模式容忍行内字段数不一致，超出表头的字段丢弃，
    /// 缺少的字段按不存在处理。
    fn decode_csv(bytes: &[u8]) -> Result<Vec<Row>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::None)
            .from_reader(bytes);

        let headers = reader
            .headers()
            .map_err(|e| ImportError::FileDecode(format!("CSV 表头读取失败: {e}")))?
            .clone();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record =
                record.map_err(|e| ImportError::FileDecode(format!("CSV 行读取失败: {e}")))?;

            let mut row = Row::new();
            for (header, field) in headers.iter().zip(record.iter()) {
                row.insert(header.to_string(), Value::String(field.to_string()));
            }
            rows.push(row);
        }

        Ok(rows)
    }

    /// 解码 Excel（.xlsx / .xls）
    ///
    /// 只读第一个工作表，第一行作为表头。
    fn decode_excel(bytes: &[u8]) -> Result<Vec<Row>> {
        let cursor = Cursor::new(bytes.to_vec());
        let mut workbook = open_workbook_auto_from_rs(cursor)
            .map_err(|e| ImportError::FileDecode(format!("Excel 打开失败: {e}")))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ImportError::FileDecode("Excel 中没有工作表".to_string()))?
            .map_err(|e| ImportError::FileDecode(format!("Excel 工作表读取失败: {e}")))?;

        let mut row_iter = range.rows();
        let Some(header_row) = row_iter.next() else {
            return Ok(Vec::new());
        };

        let headers: Vec<String> = header_row.iter().map(Self::cell_to_header).collect();

        let mut rows = Vec::new();
        for cells in row_iter {
            let mut row = Row::new();
            for (header, cell) in headers.iter().zip(cells.iter()) {
                if header.is_empty() {
                    continue;
                }
                row.insert(header.clone(), Self::cell_to_value(cell));
            }
            rows.push(row);
        }

        Ok(rows)
    }

    /// 表头单元格转字符串
    ///
    /// 数字表头（如导出工具生成的列号）转为文本保留。
    fn cell_to_header(cell: &Data) -> String {
        match cell {
            Data::String(s) => s.clone(),
            Data::Float(f) => f.to_string(),
            Data::Int(i) => i.to_string(),
            Data::Bool(b) => b.to_string(),
            _ => String::new(),
        }
    }

    /// 数据单元格转 JSON 值
    fn cell_to_value(cell: &Data) -> Value {
        match cell {
            Data::Empty => Value::Null,
            Data::String(s) => Value::String(s.clone()),
            Data::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Data::Int(i) => Value::Number((*i).into()),
            Data::Bool(b) => Value::Bool(*b),
            Data::DateTime(dt) => serde_json::Number::from_f64(dt.as_f64())
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
            Data::Error(e) => Value::String(format!("#ERR {e:?}")),
        }
    }
}
