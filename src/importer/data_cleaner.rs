// ==========================================
// 待打包订单发运系统 - 数据清洗器实现
// ==========================================
// 职责: TRIM / 表头规范化 / 数值解析 / 电话与邮编规范化
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use thiserror::Error;

/// 发运阶段的字段校验错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldValueError {
    #[error("invalid postal code: '{0}'")]
    InvalidPostalCode(String),

    #[error("invalid phone: '{0}'")]
    InvalidPhone(String),
}

pub struct DataCleaner;

impl DataCleaner {
    /// 清洗文本字段（TRIM）
    pub fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    /// 表头规范化：小写、去重音、只保留字母数字
    ///
    /// "Código Postal" / "codigo_postal" / "CP " 之类写法都能命中别名
    pub fn normalize_header(&self, value: &str) -> String {
        value
            .trim()
            .to_lowercase()
            .chars()
            .map(strip_accent)
            .filter(|c| c.is_ascii_alphanumeric())
            .collect()
    }

    /// 解析件数：正整数；兼容 Excel 数值单元格的 "3.0"
    pub fn parse_quantity(&self, value: &str, row: usize, field: &str) -> ImportResult<i32> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ImportError::RequiredFieldMissing {
                row,
                field: field.to_string(),
            });
        }

        let parsed = match trimmed.parse::<i64>() {
            Ok(v) => v,
            Err(_) => {
                let float = trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite() && f.fract() == 0.0)
                    .ok_or_else(|| ImportError::TypeConversionError {
                        row,
                        field: field.to_string(),
                        message: format!("无法解析为整数: {}", trimmed),
                    })?;
                float as i64
            }
        };

        if parsed <= 0 {
            return Err(ImportError::ValueRangeError {
                row,
                field: field.to_string(),
                value: parsed,
            });
        }

        i32::try_from(parsed).map_err(|_| ImportError::TypeConversionError {
            row,
            field: field.to_string(),
            message: format!("超出整数范围: {}", trimmed),
        })
    }

    /// 邮编 → 整数（承运商报文要求数值）
    pub fn parse_postal_code(&self, value: &str) -> Result<i32, FieldValueError> {
        let trimmed = value.trim();
        if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
            return Err(FieldValueError::InvalidPostalCode(value.to_string()));
        }
        trimmed
            .parse::<i32>()
            .map_err(|_| FieldValueError::InvalidPostalCode(value.to_string()))
    }

    /// 电话规范化：去掉空格和常见分隔符，保留数字与开头的 '+'
    ///
    /// 结果仍是字符串，前导 0 不丢失
    pub fn normalize_phone(&self, value: &str) -> Result<String, FieldValueError> {
        let mut normalized = String::with_capacity(value.len());
        for (idx, c) in value.trim().chars().enumerate() {
            match c {
                '0'..='9' => normalized.push(c),
                '+' if idx == 0 => normalized.push(c),
                ' ' | '-' | '(' | ')' | '.' | '\t' => {}
                _ => return Err(FieldValueError::InvalidPhone(value.to_string())),
            }
        }

        let digits = normalized.chars().filter(|c| c.is_ascii_digit()).count();
        if digits < 7 {
            return Err(FieldValueError::InvalidPhone(value.to_string()));
        }
        Ok(normalized)
    }
}

fn strip_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ä' | 'â' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        _ => c,
    }
}
