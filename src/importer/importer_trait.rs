// ==========================================
// 待打包订单发运系统 - 导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 解析 → 列定位 → 字段映射/校验
// ==========================================

use crate::domain::{ColumnMode, ImportRow};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::ColumnLayout;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

// ==========================================
// 原始表格结构（阶段 0 输出）
// ==========================================

/// 一行原始单元格（已 TRIM，全空行已剔除）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub row_number: usize,
    pub cells: Vec<String>,
}

/// 第一个工作表的表头 + 数据行
#[derive(Debug, Clone, Default)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub blank_rows: usize,
}

// ==========================================
// 导入结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
pub struct ImportOutcome {
    pub rows: Vec<ImportRow>,
    pub blank_rows_skipped: usize,
    pub column_mode: ColumnMode,
    pub elapsed_time: Duration,
}

// ==========================================
// ShipmentImporter Trait
// ==========================================
// 用途: 导入主接口
// 实现者: ShipmentImporterImpl
#[async_trait]
pub trait ShipmentImporter: Send + Sync {
    /// 从上传的文件内容导入
    ///
    /// # 参数
    /// - file_name: 原始文件名（用于判断格式）
    /// - bytes: 文件内容
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 全部行映射成功
    /// - Err: 任意一行失败即整体失败，不返回部分结果
    async fn import_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ImportOutcome>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: SpreadsheetParser, CsvParser
pub trait FileParser: Send + Sync {
    /// 解析第一个工作表：首行为表头，其余为数据行
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<RawSheet>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 列定位 + 字段映射接口（阶段 1-2）
// 实现者: FieldMapper
pub trait FieldMapper: Send + Sync {
    /// 根据表头与列模式确定各字段所在列
    fn resolve_layout(&self, headers: &[String], mode: ColumnMode) -> ImportResult<ColumnLayout>;

    /// 将一行原始单元格映射为 ImportRow
    fn map_row(&self, layout: &ColumnLayout, row: &RawRow) -> ImportResult<ImportRow>;
}
