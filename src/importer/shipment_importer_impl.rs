// ==========================================
// 待打包订单发运系统 - 发运单导入器实现
// ==========================================
// 职责: 整合导入流程，从上传内容到 ImportRow 列表
// 流程: 解析 → 列定位 → 映射/校验（任一行失败则整体失败）
// ==========================================

use crate::config::DispatchConfigReader;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::{FieldMapper, ImportOutcome, ShipmentImporter};
use async_trait::async_trait;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

// ==========================================
// ShipmentImporterImpl - 发运单导入器实现
// ==========================================
pub struct ShipmentImporterImpl<C>
where
    C: DispatchConfigReader,
{
    // 配置读取器
    config: C,

    // 导入组件
    file_parser: UniversalFileParser,
    field_mapper: Box<dyn FieldMapper>,
}

impl<C> ShipmentImporterImpl<C>
where
    C: DispatchConfigReader,
{
    /// 创建新的导入器实例
    ///
    /// # 参数
    /// - config: 配置读取器（列定位模式）
    /// - field_mapper: 字段映射器
    pub fn new(config: C, field_mapper: Box<dyn FieldMapper>) -> Self {
        Self {
            config,
            file_parser: UniversalFileParser,
            field_mapper,
        }
    }
}

#[async_trait]
impl<C> ShipmentImporter for ShipmentImporterImpl<C>
where
    C: DispatchConfigReader + Send + Sync,
{
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn import_bytes(&self, file_name: &str, bytes: &[u8]) -> ImportResult<ImportOutcome> {
        let start_time = Instant::now();
        info!(file_name = %file_name, "开始导入发运单");

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let sheet = self.file_parser.parse(file_name, bytes).map_err(|e| {
            warn!(error = %e, "文件解析失败");
            e
        })?;
        info!(
            data_rows = sheet.rows.len(),
            blank_rows = sheet.blank_rows,
            "文件解析完成"
        );

        // === 步骤 2: 列定位 ===
        debug!("步骤 2: 列定位");
        let mode = self
            .config
            .get_column_mode()
            .await
            .map_err(|e| ImportError::ConfigError(e.to_string()))?;
        let layout = self.field_mapper.resolve_layout(&sheet.headers, mode)?;
        debug!(mode = %layout.mode(), "列定位完成");

        // === 步骤 3: 字段映射 ===
        // 任一行失败即中止，已解析的行全部丢弃
        debug!("步骤 3: 字段映射");
        let mut rows = Vec::with_capacity(sheet.rows.len());
        for raw in &sheet.rows {
            let row = self.field_mapper.map_row(&layout, raw).map_err(|e| {
                warn!(row_number = raw.row_number, error = %e, "字段映射失败");
                e
            })?;
            rows.push(row);
        }

        let elapsed_time = start_time.elapsed();
        info!(
            rows = rows.len(),
            elapsed_ms = elapsed_time.as_millis() as u64,
            "发运单导入完成"
        );

        Ok(ImportOutcome {
            rows,
            blank_rows_skipped: sheet.blank_rows,
            column_mode: mode,
            elapsed_time,
        })
    }
}
