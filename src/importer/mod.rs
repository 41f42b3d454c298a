// ==========================================
// 待打包订单发运系统 - 导入层
// ==========================================
// 职责: 上传文件 → ImportRow 列表
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod shipment_importer_impl;

// 重导出核心类型
pub use data_cleaner::{DataCleaner, FieldValueError};
pub use error::{ImportError, ImportResult};
pub use field_mapper::{ColumnLayout, FieldMapper as FieldMapperImpl};
pub use file_parser::{CsvParser, SpreadsheetParser, UniversalFileParser};
pub use shipment_importer_impl::ShipmentImporterImpl;

// 重导出 Trait 接口
pub use importer_trait::{FieldMapper, FileParser, ImportOutcome, RawRow, RawSheet, ShipmentImporter};
