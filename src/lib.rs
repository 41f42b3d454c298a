// ==========================================
// 待打包订单发运系统 - 核心库
// ==========================================
// 技术栈: Rust + axum + SQLite
// 系统定位: CEDIS 后台（Excel 导入 → 暂存 → 按参考号合并 → 承运商下单）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - Excel/CSV 解析与字段映射
pub mod importer;

// 引擎层 - 按参考号合并
pub mod engine;

// 暂存层 - 会话级导入批次
pub mod staging;

// 发运层 - 承运商报文、重试与调度
pub mod dispatch;

// 补货完成 - CEDIS 拣货结果回传
pub mod fulfillment;

// 数据仓储层 - 发运台账
pub mod repository;

// 配置层 - config_kv
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - HTTP 路由与共享状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    DispatchReport, DispatchStatus, GroupOutcome, ImportRow, ShipmentGroup, StagedBatch,
};
pub use engine::aggregator::{group_by_reference, ItemCapacity};
pub use importer::{ImportError, ShipmentImporter, ShipmentImporterImpl};
pub use staging::StagingStore;
pub use dispatch::{CarrierService, Dispatcher, SoapCarrierClient};
pub use api::{ApiError, ShipmentApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "待打包订单发运系统";
