// ==========================================
// 待打包订单发运系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含远程调用
// ==========================================

pub mod dispatch;
pub mod shipment;
pub mod types;

// 重导出核心类型
pub use dispatch::{DispatchReport, DispatchStatus, GroupOutcome};
pub use shipment::{ImportRow, ShipmentGroup, StagedBatch};
pub use types::{ColumnMode, ImportField};
