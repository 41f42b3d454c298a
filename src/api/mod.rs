// ==========================================
// 待打包订单发运系统 - API 层
// ==========================================
// 职责: 组合导入/暂存/发运/补货完成，输出前端约定的响应形状
// 红线: 不直接访问数据库，不处理 HTTP 细节
// ==========================================

pub mod error;
pub mod shipment_api;
pub mod supply_api;

pub use error::{ApiError, ApiResult};
pub use shipment_api::{DispatchResponse, ImportResponse, ShipmentApi, StagedResponse};
pub use supply_api::{SupplyApi, SupplyCompletionRequest, SupplyCompletionResponse};
