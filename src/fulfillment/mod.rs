// ==========================================
// 待打包订单发运系统 - 补货完成（CEDIS 拣货结果回传）
// ==========================================

pub mod builder;
pub mod client;
pub mod error;
pub mod model;

pub use builder::build_completion;
pub use client::{RestSupplyCompletionClient, SupplyCompletionService};
pub use error::{FulfillmentError, FulfillmentResult};
pub use model::{
    CapturedQuantity, CompletionResponse, InformacionDetalleOrden, InformacionOrden,
    InformacionProductoSuministrado, InformacionSurtidor, SupplyOrder, SupplyProductLine,
};
