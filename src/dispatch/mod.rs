// ==========================================
// 待打包订单发运系统 - 发运层
// ==========================================
// 职责: 分组 → 承运商报文 → SOAP 调用（重试 + 幂等台账）
// ==========================================

pub mod carrier_client;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod idempotency;
pub mod payload;
pub mod retry;

pub use carrier_client::{CarrierReceipt, CarrierService, SoapCarrierClient};
pub use dispatcher::Dispatcher;
pub use envelope::SoapEnvelope;
pub use error::{CarrierError, DispatchError, DispatchResult, PayloadError};
pub use idempotency::idempotency_key;
pub use payload::{build_request, Embarque, EmbarqueRequest, Embarques};
pub use retry::{Attempted, RetryPolicy};
