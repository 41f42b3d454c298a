// ==========================================
// 待打包订单发运系统 - API层错误类型
// ==========================================
// 职责: 将各层技术错误转换为调用方可读的错误消息
// 注意: 导入失败、分组失败不走这里（作为正常响应返回）
// ==========================================

use crate::config::ConfigError;
use crate::dispatch::DispatchError;
use crate::fulfillment::FulfillmentError;
use crate::repository::RepositoryError;
use crate::staging::StagingError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ===== 调用方错误 =====
    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ===== 业务错误 =====
    #[error("{0}")]
    SupplyCompletion(String),

    // ===== 基础设施错误 =====
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("承运商客户端错误: {0}")]
    CarrierSetup(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 是否由调用方输入导致
    pub fn is_client_error(&self) -> bool {
        matches!(self, ApiError::InvalidInput(_))
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        ApiError::DatabaseError(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<StagingError> for ApiError {
    fn from(err: StagingError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::Config(e) => e.into(),
            DispatchError::Ledger(e) => e.into(),
            DispatchError::ClientInit(msg) => ApiError::CarrierSetup(msg),
        }
    }
}

impl From<FulfillmentError> for ApiError {
    fn from(err: FulfillmentError) -> Self {
        match err {
            FulfillmentError::Config(e) => e.into(),
            e @ (FulfillmentError::EmptyCapture
            | FulfillmentError::MissingProducts(_)
            | FulfillmentError::InvalidQuantity { .. }) => ApiError::InvalidInput(e.to_string()),
            other => ApiError::SupplyCompletion(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
