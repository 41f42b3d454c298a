// ==========================================
// 待打包订单发运系统 - 发运层错误类型
// ==========================================
// PayloadError: 本地组包失败 → 分组 REJECTED，不发起远程调用
// CarrierError: 远程调用失败 → 按 is_retryable 决定是否重试
// DispatchError: 整批发运无法进行（配置/台账）
// ==========================================

use crate::config::ConfigError;
use crate::importer::FieldValueError;
use crate::repository::RepositoryError;
use thiserror::Error;

/// 组包错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error(transparent)]
    InvalidField(#[from] FieldValueError),

    #[error("too many items: {items} > {max}")]
    TooManyItems { items: usize, max: usize },
}

/// 承运商调用错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CarrierError {
    #[error("carrier transport error: {0}")]
    Transport(String),

    #[error("carrier timeout after {0} ms")]
    Timeout(u64),

    #[error("carrier HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("carrier fault {code}: {message}")]
    Fault { code: String, message: String },

    #[error("carrier envelope error: {0}")]
    Envelope(String),
}

impl CarrierError {
    /// 仅传输层错误、超时、5xx 与 429 可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            CarrierError::Transport(_) | CarrierError::Timeout(_) => true,
            CarrierError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            CarrierError::Fault { .. } | CarrierError::Envelope(_) => false,
        }
    }
}

impl From<tera::Error> for CarrierError {
    fn from(err: tera::Error) -> Self {
        CarrierError::Envelope(err.to_string())
    }
}

/// 整批发运错误
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("配置读取失败: {0}")]
    Config(#[from] ConfigError),

    #[error("发运台账访问失败: {0}")]
    Ledger(#[from] RepositoryError),

    #[error("承运商客户端初始化失败: {0}")]
    ClientInit(String),
}

pub type DispatchResult<T> = Result<T, DispatchError>;
