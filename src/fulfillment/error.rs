// ==========================================
// 待打包订单发运系统 - 补货完成错误类型
// ==========================================

use crate::config::ConfigError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FulfillmentError {
    #[error("no captured products")]
    EmptyCapture,

    #[error("missing product {}", join_ids(.0))]
    MissingProducts(Vec<i64>),

    #[error("invalid quantity for product {product_id}: {quantity}")]
    InvalidQuantity { product_id: i64, quantity: f64 },

    #[error("supply completion transport error: {0}")]
    Transport(String),

    #[error("supply completion HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("{message}")]
    Rejected { code: String, message: String },

    #[error("supply completion response error: {0}")]
    InvalidResponse(String),

    #[error("配置读取失败: {0}")]
    Config(#[from] ConfigError),
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(", ")
}

pub type FulfillmentResult<T> = Result<T, FulfillmentError>;
