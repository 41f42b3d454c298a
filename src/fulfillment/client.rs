// ==========================================
// 待打包订单发运系统 - 补货完成服务客户端
// ==========================================
// POST JSON → { code, message }；code != "00" 视为业务失败
// ==========================================

use crate::fulfillment::error::{FulfillmentError, FulfillmentResult};
use crate::fulfillment::model::{CompletionResponse, InformacionOrden};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// 服务成功码
const SUCCESS_CODE: &str = "00";

#[async_trait]
pub trait SupplyCompletionService: Send + Sync {
    /// 提交补货完成
    ///
    /// # 返回
    /// - Ok(message): 服务受理，返回服务消息
    async fn complete(&self, url: &str, request: &InformacionOrden) -> FulfillmentResult<String>;
}

pub struct RestSupplyCompletionClient {
    client: reqwest::Client,
}

impl RestSupplyCompletionClient {
    pub fn new(timeout: Duration) -> FulfillmentResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FulfillmentError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl SupplyCompletionService for RestSupplyCompletionClient {
    #[instrument(skip(self, request), fields(order = %request.orden.numero_orden))]
    async fn complete(&self, url: &str, request: &InformacionOrden) -> FulfillmentResult<String> {
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| FulfillmentError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FulfillmentError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(FulfillmentError::HttpStatus {
                status: status.as_u16(),
                body: text.chars().take(512).collect(),
            });
        }

        let body: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| FulfillmentError::InvalidResponse(e.to_string()))?;

        if body.code != SUCCESS_CODE {
            warn!(code = %body.code, message = %body.message, "补货完成被拒绝");
            return Err(FulfillmentError::Rejected {
                code: body.code,
                message: body.message,
            });
        }

        info!(products = request.productos_suministrados.len(), "补货完成已提交");
        Ok(body.message)
    }
}
