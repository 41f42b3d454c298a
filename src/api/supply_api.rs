// ==========================================
// 待打包订单发运系统 - 补货完成API
// ==========================================

use crate::api::error::ApiResult;
use crate::config::DispatchConfigReader;
use crate::fulfillment::{
    build_completion, CapturedQuantity, SupplyCompletionService, SupplyOrder, SupplyProductLine,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

pub const MSG_COMPLETED: &str = "Alta exitosa";

/// 补货完成请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyCompletionRequest {
    pub order: SupplyOrder,
    pub lines: Vec<SupplyProductLine>,
    pub products: Vec<CapturedQuantity>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyCompletionResponse {
    pub success: bool,
    pub message: String,
}

pub struct SupplyApi {
    config: Arc<dyn DispatchConfigReader>,
    service: Arc<dyn SupplyCompletionService>,
}

impl SupplyApi {
    pub fn new(config: Arc<dyn DispatchConfigReader>, service: Arc<dyn SupplyCompletionService>) -> Self {
        Self { config, service }
    }

    /// 提交补货完成
    #[instrument(skip(self, request), fields(order_no = request.order.order_no, ue_no = %request.order.ue_no))]
    pub async fn complete(&self, request: &SupplyCompletionRequest) -> ApiResult<SupplyCompletionResponse> {
        let payload = build_completion(&request.order, &request.lines, &request.products)?;
        let url = self.config.get_supply_completion_url().await?;

        self.service.complete(&url, &payload).await?;
        info!(products = payload.productos_suministrados.len(), "补货完成");

        Ok(SupplyCompletionResponse {
            success: true,
            message: MSG_COMPLETED.to_string(),
        })
    }
}
