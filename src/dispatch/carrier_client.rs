// ==========================================
// 待打包订单发运系统 - 承运商客户端
// ==========================================
// CarrierService: 发运层依赖的承运商接口（便于替换/测试）
// SoapCarrierClient: SOAP 1.1 over HTTP 实现，显式超时
// 地址/超时/SOAPAction/命名空间随每次调用传入，修改配置后下一次发运即生效
// ==========================================

use crate::config::CarrierSettings;
use crate::dispatch::envelope::{parse_fault, SoapEnvelope};
use crate::dispatch::error::{CarrierError, DispatchError};
use crate::dispatch::payload::EmbarqueRequest;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, instrument};

/// 响应体截断长度（写入日志/台账）
const BODY_EXCERPT_CHARS: usize = 512;

/// 承运商受理回执
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierReceipt {
    pub http_status: u16,
    pub body_excerpt: String,
}

// ==========================================
// CarrierService Trait
// ==========================================
#[async_trait]
pub trait CarrierService: Send + Sync {
    /// 创建一票发运
    ///
    /// # 参数
    /// - settings: 本次发运读取的承运商配置
    /// - request: 发运报文
    ///
    /// # 返回
    /// - Ok(CarrierReceipt): 承运商受理
    /// - Err(CarrierError): 传输失败/HTTP 错误/SOAP Fault
    async fn create_shipment(
        &self,
        settings: &CarrierSettings,
        request: &EmbarqueRequest,
    ) -> Result<CarrierReceipt, CarrierError>;
}

// ==========================================
// SoapCarrierClient
// ==========================================
pub struct SoapCarrierClient {
    client: reqwest::Client,
    envelope: SoapEnvelope,
}

impl SoapCarrierClient {
    /// 创建客户端（连接池共享，超时按请求设置）
    pub fn new() -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| DispatchError::ClientInit(e.to_string()))?;
        let envelope = SoapEnvelope::new().map_err(|e| DispatchError::ClientInit(e.to_string()))?;

        Ok(Self { client, envelope })
    }
}

fn map_send_error(err: reqwest::Error, timeout: Duration) -> CarrierError {
    if err.is_timeout() {
        CarrierError::Timeout(timeout.as_millis() as u64)
    } else {
        CarrierError::Transport(err.to_string())
    }
}

#[async_trait]
impl CarrierService for SoapCarrierClient {
    #[instrument(
        skip(self, settings, request),
        fields(endpoint = %settings.endpoint_url, referencia = %request.embarques.embarque.referencia2)
    )]
    async fn create_shipment(
        &self,
        settings: &CarrierSettings,
        request: &EmbarqueRequest,
    ) -> Result<CarrierReceipt, CarrierError> {
        let body = self.envelope.render(&settings.namespace, request)?;

        let response = self
            .client
            .post(&settings.endpoint_url)
            .timeout(settings.timeout)
            .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
            .header("SOAPAction", format!("\"{}\"", settings.soap_action))
            .body(body)
            .send()
            .await
            .map_err(|e| map_send_error(e, settings.timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| map_send_error(e, settings.timeout))?;
        let excerpt: String = text.chars().take(BODY_EXCERPT_CHARS).collect();
        debug!(http_status = status.as_u16(), "承运商响应");

        // Fault 常以 500 返回，先于状态码判断
        if let Some((code, message)) = parse_fault(&text) {
            return Err(CarrierError::Fault { code, message });
        }

        if !status.is_success() {
            return Err(CarrierError::HttpStatus {
                status: status.as_u16(),
                body: excerpt,
            });
        }

        Ok(CarrierReceipt {
            http_status: status.as_u16(),
            body_excerpt: excerpt,
        })
    }
}
