// ==========================================
// 待打包订单发运系统 - 配置读取 Trait
// ==========================================
// 职责: 定义导入/发运模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigResult;
use crate::domain::ColumnMode;
use async_trait::async_trait;
use std::time::Duration;

// ==========================================
// 承运商连接参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CarrierSettings {
    pub endpoint_url: String,
    pub client_code: String,
    pub soap_action: String,
    pub namespace: String,
    pub timeout: Duration,
}

// ==========================================
// 重试参数
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

// ==========================================
// DispatchConfigReader Trait
// ==========================================
// 用途: 导入/暂存/发运所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait DispatchConfigReader: Send + Sync {
    // ===== 导入配置 =====

    /// 获取列定位模式
    ///
    /// # 默认值
    /// - HEADER
    async fn get_column_mode(&self) -> ConfigResult<ColumnMode>;

    /// 获取暂存批次有效期
    ///
    /// # 默认值
    /// - 120 分钟
    async fn get_staging_ttl(&self) -> ConfigResult<Duration>;

    // ===== 发运配置 =====

    /// 获取单个发运分组允许的最大 UCC 数（None 表示不限）
    ///
    /// # 默认值
    /// - 0（不限）
    async fn get_max_items_per_shipment(&self) -> ConfigResult<Option<usize>>;

    /// 获取承运商连接参数
    async fn get_carrier_settings(&self) -> ConfigResult<CarrierSettings>;

    /// 获取重试参数
    ///
    /// # 默认值
    /// - 3 次，初始 500ms，上限 5000ms
    async fn get_retry_settings(&self) -> ConfigResult<RetrySettings>;

    // ===== 补货完成配置 =====

    /// 获取补货完成服务地址
    async fn get_supply_completion_url(&self) -> ConfigResult<String>;
}

// 共享配置读取器（Arc<ConfigManager> / Arc<dyn DispatchConfigReader>）
#[async_trait]
impl<T> DispatchConfigReader for std::sync::Arc<T>
where
    T: DispatchConfigReader + ?Sized,
{
    async fn get_column_mode(&self) -> ConfigResult<ColumnMode> {
        (**self).get_column_mode().await
    }

    async fn get_staging_ttl(&self) -> ConfigResult<Duration> {
        (**self).get_staging_ttl().await
    }

    async fn get_max_items_per_shipment(&self) -> ConfigResult<Option<usize>> {
        (**self).get_max_items_per_shipment().await
    }

    async fn get_carrier_settings(&self) -> ConfigResult<CarrierSettings> {
        (**self).get_carrier_settings().await
    }

    async fn get_retry_settings(&self) -> ConfigResult<RetrySettings> {
        (**self).get_retry_settings().await
    }

    async fn get_supply_completion_url(&self) -> ConfigResult<String> {
        (**self).get_supply_completion_url().await
    }
}
