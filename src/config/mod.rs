// ==========================================
// 待打包订单发运系统 - 配置层
// ==========================================
// 职责: 系统配置管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod dispatch_config_trait;
pub mod error;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DEFAULTS};
pub use dispatch_config_trait::{CarrierSettings, DispatchConfigReader, RetrySettings};
pub use error::{ConfigError, ConfigResult};
