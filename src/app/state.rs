// ==========================================
// 待打包订单发运系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 共享: 一个 SQLite 连接（config_kv + dispatch_ledger）
// ==========================================

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::api::{ShipmentApi, SupplyApi};
use crate::config::{ConfigManager, DispatchConfigReader};
use crate::db::open_sqlite_connection;
use crate::dispatch::{CarrierService, Dispatcher, SoapCarrierClient};
use crate::fulfillment::{RestSupplyCompletionClient, SupplyCompletionService};
use crate::importer::{FieldMapperImpl, ShipmentImporterImpl};
use crate::repository::DispatchLedgerRepository;
use crate::staging::StagingStore;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "PACKING_DISPATCH_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源，作为 axum 路由的共享状态
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 配置管理器
    pub config: Arc<ConfigManager>,

    /// 会话暂存
    pub staging: Arc<StagingStore>,

    /// 发运台账
    pub ledger: Arc<DispatchLedgerRepository>,

    /// 发运单API
    pub shipment_api: Arc<ShipmentApi>,

    /// 补货完成API
    pub supply_api: Arc<SupplyApi>,
}

impl AppState {
    /// 创建新的AppState实例（真实承运商/补货完成客户端）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Err(String): 初始化错误
    pub async fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let config = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let seeded = config
            .seed_defaults()
            .map_err(|e| format!("默认配置写入失败: {}", e))?;
        if seeded > 0 {
            tracing::info!(seeded = seeded, "已写入默认配置");
        }

        let ledger = Arc::new(DispatchLedgerRepository::from_connection(conn));

        // 承运商配置由发运时读取；补货完成客户端的超时在启动时确定，修改后需重启
        let supply_timeout = config
            .get_carrier_settings()
            .await
            .map_err(|e| format!("承运商配置读取失败: {}", e))?
            .timeout;
        let carrier: Arc<dyn CarrierService> = Arc::new(
            SoapCarrierClient::new().map_err(|e| format!("无法创建承运商客户端: {}", e))?,
        );
        let supply: Arc<dyn SupplyCompletionService> = Arc::new(
            RestSupplyCompletionClient::new(supply_timeout)
                .map_err(|e| format!("无法创建补货完成客户端: {}", e))?,
        );

        Self::with_services(db_path, config, ledger, carrier, supply).await
    }

    /// 用给定的外部服务组装应用状态（测试可注入替身）
    pub async fn with_services(
        db_path: String,
        config: Arc<ConfigManager>,
        ledger: Arc<DispatchLedgerRepository>,
        carrier: Arc<dyn CarrierService>,
        supply: Arc<dyn SupplyCompletionService>,
    ) -> Result<Self, String> {
        let ttl: Duration = config
            .get_staging_ttl()
            .await
            .map_err(|e| format!("暂存有效期读取失败: {}", e))?;
        let staging = Arc::new(StagingStore::new(ttl));

        let reader: Arc<dyn DispatchConfigReader> = config.clone();
        let importer = Arc::new(ShipmentImporterImpl::new(
            reader.clone(),
            Box::new(FieldMapperImpl),
        ));
        let dispatcher = Arc::new(Dispatcher::new(reader.clone(), carrier, ledger.clone()));

        let shipment_api = Arc::new(ShipmentApi::new(importer, staging.clone(), dispatcher));
        let supply_api = Arc::new(SupplyApi::new(reader, supply));

        tracing::info!(staging_ttl_secs = ttl.as_secs(), "AppState初始化完成");

        Ok(Self {
            db_path,
            config,
            staging,
            ledger,
            shipment_api,
            supply_api,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先使用环境变量 PACKING_DISPATCH_DB_PATH，否则放在用户数据目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./packing_dispatch.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("packing-dispatch-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("packing-dispatch");
        }

        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&path).is_ok() {
            path = path.join("packing_dispatch.db");
        } else {
            path = PathBuf::from("./packing_dispatch.db");
        }
    }

    path.to_string_lossy().to_string()
}
