// ==========================================
// 待打包订单发运系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::dispatch_config_trait::{CarrierSettings, DispatchConfigReader, RetrySettings};
use crate::config::error::{ConfigError, ConfigResult};
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::ColumnMode;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const CARRIER_ENDPOINT_URL: &str = "carrier_endpoint_url";
    pub const CARRIER_CLIENT_CODE: &str = "carrier_client_code";
    pub const CARRIER_SOAP_ACTION: &str = "carrier_soap_action";
    pub const CARRIER_NAMESPACE: &str = "carrier_namespace";
    /// 承运商调用每次发运读取；补货完成客户端仅在启动时读取
    pub const CARRIER_TIMEOUT_SECS: &str = "carrier_timeout_secs";
    pub const RETRY_MAX_ATTEMPTS: &str = "dispatch_retry_max_attempts";
    pub const RETRY_INITIAL_DELAY_MS: &str = "dispatch_retry_initial_delay_ms";
    pub const RETRY_MAX_DELAY_MS: &str = "dispatch_retry_max_delay_ms";
    pub const MAX_ITEMS_PER_SHIPMENT: &str = "max_items_per_shipment";
    pub const IMPORT_COLUMN_MODE: &str = "import_column_mode";
    /// 启动时读取，修改后需重启
    pub const STAGING_TTL_MINUTES: &str = "staging_ttl_minutes";
    pub const SUPPLY_COMPLETION_URL: &str = "supply_completion_url";
}

/// 默认配置（首次启动时写入，已有值不覆盖）
pub const DEFAULTS: &[(&str, &str)] = &[
    (config_keys::CARRIER_ENDPOINT_URL, "http://localhost:8089/EmbarquesService.svc"),
    (config_keys::CARRIER_CLIENT_CODE, "SOR"),
    (config_keys::CARRIER_SOAP_ACTION, "http://tempuri.org/IEmbarques/CrearEmbarque"),
    (config_keys::CARRIER_NAMESPACE, "http://tempuri.org/"),
    (config_keys::CARRIER_TIMEOUT_SECS, "30"),
    (config_keys::RETRY_MAX_ATTEMPTS, "3"),
    (config_keys::RETRY_INITIAL_DELAY_MS, "500"),
    (config_keys::RETRY_MAX_DELAY_MS, "5000"),
    (config_keys::MAX_ITEMS_PER_SHIPMENT, "0"),
    (config_keys::IMPORT_COLUMN_MODE, "HEADER"),
    (config_keys::STAGING_TTL_MINUTES, "120"),
    (config_keys::SUPPLY_COMPLETION_URL, "http://localhost:8089/api/FinalizarSurtido"),
];

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（会幂等建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> ConfigResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入配置值（覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        tracing::info!(key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 写入默认配置（已有值保持不变）
    ///
    /// # 返回
    /// - 新写入的键数量
    pub fn seed_defaults(&self) -> ConfigResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut inserted = 0;
        for (key, value) in DEFAULTS {
            inserted += tx.execute(
                "INSERT OR IGNORE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(inserted)
    }

    /// 获取所有 global 配置的快照
    pub fn get_config_snapshot(&self) -> ConfigResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 解析数值配置，格式错误时告警并回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ConfigResult<T>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let raw = match self.get_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置值格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }
}

// ==========================================
// DispatchConfigReader Trait 实现
// ==========================================
#[async_trait]
impl DispatchConfigReader for ConfigManager {
    async fn get_column_mode(&self) -> ConfigResult<ColumnMode> {
        let value = self.get_config_or_default(config_keys::IMPORT_COLUMN_MODE, "HEADER")?;
        Ok(ColumnMode::parse(&value).unwrap_or_else(|| {
            tracing::warn!(raw_value = %value, "列定位模式无法识别，使用 HEADER");
            ColumnMode::Header
        }))
    }

    async fn get_staging_ttl(&self) -> ConfigResult<Duration> {
        let minutes: u64 = self.get_parsed_or_default(config_keys::STAGING_TTL_MINUTES, 120)?;
        Ok(Duration::from_secs(minutes.max(1) * 60))
    }

    async fn get_max_items_per_shipment(&self) -> ConfigResult<Option<usize>> {
        let max: usize = self.get_parsed_or_default(config_keys::MAX_ITEMS_PER_SHIPMENT, 0)?;
        Ok(if max == 0 { None } else { Some(max) })
    }

    async fn get_carrier_settings(&self) -> ConfigResult<CarrierSettings> {
        let endpoint_url = self.get_config_or_default(
            config_keys::CARRIER_ENDPOINT_URL,
            "http://localhost:8089/EmbarquesService.svc",
        )?;
        if endpoint_url.trim().is_empty() {
            return Err(ConfigError::ValueError {
                key: config_keys::CARRIER_ENDPOINT_URL.to_string(),
                value: endpoint_url,
                message: "承运商地址不能为空".to_string(),
            });
        }

        let timeout_secs: u64 = self.get_parsed_or_default(config_keys::CARRIER_TIMEOUT_SECS, 30)?;

        Ok(CarrierSettings {
            endpoint_url: endpoint_url.trim().to_string(),
            client_code: self.get_config_or_default(config_keys::CARRIER_CLIENT_CODE, "SOR")?,
            soap_action: self.get_config_or_default(
                config_keys::CARRIER_SOAP_ACTION,
                "http://tempuri.org/IEmbarques/CrearEmbarque",
            )?,
            namespace: self.get_config_or_default(config_keys::CARRIER_NAMESPACE, "http://tempuri.org/")?,
            timeout: Duration::from_secs(timeout_secs.max(1)),
        })
    }

    async fn get_retry_settings(&self) -> ConfigResult<RetrySettings> {
        let max_attempts: u32 = self.get_parsed_or_default(config_keys::RETRY_MAX_ATTEMPTS, 3)?;
        let initial_ms: u64 = self.get_parsed_or_default(config_keys::RETRY_INITIAL_DELAY_MS, 500)?;
        let max_ms: u64 = self.get_parsed_or_default(config_keys::RETRY_MAX_DELAY_MS, 5000)?;

        Ok(RetrySettings {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(initial_ms),
            max_delay: Duration::from_millis(max_ms.max(initial_ms)),
        })
    }

    async fn get_supply_completion_url(&self) -> ConfigResult<String> {
        self.get_config_or_default(
            config_keys::SUPPLY_COMPLETION_URL,
            "http://localhost:8089/api/FinalizarSurtido",
        )
    }
}
