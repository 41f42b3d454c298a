// ==========================================
// 待打包订单发运系统 - 发运单API
// ==========================================
// 职责: 导入 / 查看暂存 / 发运 三个操作
// 响应形状沿用前端既有约定:
// - 导入: { status: 0|1, message, list }
// - 查看: { success, data }
// - 发运: { status: 0|1, message, report }
// ==========================================

use crate::api::error::ApiResult;
use crate::dispatch::Dispatcher;
use crate::domain::{DispatchReport, ImportRow, StagedBatch};
use crate::importer::ShipmentImporter;
use crate::staging::{DispatchClaim, RetainOutcome, StagingStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const STATUS_FAILED: i32 = 0;
pub const STATUS_OK: i32 = 1;

pub const MSG_NO_FILE: &str = "No File Selected";
pub const MSG_IMPORTED: &str = "File Imported Successfully";
pub const MSG_DISPATCH_IN_PROGRESS: &str = "Dispatch already in progress";

/// 导入响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub status: i32,
    pub message: String,
    pub list: Vec<ImportRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<Uuid>,
    pub session_id: String,
    #[serde(default)]
    pub blank_rows_skipped: usize,
}

impl ImportResponse {
    pub fn failed(session_id: &str, message: impl Into<String>) -> Self {
        Self {
            status: STATUS_FAILED,
            message: message.into(),
            list: Vec::new(),
            batch_id: None,
            session_id: session_id.to_string(),
            blank_rows_skipped: 0,
        }
    }
}

/// 暂存查看响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedResponse {
    pub success: bool,
    pub data: Vec<ImportRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<Uuid>,
}

/// 发运响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub status: i32,
    pub message: String,
    pub report: DispatchReport,
}

// ==========================================
// ShipmentApi
// ==========================================
pub struct ShipmentApi {
    importer: Arc<dyn ShipmentImporter>,
    staging: Arc<StagingStore>,
    dispatcher: Arc<Dispatcher>,
}

impl ShipmentApi {
    pub fn new(
        importer: Arc<dyn ShipmentImporter>,
        staging: Arc<StagingStore>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        Self {
            importer,
            staging,
            dispatcher,
        }
    }

    /// 导入文件并替换会话暂存
    ///
    /// # 返回
    /// - Ok(status=1): 导入成功，list 为暂存行
    /// - Ok(status=0): 文件无法导入，暂存保持不变
    /// - Err: 暂存区不可用
    #[instrument(skip(self, bytes), fields(session_id = %session_id, size = bytes.len()))]
    pub async fn import_file(
        &self,
        session_id: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> ApiResult<ImportResponse> {
        self.staging.purge_expired()?;

        let outcome = match self.importer.import_bytes(file_name, bytes).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(file_name = %file_name, error = %e, "导入失败，暂存未改动");
                return Ok(ImportResponse::failed(session_id, format!("Import failed: {}", e)));
            }
        };

        let batch = self.staging.replace(StagedBatch::new(session_id, file_name, outcome.rows))?;

        Ok(ImportResponse {
            status: STATUS_OK,
            message: MSG_IMPORTED.to_string(),
            list: batch.rows.to_vec(),
            batch_id: Some(batch.batch_id),
            session_id: session_id.to_string(),
            blank_rows_skipped: outcome.blank_rows_skipped,
        })
    }

    /// 查看当前暂存行（无暂存时返回空列表）
    pub fn list_staged(&self, session_id: &str) -> ApiResult<StagedResponse> {
        let snapshot = self.staging.snapshot(session_id)?;
        Ok(StagedResponse {
            success: true,
            data: snapshot.as_ref().map(|b| b.rows.to_vec()).unwrap_or_default(),
            batch_id: snapshot.map(|b| b.batch_id),
        })
    }

    /// 发运当前暂存批次
    ///
    /// 仅保留未完成分组的行；全部完成时清空暂存。
    /// 同一会话同时只允许一个发运，后到的请求直接返回 status 0
    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn dispatch(&self, session_id: &str) -> ApiResult<DispatchResponse> {
        let guard = match self.staging.begin_dispatch(session_id)? {
            DispatchClaim::Claimed(guard) => guard,
            DispatchClaim::Empty => {
                info!("无暂存数据，跳过发运");
                return Ok(DispatchResponse {
                    status: STATUS_OK,
                    message: "Nothing to dispatch".to_string(),
                    report: DispatchReport::empty(),
                });
            }
            DispatchClaim::InProgress => {
                warn!("会话已有发运在进行，拒绝重复发运");
                return Ok(DispatchResponse {
                    status: STATUS_FAILED,
                    message: MSG_DISPATCH_IN_PROGRESS.to_string(),
                    report: DispatchReport::empty(),
                });
            }
        };
        let snapshot = Arc::clone(guard.batch());

        let report = self.dispatcher.dispatch(&snapshot).await?;

        let retained = self.staging.retain_after_dispatch(
            session_id,
            snapshot.batch_id,
            &report.pending_references(),
        )?;
        if retained == RetainOutcome::Superseded {
            warn!(batch_id = %snapshot.batch_id, "发运期间已重新导入，保留新批次");
        }
        drop(guard);

        let (status, message) = if report.all_done() {
            (
                STATUS_OK,
                format!("{} shipment(s) dispatched", report.total_groups),
            )
        } else {
            (
                STATUS_FAILED,
                format!(
                    "{} of {} shipment(s) failed; failed rows remain staged",
                    report.failed, report.total_groups
                ),
            )
        };

        Ok(DispatchResponse {
            status,
            message,
            report,
        })
    }
}
