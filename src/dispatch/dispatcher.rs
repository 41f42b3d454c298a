// ==========================================
// 待打包订单发运系统 - 发运调度器
// ==========================================
// 输入: 暂存批次快照（调用方在发运开始时取得）
// 流程（逐个分组，顺序执行，不因单组失败中止）:
//   1. 计算幂等键
//   2. 组装报文；失败 → REJECTED（不调用承运商）
//   3. 台账已 SUCCEEDED → SKIPPED
//   4. 调用承运商（带重试）→ SUCCEEDED / FAILED
//   5. 写入台账
// 承运商配置每次发运重新读取；台账读写在阻塞线程池执行
// ==========================================

use crate::config::{CarrierSettings, DispatchConfigReader};
use crate::dispatch::carrier_client::CarrierService;
use crate::dispatch::error::DispatchResult;
use crate::dispatch::idempotency::idempotency_key;
use crate::dispatch::payload::build_request;
use crate::dispatch::retry::RetryPolicy;
use crate::domain::{DispatchReport, DispatchStatus, GroupOutcome, ShipmentGroup, StagedBatch};
use crate::engine::{group_by_reference, ItemCapacity};
use crate::repository::{DispatchLedgerRepository, LedgerRecord, RepositoryError, RepositoryResult};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// 单次发运过程中不变的参数
struct PassContext {
    batch_id: Uuid,
    carrier: CarrierSettings,
    capacity: ItemCapacity,
    retry: RetryPolicy,
}

// ==========================================
// Dispatcher - 发运调度器
// ==========================================
pub struct Dispatcher {
    config: Arc<dyn DispatchConfigReader>,
    carrier: Arc<dyn CarrierService>,
    ledger: Arc<DispatchLedgerRepository>,
}

impl Dispatcher {
    /// # 参数
    /// - config: 配置读取器（客户简称/容量/重试）
    /// - carrier: 承运商服务
    /// - ledger: 发运台账
    pub fn new(
        config: Arc<dyn DispatchConfigReader>,
        carrier: Arc<dyn CarrierService>,
        ledger: Arc<DispatchLedgerRepository>,
    ) -> Self {
        Self {
            config,
            carrier,
            ledger,
        }
    }

    /// 发运一个暂存批次
    ///
    /// # 返回
    /// - Ok(DispatchReport): 每个分组一条结果；空批次返回零分组报告
    /// - Err: 配置无法读取，整批未执行
    #[instrument(skip(self, batch), fields(batch_id = %batch.batch_id, rows = batch.rows.len()))]
    pub async fn dispatch(&self, batch: &StagedBatch) -> DispatchResult<DispatchReport> {
        let start_time = Instant::now();

        let carrier_settings = self.config.get_carrier_settings().await?;
        let capacity = ItemCapacity::from_option(self.config.get_max_items_per_shipment().await?);
        let retry = RetryPolicy::from(self.config.get_retry_settings().await?);

        let ctx = PassContext {
            batch_id: batch.batch_id,
            carrier: carrier_settings,
            capacity,
            retry,
        };

        let groups = group_by_reference(&batch.rows, ctx.capacity);
        info!(groups = groups.len(), "开始发运");

        let mut outcomes = Vec::with_capacity(groups.len());
        for group in &groups {
            outcomes.push(self.dispatch_group(&ctx, group).await);
        }

        let report = DispatchReport::from_outcomes(
            batch.batch_id,
            outcomes,
            start_time.elapsed().as_millis() as u64,
        );
        info!(
            total = report.total_groups,
            succeeded = report.succeeded,
            skipped = report.skipped,
            failed = report.failed,
            elapsed_ms = report.elapsed_ms,
            "发运完成"
        );
        Ok(report)
    }

    async fn dispatch_group(&self, ctx: &PassContext, group: &ShipmentGroup) -> GroupOutcome {
        let key = idempotency_key(&ctx.carrier.client_code, group);
        let outcome = |status: DispatchStatus, message: String, attempts: u32| GroupOutcome {
            referencia: group.referencia.clone(),
            status,
            message,
            attempts,
            idempotency_key: Some(key.clone()),
            item_count: group.item_count(),
        };

        // === 组包 ===
        let request = match build_request(group, &ctx.carrier.client_code, &key, ctx.capacity) {
            Ok(request) => request,
            Err(e) => {
                warn!(referencia = %group.referencia, rows = ?group.row_numbers, error = %e, "分组数据校验失败");
                let message = e.to_string();
                self.record(ctx, group, &key, DispatchStatus::Rejected, 0, Some(message.clone()), None)
                    .await;
                return outcome(DispatchStatus::Rejected, message, 0);
            }
        };

        // === 幂等检查 ===
        match self.ledger_succeeded(&key).await {
            Ok(true) => {
                info!(referencia = %group.referencia, "台账已有成功记录，跳过");
                return outcome(DispatchStatus::Skipped, "already dispatched".to_string(), 0);
            }
            Ok(false) => {}
            Err(e) => {
                // 无法确认是否已下单时不调用承运商
                error!(referencia = %group.referencia, transient = e.is_transient(), error = %e, "台账读取失败");
                return outcome(DispatchStatus::Failed, format!("ledger unavailable: {}", e), 0);
            }
        }

        // === 调用承运商 ===
        let carrier = Arc::clone(&self.carrier);
        let settings = &ctx.carrier;
        let request = &request;
        let attempted = ctx
            .retry
            .run(&group.referencia, move |_| {
                let carrier = Arc::clone(&carrier);
                async move { carrier.create_shipment(settings, request).await }
            })
            .await;

        match attempted.result {
            Ok(receipt) => {
                info!(referencia = %group.referencia, attempts = attempted.attempts, "承运商已受理");
                self.record(
                    ctx,
                    group,
                    &key,
                    DispatchStatus::Succeeded,
                    attempted.attempts,
                    None,
                    Some(receipt.body_excerpt),
                )
                .await;
                outcome(DispatchStatus::Succeeded, "dispatched".to_string(), attempted.attempts)
            }
            Err(e) => {
                warn!(referencia = %group.referencia, attempts = attempted.attempts, error = %e, "发运失败");
                let message = e.to_string();
                self.record(
                    ctx,
                    group,
                    &key,
                    DispatchStatus::Failed,
                    attempted.attempts,
                    Some(message.clone()),
                    None,
                )
                .await;
                outcome(DispatchStatus::Failed, message, attempted.attempts)
            }
        }
    }

    async fn ledger_succeeded(&self, key: &str) -> RepositoryResult<bool> {
        let ledger = Arc::clone(&self.ledger);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || ledger.is_succeeded(&key)).await?
    }

    // 台账写入失败只记日志，不改变本次结果
    #[allow(clippy::too_many_arguments)]
    async fn record(
        &self,
        ctx: &PassContext,
        group: &ShipmentGroup,
        key: &str,
        status: DispatchStatus,
        attempts: u32,
        last_error: Option<String>,
        response_excerpt: Option<String>,
    ) {
        let ledger = Arc::clone(&self.ledger);
        let key = key.to_string();
        let batch_id = ctx.batch_id;
        let referencia = group.referencia.clone();

        let written = tokio::task::spawn_blocking(move || {
            ledger.record(&LedgerRecord {
                idempotency_key: &key,
                batch_id,
                referencia: &referencia,
                status,
                attempts,
                last_error: last_error.as_deref(),
                response_excerpt: response_excerpt.as_deref(),
            })
        })
        .await;

        if let Err(e) = written.map_err(RepositoryError::from).and_then(|r| r) {
            error!(referencia = %group.referencia, status = %status, error = %e, "台账写入失败");
        }
    }
}
