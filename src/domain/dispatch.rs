// ==========================================
// 待打包订单发运系统 - 发运结果模型
// ==========================================
// 每个分组一个结果；整批汇总为 DispatchReport
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==========================================
// 分组发运状态
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与台账一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchStatus {
    Succeeded, // 承运商受理
    Skipped,   // 台账已有成功记录，不重复下单
    Rejected,  // 本地数据校验失败，未发起远程调用
    Failed,    // 远程调用失败（含重试耗尽）
}

impl DispatchStatus {
    /// 成功或跳过都算“已发运”
    pub fn is_done(&self) -> bool {
        matches!(self, DispatchStatus::Succeeded | DispatchStatus::Skipped)
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "SUCCEEDED" => Some(DispatchStatus::Succeeded),
            "SKIPPED" => Some(DispatchStatus::Skipped),
            "REJECTED" => Some(DispatchStatus::Rejected),
            "FAILED" => Some(DispatchStatus::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for DispatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchStatus::Succeeded => write!(f, "SUCCEEDED"),
            DispatchStatus::Skipped => write!(f, "SKIPPED"),
            DispatchStatus::Rejected => write!(f, "REJECTED"),
            DispatchStatus::Failed => write!(f, "FAILED"),
        }
    }
}

// ==========================================
// GroupOutcome - 单个分组的发运结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub referencia: String,
    pub status: DispatchStatus,
    pub message: String,
    pub attempts: u32,
    pub idempotency_key: Option<String>,
    pub item_count: usize,
}

// ==========================================
// DispatchReport - 整批发运报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchReport {
    pub batch_id: Option<Uuid>,
    pub total_groups: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub outcomes: Vec<GroupOutcome>,
    pub elapsed_ms: u64,
}

impl DispatchReport {
    /// 无暂存数据时的空报告
    pub fn empty() -> Self {
        Self {
            batch_id: None,
            total_groups: 0,
            succeeded: 0,
            skipped: 0,
            failed: 0,
            outcomes: Vec::new(),
            elapsed_ms: 0,
        }
    }

    pub fn from_outcomes(batch_id: Uuid, outcomes: Vec<GroupOutcome>, elapsed_ms: u64) -> Self {
        let succeeded = outcomes
            .iter()
            .filter(|o| o.status == DispatchStatus::Succeeded)
            .count();
        let skipped = outcomes
            .iter()
            .filter(|o| o.status == DispatchStatus::Skipped)
            .count();
        let failed = outcomes.iter().filter(|o| !o.status.is_done()).count();

        Self {
            batch_id: Some(batch_id),
            total_groups: outcomes.len(),
            succeeded,
            skipped,
            failed,
            outcomes,
            elapsed_ms,
        }
    }

    pub fn all_done(&self) -> bool {
        self.failed == 0
    }

    /// 未完成（拒绝/失败）的参考号，用于保留暂存
    pub fn pending_references(&self) -> Vec<String> {
        self.outcomes
            .iter()
            .filter(|o| !o.status.is_done())
            .map(|o| o.referencia.clone())
            .collect()
    }
}
