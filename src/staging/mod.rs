// ==========================================
// 待打包订单发运系统 - 暂存层
// ==========================================
// 职责: 按会话保存最近一次导入的批次
// 约束:
// - 批次不可变，导入时整体替换 Arc
// - 发运使用快照，回写前校验 batch_id，避免覆盖并发上传
// - 同一会话同时只允许一个发运（在途标记与批次同锁）
// - 超过 TTL 的批次在访问时清理
// ==========================================

use crate::domain::StagedBatch;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StagingError {
    #[error("暂存区锁获取失败: {0}")]
    LockError(String),
}

pub type StagingResult<T> = Result<T, StagingError>;

/// 发运后回写暂存的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetainOutcome {
    /// 全部完成，暂存已清空
    Cleared,
    /// 保留未完成分组的行
    Retained(usize),
    /// 发运期间已有新导入，不改动
    Superseded,
}

/// 申请发运的结果
pub enum DispatchClaim<'a> {
    /// 已取得该会话的发运权
    Claimed(DispatchGuard<'a>),
    /// 无暂存批次
    Empty,
    /// 同一会话已有发运在进行
    InProgress,
}

/// 会话发运权；释放时（含出错提前返回）清除在途标记
pub struct DispatchGuard<'a> {
    store: &'a StagingStore,
    session_id: String,
    batch: Arc<StagedBatch>,
}

impl DispatchGuard<'_> {
    /// 发运开始时取得的快照
    pub fn batch(&self) -> &Arc<StagedBatch> {
        &self.batch
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        match self.store.inner.lock() {
            Ok(mut inner) => {
                inner.in_flight.remove(&self.session_id);
            }
            Err(poisoned) => {
                warn!(session_id = %self.session_id, "暂存区锁已中毒，仍释放发运标记");
                poisoned.into_inner().in_flight.remove(&self.session_id);
            }
        }
    }
}

struct StagedEntry {
    batch: Arc<StagedBatch>,
    touched_at: Instant,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, StagedEntry>,
    // 正在发运的会话；与 entries 同锁，重新导入不影响
    in_flight: HashSet<String>,
}

pub struct StagingStore {
    inner: Mutex<Inner>,
    ttl: Duration,
}

impl StagingStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            ttl,
        }
    }

    fn lock(&self) -> StagingResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| StagingError::LockError(e.to_string()))
    }

    /// 用新批次整体替换会话暂存
    pub fn replace(&self, batch: StagedBatch) -> StagingResult<Arc<StagedBatch>> {
        let batch = Arc::new(batch);
        let mut inner = self.lock()?;
        let previous = inner.entries.insert(
            batch.session_id.clone(),
            StagedEntry {
                batch: Arc::clone(&batch),
                touched_at: Instant::now(),
            },
        );

        info!(
            session_id = %batch.session_id,
            batch_id = %batch.batch_id,
            rows = batch.rows.len(),
            replaced = ?previous.map(|p| p.batch.batch_id),
            "暂存批次已替换"
        );
        Ok(batch)
    }

    /// 取当前批次快照（过期则清除并返回 None）
    pub fn snapshot(&self, session_id: &str) -> StagingResult<Option<Arc<StagedBatch>>> {
        let mut inner = self.lock()?;
        Ok(Self::live_batch(&mut inner, session_id, self.ttl))
    }

    /// 申请发运：取快照并在同一把锁内标记会话在途
    ///
    /// # 返回
    /// - Claimed: 持有 guard 期间同一会话的其他发运得到 InProgress
    /// - Empty: 无暂存（不占用发运权）
    pub fn begin_dispatch(&self, session_id: &str) -> StagingResult<DispatchClaim<'_>> {
        let mut inner = self.lock()?;

        if inner.in_flight.contains(session_id) {
            debug!(session_id = %session_id, "会话已有发运在进行");
            return Ok(DispatchClaim::InProgress);
        }

        let batch = match Self::live_batch(&mut inner, session_id, self.ttl) {
            Some(batch) => batch,
            None => return Ok(DispatchClaim::Empty),
        };

        inner.in_flight.insert(session_id.to_string());
        Ok(DispatchClaim::Claimed(DispatchGuard {
            store: self,
            session_id: session_id.to_string(),
            batch,
        }))
    }

    fn live_batch(inner: &mut Inner, session_id: &str, ttl: Duration) -> Option<Arc<StagedBatch>> {
        let expired = inner.entries.get(session_id)?.touched_at.elapsed() > ttl;
        if expired {
            inner.entries.remove(session_id);
            debug!(session_id = %session_id, "暂存批次已过期");
            return None;
        }
        inner.entries.get(session_id).map(|e| Arc::clone(&e.batch))
    }

    /// 发运后回写：仅保留未完成参考号的行
    ///
    /// batch_id 与当前暂存不一致时（发运期间重新上传）不做任何改动
    pub fn retain_after_dispatch(
        &self,
        session_id: &str,
        batch_id: Uuid,
        pending_references: &[String],
    ) -> StagingResult<RetainOutcome> {
        let mut inner = self.lock()?;

        let current = match inner.entries.get(session_id) {
            Some(entry) if entry.batch.batch_id == batch_id => Arc::clone(&entry.batch),
            Some(_) => return Ok(RetainOutcome::Superseded),
            None => return Ok(RetainOutcome::Cleared),
        };

        if pending_references.is_empty() {
            inner.entries.remove(session_id);
            info!(session_id = %session_id, batch_id = %batch_id, "发运完成，暂存已清空");
            return Ok(RetainOutcome::Cleared);
        }

        let pending: HashSet<&str> = pending_references.iter().map(String::as_str).collect();
        let remaining = current.retain_rows(|r| pending.contains(r.referencia.as_str()));
        let kept = remaining.rows.len();

        inner.entries.insert(
            session_id.to_string(),
            StagedEntry {
                batch: Arc::new(remaining),
                touched_at: Instant::now(),
            },
        );

        info!(
            session_id = %session_id,
            batch_id = %batch_id,
            kept_rows = kept,
            "保留未完成分组待重试"
        );
        Ok(RetainOutcome::Retained(kept))
    }

    /// 丢弃会话暂存
    pub fn clear(&self, session_id: &str) -> StagingResult<bool> {
        Ok(self.lock()?.entries.remove(session_id).is_some())
    }

    /// 清理所有过期批次
    pub fn purge_expired(&self) -> StagingResult<usize> {
        let mut inner = self.lock()?;
        let before = inner.entries.len();
        let ttl = self.ttl;
        inner.entries.retain(|_, entry| entry.touched_at.elapsed() <= ttl);
        let purged = before - inner.entries.len();
        if purged > 0 {
            debug!(purged = purged, "已清理过期暂存批次");
        }
        Ok(purged)
    }

    pub fn len(&self) -> StagingResult<usize> {
        Ok(self.lock()?.entries.len())
    }

    pub fn is_empty(&self) -> StagingResult<bool> {
        Ok(self.lock()?.entries.is_empty())
    }
}
