// ==========================================
// 待打包订单发运系统 - 发运台账仓储
// ==========================================
// 表: dispatch_ledger（幂等键 → 最近一次发运结果）
// 红线: 已 SUCCEEDED 的记录不会被降级覆盖
// ==========================================

use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::DispatchStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// 响应摘要最大长度（字符）
const RESPONSE_EXCERPT_MAX_CHARS: usize = 512;

// ==========================================
// DispatchLedgerEntry - 台账记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchLedgerEntry {
    pub idempotency_key: String,
    pub batch_id: String,
    pub referencia: String,
    pub status: DispatchStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub response_excerpt: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// 一次发运尝试的写入内容
#[derive(Debug, Clone)]
pub struct LedgerRecord<'a> {
    pub idempotency_key: &'a str,
    pub batch_id: Uuid,
    pub referencia: &'a str,
    pub status: DispatchStatus,
    pub attempts: u32,
    pub last_error: Option<&'a str>,
    pub response_excerpt: Option<&'a str>,
}

// ==========================================
// DispatchLedgerRepository
// ==========================================
pub struct DispatchLedgerRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DispatchLedgerRepository {
    /// 打开数据库并确保表存在
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例（调用方负责建表）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按幂等键查询
    ///
    /// # 返回
    /// - Ok(Some(entry)): 已有记录
    /// - Ok(None): 从未发运过
    pub fn find_by_key(&self, idempotency_key: &str) -> RepositoryResult<Option<DispatchLedgerEntry>> {
        let conn = self.get_conn()?;
        let entry = conn
            .query_row(
                r#"
                SELECT idempotency_key, batch_id, referencia, status, attempts,
                       last_error, response_excerpt, created_at, updated_at
                FROM dispatch_ledger
                WHERE idempotency_key = ?1
                "#,
                params![idempotency_key],
                map_entry,
            )
            .optional()?;

        entry.transpose()
    }

    /// 幂等键是否已成功发运
    pub fn is_succeeded(&self, idempotency_key: &str) -> RepositoryResult<bool> {
        Ok(self
            .find_by_key(idempotency_key)?
            .map(|e| e.status == DispatchStatus::Succeeded)
            .unwrap_or(false))
    }

    /// 写入一次发运结果
    ///
    /// attempts 累加；已成功的记录保持 SUCCEEDED
    pub fn record(&self, record: &LedgerRecord<'_>) -> RepositoryResult<()> {
        let excerpt = record.response_excerpt.map(truncate_excerpt);
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO dispatch_ledger (
                idempotency_key, batch_id, referencia, status, attempts,
                last_error, response_excerpt, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, datetime('now'), datetime('now'))
            ON CONFLICT(idempotency_key) DO UPDATE SET
                batch_id = excluded.batch_id,
                status = CASE
                    WHEN dispatch_ledger.status = 'SUCCEEDED' THEN dispatch_ledger.status
                    ELSE excluded.status
                END,
                attempts = dispatch_ledger.attempts + excluded.attempts,
                last_error = excluded.last_error,
                response_excerpt = COALESCE(excluded.response_excerpt, dispatch_ledger.response_excerpt),
                updated_at = excluded.updated_at
            "#,
            params![
                record.idempotency_key,
                record.batch_id.to_string(),
                record.referencia,
                record.status.to_string(),
                record.attempts,
                record.last_error,
                excerpt,
            ],
        )?;
        Ok(())
    }

    /// 按参考号查询历史（最近更新在前）
    pub fn list_by_referencia(&self, referencia: &str) -> RepositoryResult<Vec<DispatchLedgerEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT idempotency_key, batch_id, referencia, status, attempts,
                   last_error, response_excerpt, created_at, updated_at
            FROM dispatch_ledger
            WHERE referencia = ?1
            ORDER BY updated_at DESC, idempotency_key
            "#,
        )?;

        let rows = stmt.query_map(params![referencia], map_entry)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row??);
        }
        Ok(entries)
    }
}

// 状态列解析失败时返回内层错误，外层保留 rusqlite 错误
fn map_entry(row: &Row<'_>) -> rusqlite::Result<RepositoryResult<DispatchLedgerEntry>> {
    let status_text: String = row.get(3)?;
    let status = match DispatchStatus::from_db(&status_text) {
        Some(s) => s,
        None => {
            return Ok(Err(RepositoryError::InvalidRow {
                field: "status".to_string(),
                message: format!("未知的台账状态: {}", status_text),
            }))
        }
    };

    Ok(Ok(DispatchLedgerEntry {
        idempotency_key: row.get(0)?,
        batch_id: row.get(1)?,
        referencia: row.get(2)?,
        status,
        attempts: row.get(4)?,
        last_error: row.get(5)?,
        response_excerpt: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    }))
}

fn truncate_excerpt(text: &str) -> String {
    text.chars().take(RESPONSE_EXCERPT_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> DispatchLedgerRepository {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        DispatchLedgerRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn record<'a>(key: &'a str, status: DispatchStatus, error: Option<&'a str>) -> LedgerRecord<'a> {
        LedgerRecord {
            idempotency_key: key,
            batch_id: Uuid::new_v4(),
            referencia: "REF-A",
            status,
            attempts: 1,
            last_error: error,
            response_excerpt: None,
        }
    }

    #[test]
    fn test_find_missing_key() {
        assert!(repo().find_by_key("nope").unwrap().is_none());
    }

    #[test]
    fn test_failed_then_succeeded_accumulates_attempts() {
        let repo = repo();
        repo.record(&record("k1", DispatchStatus::Failed, Some("timeout")))
            .unwrap();
        assert!(!repo.is_succeeded("k1").unwrap());

        repo.record(&record("k1", DispatchStatus::Succeeded, None)).unwrap();

        let entry = repo.find_by_key("k1").unwrap().unwrap();
        assert_eq!(entry.status, DispatchStatus::Succeeded);
        assert_eq!(entry.attempts, 2);
        assert_eq!(entry.last_error, None);
    }

    #[test]
    fn test_succeeded_is_never_downgraded() {
        let repo = repo();
        repo.record(&record("k1", DispatchStatus::Succeeded, None)).unwrap();
        repo.record(&record("k1", DispatchStatus::Failed, Some("boom")))
            .unwrap();

        assert!(repo.is_succeeded("k1").unwrap());
    }

    #[test]
    fn test_list_by_referencia_and_excerpt_truncation() {
        let repo = repo();
        let long = "x".repeat(2_000);
        let mut rec = record("k1", DispatchStatus::Succeeded, None);
        rec.response_excerpt = Some(&long);
        repo.record(&rec).unwrap();
        repo.record(&record("k2", DispatchStatus::Rejected, Some("invalid postal code")))
            .unwrap();

        let entries = repo.list_by_referencia("REF-A").unwrap();

        assert_eq!(entries.len(), 2);
        let stored = entries.iter().find(|e| e.idempotency_key == "k1").unwrap();
        assert_eq!(
            stored.response_excerpt.as_deref().map(str::len),
            Some(RESPONSE_EXCERPT_MAX_CHARS)
        );
    }
}
