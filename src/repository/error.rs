// ==========================================
// 待打包订单发运系统 - 台账仓储错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use rusqlite::ErrorCode;
use thiserror::Error;

/// 台账仓储错误
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("台账连接锁获取失败: {0}")]
    LockError(String),

    /// busy_timeout 内仍未拿到写锁
    #[error("数据库繁忙: {0}")]
    Busy(String),

    #[error("台账读写失败: {0}")]
    DatabaseQueryError(String),

    /// 阻塞线程池上的台账任务未正常结束
    #[error("台账任务异常中止: {0}")]
    BlockingTask(String),

    // ===== 数据质量错误 =====
    #[error("台账记录无法解析 (field={field}): {message}")]
    InvalidRow { field: String, message: String },
}

impl RepositoryError {
    /// 稍后重试可能成功
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Busy(_))
    }
}

impl From<tokio::task::JoinError> for RepositoryError {
    fn from(err: tokio::task::JoinError) -> Self {
        RepositoryError::BlockingTask(err.to_string())
    }
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) =>
            {
                RepositoryError::Busy(err.to_string())
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) => {
                RepositoryError::DatabaseQueryError(msg.clone())
            }
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
