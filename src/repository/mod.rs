// ==========================================
// 待打包订单发运系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化
// ==========================================

pub mod dispatch_ledger_repo;
pub mod error;

pub use dispatch_ledger_repo::{DispatchLedgerEntry, DispatchLedgerRepository, LedgerRecord};
pub use error::{RepositoryError, RepositoryResult};
