// ==========================================
// 待打包订单发运系统 - 应用层
// ==========================================
// 职责: axum 路由与共享状态
// ==========================================

pub mod http;
pub mod state;

// 重导出
pub use http::{router, SESSION_HEADER};
pub use state::{get_default_db_path, AppState};
