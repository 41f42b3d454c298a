// ==========================================
// 待打包订单发运系统 - 引擎层
// ==========================================
// 职责: 纯内存业务规则（无 IO）
// ==========================================

pub mod aggregator;

pub use aggregator::{group_by_reference, ItemCapacity};
