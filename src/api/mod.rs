// ==========================================
// 供需产能对账系统 - API 层
// ==========================================
// 职责: 提供对账 API 接口, 供 REST 层/定时任务/CLI 调用
// ==========================================

pub mod error;
pub mod planning_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use planning_api::{PlanningApi, DEFAULT_LOG_LIMIT};
