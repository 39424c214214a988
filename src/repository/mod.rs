// ==========================================
// 供需产能对账系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 外部协作方的窄接口 (trait) + rusqlite 实现
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod alert_repo;
pub mod capacity_group_repo;
pub mod demand_repo;
pub mod error;
pub mod link_repo;
pub mod logging_history_repo;
pub mod status_repo;
pub mod user_repo;

// 重导出核心仓储
pub use alert_repo::{AlertRepository, AlertStore};
pub use capacity_group_repo::{CapacityGroupRepository, CapacityGroupStore};
pub use demand_repo::{DemandStore, MaterialDemandRepository};
pub use error::{RepositoryError, RepositoryResult};
pub use link_repo::{LinkStore, LinkedDemandRepository};
pub use logging_history_repo::LoggingHistoryRepository;
pub use status_repo::{StatusCounterStore, StatusCountersRepository};
pub use user_repo::{UserDirectory, UserRepository};
