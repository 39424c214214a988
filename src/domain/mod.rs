// ==========================================
// 供需产能对账系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod alert;
pub mod capacity;
pub mod demand;
pub mod logging_history;
pub mod report;
pub mod status;
pub mod types;
pub mod user;

// 重导出核心类型
pub use alert::{AlertRule, TriggeredAlert};
pub use capacity::{CapacityGroup, CapacityTimeSeries, WeekCapacity};
pub use demand::{DemandSeries, DemandSeriesValue, LinkedDemand, MaterialDemand};
pub use logging_history::LoggingHistory;
pub use report::{MonthReport, ReportSummary, WeekReport, YearReport};
pub use status::StatusCounters;
pub use types::{AlertThresholdType, Deviation, EventType, MonitoredObjects, Role, WeekColor};
pub use user::User;
