// ==========================================
// 供需产能对账系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 产能/需求对账与状态引擎
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AlertThresholdType, Deviation, EventType, MonitoredObjects, Role, WeekColor,
};

// 领域实体
pub use domain::{
    AlertRule, CapacityGroup, CapacityTimeSeries, DemandSeries, DemandSeriesValue, LinkedDemand,
    LoggingHistory, MaterialDemand, MonthReport, ReportSummary, StatusCounters, TriggeredAlert,
    User, WeekReport, YearReport,
};

// 引擎
pub use engine::{
    AlertEngine, BottleneckDetector, PlanningRepositories, ReportGenerator, TodoCalculator,
};

// API
pub use api::{ApiError, ApiResult, PlanningApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "供需产能对账系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
