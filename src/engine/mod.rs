// ==========================================
// 供需产能对账系统 - 引擎层
// ==========================================
// 职责: 需求聚合、状态分类、瓶颈检测、报表、预警、待办
// 红线: Engine 不拼 SQL, 只通过仓储 trait 读写
// ==========================================

pub mod aggregator;
pub mod alert;
pub mod bottleneck;
pub mod classifier;
pub mod error;
pub mod log_sink;
pub mod report;
pub mod repositories;
pub mod todos;

// 重导出核心引擎
pub use aggregator::{aggregate, aggregate_with_sources, lead_time_cutoff, AggregatedWeek};
pub use alert::{rule_fires, AlertEngine};
pub use bottleneck::{BottleneckDetector, BottleneckRunResult, GroupOutcome, WeekTransition};
pub use classifier::{
    classify_for_detector, classify_for_report, classify_ruled_band, classify_week,
    WeekClassification,
};
pub use error::{EngineError, EngineResult};
pub use log_sink::{post_log, LogSink, NoOpLogSink};
pub use report::{write_report_csv, ReportGenerator, ReportRequest};
pub use repositories::PlanningRepositories;
pub use todos::{collect_todos, TodoCalculator};
