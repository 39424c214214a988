// ==========================================
// 供需产能对账系统 - 日志写入接口
// ==========================================
// 职责: 定义日志写入 trait，引擎不直接依赖日志存储
// 红线: 写入失败不得中断调用方 (尽力而为)
// ==========================================

use crate::domain::logging_history::LoggingHistory;
use crate::repository::LoggingHistoryRepository;
use std::error::Error;

// ==========================================
// 日志写入 Trait
// ==========================================

/// 日志写入者
///
/// # 实现说明
/// - `LoggingHistoryRepository` 写入 logging_history 表
/// - `NoOpLogSink` 用于不需要日志的场景
pub trait LogSink: Send + Sync {
    /// 追加一条日志
    fn append(&self, entry: &LoggingHistory) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作日志写入者
#[derive(Debug, Clone, Default)]
pub struct NoOpLogSink;

impl LogSink for NoOpLogSink {
    fn append(&self, entry: &LoggingHistory) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpLogSink: 跳过日志写入 - user_id={}, event_type={}",
            entry.user_id,
            entry.event_type
        );
        Ok(())
    }
}

impl LogSink for LoggingHistoryRepository {
    fn append(&self, entry: &LoggingHistory) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.insert(entry)?;
        Ok(())
    }
}

/// 尽力写入日志
///
/// # 返回
/// - true: 已写入
/// - false: 描述为空被跳过, 或写入失败 (已记录 warn)
pub fn post_log(sink: &dyn LogSink, entry: Option<LoggingHistory>) -> bool {
    let Some(entry) = entry else {
        tracing::debug!("日志描述为空, 跳过写入");
        return false;
    };

    match sink.append(&entry) {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(
                user_id = %entry.user_id,
                event_type = %entry.event_type,
                error = %e,
                "日志写入失败(已忽略)"
            );
            false
        }
    }
}
