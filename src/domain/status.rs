// ==========================================
// 供需产能对账系统 - 状态计数器
// ==========================================
// 红线: 每次检测全量重算, 不做增量累加
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCounters {
    pub user_id: String,
    pub status_improvement_count: i64,
    pub status_degradation_count: i64,
    pub todos_count: i64,
    pub updated_at: NaiveDateTime,
}

impl StatusCounters {
    /// 创建空计数器
    pub fn empty(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            status_improvement_count: 0,
            status_degradation_count: 0,
            todos_count: 0,
            updated_at: chrono::Utc::now().naive_utc(),
        }
    }
}
