// ==========================================
// 供需产能对账系统 - 日志历史领域模型
// ==========================================
// 用途: 状态变化审计, 面向用户展示
// 写入: 尽力而为, 失败不影响主计算
// ==========================================

use crate::domain::types::EventType;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// LoggingHistory - 日志条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingHistory {
    pub log_id: String,
    pub user_id: String,
    pub event_type: EventType,
    pub capacity_group_id: Option<String>,
    pub material_demand_id: Option<String>,
    pub calendar_week: Option<chrono::NaiveDate>,
    pub description: String,
    pub logged_at: NaiveDateTime,
}

impl LoggingHistory {
    /// 创建日志条目
    ///
    /// # 返回
    /// - None: 描述为空, 不写入
    pub fn new(
        user_id: &str,
        event_type: EventType,
        capacity_group_id: Option<&str>,
        description: Option<String>,
    ) -> Option<Self> {
        let description = description.filter(|d| !d.trim().is_empty())?;
        Some(Self {
            log_id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            event_type,
            capacity_group_id: capacity_group_id.map(|s| s.to_string()),
            material_demand_id: None,
            calendar_week: None,
            description,
            logged_at: chrono::Utc::now().naive_utc(),
        })
    }

    /// 设置关联周
    pub fn with_calendar_week(mut self, week: chrono::NaiveDate) -> Self {
        self.calendar_week = Some(week);
        self
    }
}
