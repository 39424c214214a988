// ==========================================
// 供需产能对账系统 - 预警规则与触发记录
// ==========================================

use crate::domain::types::{AlertThresholdType, MonitoredObjects};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// AlertRule - 用户预警规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    pub alert_id: String,
    pub user_id: String,
    pub alert_name: String,
    pub monitored_objects: MonitoredObjects,
    pub threshold_type: AlertThresholdType,
    pub threshold: f64, // 带符号: >=0 监控上涨, <0 监控下跌
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

// ==========================================
// TriggeredAlert - 触发记录 (不可变)
// ==========================================
// 规则字段按值快照, 规则删除后记录仍可读
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggeredAlert {
    pub triggered_alert_id: String,
    pub alert_id: String,
    pub user_id: String,         // 规则所属用户
    pub triggered_by: String,    // 引起变更的用户
    pub alert_name: String,
    pub monitored_objects: MonitoredObjects,
    pub threshold_type: AlertThresholdType,
    pub threshold: f64,
    pub description: Option<String>,
    pub old_value: f64,
    pub new_value: f64,
    pub delta: f64,
    pub created_at: NaiveDateTime,
}

impl TriggeredAlert {
    /// 从规则快照生成触发记录
    pub fn from_rule(rule: &AlertRule, triggered_by: &str, old_value: f64, new_value: f64) -> Self {
        Self {
            triggered_alert_id: uuid::Uuid::new_v4().to_string(),
            alert_id: rule.alert_id.clone(),
            user_id: rule.user_id.clone(),
            triggered_by: triggered_by.to_string(),
            alert_name: rule.alert_name.clone(),
            monitored_objects: rule.monitored_objects,
            threshold_type: rule.threshold_type,
            threshold: rule.threshold,
            description: rule.description.clone(),
            old_value,
            new_value,
            delta: new_value - old_value,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
