// ==========================================
// 供需产能对账系统 - 引擎配置读取 Trait
// ==========================================
// 职责: 定义引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// AlertRuleScope - 预警规则扫描范围
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertRuleScope {
    All,   // 扫描全部规则 (现网行为)
    Owner, // 仅扫描变更用户自己的规则
}

impl AlertRuleScope {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Some(AlertRuleScope::All),
            "OWNER" => Some(AlertRuleScope::Owner),
            _ => None,
        }
    }
}

// ==========================================
// PlannerConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）, PlannerConfig（固定值）
#[async_trait]
pub trait PlannerConfigReader: Send + Sync {
    /// 获取交付提前期缓冲（周）
    ///
    /// # 默认值
    /// - 2
    async fn get_lead_time_buffer_weeks(&self) -> ConfigResult<i64>;

    /// 获取预警规则扫描范围
    ///
    /// # 默认值
    /// - ALL
    async fn get_alert_rule_scope(&self) -> ConfigResult<AlertRuleScope>;

    /// 获取单用户单次检测的最大评估次数（产能组 × 周）
    ///
    /// # 默认值
    /// - 100000
    async fn get_max_evaluations_per_user(&self) -> ConfigResult<usize>;

    /// 获取报表最大周数
    ///
    /// # 默认值
    /// - 520
    async fn get_max_report_weeks(&self) -> ConfigResult<usize>;

    /// 获取人工规则报表的默认允许偏差（百分比）
    ///
    /// # 默认值
    /// - 10
    async fn get_default_ruled_percentage(&self) -> ConfigResult<f64>;
}

// ==========================================
// PlannerConfig - 固定配置
// ==========================================
// 用途: 单元测试 / 无数据库场景
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub lead_time_buffer_weeks: i64,
    pub alert_rule_scope: AlertRuleScope,
    pub max_evaluations_per_user: usize,
    pub max_report_weeks: usize,
    pub default_ruled_percentage: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            lead_time_buffer_weeks: 2,
            alert_rule_scope: AlertRuleScope::All,
            max_evaluations_per_user: 100_000,
            max_report_weeks: 520,
            default_ruled_percentage: 10.0,
        }
    }
}

#[async_trait]
impl PlannerConfigReader for PlannerConfig {
    async fn get_lead_time_buffer_weeks(&self) -> ConfigResult<i64> {
        Ok(self.lead_time_buffer_weeks)
    }

    async fn get_alert_rule_scope(&self) -> ConfigResult<AlertRuleScope> {
        Ok(self.alert_rule_scope)
    }

    async fn get_max_evaluations_per_user(&self) -> ConfigResult<usize> {
        Ok(self.max_evaluations_per_user)
    }

    async fn get_max_report_weeks(&self) -> ConfigResult<usize> {
        Ok(self.max_report_weeks)
    }

    async fn get_default_ruled_percentage(&self) -> ConfigResult<f64> {
        Ok(self.default_ruled_percentage)
    }
}
