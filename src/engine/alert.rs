// ==========================================
// 供需产能对账系统 - 预警引擎
// ==========================================
// 职责: 需求/产能变更 (old → new) → 评估预警规则 → 追加触发记录
// 规则分支 (按 monitored_objects):
// - ALL_DEMANDS / ALL_OBJECTS / ALL_CAPACITIES(非需求变更) → 仅 RELATIVE
// - DEDICATED → ABSOLUTE 直接比较差值, RELATIVE 同上
// 符号约定: threshold >= 0 监控上涨 (delta >= limit), < 0 监控下跌 (delta <= limit)
// 说明: 不去重, 同一规则可重复触发
// ==========================================

use crate::config::{AlertRuleScope, PlannerConfigReader};
use crate::domain::alert::{AlertRule, TriggeredAlert};
use crate::domain::types::{AlertThresholdType, MonitoredObjects};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::PlanningRepositories;
use std::sync::Arc;
use tracing::{debug, info};

/// 带符号阈值比较
fn crosses(delta: f64, limit: f64, threshold: f64) -> bool {
    if threshold >= 0.0 {
        delta >= limit
    } else {
        delta <= limit
    }
}

/// 评估单条规则
///
/// # 参数
/// - `is_material_demand_change`: 变更来源是否为物料需求 (否则为产能)
pub fn rule_fires(
    rule: &AlertRule,
    is_material_demand_change: bool,
    old_value: f64,
    new_value: f64,
) -> bool {
    let delta = new_value - old_value;
    let relative_limit = rule.threshold * old_value;

    match rule.monitored_objects {
        MonitoredObjects::AllDemands | MonitoredObjects::AllObjects => {
            rule.threshold_type == AlertThresholdType::Relative
                && crosses(delta, relative_limit, rule.threshold)
        }
        MonitoredObjects::AllCapacities if !is_material_demand_change => {
            rule.threshold_type == AlertThresholdType::Relative
                && crosses(delta, relative_limit, rule.threshold)
        }
        MonitoredObjects::AllCapacities => false,
        MonitoredObjects::Dedicated => match rule.threshold_type {
            AlertThresholdType::Absolute => crosses(delta, rule.threshold, rule.threshold),
            AlertThresholdType::Relative => crosses(delta, relative_limit, rule.threshold),
        },
    }
}

// ==========================================
// AlertEngine - 预警引擎
// ==========================================
pub struct AlertEngine<C>
where
    C: PlannerConfigReader,
{
    repos: PlanningRepositories,
    config: Arc<C>,
}

impl<C> AlertEngine<C>
where
    C: PlannerConfigReader,
{
    pub fn new(repos: PlanningRepositories, config: Arc<C>) -> Self {
        Self { repos, config }
    }

    /// 评估预警规则并追加触发记录
    ///
    /// # 参数
    /// - `user_id`: 引起变更的用户
    ///
    /// # 返回
    /// 本次触发并已保存的记录
    pub async fn trigger_demand_alerts_if_needed(
        &self,
        user_id: &str,
        is_material_demand_change: bool,
        old_value: f64,
        new_value: f64,
    ) -> EngineResult<Vec<TriggeredAlert>> {
        if !old_value.is_finite() || !new_value.is_finite() {
            return Err(EngineError::InvalidInput(format!(
                "变更值无效: old={}, new={}",
                old_value, new_value
            )));
        }

        let scope = self
            .config
            .get_alert_rule_scope()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;
        let rules = match scope {
            AlertRuleScope::All => self.repos.alerts.find_all_rules()?,
            AlertRuleScope::Owner => self.repos.alerts.find_rules_by_user(user_id)?,
        };

        let mut triggered = Vec::new();
        for rule in &rules {
            if !rule_fires(rule, is_material_demand_change, old_value, new_value) {
                continue;
            }
            let alert = TriggeredAlert::from_rule(rule, user_id, old_value, new_value);
            self.repos.alerts.save_triggered(&alert)?;
            debug!(
                alert_id = %rule.alert_id,
                rule_owner = %rule.user_id,
                delta = alert.delta,
                "预警触发"
            );
            triggered.push(alert);
        }

        info!(
            user_id = %user_id,
            scope = ?scope,
            rules = rules.len(),
            triggered = triggered.len(),
            "预警评估完成"
        );

        Ok(triggered)
    }
}
