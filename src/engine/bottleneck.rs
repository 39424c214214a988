// ==========================================
// 供需产能对账系统 - 瓶颈检测引擎
// ==========================================
// 职责: 用户全部产能组 → 周需求聚合 → 周分类 → 写回颜色/状态/计数器
// 红线:
// - 计数器全量重算, 不做增量
// - 全部产能组计算完成后才写入 (先算后写, 不允许部分写入)
// - ruled=true 的周值颜色不得覆盖
// - 同一需求关联多个产能组时, 每个周值每次运行只定一个颜色 (恶化优先)
// - 日志尽力而为, 失败不影响主流程
// ==========================================

use crate::config::PlannerConfigReader;
use crate::domain::capacity::CapacityGroup;
use crate::domain::demand::DemandSeriesValue;
use crate::domain::logging_history::LoggingHistory;
use crate::domain::status::StatusCounters;
use crate::domain::types::{EventType, WeekColor};
use crate::engine::aggregator::{aggregate_with_sources, lead_time_cutoff};
use crate::engine::classifier::{apply_to_value, classify_week};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::log_sink::post_log;
use crate::engine::repositories::PlanningRepositories;
use crate::engine::todos::TodoCalculator;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

// ==========================================
// WeekTransition - 周颜色变化
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekTransition {
    pub capacity_group_id: String,
    pub material_demand_id: String,
    pub value_id: String,
    pub calendar_week: NaiveDate,
    pub event_type: EventType,
    pub previous_color: Option<WeekColor>,
    pub current_color: WeekColor,
}

impl WeekTransition {
    fn describe(&self, group_name: &str) -> String {
        let previous = self
            .previous_color
            .map(|c| c.as_str())
            .unwrap_or("NONE");
        format!(
            "产能组 {} 第 {} 周物料需求 {} 状态变化: {} → {}",
            group_name, self.calendar_week, self.material_demand_id, previous, self.current_color
        )
    }
}

// ==========================================
// GroupOutcome - 单产能组检测结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupOutcome {
    pub capacity_group_id: String,
    pub name: String,
    pub link_status: EventType,
    pub improvement_weeks: i64,
    pub degradation_weeks: i64,
    pub evaluated_weeks: usize,
    pub transitions: Vec<WeekTransition>,
}

impl GroupOutcome {
    /// 产能组整体状态: 无关联需求 → UN_LINKED; 恶化优先于改善
    fn derive_link_status(has_demands: bool, improvement: i64, degradation: i64) -> EventType {
        if !has_demands {
            EventType::UnLinked
        } else if degradation > 0 {
            EventType::StatusReduction
        } else if improvement > 0 {
            EventType::StatusImprovement
        } else {
            EventType::GeneralEvent
        }
    }
}

// ==========================================
// PendingValue - 本次运行中周值的待定分类
// ==========================================
// 多个产能组共享同一需求时, 按 value_id 合并后再与存储颜色比较
struct PendingValue {
    /// 存储中的原始周值
    value: DemandSeriesValue,
    material_demand_id: String,
    /// 决定最终分类的产能组
    capacity_group_id: String,
    event_type: EventType,
}

/// 合并优先级: 恶化 > 一般事件 > 改善
fn event_severity(event_type: EventType) -> u8 {
    match event_type {
        EventType::StatusReduction => 3,
        EventType::GeneralEvent => 2,
        EventType::StatusImprovement => 1,
        _ => 0,
    }
}

// ==========================================
// BottleneckRunResult - 单用户检测结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleneckRunResult {
    pub user_id: String,
    pub counters: StatusCounters,
    pub groups: Vec<GroupOutcome>,
    pub updated_values: usize,
    pub logs_written: usize,
}

// ==========================================
// BottleneckDetector - 瓶颈检测引擎
// ==========================================
pub struct BottleneckDetector<C>
where
    C: PlannerConfigReader,
{
    repos: PlanningRepositories,
    config: Arc<C>,
}

impl<C> BottleneckDetector<C>
where
    C: PlannerConfigReader,
{
    pub fn new(repos: PlanningRepositories, config: Arc<C>) -> Self {
        Self { repos, config }
    }

    /// 计算用户瓶颈状态
    ///
    /// # 参数
    /// - `user_id`: 用户ID
    /// - `post_log`: 是否写入日志历史
    /// - `today`: 当前日期 (提前期截止日基准)
    ///
    /// # 返回
    /// - Ok(BottleneckRunResult): 已完成全部写入
    /// - Err(NotFound): 用户不存在
    /// - Err(IterationLimitExceeded): 评估次数超限, 未写入任何数据
    #[instrument(skip(self))]
    pub async fn calculate_bottleneck(
        &self,
        user_id: &str,
        post_log: bool,
        today: NaiveDate,
    ) -> EngineResult<BottleneckRunResult> {
        self.repos
            .users
            .get_user(user_id)?
            .ok_or_else(|| EngineError::not_found("User", user_id))?;

        let buffer_weeks = self
            .config
            .get_lead_time_buffer_weeks()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;
        let limit = self
            .config
            .get_max_evaluations_per_user()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;
        let cutoff = lead_time_cutoff(today, buffer_weeks);

        // ===== 第一阶段: 全量计算 (只读) =====
        let mut groups = self.repos.capacity_groups.find_groups_by_user(user_id)?;
        let mut outcomes: Vec<GroupOutcome> = Vec::with_capacity(groups.len());
        let mut pending: BTreeMap<String, PendingValue> = BTreeMap::new();
        let mut evaluations = 0usize;

        for group in groups.iter_mut() {
            let outcome = self.evaluate_group(group, cutoff, &mut pending)?;
            evaluations += outcome.evaluated_weeks;
            if evaluations > limit {
                return Err(EngineError::IterationLimitExceeded {
                    user_id: user_id.to_string(),
                    evaluations,
                    limit,
                });
            }
            outcomes.push(outcome);
        }

        let changed_values = Self::settle_week_colors(pending, &mut outcomes);
        let improvement: i64 = outcomes.iter().map(|o| o.improvement_weeks).sum();
        let degradation: i64 = outcomes.iter().map(|o| o.degradation_weeks).sum();

        // ===== 第二阶段: 写入 =====
        let updated_values = self.repos.demands.save_week_colors(&changed_values)?;
        for group in &groups {
            self.repos.capacity_groups.save(group)?;
        }

        let mut counters = self
            .repos
            .status_counters
            .find_by_user(user_id)?
            .unwrap_or_else(|| StatusCounters::empty(user_id));
        counters.status_improvement_count = improvement;
        counters.status_degradation_count = degradation;
        counters.updated_at = chrono::Utc::now().naive_utc();
        self.repos.status_counters.save(&counters)?;

        // ===== 第三阶段: 日志 (尽力而为) =====
        let logs_written = if post_log {
            self.write_logs(user_id, &outcomes)
        } else {
            0
        };

        info!(
            user_id = %user_id,
            groups = outcomes.len(),
            evaluations,
            improvement,
            degradation,
            updated_values,
            logs_written,
            "瓶颈检测完成"
        );

        Ok(BottleneckRunResult {
            user_id: user_id.to_string(),
            counters,
            groups: outcomes,
            updated_values,
            logs_written,
        })
    }

    /// 刷新用户状态: 先计算待办, 再计算瓶颈
    pub async fn refresh_user_status(
        &self,
        user_id: &str,
        post_log: bool,
        today: NaiveDate,
    ) -> EngineResult<BottleneckRunResult> {
        TodoCalculator::new(self.repos.clone()).calculate_todos(user_id)?;
        self.calculate_bottleneck(user_id, post_log, today).await
    }

    /// 计算单个产能组 (内存中修改 group.link_status, 周值分类并入 pending)
    fn evaluate_group(
        &self,
        group: &mut CapacityGroup,
        cutoff: NaiveDate,
        pending: &mut BTreeMap<String, PendingValue>,
    ) -> EngineResult<GroupOutcome> {
        let demands = self.repos.linked_demands(&group.capacity_group_id)?;
        let weeks = aggregate_with_sources(&demands, cutoff);

        let mut improvement = 0i64;
        let mut degradation = 0i64;

        for (week, aggregated) in &weeks {
            let capacity = group.capacity_for_week(*week);
            let classification =
                classify_week(aggregated.demand, capacity.actual_capacity, capacity.max_capacity);

            debug!(
                capacity_group_id = %group.capacity_group_id,
                calendar_week = %week,
                demand = aggregated.demand,
                actual_capacity = capacity.actual_capacity,
                max_capacity = capacity.max_capacity,
                event_type = %classification.event_type,
                "周分类"
            );

            match classification.event_type {
                EventType::StatusReduction => degradation += 1,
                EventType::StatusImprovement => improvement += 1,
                _ => {}
            }

            for demand in &demands {
                for series in &demand.demand_series {
                    for value in series.values.iter().filter(|v| v.calendar_week == *week) {
                        pending
                            .entry(value.value_id.clone())
                            .and_modify(|entry| {
                                if event_severity(classification.event_type)
                                    > event_severity(entry.event_type)
                                {
                                    entry.event_type = classification.event_type;
                                    entry.capacity_group_id = group.capacity_group_id.clone();
                                }
                            })
                            .or_insert_with(|| PendingValue {
                                value: value.clone(),
                                material_demand_id: demand.material_demand_id.clone(),
                                capacity_group_id: group.capacity_group_id.clone(),
                                event_type: classification.event_type,
                            });
                    }
                }
            }
        }

        group.link_status =
            GroupOutcome::derive_link_status(!demands.is_empty(), improvement, degradation);

        Ok(GroupOutcome {
            capacity_group_id: group.capacity_group_id.clone(),
            name: group.name.clone(),
            link_status: group.link_status,
            improvement_weeks: improvement,
            degradation_weeks: degradation,
            evaluated_weeks: weeks.len(),
            transitions: Vec::new(),
        })
    }

    /// 合并后的分类写入周值, 与存储颜色不同的记为周变化
    ///
    /// 周变化归属于决定最终分类的产能组
    fn settle_week_colors(
        pending: BTreeMap<String, PendingValue>,
        outcomes: &mut [GroupOutcome],
    ) -> Vec<DemandSeriesValue> {
        let mut changed_values = Vec::new();

        for entry in pending.into_values() {
            let PendingValue {
                mut value,
                material_demand_id,
                capacity_group_id,
                event_type,
            } = entry;

            let Some((previous, current)) = apply_to_value(&mut value, event_type) else {
                continue;
            };

            if let Some(outcome) = outcomes
                .iter_mut()
                .find(|o| o.capacity_group_id == capacity_group_id)
            {
                outcome.transitions.push(WeekTransition {
                    capacity_group_id,
                    material_demand_id,
                    value_id: value.value_id.clone(),
                    calendar_week: value.calendar_week,
                    event_type,
                    previous_color: previous,
                    current_color: current,
                });
            }
            changed_values.push(value);
        }

        for outcome in outcomes.iter_mut() {
            outcome
                .transitions
                .sort_by(|a, b| (a.calendar_week, &a.value_id).cmp(&(b.calendar_week, &b.value_id)));
        }

        changed_values
    }

    fn write_logs(&self, user_id: &str, outcomes: &[GroupOutcome]) -> usize {
        let sink = self.repos.log_sink.as_ref();
        let mut written = 0usize;

        for outcome in outcomes {
            let group_id = Some(outcome.capacity_group_id.as_str());

            if outcome.degradation_weeks > 0 {
                let entry = LoggingHistory::new(
                    user_id,
                    EventType::StatusReduction,
                    group_id,
                    Some(format!(
                        "产能组 {} 存在 {} 个瓶颈周",
                        outcome.name, outcome.degradation_weeks
                    )),
                );
                written += post_log(sink, entry) as usize;
            }

            if outcome.improvement_weeks > 0 {
                let entry = LoggingHistory::new(
                    user_id,
                    EventType::StatusImprovement,
                    group_id,
                    Some(format!(
                        "产能组 {} 存在 {} 个产能富余周",
                        outcome.name, outcome.improvement_weeks
                    )),
                );
                written += post_log(sink, entry) as usize;
            }

            for transition in &outcome.transitions {
                let entry = LoggingHistory::new(
                    user_id,
                    transition.event_type,
                    group_id,
                    Some(transition.describe(&outcome.name)),
                )
                .map(|e| {
                    let mut e = e.with_calendar_week(transition.calendar_week);
                    e.material_demand_id = Some(transition.material_demand_id.clone());
                    e
                });
                written += post_log(sink, entry) as usize;
            }
        }

        written
    }
}
