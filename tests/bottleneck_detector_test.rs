// ==========================================
// BottleneckDetector 集成测试
// ==========================================
// 测试目标: 验证周分类写回、产能组状态、计数器全量重算、日志写入
// 覆盖范围: 端到端瓶颈、幂等、人工固定周、失效关联、提前期、计算量上限
// ==========================================

mod helpers;

use capacity_demand_planner::config::PlannerConfig;
use capacity_demand_planner::domain::types::{EventType, Role, WeekColor};
use capacity_demand_planner::engine::{BottleneckDetector, EngineError};
use capacity_demand_planner::repository::{
    CapacityGroupStore, LoggingHistoryRepository, StatusCounterStore,
};
use chrono::NaiveDate;
use helpers::test_data_builder::{CapacityGroupBuilder, DemandBuilder};
use std::sync::Arc;
use test_helpers::{future_week, test_today, TestEnv};

fn detector(env: &TestEnv) -> BottleneckDetector<PlannerConfig> {
    BottleneckDetector::new(env.repos(), env.fixed_config())
}

/// 客户 C1 + 产能组 CG1 (actual=100, max=120)
fn seed_customer_with_group(env: &TestEnv) {
    env.insert_user("C1", Role::Customer);
    env.insert_group(&CapacityGroupBuilder::new("CG1", "C1").capacity(100.0, 120.0).build());
}

// ==========================================
// 端到端场景
// ==========================================

#[tokio::test]
async fn test_single_week_over_max_marks_bottleneck() {
    let env = TestEnv::new();
    seed_customer_with_group(&env);
    env.insert_demand(&DemandBuilder::new("MD1", "C1").week(future_week(1), 130.0).build());
    env.link("CG1", "MD1");

    let result = detector(&env)
        .calculate_bottleneck("C1", false, test_today())
        .await
        .unwrap();

    assert_eq!(env.week_color("MD1-0").as_deref(), Some("RED"));

    let group = env.repos().capacity_groups.find_by_id("CG1").unwrap().unwrap();
    assert_eq!(group.link_status, EventType::StatusReduction);

    let counters = env.repos().status_counters.find_by_user("C1").unwrap().unwrap();
    assert_eq!(counters.status_degradation_count, 1);
    assert_eq!(counters.status_improvement_count, 0);

    assert_eq!(result.updated_values, 1);
    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.groups[0].transitions.len(), 1);
    assert_eq!(result.groups[0].transitions[0].previous_color, None);
    assert_eq!(result.groups[0].transitions[0].current_color, WeekColor::Red);
}

#[tokio::test]
async fn test_repeated_run_is_idempotent() {
    let env = TestEnv::new();
    seed_customer_with_group(&env);
    env.insert_demand(
        &DemandBuilder::new("MD1", "C1")
            .week(future_week(1), 130.0)
            .week(future_week(2), 80.0)
            .week(future_week(3), 110.0)
            .build(),
    );
    env.link("CG1", "MD1");

    let detector = detector(&env);
    let first = detector.calculate_bottleneck("C1", false, test_today()).await.unwrap();
    let second = detector.calculate_bottleneck("C1", false, test_today()).await.unwrap();

    assert_eq!(first.counters.status_improvement_count, 1);
    assert_eq!(first.counters.status_degradation_count, 1);
    assert_eq!(
        first.counters.status_improvement_count,
        second.counters.status_improvement_count
    );
    assert_eq!(
        first.counters.status_degradation_count,
        second.counters.status_degradation_count
    );
    assert_eq!(first.counters.todos_count, second.counters.todos_count);

    // 第二次运行无颜色变化
    assert_eq!(second.updated_values, 0);
    assert!(second.groups[0].transitions.is_empty());
    assert_eq!(env.week_color("MD1-2").as_deref(), Some("GREY"));
}

#[tokio::test]
async fn test_ruled_week_keeps_manual_color() {
    let env = TestEnv::new();
    seed_customer_with_group(&env);
    env.insert_demand(
        &DemandBuilder::new("MD1", "C1")
            .ruled_week(future_week(1), 500.0, WeekColor::Green)
            .week(future_week(2), 50.0)
            .build(),
    );
    env.link("CG1", "MD1");

    let result = detector(&env)
        .calculate_bottleneck("C1", false, test_today())
        .await
        .unwrap();

    assert_eq!(env.week_color("MD1-0").as_deref(), Some("GREEN"));
    assert_eq!(env.week_color("MD1-1").as_deref(), Some("GREEN"));
    // 人工固定周仍参与分类计数
    assert_eq!(result.counters.status_degradation_count, 1);
    assert_eq!(result.counters.status_improvement_count, 1);
    assert_eq!(result.groups[0].link_status, EventType::StatusReduction);
}

#[tokio::test]
async fn test_stale_link_is_skipped() {
    let env = TestEnv::new();
    seed_customer_with_group(&env);
    env.insert_demand(&DemandBuilder::new("MD1", "C1").week(future_week(1), 90.0).build());
    env.insert_demand(&DemandBuilder::new("MD2", "C1").week(future_week(1), 500.0).build());
    env.link("CG1", "MD1");
    env.link("CG1", "MD2");
    env.delete_demand("MD2");

    let result = detector(&env)
        .calculate_bottleneck("C1", false, test_today())
        .await
        .unwrap();

    assert_eq!(result.counters.status_degradation_count, 0);
    assert_eq!(result.counters.status_improvement_count, 1);
    assert_eq!(result.groups[0].link_status, EventType::StatusImprovement);
}

#[tokio::test]
async fn test_missing_user_is_not_found() {
    let env = TestEnv::new();

    let err = detector(&env)
        .calculate_bottleneck("NOBODY", false, test_today())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::NotFound { ref entity, .. } if entity == "User"));
    assert_eq!(env.count_rows("status_counters"), 0);
}

#[tokio::test]
async fn test_group_without_demand_is_unlinked() {
    let env = TestEnv::new();
    seed_customer_with_group(&env);

    let result = detector(&env)
        .calculate_bottleneck("C1", false, test_today())
        .await
        .unwrap();

    assert_eq!(result.groups[0].link_status, EventType::UnLinked);
    let group = env.repos().capacity_groups.find_by_id("CG1").unwrap().unwrap();
    assert_eq!(group.link_status, EventType::UnLinked);
    assert_eq!(result.counters.status_degradation_count, 0);
}

#[tokio::test]
async fn test_shared_demand_settles_one_color_per_run() {
    let env = TestEnv::new();
    seed_customer_with_group(&env);
    env.insert_group(&CapacityGroupBuilder::new("CG2", "C1").capacity(200.0, 250.0).build());
    env.insert_demand(&DemandBuilder::new("MD1", "C1").week(future_week(1), 130.0).build());
    env.link("CG1", "MD1");
    env.link("CG2", "MD1");

    let detector = detector(&env);
    let history = LoggingHistoryRepository::new(env.conn.clone());

    // CG1 判定瓶颈, CG2 判定富余: 恶化优先
    let first = detector.calculate_bottleneck("C1", true, test_today()).await.unwrap();
    assert_eq!(env.week_color("MD1-0").as_deref(), Some("RED"));
    assert_eq!(first.updated_values, 1);
    assert_eq!(first.groups[0].transitions.len(), 1);
    assert!(first.groups[1].transitions.is_empty());
    assert_eq!(first.counters.status_degradation_count, 1);
    assert_eq!(first.counters.status_improvement_count, 1);
    // 两条汇总 + 一条周变化
    assert_eq!(first.logs_written, 3);

    let second = detector.calculate_bottleneck("C1", true, test_today()).await.unwrap();
    assert_eq!(env.week_color("MD1-0").as_deref(), Some("RED"));
    assert_eq!(second.updated_values, 0);
    assert!(second.groups.iter().all(|g| g.transitions.is_empty()));
    assert_eq!(
        second.counters.status_degradation_count,
        first.counters.status_degradation_count
    );
    assert_eq!(
        second.counters.status_improvement_count,
        first.counters.status_improvement_count
    );
    assert_eq!(second.logs_written, 2);
    assert_eq!(history.count_by_user("C1").unwrap(), 5);
}

// ==========================================
// 提前期与周产能
// ==========================================

#[tokio::test]
async fn test_lead_time_buffer_excludes_near_weeks() {
    let env = TestEnv::new();
    seed_customer_with_group(&env);
    env.insert_demand(
        &DemandBuilder::new("MD1", "C1")
            .week(NaiveDate::from_ymd_opt(2026, 10, 26).unwrap(), 999.0)
            .week(future_week(0), 999.0)
            .build(),
    );
    env.link("CG1", "MD1");

    let result = detector(&env)
        .calculate_bottleneck("C1", false, test_today())
        .await
        .unwrap();

    // 截止日前一周不参与, 截止日当周参与
    assert_eq!(env.week_color("MD1-0"), None);
    assert_eq!(env.week_color("MD1-1").as_deref(), Some("RED"));
    assert_eq!(result.counters.status_degradation_count, 1);
}

#[tokio::test]
async fn test_week_capacity_overrides_group_default() {
    let env = TestEnv::new();
    env.insert_user("C1", Role::Customer);
    env.insert_group(
        &CapacityGroupBuilder::new("CG1", "C1")
            .capacity(100.0, 120.0)
            .week_capacity(future_week(1), 200.0, 250.0)
            .build(),
    );
    env.insert_demand(
        &DemandBuilder::new("MD1", "C1")
            .week(future_week(1), 180.0)
            .week(future_week(2), 180.0)
            .build(),
    );
    env.link("CG1", "MD1");

    detector(&env)
        .calculate_bottleneck("C1", false, test_today())
        .await
        .unwrap();

    assert_eq!(env.week_color("MD1-0").as_deref(), Some("GREEN"));
    assert_eq!(env.week_color("MD1-1").as_deref(), Some("RED"));
}

#[tokio::test]
async fn test_demand_summed_across_linked_demands() {
    let env = TestEnv::new();
    seed_customer_with_group(&env);
    env.insert_demand(&DemandBuilder::new("MD1", "C1").week(future_week(1), 70.0).build());
    env.insert_demand(&DemandBuilder::new("MD2", "C1").week(future_week(1), 60.0).build());
    env.link("CG1", "MD1");
    env.link("CG1", "MD2");

    let result = detector(&env)
        .calculate_bottleneck("C1", false, test_today())
        .await
        .unwrap();

    // 70 + 60 = 130 > 120: 两个需求的该周值都标红
    assert_eq!(result.counters.status_degradation_count, 1);
    assert_eq!(env.week_color("MD1-0").as_deref(), Some("RED"));
    assert_eq!(env.week_color("MD2-0").as_deref(), Some("RED"));
}

// ==========================================
// 计算量上限
// ==========================================

#[tokio::test]
async fn test_iteration_limit_aborts_before_writes() {
    let env = TestEnv::new();
    seed_customer_with_group(&env);
    env.insert_demand(
        &DemandBuilder::new("MD1", "C1")
            .week(future_week(1), 130.0)
            .week(future_week(2), 130.0)
            .build(),
    );
    env.link("CG1", "MD1");

    let config = PlannerConfig {
        max_evaluations_per_user: 1,
        ..PlannerConfig::default()
    };
    let detector = BottleneckDetector::new(env.repos(), Arc::new(config));
    let err = detector
        .calculate_bottleneck("C1", false, test_today())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::IterationLimitExceeded { limit: 1, .. }));
    assert_eq!(env.week_color("MD1-0"), None);
    assert!(env.repos().status_counters.find_by_user("C1").unwrap().is_none());
}

// ==========================================
// 日志
// ==========================================

#[tokio::test]
async fn test_post_log_writes_tallies_and_transitions() {
    let env = TestEnv::new();
    seed_customer_with_group(&env);
    env.insert_demand(&DemandBuilder::new("MD1", "C1").week(future_week(1), 130.0).build());
    env.link("CG1", "MD1");

    let detector = detector(&env);
    let history = LoggingHistoryRepository::new(env.conn.clone());

    let first = detector.calculate_bottleneck("C1", true, test_today()).await.unwrap();
    // 瓶颈汇总 1 条 + 周变化 1 条
    assert_eq!(first.logs_written, 2);
    assert_eq!(history.count_by_user("C1").unwrap(), 2);

    let entries = history.find_by_user("C1", 10).unwrap();
    assert!(entries.iter().all(|e| e.capacity_group_id.as_deref() == Some("CG1")));
    assert!(entries
        .iter()
        .any(|e| e.calendar_week == Some(future_week(1)) && e.material_demand_id.as_deref() == Some("MD1")));

    // 无变化时只写汇总
    let second = detector.calculate_bottleneck("C1", true, test_today()).await.unwrap();
    assert_eq!(second.logs_written, 1);

    // post_log=false 不写日志
    detector.calculate_bottleneck("C1", false, test_today()).await.unwrap();
    assert_eq!(history.count_by_user("C1").unwrap(), 3);
}

#[tokio::test]
async fn test_refresh_user_status_fills_todos_and_counters() {
    let env = TestEnv::new();
    seed_customer_with_group(&env);
    env.insert_demand(&DemandBuilder::new("MD1", "C1").week(future_week(1), 130.0).build());
    env.insert_demand(&DemandBuilder::new("MD0", "C1").week(future_week(1), 0.0).build());
    env.link("CG1", "MD1");

    let result = detector(&env)
        .refresh_user_status("C1", false, test_today())
        .await
        .unwrap();

    assert_eq!(result.counters.todos_count, 1);
    assert_eq!(result.counters.status_degradation_count, 1);
}
