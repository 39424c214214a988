// ==========================================
// PlanningApi 集成测试
// ==========================================
// 测试目标: API 层参数校验、错误转换、批量刷新、CSV 导出、查询接口
// ==========================================

mod helpers;

use capacity_demand_planner::api::{ApiError, PlanningApi};
use capacity_demand_planner::config::{config_keys, ConfigManager};
use capacity_demand_planner::domain::types::{AlertThresholdType, MonitoredObjects, Role};
use capacity_demand_planner::engine::ReportRequest;
use chrono::NaiveDate;
use helpers::test_data_builder::{alert_rule, CapacityGroupBuilder, DemandBuilder};
use test_helpers::{future_week, test_today, TestEnv};

fn api(env: &TestEnv) -> PlanningApi<ConfigManager> {
    PlanningApi::from_connection(env.conn.clone(), env.config_manager()).with_fixed_today(test_today())
}

fn seed(env: &TestEnv) {
    env.insert_user("C1", Role::Customer);
    env.insert_group(&CapacityGroupBuilder::new("CG1", "C1").capacity(100.0, 120.0).build());
    env.insert_demand(
        &DemandBuilder::new("MD1", "C1")
            .week(future_week(1), 130.0)
            .week(future_week(2), 60.0)
            .build(),
    );
    env.link("CG1", "MD1");
}

#[tokio::test]
async fn test_calculate_bottleneck_through_api() {
    let env = TestEnv::new();
    seed(&env);

    let result = api(&env).calculate_bottleneck("C1", true).await.unwrap();
    assert_eq!(result.counters.status_degradation_count, 1);
    assert_eq!(result.counters.status_improvement_count, 1);

    let logs = api(&env).list_logging_history("C1", None).unwrap();
    // 瓶颈汇总 + 富余汇总 + 2 个周变化
    assert_eq!(logs.len(), 4);
    assert_eq!(api(&env).list_logging_history("C1", Some(1)).unwrap().len(), 1);
}

#[tokio::test]
async fn test_input_validation() {
    let env = TestEnv::new();
    let api = api(&env);

    assert!(matches!(api.calculate_todos("  "), Err(ApiError::InvalidInput(_))));
    assert!(matches!(
        api.calculate_bottleneck("", false).await,
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.update_demand_value("C1", "V1", -1.0).await,
        Err(ApiError::InvalidInput(_))
    ));
    assert!(matches!(
        api.list_logging_history("C1", Some(0)),
        Err(ApiError::InvalidInput(_))
    ));
}

#[tokio::test]
async fn test_missing_user_maps_to_not_found() {
    let env = TestEnv::new();
    let err = api(&env).calculate_bottleneck("NOBODY", false).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_iteration_limit_maps_to_limit_exceeded() {
    let env = TestEnv::new();
    seed(&env);
    env.set_config(config_keys::MAX_EVALUATIONS_PER_USER, "1");

    let err = api(&env).calculate_bottleneck("C1", false).await.unwrap_err();
    assert!(matches!(err, ApiError::LimitExceeded(_)));
}

#[tokio::test]
async fn test_refresh_users_isolates_failures() {
    let env = TestEnv::new();
    seed(&env);
    env.insert_user("C2", Role::Customer);

    let user_ids = vec!["C1".to_string(), "NOBODY".to_string(), "C2".to_string()];
    let results = api(&env).refresh_users(&user_ids, false).await;

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].0, "C1");
    assert_eq!(
        results[0].1.as_ref().unwrap().counters.status_degradation_count,
        1
    );
    assert!(matches!(results[1].1, Err(ApiError::NotFound(_))));
    assert!(results[2].1.is_ok());
}

#[tokio::test]
async fn test_update_demand_value_triggers_alerts() {
    let env = TestEnv::new();
    seed(&env);
    env.insert_alert_rule(&alert_rule(
        "R1",
        "C1",
        MonitoredObjects::AllDemands,
        AlertThresholdType::Relative,
        0.1,
    ));

    let api = api(&env);
    let fired = api.update_demand_value("C1", "MD1-1", 70.0).await.unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].old_value, 60.0);
    assert_eq!(fired[0].new_value, 70.0);

    let listed = api.list_triggered_alerts("C1").unwrap();
    assert_eq!(listed.len(), 1);

    let err = api.update_demand_value("C1", "MISSING", 1.0).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn test_export_year_report_csv() {
    let env = TestEnv::new();
    seed(&env);

    let request = ReportRequest {
        user_id: "C1".to_string(),
        capacity_group_id: "CG1".to_string(),
        start_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
        ruled: false,
        percentage: None,
    };

    let mut buf: Vec<u8> = Vec::new();
    let rows = api(&env).export_year_report_csv(&request, &mut buf).await.unwrap();
    assert_eq!(rows, 2);

    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().nth(1).unwrap().ends_with("STATUS_REDUCTION,RED"));
    assert!(text.lines().nth(2).unwrap().ends_with("STATUS_IMPROVEMENT,GREEN"));
}

#[tokio::test]
async fn test_generate_year_report_validation() {
    let env = TestEnv::new();
    seed(&env);

    let err = api(&env)
        .generate_year_report(
            "C1",
            "",
            NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            false,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidInput(_)));

    let err = api(&env)
        .generate_year_report(
            "C1",
            "CG-404",
            NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            false,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
