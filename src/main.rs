// ==========================================
// 供需产能对账系统 - 命令行入口
// ==========================================
// 用法:
//   capacity-demand-planner [--db <path>] <command> <user_id> [args...]
//
// 命令:
//   init                                  建表 (幂等)
//   todos <user_id>                       计算待办
//   bottleneck <user_id> [--log]          瓶颈检测
//   refresh <user_id>... [--log]          刷新用户状态 (待办 + 瓶颈)
//   report <user_id> <group_id> <start> <end> [ruled] [percentage] [--csv]
//   alerts <user_id>                      查询预警记录
//   logs <user_id> [limit]                查询日志历史
//   config [key value]                    查看/设置全局配置
// ==========================================

use std::error::Error;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use capacity_demand_planner::api::PlanningApi;
use capacity_demand_planner::config::ConfigManager;
use capacity_demand_planner::db::{init_schema, open_sqlite_connection};
use capacity_demand_planner::engine::ReportRequest;
use capacity_demand_planner::logging;

/// 数据库路径环境变量
const DB_PATH_ENV: &str = "CAPACITY_PLANNER_DB_PATH";

fn default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./capacity_demand_planner.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("capacity-demand-planner");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("capacity_demand_planner.db");
        }
    }
    path.to_string_lossy().to_string()
}

fn parse_date(raw: &str) -> Result<NaiveDate, Box<dyn Error + Send + Sync>> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| format!("日期格式错误 (YYYY-MM-DD): {} ({})", raw, e).into())
}

fn usage() -> &'static str {
    "用法: capacity-demand-planner [--db <path>] \
     <init|todos|bottleneck|refresh|report|alerts|logs|config> <user_id> [args...]"
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    logging::init();

    let mut args: Vec<String> = std::env::args().skip(1).collect();

    let db_path = match args.iter().position(|a| a == "--db") {
        Some(idx) if idx + 1 < args.len() => {
            let path = args.remove(idx + 1);
            args.remove(idx);
            path
        }
        _ => default_db_path(),
    };
    let post_log = take_flag(&mut args, "--log");
    let as_csv = take_flag(&mut args, "--csv");

    let Some(command) = args.first().cloned() else {
        eprintln!("{}", usage());
        std::process::exit(2);
    };
    let rest = &args[1..];

    tracing::info!(
        "{} v{} - 数据库: {}",
        capacity_demand_planner::APP_NAME,
        capacity_demand_planner::VERSION,
        db_path
    );

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(Mutex::new(conn));

    let config = Arc::new(ConfigManager::from_connection(conn.clone()));
    let api = PlanningApi::from_connection(conn, config.clone());

    let user_id = rest.first().map(|s| s.as_str()).unwrap_or("");

    match command.as_str() {
        "init" => {
            println!("schema ready: {}", db_path);
        }
        "todos" => {
            let count = api.calculate_todos(user_id)?;
            println!("todos_count={}", count);
        }
        "bottleneck" => {
            let result = api.calculate_bottleneck(user_id, post_log).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        "refresh" => {
            for (user_id, result) in api.refresh_users(rest, post_log).await {
                match result {
                    Ok(run) => println!(
                        "{}: improvement={} degradation={} todos={}",
                        user_id,
                        run.counters.status_improvement_count,
                        run.counters.status_degradation_count,
                        run.counters.todos_count
                    ),
                    Err(e) => println!("{}: 失败 - {}", user_id, e),
                }
            }
        }
        "report" => {
            if rest.len() < 4 {
                eprintln!("{}", usage());
                std::process::exit(2);
            }
            let ruled = rest.get(4).map(|s| s == "true" || s == "1").unwrap_or(false);
            let percentage = match rest.get(5) {
                Some(raw) => Some(raw.parse::<f64>()?),
                None => None,
            };
            let request = ReportRequest {
                user_id: rest[0].clone(),
                capacity_group_id: rest[1].clone(),
                start_date: parse_date(&rest[2])?,
                end_date: parse_date(&rest[3])?,
                ruled,
                percentage,
            };
            if as_csv {
                api.export_year_report_csv(&request, std::io::stdout()).await?;
            } else {
                let reports = api
                    .generate_year_report(
                        &request.user_id,
                        &request.capacity_group_id,
                        request.start_date,
                        request.end_date,
                        request.ruled,
                        request.percentage,
                    )
                    .await?;
                println!("{}", serde_json::to_string_pretty(&reports)?);
            }
        }
        "alerts" => {
            let alerts = api.list_triggered_alerts(user_id)?;
            println!("{}", serde_json::to_string_pretty(&alerts)?);
        }
        "logs" => {
            let limit = match rest.get(1) {
                Some(raw) => Some(raw.parse::<usize>()?),
                None => None,
            };
            let logs = api.list_logging_history(user_id, limit)?;
            println!("{}", serde_json::to_string_pretty(&logs)?);
        }
        "config" => {
            if let (Some(key), Some(value)) = (rest.first(), rest.get(1)) {
                config.set_global_config_value(key, value)?;
            }
            let snapshot = config.get_config_snapshot()?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        other => {
            eprintln!("未知命令: {}\n{}", other, usage());
            std::process::exit(2);
        }
    }

    Ok(())
}

fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}
