// ==========================================
// 供需产能对账系统 - 对账 API
// ==========================================
// 职责: 绑定四个引擎入口 (待办/瓶颈/报表/预警), 做参数校验与错误转换
// 调用方: REST 层、定时刷新任务、CLI
// ==========================================

use std::io;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use futures::future::join_all;
use rusqlite::Connection;

use crate::api::error::{ApiError, ApiResult};
use crate::config::PlannerConfigReader;
use crate::domain::alert::TriggeredAlert;
use crate::domain::logging_history::LoggingHistory;
use crate::domain::report::YearReport;
use crate::engine::alert::AlertEngine;
use crate::engine::bottleneck::{BottleneckDetector, BottleneckRunResult};
use crate::engine::report::{write_report_csv, ReportGenerator, ReportRequest};
use crate::engine::repositories::PlanningRepositories;
use crate::engine::todos::TodoCalculator;
use crate::repository::LoggingHistoryRepository;

/// 日志查询默认条数
pub const DEFAULT_LOG_LIMIT: usize = 200;

// ==========================================
// PlanningApi - 对账 API
// ==========================================

/// 对账API
///
/// 职责：
/// 1. 待办统计、瓶颈检测、状态刷新 (单用户/多用户)
/// 2. 年/月/周报表与 CSV 导出
/// 3. 需求变更后的预警评估
/// 4. 预警记录与日志历史查询
pub struct PlanningApi<C>
where
    C: PlannerConfigReader,
{
    repos: PlanningRepositories,
    logging_history_repo: Arc<LoggingHistoryRepository>,
    todo_calculator: TodoCalculator,
    detector: BottleneckDetector<C>,
    report_generator: ReportGenerator<C>,
    alert_engine: AlertEngine<C>,
    // 固定当前日期 (测试/补算用), None 时取本地日期
    fixed_today: Option<NaiveDate>,
}

impl<C> PlanningApi<C>
where
    C: PlannerConfigReader,
{
    /// 创建新的PlanningApi实例
    pub fn new(
        repos: PlanningRepositories,
        logging_history_repo: Arc<LoggingHistoryRepository>,
        config: Arc<C>,
    ) -> Self {
        Self {
            todo_calculator: TodoCalculator::new(repos.clone()),
            detector: BottleneckDetector::new(repos.clone(), config.clone()),
            report_generator: ReportGenerator::new(repos.clone(), config.clone()),
            alert_engine: AlertEngine::new(repos.clone(), config),
            repos,
            logging_history_repo,
            fixed_today: None,
        }
    }

    /// 基于共享连接创建 (全部使用 rusqlite 实现)
    pub fn from_connection(conn: Arc<Mutex<Connection>>, config: Arc<C>) -> Self {
        let logging_history_repo = Arc::new(LoggingHistoryRepository::new(conn.clone()));
        let repos =
            PlanningRepositories::from_connection(conn).with_log_sink(logging_history_repo.clone());
        Self::new(repos, logging_history_repo, config)
    }

    /// 固定当前日期
    pub fn with_fixed_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    // ==========================================
    // 状态计算接口
    // ==========================================

    /// 计算用户待办数量
    pub fn calculate_todos(&self, user_id: &str) -> ApiResult<i64> {
        validate_user_id(user_id)?;
        Ok(self.todo_calculator.calculate_todos(user_id)?)
    }

    /// 计算用户瓶颈状态
    ///
    /// # 参数
    /// - user_id: 用户ID
    /// - post_log: 是否写入日志历史
    ///
    /// # 返回
    /// - Ok(BottleneckRunResult): 计数器与各产能组结果
    /// - Err(ApiError::NotFound): 用户不存在
    /// - Err(ApiError::LimitExceeded): 评估次数超限, 未写入
    pub async fn calculate_bottleneck(
        &self,
        user_id: &str,
        post_log: bool,
    ) -> ApiResult<BottleneckRunResult> {
        validate_user_id(user_id)?;
        Ok(self
            .detector
            .calculate_bottleneck(user_id, post_log, self.today())
            .await?)
    }

    /// 刷新用户状态 (待办 + 瓶颈)
    pub async fn refresh_user_status(
        &self,
        user_id: &str,
        post_log: bool,
    ) -> ApiResult<BottleneckRunResult> {
        validate_user_id(user_id)?;
        Ok(self
            .detector
            .refresh_user_status(user_id, post_log, self.today())
            .await?)
    }

    /// 批量刷新用户状态
    ///
    /// 各用户之间无共享可变状态, 单个用户失败不影响其他用户
    pub async fn refresh_users(
        &self,
        user_ids: &[String],
        post_log: bool,
    ) -> Vec<(String, ApiResult<BottleneckRunResult>)> {
        let runs = user_ids.iter().map(|user_id| async move {
            let result = self.refresh_user_status(user_id, post_log).await;
            if let Err(e) = &result {
                tracing::warn!(user_id = %user_id, error = %e, "用户状态刷新失败");
            }
            (user_id.clone(), result)
        });
        join_all(runs).await
    }

    // ==========================================
    // 报表接口
    // ==========================================

    /// 生成年/月/周报表
    pub async fn generate_year_report(
        &self,
        user_id: &str,
        capacity_group_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
        ruled: bool,
        percentage: Option<f64>,
    ) -> ApiResult<Vec<YearReport>> {
        let request = build_report_request(
            user_id,
            capacity_group_id,
            start_date,
            end_date,
            ruled,
            percentage,
        )?;
        Ok(self
            .report_generator
            .generate_year_report(&request, self.today())
            .await?)
    }

    /// 生成报表并导出为 CSV
    ///
    /// # 返回
    /// - Ok(usize): 写出的周行数
    pub async fn export_year_report_csv<W: io::Write>(
        &self,
        request: &ReportRequest,
        writer: W,
    ) -> ApiResult<usize> {
        validate_report_request(request)?;
        let reports = self
            .report_generator
            .generate_year_report(request, self.today())
            .await?;
        Ok(write_report_csv(&reports, writer)?)
    }

    // ==========================================
    // 预警接口
    // ==========================================

    /// 评估需求/产能变更是否触发预警
    pub async fn trigger_demand_alerts_if_needed(
        &self,
        user_id: &str,
        is_material_demand_change: bool,
        old_value: f64,
        new_value: f64,
    ) -> ApiResult<Vec<TriggeredAlert>> {
        validate_user_id(user_id)?;
        Ok(self
            .alert_engine
            .trigger_demand_alerts_if_needed(user_id, is_material_demand_change, old_value, new_value)
            .await?)
    }

    /// 更新周需求值并评估预警
    ///
    /// # 返回
    /// - Ok(Vec<TriggeredAlert>): 本次触发的预警
    /// - Err(ApiError::NotFound): 周需求值不存在
    pub async fn update_demand_value(
        &self,
        user_id: &str,
        value_id: &str,
        new_demand: f64,
    ) -> ApiResult<Vec<TriggeredAlert>> {
        validate_user_id(user_id)?;
        if value_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("周需求值ID不能为空".to_string()));
        }
        if !new_demand.is_finite() || new_demand < 0.0 {
            return Err(ApiError::InvalidInput(format!(
                "需求数量必须为非负数: {}",
                new_demand
            )));
        }

        let old_demand = self
            .repos
            .demands
            .update_value_demand(value_id, new_demand)?
            .ok_or_else(|| ApiError::NotFound(format!("DemandSeriesValue(id={})不存在", value_id)))?;

        self.trigger_demand_alerts_if_needed(user_id, true, old_demand, new_demand)
            .await
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 查询用户的预警触发记录
    pub fn list_triggered_alerts(&self, user_id: &str) -> ApiResult<Vec<TriggeredAlert>> {
        validate_user_id(user_id)?;
        Ok(self.repos.alerts.find_triggered_by_user(user_id)?)
    }

    /// 查询用户日志历史 (按时间倒序)
    pub fn list_logging_history(
        &self,
        user_id: &str,
        limit: Option<usize>,
    ) -> ApiResult<Vec<LoggingHistory>> {
        validate_user_id(user_id)?;
        let limit = limit.unwrap_or(DEFAULT_LOG_LIMIT);
        if limit == 0 {
            return Err(ApiError::InvalidInput("查询条数必须大于0".to_string()));
        }
        Ok(self.logging_history_repo.find_by_user(user_id, limit)?)
    }
}

// ==========================================
// 参数校验
// ==========================================

fn validate_user_id(user_id: &str) -> ApiResult<()> {
    if user_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("用户ID不能为空".to_string()));
    }
    Ok(())
}

fn validate_report_request(request: &ReportRequest) -> ApiResult<()> {
    validate_user_id(&request.user_id)?;
    if request.capacity_group_id.trim().is_empty() {
        return Err(ApiError::InvalidInput("产能组ID不能为空".to_string()));
    }
    if request.start_date > request.end_date {
        return Err(ApiError::InvalidInput(format!(
            "开始日期{}晚于结束日期{}",
            request.start_date, request.end_date
        )));
    }
    if let Some(p) = request.percentage {
        if !p.is_finite() || p < 0.0 {
            return Err(ApiError::InvalidInput(format!("允许偏差百分比无效: {}", p)));
        }
    }
    Ok(())
}

fn build_report_request(
    user_id: &str,
    capacity_group_id: &str,
    start_date: NaiveDate,
    end_date: NaiveDate,
    ruled: bool,
    percentage: Option<f64>,
) -> ApiResult<ReportRequest> {
    let request = ReportRequest {
        user_id: user_id.to_string(),
        capacity_group_id: capacity_group_id.to_string(),
        start_date,
        end_date,
        ruled,
        percentage,
    };
    validate_report_request(&request)?;
    Ok(request)
}
