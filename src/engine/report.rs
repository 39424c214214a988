// ==========================================
// 供需产能对账系统 - 年/月/周报表生成
// ==========================================
// 职责: 产能组指定日期范围 → Year → Month → Week 树
// 着色:
// - ruled=false: 报表判定 (只比较实际产能)
// - ruled=true:  按允许偏差百分比着色 (RED/YELLOW/GREEN)
// 红线: 提前期缓冲内的周与检测器同样排除
// 说明: 只读, 每次请求现算
// ==========================================

use crate::config::PlannerConfigReader;
use crate::domain::report::{MonthReport, ReportSummary, WeekReport, YearReport};
use crate::domain::types::WeekColor;
use crate::engine::aggregator::{aggregate_with_sources, lead_time_cutoff};
use crate::engine::classifier::{classify_for_report, classify_ruled_band};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::PlanningRepositories;
use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::io;
use std::sync::Arc;
use tracing::info;

// ==========================================
// ReportRequest - 报表请求参数
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub user_id: String,
    pub capacity_group_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub ruled: bool,
    pub percentage: Option<f64>,
}

// ==========================================
// ReportGenerator - 报表生成器
// ==========================================
pub struct ReportGenerator<C>
where
    C: PlannerConfigReader,
{
    repos: PlanningRepositories,
    config: Arc<C>,
}

impl<C> ReportGenerator<C>
where
    C: PlannerConfigReader,
{
    pub fn new(repos: PlanningRepositories, config: Arc<C>) -> Self {
        Self { repos, config }
    }

    /// 生成年报表
    ///
    /// # 返回
    /// 按年份升序的报表列表 (范围跨年时多于一个)
    ///
    /// # 错误
    /// - NotFound: 用户/产能组不存在, 或产能组不属于该用户
    /// - InvalidInput: 起止日期倒置, 或百分比为负
    /// - IterationLimitExceeded: 日期范围超过报表最大周数
    pub async fn generate_year_report(
        &self,
        request: &ReportRequest,
        today: NaiveDate,
    ) -> EngineResult<Vec<YearReport>> {
        if request.start_date > request.end_date {
            return Err(EngineError::InvalidInput(format!(
                "开始日期 {} 晚于结束日期 {}",
                request.start_date, request.end_date
            )));
        }

        let max_weeks = self
            .config
            .get_max_report_weeks()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;
        let range_weeks = ((request.end_date - request.start_date).num_days() / 7 + 1) as usize;
        if range_weeks > max_weeks {
            return Err(EngineError::IterationLimitExceeded {
                user_id: request.user_id.clone(),
                evaluations: range_weeks,
                limit: max_weeks,
            });
        }

        let percentage = if request.ruled {
            let p = match request.percentage {
                Some(p) => p,
                None => self
                    .config
                    .get_default_ruled_percentage()
                    .await
                    .map_err(|e| EngineError::Config(e.to_string()))?,
            };
            if p < 0.0 || !p.is_finite() {
                return Err(EngineError::InvalidInput(format!("允许偏差百分比无效: {}", p)));
            }
            Some(p)
        } else {
            None
        };

        self.repos
            .users
            .get_user(&request.user_id)?
            .ok_or_else(|| EngineError::not_found("User", &request.user_id))?;
        let group = self
            .repos
            .capacity_groups
            .find_by_id(&request.capacity_group_id)?
            .filter(|g| g.user_id == request.user_id)
            .ok_or_else(|| EngineError::not_found("CapacityGroup", &request.capacity_group_id))?;

        let buffer_weeks = self
            .config
            .get_lead_time_buffer_weeks()
            .await
            .map_err(|e| EngineError::Config(e.to_string()))?;
        let cutoff = lead_time_cutoff(today, buffer_weeks);

        let demands = self.repos.linked_demands(&group.capacity_group_id)?;
        let aggregated = aggregate_with_sources(&demands, cutoff);

        let weeks: Vec<WeekReport> = aggregated
            .range(request.start_date..=request.end_date)
            .map(|(week, agg)| {
                let capacity = group.capacity_for_week(*week);
                let (event_type, week_color) = match percentage {
                    Some(p) => classify_ruled_band(agg.demand, capacity.actual_capacity, p),
                    None => {
                        let event = classify_for_report(
                            agg.demand,
                            capacity.actual_capacity,
                            capacity.max_capacity,
                        );
                        (event, WeekColor::from_event(event))
                    }
                };
                WeekReport {
                    calendar_week: *week,
                    iso_week: week.iso_week().week(),
                    demand: agg.demand,
                    actual_capacity: capacity.actual_capacity,
                    max_capacity: capacity.max_capacity,
                    delta: agg.demand - capacity.actual_capacity,
                    event_type,
                    week_color,
                    demand_series_ids: agg.demand_series_ids.clone(),
                }
            })
            .collect();

        let reports = build_tree(request, percentage, weeks);

        info!(
            user_id = %request.user_id,
            capacity_group_id = %request.capacity_group_id,
            ruled = request.ruled,
            years = reports.len(),
            weeks = reports.iter().map(|r| r.summary.week_count()).sum::<u32>(),
            "报表生成完成"
        );

        Ok(reports)
    }
}

/// 周节点 (已按日期升序) → 年/月树
fn build_tree(
    request: &ReportRequest,
    percentage: Option<f64>,
    weeks: Vec<WeekReport>,
) -> Vec<YearReport> {
    let mut years: Vec<YearReport> = Vec::new();

    for week in weeks {
        let year = week.calendar_week.year();
        let month = week.calendar_week.month();

        if years.last().map(|y| y.year) != Some(year) {
            years.push(YearReport {
                year,
                user_id: request.user_id.clone(),
                capacity_group_id: request.capacity_group_id.clone(),
                ruled: request.ruled,
                percentage,
                months: Vec::new(),
                summary: ReportSummary::default(),
            });
        }
        let Some(year_node) = years.last_mut() else {
            continue;
        };

        if year_node.months.last().map(|m| m.month) != Some(month) {
            year_node.months.push(MonthReport {
                month,
                weeks: Vec::new(),
                summary: ReportSummary::default(),
            });
        }
        if let Some(month_node) = year_node.months.last_mut() {
            month_node.summary.absorb(&week);
            month_node.weeks.push(week);
        }
    }

    for year in years.iter_mut() {
        let mut summary = ReportSummary::default();
        for month in &year.months {
            summary.merge(&month.summary);
        }
        year.summary = summary;
    }

    years
}

// ==========================================
// CSV 导出
// ==========================================

#[derive(Debug, Serialize)]
struct ReportCsvRow<'a> {
    year: i32,
    month: u32,
    iso_week: u32,
    calendar_week: String,
    demand: f64,
    actual_capacity: f64,
    max_capacity: f64,
    delta: f64,
    event_type: &'a str,
    week_color: &'a str,
}

/// 报表导出为 CSV (每周一行)
pub fn write_report_csv<W: io::Write>(reports: &[YearReport], writer: W) -> EngineResult<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut rows = 0usize;

    for report in reports {
        for month in &report.months {
            for week in &month.weeks {
                csv_writer
                    .serialize(ReportCsvRow {
                        year: report.year,
                        month: month.month,
                        iso_week: week.iso_week,
                        calendar_week: week.calendar_week.format("%Y-%m-%d").to_string(),
                        demand: week.demand,
                        actual_capacity: week.actual_capacity,
                        max_capacity: week.max_capacity,
                        delta: week.delta,
                        event_type: week.event_type.as_str(),
                        week_color: week.week_color.as_str(),
                    })
                    .with_context(|| format!("第 {} 周报表行写入失败", week.calendar_week))
                    .map_err(EngineError::Export)?;
                rows += 1;
            }
        }
    }

    csv_writer
        .flush()
        .context("CSV 输出刷新失败")
        .map_err(EngineError::Export)?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::EventType;

    fn week_report(y: i32, m: u32, d: u32, demand: f64, color: WeekColor) -> WeekReport {
        let calendar_week = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        WeekReport {
            calendar_week,
            iso_week: calendar_week.iso_week().week(),
            demand,
            actual_capacity: 100.0,
            max_capacity: 120.0,
            delta: demand - 100.0,
            event_type: EventType::GeneralEvent,
            week_color: color,
            demand_series_ids: vec!["S1".to_string()],
        }
    }

    fn request() -> ReportRequest {
        ReportRequest {
            user_id: "U1".to_string(),
            capacity_group_id: "CG1".to_string(),
            start_date: NaiveDate::from_ymd_opt(2026, 11, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2027, 2, 1).unwrap(),
            ruled: false,
            percentage: None,
        }
    }

    #[test]
    fn test_build_tree_splits_years_and_months() {
        let weeks = vec![
            week_report(2026, 11, 23, 90.0, WeekColor::Green),
            week_report(2026, 11, 30, 130.0, WeekColor::Red),
            week_report(2026, 12, 7, 100.0, WeekColor::Grey),
            week_report(2027, 1, 4, 80.0, WeekColor::Green),
        ];
        let years = build_tree(&request(), None, weeks);

        assert_eq!(years.len(), 2);
        assert_eq!(years[0].year, 2026);
        assert_eq!(years[0].months.len(), 2);
        assert_eq!(years[0].months[0].weeks.len(), 2);
        assert_eq!(years[0].summary.total_demand, 320.0);
        assert_eq!(years[0].summary.red_weeks, 1);
        assert_eq!(years[0].summary.grey_weeks, 1);
        assert_eq!(years[0].summary.week_count(), 3);
        assert_eq!(years[1].months[0].month, 1);
        assert_eq!(years[1].weeks().next().unwrap().iso_week, 1);
    }

    #[test]
    fn test_build_tree_empty() {
        assert!(build_tree(&request(), None, vec![]).is_empty());
    }

    #[test]
    fn test_write_report_csv() {
        let years = build_tree(
            &request(),
            None,
            vec![
                week_report(2026, 11, 23, 90.0, WeekColor::Green),
                week_report(2026, 12, 7, 130.0, WeekColor::Red),
            ],
        );
        let mut buf = Vec::new();
        let rows = write_report_csv(&years, &mut buf).unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "year,month,iso_week,calendar_week,demand,actual_capacity,max_capacity,delta,event_type,week_color"
        );
        assert_eq!(
            lines.next().unwrap(),
            "2026,11,48,2026-11-23,90.0,100.0,120.0,-10.0,GENERAL_EVENT,GREEN"
        );
    }

    struct BrokenPipe;

    impl io::Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "下游已关闭"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "下游已关闭"))
        }
    }

    #[test]
    fn test_write_report_csv_reports_io_failure() {
        let years = build_tree(
            &request(),
            None,
            vec![week_report(2026, 11, 23, 90.0, WeekColor::Green)],
        );
        let err = write_report_csv(&years, BrokenPipe).unwrap_err();
        match err {
            EngineError::Export(cause) => {
                assert!(format!("{:#}", cause).contains("下游已关闭"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
