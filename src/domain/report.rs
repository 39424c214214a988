// ==========================================
// 供需产能对账系统 - 年/月/周报表模型
// ==========================================
// 结构: YearReport → MonthReport → WeekReport (自上而下持有)
// 说明: 每次请求现算, 不是权威状态
// ==========================================

use crate::domain::types::{EventType, WeekColor};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// WeekReport - 周节点
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekReport {
    pub calendar_week: NaiveDate,
    pub iso_week: u32,
    pub demand: f64,
    pub actual_capacity: f64,
    pub max_capacity: f64,
    pub delta: f64, // demand - actual_capacity
    pub event_type: EventType,
    pub week_color: WeekColor,
    pub demand_series_ids: Vec<String>, // 汇总来源
}

// ==========================================
// ReportSummary - 节点汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total_demand: f64,
    pub total_actual_capacity: f64,
    pub red_weeks: u32,
    pub yellow_weeks: u32,
    pub green_weeks: u32,
    pub grey_weeks: u32,
}

impl ReportSummary {
    /// 计入一个周节点
    pub fn absorb(&mut self, week: &WeekReport) {
        self.total_demand += week.demand;
        self.total_actual_capacity += week.actual_capacity;
        match week.week_color {
            WeekColor::Red => self.red_weeks += 1,
            WeekColor::Yellow => self.yellow_weeks += 1,
            WeekColor::Green => self.green_weeks += 1,
            WeekColor::Grey => self.grey_weeks += 1,
        }
    }

    /// 合并下级节点汇总
    pub fn merge(&mut self, other: &ReportSummary) {
        self.total_demand += other.total_demand;
        self.total_actual_capacity += other.total_actual_capacity;
        self.red_weeks += other.red_weeks;
        self.yellow_weeks += other.yellow_weeks;
        self.green_weeks += other.green_weeks;
        self.grey_weeks += other.grey_weeks;
    }

    pub fn week_count(&self) -> u32 {
        self.red_weeks + self.yellow_weeks + self.green_weeks + self.grey_weeks
    }
}

// ==========================================
// MonthReport - 月节点
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthReport {
    pub month: u32,
    pub weeks: Vec<WeekReport>,
    pub summary: ReportSummary,
}

// ==========================================
// YearReport - 年节点
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearReport {
    pub year: i32,
    pub user_id: String,
    pub capacity_group_id: String,
    pub ruled: bool,
    pub percentage: Option<f64>,
    pub months: Vec<MonthReport>,
    pub summary: ReportSummary,
}

impl YearReport {
    /// 按时间顺序遍历全部周节点
    pub fn weeks(&self) -> impl Iterator<Item = &WeekReport> {
        self.months.iter().flat_map(|m| m.weeks.iter())
    }
}
