// ==========================================
// 供需产能对账系统 - 产能组领域模型
// ==========================================
// 用途: 供应商承诺产能, 按周比对需求
// 写入方: 产能组 CRUD (外部) + 瓶颈检测器 (仅 link_status)
// ==========================================

use crate::domain::types::EventType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// CapacityGroup - 产能组
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityGroup {
    pub capacity_group_id: String,
    pub name: String,
    pub user_id: String, // 所属用户

    // ===== 产能参数 (>= 0) =====
    pub actual_capacity: f64,
    pub max_capacity: f64,

    // ===== 状态 =====
    pub link_status: EventType, // 整组事件分类

    // ===== 按周产能 =====
    pub capacity_time_series: Vec<CapacityTimeSeries>,
}

// ==========================================
// CapacityTimeSeries - 周产能点
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityTimeSeries {
    pub calendar_week: NaiveDate,
    pub actual_capacity: f64,
    pub maximum_capacity: f64,
}

/// 某周生效的产能 (actual, max)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekCapacity {
    pub actual_capacity: f64,
    pub max_capacity: f64,
}

impl CapacityGroup {
    /// 取指定周的产能
    ///
    /// 优先使用该周的时间序列点, 否则回落到产能组默认值
    pub fn capacity_for_week(&self, week: NaiveDate) -> WeekCapacity {
        self.capacity_time_series
            .iter()
            .find(|point| point.calendar_week == week)
            .map(|point| WeekCapacity {
                actual_capacity: point.actual_capacity,
                max_capacity: point.maximum_capacity,
            })
            .unwrap_or(WeekCapacity {
                actual_capacity: self.actual_capacity,
                max_capacity: self.max_capacity,
            })
    }
}
