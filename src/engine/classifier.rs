// ==========================================
// 供需产能对账系统 - 状态分类器
// ==========================================
// 职责: (需求, 实际产能, 最大产能) → 事件类型
// 说明: 纯函数, 无实例状态
// 注意: 检测器与报表使用两套判定, max_capacity != actual_capacity 时结论可能不同,
//       两者均保留, 不合并
// ==========================================

use crate::domain::demand::DemandSeriesValue;
use crate::domain::types::{Deviation, EventType, WeekColor};

// ==========================================
// WeekClassification - 单周分类结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeekClassification {
    pub event_type: EventType,
    pub deviation: Deviation,
    pub week_color: WeekColor,
}

/// 检测器判定 (完整版)
///
/// 判定顺序 (不可交换):
/// 1. demand > max, 或 (max == 0 且 demand > actual) → STATUS_REDUCTION
/// 2. demand == actual == max → GENERAL_EVENT
/// 3. demand <= actual → STATUS_IMPROVEMENT
/// 4. 其余 → GENERAL_EVENT
pub fn classify_for_detector(demand: f64, actual_capacity: f64, max_capacity: f64) -> EventType {
    if demand > max_capacity || (max_capacity == 0.0 && demand > actual_capacity) {
        EventType::StatusReduction
    } else if demand == actual_capacity && actual_capacity == max_capacity {
        EventType::GeneralEvent
    } else if demand <= actual_capacity {
        EventType::StatusImprovement
    } else {
        EventType::GeneralEvent
    }
}

/// 报表判定 (只比较实际产能)
///
/// 参数与检测器判定一致, max_capacity 不参与比较.
/// demand > actual → STATUS_REDUCTION; demand < actual → STATUS_IMPROVEMENT; 相等 → GENERAL_EVENT
pub fn classify_for_report(demand: f64, actual_capacity: f64, _max_capacity: f64) -> EventType {
    if demand > actual_capacity {
        EventType::StatusReduction
    } else if demand < actual_capacity {
        EventType::StatusImprovement
    } else {
        EventType::GeneralEvent
    }
}

/// 检测器判定 + 偏差与颜色
pub fn classify_week(demand: f64, actual_capacity: f64, max_capacity: f64) -> WeekClassification {
    let event_type = classify_for_detector(demand, actual_capacity, max_capacity);
    WeekClassification {
        event_type,
        deviation: Deviation::derive(event_type, demand, actual_capacity),
        week_color: WeekColor::from_event(event_type),
    }
}

/// 人工规则带宽判定
///
/// 以实际产能为基准, 允许 ±percentage% 的偏差:
/// - demand > actual × (1 + p/100) → RED / STATUS_REDUCTION
/// - demand < actual × (1 - p/100) → YELLOW / STATUS_IMPROVEMENT
/// - 其余 → GREEN / GENERAL_EVENT
pub fn classify_ruled_band(demand: f64, actual_capacity: f64, percentage: f64) -> (EventType, WeekColor) {
    let band = actual_capacity * percentage / 100.0;
    if demand > actual_capacity + band {
        (EventType::StatusReduction, WeekColor::Red)
    } else if demand < actual_capacity - band {
        (EventType::StatusImprovement, WeekColor::Yellow)
    } else {
        (EventType::GeneralEvent, WeekColor::Green)
    }
}

/// 将分类结果写入周需求值
///
/// # 返回
/// - Some((旧颜色, 新颜色)): 颜色发生变化
/// - None: ruled=true 或颜色未变
pub fn apply_to_value(
    value: &mut DemandSeriesValue,
    event_type: EventType,
) -> Option<(Option<WeekColor>, WeekColor)> {
    let previous = value.apply_classification(event_type)?;
    let current = value.week_color?;
    if previous == Some(current) {
        None
    } else {
        Some((previous, current))
    }
}
