// ==========================================
// 供需产能对账系统 - 需求聚合器
// ==========================================
// 职责: 产能组关联需求 → 周需求合计 (calendar_week → demand)
// 红线: 交付提前期缓冲内的周 (today + N 周之前) 不参与计算
// 说明: 纯读, 无副作用
// ==========================================

use crate::domain::demand::MaterialDemand;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;

/// 默认交付提前期缓冲（周）
pub const DEFAULT_LEAD_TIME_BUFFER_WEEKS: i64 = 2;

// ==========================================
// AggregatedWeek - 单周聚合结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregatedWeek {
    pub demand: f64,
    pub demand_series_ids: Vec<String>, // 贡献该周需求的序列
}

/// 计算提前期截止日
///
/// 早于截止日的周被排除, 恰好等于截止日的周保留
pub fn lead_time_cutoff(today: NaiveDate, buffer_weeks: i64) -> NaiveDate {
    today + Duration::weeks(buffer_weeks)
}

/// 聚合周需求并保留来源序列
///
/// # 参数
/// - `demands`: 产能组关联的物料需求 (已填充序列与周值)
/// - `cutoff`: 提前期截止日
///
/// # 返回
/// 按周升序的聚合结果
pub fn aggregate_with_sources(
    demands: &[MaterialDemand],
    cutoff: NaiveDate,
) -> BTreeMap<NaiveDate, AggregatedWeek> {
    let mut weeks: BTreeMap<NaiveDate, AggregatedWeek> = BTreeMap::new();

    for series in demands.iter().flat_map(|d| d.demand_series.iter()) {
        for value in series.values.iter().filter(|v| v.calendar_week >= cutoff) {
            let entry = weeks.entry(value.calendar_week).or_default();
            entry.demand += value.demand;
            if !entry.demand_series_ids.contains(&series.demand_series_id) {
                entry.demand_series_ids.push(series.demand_series_id.clone());
            }
        }
    }

    weeks
}

/// 聚合周需求 (calendar_week → 需求合计)
pub fn aggregate(demands: &[MaterialDemand], cutoff: NaiveDate) -> BTreeMap<NaiveDate, f64> {
    aggregate_with_sources(demands, cutoff)
        .into_iter()
        .map(|(week, agg)| (week, agg.demand))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::demand::{DemandSeries, DemandSeriesValue};
    use crate::domain::types::EventType;

    fn monday(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, m, d).unwrap()
    }

    fn series(id: &str, values: &[(NaiveDate, f64)]) -> DemandSeries {
        DemandSeries {
            demand_series_id: id.to_string(),
            material_demand_id: "MD1".to_string(),
            customer_location: None,
            demand_category: None,
            values: values
                .iter()
                .enumerate()
                .map(|(i, (week, demand))| DemandSeriesValue {
                    value_id: format!("{}-{}", id, i),
                    demand_series_id: id.to_string(),
                    calendar_week: *week,
                    demand: *demand,
                    ruled: false,
                    week_color: None,
                })
                .collect(),
        }
    }

    fn demand(series_list: Vec<DemandSeries>) -> MaterialDemand {
        MaterialDemand {
            material_demand_id: "MD1".to_string(),
            material_number: "MAT-001".to_string(),
            description: None,
            customer_id: "C1".to_string(),
            supplier_id: None,
            link_status: EventType::GeneralEvent,
            demand_series: series_list,
        }
    }

    #[test]
    fn test_cutoff_boundary_is_inclusive() {
        // 2026-10-19 为周一, 截止日 2026-11-02
        let today = monday(10, 19);
        let cutoff = lead_time_cutoff(today, DEFAULT_LEAD_TIME_BUFFER_WEEKS);
        assert_eq!(cutoff, monday(11, 2));

        let d = demand(vec![series(
            "S1",
            &[(monday(10, 26), 5.0), (monday(11, 2), 7.0), (monday(11, 9), 9.0)],
        )]);
        let weeks = aggregate(&[d], cutoff);

        assert!(!weeks.contains_key(&monday(10, 26)));
        assert_eq!(weeks.get(&monday(11, 2)), Some(&7.0));
        assert_eq!(weeks.get(&monday(11, 9)), Some(&9.0));
    }

    #[test]
    fn test_sums_across_series_and_demands() {
        let cutoff = monday(11, 2);
        let d1 = demand(vec![
            series("S1", &[(monday(11, 9), 10.0)]),
            series("S2", &[(monday(11, 9), 15.0), (monday(11, 16), 1.0)]),
        ]);
        let d2 = demand(vec![series("S3", &[(monday(11, 9), 5.0)])]);

        let weeks = aggregate_with_sources(&[d1, d2], cutoff);
        let week = weeks.get(&monday(11, 9)).unwrap();
        assert_eq!(week.demand, 30.0);
        assert_eq!(week.demand_series_ids, vec!["S1", "S2", "S3"]);
        assert_eq!(weeks.get(&monday(11, 16)).unwrap().demand, 1.0);
    }

    #[test]
    fn test_empty_input_yields_empty_map() {
        assert!(aggregate(&[], monday(11, 2)).is_empty());
    }
}
