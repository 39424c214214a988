// ==========================================
// 供需产能对账系统 - 需求领域模型
// ==========================================
// 用途: 客户按周申报的物料需求预测
// 约束: calendar_week 均为周一, 同一序列内连续 (上游校验)
// ==========================================

use crate::domain::types::{EventType, WeekColor};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// MaterialDemand - 物料需求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDemand {
    pub material_demand_id: String,
    pub material_number: String,
    pub description: Option<String>,
    pub customer_id: String,          // 需求方 (客户)
    pub supplier_id: Option<String>,  // 供给方 (供应商)
    pub link_status: EventType,       // 关联状态
    pub demand_series: Vec<DemandSeries>,
}

impl MaterialDemand {
    /// 全部周需求是否为零 (无值也视为零)
    pub fn is_all_zero(&self) -> bool {
        self.demand_series
            .iter()
            .flat_map(|series| series.values.iter())
            .all(|value| value.demand == 0.0)
    }
}

// ==========================================
// DemandSeries - 需求序列
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSeries {
    pub demand_series_id: String,
    pub material_demand_id: String,
    pub customer_location: Option<String>,
    pub demand_category: Option<String>,
    pub values: Vec<DemandSeriesValue>,
}

// ==========================================
// DemandSeriesValue - 周需求值
// ==========================================
// 红线: ruled=true 时 week_color 由人工规则固定, 分类器不得覆盖
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemandSeriesValue {
    pub value_id: String,
    pub demand_series_id: String,
    pub calendar_week: NaiveDate,
    pub demand: f64,
    pub ruled: bool,
    pub week_color: Option<WeekColor>,
}

impl DemandSeriesValue {
    /// 应用分类结果
    ///
    /// # 返回
    /// - Some(旧颜色): 颜色已写入 (ruled=false)
    /// - None: ruled=true, 颜色保持不变
    pub fn apply_classification(&mut self, event: EventType) -> Option<Option<WeekColor>> {
        if self.ruled {
            return None;
        }
        let previous = self.week_color;
        self.week_color = Some(WeekColor::from_event(event));
        Some(previous)
    }
}

// ==========================================
// LinkedDemand - 产能组 ↔ 物料需求关联
// ==========================================
// 创建后不可变 (linked 标志除外)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedDemand {
    pub link_id: String,
    pub capacity_group_id: String,
    pub material_demand_id: String,
    pub linked: bool,
}
