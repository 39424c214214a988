// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================
#![allow(dead_code)]

use capacity_demand_planner::domain::alert::AlertRule;
use capacity_demand_planner::domain::capacity::{CapacityGroup, CapacityTimeSeries};
use capacity_demand_planner::domain::demand::{DemandSeries, DemandSeriesValue, MaterialDemand};
use capacity_demand_planner::domain::types::{
    AlertThresholdType, EventType, MonitoredObjects, WeekColor,
};
use chrono::NaiveDate;

// ==========================================
// CapacityGroup 构建器
// ==========================================

pub struct CapacityGroupBuilder {
    capacity_group_id: String,
    user_id: String,
    actual_capacity: f64,
    max_capacity: f64,
    time_series: Vec<CapacityTimeSeries>,
}

impl CapacityGroupBuilder {
    pub fn new(capacity_group_id: &str, user_id: &str) -> Self {
        Self {
            capacity_group_id: capacity_group_id.to_string(),
            user_id: user_id.to_string(),
            actual_capacity: 100.0,
            max_capacity: 120.0,
            time_series: Vec::new(),
        }
    }

    pub fn capacity(mut self, actual: f64, max: f64) -> Self {
        self.actual_capacity = actual;
        self.max_capacity = max;
        self
    }

    pub fn week_capacity(mut self, week: NaiveDate, actual: f64, max: f64) -> Self {
        self.time_series.push(CapacityTimeSeries {
            calendar_week: week,
            actual_capacity: actual,
            maximum_capacity: max,
        });
        self
    }

    pub fn build(self) -> CapacityGroup {
        CapacityGroup {
            name: format!("{}-产能组", self.capacity_group_id),
            capacity_group_id: self.capacity_group_id,
            user_id: self.user_id,
            actual_capacity: self.actual_capacity,
            max_capacity: self.max_capacity,
            link_status: EventType::GeneralEvent,
            capacity_time_series: self.time_series,
        }
    }
}

// ==========================================
// MaterialDemand 构建器 (单序列)
// ==========================================

pub struct DemandBuilder {
    material_demand_id: String,
    customer_id: String,
    supplier_id: Option<String>,
    link_status: EventType,
    values: Vec<DemandSeriesValue>,
}

impl DemandBuilder {
    pub fn new(material_demand_id: &str, customer_id: &str) -> Self {
        Self {
            material_demand_id: material_demand_id.to_string(),
            customer_id: customer_id.to_string(),
            supplier_id: None,
            link_status: EventType::GeneralEvent,
            values: Vec::new(),
        }
    }

    pub fn supplier(mut self, supplier_id: &str) -> Self {
        self.supplier_id = Some(supplier_id.to_string());
        self
    }

    pub fn link_status(mut self, status: EventType) -> Self {
        self.link_status = status;
        self
    }

    fn series_id(&self) -> String {
        format!("{}-S1", self.material_demand_id)
    }

    /// 添加周值, value_id = "<demand_id>-<周序号>"
    pub fn week(mut self, week: NaiveDate, demand: f64) -> Self {
        let value = DemandSeriesValue {
            value_id: format!("{}-{}", self.material_demand_id, self.values.len()),
            demand_series_id: self.series_id(),
            calendar_week: week,
            demand,
            ruled: false,
            week_color: None,
        };
        self.values.push(value);
        self
    }

    /// 添加人工固定颜色的周值
    pub fn ruled_week(mut self, week: NaiveDate, demand: f64, color: WeekColor) -> Self {
        let value = DemandSeriesValue {
            value_id: format!("{}-{}", self.material_demand_id, self.values.len()),
            demand_series_id: self.series_id(),
            calendar_week: week,
            demand,
            ruled: true,
            week_color: Some(color),
        };
        self.values.push(value);
        self
    }

    pub fn build(self) -> MaterialDemand {
        let series = DemandSeries {
            demand_series_id: self.series_id(),
            material_demand_id: self.material_demand_id.clone(),
            customer_location: Some("上海".to_string()),
            demand_category: Some("SERIES".to_string()),
            values: self.values,
        };
        MaterialDemand {
            material_number: format!("MAT-{}", self.material_demand_id),
            material_demand_id: self.material_demand_id,
            description: None,
            customer_id: self.customer_id,
            supplier_id: self.supplier_id,
            link_status: self.link_status,
            demand_series: vec![series],
        }
    }
}

// ==========================================
// AlertRule 构建器
// ==========================================

pub fn alert_rule(
    alert_id: &str,
    user_id: &str,
    monitored_objects: MonitoredObjects,
    threshold_type: AlertThresholdType,
    threshold: f64,
) -> AlertRule {
    AlertRule {
        alert_id: alert_id.to_string(),
        user_id: user_id.to_string(),
        alert_name: format!("{}-预警", alert_id),
        monitored_objects,
        threshold_type,
        threshold,
        description: Some("需求变化预警".to_string()),
        created_at: NaiveDate::from_ymd_opt(2026, 10, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap(),
    }
}
