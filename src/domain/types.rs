// ==========================================
// 供需产能对账系统 - 领域类型定义
// ==========================================
// 用途: 角色、事件分类、周颜色、预警规则枚举
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 用户角色 (Role)
// ==========================================
// 封闭集合: 每个角色有自己的待办判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Customer, // 客户: 申报需求
    Supplier, // 供应商: 申报产能
    Admin,    // 管理员
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "CUSTOMER",
            Role::Supplier => "SUPPLIER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CUSTOMER" => Some(Role::Customer),
            "SUPPLIER" => Some(Role::Supplier),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 事件类型 (EventType)
// ==========================================
// 持久化于产能组 link_status、日志、报表周节点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    StatusImprovement, // 状态改善 (产能富余/持平)
    StatusReduction,   // 状态恶化 (瓶颈)
    GeneralEvent,      // 一般事件
    Todo,              // 待办
    UnLinked,          // 未关联
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::StatusImprovement => "STATUS_IMPROVEMENT",
            EventType::StatusReduction => "STATUS_REDUCTION",
            EventType::GeneralEvent => "GENERAL_EVENT",
            EventType::Todo => "TODO",
            EventType::UnLinked => "UN_LINKED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "STATUS_IMPROVEMENT" => Some(EventType::StatusImprovement),
            "STATUS_REDUCTION" => Some(EventType::StatusReduction),
            "GENERAL_EVENT" => Some(EventType::GeneralEvent),
            "TODO" => Some(EventType::Todo),
            "UN_LINKED" => Some(EventType::UnLinked),
            _ => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 周颜色 (WeekColor)
// ==========================================
// 仅当 ruled=false 时由分类器写入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeekColor {
    Red,
    Yellow,
    Green,
    Grey,
}

impl WeekColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeekColor::Red => "RED",
            WeekColor::Yellow => "YELLOW",
            WeekColor::Green => "GREEN",
            WeekColor::Grey => "GREY",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "RED" => Some(WeekColor::Red),
            "YELLOW" => Some(WeekColor::Yellow),
            "GREEN" => Some(WeekColor::Green),
            "GREY" => Some(WeekColor::Grey),
            _ => None,
        }
    }

    /// 事件类型 → 周颜色
    ///
    /// STATUS_REDUCTION→RED, STATUS_IMPROVEMENT→GREEN, 其余→GREY
    pub fn from_event(event: EventType) -> Self {
        match event {
            EventType::StatusReduction => WeekColor::Red,
            EventType::StatusImprovement => WeekColor::Green,
            _ => WeekColor::Grey,
        }
    }
}

impl fmt::Display for WeekColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 偏差 (Deviation) - 派生值, 不落库
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Deviation {
    Bottleneck, // 需求超过产能
    Surplus,    // 产能富余
    Zero,       // 无偏差
}

impl Deviation {
    /// 由分类结果派生偏差
    ///
    /// 瓶颈只来自 STATUS_REDUCTION; 其余按需求与实际产能比较
    pub fn derive(event: EventType, demand: f64, actual_capacity: f64) -> Self {
        match event {
            EventType::StatusReduction => Deviation::Bottleneck,
            _ if demand < actual_capacity => Deviation::Surplus,
            _ => Deviation::Zero,
        }
    }

    /// 偏差 → 状态颜色 (BOTTLENECK→RED, 其余→GREEN)
    pub fn status_color(&self) -> WeekColor {
        match self {
            Deviation::Bottleneck => WeekColor::Red,
            Deviation::Surplus | Deviation::Zero => WeekColor::Green,
        }
    }
}

// ==========================================
// 预警监控对象 (MonitoredObjects)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MonitoredObjects {
    AllDemands,
    AllCapacities,
    AllObjects,
    Dedicated,
}

impl MonitoredObjects {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitoredObjects::AllDemands => "ALL_DEMANDS",
            MonitoredObjects::AllCapacities => "ALL_CAPACITIES",
            MonitoredObjects::AllObjects => "ALL_OBJECTS",
            MonitoredObjects::Dedicated => "DEDICATED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ALL_DEMANDS" => Some(MonitoredObjects::AllDemands),
            "ALL_CAPACITIES" => Some(MonitoredObjects::AllCapacities),
            "ALL_OBJECTS" => Some(MonitoredObjects::AllObjects),
            "DEDICATED" => Some(MonitoredObjects::Dedicated),
            _ => None,
        }
    }
}

impl fmt::Display for MonitoredObjects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 预警阈值类型 (AlertThresholdType)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertThresholdType {
    Relative, // 相对: threshold × oldValue
    Absolute, // 绝对: 直接比较差值
}

impl AlertThresholdType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertThresholdType::Relative => "RELATIVE",
            AlertThresholdType::Absolute => "ABSOLUTE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "RELATIVE" => Some(AlertThresholdType::Relative),
            "ABSOLUTE" => Some(AlertThresholdType::Absolute),
            _ => None,
        }
    }
}

impl fmt::Display for AlertThresholdType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
