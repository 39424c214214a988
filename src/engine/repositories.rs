// ==========================================
// 供需产能对账系统 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合引擎所需的全部外部存储接口
// 目标: 减少引擎构造函数参数数量
// ==========================================

use rusqlite::Connection;
use std::sync::{Arc, Mutex};

use crate::domain::demand::MaterialDemand;
use crate::engine::log_sink::LogSink;
use crate::repository::{
    AlertRepository, AlertStore, CapacityGroupRepository, CapacityGroupStore, DemandStore,
    LinkStore, LinkedDemandRepository, LoggingHistoryRepository, MaterialDemandRepository,
    RepositoryResult, StatusCounterStore, StatusCountersRepository, UserDirectory,
    UserRepository,
};

/// 引擎仓储集合
///
/// # 包含的接口
/// - `users`: 用户目录
/// - `capacity_groups`: 产能组
/// - `demands`: 物料需求
/// - `links`: 产能组/需求关联
/// - `status_counters`: 状态计数器
/// - `alerts`: 预警规则与触发记录
/// - `log_sink`: 日志写入
#[derive(Clone)]
pub struct PlanningRepositories {
    pub users: Arc<dyn UserDirectory>,
    pub capacity_groups: Arc<dyn CapacityGroupStore>,
    pub demands: Arc<dyn DemandStore>,
    pub links: Arc<dyn LinkStore>,
    pub status_counters: Arc<dyn StatusCounterStore>,
    pub alerts: Arc<dyn AlertStore>,
    pub log_sink: Arc<dyn LogSink>,
}

impl PlanningRepositories {
    /// 基于共享连接创建 rusqlite 实现
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            users: Arc::new(UserRepository::new(conn.clone())),
            capacity_groups: Arc::new(CapacityGroupRepository::new(conn.clone())),
            demands: Arc::new(MaterialDemandRepository::new(conn.clone())),
            links: Arc::new(LinkedDemandRepository::new(conn.clone())),
            status_counters: Arc::new(StatusCountersRepository::new(conn.clone())),
            alerts: Arc::new(AlertRepository::new(conn.clone())),
            log_sink: Arc::new(LoggingHistoryRepository::new(conn)),
        }
    }

    /// 替换日志写入者
    pub fn with_log_sink(mut self, log_sink: Arc<dyn LogSink>) -> Self {
        self.log_sink = log_sink;
        self
    }

    /// 解析产能组关联的物料需求
    ///
    /// 说明：
    /// - 关联指向已删除的需求时跳过（失效关联容忍）
    /// - 同一需求重复关联只计一次
    pub fn linked_demands(&self, capacity_group_id: &str) -> RepositoryResult<Vec<MaterialDemand>> {
        let links = self.links.find_links_by_capacity_group(capacity_group_id)?;

        let mut demands: Vec<MaterialDemand> = Vec::with_capacity(links.len());
        for link in links {
            if demands
                .iter()
                .any(|d| d.material_demand_id == link.material_demand_id)
            {
                continue;
            }
            match self.demands.find_by_id(&link.material_demand_id)? {
                Some(demand) => demands.push(demand),
                None => {
                    tracing::debug!(
                        capacity_group_id = %capacity_group_id,
                        material_demand_id = %link.material_demand_id,
                        "关联的物料需求不存在, 跳过"
                    );
                }
            }
        }

        Ok(demands)
    }
}
