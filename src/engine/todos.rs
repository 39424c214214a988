// ==========================================
// 供需产能对账系统 - 待办计算引擎
// ==========================================
// 职责: 按角色统计待办数量, 写入用户状态计数器
// 角色判定:
// - CUSTOMER: 自己的需求全部周值为零
// - SUPPLIER: 指向自己且 link_status = UN_LINKED 的需求
// - ADMIN:    全部 link_status = UN_LINKED 的需求
// ==========================================

use crate::domain::demand::MaterialDemand;
use crate::domain::status::StatusCounters;
use crate::domain::types::{EventType, Role};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::repositories::PlanningRepositories;
use crate::repository::{DemandStore, RepositoryResult};
use tracing::info;

// ==========================================
// TodoCalculator - 待办计算引擎
// ==========================================
pub struct TodoCalculator {
    repos: PlanningRepositories,
}

impl TodoCalculator {
    pub fn new(repos: PlanningRepositories) -> Self {
        Self { repos }
    }

    /// 计算用户待办并写入计数器
    ///
    /// # 返回
    /// - Ok(count): 待办数量
    /// - Err(NotFound): 用户不存在
    pub fn calculate_todos(&self, user_id: &str) -> EngineResult<i64> {
        let user = self
            .repos
            .users
            .get_user(user_id)?
            .ok_or_else(|| EngineError::not_found("User", user_id))?;

        let todos = collect_todos(user.role, user_id, self.repos.demands.as_ref())?;
        let todos_count = todos.len() as i64;

        let mut counters = self
            .repos
            .status_counters
            .find_by_user(user_id)?
            .unwrap_or_else(|| StatusCounters::empty(user_id));
        counters.todos_count = todos_count;
        counters.updated_at = chrono::Utc::now().naive_utc();
        self.repos.status_counters.save(&counters)?;

        info!(
            user_id = %user_id,
            role = %user.role,
            todos_count,
            "待办统计完成"
        );

        Ok(todos_count)
    }
}

/// 按角色收集待办需求
pub fn collect_todos(
    role: Role,
    user_id: &str,
    demands: &dyn DemandStore,
) -> RepositoryResult<Vec<MaterialDemand>> {
    let todos = match role {
        Role::Customer => demands
            .find_by_customer(user_id)?
            .into_iter()
            .filter(|d| d.is_all_zero())
            .collect(),
        Role::Supplier => demands
            .find_by_supplier(user_id)?
            .into_iter()
            .filter(|d| d.link_status == EventType::UnLinked)
            .collect(),
        Role::Admin => demands.find_by_link_status(EventType::UnLinked)?,
    };
    Ok(todos)
}
