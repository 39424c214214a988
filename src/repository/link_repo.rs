// ==========================================
// 供需产能对账系统 - 产能组/需求关联仓储
// ==========================================
// 说明: 关联记录不随需求删除, 检测器负责跳过失效引用
// ==========================================

use crate::domain::demand::LinkedDemand;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// LinkStore - 关联存储接口
// ==========================================
pub trait LinkStore: Send + Sync {
    /// 查询产能组的全部关联 (仅 linked=1)
    fn find_links_by_capacity_group(&self, capacity_group_id: &str) -> RepositoryResult<Vec<LinkedDemand>>;
}

// ==========================================
// LinkedDemandRepository - 关联仓储
// ==========================================
pub struct LinkedDemandRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LinkedDemandRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新建关联
    pub fn insert(&self, link: &LinkedDemand) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO linked_capacity_group_material_demand (
                link_id, capacity_group_id, material_demand_id, linked
            ) VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                link.link_id,
                link.capacity_group_id,
                link.material_demand_id,
                link.linked,
            ],
        )?;
        Ok(())
    }

    /// 修改 linked 标志 (关联唯一可变字段)
    pub fn set_linked(&self, link_id: &str, linked: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE linked_capacity_group_material_demand SET linked = ?2 WHERE link_id = ?1",
            params![link_id, linked],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "LinkedDemand".to_string(),
                id: link_id.to_string(),
            });
        }
        Ok(())
    }
}

impl LinkStore for LinkedDemandRepository {
    fn find_links_by_capacity_group(&self, capacity_group_id: &str) -> RepositoryResult<Vec<LinkedDemand>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT link_id, capacity_group_id, material_demand_id, linked
            FROM linked_capacity_group_material_demand
            WHERE capacity_group_id = ?1 AND linked = 1
            ORDER BY link_id
            "#,
        )?;

        let links = stmt
            .query_map(params![capacity_group_id], |row| {
                Ok(LinkedDemand {
                    link_id: row.get(0)?,
                    capacity_group_id: row.get(1)?,
                    material_demand_id: row.get(2)?,
                    linked: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(links)
    }
}
