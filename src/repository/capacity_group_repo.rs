// ==========================================
// 供需产能对账系统 - 产能组数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 检测器只通过 save 回写 link_status
// ==========================================

use crate::domain::capacity::{CapacityGroup, CapacityTimeSeries};
use crate::domain::types::EventType;
use crate::repository::error::{
    parse_date_column, parse_enum_column, RepositoryError, RepositoryResult, DATE_FORMAT,
};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// CapacityGroupStore - 产能组存储接口
// ==========================================
pub trait CapacityGroupStore: Send + Sync {
    /// 查询用户拥有的全部产能组 (含周产能)
    fn find_groups_by_user(&self, user_id: &str) -> RepositoryResult<Vec<CapacityGroup>>;

    /// 按ID查询产能组
    fn find_by_id(&self, capacity_group_id: &str) -> RepositoryResult<Option<CapacityGroup>>;

    /// 保存产能组 (记录不存在时返回 NotFound)
    fn save(&self, group: &CapacityGroup) -> RepositoryResult<()>;
}

// ==========================================
// CapacityGroupRepository - 产能组仓储
// ==========================================
pub struct CapacityGroupRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CapacityGroupRepository {
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

    /// 插入或替换产能组及其周产能 (产能组 CRUD 使用)
    pub fn upsert(&self, group: &CapacityGroup) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO capacity_group (
                capacity_group_id, name, user_id, actual_capacity, max_capacity, link_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(capacity_group_id) DO UPDATE SET
                name = ?2, user_id = ?3, actual_capacity = ?4, max_capacity = ?5, link_status = ?6
            "#,
            params![
                group.capacity_group_id,
                group.name,
                group.user_id,
                group.actual_capacity,
                group.max_capacity,
                group.link_status.as_str(),
            ],
        )?;

        tx.execute(
            "DELETE FROM capacity_time_series WHERE capacity_group_id = ?1",
            params![group.capacity_group_id],
        )?;
        for point in &group.capacity_time_series {
            tx.execute(
                r#"
                INSERT INTO capacity_time_series (
                    capacity_group_id, calendar_week, actual_capacity, maximum_capacity
                ) VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    group.capacity_group_id,
                    point.calendar_week.format(DATE_FORMAT).to_string(),
                    point.actual_capacity,
                    point.maximum_capacity,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// 加载周产能序列
    fn load_time_series(
        conn: &Connection,
        capacity_group_id: &str,
    ) -> RepositoryResult<Vec<CapacityTimeSeries>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT calendar_week, actual_capacity, maximum_capacity
            FROM capacity_time_series
            WHERE capacity_group_id = ?1
            ORDER BY calendar_week
            "#,
        )?;

        let points = stmt
            .query_map(params![capacity_group_id], |row| {
                Ok(CapacityTimeSeries {
                    calendar_week: parse_date_column(0, &row.get::<_, String>(0)?)?,
                    actual_capacity: row.get(1)?,
                    maximum_capacity: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(points)
    }

    fn map_group_row(row: &rusqlite::Row<'_>) -> SqliteResult<CapacityGroup> {
        Ok(CapacityGroup {
            capacity_group_id: row.get(0)?,
            name: row.get(1)?,
            user_id: row.get(2)?,
            actual_capacity: row.get(3)?,
            max_capacity: row.get(4)?,
            link_status: parse_enum_column(5, &row.get::<_, String>(5)?, EventType::from_str)?,
            capacity_time_series: Vec::new(),
        })
    }
}

impl CapacityGroupStore for CapacityGroupRepository {
    fn find_groups_by_user(&self, user_id: &str) -> RepositoryResult<Vec<CapacityGroup>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT capacity_group_id, name, user_id, actual_capacity, max_capacity, link_status
            FROM capacity_group
            WHERE user_id = ?1
            ORDER BY capacity_group_id
            "#,
        )?;

        let mut groups = stmt
            .query_map(params![user_id], Self::map_group_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        for group in &mut groups {
            group.capacity_time_series = Self::load_time_series(&conn, &group.capacity_group_id)?;
        }

        Ok(groups)
    }

    fn find_by_id(&self, capacity_group_id: &str) -> RepositoryResult<Option<CapacityGroup>> {
        let conn = self.get_conn()?;
        let group = conn
            .query_row(
                r#"
                SELECT capacity_group_id, name, user_id, actual_capacity, max_capacity, link_status
                FROM capacity_group
                WHERE capacity_group_id = ?1
                "#,
                params![capacity_group_id],
                Self::map_group_row,
            )
            .optional()?;

        match group {
            Some(mut group) => {
                group.capacity_time_series = Self::load_time_series(&conn, capacity_group_id)?;
                Ok(Some(group))
            }
            None => Ok(None),
        }
    }

    fn save(&self, group: &CapacityGroup) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE capacity_group
            SET name = ?2, actual_capacity = ?3, max_capacity = ?4, link_status = ?5
            WHERE capacity_group_id = ?1
            "#,
            params![
                group.capacity_group_id,
                group.name,
                group.actual_capacity,
                group.max_capacity,
                group.link_status.as_str(),
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "CapacityGroup".to_string(),
                id: group.capacity_group_id.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn setup() -> (Arc<Mutex<Connection>>, CapacityGroupRepository) {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO app_user (user_id, username, role) VALUES ('U1', 'supplier', 'SUPPLIER')",
            [],
        )
        .unwrap();
        let conn = Arc::new(Mutex::new(conn));
        (conn.clone(), CapacityGroupRepository::new(conn))
    }

    fn make_group(id: &str) -> CapacityGroup {
        CapacityGroup {
            capacity_group_id: id.to_string(),
            name: format!("group-{}", id),
            user_id: "U1".to_string(),
            actual_capacity: 100.0,
            max_capacity: 120.0,
            link_status: EventType::UnLinked,
            capacity_time_series: vec![CapacityTimeSeries {
                calendar_week: NaiveDate::from_ymd_opt(2026, 11, 16).unwrap(),
                actual_capacity: 90.0,
                maximum_capacity: 110.0,
            }],
        }
    }

    #[test]
    fn test_upsert_and_find_by_user() {
        let (_conn, repo) = setup();
        repo.upsert(&make_group("CG1")).unwrap();
        repo.upsert(&make_group("CG2")).unwrap();

        let groups = repo.find_groups_by_user("U1").unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].capacity_time_series.len(), 1);
        assert!(repo.find_groups_by_user("U2").unwrap().is_empty());
    }

    #[test]
    fn test_save_updates_link_status() {
        let (_conn, repo) = setup();
        let mut group = make_group("CG1");
        repo.upsert(&group).unwrap();

        group.link_status = EventType::StatusReduction;
        repo.save(&group).unwrap();

        let found = repo.find_by_id("CG1").unwrap().unwrap();
        assert_eq!(found.link_status, EventType::StatusReduction);
    }

    #[test]
    fn test_save_missing_group_is_not_found() {
        let (_conn, repo) = setup();
        let err = repo.save(&make_group("GHOST")).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }
}
