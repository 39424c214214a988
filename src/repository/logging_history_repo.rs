// ==========================================
// 供需产能对账系统 - 日志历史仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use crate::domain::logging_history::LoggingHistory;
use crate::domain::types::EventType;
use crate::repository::error::{
    parse_date_column, parse_datetime_column, parse_enum_column, RepositoryError,
    RepositoryResult, DATETIME_FORMAT, DATE_FORMAT,
};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// LoggingHistoryRepository - 日志历史仓储
// ==========================================
pub struct LoggingHistoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl LoggingHistoryRepository {
    /// 创建新的日志历史仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入日志条目
    pub fn insert(&self, entry: &LoggingHistory) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO logging_history (
                log_id, user_id, event_type, capacity_group_id, material_demand_id,
                calendar_week, description, logged_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                entry.log_id,
                entry.user_id,
                entry.event_type.as_str(),
                entry.capacity_group_id,
                entry.material_demand_id,
                entry.calendar_week.map(|d| d.format(DATE_FORMAT).to_string()),
                entry.description,
                entry.logged_at.format(DATETIME_FORMAT).to_string(),
            ],
        )?;
        Ok(entry.log_id.clone())
    }

    /// 查询用户最近的日志
    pub fn find_by_user(&self, user_id: &str, limit: usize) -> RepositoryResult<Vec<LoggingHistory>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT log_id, user_id, event_type, capacity_group_id, material_demand_id,
                   calendar_week, description, logged_at
            FROM logging_history
            WHERE user_id = ?1
            ORDER BY logged_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )?;

        let entries = stmt
            .query_map(params![user_id, limit as i64], |row| {
                let week: Option<String> = row.get(5)?;
                Ok(LoggingHistory {
                    log_id: row.get(0)?,
                    user_id: row.get(1)?,
                    event_type: parse_enum_column(2, &row.get::<_, String>(2)?, EventType::from_str)?,
                    capacity_group_id: row.get(3)?,
                    material_demand_id: row.get(4)?,
                    calendar_week: match week {
                        Some(raw) => Some(parse_date_column(5, &raw)?),
                        None => None,
                    },
                    description: row.get(6)?,
                    logged_at: parse_datetime_column(7, &row.get::<_, String>(7)?)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(entries)
    }

    /// 统计用户日志条数
    pub fn count_by_user(&self, user_id: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM logging_history WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_find_by_user() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        let repo = LoggingHistoryRepository::new(Arc::new(Mutex::new(conn)));

        let entry = LoggingHistory::new(
            "U1",
            EventType::StatusReduction,
            Some("CG1"),
            Some("产能组 CG1 出现 1 周瓶颈".to_string()),
        )
        .unwrap()
        .with_calendar_week(chrono::NaiveDate::from_ymd_opt(2026, 11, 16).unwrap());
        repo.insert(&entry).unwrap();

        let found = repo.find_by_user("U1", 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].event_type, EventType::StatusReduction);
        assert!(found[0].calendar_week.is_some());
        assert_eq!(repo.count_by_user("U1").unwrap(), 1);
        assert_eq!(repo.count_by_user("U2").unwrap(), 0);
    }
}
