// ==========================================
// 供需产能对账系统 - 状态计数器仓储
// ==========================================
// 红线: 整行覆盖写入, 不做增量更新
// ==========================================

use crate::domain::status::StatusCounters;
use crate::repository::error::{
    parse_datetime_column, RepositoryError, RepositoryResult, DATETIME_FORMAT,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// StatusCounterStore - 计数器存储接口
// ==========================================
pub trait StatusCounterStore: Send + Sync {
    /// 查询用户计数器
    fn find_by_user(&self, user_id: &str) -> RepositoryResult<Option<StatusCounters>>;

    /// 保存计数器 (不存在则创建)
    fn save(&self, counters: &StatusCounters) -> RepositoryResult<()>;
}

// ==========================================
// StatusCountersRepository - 计数器仓储
// ==========================================
pub struct StatusCountersRepository {
    conn: Arc<Mutex<Connection>>,
}

impl StatusCountersRepository {
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
}

impl StatusCounterStore for StatusCountersRepository {
    fn find_by_user(&self, user_id: &str) -> RepositoryResult<Option<StatusCounters>> {
        let conn = self.get_conn()?;
        let counters = conn
            .query_row(
                r#"
                SELECT user_id, status_improvement_count, status_degradation_count,
                       todos_count, updated_at
                FROM status_counters
                WHERE user_id = ?1
                "#,
                params![user_id],
                |row| {
                    Ok(StatusCounters {
                        user_id: row.get(0)?,
                        status_improvement_count: row.get(1)?,
                        status_degradation_count: row.get(2)?,
                        todos_count: row.get(3)?,
                        updated_at: parse_datetime_column(4, &row.get::<_, String>(4)?)?,
                    })
                },
            )
            .optional()?;
        Ok(counters)
    }

    fn save(&self, counters: &StatusCounters) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO status_counters (
                user_id, status_improvement_count, status_degradation_count, todos_count, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id) DO UPDATE SET
                status_improvement_count = ?2,
                status_degradation_count = ?3,
                todos_count = ?4,
                updated_at = ?5
            "#,
            params![
                counters.user_id,
                counters.status_improvement_count,
                counters.status_degradation_count,
                counters.todos_count,
                counters.updated_at.format(DATETIME_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }
}
