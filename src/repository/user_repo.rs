// ==========================================
// 供需产能对账系统 - 用户目录仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::types::Role;
use crate::domain::user::User;
use crate::repository::error::{parse_enum_column, RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// UserDirectory - 用户目录接口
// ==========================================
pub trait UserDirectory: Send + Sync {
    /// 按ID查询用户
    fn get_user(&self, user_id: &str) -> RepositoryResult<Option<User>>;
}

// ==========================================
// UserRepository - 用户仓储 (rusqlite)
// ==========================================
pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
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

    /// 插入或更新用户
    pub fn upsert(&self, user: &User) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO app_user (user_id, username, role) VALUES (?1, ?2, ?3)
            ON CONFLICT(user_id) DO UPDATE SET username = ?2, role = ?3
            "#,
            params![user.user_id, user.username, user.role.as_str()],
        )?;
        Ok(())
    }
}

impl UserDirectory for UserRepository {
    fn get_user(&self, user_id: &str) -> RepositoryResult<Option<User>> {
        let conn = self.get_conn()?;
        let user = conn
            .query_row(
                "SELECT user_id, username, role FROM app_user WHERE user_id = ?1",
                params![user_id],
                |row| {
                    Ok(User {
                        user_id: row.get(0)?,
                        username: row.get(1)?,
                        role: parse_enum_column(2, &row.get::<_, String>(2)?, Role::from_str)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }
}
