// ==========================================
// 供需产能对账系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::planner_config_trait::{
    AlertRuleScope, ConfigResult, PlannerConfig, PlannerConfigReader,
};
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照
    pub fn get_config_snapshot(&self) -> ConfigResult<HashMap<String, String>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(config_map)
    }

    /// 读取全部引擎配置为固定快照
    pub async fn load_planner_config(&self) -> ConfigResult<PlannerConfig> {
        Ok(PlannerConfig {
            lead_time_buffer_weeks: self.get_lead_time_buffer_weeks().await?,
            alert_rule_scope: self.get_alert_rule_scope().await?,
            max_evaluations_per_user: self.get_max_evaluations_per_user().await?,
            max_report_weeks: self.get_max_report_weeks().await?,
            default_ruled_percentage: self.get_default_ruled_percentage().await?,
        })
    }
}

#[async_trait]
impl PlannerConfigReader for ConfigManager {
    async fn get_lead_time_buffer_weeks(&self) -> ConfigResult<i64> {
        let value = self.get_config_or_default(config_keys::LEAD_TIME_BUFFER_WEEKS, "2")?;
        Ok(value.trim().parse::<i64>().ok().filter(|w| *w >= 0).unwrap_or(2))
    }

    async fn get_alert_rule_scope(&self) -> ConfigResult<AlertRuleScope> {
        let value = self.get_config_or_default(config_keys::ALERT_RULE_SCOPE, "ALL")?;
        Ok(AlertRuleScope::from_str(&value).unwrap_or(AlertRuleScope::All)) // 默认 ALL
    }

    async fn get_max_evaluations_per_user(&self) -> ConfigResult<usize> {
        let value = self.get_config_or_default(config_keys::MAX_EVALUATIONS_PER_USER, "100000")?;
        Ok(value.trim().parse::<usize>().ok().filter(|v| *v > 0).unwrap_or(100_000))
    }

    async fn get_max_report_weeks(&self) -> ConfigResult<usize> {
        let value = self.get_config_or_default(config_keys::MAX_REPORT_WEEKS, "520")?;
        Ok(value.trim().parse::<usize>().ok().filter(|v| *v > 0).unwrap_or(520))
    }

    async fn get_default_ruled_percentage(&self) -> ConfigResult<f64> {
        let value = self.get_config_or_default(config_keys::DEFAULT_RULED_PERCENTAGE, "10")?;
        Ok(value
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p >= 0.0)
            .unwrap_or(10.0))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 需求聚合
    pub const LEAD_TIME_BUFFER_WEEKS: &str = "lead_time_buffer_weeks";

    // 预警
    pub const ALERT_RULE_SCOPE: &str = "alert_rule_scope";

    // 计算上限
    pub const MAX_EVALUATIONS_PER_USER: &str = "max_evaluations_per_user";
    pub const MAX_REPORT_WEEKS: &str = "max_report_weeks";

    // 报表
    pub const DEFAULT_RULED_PERCENTAGE: &str = "default_ruled_percentage";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn test_defaults_without_rows() {
        let manager = setup();
        let config = manager.load_planner_config().await.unwrap();
        assert_eq!(config, PlannerConfig::default());
    }

    #[tokio::test]
    async fn test_overrides_and_invalid_values() {
        let manager = setup();
        manager.set_global_config_value(config_keys::ALERT_RULE_SCOPE, "owner").unwrap();
        manager.set_global_config_value(config_keys::LEAD_TIME_BUFFER_WEEKS, "3").unwrap();
        manager.set_global_config_value(config_keys::MAX_REPORT_WEEKS, "abc").unwrap();

        assert_eq!(manager.get_alert_rule_scope().await.unwrap(), AlertRuleScope::Owner);
        assert_eq!(manager.get_lead_time_buffer_weeks().await.unwrap(), 3);
        assert_eq!(manager.get_max_report_weeks().await.unwrap(), 520);
        assert_eq!(manager.get_config_snapshot().unwrap().len(), 3);
    }
}
