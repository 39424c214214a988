// ==========================================
// 供需产能对账系统 - 预警规则/触发记录仓储
// ==========================================
// 红线: 触发记录只追加, 不更新不去重
// ==========================================

use crate::domain::alert::{AlertRule, TriggeredAlert};
use crate::domain::types::{AlertThresholdType, MonitoredObjects};
use crate::repository::error::{
    parse_datetime_column, parse_enum_column, RepositoryError, RepositoryResult, DATETIME_FORMAT,
};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// AlertStore - 预警存储接口
// ==========================================
pub trait AlertStore: Send + Sync {
    /// 查询全部预警规则
    fn find_all_rules(&self) -> RepositoryResult<Vec<AlertRule>>;

    /// 查询用户的预警规则
    fn find_rules_by_user(&self, user_id: &str) -> RepositoryResult<Vec<AlertRule>>;

    /// 追加触发记录
    fn save_triggered(&self, alert: &TriggeredAlert) -> RepositoryResult<()>;

    /// 查询用户收到的触发记录 (新→旧)
    fn find_triggered_by_user(&self, user_id: &str) -> RepositoryResult<Vec<TriggeredAlert>>;
}

// ==========================================
// AlertRepository - 预警仓储
// ==========================================
pub struct AlertRepository {
    conn: Arc<Mutex<Connection>>,
}

const RULE_COLUMNS: &str = r#"
    SELECT alert_id, user_id, alert_name, monitored_objects, threshold_type,
           threshold, description, created_at
    FROM alert_rule
"#;

impl AlertRepository {
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

    /// 新建预警规则
    pub fn insert_rule(&self, rule: &AlertRule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO alert_rule (
                alert_id, user_id, alert_name, monitored_objects, threshold_type,
                threshold, description, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                rule.alert_id,
                rule.user_id,
                rule.alert_name,
                rule.monitored_objects.as_str(),
                rule.threshold_type.as_str(),
                rule.threshold,
                rule.description,
                rule.created_at.format(DATETIME_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    fn map_rule_row(row: &rusqlite::Row<'_>) -> SqliteResult<AlertRule> {
        Ok(AlertRule {
            alert_id: row.get(0)?,
            user_id: row.get(1)?,
            alert_name: row.get(2)?,
            monitored_objects: parse_enum_column(
                3,
                &row.get::<_, String>(3)?,
                MonitoredObjects::from_str,
            )?,
            threshold_type: parse_enum_column(
                4,
                &row.get::<_, String>(4)?,
                AlertThresholdType::from_str,
            )?,
            threshold: row.get(5)?,
            description: row.get(6)?,
            created_at: parse_datetime_column(7, &row.get::<_, String>(7)?)?,
        })
    }

    fn query_rules(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> RepositoryResult<Vec<AlertRule>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(sql)?;
        let rules = stmt
            .query_map(args, Self::map_rule_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rules)
    }
}

impl AlertStore for AlertRepository {
    fn find_all_rules(&self) -> RepositoryResult<Vec<AlertRule>> {
        let sql = format!("{} ORDER BY created_at, alert_id", RULE_COLUMNS);
        self.query_rules(&sql, &[])
    }

    fn find_rules_by_user(&self, user_id: &str) -> RepositoryResult<Vec<AlertRule>> {
        let sql = format!("{} WHERE user_id = ?1 ORDER BY created_at, alert_id", RULE_COLUMNS);
        self.query_rules(&sql, &[&user_id])
    }

    fn save_triggered(&self, alert: &TriggeredAlert) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO triggered_alert (
                triggered_alert_id, alert_id, user_id, triggered_by, alert_name,
                monitored_objects, threshold_type, threshold, description,
                old_value, new_value, delta, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
            params![
                alert.triggered_alert_id,
                alert.alert_id,
                alert.user_id,
                alert.triggered_by,
                alert.alert_name,
                alert.monitored_objects.as_str(),
                alert.threshold_type.as_str(),
                alert.threshold,
                alert.description,
                alert.old_value,
                alert.new_value,
                alert.delta,
                alert.created_at.format(DATETIME_FORMAT).to_string(),
            ],
        )?;
        Ok(())
    }

    fn find_triggered_by_user(&self, user_id: &str) -> RepositoryResult<Vec<TriggeredAlert>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT triggered_alert_id, alert_id, user_id, triggered_by, alert_name,
                   monitored_objects, threshold_type, threshold, description,
                   old_value, new_value, delta, created_at
            FROM triggered_alert
            WHERE user_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )?;

        let alerts = stmt
            .query_map(params![user_id], |row| {
                Ok(TriggeredAlert {
                    triggered_alert_id: row.get(0)?,
                    alert_id: row.get(1)?,
                    user_id: row.get(2)?,
                    triggered_by: row.get(3)?,
                    alert_name: row.get(4)?,
                    monitored_objects: parse_enum_column(
                        5,
                        &row.get::<_, String>(5)?,
                        MonitoredObjects::from_str,
                    )?,
                    threshold_type: parse_enum_column(
                        6,
                        &row.get::<_, String>(6)?,
                        AlertThresholdType::from_str,
                    )?,
                    threshold: row.get(7)?,
                    description: row.get(8)?,
                    old_value: row.get(9)?,
                    new_value: row.get(10)?,
                    delta: row.get(11)?,
                    created_at: parse_datetime_column(12, &row.get::<_, String>(12)?)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(alerts)
    }
}
