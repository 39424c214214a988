// ==========================================
// 供需产能对账系统 - 物料需求数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 说明: 查询结果已填充 DemandSeries / DemandSeriesValue
// ==========================================

use crate::domain::demand::{DemandSeries, DemandSeriesValue, MaterialDemand};
use crate::domain::types::{EventType, WeekColor};
use crate::repository::error::{
    parse_date_column, parse_enum_column, RepositoryError, RepositoryResult, DATE_FORMAT,
};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

// ==========================================
// DemandStore - 需求存储接口
// ==========================================
pub trait DemandStore: Send + Sync {
    /// 按ID查询物料需求
    fn find_by_id(&self, material_demand_id: &str) -> RepositoryResult<Option<MaterialDemand>>;

    /// 查询客户拥有的物料需求
    fn find_by_customer(&self, customer_id: &str) -> RepositoryResult<Vec<MaterialDemand>>;

    /// 查询指向供应商的物料需求
    fn find_by_supplier(&self, supplier_id: &str) -> RepositoryResult<Vec<MaterialDemand>>;

    /// 按关联状态查询物料需求
    fn find_by_link_status(&self, link_status: EventType) -> RepositoryResult<Vec<MaterialDemand>>;

    /// 批量回写周颜色 (ruled=1 的行不会被更新)
    fn save_week_colors(&self, values: &[DemandSeriesValue]) -> RepositoryResult<usize>;

    /// 更新单个周需求值
    ///
    /// # 返回
    /// - Ok(Some(old)): 更新前的需求值
    /// - Ok(None): 记录不存在
    fn update_value_demand(&self, value_id: &str, demand: f64) -> RepositoryResult<Option<f64>>;
}

// ==========================================
// MaterialDemandRepository - 物料需求仓储
// ==========================================
pub struct MaterialDemandRepository {
    conn: Arc<Mutex<Connection>>,
}

const DEMAND_COLUMNS: &str = r#"
    SELECT material_demand_id, material_number, description, customer_id, supplier_id, link_status
    FROM material_demand
"#;

impl MaterialDemandRepository {
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

    /// 插入或替换物料需求 (含序列与周值, 需求 CRUD 使用)
    pub fn upsert(&self, demand: &MaterialDemand) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO material_demand (
                material_demand_id, material_number, description, customer_id, supplier_id, link_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(material_demand_id) DO UPDATE SET
                material_number = ?2, description = ?3, customer_id = ?4,
                supplier_id = ?5, link_status = ?6
            "#,
            params![
                demand.material_demand_id,
                demand.material_number,
                demand.description,
                demand.customer_id,
                demand.supplier_id,
                demand.link_status.as_str(),
            ],
        )?;

        // 序列整体替换 (周值随外键级联删除)
        tx.execute(
            "DELETE FROM demand_series WHERE material_demand_id = ?1",
            params![demand.material_demand_id],
        )?;

        for series in &demand.demand_series {
            tx.execute(
                r#"
                INSERT INTO demand_series (
                    demand_series_id, material_demand_id, customer_location, demand_category
                ) VALUES (?1, ?2, ?3, ?4)
                "#,
                params![
                    series.demand_series_id,
                    demand.material_demand_id,
                    series.customer_location,
                    series.demand_category,
                ],
            )?;

            for value in &series.values {
                tx.execute(
                    r#"
                    INSERT INTO demand_series_value (
                        value_id, demand_series_id, calendar_week, demand, ruled, week_color
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    "#,
                    params![
                        value.value_id,
                        series.demand_series_id,
                        value.calendar_week.format(DATE_FORMAT).to_string(),
                        value.demand,
                        value.ruled,
                        value.week_color.map(|c| c.as_str()),
                    ],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// 删除物料需求 (关联记录保留)
    pub fn delete(&self, material_demand_id: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let rows = conn.execute(
            "DELETE FROM material_demand WHERE material_demand_id = ?1",
            params![material_demand_id],
        )?;
        Ok(rows)
    }

    fn map_demand_row(row: &rusqlite::Row<'_>) -> SqliteResult<MaterialDemand> {
        Ok(MaterialDemand {
            material_demand_id: row.get(0)?,
            material_number: row.get(1)?,
            description: row.get(2)?,
            customer_id: row.get(3)?,
            supplier_id: row.get(4)?,
            link_status: parse_enum_column(5, &row.get::<_, String>(5)?, EventType::from_str)?,
            demand_series: Vec::new(),
        })
    }

    /// 填充需求序列与周值
    fn load_series(conn: &Connection, demand: &mut MaterialDemand) -> RepositoryResult<()> {
        let mut series_stmt = conn.prepare(
            r#"
            SELECT demand_series_id, material_demand_id, customer_location, demand_category
            FROM demand_series
            WHERE material_demand_id = ?1
            ORDER BY demand_series_id
            "#,
        )?;
        let mut series_list = series_stmt
            .query_map(params![demand.material_demand_id], |row| {
                Ok(DemandSeries {
                    demand_series_id: row.get(0)?,
                    material_demand_id: row.get(1)?,
                    customer_location: row.get(2)?,
                    demand_category: row.get(3)?,
                    values: Vec::new(),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut value_stmt = conn.prepare(
            r#"
            SELECT value_id, demand_series_id, calendar_week, demand, ruled, week_color
            FROM demand_series_value
            WHERE demand_series_id = ?1
            ORDER BY calendar_week
            "#,
        )?;
        for series in &mut series_list {
            series.values = value_stmt
                .query_map(params![series.demand_series_id], |row| {
                    let color: Option<String> = row.get(5)?;
                    Ok(DemandSeriesValue {
                        value_id: row.get(0)?,
                        demand_series_id: row.get(1)?,
                        calendar_week: parse_date_column(2, &row.get::<_, String>(2)?)?,
                        demand: row.get(3)?,
                        ruled: row.get(4)?,
                        week_color: match color {
                            Some(raw) => Some(parse_enum_column(5, &raw, WeekColor::from_str)?),
                            None => None,
                        },
                    })
                })?
                .collect::<SqliteResult<Vec<_>>>()?;
        }

        demand.demand_series = series_list;
        Ok(())
    }

    /// 按条件查询并填充
    fn query_demands(
        &self,
        where_clause: &str,
        param: &str,
    ) -> RepositoryResult<Vec<MaterialDemand>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE {} ORDER BY material_demand_id", DEMAND_COLUMNS, where_clause);
        let mut stmt = conn.prepare(&sql)?;
        let mut demands = stmt
            .query_map(params![param], Self::map_demand_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        for demand in &mut demands {
            Self::load_series(&conn, demand)?;
        }
        Ok(demands)
    }
}

impl DemandStore for MaterialDemandRepository {
    fn find_by_id(&self, material_demand_id: &str) -> RepositoryResult<Option<MaterialDemand>> {
        let conn = self.get_conn()?;
        let sql = format!("{} WHERE material_demand_id = ?1", DEMAND_COLUMNS);
        let demand = conn
            .query_row(&sql, params![material_demand_id], Self::map_demand_row)
            .optional()?;

        match demand {
            Some(mut demand) => {
                Self::load_series(&conn, &mut demand)?;
                Ok(Some(demand))
            }
            None => Ok(None),
        }
    }

    fn find_by_customer(&self, customer_id: &str) -> RepositoryResult<Vec<MaterialDemand>> {
        self.query_demands("customer_id = ?1", customer_id)
    }

    fn find_by_supplier(&self, supplier_id: &str) -> RepositoryResult<Vec<MaterialDemand>> {
        self.query_demands("supplier_id = ?1", supplier_id)
    }

    fn find_by_link_status(&self, link_status: EventType) -> RepositoryResult<Vec<MaterialDemand>> {
        self.query_demands("link_status = ?1", link_status.as_str())
    }

    fn save_week_colors(&self, values: &[DemandSeriesValue]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut updated = 0;
        for value in values.iter().filter(|v| !v.ruled) {
            updated += tx.execute(
                "UPDATE demand_series_value SET week_color = ?2 WHERE value_id = ?1 AND ruled = 0",
                params![value.value_id, value.week_color.map(|c| c.as_str())],
            )?;
        }

        tx.commit()?;
        Ok(updated)
    }

    fn update_value_demand(&self, value_id: &str, demand: f64) -> RepositoryResult<Option<f64>> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let old: Option<f64> = tx
            .query_row(
                "SELECT demand FROM demand_series_value WHERE value_id = ?1",
                params![value_id],
                |row| row.get(0),
            )
            .optional()?;

        if old.is_some() {
            tx.execute(
                "UPDATE demand_series_value SET demand = ?2 WHERE value_id = ?1",
                params![value_id, demand],
            )?;
        }

        tx.commit()?;
        Ok(old)
    }
}
