// ==========================================
// 供需产能对账系统 - 引擎层错误类型
// ==========================================
// 分类:
// - NotFound: 用户/产能组缺失, 调用直接失败
// - 失效关联: 跳过, 不构成错误
// - 日志写入失败: 吞掉, 只记 warn
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("计算量超限: user_id={user_id}, evaluations={evaluations}, limit={limit}")]
    IterationLimitExceeded {
        user_id: String,
        evaluations: usize,
        limit: usize,
    },

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("配置读取失败: {0}")]
    Config(String),

    #[error("报表导出失败: {0:#}")]
    Export(#[source] anyhow::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        EngineError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
