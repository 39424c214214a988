// ==========================================
// 供需产能对账系统 - 用户领域模型
// ==========================================
// 来源: 用户目录 (外部协作方), 引擎只读
// ==========================================

use crate::domain::types::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,  // 用户ID
    pub username: String, // 用户名
    pub role: Role,       // 角色
}
