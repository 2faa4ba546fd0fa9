//! # 测量记录实体定义
//!
//! 每条记录归属于一个账户分区（`account_id`），`payload` 保存调用方提交的
//! 完整文档（已合并服务端计算的 `valid` 字段）。

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 测量记录实体
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "measurements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// 分区键：已验证身份的唯一ID
    pub account_id: String,
    pub reading: f64,
    pub valid: bool,
    /// 合并后的完整文档
    pub payload: Json,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
