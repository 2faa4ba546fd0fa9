//! # 分区数据访问
//!
//! 所有读写都以 `PartitionKey` 为范围，身份只能访问自己的分区。

use std::fmt;

use async_trait::async_trait;
use chrono::Utc;
use entity::measurements;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set};
use serde_json::Value;
use uuid::Uuid;

use super::MeasurementRecord;
use crate::error::{Context, Result};

/// 数据分区键（已验证身份的唯一ID）
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PartitionKey(String);

impl PartitionKey {
    /// 空白ID无法构成分区键
    pub fn new(unique_id: impl Into<String>) -> Option<Self> {
        let unique_id = unique_id.into();
        if unique_id.trim().is_empty() {
            None
        } else {
            Some(Self(unique_id))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 测量记录存储
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    /// 按写入顺序列出分区内的全部文档
    async fn list(&self, partition: &PartitionKey) -> Result<Vec<Value>>;

    /// 追加一条记录，返回记录ID
    async fn append(&self, partition: &PartitionKey, record: MeasurementRecord) -> Result<String>;
}

/// 基于 Sea-ORM 的测量记录存储
#[derive(Debug, Clone)]
pub struct SeaOrmMeasurementStore {
    db: DatabaseConnection,
}

impl SeaOrmMeasurementStore {
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MeasurementStore for SeaOrmMeasurementStore {
    async fn list(&self, partition: &PartitionKey) -> Result<Vec<Value>> {
        let records = measurements::Entity::find()
            .filter(measurements::Column::AccountId.eq(partition.as_str()))
            .order_by_asc(measurements::Column::CreatedAt)
            .all(&self.db)
            .await
            .context("读取测量记录失败")?;

        Ok(records.into_iter().map(|record| record.payload).collect())
    }

    async fn append(&self, partition: &PartitionKey, record: MeasurementRecord) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let model = measurements::ActiveModel {
            id: Set(id.clone()),
            account_id: Set(partition.as_str().to_string()),
            reading: Set(record.reading),
            valid: Set(record.valid),
            payload: Set(record.into_document()),
            created_at: Set(Utc::now()),
        };

        measurements::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
            .context("写入测量记录失败")?;

        Ok(id)
    }
}
