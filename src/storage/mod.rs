//! # 存储模块
//!
//! 按身份分区的测量记录存取与读数校验

pub mod store;
pub mod validation;

pub use store::{MeasurementStore, PartitionKey, SeaOrmMeasurementStore};
pub use validation::{MAX_READING, MIN_READING, MeasurementRecord, is_valid_reading};

#[cfg(test)]
pub use store::MockMeasurementStore;
