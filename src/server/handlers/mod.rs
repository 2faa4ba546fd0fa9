//! # 请求处理器

pub mod data;

pub use data::{create_measurement, list_measurements, not_found};
