//! # Reading Gateway Library
//!
//! 认证网关核心库：Basic 密码或 `X-Token-Api` 令牌解析为已验证身份，
//! 再按身份分区读写测量记录。

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod server;
pub mod storage;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{GatewayError, Result};
