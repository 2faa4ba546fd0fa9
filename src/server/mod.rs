//! # HTTP 服务模块

pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;

pub use gateway::{GatewayServer, GatewayState, create_router};
pub use response::{ErrorInfo, ErrorResponse};
