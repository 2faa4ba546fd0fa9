//! # 路由配置
//!
//! 只有 `/api/data` 的 GET/POST 经过授权关卡；其他路径与方法一律 404，不做认证。

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::get,
};

use super::GatewayState;
use super::handlers::{create_measurement, list_measurements, not_found};
use super::middleware::authorization_gate;

/// 数据路由路径
pub const DATA_PATH: &str = "/api/data";

/// 创建路由
pub fn create_routes(state: GatewayState) -> Router {
    let data_routes = get(list_measurements)
        .post(create_measurement)
        .route_layer(from_fn_with_state(state.clone(), authorization_gate))
        .fallback(not_found);

    Router::new()
        .route(DATA_PATH, data_routes)
        .fallback(not_found)
        .with_state(state)
}
