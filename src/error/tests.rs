//! # 错误处理测试

use crate::error::{AuthError, Context, GatewayError};
use axum::http::StatusCode;
use std::error::Error;

#[test]
fn test_config_error_creation() {
    let err = GatewayError::config("测试配置错误");
    assert!(matches!(err, GatewayError::Config { .. }));
    assert_eq!(err.to_string(), "配置错误: 测试配置错误");
}

#[test]
fn test_config_error_with_source() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let err = GatewayError::config_with_source("配置文件加载失败", io_err);

    assert!(matches!(err, GatewayError::Config { .. }));
    assert!(err.to_string().contains("配置错误: 配置文件加载失败"));
    assert!(err.source().is_some());
}

#[test]
fn test_context_trait_wraps_and_keeps_status() {
    let result: Result<(), sea_orm::DbErr> = Err(sea_orm::DbErr::Custom("boom".to_string()));

    let err = result.context("读取测量记录失败").unwrap_err();
    assert!(matches!(err, GatewayError::Context { .. }));
    assert!(err.to_string().starts_with("读取测量记录失败: 数据库错误"));
    assert_eq!(
        err.to_http_response_parts(),
        (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
    );
}

#[test]
fn test_auto_conversion_from_io_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "文件不存在");
    let err: GatewayError = io_err.into();

    assert!(matches!(err, GatewayError::Io { .. }));
    assert!(err.to_string().contains("IO错误: 文件操作失败"));
}

#[test]
fn test_auto_conversion_from_toml_error() {
    let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
    let err: GatewayError = toml_err.into();

    assert!(matches!(err, GatewayError::Config { .. }));
    assert!(err.to_string().contains("配置错误: TOML解析失败"));
}

#[test]
fn test_auth_errors_map_to_unauthorized() {
    for auth_err in [
        AuthError::MalformedCredential,
        AuthError::exchange("INVALID_PASSWORD"),
        AuthError::verification("expired"),
    ] {
        let err: GatewayError = auth_err.into();
        assert_eq!(err.to_http_response_parts().0, StatusCode::UNAUTHORIZED);
    }
}

#[test]
fn test_auth_error_kind_labels() {
    assert_eq!(AuthError::MalformedCredential.kind(), "malformed_credential");
    assert_eq!(AuthError::exchange("x").kind(), "exchange_failure");
    assert_eq!(AuthError::verification("x").kind(), "verification_failure");
}

#[test]
fn test_validation_error_is_client_error() {
    let err = GatewayError::validation("reading 必须为数字", Some("reading".to_string()));
    assert_eq!(
        err.to_http_response_parts(),
        (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
    );
}

#[test]
fn test_config_error_macro() {
    let err = crate::config_error!("端口无效: {}", 0);
    assert_eq!(err.to_string(), "配置错误: 端口无效: 0");

    let err = crate::config_error!("缺少配置项");
    assert!(matches!(err, GatewayError::Config { .. }));
}

#[test]
fn test_database_error_renders_as_server_error() {
    let err: GatewayError = sea_orm::DbErr::Custom("连接丢失".to_string()).into();
    assert_eq!(
        err.to_http_response_parts(),
        (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR")
    );
    assert!(err.source().is_some());
}
