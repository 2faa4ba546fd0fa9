//! # 测量数据处理器
//!
//! `GET/POST /api/data`，只在授权关卡附加身份之后执行。

use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::error::Result;
use crate::server::GatewayState;
use crate::server::middleware::{AuthenticatedIdentity, RequestId};
use crate::storage::{MeasurementRecord, PartitionKey};
use crate::{
    lerror, linfo, lwarn,
    logging::{LogComponent, LogStage},
};

/// 列出当前身份分区内的全部记录
pub async fn list_measurements(
    State(state): State<GatewayState>,
    request_id: RequestId,
    AuthenticatedIdentity(identity): AuthenticatedIdentity,
) -> Result<Response> {
    let Some(partition) = PartitionKey::new(identity.unique_id.as_str()) else {
        lwarn!(
            request_id,
            LogStage::Request,
            LogComponent::DataHandler,
            "list_measurements",
            "身份缺少唯一ID"
        );
        return Ok(StatusCode::UNPROCESSABLE_ENTITY.into_response());
    };

    let documents = state.store().list(&partition).await.inspect_err(|e| {
        lerror!(
            request_id,
            LogStage::Storage,
            LogComponent::DataHandler,
            "list_measurements",
            &format!("读取测量记录失败: {e}")
        );
    })?;

    Ok((StatusCode::OK, Json(documents)).into_response())
}

/// 写入一条测量记录，`valid` 由服务端重新计算
pub async fn create_measurement(
    State(state): State<GatewayState>,
    request_id: RequestId,
    AuthenticatedIdentity(identity): AuthenticatedIdentity,
    body: Bytes,
) -> Result<Response> {
    let Some(partition) = PartitionKey::new(identity.unique_id.as_str()) else {
        lwarn!(
            request_id,
            LogStage::Request,
            LogComponent::DataHandler,
            "create_measurement",
            "身份缺少唯一ID，忽略写入"
        );
        return Ok(StatusCode::OK.into_response());
    };

    let payload: Value = serde_json::from_slice(&body)?;
    let record = MeasurementRecord::from_payload(payload)?;
    let valid = record.valid;

    let id = state
        .store()
        .append(&partition, record)
        .await
        .inspect_err(|e| {
            lerror!(
                request_id,
                LogStage::Storage,
                LogComponent::DataHandler,
                "create_measurement",
                &format!("写入测量记录失败: {e}")
            );
        })?;

    linfo!(
        request_id,
        LogStage::Storage,
        LogComponent::DataHandler,
        "create_measurement",
        &format!("测量记录已写入: id={id}, valid={valid}")
    );

    Ok(StatusCode::CREATED.into_response())
}

/// 未匹配的路由与方法
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
