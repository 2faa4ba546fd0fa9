//! # 测量值校验

use serde_json::{Map, Value};

use crate::error::{GatewayError, Result};

/// 合法读数的下界
pub const MIN_READING: f64 = 0.0;
/// 合法读数的上界
pub const MAX_READING: f64 = 14.0;

/// 读数是否落在 `[0, 14]` 闭区间内；NaN 视为不合法
#[must_use]
pub fn is_valid_reading(reading: f64) -> bool {
    (MIN_READING..=MAX_READING).contains(&reading)
}

/// 待写入的测量记录
///
/// `document` 包含调用方提交的全部字段，`valid` 总是由服务端重新计算并覆盖。
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub reading: f64,
    pub valid: bool,
    pub document: Map<String, Value>,
}

impl MeasurementRecord {
    /// 从请求体构建记录
    pub fn from_payload(payload: Value) -> Result<Self> {
        let Value::Object(mut document) = payload else {
            return Err(GatewayError::validation("请求体必须是JSON对象", None));
        };

        let reading = document
            .get("reading")
            .and_then(Value::as_f64)
            .ok_or_else(|| {
                GatewayError::validation("reading 必须为数字", Some("reading".to_string()))
            })?;

        let valid = is_valid_reading(reading);
        document.insert("valid".to_string(), Value::Bool(valid));

        Ok(Self {
            reading,
            valid,
            document,
        })
    }

    #[must_use]
    pub fn into_document(self) -> Value {
        Value::Object(self.document)
    }
}
