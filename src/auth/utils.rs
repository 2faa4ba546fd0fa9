//! # 认证工具函数

use axum::http::HeaderMap;

/// 认证工具类
pub struct AuthUtils;

impl AuthUtils {
    /// 净化令牌用于日志记录
    ///
    /// # 返回
    /// 脱敏后的令牌字符串，格式: "eyJh***Q2xk"；过短的令牌整体隐藏
    #[must_use]
    pub fn sanitize_token(token: &str) -> String {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() > 10 {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{head}***{tail}")
        } else {
            "***".to_string()
        }
    }

    /// 读取请求头的值
    ///
    /// 非可见 ASCII 的值视为不存在。
    #[must_use]
    pub fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers.get(name).and_then(|value| value.to_str().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_sanitize_token() {
        assert_eq!(AuthUtils::sanitize_token("short"), "***");
        assert_eq!(AuthUtils::sanitize_token("abcd123456789wxyz"), "abcd***wxyz");
        assert_eq!(AuthUtils::sanitize_token("令牌令牌令牌令牌令牌令牌"), "令牌令牌***令牌令牌");
    }

    #[test]
    fn test_header_value_ignores_opaque_bytes() {
        let mut headers = HeaderMap::new();
        headers.insert("x-token-api", HeaderValue::from_static("tok"));
        headers.insert(
            "authorization",
            HeaderValue::from_bytes(b"Basic \xff\xfe").unwrap(),
        );

        assert_eq!(AuthUtils::header_value(&headers, "x-token-api"), Some("tok"));
        assert_eq!(AuthUtils::header_value(&headers, "authorization"), None);
        assert_eq!(AuthUtils::header_value(&headers, "missing"), None);
    }
}
