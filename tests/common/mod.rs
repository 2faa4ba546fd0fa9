//! # 集成测试公共工具
//!
//! - `IdentityProviderMock`: 基于 wiremock 的身份提供方（登录、账户查询、公钥集合）
//! - 内存 SQLite 存储与完整路由的构建
//! - mockall 存储替身，用于模拟存储故障

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    http::{HeaderMap, Request, StatusCode},
};
use base64::Engine as _;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use reading_gateway::auth::{
    IdentityProviderVerifier, IdentityResolver, IdentityToolkitExchanger, build_http_client,
};
use reading_gateway::config::{DatabaseConfig, IdentityConfig, ServerConfig};
use reading_gateway::database::{init_database, run_migrations};
use reading_gateway::error::Result;
use reading_gateway::server::{GatewayState, create_router};
use reading_gateway::storage::{MeasurementRecord, MeasurementStore, PartitionKey, SeaOrmMeasurementStore};

pub const API_KEY: &str = "test-api-key";
pub const SHARED_SECRET: &str = "integration-test-secret";
pub const SIGN_IN_PATH: &str = "/v1/accounts:signInWithPassword";
pub const LOOKUP_PATH: &str = "/v1/accounts:lookup";
pub const JWKS_PATH: &str = "/jwks";

mockall::mock! {
    pub Store {}

    #[async_trait]
    impl MeasurementStore for Store {
        async fn list(&self, partition: &PartitionKey) -> Result<Vec<Value>>;
        async fn append(&self, partition: &PartitionKey, record: MeasurementRecord) -> Result<String>;
    }
}

/// 初始化测试日志（重复调用安全）
pub fn init_test_env() {
    reading_gateway::logging::init_logging(Some("warn"));
}

/// 用共享密钥签发会话令牌
pub fn sign_token(sub: &str, ttl_secs: i64) -> String {
    let claims = json!({
        "sub": sub,
        "exp": chrono::Utc::now().timestamp() + ttl_secs,
        "iat": chrono::Utc::now().timestamp(),
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(SHARED_SECRET.as_bytes()),
    )
    .unwrap()
}

/// 生成 Basic 认证头
pub fn basic(username: &str, secret: &str) -> String {
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(format!("{username}:{secret}"))
    )
}

/// wiremock 身份提供方
pub struct IdentityProviderMock {
    pub server: MockServer,
}

impl IdentityProviderMock {
    pub async fn start() -> Self {
        init_test_env();
        Self {
            server: MockServer::start().await,
        }
    }

    /// 共享密钥模式的身份配置
    pub fn identity_config(&self) -> IdentityConfig {
        IdentityConfig {
            api_key: API_KEY.to_string(),
            sign_in_url: format!("{}{SIGN_IN_PATH}", self.server.uri()),
            lookup_url: format!("{}{LOOKUP_PATH}", self.server.uri()),
            jwks_url: format!("{}{JWKS_PATH}", self.server.uri()),
            shared_secret: Some(SHARED_SECRET.to_string()),
            request_timeout: 5,
            ..IdentityConfig::default()
        }
    }

    /// 登录成功：返回 `idToken`
    pub async fn mount_sign_in(&self, email: &str, password: &str, id_token: &str) {
        Mock::given(method("POST"))
            .and(path(SIGN_IN_PATH))
            .and(query_param("key", API_KEY))
            .and(body_json(json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "identitytoolkit#VerifyPasswordResponse",
                "email": email,
                "idToken": id_token,
                "expiresIn": "3600",
            })))
            .mount(&self.server)
            .await;
    }

    /// 登录失败（其余所有登录请求）
    pub async fn mount_sign_in_rejection(&self) {
        Mock::given(method("POST"))
            .and(path(SIGN_IN_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "INVALID_PASSWORD"}
            })))
            .with_priority(10)
            .mount(&self.server)
            .await;
    }

    /// 账户查询：`localId` 对应的账户记录
    pub async fn mount_account(&self, subject: &str, local_id: &str, email: &str) {
        Mock::given(method("POST"))
            .and(path(LOOKUP_PATH))
            .and(query_param("key", API_KEY))
            .and(body_json(json!({"localId": [subject]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kind": "identitytoolkit#GetAccountInfoResponse",
                "users": [{
                    "localId": local_id,
                    "email": email,
                    "emailVerified": true,
                }]
            })))
            .mount(&self.server)
            .await;
    }

    /// 收到的指定路径请求数
    pub async fn request_count(&self, request_path: &str) -> usize {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == request_path)
            .count()
    }

    /// 使用真实 HTTP 协作方的身份解析器
    pub fn resolver(&self) -> IdentityResolver {
        let config = self.identity_config();
        let client = build_http_client(&config).unwrap();
        let exchanger = IdentityToolkitExchanger::new(client.clone(), &config).unwrap();
        let verifier = IdentityProviderVerifier::new(client, &config).unwrap();
        IdentityResolver::new(Arc::new(exchanger), Arc::new(verifier))
    }
}

/// 已迁移的内存存储
pub async fn memory_store() -> Arc<SeaOrmMeasurementStore> {
    let db = init_database(&DatabaseConfig::in_memory()).await.unwrap();
    run_migrations(&db).await.unwrap();
    Arc::new(SeaOrmMeasurementStore::new(db))
}

/// 完整路由
pub fn gateway(resolver: IdentityResolver, store: Arc<dyn MeasurementStore>) -> Router {
    create_router(GatewayState::new(resolver, store), &ServerConfig::default())
}

/// 测试响应
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.to_vec()).unwrap()
    }
}

/// 发送请求
pub async fn send(router: &Router, request: Request<Body>) -> TestResponse {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    TestResponse {
        status,
        headers,
        body,
    }
}

/// 构建请求
pub fn request(method_name: &str, uri: &str, headers: &[(&str, &str)], body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method_name).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
