//! # 网关服务器
//!
//! 组装路由与公共中间件（访问日志、CORS、安全响应头、请求体上限、请求ID），并负责监听与优雅关闭。

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
    middleware::from_fn,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use super::middleware::request_id_middleware;
use crate::auth::{IdentityResolver, TOKEN_HEADER};
use crate::config::ServerConfig;
use crate::error::{GatewayError, Result};
use crate::storage::MeasurementStore;
use crate::{
    linfo, lwarn,
    logging::{LogComponent, LogStage},
};

/// 网关应用状态
#[derive(Clone)]
pub struct GatewayState {
    resolver: IdentityResolver,
    store: Arc<dyn MeasurementStore>,
}

impl GatewayState {
    pub fn new(resolver: IdentityResolver, store: Arc<dyn MeasurementStore>) -> Self {
        Self { resolver, store }
    }

    #[must_use]
    pub const fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    #[must_use]
    pub fn store(&self) -> &dyn MeasurementStore {
        self.store.as_ref()
    }
}

/// 网关服务器
pub struct GatewayServer {
    config: ServerConfig,
    router: Router,
}

impl GatewayServer {
    /// 创建新的网关服务器
    pub fn new(config: ServerConfig, state: GatewayState) -> Self {
        let router = create_router(state, &config);
        Self { config, router }
    }

    /// 获取绑定地址
    pub fn bind_address(&self) -> Result<SocketAddr> {
        let ip = self
            .config
            .bind_address
            .parse::<std::net::IpAddr>()
            .map_err(|e| {
                GatewayError::config_with_source(
                    format!("无效的监听地址: {}", self.config.bind_address),
                    e,
                )
            })?;
        Ok(SocketAddr::new(ip, self.config.port))
    }

    /// 启动服务器，收到 Ctrl-C / SIGTERM 后优雅关闭
    pub async fn serve(self) -> Result<()> {
        let addr = self.bind_address()?;
        let listener = TcpListener::bind(&addr).await?;

        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "server_start",
            &format!("App listening on {addr}...")
        );

        self.serve_with_listener(listener, shutdown_signal()).await
    }

    /// 在已绑定的监听器上提供服务，直到 `shutdown` 完成
    pub async fn serve_with_listener<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| GatewayError::network_with_source("网关服务异常退出", e))?;

        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "server_stop",
            "网关服务已停止"
        );
        Ok(())
    }
}

/// 创建带公共中间件的路由器
pub fn create_router(state: GatewayState, config: &ServerConfig) -> Router {
    let mut app = super::routes::create_routes(state)
        .layer(DefaultBodyLimit::max(config.max_request_size));

    let hardening = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ));
    app = app.layer(hardening);

    if config.enable_cors {
        app = app.layer(cors_layer(config));
    }

    app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(from_fn(request_id_middleware)),
    )
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(TOKEN_HEADER),
        ]);

    if config.cors_origins.iter().any(|origin| origin == "*") {
        return cors_layer.allow_origin(Any);
    }

    let origins = config
        .cors_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<std::result::Result<Vec<_>, _>>();

    match origins {
        Ok(origins) => cors_layer.allow_origin(origins),
        Err(e) => {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "cors_config_fail",
                &format!("Invalid CORS origin configuration: {e}, falling back to allow any")
            );
            cors_layer.allow_origin(Any)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            lwarn!(
                "system",
                LogStage::Shutdown,
                LogComponent::ServerSetup,
                "signal",
                &format!("无法监听 Ctrl-C 信号: {e}")
            );
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                lwarn!(
                    "system",
                    LogStage::Shutdown,
                    LogComponent::ServerSetup,
                    "signal",
                    &format!("无法监听 SIGTERM 信号: {e}")
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    linfo!(
        "system",
        LogStage::Shutdown,
        LogComponent::ServerSetup,
        "signal",
        "收到关闭信号，开始优雅关闭"
    );
}
