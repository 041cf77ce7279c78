//! # 管理服务器
//!
//! Axum HTTP 服务器：`/ping` 存活检查，业务 API 嵌套在 `api_prefix` 下。

use std::net::SocketAddr;
use std::ops::Deref;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::middleware::request_id_middleware;
use crate::app::AppContext;
use crate::config::ServerConfig;
use crate::error::{AppError, Result};
use crate::logging::{LogComponent, LogStage};
use crate::{linfo, lwarn};

/// 管理服务器应用状态
#[derive(Clone)]
pub struct AppState {
    context: Arc<AppContext>,
}

impl AppState {
    #[must_use]
    pub const fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }
}

impl Deref for AppState {
    type Target = AppContext;

    fn deref(&self) -> &Self::Target {
        &self.context
    }
}

/// 构建完整路由
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let api_routes = super::routes::create_routes(state);

    let mut app = Router::new()
        .nest(&config.api_prefix, api_routes)
        .route("/ping", get(super::handlers::system::ping_handler));

    let service_builder = ServiceBuilder::new().layer(TraceLayer::new_for_http());

    if config.enable_cors {
        app = app.layer(service_builder.layer(cors_layer(&config.cors_origins)));
    } else {
        app = app.layer(service_builder);
    }

    app.layer(axum::middleware::from_fn(request_id_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN]);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let parsed = origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<std::result::Result<Vec<_>, _>>();

    match parsed {
        // 具体来源才允许携带 Cookie
        Ok(origins) => layer.allow_origin(origins).allow_credentials(true),
        Err(e) => {
            lwarn!(
                "system",
                LogStage::Startup,
                LogComponent::ServerSetup,
                "cors_config_fail",
                &format!("Invalid CORS origin configuration: {e}, falling back to allow any")
            );
            layer.allow_origin(Any)
        }
    }
}

/// 管理服务器
pub struct ManagementServer {
    addr: SocketAddr,
    router: Router,
}

impl ManagementServer {
    /// 创建管理服务器
    pub fn new(context: Arc<AppContext>) -> Result<Self> {
        let config = context.config.server.clone();
        let ip = config
            .bind_address
            .parse::<std::net::IpAddr>()
            .map_err(|e| {
                AppError::config_with_source(
                    format!("Invalid bind address '{}'", config.bind_address),
                    e,
                )
            })?;

        Ok(Self {
            addr: SocketAddr::new(ip, config.port),
            router: build_router(AppState::new(context), &config),
        })
    }

    #[must_use]
    pub const fn bind_address(&self) -> SocketAddr {
        self.addr
    }

    /// 启动服务器，直到收到 Ctrl-C
    pub async fn serve(self) -> Result<()> {
        linfo!(
            "system",
            LogStage::Startup,
            LogComponent::ServerSetup,
            "server_start",
            &format!("Starting management server on {}", self.addr)
        );

        let listener = TcpListener::bind(&self.addr).await?;

        axum::serve(
            listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        linfo!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "server_stopped",
            "Management server stopped"
        );
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        lwarn!(
            "system",
            LogStage::Shutdown,
            LogComponent::ServerSetup,
            "signal_fail",
            &format!("Failed to listen for shutdown signal: {e}")
        );
    }
}
