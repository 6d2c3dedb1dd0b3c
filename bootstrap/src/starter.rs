//! 服务启动器
//!
//! 提供统一的 HTTP 服务启动模式

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use shelf_config::AppConfig;
use shelf_errors::AppResult;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::infrastructure::{Infrastructure, StorageMode};
use crate::metrics::MetricsRecorder;
use crate::runtime::{init_runtime, shutdown_signal};

/// 服务启动器配置
pub struct ServiceConfig {
    /// 配置目录
    pub config_dir: String,
    /// 存储后端
    pub storage: StorageMode,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            config_dir: "config".to_string(),
            storage: StorageMode::Postgres,
        }
    }
}

impl ServiceConfig {
    pub fn with_config_dir(mut self, dir: impl Into<String>) -> Self {
        self.config_dir = dir.into();
        self
    }

    pub fn with_storage(mut self, storage: StorageMode) -> Self {
        self.storage = storage;
        self
    }
}

/// 运行 HTTP 服务
///
/// 1. 加载配置
/// 2. 初始化运行时（日志）
/// 3. 安装 Prometheus recorder
/// 4. 创建基础设施资源（数据库、TokenService）
/// 5. 调用 `router_builder` 构建业务路由，并挂载 `/metrics`
/// 6. 启动服务器并处理 graceful shutdown
///
/// ```ignore
/// shelf_bootstrap::run(ServiceConfig::default(), |infra| async move {
///     Ok(my_router(infra))
/// })
/// .await
/// ```
pub async fn run<F, Fut>(
    service_config: ServiceConfig,
    router_builder: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(Arc<Infrastructure>) -> Fut,
    Fut: Future<Output = AppResult<Router>>,
{
    // 1. 加载配置
    let config = AppConfig::load(&service_config.config_dir)?;

    // 2. 初始化运行时
    init_runtime(&config);

    info!(storage = ?service_config.storage, "Starting {} service", config.app_name);

    // 3. 初始化 Metrics 记录器
    let metrics = MetricsRecorder::install()?;

    // 4. 创建基础设施（带重试）
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let infra = Arc::new(Infrastructure::from_config(config, service_config.storage).await?);

    // 5. 构建路由
    let app = router_builder(infra)
        .await?
        .merge(metrics.router())
        .layer(TraceLayer::new_for_http());

    info!(%addr, "HTTP server starting");

    // 6. 启动服务器
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
