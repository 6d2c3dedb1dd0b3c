//! Metrics 模块
//!
//! 提供 Prometheus metrics 导出

use axum::Router;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use shelf_errors::{AppError, AppResult};
use shelf_telemetry::init_metrics;

/// Metrics 记录器
#[derive(Clone)]
pub struct MetricsRecorder {
    handle: PrometheusHandle,
}

impl MetricsRecorder {
    /// 安装全局 Prometheus recorder
    pub fn install() -> AppResult<Self> {
        let handle = init_metrics().map_err(|e| {
            AppError::internal(format!("Failed to install Prometheus recorder: {}", e))
        })?;

        Ok(Self { handle })
    }

    /// 获取 Prometheus 格式的 metrics
    pub fn render(&self) -> String {
        self.handle.render()
    }

    /// `GET /metrics` 路由
    pub fn router(&self) -> Router {
        let recorder = self.clone();
        Router::new().route("/metrics", get(move || async move { recorder.render() }))
    }
}
