//! shelf-bootstrap - 统一服务启动骨架
//!
//! 配置加载、日志、指标、基础设施与 HTTP 服务器生命周期

mod infrastructure;
mod metrics;
mod retry;
mod runtime;
mod starter;

pub use infrastructure::*;
pub use metrics::*;
pub use retry::*;
pub use runtime::*;
pub use starter::*;
