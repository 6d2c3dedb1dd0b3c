//! 路由

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{Router, middleware};
use sqlx::PgPool;

use super::filter::{FilterState, authenticate};
use super::handlers;
use crate::application::AuthenticationService;

/// 处理器共享状态
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthenticationService>,
    /// 内存模式下为空
    pub pool: Option<PgPool>,
}

impl AppState {
    pub fn new(auth: Arc<AuthenticationService>, pool: Option<PgPool>) -> Self {
        Self { auth, pool }
    }
}

/// 构建身份服务路由，所有路由都经过认证过滤器
pub fn router(state: AppState, filter: FilterState) -> Router {
    Router::new()
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/activate", post(handlers::activate))
        .route("/api/me", get(handlers::me))
        .route("/health", get(handlers::health))
        .layer(middleware::from_fn_with_state(filter, authenticate))
        .with_state(state)
}
