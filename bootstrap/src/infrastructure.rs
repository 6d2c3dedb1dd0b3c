//! 基础设施资源管理
//!
//! 统一管理服务共享的基础设施资源

use std::sync::Arc;

use secrecy::ExposeSecret;
use shelf_adapter_postgres::{PostgresConfig, check_connection, create_pool};
use shelf_auth_core::TokenService;
use shelf_config::AppConfig;
use shelf_errors::{AppError, AppResult};
use sqlx::PgPool;
use tracing::info;

use crate::retry::{RetryConfig, with_retry};

/// 存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Postgres,
    InMemory,
}

/// 基础设施资源容器
pub struct Infrastructure {
    /// 应用配置
    config: AppConfig,
    /// PostgreSQL 连接池（内存模式下为空）
    postgres_pool: Option<PgPool>,
    /// Token 服务
    token_service: Arc<TokenService>,
}

impl Infrastructure {
    /// 从配置创建基础设施资源（数据库连接带重试）
    pub async fn from_config(config: AppConfig, mode: StorageMode) -> AppResult<Self> {
        let postgres_pool = match mode {
            StorageMode::Postgres => {
                let retry_config = RetryConfig::default();
                let pg_config = PostgresConfig::from(&config.database);
                let pool = with_retry(&retry_config, "PostgreSQL connection", || {
                    let cfg = pg_config.clone();
                    async move { create_pool(&cfg).await }
                })
                .await?;
                Some(pool)
            }
            StorageMode::InMemory => {
                info!("Running with in-memory storage, nothing is persisted");
                None
            }
        };

        let token_service = Arc::new(build_token_service(&config)?);

        Ok(Self {
            config,
            postgres_pool,
            token_service,
        })
    }

    /// 获取应用配置
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 获取 PostgreSQL 连接池
    pub fn postgres_pool(&self) -> Option<PgPool> {
        self.postgres_pool.clone()
    }

    /// 获取 Token 服务
    pub fn token_service(&self) -> Arc<TokenService> {
        self.token_service.clone()
    }

    /// 检查数据库连接（内存模式恒为 true）
    pub async fn check_database(&self) -> bool {
        match &self.postgres_pool {
            Some(pool) => check_connection(pool).await.is_ok(),
            None => true,
        }
    }
}

/// 根据 JWT 配置创建 Token 服务
pub fn build_token_service(config: &AppConfig) -> AppResult<TokenService> {
    let ttl = i64::try_from(config.jwt.expires_in).unwrap_or(i64::MAX);
    TokenService::from_base64_secret(config.jwt.secret.expose_secret(), ttl)
        .map_err(|e| AppError::internal(format!("Invalid JWT configuration: {}", e)))
}
