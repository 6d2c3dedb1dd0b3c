//! 数据库迁移

use shelf_errors::{AppError, AppResult};
use sqlx::PgPool;
use tracing::info;

/// 执行内嵌的迁移脚本
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to run migrations: {}", e)))?;

    info!("Database migrations applied");
    Ok(())
}
