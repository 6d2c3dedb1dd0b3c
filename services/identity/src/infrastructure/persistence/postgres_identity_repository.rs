//! PostgreSQL 身份 Repository（连接池）
//!
//! 供认证过滤器与登录等只读路径使用，不参与 Unit of Work。

use async_trait::async_trait;
use shelf_adapter_postgres::map_db_error;
use shelf_common::UserId;
use shelf_errors::AppResult;
use sqlx::PgPool;

use super::queries;
use crate::domain::Identity;
use crate::domain::repositories::IdentityRepository;

#[derive(Clone)]
pub struct PostgresIdentityRepository {
    pool: PgPool,
}

impl PostgresIdentityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityRepository for PostgresIdentityRepository {
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<Identity>> {
        let mut conn = self.pool.acquire().await.map_err(map_db_error)?;
        queries::find_identity_by_id(&mut conn, id).await
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>> {
        let mut conn = self.pool.acquire().await.map_err(map_db_error)?;
        queries::find_identity_by_email(&mut conn, email).await
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        let mut conn = self.pool.acquire().await.map_err(map_db_error)?;
        queries::exists_identity_by_email(&mut conn, email).await
    }

    async fn save(&self, identity: &Identity) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        queries::insert_identity(&mut tx, identity).await?;
        tx.commit().await.map_err(map_db_error)
    }

    async fn update(&self, identity: &Identity) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        queries::update_identity(&mut tx, identity).await?;
        tx.commit().await.map_err(map_db_error)
    }
}
