//! PostgreSQL Unit of Work 实现
//!
//! 使用 SQLx Transaction 提供事务协调能力。

use async_trait::async_trait;
use shelf_errors::{AppError, AppResult};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::tx_repositories::{
    SharedTx, TxActivationCodeRepository, TxIdentityRepository, TxRoleRepository,
};
use crate::domain::repositories::{ActivationCodeRepository, IdentityRepository, RoleRepository};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

/// PostgreSQL Unit of Work 工厂
#[derive(Clone)]
pub struct PostgresUnitOfWorkFactory {
    pool: PgPool,
}

impl PostgresUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {}", e)))?;

        Ok(Box::new(PostgresUnitOfWork::new(Arc::new(Mutex::new(Some(tx))))))
    }
}

/// PostgreSQL Unit of Work 实现
///
/// 所有 Repository 共享同一个事务；未提交即丢弃时由 SQLx 自动回滚。
pub struct PostgresUnitOfWork {
    tx: SharedTx,
    identity_repo: TxIdentityRepository,
    role_repo: TxRoleRepository,
    activation_code_repo: TxActivationCodeRepository,
}

impl PostgresUnitOfWork {
    fn new(tx: SharedTx) -> Self {
        Self {
            tx: tx.clone(),
            identity_repo: TxIdentityRepository::new(tx.clone()),
            role_repo: TxRoleRepository::new(tx.clone()),
            activation_code_repo: TxActivationCodeRepository::new(tx),
        }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    fn identities(&self) -> &dyn IdentityRepository {
        &self.identity_repo
    }

    fn roles(&self) -> &dyn RoleRepository {
        &self.role_repo
    }

    fn activation_codes(&self) -> &dyn ActivationCodeRepository {
        &self.activation_code_repo
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let tx = self
            .tx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transaction: {}", e)))
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let tx = self
            .tx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;

        tx.rollback()
            .await
            .map_err(|e| AppError::database(format!("Failed to rollback transaction: {}", e)))
    }
}
