//! 事务感知的 Repository 实现
//!
//! 这些 Repository 使用共享的 Transaction 而非 PgPool。

use async_trait::async_trait;
use shelf_common::UserId;
use shelf_errors::{AppError, AppResult};
use sqlx::{Postgres, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::queries;
use crate::domain::repositories::{ActivationCodeRepository, IdentityRepository, RoleRepository};
use crate::domain::{ActivationCode, Identity, Role};

/// 共享事务类型
pub(crate) type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// 宏：定义一个简单的 TxRepository 结构体
macro_rules! define_tx_repo {
    ($name:ident) => {
        pub struct $name {
            tx: SharedTx,
        }

        impl $name {
            pub fn new(tx: SharedTx) -> Self {
                Self { tx }
            }
        }
    };
}

define_tx_repo!(TxIdentityRepository);
define_tx_repo!(TxRoleRepository);
define_tx_repo!(TxActivationCodeRepository);

/// 取出事务连接并执行查询
macro_rules! with_tx {
    ($self:ident, |$conn:ident| $body:expr) => {{
        let mut guard = $self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;
        let $conn = &mut **tx;
        let result = $body.await;
        result
    }};
}

// =============================================================================
// IdentityRepository 实现
// =============================================================================

#[async_trait]
impl IdentityRepository for TxIdentityRepository {
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<Identity>> {
        with_tx!(self, |conn| queries::find_identity_by_id(conn, id))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>> {
        with_tx!(self, |conn| queries::find_identity_by_email(conn, email))
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        with_tx!(self, |conn| queries::exists_identity_by_email(conn, email))
    }

    async fn save(&self, identity: &Identity) -> AppResult<()> {
        with_tx!(self, |conn| queries::insert_identity(conn, identity))
    }

    async fn update(&self, identity: &Identity) -> AppResult<()> {
        with_tx!(self, |conn| queries::update_identity(conn, identity))
    }
}

// =============================================================================
// RoleRepository 实现
// =============================================================================

#[async_trait]
impl RoleRepository for TxRoleRepository {
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        with_tx!(self, |conn| queries::find_role_by_name(conn, name))
    }
}

// =============================================================================
// ActivationCodeRepository 实现
// =============================================================================

#[async_trait]
impl ActivationCodeRepository for TxActivationCodeRepository {
    async fn save(&self, code: &ActivationCode) -> AppResult<()> {
        with_tx!(self, |conn| queries::insert_activation_code(conn, code))
    }

    async fn mark_validated(&self, code: &ActivationCode) -> AppResult<()> {
        with_tx!(self, |conn| queries::mark_activation_code_validated(conn, code))
    }

    async fn find_by_code_for_update(&self, code: &str) -> AppResult<Option<ActivationCode>> {
        with_tx!(self, |conn| queries::find_activation_code_for_update(conn, code))
    }

    async fn exists_by_code(&self, code: &str) -> AppResult<bool> {
        with_tx!(self, |conn| queries::exists_activation_code(conn, code))
    }
}
