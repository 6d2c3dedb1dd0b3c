//! Unit of Work 模式
//!
//! 提供跨多个 Repository 的事务协调能力，确保操作的原子性。

use async_trait::async_trait;
use shelf_errors::AppResult;

use super::repositories::{ActivationCodeRepository, IdentityRepository, RoleRepository};

/// Unit of Work trait
///
/// ```ignore
/// let uow = uow_factory.begin().await?;
///
/// uow.identities().save(&identity).await?;
/// uow.activation_codes().save(&code).await?;
///
/// uow.commit().await?;
/// ```
///
/// 未提交即被丢弃的 Unit of Work 不会留下任何更改。
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    fn identities(&self) -> &dyn IdentityRepository;

    fn roles(&self) -> &dyn RoleRepository;

    fn activation_codes(&self) -> &dyn ActivationCodeRepository;

    /// 提交事务
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// 回滚事务
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Unit of Work 工厂 trait
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// 开始新的事务
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}
