//! Repository 接口

use async_trait::async_trait;
use shelf_common::UserId;
use shelf_errors::AppResult;

use super::{ActivationCode, Identity, Role};

/// 身份 Repository
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<Identity>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>>;

    async fn exists_by_email(&self, email: &str) -> AppResult<bool>;

    /// 新增身份；邮箱冲突返回 `AppError::Conflict`
    async fn save(&self, identity: &Identity) -> AppResult<()>;

    async fn update(&self, identity: &Identity) -> AppResult<()>;
}

/// 角色 Repository
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>>;
}

/// 激活码 Repository
#[async_trait]
pub trait ActivationCodeRepository: Send + Sync {
    async fn save(&self, code: &ActivationCode) -> AppResult<()>;

    /// 写入兑换时间；已兑换的记录返回 `AppError::Conflict`
    async fn mark_validated(&self, code: &ActivationCode) -> AppResult<()>;

    /// 按码值查找记录，并在当前事务内加锁
    async fn find_by_code_for_update(&self, code: &str) -> AppResult<Option<ActivationCode>>;

    /// 码值是否曾被签发（含已兑换、已过期的记录）
    async fn exists_by_code(&self, code: &str) -> AppResult<bool>;
}
