//! 内存存储
//!
//! 与 PostgreSQL 实现相同的 `UnitOfWorkFactory` 契约：同一时刻只有一个 Unit of Work
//! 持有存储，更改先写入暂存副本，提交时整体替换。用于测试和 `--in-memory` 开发模式。

use std::sync::{Arc, Mutex as StdMutex, MutexGuard};

use async_trait::async_trait;
use shelf_common::UserId;
use shelf_errors::{AppError, AppResult};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::repositories::{ActivationCodeRepository, IdentityRepository, RoleRepository};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::{ActivationCode, Identity, Role};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    identities: Vec<Identity>,
    roles: Vec<Role>,
    activation_codes: Vec<ActivationCode>,
}

impl MemoryState {
    fn find_identity_by_id(&self, id: &UserId) -> Option<Identity> {
        self.identities.iter().find(|i| &i.id == id).cloned()
    }

    fn find_identity_by_email(&self, email: &str) -> Option<Identity> {
        self.identities.iter().find(|i| i.email == email).cloned()
    }

    fn insert_identity(&mut self, identity: &Identity) -> AppResult<()> {
        if self.identities.iter().any(|i| i.email == identity.email) {
            return Err(AppError::conflict("Unique constraint violated"));
        }
        for role in &identity.roles {
            if !self.roles.iter().any(|r| &r.name == role) {
                return Err(AppError::not_found(format!("Role {} not found", role)));
            }
        }
        self.identities.push(identity.clone());
        Ok(())
    }

    fn update_identity(&mut self, identity: &Identity) -> AppResult<()> {
        let slot = self
            .identities
            .iter_mut()
            .find(|i| i.id == identity.id)
            .ok_or_else(|| AppError::not_found(format!("Identity {} not found", identity.id)))?;
        *slot = identity.clone();
        Ok(())
    }
}

fn lock(state: &StdMutex<MemoryState>) -> AppResult<MutexGuard<'_, MemoryState>> {
    state
        .lock()
        .map_err(|_| AppError::internal("In-memory store lock poisoned"))
}

/// 内存存储
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryStore {
    /// 空存储（不含任何角色）
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置角色的存储
    pub fn with_roles<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let state = MemoryState {
            roles: roles.into_iter().map(Role::new).collect(),
            ..MemoryState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// 已提交的全部激活码
    pub async fn activation_codes(&self) -> Vec<ActivationCode> {
        self.state.lock().await.activation_codes.clone()
    }

    /// 已提交的全部身份
    pub async fn identities(&self) -> Vec<Identity> {
        self.state.lock().await.identities.clone()
    }
}

#[async_trait]
impl UnitOfWorkFactory for InMemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = Arc::new(StdMutex::new(guard.clone()));

        Ok(Box::new(MemoryUnitOfWork {
            guard,
            staged: staged.clone(),
            repos: MemoryRepositories { state: staged },
        }))
    }
}

/// 已提交状态上的身份 Repository（单条操作即时生效）
#[async_trait]
impl IdentityRepository for InMemoryStore {
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<Identity>> {
        Ok(self.state.lock().await.find_identity_by_id(id))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>> {
        Ok(self.state.lock().await.find_identity_by_email(email))
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        Ok(self.state.lock().await.find_identity_by_email(email).is_some())
    }

    async fn save(&self, identity: &Identity) -> AppResult<()> {
        self.state.lock().await.insert_identity(identity)
    }

    async fn update(&self, identity: &Identity) -> AppResult<()> {
        self.state.lock().await.update_identity(identity)
    }
}

/// 内存 Unit of Work
///
/// 持有存储的独占锁直到提交或丢弃。
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    staged: Arc<StdMutex<MemoryState>>,
    repos: MemoryRepositories,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn identities(&self) -> &dyn IdentityRepository {
        &self.repos
    }

    fn roles(&self) -> &dyn RoleRepository {
        &self.repos
    }

    fn activation_codes(&self) -> &dyn ActivationCodeRepository {
        &self.repos
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryUnitOfWork {
            mut guard, staged, ..
        } = *self;
        let staged = lock(&staged)?.clone();
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        Ok(())
    }
}

/// 暂存副本上的 Repository
struct MemoryRepositories {
    state: Arc<StdMutex<MemoryState>>,
}

#[async_trait]
impl IdentityRepository for MemoryRepositories {
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<Identity>> {
        Ok(lock(&self.state)?.find_identity_by_id(id))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Identity>> {
        Ok(lock(&self.state)?.find_identity_by_email(email))
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        Ok(lock(&self.state)?.find_identity_by_email(email).is_some())
    }

    async fn save(&self, identity: &Identity) -> AppResult<()> {
        lock(&self.state)?.insert_identity(identity)
    }

    async fn update(&self, identity: &Identity) -> AppResult<()> {
        lock(&self.state)?.update_identity(identity)
    }
}

#[async_trait]
impl RoleRepository for MemoryRepositories {
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        Ok(lock(&self.state)?
            .roles
            .iter()
            .find(|r| r.name == name)
            .cloned())
    }
}

#[async_trait]
impl ActivationCodeRepository for MemoryRepositories {
    async fn save(&self, code: &ActivationCode) -> AppResult<()> {
        let mut state = lock(&self.state)?;
        if state.find_identity_by_id(&code.identity_id).is_none() {
            return Err(AppError::not_found(format!(
                "Identity {} not found",
                code.identity_id
            )));
        }
        if state.activation_codes.iter().any(|c| c.code == code.code) {
            return Err(AppError::conflict("Unique constraint violated"));
        }
        state.activation_codes.push(code.clone());
        Ok(())
    }

    async fn mark_validated(&self, code: &ActivationCode) -> AppResult<()> {
        let validated_at = code
            .validated_at
            .ok_or_else(|| AppError::internal("Activation code has no validation timestamp"))?;

        let mut state = lock(&self.state)?;
        let stored = state
            .activation_codes
            .iter_mut()
            .find(|c| c.id == code.id)
            .ok_or_else(|| AppError::not_found("Activation code not found"))?;

        if stored.validated_at.is_some() {
            return Err(AppError::conflict("Activation code already validated"));
        }
        stored.validated_at = Some(validated_at);
        Ok(())
    }

    async fn find_by_code_for_update(&self, code: &str) -> AppResult<Option<ActivationCode>> {
        Ok(lock(&self.state)?
            .activation_codes
            .iter()
            .find(|c| c.code == code)
            .cloned())
    }

    async fn exists_by_code(&self, code: &str) -> AppResult<bool> {
        Ok(lock(&self.state)?
            .activation_codes
            .iter()
            .any(|c| c.code == code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn identity(email: &str) -> Identity {
        Identity::register(email, "Ada", "Lovelace", "hash", vec!["USER".to_string()])
    }

    #[tokio::test]
    async fn test_commit_publishes_staged_changes() {
        let store = InMemoryStore::with_roles(["USER"]);

        let uow = store.begin().await.unwrap();
        uow.identities().save(&identity("a@x.com")).await.unwrap();
        uow.commit().await.unwrap();

        assert_eq!(store.identities().await.len(), 1);
        assert!(store.find_by_email("a@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_discards_changes() {
        let store = InMemoryStore::with_roles(["USER"]);

        {
            let uow = store.begin().await.unwrap();
            uow.identities().save(&identity("a@x.com")).await.unwrap();
        }
        let uow = store.begin().await.unwrap();
        uow.identities().save(&identity("b@x.com")).await.unwrap();
        uow.rollback().await.unwrap();

        assert!(store.identities().await.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_a_conflict() {
        let store = InMemoryStore::with_roles(["USER"]);
        store.save(&identity("a@x.com")).await.unwrap();

        let err = store.save(&identity("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unknown_role_is_rejected() {
        let store = InMemoryStore::new();
        let err = store.save(&identity("a@x.com")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_code_value_is_never_reused() {
        let store = InMemoryStore::with_roles(["USER"]);
        let first = identity("a@x.com");
        let second = identity("b@x.com");
        store.save(&first).await.unwrap();
        store.save(&second).await.unwrap();

        let uow = store.begin().await.unwrap();
        let expired = ActivationCode::new(first.id.clone(), "111111", Duration::minutes(-1));
        uow.activation_codes().save(&expired).await.unwrap();
        assert!(uow.activation_codes().exists_by_code("111111").await.unwrap());

        let reused = ActivationCode::new(second.id.clone(), "111111", Duration::minutes(5));
        let err = uow.activation_codes().save(&reused).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let found = uow
            .activation_codes()
            .find_by_code_for_update("111111")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.identity_id, first.id);
    }

    #[tokio::test]
    async fn test_mark_validated_only_once() {
        let store = InMemoryStore::with_roles(["USER"]);
        let owner = identity("a@x.com");
        store.save(&owner).await.unwrap();

        let uow = store.begin().await.unwrap();
        let mut code = ActivationCode::new(owner.id.clone(), "123456", Duration::minutes(5));
        uow.activation_codes().save(&code).await.unwrap();

        code.redeem_at(Utc::now()).unwrap();
        uow.activation_codes().mark_validated(&code).await.unwrap();
        let err = uow.activation_codes().mark_validated(&code).await.unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert!(uow.activation_codes().exists_by_code("123456").await.unwrap());
    }
}
