//! 认证服务
//!
//! 注册、登录与账户激活。注册和激活各自在一个 Unit of Work 内完成，
//! 激活邮件在提交前投递，投递失败则整体回滚。

use std::sync::Arc;

use serde_json::{Map, Value, json};
use shelf_adapter_email::{ACTIVATE_ACCOUNT_TEMPLATE, EmailSender};
use shelf_auth_core::TokenService;
use shelf_config::ActivationConfig;
use shelf_errors::AppError;
use tracing::{debug, info, warn};

use crate::application::commands::{LoginCommand, RegisterCommand};
use crate::domain::repositories::IdentityRepository;
use crate::domain::services::{ActivationLedger, PasswordHasher};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::{ActivationCode, Identity};
use crate::error::{AuthError, AuthResult};
use crate::infrastructure::observability::metrics;

const ACTIVATION_SUBJECT: &str = "Account activation";

/// 未知邮箱登录时用于校验的占位密码
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

/// 激活结果（Unit of Work 内部）
enum Activation {
    Activated(Identity),
    Resent,
}

/// 认证服务
pub struct AuthenticationService {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    identities: Arc<dyn IdentityRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    token_service: Arc<TokenService>,
    email_sender: Arc<dyn EmailSender>,
    ledger: ActivationLedger,
    /// 未知邮箱时同样执行一次哈希校验，使两种失败耗时一致
    decoy_hash: Option<String>,
    baseline_role: String,
    link_base_url: String,
    require_activation_for_login: bool,
}

impl AuthenticationService {
    pub fn new(
        uow_factory: Arc<dyn UnitOfWorkFactory>,
        identities: Arc<dyn IdentityRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        token_service: Arc<TokenService>,
        email_sender: Arc<dyn EmailSender>,
        config: &ActivationConfig,
    ) -> Self {
        let decoy_hash = password_hasher
            .hash(DECOY_PASSWORD)
            .inspect_err(|e| warn!(error = %e, "Failed to prepare decoy password hash"))
            .ok();

        Self {
            uow_factory,
            identities,
            password_hasher,
            token_service,
            email_sender,
            ledger: ActivationLedger::from_config(config),
            decoy_hash,
            baseline_role: config.baseline_role.clone(),
            link_base_url: config.link_base_url.clone(),
            require_activation_for_login: config.require_for_login,
        }
    }

    /// 注册新身份
    ///
    /// 身份以禁用状态创建，并签发、投递一枚激活码。
    pub async fn register(&self, cmd: RegisterCommand) -> AuthResult<Identity> {
        debug!(email = %cmd.email, "Registering identity");

        cmd.validate()?;
        let password_hash = self.password_hasher.hash(&cmd.password).map_err(AppError::from)?;

        let uow = self.uow_factory.begin().await?;
        let result = self.register_in(uow.as_ref(), &cmd, password_hash).await;
        let identity = finish(uow, result).await.inspect_err(|e| {
            warn!(email = %cmd.email, error = %e, "Registration failed");
        })?;

        metrics::record_registration();
        info!(identity_id = %identity.id, email = %identity.email, "Identity registered");
        Ok(identity)
    }

    async fn register_in(
        &self,
        uow: &dyn UnitOfWork,
        cmd: &RegisterCommand,
        password_hash: String,
    ) -> AuthResult<Identity> {
        let role = uow
            .roles()
            .find_by_name(&self.baseline_role)
            .await?
            .ok_or_else(|| AuthError::RoleNotConfigured(self.baseline_role.clone()))?;

        if uow.identities().exists_by_email(&cmd.email).await? {
            return Err(AuthError::DuplicateIdentity);
        }

        let identity = Identity::register(
            cmd.email.clone(),
            cmd.first_name.clone(),
            cmd.last_name.clone(),
            password_hash,
            vec![role.name],
        );

        // 并发注册同一邮箱时由唯一约束兜底
        uow.identities().save(&identity).await.map_err(|e| match e {
            AppError::Conflict(_) => AuthError::DuplicateIdentity,
            other => AuthError::Store(other),
        })?;

        let code = self.ledger.issue_code(uow, &identity).await?;
        self.send_activation_email(&identity, &code).await?;

        Ok(identity)
    }

    /// 凭证登录，返回 Bearer 令牌
    pub async fn login(&self, cmd: LoginCommand) -> AuthResult<String> {
        debug!(email = %cmd.email, "Login attempt");

        let result = self.login_inner(&cmd).await;
        match &result {
            Ok(_) => metrics::record_login("success"),
            Err(e) => {
                warn!(email = %cmd.email, reason = %e, "Login rejected");
                metrics::record_login(e.outcome());
            }
        }
        result
    }

    async fn login_inner(&self, cmd: &LoginCommand) -> AuthResult<String> {
        let Some(identity) = self.identities.find_by_email(&cmd.email).await? else {
            if let Some(decoy) = &self.decoy_hash {
                let _ = self.password_hasher.verify(&cmd.password, decoy);
            }
            return Err(AuthError::InvalidCredentials);
        };

        let matches = self
            .password_hasher
            .verify(&cmd.password, &identity.password_hash)
            .map_err(AppError::from)?;
        if !matches {
            return Err(AuthError::InvalidCredentials);
        }

        if identity.locked {
            return Err(AuthError::AccountLocked);
        }
        if self.require_activation_for_login && !identity.enabled {
            return Err(AuthError::AccountDisabled);
        }

        let mut claims = Map::new();
        claims.insert("fullName".to_string(), Value::String(identity.display_name()));
        let token = self
            .token_service
            .issue(claims, &identity.email, &identity.roles)?;

        info!(identity_id = %identity.id, "Login succeeded");
        Ok(token)
    }

    /// 兑换激活码并启用账户
    ///
    /// 激活码已过期时，为同一身份签发并投递新码，返回 `ActivationExpiredResent`。
    pub async fn activate(&self, code: &str) -> AuthResult<Identity> {
        let code = code.trim();
        if code.is_empty() {
            return Err(AuthError::validation("Activation code is required"));
        }
        debug!("Activating account");

        let uow = self.uow_factory.begin().await?;
        let result = self.activate_in(uow.as_ref(), code).await;
        let outcome = finish(uow, result).await;

        match outcome {
            Ok(Activation::Activated(identity)) => {
                metrics::record_activation("success");
                info!(identity_id = %identity.id, "Account activated");
                Ok(identity)
            }
            Ok(Activation::Resent) => {
                metrics::record_activation(AuthError::ActivationExpiredResent.outcome());
                Err(AuthError::ActivationExpiredResent)
            }
            Err(e) => {
                metrics::record_activation(e.outcome());
                Err(e)
            }
        }
    }

    async fn activate_in(&self, uow: &dyn UnitOfWork, code: &str) -> AuthResult<Activation> {
        match self.ledger.redeem(uow, code).await {
            Ok(mut identity) => {
                identity.enable();
                uow.identities().update(&identity).await?;
                Ok(Activation::Activated(identity))
            }
            Err(AuthError::CodeExpired(identity_id)) => {
                let identity = uow
                    .identities()
                    .find_by_id(&identity_id)
                    .await?
                    .ok_or(AuthError::IdentityNotFound)?;

                let fresh = self.ledger.issue_code(uow, &identity).await?;
                self.send_activation_email(&identity, &fresh).await?;

                info!(identity_id = %identity.id, "Expired activation code replaced and resent");
                Ok(Activation::Resent)
            }
            Err(e) => Err(e),
        }
    }

    async fn send_activation_email(
        &self,
        identity: &Identity,
        code: &ActivationCode,
    ) -> AuthResult<()> {
        let full_name = identity.display_name();
        let context = json!({
            "username": full_name,
            "confirmation_url": self.link_base_url,
            "activation_code": code.code,
        });

        self.email_sender
            .send_template_email(
                &identity.email,
                Some(&full_name),
                ACTIVATION_SUBJECT,
                ACTIVATE_ACCOUNT_TEMPLATE,
                &context,
            )
            .await
            .map_err(|e| AuthError::DeliveryFailed(e.to_string()))
    }
}

/// 成功则提交，失败则回滚并返回原始错误
async fn finish<T>(uow: Box<dyn UnitOfWork>, result: AuthResult<T>) -> AuthResult<T> {
    match result {
        Ok(value) => {
            uow.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_err) = uow.rollback().await {
                warn!(error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}
