//! 激活码账本
//!
//! 生成、持久化并兑换一次性激活码。

use chrono::{Duration, Utc};
use rand::Rng;
use rand::rngs::OsRng;
use shelf_config::ActivationConfig;
use shelf_errors::AppError;
use tracing::{debug, info, warn};

use crate::domain::unit_of_work::UnitOfWork;
use crate::domain::{ActivationCode, Identity};
use crate::domain::activation_code::RedeemRejection;
use crate::error::{AuthError, AuthResult};

/// 与已签发码冲突时的最大重抽次数
const MAX_DRAWS: usize = 16;

/// 激活码账本
#[derive(Debug, Clone)]
pub struct ActivationLedger {
    code_length: usize,
    window: Duration,
}

impl ActivationLedger {
    pub fn new(code_length: usize, window: Duration) -> Self {
        Self {
            code_length: code_length.max(1),
            window,
        }
    }

    pub fn from_config(config: &ActivationConfig) -> Self {
        Self::new(config.code_length, Duration::minutes(config.window_minutes))
    }

    /// 生成定长数字码，每一位独立均匀地取自 0-9
    pub fn generate_code(&self) -> String {
        let mut rng = OsRng;
        (0..self.code_length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }

    /// 为身份签发新激活码并持久化
    ///
    /// 码值在全部历史记录中唯一，已过期或已兑换的码值也不会再签发给其他身份。
    pub async fn issue_code(
        &self,
        uow: &dyn UnitOfWork,
        identity: &Identity,
    ) -> AuthResult<ActivationCode> {
        for _ in 0..MAX_DRAWS {
            let value = self.generate_code();
            if uow.activation_codes().exists_by_code(&value).await? {
                debug!(identity_id = %identity.id, "Activation code collided with an issued code, redrawing");
                continue;
            }

            let code = ActivationCode::new(identity.id.clone(), value, self.window);
            uow.activation_codes().save(&code).await?;

            info!(
                identity_id = %identity.id,
                activation_code_id = %code.id,
                expires_at = %code.expires_at,
                "Activation code issued"
            );
            return Ok(code);
        }

        Err(AuthError::Store(AppError::internal(
            "Could not draw a unique activation code",
        )))
    }

    /// 兑换激活码，返回其绑定的身份
    ///
    /// 过期时返回 `CodeExpired`，由调用方重新签发并投递。
    pub async fn redeem(&self, uow: &dyn UnitOfWork, value: &str) -> AuthResult<Identity> {
        let mut code = uow
            .activation_codes()
            .find_by_code_for_update(value)
            .await?
            .ok_or_else(|| {
                warn!("Activation code not found");
                AuthError::CodeNotFound
            })?;

        code.redeem_at(Utc::now()).map_err(|rejection| {
            warn!(activation_code_id = %code.id, reason = %rejection, "Activation code rejected");
            match rejection {
                RedeemRejection::AlreadyValidated => AuthError::CodeAlreadyValidated,
                RedeemRejection::Expired => AuthError::CodeExpired(code.identity_id.clone()),
            }
        })?;

        uow.activation_codes()
            .mark_validated(&code)
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => AuthError::CodeAlreadyValidated,
                other => AuthError::Store(other),
            })?;

        let identity = uow
            .identities()
            .find_by_id(&code.identity_id)
            .await?
            .ok_or(AuthError::IdentityNotFound)?;

        info!(identity_id = %identity.id, activation_code_id = %code.id, "Activation code redeemed");
        Ok(identity)
    }
}
