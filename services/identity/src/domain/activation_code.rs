//! 激活码实体

use chrono::{DateTime, Duration, Utc};
use shelf_common::UserId;
use uuid::Uuid;

/// 激活码 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActivationCodeId(pub Uuid);

impl ActivationCodeId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for ActivationCodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ActivationCodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 激活码状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationCodeState {
    Pending,
    Validated,
    Expired,
}

/// 激活码兑换失败原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RedeemRejection {
    #[error("Activation code has already been used")]
    AlreadyValidated,
    #[error("Activation code has expired")]
    Expired,
}

/// 一次性激活码
///
/// `validated_at` 一旦写入便不再改变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationCode {
    pub id: ActivationCodeId,
    /// 定长数字串
    pub code: String,
    pub identity_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub validated_at: Option<DateTime<Utc>>,
}

impl ActivationCode {
    /// 创建新的激活码，有效期为 `window`
    pub fn new(identity_id: UserId, code: impl Into<String>, window: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: ActivationCodeId::new(),
            code: code.into(),
            identity_id,
            created_at: now,
            expires_at: now + window,
            validated_at: None,
        }
    }

    pub fn state_at(&self, now: DateTime<Utc>) -> ActivationCodeState {
        if self.validated_at.is_some() {
            ActivationCodeState::Validated
        } else if now > self.expires_at {
            ActivationCodeState::Expired
        } else {
            ActivationCodeState::Pending
        }
    }

    /// 兑换激活码
    pub fn redeem_at(&mut self, now: DateTime<Utc>) -> Result<(), RedeemRejection> {
        match self.state_at(now) {
            ActivationCodeState::Validated => Err(RedeemRejection::AlreadyValidated),
            ActivationCodeState::Expired => Err(RedeemRejection::Expired),
            ActivationCodeState::Pending => {
                self.validated_at = Some(now);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(window: Duration) -> ActivationCode {
        ActivationCode::new(UserId::new(), "123456", window)
    }

    #[test]
    fn test_new_code_is_pending() {
        let code = code(Duration::minutes(5));
        assert_eq!(code.state_at(Utc::now()), ActivationCodeState::Pending);
        assert_eq!(code.expires_at - code.created_at, Duration::minutes(5));
    }

    #[test]
    fn test_redeem_sets_validation_timestamp_once() {
        let mut code = code(Duration::minutes(5));
        let first = Utc::now();

        code.redeem_at(first).unwrap();
        assert_eq!(code.validated_at, Some(first));

        let later = first + Duration::seconds(10);
        assert_eq!(code.redeem_at(later), Err(RedeemRejection::AlreadyValidated));
        assert_eq!(code.validated_at, Some(first));
    }

    #[test]
    fn test_expired_code_cannot_be_redeemed() {
        let mut code = code(Duration::minutes(5));
        let after_expiry = code.expires_at + Duration::seconds(1);

        assert_eq!(code.redeem_at(after_expiry), Err(RedeemRejection::Expired));
        assert!(code.validated_at.is_none());
        assert_eq!(code.state_at(after_expiry), ActivationCodeState::Expired);
    }

    #[test]
    fn test_code_is_pending_at_exact_expiry() {
        let code = code(Duration::minutes(5));
        assert_eq!(code.state_at(code.expires_at), ActivationCodeState::Pending);
    }

    #[test]
    fn test_validated_code_never_reports_expired() {
        let mut code = code(Duration::minutes(5));
        code.redeem_at(Utc::now()).unwrap();
        let far_future = code.expires_at + Duration::days(30);
        assert_eq!(code.state_at(far_future), ActivationCodeState::Validated);
    }
}
