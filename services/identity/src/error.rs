//! 身份服务错误

use shelf_auth_core::TokenError;
use shelf_common::UserId;
use shelf_errors::AppError;
use thiserror::Error;

/// 认证错误
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("An account with this email already exists")]
    DuplicateIdentity,

    #[error("Role {0} is not configured")]
    RoleNotConfigured(String),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account is not activated")]
    AccountDisabled,

    #[error("Account is locked")]
    AccountLocked,

    #[error("Identity not found")]
    IdentityNotFound,

    #[error("Activation code not found")]
    CodeNotFound,

    /// 携带激活码所属身份，便于重新发码
    #[error("Activation code has expired")]
    CodeExpired(UserId),

    #[error("Activation code has already been used")]
    CodeAlreadyValidated,

    #[error("Activation code has expired, a new code has been sent")]
    ActivationExpiredResent,

    #[error("Token is invalid")]
    TokenInvalid,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Failed to deliver activation email: {0}")]
    DeliveryFailed(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] AppError),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Metrics 标签
    pub fn outcome(&self) -> &'static str {
        match self {
            Self::DuplicateIdentity => "duplicate",
            Self::RoleNotConfigured(_) => "role_not_configured",
            Self::InvalidCredentials => "invalid_credentials",
            Self::AccountDisabled => "disabled",
            Self::AccountLocked => "locked",
            Self::IdentityNotFound => "identity_not_found",
            Self::CodeNotFound => "not_found",
            Self::CodeExpired(_) => "expired",
            Self::CodeAlreadyValidated => "already_validated",
            Self::ActivationExpiredResent => "expired_resent",
            Self::TokenInvalid => "token_invalid",
            Self::TokenExpired => "token_expired",
            Self::DeliveryFailed(_) => "delivery_failed",
            Self::Validation(_) => "invalid_input",
            Self::Store(_) => "error",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => Self::TokenInvalid,
            TokenError::Expired => Self::TokenExpired,
            other => Self::Store(AppError::internal(other.to_string())),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::DuplicateIdentity => AppError::conflict(err.to_string()),
            AuthError::RoleNotConfigured(_) => AppError::internal(err.to_string()),
            AuthError::InvalidCredentials
            | AuthError::TokenInvalid
            | AuthError::TokenExpired => AppError::unauthenticated(err.to_string()),
            AuthError::AccountDisabled | AuthError::AccountLocked => {
                AppError::forbidden(err.to_string())
            }
            AuthError::IdentityNotFound => AppError::unauthorized(err.to_string()),
            AuthError::CodeNotFound => AppError::not_found(err.to_string()),
            AuthError::CodeExpired(_) | AuthError::ActivationExpiredResent => {
                AppError::gone(err.to_string())
            }
            AuthError::CodeAlreadyValidated => AppError::conflict(err.to_string()),
            AuthError::DeliveryFailed(_) => AppError::external_service(err.to_string()),
            AuthError::Validation(msg) => AppError::validation(msg),
            AuthError::Store(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        let cases = [
            (AuthError::DuplicateIdentity, 409),
            (AuthError::InvalidCredentials, 401),
            (AuthError::AccountDisabled, 403),
            (AuthError::IdentityNotFound, 401),
            (AuthError::CodeNotFound, 404),
            (AuthError::CodeAlreadyValidated, 409),
            (AuthError::ActivationExpiredResent, 410),
            (AuthError::DeliveryFailed("smtp down".into()), 502),
            (AuthError::validation("bad email"), 400),
            (AuthError::RoleNotConfigured("USER".into()), 500),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status_code(), status);
        }
    }

    #[test]
    fn test_store_error_passes_through() {
        let err = AuthError::from(AppError::database("connection reset"));
        assert!(matches!(AppError::from(err), AppError::Database(_)));
    }

    #[test]
    fn test_token_errors() {
        assert!(matches!(
            AuthError::from(TokenError::Invalid),
            AuthError::TokenInvalid
        ));
        assert!(matches!(
            AuthError::from(TokenError::Expired),
            AuthError::TokenExpired
        ));
        assert!(matches!(
            AuthError::from(TokenError::Signing("boom".into())),
            AuthError::Store(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_resend_problem_detail_mentions_new_code() {
        let problem = AppError::from(AuthError::ActivationExpiredResent).to_problem_details();
        assert_eq!(problem.status, 410);
        assert!(problem.detail.contains("new code"));
    }
}
