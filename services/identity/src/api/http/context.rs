//! 请求级安全上下文

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use shelf_common::UserId;
use shelf_errors::AppError;

use crate::domain::Identity;

/// 已认证的身份（写入请求扩展）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    pub id: UserId,
    /// Principal（邮箱）
    pub email: String,
    pub full_name: String,
    pub authorities: Vec<String>,
}

impl From<&Identity> for AuthenticatedIdentity {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            full_name: identity.display_name(),
            authorities: identity.roles.clone(),
        }
    }
}

/// 受保护路由的提取器
///
/// 请求未通过认证过滤器时返回 401。
pub struct CurrentIdentity(pub AuthenticatedIdentity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedIdentity>()
            .cloned()
            .map(CurrentIdentity)
            .ok_or_else(|| AppError::unauthenticated("Authentication required"))
    }
}
