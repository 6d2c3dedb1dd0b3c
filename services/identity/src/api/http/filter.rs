//! 请求认证过滤器
//!
//! 每个请求执行一次：公开路由直接放行；携带有效 Bearer 令牌的请求写入
//! `AuthenticatedIdentity`；其余请求以匿名身份继续，由受保护路由的提取器拒绝。

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use once_cell::sync::Lazy;
use regex::Regex;
use shelf_auth_core::TokenService;
use shelf_errors::AppError;
use tracing::{debug, warn};

use super::context::AuthenticatedIdentity;
use crate::domain::repositories::IdentityRepository;
use crate::error::AuthError;
use crate::infrastructure::observability::metrics;

/// 公开路由
static PUBLIC_ROUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/auth/[A-Za-z0-9\-/]*$").unwrap());

const BEARER_PREFIX: &str = "Bearer ";

/// 过滤器依赖
#[derive(Clone)]
pub struct FilterState {
    token_service: Arc<TokenService>,
    identities: Arc<dyn IdentityRepository>,
}

impl FilterState {
    pub fn new(token_service: Arc<TokenService>, identities: Arc<dyn IdentityRepository>) -> Self {
        Self {
            token_service,
            identities,
        }
    }
}

pub fn is_public_route(path: &str) -> bool {
    PUBLIC_ROUTE.is_match(path)
}

/// 提取 `Authorization: Bearer <token>` 中的令牌
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// 认证中间件
///
/// 仅当令牌主体在存储中不存在时返回 401，其余失败均降级为匿名请求。
pub async fn authenticate(
    State(state): State<FilterState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_public_route(request.uri().path()) {
        metrics::record_filter_decision("public");
        return Ok(next.run(request).await);
    }

    let Some(token) = bearer_token(request.headers()).map(str::to_owned) else {
        metrics::record_filter_decision("anonymous");
        return Ok(next.run(request).await);
    };

    let subject = match state.token_service.subject_of(&token) {
        Ok(subject) => subject,
        Err(e) => {
            debug!(error = %e, "Bearer token rejected");
            metrics::record_filter_decision("rejected");
            return Ok(next.run(request).await);
        }
    };

    if request.extensions().get::<AuthenticatedIdentity>().is_none() {
        let identity = state
            .identities
            .find_by_email(&subject)
            .await?
            .ok_or_else(|| {
                warn!(subject = %subject, "Token subject has no identity");
                metrics::record_filter_decision("unknown_subject");
                AppError::from(AuthError::IdentityNotFound)
            })?;

        if state.token_service.is_valid_for(&token, &identity.email) {
            debug!(identity_id = %identity.id, "Request authenticated");
            metrics::record_filter_decision("authenticated");
            request
                .extensions_mut()
                .insert(AuthenticatedIdentity::from(&identity));
        } else {
            metrics::record_filter_decision("rejected");
        }
    }

    Ok(next.run(request).await)
}
