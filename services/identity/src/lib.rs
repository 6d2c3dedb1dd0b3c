//! shelf-identity - 身份服务
//!
//! Bearer 令牌认证与账户激活：
//! - 注册（禁用账户 + 一次性激活码邮件）
//! - 激活码兑换，过期自动重发
//! - 凭证登录签发 JWT
//! - 请求认证过滤器

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

mod app;

pub use app::build_router;
pub use error::{AuthError, AuthResult};
