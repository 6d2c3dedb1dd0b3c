//! Email 适配器
//!
//! 提供邮件发送功能，支持：
//! - SMTP 邮件发送
//! - 模板渲染（HTML + 纯文本）

mod client;
mod template;

pub use client::{EmailClient, EmailMessage};
pub use shelf_config::EmailConfig;
pub use template::{ACTIVATE_ACCOUNT_TEMPLATE, EmailTemplate};

use shelf_errors::AppResult;

/// 邮件发送接口
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    /// 发送模板邮件
    ///
    /// 渲染 `{template_name}.html`，存在 `{template_name}.txt` 时一并作为纯文本备用。
    async fn send_template_email(
        &self,
        to: &str,
        to_name: Option<&str>,
        subject: &str,
        template_name: &str,
        context: &serde_json::Value,
    ) -> AppResult<()>;
}
