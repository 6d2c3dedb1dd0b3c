//! 邮件客户端实现

use crate::{EmailConfig, EmailSender, EmailTemplate};
use lettre::message::{Mailbox, MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use shelf_errors::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// 邮件消息
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html_body: String,
    pub text_body: Option<String>,
}

/// 邮件客户端
pub struct EmailClient {
    config: EmailConfig,
    template: Arc<EmailTemplate>,
}

impl EmailClient {
    /// 创建新的邮件客户端
    pub fn new(config: EmailConfig, template: EmailTemplate) -> Self {
        Self {
            config,
            template: Arc::new(template),
        }
    }

    /// 构建 SMTP 传输
    fn build_transport(&self) -> AppResult<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = if self.config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host)
                .map_err(|e| {
                    AppError::internal(format!("Failed to create SMTP transport: {}", e))
                })?
        } else {
            // 本地开发邮件服务器（MailDev 等）不支持 TLS
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
        };

        let mut builder = builder
            .port(self.config.smtp_port)
            .timeout(Some(Duration::from_secs(self.config.timeout_secs)));

        if !self.config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.expose_secret().clone(),
            ));
        }

        Ok(builder.build())
    }

    /// 构建邮件消息
    fn build_message(&self, msg: &EmailMessage) -> AppResult<Message> {
        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| AppError::internal(format!("Invalid from address: {}", e)))?;

        let to = Mailbox::new(
            msg.to_name.clone(),
            msg.to
                .parse()
                .map_err(|e| AppError::validation(format!("Invalid to address: {}", e)))?,
        );

        let html = SinglePart::builder()
            .header(header::ContentType::TEXT_HTML)
            .body(msg.html_body.clone());

        // HTML + 纯文本备用
        let body = match &msg.text_body {
            Some(text) => MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_PLAIN)
                        .body(text.clone()),
                )
                .singlepart(html),
            None => MultiPart::alternative().singlepart(html),
        };

        Message::builder()
            .from(from)
            .to(to)
            .subject(&msg.subject)
            .multipart(body)
            .map_err(|e| AppError::internal(format!("Failed to build message: {}", e)))
    }

    /// 发送邮件
    async fn send_message(&self, message: Message) -> AppResult<()> {
        let transport = self.build_transport()?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::external_service(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl EmailSender for EmailClient {
    async fn send_template_email(
        &self,
        to: &str,
        to_name: Option<&str>,
        subject: &str,
        template_name: &str,
        context: &serde_json::Value,
    ) -> AppResult<()> {
        debug!(to = %to, subject = %subject, template = %template_name, "Sending template email");

        let (html_body, text_body) = self.template.render_pair(template_name, context)?;

        let msg = EmailMessage {
            to: to.to_string(),
            to_name: to_name.map(str::to_string),
            subject: subject.to_string(),
            html_body,
            text_body,
        };

        let message = self.build_message(&msg)?;
        self.send_message(message).await?;

        info!(to = %to, subject = %subject, template = %template_name, "Template email sent successfully");
        Ok(())
    }
}
