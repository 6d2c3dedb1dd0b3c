//! 集成测试公共设施

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use shelf_adapter_email::EmailSender;
use shelf_auth_core::TokenService;
use shelf_config::ActivationConfig;
use shelf_errors::{AppError, AppResult};
use shelf_identity::application::{AuthenticationService, RegisterCommand};
use shelf_identity::domain::services::Argon2PasswordHasher;
use shelf_identity::infrastructure::persistence::InMemoryStore;

pub const SECRET: &[u8] = b"integration-test-signing-key-0123456789";

/// 记录下来的邮件
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub template: String,
    pub context: serde_json::Value,
}

impl SentEmail {
    pub fn activation_code(&self) -> String {
        self.context["activation_code"]
            .as_str()
            .unwrap_or_default()
            .to_string()
    }
}

/// 记录所有邮件的 EmailSender
#[derive(Default)]
pub struct RecordingEmailSender {
    sent: Mutex<Vec<SentEmail>>,
    fail: bool,
}

impl RecordingEmailSender {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last(&self) -> SentEmail {
        self.sent().last().cloned().expect("no email sent")
    }
}

#[async_trait::async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_template_email(
        &self,
        to: &str,
        to_name: Option<&str>,
        subject: &str,
        template_name: &str,
        context: &serde_json::Value,
    ) -> AppResult<()> {
        if self.fail {
            return Err(AppError::external_service("SMTP server unavailable"));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            to_name: to_name.map(str::to_string),
            subject: subject.to_string(),
            template: template_name.to_string(),
            context: context.clone(),
        });
        Ok(())
    }
}

pub fn activation_config() -> ActivationConfig {
    ActivationConfig {
        code_length: 6,
        window_minutes: 5,
        link_base_url: "http://localhost:4200/activate-account".to_string(),
        require_for_login: true,
        baseline_role: "USER".to_string(),
    }
}

/// 基于内存存储的测试上下文
pub struct TestContext {
    pub store: InMemoryStore,
    pub emails: Arc<RecordingEmailSender>,
    pub tokens: Arc<TokenService>,
    pub service: Arc<AuthenticationService>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(
            InMemoryStore::with_roles(["USER"]),
            RecordingEmailSender::default(),
            activation_config(),
            3600,
        )
    }

    pub fn build(
        store: InMemoryStore,
        emails: RecordingEmailSender,
        config: ActivationConfig,
        token_ttl: i64,
    ) -> Self {
        let emails = Arc::new(emails);
        let tokens = Arc::new(TokenService::new(SECRET, token_ttl));
        let service = Arc::new(AuthenticationService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(Argon2PasswordHasher::new()),
            tokens.clone(),
            emails.clone(),
            &config,
        ));

        Self {
            store,
            emails,
            tokens,
            service,
        }
    }

    pub fn with_config(config: ActivationConfig) -> Self {
        Self::build(
            InMemoryStore::with_roles(["USER"]),
            RecordingEmailSender::default(),
            config,
            3600,
        )
    }

    pub fn register_command(email: &str) -> RegisterCommand {
        RegisterCommand::new(email, "Ada", "Lovelace", "pw123456")
    }

    /// 注册并返回邮件中的激活码
    pub async fn register(&self, email: &str) -> String {
        self.service
            .register(Self::register_command(email))
            .await
            .unwrap();
        self.emails.last().activation_code()
    }
}
