//! 邮件模板系统

use shelf_errors::{AppError, AppResult};
use std::collections::HashMap;
use tera::Tera;
use tracing::debug;

/// 账户激活模板名
pub const ACTIVATE_ACCOUNT_TEMPLATE: &str = "activate_account";

const ACTIVATE_ACCOUNT_HTML: &str = include_str!("../templates/activate_account.html");
const ACTIVATE_ACCOUNT_TXT: &str = include_str!("../templates/activate_account.txt");

/// 邮件模板管理器
pub struct EmailTemplate {
    tera: Tera,
}

impl EmailTemplate {
    /// 从目录加载模板（`*.html` 与 `*.txt`）
    pub fn new(template_dir: &str) -> AppResult<Self> {
        let pattern = format!("{}/**/*.{{html,txt}}", template_dir);
        let tera = Tera::new(&pattern)
            .map_err(|e| AppError::internal(format!("Failed to load email templates: {}", e)))?;

        debug!(template_dir = %template_dir, "Email templates loaded");

        Ok(Self { tera })
    }

    /// 内置模板
    pub fn builtin() -> AppResult<Self> {
        let mut templates = HashMap::new();
        templates.insert(
            format!("{}.html", ACTIVATE_ACCOUNT_TEMPLATE),
            ACTIVATE_ACCOUNT_HTML.to_string(),
        );
        templates.insert(
            format!("{}.txt", ACTIVATE_ACCOUNT_TEMPLATE),
            ACTIVATE_ACCOUNT_TXT.to_string(),
        );
        Self::from_strings(templates)
    }

    /// 从内存中的模板字符串创建
    pub fn from_strings(templates: HashMap<String, String>) -> AppResult<Self> {
        let mut tera = Tera::default();

        for (name, content) in templates {
            tera.add_raw_template(&name, &content).map_err(|e| {
                AppError::internal(format!("Failed to add template {}: {}", name, e))
            })?;
        }

        Ok(Self { tera })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// 渲染模板
    pub fn render(&self, template_name: &str, context: &serde_json::Value) -> AppResult<String> {
        let context = tera::Context::from_serialize(context)
            .map_err(|e| AppError::internal(format!("Failed to create template context: {}", e)))?;

        self.tera.render(template_name, &context).map_err(|e| {
            AppError::internal(format!(
                "Failed to render template {}: {}",
                template_name, e
            ))
        })
    }

    /// 渲染 HTML 与可选的纯文本版本
    pub fn render_pair(
        &self,
        template_name: &str,
        context: &serde_json::Value,
    ) -> AppResult<(String, Option<String>)> {
        let html = self.render(&format!("{}.html", template_name), context)?;

        let text_name = format!("{}.txt", template_name);
        let text = if self.has_template(&text_name) {
            Some(self.render(&text_name, context)?)
        } else {
            None
        };

        Ok((html, text))
    }

    /// 渲染账户激活邮件
    pub fn render_activate_account(
        &self,
        username: &str,
        confirmation_url: &str,
        activation_code: &str,
    ) -> AppResult<(String, Option<String>)> {
        let context = serde_json::json!({
            "username": username,
            "confirmation_url": confirmation_url,
            "activation_code": activation_code,
        });
        self.render_pair(ACTIVATE_ACCOUNT_TEMPLATE, &context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_from_strings() {
        let mut templates = HashMap::new();
        templates.insert(
            "test.html".to_string(),
            "<h1>Hello {{ name }}!</h1>".to_string(),
        );

        let template = EmailTemplate::from_strings(templates).unwrap();

        let context = serde_json::json!({
            "name": "World"
        });

        let result = template.render("test.html", &context).unwrap();
        assert_eq!(result, "<h1>Hello World!</h1>");
    }

    #[test]
    fn test_render_pair_without_text_variant() {
        let mut templates = HashMap::new();
        templates.insert("only.html".to_string(), "<p>{{ v }}</p>".to_string());
        let template = EmailTemplate::from_strings(templates).unwrap();

        let (html, text) = template
            .render_pair("only", &serde_json::json!({ "v": "x" }))
            .unwrap();

        assert_eq!(html, "<p>x</p>");
        assert!(text.is_none());
    }

    #[test]
    fn test_builtin_activate_account() {
        let template = EmailTemplate::builtin().unwrap();

        let (html, text) = template
            .render_activate_account(
                "Ada Lovelace",
                "http://localhost:4200/activate-account",
                "042917",
            )
            .unwrap();

        assert!(html.contains("Ada Lovelace"));
        assert!(html.contains("activate-account"));
        assert!(html.contains("042917"));
        let text = text.unwrap();
        assert!(text.contains("042917"));
        assert!(text.contains("Ada Lovelace"));
    }

    #[test]
    fn test_missing_variable_fails() {
        let template = EmailTemplate::builtin().unwrap();
        let result = template.render("activate_account.html", &serde_json::json!({}));
        assert!(result.is_err());
    }
}
