//! 命令

use crate::error::{AuthError, AuthResult};

const MAX_PASSWORD_LEN: usize = 128;
const MAX_NAME_LEN: usize = 100;

/// 注册命令
#[derive(Clone)]
pub struct RegisterCommand {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl RegisterCommand {
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into().trim().to_string(),
            first_name: first_name.into().trim().to_string(),
            last_name: last_name.into().trim().to_string(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> AuthResult<()> {
        if !email_address::EmailAddress::is_valid(&self.email) {
            return Err(AuthError::validation("Email is not well formed"));
        }
        validate_name("First name", &self.first_name)?;
        validate_name("Last name", &self.last_name)?;

        if self.password.is_empty() {
            return Err(AuthError::validation("Password is required"));
        }
        if self.password.chars().count() > MAX_PASSWORD_LEN {
            return Err(AuthError::validation(format!(
                "Password must be at most {} characters",
                MAX_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

// 密码不出现在日志中
impl std::fmt::Debug for RegisterCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterCommand")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

fn validate_name(field: &str, value: &str) -> AuthResult<()> {
    if value.is_empty() {
        return Err(AuthError::validation(format!("{} is required", field)));
    }
    if value.chars().count() > MAX_NAME_LEN {
        return Err(AuthError::validation(format!(
            "{} must be at most {} characters",
            field, MAX_NAME_LEN
        )));
    }
    Ok(())
}

/// 登录命令
#[derive(Clone)]
pub struct LoginCommand {
    pub email: String,
    pub password: String,
}

impl LoginCommand {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into().trim().to_string(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCommand")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> RegisterCommand {
        RegisterCommand::new(" a@x.com ", "Ada", "Lovelace", "pw123456")
    }

    #[test]
    fn test_valid_command_trims_fields() {
        let cmd = valid();
        assert_eq!(cmd.email, "a@x.com");
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn test_rejects_malformed_email() {
        let cmd = RegisterCommand { email: "not-an-email".into(), ..valid() };
        assert!(matches!(cmd.validate(), Err(AuthError::Validation(_))));
    }

    #[test]
    fn test_rejects_blank_names() {
        let cmd = RegisterCommand::new("a@x.com", "   ", "Lovelace", "pw123456");
        assert!(matches!(cmd.validate(), Err(AuthError::Validation(_))));
    }

    #[test]
    fn test_password_length_bounds() {
        let empty = RegisterCommand { password: String::new(), ..valid() };
        let short = RegisterCommand { password: "pw123".into(), ..valid() };
        let long = RegisterCommand { password: "x".repeat(129), ..valid() };
        let max = RegisterCommand { password: "x".repeat(128), ..valid() };

        assert!(empty.validate().is_err());
        assert!(short.validate().is_ok());
        assert!(long.validate().is_err());
        assert!(max.validate().is_ok());
    }

    #[test]
    fn test_debug_hides_password() {
        let debug = format!("{:?}", valid());
        assert!(!debug.contains("pw123456"));
        let debug = format!("{:?}", LoginCommand::new("a@x.com", "pw123456"));
        assert!(!debug.contains("pw123456"));
    }
}
