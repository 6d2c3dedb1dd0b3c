//! 身份实体

use shelf_common::{AuditInfo, UserId};

/// 身份（账户）
///
/// 以邮箱作为唯一键和令牌主体。注册后处于禁用状态，只有激活成功才会启用。
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub enabled: bool,
    pub locked: bool,
    /// 角色名（有序）
    pub roles: Vec<String>,
    pub audit_info: AuditInfo,
}

impl Identity {
    /// 注册新身份（禁用、未锁定）
    pub fn register(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        password_hash: impl Into<String>,
        roles: Vec<String>,
    ) -> Self {
        Self {
            id: UserId::new(),
            email: email.into(),
            password_hash: password_hash.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            enabled: false,
            locked: false,
            roles,
            audit_info: AuditInfo::default(),
        }
    }

    /// 显示名称："first last"
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// 启用账户
    pub fn enable(&mut self) {
        if !self.enabled {
            self.enabled = true;
            self.audit_info.update(Some(self.id.clone()));
        }
    }
}

// password_hash 不出现在日志中
impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("enabled", &self.enabled)
            .field("locked", &self.locked)
            .field("roles", &self.roles)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::register("a@x.com", "Ada", "Lovelace", "$argon2id$hash", vec!["USER".into()])
    }

    #[test]
    fn test_register_starts_disabled() {
        let identity = identity();
        assert!(!identity.enabled);
        assert!(!identity.locked);
        assert_eq!(identity.roles, vec!["USER".to_string()]);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(identity().display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_enable_is_idempotent() {
        let mut identity = identity();
        identity.enable();
        let updated_at = identity.audit_info.updated_at;
        identity.enable();
        assert!(identity.enabled);
        assert_eq!(identity.audit_info.updated_at, updated_at);
    }

    #[test]
    fn test_debug_hides_password_hash() {
        let debug = format!("{:?}", identity());
        assert!(!debug.contains("argon2id"));
    }
}
