//! 密码哈希

use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng,
    },
};
use shelf_errors::AppError;
use thiserror::Error;

/// 密码错误
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        AppError::internal(err.to_string())
    }
}

/// 密码哈希接口
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, raw: &str) -> Result<String, PasswordError>;

    fn verify(&self, raw: &str, hash: &str) -> Result<bool, PasswordError>;
}

/// Argon2id（PHC 字符串格式）
#[derive(Debug, Clone, Default)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, raw: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(raw.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    fn verify(&self, raw: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;
        Ok(self.argon2.verify_password(raw.as_bytes(), &parsed).is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_password_correct() {
        let hasher = Argon2PasswordHasher::new();
        let hash = hasher.hash("Test1234!").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("Test1234!", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hasher = Argon2PasswordHasher::new();
        let hash = hasher.hash("Test1234!").unwrap();
        assert!(!hasher.verify("WrongPassword!", &hash).unwrap());
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        let hasher = Argon2PasswordHasher::new();
        // 盐不同
        assert_ne!(hasher.hash("Test1234!").unwrap(), hasher.hash("Test1234!").unwrap());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        let hasher = Argon2PasswordHasher::new();
        assert!(matches!(
            hasher.verify("Test1234!", "not-a-phc-string"),
            Err(PasswordError::InvalidHash(_))
        ));
    }
}
