//! shelf-auth-core - 认证核心库
//!
//! Bearer 令牌的签发与校验（HS256）。令牌完全自包含，服务端不保存任何状态。

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// HS256 密钥最小长度（字节）
pub const MIN_SECRET_LEN: usize = 32;

/// 由 codec 自行写入、调用方无法覆盖的声明
const RESERVED_CLAIMS: &[&str] = &["sub", "iat", "exp", "authorities"];

/// 令牌错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token is invalid")]
    Invalid,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid signing key: {0}")]
    InvalidKey(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

pub type TokenResult<T> = Result<T, TokenError>;

/// JWT Claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject（用户邮箱）
    pub sub: String,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
    /// 角色/权限
    #[serde(default)]
    pub authorities: Vec<String>,
    /// 调用方附加的声明（如 `fullName`）
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Token 服务
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in: i64,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("expires_in", &self.expires_in)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// 使用原始密钥字节创建
    pub fn new(secret: &[u8], expires_in_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expires_in: expires_in_secs,
        }
    }

    /// 使用 Base64 编码的密钥创建
    pub fn from_base64_secret(secret: &str, expires_in_secs: i64) -> TokenResult<Self> {
        let key = STANDARD
            .decode(secret.trim())
            .map_err(|e| TokenError::InvalidKey(format!("secret is not valid base64: {}", e)))?;

        if key.len() < MIN_SECRET_LEN {
            return Err(TokenError::InvalidKey(format!(
                "secret must decode to at least {} bytes, got {}",
                MIN_SECRET_LEN,
                key.len()
            )));
        }

        Ok(Self::new(&key, expires_in_secs))
    }

    /// 签发令牌
    ///
    /// `authorities` 会写入 `authorities` 声明；`claims` 中与保留声明同名的键被丢弃。
    pub fn issue(
        &self,
        claims: Map<String, Value>,
        subject: &str,
        authorities: &[String],
    ) -> TokenResult<String> {
        let now = Utc::now();
        let mut extra = claims;
        for reserved in RESERVED_CLAIMS {
            extra.remove(*reserved);
        }

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.expires_in)).timestamp(),
            authorities: authorities.to_vec(),
            extra,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// 校验令牌并返回声明
    ///
    /// 签名或结构错误返回 `Invalid`；`now >= exp` 返回 `Expired`。
    pub fn verify(&self, token: &str) -> TokenResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        // 过期时间在下面显式检查（零容差，边界时刻视为过期）
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| TokenError::Invalid)?
            .claims;

        if Utc::now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }

    /// 提取令牌主体
    pub fn subject_of(&self, token: &str) -> TokenResult<String> {
        self.verify(token).map(|claims| claims.sub)
    }

    /// 令牌是否属于 `expected_subject` 且未过期
    pub fn is_valid_for(&self, token: &str, expected_subject: &str) -> bool {
        matches!(self.verify(token), Ok(claims) if claims.sub == expected_subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use serde_json::json;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn service(ttl: i64) -> TokenService {
        TokenService::new(SECRET, ttl)
    }

    fn full_name_claims() -> Map<String, Value> {
        let mut claims = Map::new();
        claims.insert("fullName".to_string(), json!("Ada Lovelace"));
        claims
    }

    fn tamper_signature(token: &str) -> String {
        let (head, signature) = token.rsplit_once('.').unwrap();
        let mut bytes = URL_SAFE_NO_PAD.decode(signature).unwrap();
        bytes[0] ^= 0x01;
        format!("{}.{}", head, URL_SAFE_NO_PAD.encode(bytes))
    }

    #[test]
    fn test_issue_then_verify_roundtrip() {
        let service = service(3600);
        let authorities = vec!["USER".to_string(), "ADMIN".to_string()];

        let token = service
            .issue(full_name_claims(), "a@x.com", &authorities)
            .unwrap();
        let claims = service.verify(&token).unwrap();

        assert_eq!(claims.sub, "a@x.com");
        assert_eq!(claims.authorities, authorities);
        assert_eq!(claims.extra["fullName"], "Ada Lovelace");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_reserved_claims_cannot_be_overridden() {
        let service = service(3600);
        let mut claims = Map::new();
        claims.insert("sub".to_string(), json!("mallory@x.com"));
        claims.insert("authorities".to_string(), json!(["ADMIN"]));
        claims.insert("exp".to_string(), json!(i64::MAX));

        let token = service
            .issue(claims, "a@x.com", &["USER".to_string()])
            .unwrap();
        let decoded = service.verify(&token).unwrap();

        assert_eq!(decoded.sub, "a@x.com");
        assert_eq!(decoded.authorities, vec!["USER".to_string()]);
        assert_eq!(decoded.exp - decoded.iat, 3600);
        assert!(decoded.extra.is_empty());
    }

    #[test]
    fn test_altered_signature_is_invalid() {
        let service = service(3600);
        let token = service.issue(Map::new(), "a@x.com", &[]).unwrap();

        let tampered = tamper_signature(&token);

        assert_eq!(service.verify(&tampered), Err(TokenError::Invalid));
    }

    #[test]
    fn test_altered_payload_is_invalid() {
        let service = service(3600);
        let token = service.issue(Map::new(), "a@x.com", &[]).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(
            json!({ "sub": "mallory@x.com", "iat": 0, "exp": i64::MAX, "authorities": ["ADMIN"] })
                .to_string(),
        );
        parts[1] = &forged;

        assert_eq!(service.verify(&parts.join(".")), Err(TokenError::Invalid));
    }

    #[test]
    fn test_token_signed_with_other_key_is_invalid() {
        let other = TokenService::new(b"ffffffffffffffffffffffffffffffff", 3600);
        let token = other.issue(Map::new(), "a@x.com", &[]).unwrap();

        assert_eq!(service(3600).verify(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn test_malformed_token_is_invalid() {
        let service = service(3600);
        assert_eq!(service.verify(""), Err(TokenError::Invalid));
        assert_eq!(service.verify("not.a.jwt"), Err(TokenError::Invalid));
        assert_eq!(service.verify("abc"), Err(TokenError::Invalid));
    }

    #[test]
    fn test_zero_ttl_is_expired_immediately() {
        let service = service(0);
        let token = service.issue(Map::new(), "a@x.com", &[]).unwrap();

        assert_eq!(service.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_past_expiry_is_expired_with_intact_signature() {
        let service = service(-60);
        let token = service.issue(Map::new(), "a@x.com", &[]).unwrap();

        assert_eq!(service.verify(&token), Err(TokenError::Expired));
        assert!(!service.is_valid_for(&token, "a@x.com"));
    }

    #[test]
    fn test_subject_of() {
        let service = service(3600);
        let token = service.issue(Map::new(), "a@x.com", &[]).unwrap();

        assert_eq!(service.subject_of(&token).unwrap(), "a@x.com");
        assert_eq!(service.subject_of("garbage"), Err(TokenError::Invalid));
    }

    #[test]
    fn test_is_valid_for_requires_matching_subject() {
        let service = service(3600);
        let token = service.issue(Map::new(), "a@x.com", &[]).unwrap();

        assert!(service.is_valid_for(&token, "a@x.com"));
        assert!(!service.is_valid_for(&token, "b@x.com"));
        assert!(!service.is_valid_for("garbage", "a@x.com"));
    }

    #[test]
    fn test_from_base64_secret() {
        let encoded = STANDARD.encode(SECRET);
        let service = TokenService::from_base64_secret(&encoded, 60).unwrap();
        let token = service.issue(Map::new(), "a@x.com", &[]).unwrap();

        assert!(TokenService::new(SECRET, 60).is_valid_for(&token, "a@x.com"));
    }

    #[test]
    fn test_from_base64_secret_rejects_short_or_garbled_keys() {
        let short = STANDARD.encode(b"too-short");
        assert!(matches!(
            TokenService::from_base64_secret(&short, 60),
            Err(TokenError::InvalidKey(_))
        ));
        assert!(matches!(
            TokenService::from_base64_secret("%%%not base64%%%", 60),
            Err(TokenError::InvalidKey(_))
        ));
    }

    #[test]
    fn test_debug_does_not_leak_key_material() {
        let debug = format!("{:?}", service(60));
        assert!(debug.contains("expires_in"));
        assert!(!debug.contains("0123456789abcdef"));
    }
}
