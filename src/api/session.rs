// ==========================================
// 商品目录后台 - 管理员会话校验
// ==========================================
// 职责: 校验 HS256 签名的会话令牌（含 exp），要求 role == "admin"
// 说明: 只做校验，令牌签发由登录服务负责
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 管理员角色
pub const ADMIN_ROLE: &str = "admin";

/// 会话令牌载荷
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    /// 用户标识
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub role: String,
    /// 过期时间（unix 秒）
    pub exp: u64,
    #[serde(default)]
    pub iat: Option<u64>,
}

/// 会话校验接口
pub trait SessionGate: Send + Sync {
    /// 校验令牌（可带 `Bearer ` 前缀）
    fn verify(&self, token: &str) -> ApiResult<AdminSession>;
}

/// 基于共享密钥的 JWT 校验
#[derive(Clone)]
pub struct JwtSessionGate {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for JwtSessionGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionGate")
            .field("decoding_key", &"[REDACTED]")
            .finish()
    }
}

impl JwtSessionGate {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl SessionGate for JwtSessionGate {
    fn verify(&self, token: &str) -> ApiResult<AdminSession> {
        let token = token.trim();
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        if token.is_empty() {
            return Err(ApiError::Unauthorized("missing session token".to_string()));
        }

        let data = decode::<AdminSession>(token, &self.decoding_key, &self.validation).map_err(|e| {
            warn!(error = %e, "会话令牌校验失败");
            ApiError::Unauthorized(e.to_string())
        })?;

        let session = data.claims;
        if session.role != ADMIN_ROLE {
            warn!(role = %session.role, "非管理员会话");
            return Err(ApiError::Forbidden("admin role required".to_string()));
        }

        debug!(sub = ?session.sub, "会话校验通过");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &str = "test-secret";

    fn now() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
    }

    fn token(role: &str, exp: u64, secret: &str) -> String {
        let claims = AdminSession {
            sub: Some("1".to_string()),
            email: Some("admin@example.com".to_string()),
            role: role.to_string(),
            exp,
            iat: Some(now()),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_admin_token() {
        let gate = JwtSessionGate::new(SECRET);
        let t = token("admin", now() + 3600, SECRET);

        let session = gate.verify(&format!("Bearer {}", t)).unwrap();
        assert_eq!(session.role, "admin");
        assert_eq!(session.email.as_deref(), Some("admin@example.com"));
    }

    #[test]
    fn test_rejections() {
        let gate = JwtSessionGate::new(SECRET);

        let expired = token("admin", now() - 10, SECRET);
        assert!(matches!(gate.verify(&expired), Err(ApiError::Unauthorized(_))));

        let wrong_key = token("admin", now() + 3600, "other");
        assert!(matches!(gate.verify(&wrong_key), Err(ApiError::Unauthorized(_))));

        let editor = token("editor", now() + 3600, SECRET);
        assert!(matches!(gate.verify(&editor), Err(ApiError::Forbidden(_))));

        assert!(matches!(gate.verify("  "), Err(ApiError::Unauthorized(_))));
    }
}
