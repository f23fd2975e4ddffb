//! JWT token service

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use dashmap::DashMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use moka::sync::Cache;
use serde::Serialize;

use aequora_common::AequoraError;
use aequora_persistence::entity::sea_orm_active_enums::Role;

use crate::model::{JwtPayload, MIN_SECRET_KEY_BYTES};

/// Freshly issued token
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

/// Issues, verifies and revokes HS256 tokens.
///
/// Verified claims are cached for five minutes so hot tokens skip the
/// signature check. Revoked tokens are kept, with their expiry, until they
/// would have expired anyway; the revocation list is never evicted early, so
/// its size is bounded by the logouts within one token lifetime.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expire_seconds: i64,
    cache: Cache<String, JwtPayload>,
    revoked: DashMap<String, i64>,
}

impl TokenService {
    /// Build a token service from a base64 encoded secret
    pub fn new(secret_key: &str, expire_seconds: i64) -> anyhow::Result<Self> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(secret_key)
            .map_err(|e| AequoraError::ConfigError(format!("token secret is not base64: {}", e)))?;

        if decoded.len() < MIN_SECRET_KEY_BYTES {
            return Err(AequoraError::ConfigError(format!(
                "token secret must decode to at least {} bytes",
                MIN_SECRET_KEY_BYTES
            ))
            .into());
        }

        if expire_seconds <= 0 {
            return Err(
                AequoraError::ConfigError("token expiry must be positive".to_string()).into(),
            );
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&decoded),
            decoding_key: DecodingKey::from_secret(&decoded),
            expire_seconds,
            cache: Cache::builder()
                .max_capacity(10_000)
                .time_to_live(Duration::from_secs(300)) // 5 minutes TTL
                .build(),
            revoked: DashMap::new(),
        })
    }

    pub fn expire_seconds(&self) -> i64 {
        self.expire_seconds
    }

    /// Encode a token for the given user
    pub fn issue(&self, user_id: i32, role: Role) -> jsonwebtoken::errors::Result<IssuedToken> {
        self.issue_with_ttl(user_id, role, self.expire_seconds)
    }

    fn issue_with_ttl(
        &self,
        user_id: i32,
        role: Role,
        ttl_seconds: i64,
    ) -> jsonwebtoken::errors::Result<IssuedToken> {
        let exp = chrono::Utc::now()
            .checked_add_signed(chrono::Duration::seconds(ttl_seconds))
            .unwrap_or_else(chrono::Utc::now)
            .timestamp();

        let payload = JwtPayload {
            sub: user_id.to_string(),
            role,
            exp,
        };

        let token = encode(&Header::new(Algorithm::HS256), &payload, &self.encoding_key)?;

        Ok(IssuedToken {
            token,
            expires_in: ttl_seconds,
        })
    }

    /// Decode and validate a token, consulting the cache first
    pub fn verify(&self, token: &str) -> jsonwebtoken::errors::Result<JwtPayload> {
        if self.revoked.contains_key(token) {
            return Err(ErrorKind::InvalidToken.into());
        }

        if let Some(cached) = self.cache.get(token) {
            if cached.exp > chrono::Utc::now().timestamp() {
                return Ok(cached);
            }
            // Token expired in cache, invalidate it
            self.cache.invalidate(token);
        }

        let data = decode::<JwtPayload>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )?;

        self.cache.insert(token.to_string(), data.claims.clone());

        Ok(data.claims)
    }

    /// Revoke a token until it would have expired anyway. Tokens that no
    /// longer verify need no entry.
    pub fn revoke(&self, token: &str) {
        let cached = self.cache.get(token);
        self.cache.invalidate(token);

        let exp = match cached {
            Some(claims) => claims.exp,
            None => match decode::<JwtPayload>(token, &self.decoding_key, &Validation::new(Algorithm::HS256)) {
                Ok(data) => data.claims.exp,
                Err(_) => return,
            },
        };

        self.revoked.insert(token.to_string(), exp);
    }

    /// Drop revocations of tokens that have expired. Returns how many went.
    pub fn purge_revoked(&self) -> usize {
        let now = chrono::Utc::now().timestamp();
        let before = self.revoked.len();
        self.revoked.retain(|_, exp| *exp > now);
        before - self.revoked.len()
    }

    pub fn revoked_len(&self) -> usize {
        self.revoked.len()
    }
}

/// Periodically forget revocations of expired tokens
pub fn start_revocation_cleanup_task(tokens: Arc<TokenService>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let purged = tokens.purge_revoked();
            tracing::debug!(purged, remaining = tokens.revoked_len(), "Token revocation cleanup completed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> String {
        base64::engine::general_purpose::STANDARD
            .encode("aequora-test-secret-key-with-enough-bytes")
    }

    #[test]
    fn test_issue_and_verify() {
        let service = TokenService::new(&secret(), 3600).unwrap();
        let issued = service.issue(7, Role::Resident).unwrap();
        assert_eq!(issued.expires_in, 3600);

        let claims = service.verify(&issued.token).unwrap();
        assert_eq!(claims.user_id(), Some(7));
        assert_eq!(claims.role, Role::Resident);

        // Second verification is served from the cache
        let cached = service.verify(&issued.token).unwrap();
        assert_eq!(cached, claims);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = TokenService::new(&secret(), 3600).unwrap();
        let issued = service.issue_with_ttl(7, Role::Resident, -3600).unwrap();

        let err = service.verify(&issued.token).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ExpiredSignature));
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let service = TokenService::new(&secret(), 3600).unwrap();
        let other_secret = base64::engine::general_purpose::STANDARD
            .encode("another-secret-key-that-is-long-enough!!");
        let other = TokenService::new(&other_secret, 3600).unwrap();

        let issued = other.issue(1, Role::Admin).unwrap();
        assert!(service.verify(&issued.token).is_err());
    }

    #[test]
    fn test_revoked_token_is_rejected() {
        let service = TokenService::new(&secret(), 3600).unwrap();
        let issued = service.issue(3, Role::Authority).unwrap();
        assert!(service.verify(&issued.token).is_ok());

        service.revoke(&issued.token);

        let err = service.verify(&issued.token).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidToken));
    }

    #[test]
    fn test_revocations_are_kept_until_expiry() {
        let service = TokenService::new(&secret(), 3600).unwrap();
        let tokens: Vec<String> = (0..50)
            .map(|user_id| service.issue_with_ttl(user_id, Role::Resident, 3600 + user_id as i64).unwrap().token)
            .collect();
        for token in &tokens {
            service.revoke(token);
        }

        assert_eq!(service.revoked_len(), 50);
        assert_eq!(service.purge_revoked(), 0);
        assert!(tokens.iter().all(|t| service.verify(t).is_err()));
    }

    #[test]
    fn test_expired_revocations_are_purged() {
        let service = TokenService::new(&secret(), 3600).unwrap();
        let live = service.issue(1, Role::Resident).unwrap();
        service.revoke(&live.token);
        service.revoked.insert("expired-token".to_string(), chrono::Utc::now().timestamp() - 1);

        // Garbage never verified, so there is nothing to remember
        service.revoke("not-a-jwt");

        assert_eq!(service.revoked_len(), 2);
        assert_eq!(service.purge_revoked(), 1);
        assert!(service.verify(&live.token).is_err());
    }

    #[test]
    fn test_rejects_weak_secret() {
        let short = base64::engine::general_purpose::STANDARD.encode("short");
        assert!(TokenService::new(&short, 3600).is_err());
        assert!(TokenService::new("not base64 !!", 3600).is_err());
        assert!(TokenService::new(&secret(), 0).is_err());
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let service = TokenService::new(&secret(), 3600).unwrap();
        assert!(service.verify("not-a-jwt").is_err());
    }
}
