//! Access/refresh token minting and verification (HS256).
//!
//! Tokens are signed, not encrypted, and stateless: verification checks the
//! signature, the claim time window and the token type. No session table is
//! consulted.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use uuid::Uuid;

use crate::claims::{TokenClaims, TokenError, TokenType, validate_claims};
use crate::Identity;

/// Default access token lifetime in seconds (5 minutes).
pub const DEFAULT_ACCESS_TTL_SECS: i64 = 5 * 60;

/// Default refresh token lifetime in seconds (1 day).
pub const DEFAULT_REFRESH_TTL_SECS: i64 = 24 * 60 * 60;

/// A freshly minted access/refresh pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs and verifies tokens with a process-wide HMAC secret.
///
/// The secret is fixed at construction and never leaves this struct.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl core::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self::with_ttls(
            secret,
            Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
            Duration::seconds(DEFAULT_REFRESH_TTL_SECS),
        )
    }

    pub fn with_ttls(secret: impl AsRef<[u8]>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let secret = secret.as_ref();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// Mint an access and a refresh token carrying the same identity snapshot.
    pub fn issue_token_pair(&self, identity: &Identity, now: DateTime<Utc>) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue(identity, TokenType::Access, now)?,
            refresh: self.issue(identity, TokenType::Refresh, now)?,
        })
    }

    pub fn issue_access_token(&self, identity: &Identity, now: DateTime<Utc>) -> Result<String, TokenError> {
        self.issue(identity, TokenType::Access, now)
    }

    fn issue(&self, identity: &Identity, token_type: TokenType, now: DateTime<Utc>) -> Result<String, TokenError> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl,
            TokenType::Refresh => self.refresh_ttl,
        };

        let exp = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Malformed(format!("{token_type} lifetime overflows the clock")))?;

        let claims = TokenClaims {
            sub: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            active: identity.active,
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            token_type,
            jti: Uuid::now_v7(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Malformed(format!("failed to encode token: {e}")))
    }

    /// Verify a token's signature, time window and variant.
    pub fn verify(&self, token: &str, expected: TokenType, now: DateTime<Utc>) -> Result<TokenClaims, TokenError> {
        // The time window is checked by `validate_claims` against the caller's
        // clock, so the library's own `exp` handling is switched off.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
                other => TokenError::Malformed(format!("{other:?}")),
            })?;

        let claims = data.claims;
        validate_claims(&claims, now)?;

        if claims.token_type != expected {
            return Err(TokenError::WrongTokenType {
                expected,
                actual: claims.token_type,
            });
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::register(
            "u@test.com",
            "hash".to_string(),
            Some("Una".to_string()),
            None,
            Utc::now(),
        )
    }

    #[test]
    fn access_token_roundtrip_recovers_identity_snapshot() {
        let issuer = TokenIssuer::new("test-secret");
        let id = identity();
        let now = Utc::now();

        let pair = issuer.issue_token_pair(&id, now).unwrap();
        let claims = issuer.verify(&pair.access, TokenType::Access, now).unwrap();

        assert_eq!(claims.sub, id.id);
        assert_eq!(claims.role, id.role);
        assert_eq!(claims.email, id.email);
        assert_eq!(claims.first_name.as_deref(), Some("Una"));
        assert_eq!(claims.exp - claims.iat, issuer.access_ttl().num_seconds());
    }

    #[test]
    fn oversized_lifetime_is_an_error_not_a_panic() {
        let issuer = TokenIssuer::with_ttls(
            "test-secret",
            Duration::seconds(DEFAULT_ACCESS_TTL_SECS),
            Duration::seconds(10_000_000_000_000),
        );

        let err = issuer.issue_token_pair(&identity(), Utc::now()).unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)));
        assert!(issuer.issue_access_token(&identity(), Utc::now()).is_ok());
        assert_eq!(issuer.refresh_ttl().num_seconds(), 10_000_000_000_000);
    }

    #[test]
    fn refresh_outlives_access() {
        let issuer = TokenIssuer::new("test-secret");
        let now = Utc::now();
        let pair = issuer.issue_token_pair(&identity(), now).unwrap();

        let later = now + Duration::hours(1);
        assert_eq!(
            issuer.verify(&pair.access, TokenType::Access, later),
            Err(TokenError::Expired)
        );
        assert!(issuer.verify(&pair.refresh, TokenType::Refresh, later).is_ok());
    }

    #[test]
    fn token_types_are_not_interchangeable() {
        let issuer = TokenIssuer::new("test-secret");
        let now = Utc::now();
        let pair = issuer.issue_token_pair(&identity(), now).unwrap();

        assert!(matches!(
            issuer.verify(&pair.refresh, TokenType::Access, now),
            Err(TokenError::WrongTokenType { expected: TokenType::Access, actual: TokenType::Refresh })
        ));
    }

    #[test]
    fn foreign_secret_is_an_invalid_signature() {
        let issuer = TokenIssuer::new("test-secret");
        let other = TokenIssuer::new("other-secret");
        let now = Utc::now();
        let pair = other.issue_token_pair(&identity(), now).unwrap();

        assert_eq!(
            issuer.verify(&pair.access, TokenType::Access, now),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn garbage_is_malformed_not_expired() {
        let issuer = TokenIssuer::new("test-secret");
        let err = issuer.verify("not.a.jwt", TokenType::Access, Utc::now()).unwrap_err();
        assert!(matches!(err, TokenError::Malformed(_)));
    }

    #[test]
    fn snapshot_is_not_affected_by_later_role_change() {
        let issuer = TokenIssuer::new("test-secret");
        let mut id = identity();
        let now = Utc::now();
        let pair = issuer.issue_token_pair(&id, now).unwrap();

        id.assign_role(crate::Role::Admin, now);
        let claims = issuer.verify(&pair.access, TokenType::Access, now).unwrap();
        assert_eq!(claims.role, crate::Role::User);
    }
}
