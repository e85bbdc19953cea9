//! Session-cookie verification and CSRF token derivation.
//!
//! The identity provider mints the session cookie; this service only
//! decodes and verifies it. CSRF tokens are derived deterministically
//! from the session so they need no server-side storage.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::AppError;

/// Name of the session cookie set by the identity provider.
pub const SESSION_COOKIE: &str = "callmap_session";

/// Claims embedded in the session cookie.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    /// Identity provider uid.
    pub sub: String,
    pub email: String,
    /// Raw role claim string (`member`, `admin`, `superAdmin`).
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

/// Decode and verify a session cookie value.
pub fn verify_session(token: &str, session_secret: &str) -> Result<SessionClaims, AppError> {
    let decoding_key = DecodingKey::from_secret(session_secret.as_bytes());
    let validation = Validation::default();

    jsonwebtoken::decode::<SessionClaims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized)
}

/// Encode a session cookie value. Production cookies come from the
/// identity provider; this exists for the seed binary and tests.
pub fn mint_session(claims: &SessionClaims, session_secret: &str) -> Result<String, AppError> {
    let encoding_key = EncodingKey::from_secret(session_secret.as_bytes());
    jsonwebtoken::encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| AppError::Internal(format!("Session encoding failed: {e}")))
}

/// Derive the CSRF token for a session: SHA-256 over the uid, the issue
/// time, and the CSRF secret, hex-encoded. Stable for the lifetime of the
/// session, rotates with it.
pub fn csrf_token(uid: &str, issued_at: i64, csrf_secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(uid.as_bytes());
    hasher.update(b":");
    hasher.update(issued_at.to_be_bytes());
    hasher.update(b":");
    hasher.update(csrf_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-shape CSRF check for state-changing requests.
pub fn verify_csrf(
    presented: &str,
    uid: &str,
    issued_at: i64,
    csrf_secret: &str,
) -> Result<(), AppError> {
    let expected = csrf_token(uid, issued_at, csrf_secret);
    // Compare digests, not the raw strings: match time must not depend
    // on the length of a shared prefix.
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    if presented != expected {
        return Err(AppError::Forbidden("Invalid CSRF token".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    const SECRET: &str = "test-session-secret";

    fn claims(role: &str) -> SessionClaims {
        let now = Utc::now();
        SessionClaims {
            sub: "uid-1".to_string(),
            email: "ops@callmap.io".to_string(),
            role: role.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        }
    }

    #[test]
    fn session_round_trips() {
        let minted = mint_session(&claims("admin"), SECRET).unwrap();
        let verified = verify_session(&minted, SECRET).unwrap();
        assert_eq!(verified.sub, "uid-1");
        assert_eq!(verified.role, "admin");
    }

    #[test]
    fn rejects_wrong_secret() {
        let minted = mint_session(&claims("admin"), SECRET).unwrap();
        assert!(verify_session(&minted, "other-secret")
            .unwrap_err()
            .is_unauthorized());
    }

    #[test]
    fn rejects_expired_session() {
        let now = Utc::now();
        let expired = SessionClaims {
            exp: (now - Duration::hours(2)).timestamp(),
            iat: (now - Duration::hours(3)).timestamp(),
            ..claims("member")
        };
        let minted = mint_session(&expired, SECRET).unwrap();
        assert!(verify_session(&minted, SECRET).unwrap_err().is_unauthorized());
    }

    #[test]
    fn rejects_garbage_token() {
        assert!(verify_session("not-a-jwt", SECRET).unwrap_err().is_unauthorized());
    }

    #[test]
    fn csrf_token_is_deterministic_per_session() {
        let a = csrf_token("uid-1", 1_700_000_000, "csrf-secret");
        let b = csrf_token("uid-1", 1_700_000_000, "csrf-secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn csrf_token_varies_by_session_and_secret() {
        let base = csrf_token("uid-1", 1_700_000_000, "csrf-secret");
        assert_ne!(base, csrf_token("uid-2", 1_700_000_000, "csrf-secret"));
        assert_ne!(base, csrf_token("uid-1", 1_700_000_001, "csrf-secret"));
        assert_ne!(base, csrf_token("uid-1", 1_700_000_000, "other"));
    }

    #[test]
    fn verify_csrf_accepts_matching_and_rejects_other_tokens() {
        let token = csrf_token("uid-1", 42, "csrf-secret");
        assert!(verify_csrf(&token, "uid-1", 42, "csrf-secret").is_ok());
        let err = verify_csrf(&token, "uid-2", 42, "csrf-secret").unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[test]
    fn verify_csrf_rejects_near_miss_tokens() {
        let token = csrf_token("uid-1", 42, "csrf-secret");
        // Same length, all but the last character shared.
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == '0' { '1' } else { '0' });
        assert!(verify_csrf(&tampered, "uid-1", 42, "csrf-secret").is_err());
        // Truncated token.
        assert!(verify_csrf(&token[..63], "uid-1", 42, "csrf-secret").is_err());
    }
}
