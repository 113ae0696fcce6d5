//! Password hashing and access token issue/verification.
//!
//! Tokens are HS256 JWTs carrying the username as subject. The acting
//! user is always resolved from the presented token; there is no ambient
//! security context anywhere in the server.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username the token was issued to.
    pub sub: String,
    /// Expiry as a unix timestamp in seconds.
    pub exp: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Hash a password for storage (argon2id with a fresh salt).
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {e}"))?;
    Ok(hash.to_string())
}

/// Check a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Issue a token for the given username.
pub fn generate_token(
    secret: &str,
    username: &str,
    lifetime_seconds: i64,
) -> anyhow::Result<String> {
    let exp = chrono::Utc::now().timestamp() + lifetime_seconds;
    let claims = Claims {
        sub: username.to_string(),
        exp: exp as usize,
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Validate a token and return the username it was issued to.
pub fn validate_token(secret: &str, token: &str) -> Result<String, TokenError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims.sub)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip_preserves_username() {
        let token = generate_token("secret", "alice", 3600).unwrap();
        let username = validate_token("secret", &token).unwrap();
        assert_eq!(username, "alice");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = generate_token("secret", "alice", 3600).unwrap();
        assert!(matches!(
            validate_token("other-secret", &token),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        // Lifetime far enough in the past to clear the default leeway.
        let token = generate_token("secret", "alice", -3600).unwrap();
        assert!(matches!(
            validate_token("secret", &token),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(matches!(
            validate_token("secret", "not-a-token"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn password_verifies_against_its_hash() {
        let hash = hash_password("hunter2").unwrap();
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("hunter2", "not-a-phc-string"));
    }
}
