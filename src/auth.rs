use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{TOKEN_COOKIE, TOKEN_TTL_SECS};

/// Claims carried in every session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id, stringified.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing secret is not configured")]
    MissingSecret,
    #[error("token has expired")]
    Expired,
    #[error("token signature does not match")]
    InvalidSignature,
    #[error("malformed token: {0}")]
    Malformed(jsonwebtoken::errors::Error),
}

/// Hash a password with a fresh random salt. Output is a PHC string carrying
/// the salt and the cost parameters, which are fixed at build time by
/// `Argon2::default()`.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a candidate password against a stored PHC hash.
///
/// Mismatch is `Ok(false)`; only a malformed stored hash is an error.
pub fn verify_password(
    password: &str,
    hash: &str,
) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Issue an HS256 session token for `user_id`, expiring `ttl_secs` from now.
pub fn issue_token(user_id: i64, secret: &str, ttl_secs: i64) -> Result<String, TokenError> {
    if secret.is_empty() {
        return Err(TokenError::MissingSecret);
    }
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + ttl_secs,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(TokenError::Malformed)
}

/// Verify a session token and return its claims.
///
/// Expiry is checked with zero leeway: a token is rejected the moment its
/// `exp` passes.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::default();
    validation.leeway = 0;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::Malformed(e),
    })
}

/// Build the `Set-Cookie` value handing the session token to the client.
///
/// HttpOnly + SameSite=Strict; `Secure` only when serving over HTTPS. The
/// cookie lifetime equals the token TTL so the browser drops the cookie when
/// the token stops verifying.
pub fn session_cookie(token: &str, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        TOKEN_COOKIE, token, TOKEN_TTL_SECS
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Build the `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    let mut cookie = format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0",
        TOKEN_COOKIE
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_correct() {
        let hash = hash_password("my-secure-password").unwrap();
        assert!(verify_password("my-secure-password", &hash).unwrap());
    }

    #[test]
    fn test_verify_wrong_password() {
        let hash = hash_password("correct-password").unwrap();
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hash1 = hash_password("same-password").unwrap();
        let hash2 = hash_password("same-password").unwrap();
        assert_ne!(hash1, hash2);
        assert!(verify_password("same-password", &hash1).unwrap());
        assert!(verify_password("same-password", &hash2).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_an_error() {
        assert!(verify_password("anything", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_issue_and_verify_token() {
        let token = issue_token(42, "test-secret", TOKEN_TTL_SECS).unwrap();
        let claims = verify_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn test_wrong_secret_fails() {
        let token = issue_token(42, "secret-1", TOKEN_TTL_SECS).unwrap();
        assert!(matches!(
            verify_token(&token, "secret-2"),
            Err(TokenError::InvalidSignature)
        ));
    }

    #[test]
    fn test_expired_token_fails() {
        // Issued already past its expiry.
        let token = issue_token(42, "test-secret", -1).unwrap();
        assert!(matches!(
            verify_token(&token, "test-secret"),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_empty_secret_refused() {
        assert!(matches!(
            issue_token(42, "", TOKEN_TTL_SECS),
            Err(TokenError::MissingSecret)
        ));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc", false);
        assert!(cookie.starts_with("token=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains(&format!("Max-Age={}", TOKEN_TTL_SECS)));
        assert!(!cookie.contains("Secure"));
        assert!(session_cookie("abc", true).contains("Secure"));
    }

    #[test]
    fn test_clear_cookie_zeroes_max_age() {
        let cookie = clear_session_cookie(false);
        assert!(cookie.starts_with("token=;"));
        assert!(cookie.contains("Max-Age=0"));
    }
}
