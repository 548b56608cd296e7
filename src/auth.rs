//! Single-admin authentication
//!
//! One admin identity checked against configured credentials; successful
//! logins get a signed bearer token. Tokens are base64url-encoded JSON
//! claims plus a SHA-256 signature keyed with the configured secret.

use crate::error::{DeckError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Token lifetime in seconds (24 hours)
pub const TOKEN_EXPIRY_SECS: u64 = 24 * 60 * 60;

const BCRYPT_COST: u32 = 10;

/// Signed token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (username)
    pub sub: String,
    /// Role, always "admin" for the single identity
    pub role: String,
    /// Issued at
    pub iat: u64,
    /// Not before
    pub nbf: u64,
    /// Expiration time
    pub exp: u64,
    /// Token ID
    pub jti: String,
}

/// Authentication handler for the single admin identity
pub struct Authenticator {
    username: String,
    password_hash: String,
    secret: String,
    token_expiry: u64,
}

impl Authenticator {
    /// Hash the configured password up front; the clear text is not kept.
    pub fn new(username: &str, password: &str, secret: &str) -> Result<Self> {
        let password_hash = bcrypt::hash(password, BCRYPT_COST)
            .map_err(|e| DeckError::Auth(format!("Failed to hash password: {}", e)))?;

        Ok(Self {
            username: username.to_string(),
            password_hash,
            secret: secret.to_string(),
            token_expiry: TOKEN_EXPIRY_SECS,
        })
    }

    /// Override the token lifetime
    pub fn with_token_expiry(mut self, seconds: u64) -> Self {
        self.token_expiry = seconds;
        self
    }

    /// Check credentials and issue a token
    pub fn login(&self, username: &str, password: &str) -> Result<String> {
        if username != self.username {
            return Err(DeckError::Auth("Invalid credentials".to_string()));
        }

        let valid = bcrypt::verify(password, &self.password_hash)
            .map_err(|e| DeckError::Auth(format!("Password verification failed: {}", e)))?;
        if !valid {
            return Err(DeckError::Auth("Invalid credentials".to_string()));
        }

        let now = unix_now();
        let claims = TokenClaims {
            sub: username.to_string(),
            role: "admin".to_string(),
            iat: now,
            nbf: now,
            exp: now + self.token_expiry,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        self.sign(&claims)
    }

    /// Verify a token's signature and time bounds
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let (payload_b64, signature_b64) = token
            .split_once('.')
            .ok_or_else(|| DeckError::Auth("Malformed token".to_string()))?;

        let expected = self.signature(payload_b64);
        if signature_b64 != expected {
            return Err(DeckError::Auth("Invalid token signature".to_string()));
        }

        let payload = URL_SAFE_NO_PAD
            .decode(payload_b64)
            .map_err(|_| DeckError::Auth("Malformed token payload".to_string()))?;
        let claims: TokenClaims = serde_json::from_slice(&payload)
            .map_err(|_| DeckError::Auth("Malformed token claims".to_string()))?;

        let now = unix_now();
        if claims.exp < now {
            return Err(DeckError::Auth("Token expired".to_string()));
        }
        if claims.nbf > now {
            return Err(DeckError::Auth("Token not yet valid".to_string()));
        }

        Ok(claims)
    }

    fn sign(&self, claims: &TokenClaims) -> Result<String> {
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
        let signature = self.signature(&payload);
        Ok(format!("{}.{}", payload, signature))
    }

    fn signature(&self, payload_b64: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b".");
        hasher.update(payload_b64.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Extract the bearer token from an Authorization header value
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .or_else(|| header_value.strip_prefix("bearer "))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn authenticator() -> Authenticator {
        Authenticator::new("admin", "admin123", "test-secret").unwrap()
    }

    #[test]
    fn test_login_roundtrip() {
        let auth = authenticator();
        let token = auth.login("admin", "admin123").unwrap();

        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.role, "admin");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_bad_credentials_rejected() {
        let auth = authenticator();
        assert!(auth.login("admin", "wrong").is_err());
        assert!(auth.login("root", "admin123").is_err());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let auth = authenticator();
        let token = auth.login("admin", "admin123").unwrap();

        let mut tampered = token.clone();
        tampered.insert(3, 'x');
        assert!(auth.verify(&tampered).is_err());
        assert!(auth.verify("not-a-token").is_err());
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let auth = authenticator();
        let other = Authenticator::new("admin", "admin123", "other-secret").unwrap();
        let token = other.login("admin", "admin123").unwrap();

        assert!(auth.verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let auth = authenticator().with_token_expiry(0);
        let token = auth.login("admin", "admin123").unwrap();

        // exp == now at issue time; any later check sees it expired.
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(auth.verify(&token).is_err());
    }

    #[test]
    fn test_bearer_extraction() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
    }
}
