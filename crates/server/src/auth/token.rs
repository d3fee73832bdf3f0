//! Stateless bearer tokens.
//!
//! JWT-shaped: `base64url(header).base64url(claims).base64url(mac)`, signed
//! with HMAC-SHA256 over the first two segments. Verification is stateless;
//! a token stays valid until its expiry even if the user has since been
//! deleted.

use std::str::FromStr;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use storeroom_core::{Login, Role, UserId};

use crate::models::User;

use super::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Token lifetime used when none is configured.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(15 * 60);

/// Fixed JWT header; the signature covers it, so it is never parsed back.
const HEADER: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Signed token payload, unix-second timestamps.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    subject_id: i64,
    subject_login: String,
    subject_role: String,
    issued_at: i64,
    expires_at: i64,
}

/// The verified identity a token carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
    pub login: Login,
    pub role: Role,
}

/// Issues and verifies bearer tokens.
pub struct TokenService {
    secret: SecretString,
    ttl: Duration,
}

impl TokenService {
    #[must_use]
    pub const fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    #[must_use]
    pub const fn with_default_ttl(secret: SecretString) -> Self {
        Self::new(secret, DEFAULT_TOKEN_TTL)
    }

    /// Issue a token for a user, expiring `ttl` from now.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Signing`] if the claims cannot be serialized or
    /// the MAC cannot be keyed.
    pub fn generate(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            subject_id: user.id.as_i64(),
            subject_login: user.login.to_string(),
            subject_role: user.role.as_str().to_owned(),
            issued_at: now,
            expires_at: now.saturating_add_unsigned(self.ttl.as_secs()),
        };

        let header = URL_SAFE_NO_PAD.encode(HEADER);
        let payload = URL_SAFE_NO_PAD
            .encode(serde_json::to_vec(&claims).map_err(|_| AuthError::Signing)?);
        let signing_input = format!("{header}.{payload}");
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&signing_input)?.finalize().into_bytes());
        Ok(format!("{signing_input}.{signature}"))
    }

    /// Verify a token and extract its principal.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for a malformed token, a bad
    /// signature, or claims that do not parse; [`AuthError::ExpiredToken`]
    /// once the expiry has passed.
    pub fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let mut parts = token.split('.');
        let (header, payload, signature) =
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => return Err(AuthError::InvalidToken),
            };

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::InvalidToken)?;
        let mut mac = self.mac(&format!("{header}.{payload}"))?;
        // Constant-time comparison.
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let payload = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims: Claims =
            serde_json::from_slice(&payload).map_err(|_| AuthError::InvalidToken)?;

        if Utc::now().timestamp() >= claims.expires_at {
            return Err(AuthError::ExpiredToken);
        }

        let login = Login::parse(&claims.subject_login).map_err(|_| AuthError::InvalidToken)?;
        let role = Role::from_str(&claims.subject_role).map_err(|_| AuthError::InvalidToken)?;
        Ok(Principal {
            id: UserId::new(claims.subject_id),
            login,
            role,
        })
    }

    fn mac(&self, input: &str) -> Result<HmacSha256, AuthError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|_| AuthError::Signing)?;
        mac.update(input.as_bytes());
        Ok(mac)
    }
}
