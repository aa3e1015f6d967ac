//! Session credentials and the authenticated session context
//!
//! A session credential is `<tokenRecordId>|<secret>`. The record id locates
//! the row in `user_tokens`, the secret is compared against the stored value.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use rand::{RngCore, rngs::OsRng};
use uuid::Uuid;

use crate::models::UserToken;

/// Number of random bytes in a session secret
pub const SECRET_BYTES: usize = 32;

const SEPARATOR: char = '|';

/// Generate a fresh session secret from the OS CSPRNG
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compare two byte strings without short-circuiting on the first difference
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Reasons an `Authorization` header cannot be turned into a credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    /// Scheme is not `Bearer` or there is no credential after it
    InvalidScheme,
    /// Credential lacks the separator or has an empty part
    Malformed,
}

/// A parsed `<tokenRecordId>|<secret>` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerCredential {
    pub token_id: String,
    pub secret: String,
}

impl BearerCredential {
    pub fn new(token_id: Uuid, secret: &str) -> Self {
        Self {
            token_id: token_id.to_string(),
            secret: secret.to_string(),
        }
    }

    /// Parse an `Authorization` header value. The scheme is matched
    /// case-insensitively.
    pub fn from_header(value: &str) -> Result<Self, CredentialError> {
        let (scheme, credential) = value
            .trim()
            .split_once(' ')
            .ok_or(CredentialError::InvalidScheme)?;

        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(CredentialError::InvalidScheme);
        }

        let credential = credential.trim();
        if credential.is_empty() {
            return Err(CredentialError::InvalidScheme);
        }

        Self::parse(credential)
    }

    /// Parse the bare credential. Exactly two non-empty parts are accepted.
    pub fn parse(credential: &str) -> Result<Self, CredentialError> {
        let mut parts = credential.split(SEPARATOR);
        let (Some(token_id), Some(secret), None) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(CredentialError::Malformed);
        };

        if token_id.is_empty() || secret.is_empty() {
            return Err(CredentialError::Malformed);
        }

        Ok(Self {
            token_id: token_id.to_string(),
            secret: secret.to_string(),
        })
    }

    /// Wire form sent to clients
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.token_id, SEPARATOR, self.secret)
    }
}

/// Identity attached to a request once its bearer token has validated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub token_id: Uuid,
    pub user_id: Uuid,
    pub abilities: Vec<String>,
    pub expired_at: DateTime<Utc>,
}

impl AuthSession {
    pub fn has_ability(&self, ability: &str) -> bool {
        self.abilities.iter().any(|a| a == ability)
    }

    pub fn has_any<S: AsRef<str>>(&self, abilities: &[S]) -> bool {
        abilities.iter().any(|a| self.has_ability(a.as_ref()))
    }

    pub fn has_all<S: AsRef<str>>(&self, abilities: &[S]) -> bool {
        abilities.iter().all(|a| self.has_ability(a.as_ref()))
    }
}

impl From<UserToken> for AuthSession {
    fn from(token: UserToken) -> Self {
        Self {
            token_id: token.id,
            user_id: token.user_id,
            abilities: token.ability,
            expired_at: token.expired_at,
        }
    }
}
