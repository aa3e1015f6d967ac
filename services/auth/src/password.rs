//! Argon2id password hashing
//!
//! Hashing and verification are CPU-bound, so both run on Tokio's blocking
//! pool instead of the request task.

use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
    password_hash::SaltString,
};

use crate::{config::HashingCost, error::AuthError};

/// Password hashing service
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    /// Verified against when the account does not exist, so both login
    /// failure paths do the same work
    dummy_hash: Arc<str>,
}

impl PasswordService {
    /// Create a password service with the given cost parameters
    pub fn new(cost: HashingCost) -> Result<Self, AuthError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| AuthError::Configuration(format!("Invalid Argon2 parameters: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = hash_with(&argon2, "dummy-password-for-timing")?;

        Ok(Self {
            argon2,
            dummy_hash: Arc::from(dummy_hash),
        })
    }

    /// Hash a plaintext password with a fresh random salt
    pub async fn hash(&self, password: &str) -> Result<String, AuthError> {
        let argon2 = self.argon2.clone();
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hash_with(&argon2, &password))
            .await
            .map_err(|e| AuthError::Hashing(format!("Hashing task failed: {}", e)))?
    }

    /// Verify a plaintext password against a stored PHC hash string
    pub async fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, AuthError> {
        let argon2 = self.argon2.clone();
        let password = password.to_string();
        let stored_hash = stored_hash.to_string();
        tokio::task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&stored_hash)
                .map_err(|e| AuthError::Hashing(format!("Failed to parse password hash: {}", e)))?;
            Ok(argon2
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok())
        })
        .await
        .map_err(|e| AuthError::Hashing(format!("Verification task failed: {}", e)))?
    }

    /// Spend one verification on the dummy hash and discard the result
    pub async fn verify_dummy(&self, password: &str) {
        let dummy_hash = self.dummy_hash.clone();
        let _ = self.verify(password, &dummy_hash).await;
    }
}

fn hash_with(argon2: &Argon2<'_>, password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(format!("Failed to hash password: {}", e)))
}
