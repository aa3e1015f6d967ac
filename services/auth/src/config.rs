//! Authentication settings injected into [`crate::service::AuthService`]

use chrono::Duration;

use crate::models::ROLE_MEMBER;

/// Argon2id cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingCost {
    /// Memory size in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism
    pub parallelism: u32,
}

impl Default for HashingCost {
    fn default() -> Self {
        // argon2 crate defaults (OWASP minimum for Argon2id)
        Self {
            memory_kib: 19 * 1024,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Lifetime of a session token (default: 24 hours)
    pub session_ttl: Duration,
    /// Role granted on registration (default: "member")
    pub default_role: String,
    /// Password hashing cost
    pub hashing: HashingCost,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl: Duration::hours(24),
            default_role: ROLE_MEMBER.to_string(),
            hashing: HashingCost::default(),
        }
    }
}
