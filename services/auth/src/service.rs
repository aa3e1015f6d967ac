//! Registration, login and session lifecycle

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    config::AuthConfig,
    error::AuthError,
    models::{
        DEFAULT_USER_STATUS, LoginCredentials, LoginResponse, NewUser, NewUserToken,
        RegisterRequest, Role, UpdateUser, User, UserToken,
    },
    password::PasswordService,
    repositories::{CredentialStore, TokenStore},
    session::{BearerCredential, constant_time_eq, generate_secret},
    validation,
};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    tokens: Arc<dyn TokenStore>,
    passwords: PasswordService,
    config: AuthConfig,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        tokens: Arc<dyn TokenStore>,
        config: AuthConfig,
    ) -> Result<Self, AuthError> {
        let passwords = PasswordService::new(config.hashing)?;
        Ok(Self {
            credentials,
            tokens,
            passwords,
            config,
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Register a new user with the default role. Role names in the request
    /// body are ignored.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AuthError> {
        validation::validate_register(&request).map_err(AuthError::Validation)?;

        let default_role = self
            .credentials
            .find_roles_by_names(std::slice::from_ref(&self.config.default_role))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                AuthError::Configuration(format!(
                    "default role '{}' not found",
                    self.config.default_role
                ))
            })?;

        if self
            .credentials
            .find_by_email(&request.email)
            .await?
            .is_some()
        {
            warn!("Registration rejected, email already in use: {}", request.email);
            return Err(AuthError::Conflict);
        }

        let password_hash = self.passwords.hash(&request.password).await?;
        let new_user = NewUser {
            email: request.email,
            password_hash,
            name: request.name.trim().to_string(),
            phone: request.phone,
            status: DEFAULT_USER_STATUS.to_string(),
        };

        let user = self
            .credentials
            .create_with_roles(&new_user, &[default_role.id])
            .await
            .map_err(|e| {
                if e.is_unique_violation() {
                    AuthError::Conflict
                } else {
                    AuthError::Database(e)
                }
            })?;

        info!("Registered user {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Authenticate credentials and open a new session
    pub async fn login(&self, credentials: LoginCredentials) -> Result<LoginResponse, AuthError> {
        validation::validate_login(&credentials).map_err(AuthError::Validation)?;

        let Some(user) = self.credentials.find_by_email(&credentials.email).await? else {
            self.passwords.verify_dummy(&credentials.password).await;
            warn!("Login failed for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self
            .passwords
            .verify(&credentials.password, &user.password_hash)
            .await?
        {
            warn!("Login failed for user {}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let secret = generate_secret();
        let new_token = NewUserToken {
            id: Uuid::new_v4(),
            user_id: user.id,
            token: secret.clone(),
            ability: user.role_names(),
            expired_at: Utc::now() + self.config.session_ttl,
        };
        let token = self.tokens.insert(&new_token).await?;

        info!("User {} logged in, session {}", user.id, token.id);
        Ok(LoginResponse {
            id: user.id,
            email: user.email,
            name: user.name,
            phone: user.phone,
            status: user.status,
            token: BearerCredential::new(token.id, &secret).encode(),
            expired_at: token.expired_at,
        })
    }

    /// Invalidate one session
    pub async fn logout(&self, token_id: Uuid) -> Result<(), AuthError> {
        if !self.tokens.invalidate(token_id).await? {
            return Err(AuthError::TokenNotFound);
        }
        info!("Session {} logged out", token_id);
        Ok(())
    }

    /// Invalidate every session of a user
    pub async fn logout_all(&self, user_id: Uuid) -> Result<u64, AuthError> {
        let revoked = self.tokens.invalidate_for_user(user_id).await?;
        info!("Revoked {} sessions of user {}", revoked, user_id);
        Ok(revoked)
    }

    /// Validate a session credential. Checks run in a fixed order: record
    /// lookup, secret comparison, then expiry.
    pub async fn validate_token(&self, token_id: &str, secret: &str) -> Result<UserToken, AuthError> {
        let Ok(token_id) = Uuid::parse_str(token_id) else {
            return Err(AuthError::TokenNotFound);
        };

        let token = self
            .tokens
            .find_by_id(token_id)
            .await?
            .ok_or(AuthError::TokenNotFound)?;

        if !constant_time_eq(token.token.as_bytes(), secret.as_bytes()) {
            return Err(AuthError::TokenMismatch);
        }

        if !token.is_active_at(Utc::now()) {
            return Err(AuthError::TokenExpired);
        }

        Ok(token)
    }

    /// Replace the role set of a user. Unknown role names are skipped.
    pub async fn assign_roles(
        &self,
        user_id: Uuid,
        role_names: &[String],
    ) -> Result<Vec<Role>, AuthError> {
        self.get_user(user_id).await?;

        let roles = self.credentials.find_roles_by_names(role_names).await?;
        for name in role_names {
            if !roles.iter().any(|r| &r.name == name) {
                warn!("Skipping unknown role '{}' for user {}", name, user_id);
            }
        }

        let role_ids: Vec<Uuid> = roles.iter().map(|r| r.id).collect();
        self.credentials.replace_roles(user_id, &role_ids).await?;

        info!("Assigned {} roles to user {}", role_ids.len(), user_id);
        Ok(self.credentials.roles_for_user(user_id).await?)
    }

    /// Current roles of a user
    pub async fn user_roles(&self, user_id: Uuid) -> Result<Vec<Role>, AuthError> {
        self.get_user(user_id).await?;
        Ok(self.credentials.roles_for_user(user_id).await?)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.credentials
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::NotFound("user"))
    }

    pub async fn update_profile(&self, user_id: Uuid, update: UpdateUser) -> Result<User, AuthError> {
        validation::validate_update(&update).map_err(AuthError::Validation)?;

        let user = self
            .credentials
            .update_profile(user_id, &update)
            .await?
            .ok_or(AuthError::NotFound("user"))?;

        info!("Updated profile of user {}", user.id);
        Ok(user)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{
        config::HashingCost,
        models::{ROLE_ADMIN, ROLE_MEMBER},
        repositories::memory::{InMemoryCredentialStore, InMemoryTokenStore},
    };
    use chrono::Duration;

    pub(crate) struct Fixture {
        pub service: AuthService,
        pub users: Arc<InMemoryCredentialStore>,
        pub tokens: Arc<InMemoryTokenStore>,
    }

    pub(crate) fn fixture_with(users: InMemoryCredentialStore) -> Fixture {
        let users = Arc::new(users);
        let tokens = Arc::new(InMemoryTokenStore::new());
        let config = AuthConfig {
            hashing: HashingCost {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
            },
            ..AuthConfig::default()
        };
        let service = AuthService::new(users.clone(), tokens.clone(), config).unwrap();
        Fixture {
            service,
            users,
            tokens,
        }
    }

    pub(crate) fn fixture() -> Fixture {
        fixture_with(InMemoryCredentialStore::new())
    }

    pub(crate) fn registration(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "Password123!".to_string(),
            name: "Alice".to_string(),
            phone: "0812345678".to_string(),
            role_names: Vec::new(),
        }
    }

    pub(crate) fn credentials(email: &str, password: &str) -> LoginCredentials {
        LoginCredentials {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_grants_member_role() {
        let f = fixture();
        let user = f.service.register(registration("a@b.io")).await.unwrap();

        assert_eq!(user.status, "inactive");
        assert_eq!(user.role_names(), vec![ROLE_MEMBER.to_string()]);
        assert_ne!(user.password_hash, "Password123!");
    }

    #[tokio::test]
    async fn test_register_ignores_requested_roles() {
        let f = fixture();
        let mut request = registration("a@b.io");
        request.role_names = vec![ROLE_ADMIN.to_string()];

        let user = f.service.register(request).await.unwrap();
        assert_eq!(user.role_names(), vec![ROLE_MEMBER.to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let f = fixture();
        f.service.register(registration("a@b.io")).await.unwrap();

        let result = f.service.register(registration("a@b.io")).await;
        assert!(matches!(result, Err(AuthError::Conflict)));
        assert_eq!(f.users.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_missing_default_role_is_a_configuration_error() {
        let f = fixture_with(InMemoryCredentialStore::with_roles(&[ROLE_ADMIN]));
        let result = f.service.register(registration("a@b.io")).await;

        assert!(matches!(result, Err(AuthError::Configuration(_))));
        assert_eq!(f.users.user_count().await, 0);
    }

    #[tokio::test]
    async fn test_invalid_registration_reports_fields() {
        let f = fixture();
        let mut request = registration("not-an-email");
        request.password = "short".to_string();

        match f.service.register(request).await {
            Err(AuthError::Validation(errors)) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["email", "password"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_register_accepts_short_name_and_free_form_phone() {
        let f = fixture();
        let request = RegisterRequest {
            email: "j@b.io".to_string(),
            password: "password123".to_string(),
            name: "J".to_string(),
            phone: "+62 812-3456".to_string(),
            role_names: Vec::new(),
        };

        let user = f.service.register(request).await.unwrap();
        assert_eq!(user.name, "J");
        assert_eq!(user.phone, "+62 812-3456");

        let login = f
            .service
            .login(credentials("j@b.io", "password123"))
            .await
            .unwrap();
        assert_eq!(login.id, user.id);
    }

    #[tokio::test]
    async fn test_login_issues_composite_credential() {
        let f = fixture();
        let user = f.service.register(registration("a@b.io")).await.unwrap();

        let response = f
            .service
            .login(credentials("a@b.io", "Password123!"))
            .await
            .unwrap();
        assert_eq!(response.id, user.id);

        let credential = BearerCredential::parse(&response.token).unwrap();
        let token = f
            .service
            .validate_token(&credential.token_id, &credential.secret)
            .await
            .unwrap();
        assert_eq!(token.user_id, user.id);
        assert_eq!(token.ability, vec![ROLE_MEMBER.to_string()]);
        assert_eq!(token.expired_at, response.expired_at);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let f = fixture();
        f.service.register(registration("a@b.io")).await.unwrap();

        let wrong_password = f
            .service
            .login(credentials("a@b.io", "Password123?"))
            .await
            .unwrap_err();
        let unknown_email = f
            .service
            .login(credentials("nobody@b.io", "Password123!"))
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(
            wrong_password.status_and_message(),
            unknown_email.status_and_message()
        );
    }

    #[tokio::test]
    async fn test_abilities_are_a_login_snapshot() {
        let f = fixture();
        let user = f.service.register(registration("a@b.io")).await.unwrap();
        let response = f
            .service
            .login(credentials("a@b.io", "Password123!"))
            .await
            .unwrap();

        f.service
            .assign_roles(user.id, &[ROLE_ADMIN.to_string()])
            .await
            .unwrap();

        let credential = BearerCredential::parse(&response.token).unwrap();
        let token = f
            .service
            .validate_token(&credential.token_id, &credential.secret)
            .await
            .unwrap();
        assert_eq!(token.ability, vec![ROLE_MEMBER.to_string()]);
    }

    #[tokio::test]
    async fn test_expired_token_fails_validation() {
        let f = fixture();
        let token = f
            .tokens
            .insert(&NewUserToken {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                token: "s3cret".to_string(),
                ability: vec![ROLE_MEMBER.to_string()],
                expired_at: Utc::now() - Duration::minutes(1),
            })
            .await
            .unwrap();

        let result = f
            .service
            .validate_token(&token.id.to_string(), "s3cret")
            .await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn test_validation_order() {
        let f = fixture();
        let token = f
            .tokens
            .insert(&NewUserToken {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                token: "s3cret".to_string(),
                ability: Vec::new(),
                expired_at: Utc::now() - Duration::minutes(1),
            })
            .await
            .unwrap();

        // Wrong secret on an expired token reports the mismatch
        let result = f.service.validate_token(&token.id.to_string(), "guess").await;
        assert!(matches!(result, Err(AuthError::TokenMismatch)));

        let result = f
            .service
            .validate_token(&Uuid::new_v4().to_string(), "s3cret")
            .await;
        assert!(matches!(result, Err(AuthError::TokenNotFound)));

        let result = f.service.validate_token("not-a-uuid", "s3cret").await;
        assert!(matches!(result, Err(AuthError::TokenNotFound)));
    }

    #[tokio::test]
    async fn test_logout_invalidates_once() {
        let f = fixture();
        f.service.register(registration("a@b.io")).await.unwrap();
        let response = f
            .service
            .login(credentials("a@b.io", "Password123!"))
            .await
            .unwrap();
        let credential = BearerCredential::parse(&response.token).unwrap();
        let token_id = Uuid::parse_str(&credential.token_id).unwrap();

        f.service.logout(token_id).await.unwrap();
        assert!(f.tokens.get_raw(token_id).await.unwrap().deleted_at.is_some());

        let again = f.service.logout(token_id).await;
        assert!(matches!(again, Err(AuthError::TokenNotFound)));

        let result = f
            .service
            .validate_token(&credential.token_id, &credential.secret)
            .await;
        assert!(matches!(result, Err(AuthError::TokenNotFound)));
    }

    #[tokio::test]
    async fn test_logout_all_revokes_every_session() {
        let f = fixture();
        let user = f.service.register(registration("a@b.io")).await.unwrap();
        for _ in 0..3 {
            f.service
                .login(credentials("a@b.io", "Password123!"))
                .await
                .unwrap();
        }

        assert_eq!(f.service.logout_all(user.id).await.unwrap(), 3);
        assert_eq!(f.service.logout_all(user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_assign_roles_replaces_and_skips_unknown() {
        let f = fixture();
        let user = f.service.register(registration("a@b.io")).await.unwrap();

        let roles = f
            .service
            .assign_roles(user.id, &[ROLE_ADMIN.to_string(), "janitor".to_string()])
            .await
            .unwrap();
        let names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec![ROLE_ADMIN]);

        let current = f.service.user_roles(user.id).await.unwrap();
        assert_eq!(current, roles);
    }

    #[tokio::test]
    async fn test_assign_roles_for_unknown_user() {
        let f = fixture();
        let result = f
            .service
            .assign_roles(Uuid::new_v4(), &[ROLE_ADMIN.to_string()])
            .await;
        assert!(matches!(result, Err(AuthError::NotFound("user"))));
    }

    #[tokio::test]
    async fn test_update_profile() {
        let f = fixture();
        let user = f.service.register(registration("a@b.io")).await.unwrap();

        let updated = f
            .service
            .update_profile(
                user.id,
                UpdateUser {
                    name: "Alice Liddell".to_string(),
                    phone: None,
                    status: Some("active".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Alice Liddell");
        assert_eq!(updated.phone, "0812345678");
        assert_eq!(updated.status, "active");
        assert_eq!(updated.role_names(), vec![ROLE_MEMBER.to_string()]);
    }
}
