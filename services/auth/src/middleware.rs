//! Bearer token guard and ability checks

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, StatusCode, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::warn;

use crate::{
    error::{AuthError, error_response},
    service::AuthService,
    session::{AuthSession, BearerCredential, CredentialError},
};

/// Reasons a protected request is rejected before reaching its handler
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("missing authorization header")]
    MissingHeader,

    #[error("invalid authorization format")]
    InvalidScheme,

    #[error("invalid token format")]
    MalformedCredential,

    #[error(transparent)]
    Session(#[from] AuthError),

    #[error("user not found")]
    UnknownUser,

    #[error("missing user abilities")]
    MissingAbilities,

    #[error("insufficient permissions")]
    Forbidden,
}

impl From<CredentialError> for GuardError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidScheme => GuardError::InvalidScheme,
            CredentialError::Malformed => GuardError::MalformedCredential,
        }
    }
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        match self {
            GuardError::Session(err) => err.into_response(),
            GuardError::Forbidden => error_response(StatusCode::FORBIDDEN, &self.to_string(), None),
            _ => error_response(StatusCode::UNPROCESSABLE_ENTITY, &self.to_string(), None),
        }
    }
}

/// Validate the bearer credential, confirm its user still exists and
/// attach an [`AuthSession`] to the request extensions
pub async fn require_session(
    State(service): State<AuthService>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(GuardError::MissingHeader)?
        .to_str()
        .map_err(|_| GuardError::InvalidScheme)?;

    let credential = BearerCredential::from_header(header)?;

    let token = service
        .validate_token(&credential.token_id, &credential.secret)
        .await
        .inspect_err(|e| warn!("Rejected session credential: {}", e))?;

    match service.get_user(token.user_id).await {
        Ok(_) => {}
        Err(AuthError::NotFound(_)) => {
            warn!("Session {} belongs to a missing user {}", token.id, token.user_id);
            return Err(GuardError::UnknownUser);
        }
        Err(e) => return Err(e.into()),
    }

    req.extensions_mut().insert(AuthSession::from(token));

    Ok(next.run(req).await)
}

/// Ability requirement evaluated against the session's ability snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbilityRequirement {
    One(String),
    Any(Vec<String>),
    All(Vec<String>),
}

impl AbilityRequirement {
    pub fn one(ability: &str) -> Self {
        AbilityRequirement::One(ability.to_string())
    }

    pub fn any(abilities: &[&str]) -> Self {
        AbilityRequirement::Any(abilities.iter().map(|a| a.to_string()).collect())
    }

    pub fn all(abilities: &[&str]) -> Self {
        AbilityRequirement::All(abilities.iter().map(|a| a.to_string()).collect())
    }

    pub fn is_satisfied_by(&self, session: &AuthSession) -> bool {
        match self {
            AbilityRequirement::One(ability) => session.has_ability(ability),
            AbilityRequirement::Any(abilities) => session.has_any(abilities),
            AbilityRequirement::All(abilities) => session.has_all(abilities),
        }
    }
}

/// Second middleware stage; must run inside [`require_session`]
pub async fn require_abilities(
    State(requirement): State<AbilityRequirement>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, GuardError> {
    let session = req
        .extensions()
        .get::<AuthSession>()
        .ok_or(GuardError::MissingAbilities)?;

    if !requirement.is_satisfied_by(session) {
        warn!(
            "User {} lacks required abilities {:?}",
            session.user_id, requirement
        );
        return Err(GuardError::Forbidden);
    }

    Ok(next.run(req).await)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = GuardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .ok_or(GuardError::MissingAbilities)
    }
}
