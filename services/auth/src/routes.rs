//! Authentication service routes

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::AuthError,
    middleware::{AbilityRequirement, require_abilities, require_session},
    models::{AssignRolesRequest, LoginCredentials, ROLE_ADMIN, RegisterRequest, UpdateUser},
    service::AuthService,
    session::AuthSession,
};

/// Create the router for the authentication endpoints
pub fn create_router(service: AuthService) -> Router {
    let admin = Router::new()
        .route(
            "/auth/users/:id/roles",
            get(get_user_roles).put(assign_roles),
        )
        .route_layer(middleware::from_fn_with_state(
            AbilityRequirement::one(ROLE_ADMIN),
            require_abilities,
        ));

    let protected = Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/logout-all", post(logout_all))
        .route("/auth/users/me", get(get_me).put(update_me))
        .merge(admin)
        .route_layer(middleware::from_fn_with_state(
            service.clone(),
            require_session,
        ));

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .merge(protected)
        .with_state(service)
}

/// User registration endpoint
pub async fn register(
    State(service): State<AuthService>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("Registration attempt for: {}", payload.email);
    let user = service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// User login endpoint
pub async fn login(
    State(service): State<AuthService>,
    Json(payload): Json<LoginCredentials>,
) -> Result<impl IntoResponse, AuthError> {
    let response = service.login(payload).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Invalidate the session that authenticated this request
pub async fn logout(
    State(service): State<AuthService>,
    session: AuthSession,
) -> Result<impl IntoResponse, AuthError> {
    service.logout(session.token_id).await?;
    Ok(Json(json!({ "message": "logged out" })))
}

/// Invalidate every session of the caller
pub async fn logout_all(
    State(service): State<AuthService>,
    session: AuthSession,
) -> Result<impl IntoResponse, AuthError> {
    let revoked = service.logout_all(session.user_id).await?;
    Ok(Json(json!({ "revoked": revoked })))
}

pub async fn get_me(
    State(service): State<AuthService>,
    session: AuthSession,
) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(service.get_user(session.user_id).await?))
}

pub async fn update_me(
    State(service): State<AuthService>,
    session: AuthSession,
    Json(payload): Json<UpdateUser>,
) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(service.update_profile(session.user_id, payload).await?))
}

pub async fn get_user_roles(
    State(service): State<AuthService>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, AuthError> {
    Ok(Json(service.user_roles(user_id).await?))
}

pub async fn assign_roles(
    State(service): State<AuthService>,
    Path(user_id): Path<Uuid>,
    session: AuthSession,
    Json(payload): Json<AssignRolesRequest>,
) -> Result<impl IntoResponse, AuthError> {
    info!("User {} assigning roles to {}", session.user_id, user_id);
    Ok(Json(service.assign_roles(user_id, &payload.role_names).await?))
}
