//! API service routes

use auth::{AuthSession, middleware::require_session};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use common::pagination::{PageQuery, PageRequest};
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        Appointment, AppointmentListResponse, AvailabilityResponse, CancelAppointmentRequest,
        CheckAvailabilityRequest, CreateAppointmentRequest, RescheduleAppointmentRequest,
    },
    state::AppState,
    validation,
};

/// Create the router for the whole API: health, `/auth/*` and
/// `/appointments/*`
pub fn create_router(state: AppState) -> Router {
    let appointments = Router::new()
        .route("/appointments", post(create_appointment))
        .route("/appointments/me", get(my_appointments))
        .route("/appointments/doctor/:doctor_id", get(doctor_appointments))
        .route("/appointments/check-availability", post(check_availability))
        .route("/appointments/:id", get(get_appointment))
        .route("/appointments/:id/cancel", post(cancel_appointment))
        .route("/appointments/:id/reschedule", post(reschedule_appointment))
        .route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_session,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(appointments)
        .with_state(state.clone())
        .merge(auth::routes::create_router(state.auth))
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match &state.db_pool {
        Some(pool) => common::database::health_check(pool).await,
        None => true,
    };
    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(json!({
            "status": label,
            "service": "api-service",
            "database": database
        })),
    )
}

fn list_response(page: common::pagination::Page<Appointment>) -> AppointmentListResponse {
    AppointmentListResponse {
        pagination: page.pagination(),
        appointments: page.items,
    }
}

pub async fn create_appointment(
    State(state): State<AppState>,
    session: AuthSession,
    Json(payload): Json<CreateAppointmentRequest>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_create(&payload).map_err(ApiError::Validation)?;
    let appointment = state.appointments.create(session.user_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(appointment)))
}

pub async fn my_appointments(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = state
        .appointments
        .get_by_user(session.user_id, PageRequest::from(query))
        .await?;
    Ok(Json(list_response(page)))
}

pub async fn doctor_appointments(
    State(state): State<AppState>,
    Path(doctor_id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = state
        .appointments
        .get_by_doctor(doctor_id, PageRequest::from(query))
        .await?;
    Ok(Json(list_response(page)))
}

pub async fn check_availability(
    State(state): State<AppState>,
    Json(payload): Json<CheckAvailabilityRequest>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_availability(&payload).map_err(ApiError::Validation)?;
    let is_available = state.appointments.check_availability(&payload).await?;
    Ok(Json(AvailabilityResponse { is_available }))
}

pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.appointments.get_by_id(id).await?))
}

pub async fn cancel_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    session: AuthSession,
    Json(payload): Json<CancelAppointmentRequest>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_cancel(&payload).map_err(ApiError::Validation)?;
    let appointment = state
        .appointments
        .cancel(id, session.user_id, &payload)
        .await?;
    Ok(Json(appointment))
}

pub async fn reschedule_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    session: AuthSession,
    Json(payload): Json<RescheduleAppointmentRequest>,
) -> ApiResult<impl IntoResponse> {
    validation::validate_reschedule(&payload).map_err(ApiError::Validation)?;
    let appointment = state
        .appointments
        .reschedule(id, session.user_id, &payload)
        .await?;
    Ok(Json(appointment))
}
