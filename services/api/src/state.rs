//! Application state shared across handlers

use auth::AuthService;
use sqlx::PgPool;

use crate::booking::AppointmentService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Absent when the services run on in-memory stores
    pub db_pool: Option<PgPool>,
    pub auth: AuthService,
    pub appointments: AppointmentService,
}
