//! Authentication service
//!
//! Users register with an email and password, log in to receive an opaque
//! `<tokenRecordId>|<secret>` bearer credential, and present it on protected
//! routes. [`middleware::require_session`] validates the credential and
//! attaches an [`session::AuthSession`]; [`middleware::require_abilities`]
//! then checks the role names captured at login.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod password;
pub mod repositories;
pub mod routes;
pub mod service;
pub mod session;
pub mod validation;

pub use config::{AuthConfig, HashingCost};
pub use error::AuthError;
pub use service::AuthService;
pub use session::AuthSession;
