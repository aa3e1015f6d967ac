//! Common library for the hospital services
//!
//! This crate provides shared functionality used across the workspace
//! services: PostgreSQL connectivity, the storage error taxonomy,
//! pagination and field-level validation messages.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, init_pool, health_check};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     println!("Database health check: {}", health_check(&pool).await);
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod pagination;
pub mod validation;
