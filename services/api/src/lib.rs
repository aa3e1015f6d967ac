//! Hospital API service
//!
//! Hosts appointment booking on top of the [`auth`] crate's session
//! guard. [`routes::create_router`] assembles the full HTTP surface.

pub mod booking;
pub mod config;
pub mod error;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod validation;
