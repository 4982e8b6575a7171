//! Content recommendations for the historical-content catalog.
//!
//! The engine in [`services::recommendations`] is pure and synchronous; the
//! [`routes`] module wraps it in an HTTP service.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
