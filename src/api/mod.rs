//! API layer - HTTP surface of the hierarchy engine
//!
//! This module contains all HTTP-related concerns:
//! - Request handlers for auth, users, hierarchy and the audit trail
//! - Middleware (JWT authentication with live-row re-fetch)
//! - Custom extractors (validated JSON, request origin)
//! - Route definitions and OpenAPI documentation

pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

pub use openapi::ApiDoc;
pub use routes::create_router;
pub use state::AppState;
