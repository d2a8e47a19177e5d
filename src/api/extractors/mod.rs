//! Custom axum extractors.

mod client_info;
mod validated_json;

pub use client_info::ClientInfo;
pub use validated_json::ValidatedJson;
