//! Client info extractor - Request origin for the audit trail.

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{header::USER_AGENT, request::Parts},
};
use std::convert::Infallible;
use std::net::SocketAddr;

use crate::domain::RequestContext;

/// Extracts the caller's IP address and user agent, all best-effort.
///
/// IP resolution ladder: first hop of `X-Forwarded-For` (reverse
/// proxies), then `X-Real-IP`, then the transport-level peer address.
/// Nothing here can fail; an entry written for a request with no
/// resolvable origin simply carries nulls.
#[derive(Debug, Clone)]
pub struct ClientInfo(pub RequestContext);

impl ClientInfo {
    pub fn into_context(self) -> RequestContext {
        self.0
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip_address = client_ip(parts);

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        Ok(ClientInfo(RequestContext {
            ip_address,
            user_agent,
        }))
    }
}

fn client_ip(parts: &Parts) -> Option<String> {
    if let Some(forwarded) = parts
        .headers
        .get("X-Forwarded-For")
        .and_then(|h| h.to_str().ok())
    {
        // First IP in the chain is the original client
        if let Some(ip) = forwarded.split(',').next() {
            let ip = ip.trim();
            if !ip.is_empty() {
                return Some(ip.to_string());
            }
        }
    }

    if let Some(real_ip) = parts.headers.get("X-Real-IP").and_then(|h| h.to_str().ok()) {
        return Some(real_ip.to_string());
    }

    parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip().to_string())
}
