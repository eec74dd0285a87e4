//! Peer IP allow-list for authenticated routes.

use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};

use super::AppState;
use crate::error::ApiError;

/// Whether `ip` is listed. IPv4-mapped IPv6 peers match their IPv4 entry.
#[must_use]
pub fn is_allowed(allowed: &[IpAddr], ip: IpAddr) -> bool {
    let ip = ip.to_canonical();
    allowed.iter().any(|entry| entry.to_canonical() == ip)
}

/// Reject callers outside `ALLOWED_IPS`. An empty list allows everyone.
pub async fn ip_allow_list(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.config.has_ip_allow_list() {
        return Ok(next.run(request).await);
    }

    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    match peer {
        Some(ip) if is_allowed(&state.config.allowed_ips, ip) => Ok(next.run(request).await),
        _ => {
            tracing::warn!(peer = ?peer, "Request from IP outside the allow-list");
            Err(ApiError::Forbidden(
                "Access from this IP is not allowed".into(),
            ))
        }
    }
}
