use std::net::{IpAddr, SocketAddr};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};

use crate::http::error::ApiError;
use crate::http::state::AppState;
use crate::identity::resolve_caller_address;

/// Canonical address of whoever sent the request.
///
/// Needs the server to be run with `into_make_service_with_connect_info::<SocketAddr>()`;
/// tests insert `ConnectInfo` into the request extensions instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller(pub IpAddr);

impl FromRequestParts<AppState> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ConnectInfo(peer) = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .cloned()
            .ok_or_else(|| ApiError::Internal("peer address unavailable".to_string()))?;
        Ok(Caller(resolve_caller_address(peer, &parts.headers, state.trust_proxy)))
    }
}
