//! Caller identity extraction.
//!
//! Authentication happens upstream. The gateway forwards who the caller
//! is in two headers, which this extractor turns into a
//! [`CallerContext`]:
//!
//! ```text
//! x-user-role: MANAGER        required, else 401
//! x-store-id:  S1             optional; blank means "no store"
//! ```

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use ledger_core::{CallerContext, Role};

use crate::error::ApiError;

pub const ROLE_HEADER: &str = "x-user-role";
pub const STORE_HEADER: &str = "x-store-id";

/// The resolved caller of a request.
#[derive(Debug, Clone)]
pub struct Caller(pub CallerContext);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers).map(Caller)
    }
}

fn caller_from_headers(headers: &HeaderMap) -> Result<CallerContext, ApiError> {
    let role = header_value(headers, ROLE_HEADER)?
        .ok_or_else(|| ApiError::unauthorized("Missing caller role"))?;
    let store_id = header_value(headers, STORE_HEADER)?;

    Ok(CallerContext::new(Role::parse(&role), store_id))
}

/// Reads a header as trimmed text. Absent and blank both yield `None`.
fn header_value(headers: &HeaderMap, name: &str) -> Result<Option<String>, ApiError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };

    let text = value
        .to_str()
        .map_err(|_| ApiError::bad_request(format!("Header {} is not valid text", name)))?
        .trim();

    Ok((!text.is_empty()).then(|| text.to_string()))
}
