//! Request id extractor
//!
//! Reads the id set by `SetRequestIdLayer` so services can stamp audit rows.

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::middleware::REQUEST_ID_HEADER;

/// Width of `audit_logs.request_id`; longer client-supplied ids are cut
pub const MAX_REQUEST_ID_LEN: usize = 100;

#[derive(Debug, Clone, Default)]
pub struct RequestId(pub Option<String>);

impl RequestId {
    pub(crate) fn from_parts(parts: &Parts) -> Self {
        Self(
            parts
                .headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| v.chars().take(MAX_REQUEST_ID_LEN).collect()),
        )
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}
