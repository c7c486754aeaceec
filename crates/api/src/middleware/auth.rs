//! Shared-secret check for the trigger endpoint.
//!
//! The secret travels in the `token` query parameter. When no secret is
//! configured every request passes.

use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use serde::Deserialize;

use courier_common::error::AppError;

use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Proof that the request presented the configured secret.
///
/// Use as an Axum extractor on the trigger route; it rejects with 403 before
/// the handler runs.
#[derive(Debug, Clone, Copy)]
pub struct TriggerAuth;

/// Compare the presented token against the configured one.
pub fn verify_token(expected: Option<&str>, presented: Option<&str>) -> Result<(), AppError> {
    match expected {
        Some(expected) if presented != Some(expected) => {
            Err(AppError::Auth("Forbidden".to_string()))
        }
        _ => Ok(()),
    }
}

impl FromRequestParts<AppState> for TriggerAuth {
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let expected = state.config.webhook_token.clone();
        let presented = Query::<TokenQuery>::try_from_uri(&parts.uri)
            .map(|Query(q)| q.token)
            .unwrap_or_default();

        async move {
            verify_token(expected.as_deref(), presented.as_deref()).inspect_err(|_| {
                tracing::warn!("Trigger rejected: token mismatch");
            })?;
            Ok(TriggerAuth)
        }
    }
}
