//! Token issuance.

use std::sync::Arc;

use axum::extract::State;
use store::DocumentStore;

use crate::auth::{Role, Token};
use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::state::AppState;

/// POST /v1/account/login/{role} — issue a bearer token for a role.
#[utoipa::path(
    post,
    path = "/v1/account/login/{role}",
    tag = "account",
    params(("role" = Role, Path, description = "customer or provider")),
    responses(
        (status = 200, description = "Token issued", body = Envelope<Token>),
        (status = 400, description = "Unknown role", body = Envelope<String>),
        (status = 500, description = "Signing failed", body = Envelope<String>)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn login<S: DocumentStore>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(role): ApiPath<Role>,
) -> Result<Envelope<Token>, ApiError> {
    let token = state
        .tokens
        .issue(role)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Envelope::ok(token))
}
