use axum::{extract::State, http::StatusCode, Extension, Json};
use common::types::ApiResponse;
use service::auth::domain::CurrentPrincipal;

use super::auth::{envelope, LoginOutput, ServerState};
use crate::errors::ApiError;

/// Rotate the caller's session. The bearer token used for this request is
/// superseded by the one returned.
#[utoipa::path(
    put,
    path = "/users/refresh",
    tag = "users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "New session token", body = crate::openapi::ApiResponseDoc),
        (status = 401, description = "Missing, invalid or superseded token", body = crate::openapi::ApiResponseDoc)
    )
)]
pub async fn refresh(
    State(state): State<ServerState>,
    Extension(principal): Extension<CurrentPrincipal>,
) -> Result<Json<ApiResponse>, ApiError> {
    let session = state.auth.refresh(principal).await?;
    envelope(StatusCode::OK, LoginOutput::from(session))
}
