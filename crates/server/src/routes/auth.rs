use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use common::types::ApiResponse;
use serde::{Deserialize, Serialize};
use tracing::warn;
use utoipa::ToSchema;

use models::account::{validate_email, validate_name};
use service::auth::{
    domain::{AuthSession, LoginInput, RegisterInput},
    repository::AccountStore,
    AuthService,
};

use crate::errors::ApiError;

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone)]
pub struct ServerState {
    pub auth: Arc<AuthService<dyn AccountStore>>,
}

impl ServerState {
    pub fn new(auth: AuthService<dyn AccountStore>) -> Self {
        Self { auth: Arc::new(auth) }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

impl RegisterRequest {
    /// Trim names and email so the stored value is the one validated.
    fn normalized(self) -> Self {
        Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: self.email.trim().to_string(),
            ..self
        }
    }

    fn validate(&self) -> Result<(), ApiError> {
        let invalid = |e: models::errors::ModelError| match e {
            models::errors::ModelError::Validation(msg) => ApiError::Validation(msg),
            other => ApiError::Validation(other.to_string()),
        };
        validate_name("First name", &self.first_name).map_err(invalid)?;
        validate_name("Last name", &self.last_name).map_err(invalid)?;
        validate_email(&self.email).map_err(invalid)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN
            || self.password_confirmation.chars().count() < MIN_PASSWORD_LEN
        {
            return Err(ApiError::Validation(format!("password must be at least {MIN_PASSWORD_LEN} characters long")));
        }
        Ok(())
    }
}

impl From<RegisterRequest> for RegisterInput {
    fn from(r: RegisterRequest) -> Self {
        Self {
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            password: r.password,
            password_confirmation: r.password_confirmation,
        }
    }
}

/// `info` payload of login and refresh.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutput {
    pub token: String,
    pub name: String,
    pub last_name: String,
    pub email: String,
}

impl From<AuthSession> for LoginOutput {
    fn from(s: AuthSession) -> Self {
        Self { token: s.token.token, name: s.name, last_name: s.last_name, email: s.email }
    }
}

/// Success envelope. The HTTP status is always 200; `status` inside the body
/// carries 201 for creations.
pub(crate) fn envelope<T: Serialize>(status: StatusCode, info: T) -> Result<Json<ApiResponse>, ApiError> {
    let info = serde_json::to_value(info).map_err(|e| ApiError::Internal(e.to_string()))?;
    let message = if status == StatusCode::CREATED { ApiResponse::CREATED } else { ApiResponse::OK };
    let body = ApiResponse::new(Some(info), status.as_u16(), message).map_err(|e| ApiError::Internal(e.to_string()))?;
    Ok(Json(body))
}

#[utoipa::path(
    post,
    path = "/account/auth",
    tag = "account",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = crate::openapi::ApiResponseDoc),
        (status = 401, description = "Invalid credentials or account not active", body = crate::openapi::ApiResponseDoc)
    )
)]
pub async fn login(
    State(state): State<ServerState>,
    Json(input): Json<LoginRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let email = input.email.trim().to_string();
    let session = state.auth.login(LoginInput { email, password: input.password }).await?;
    envelope(StatusCode::OK, LoginOutput::from(session))
}

#[utoipa::path(
    post,
    path = "/account/register",
    tag = "account",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Created, pending verification; envelope status is 201", body = crate::openapi::ApiResponseDoc),
        (status = 400, description = "Invalid input or email already taken", body = crate::openapi::ApiResponseDoc)
    )
)]
pub async fn register(
    State(state): State<ServerState>,
    Json(input): Json<RegisterRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let input = input.normalized();
    input.validate()?;
    let summary = state.auth.register(input.into()).await?;
    envelope(StatusCode::CREATED, summary)
}

#[utoipa::path(
    get,
    path = "/account/verify/{token}",
    tag = "account",
    params(("token" = String, Path, description = "Verification token from registration")),
    responses(
        (status = 200, description = "Account verified", body = crate::openapi::ApiResponseDoc),
        (status = 401, description = "Token expired or invalid", body = crate::openapi::ApiResponseDoc),
        (status = 404, description = "No account for token subject", body = crate::openapi::ApiResponseDoc)
    )
)]
pub async fn verify(
    State(state): State<ServerState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let detail = state.auth.verify(&token).await?;
    envelope(StatusCode::OK, detail)
}

/// Extract the token from `Authorization: Bearer <token>`.
fn bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::MissingToken)?;
    match value.strip_prefix("Bearer ") {
        Some(t) if !t.trim().is_empty() => Ok(t.trim().to_string()),
        Some(_) => Err(ApiError::MissingToken),
        None => Err(ApiError::Auth(service::auth::AuthError::TokenInvalid)),
    }
}

/// Resolve the bearer token into a `CurrentPrincipal` request extension.
/// Missing, invalid or superseded tokens stop the request with 401.
pub async fn require_principal(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    let token = bearer_token(req.headers()).map_err(|e| {
        warn!(path = %path, "missing or malformed Authorization header");
        e
    })?;
    let principal = state.auth.authenticate(&token).await.map_err(|e| {
        if e.is_token_error() {
            warn!(path = %path, reason = %e, "token_rejected");
        } else {
            warn!(path = %path, reason = %e, "principal_rejected");
        }
        e
    })?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn req(first: &str, email: &str, pw: &str) -> RegisterRequest {
        RegisterRequest {
            first_name: first.into(),
            last_name: "Lovelace".into(),
            email: email.into(),
            password: pw.into(),
            password_confirmation: pw.into(),
        }
    }

    #[test]
    fn register_request_validation() {
        assert!(req("Ada", "ada@example.com", "Passw0rd!").validate().is_ok());
        assert!(matches!(req("A", "ada@example.com", "Passw0rd!").validate(), Err(ApiError::Validation(_))));
        assert!(matches!(req("Ada", "not-an-email", "Passw0rd!").validate(), Err(ApiError::Validation(_))));
        assert!(matches!(req("Ada", "ada@example.com", "short").validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn padded_fields_are_trimmed_before_validation() {
        let padded = RegisterRequest {
            first_name: "   Ada   ".into(),
            last_name: " Lovelace ".into(),
            email: format!("  {}  ", "ada@example.com"),
            password: " Passw0rd! ".into(),
            password_confirmation: " Passw0rd! ".into(),
        }
        .normalized();
        assert!(padded.validate().is_ok());
        assert_eq!(padded.first_name, "Ada");
        assert_eq!(padded.last_name, "Lovelace");
        assert_eq!(padded.email, "ada@example.com");
        // passwords are taken verbatim
        assert_eq!(padded.password, " Passw0rd! ");

        // padding cannot smuggle an over-long name past the check
        let long = RegisterRequest { first_name: format!(" {} ", "x".repeat(31)), ..req("Ada", "a@b.com", "Passw0rd!") };
        assert!(matches!(long.normalized().validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn bearer_header_parsing() {
        let mut h = HeaderMap::new();
        assert!(matches!(bearer_token(&h), Err(ApiError::MissingToken)));
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&h).unwrap(), "abc.def.ghi");
        h.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert!(matches!(bearer_token(&h), Err(ApiError::Auth(_))));
    }
}
