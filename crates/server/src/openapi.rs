use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};

#[derive(ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Envelope shared by every account and user endpoint.
#[derive(ToSchema)]
pub struct ApiResponseDoc {
    #[schema(value_type = Object, nullable)]
    pub info: Option<serde_json::Value>,
    pub status: u16,
    pub message: String,
}

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::login,
        crate::routes::auth::register,
        crate::routes::auth::verify,
        crate::routes::users::refresh,
    ),
    components(
        schemas(
            HealthResponse,
            ApiResponseDoc,
            crate::routes::auth::LoginRequest,
            crate::routes::auth::RegisterRequest,
            crate::routes::auth::LoginOutput,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health"),
        (name = "account"),
        (name = "users")
    )
)]
pub struct ApiDoc;
