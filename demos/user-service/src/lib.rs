use autoapi::{bootstrap, ServiceConfig};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use utoipa::openapi::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod dtos;
pub mod handlers;

use handlers::UserController;

/// REST routes of the service, plus the document when generation is enabled.
pub fn build_rest_router(config: &ServiceConfig) -> autoapi::Result<(Router, Option<OpenApi>)> {
    let builder = bootstrap::router_builder(config).register(UserController::default())?;
    bootstrap::finish(builder, &config.swagger)
}

pub fn build_swagger_ui(ui_path: &str, openapi: OpenApi) -> SwaggerUi {
    SwaggerUi::new(ui_path.to_string()).url("/api-docs/openapi.json", openapi)
}

pub fn default_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// The full application router.
pub fn build_app(config: &ServiceConfig) -> autoapi::Result<(Router, Option<OpenApi>)> {
    let (rest, openapi) = build_rest_router(config)?;
    let mut app = Router::new().merge(rest);
    if let Some(doc) = &openapi {
        app = app.merge(build_swagger_ui(&config.swagger.ui_path, doc.clone()));
    }
    Ok((app.layer(default_cors_layer()), openapi))
}
