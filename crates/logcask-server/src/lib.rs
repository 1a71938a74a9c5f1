//! LogCask Backend HTTP Server
//!
//! A stateless HTTP/JSON facade over the storage engine. Each backend
//! instance owns one [`logcask_store::Store`] and exposes:
//!
//! - `GET /db/{key}` - read a record (`404` when the key is unknown)
//! - `POST /db/{key}` - write a record, echoing the request body
//! - `GET /health` - plain-text probe consumed by the load balancer
//! - `/swagger-ui` - OpenAPI documentation
//!
//! The binary seeds a well-known record on startup so a freshly deployed
//! pool serves a readable key immediately.

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use logcask_store::Store;

pub mod handlers;
pub mod models;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    /// When set, `/health` reports failure; used to exercise probe gating.
    pub health_failure: bool,
}

/// OpenAPI specification for the backend surface.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_record, handlers::put_record),
    components(schemas(models::RecordResponse, models::PutRequest)),
    tags((name = "db", description = "Key-value records"))
)]
struct ApiDoc;

/// Create the backend router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    let swagger = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi());

    Router::new()
        .route(
            "/db/:key",
            get(handlers::get_record).post(handlers::put_record),
        )
        .route("/health", get(handlers::health))
        .merge(swagger)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve the router until the process is stopped.
pub async fn serve(router: Router, port: u16) -> std::io::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("backend listening on {}", addr);
    axum::serve(listener, router).await
}
