use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Domain rules (pure, shared by both repository implementations).
pub mod cascade;
pub mod filters;
pub mod slug;

// Core application services and components.
pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod password;
pub mod repository;
pub mod storage;

// Module for routing segregation (Public, Authenticated).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use storage::{MockStorageService, S3StorageClient, StorageState};

/// ApiDoc
///
/// Aggregates every `#[utoipa::path]` handler and `ToSchema` model into the OpenAPI document
/// served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::accounts::register_user, handlers::accounts::obtain_token,
        handlers::accounts::refresh_token, handlers::accounts::get_me,
        handlers::regions::list_regions, handlers::regions::get_region,
        handlers::regions::create_region, handlers::regions::replace_region,
        handlers::regions::patch_region, handlers::regions::delete_region,
        handlers::region_banners::list_region_banners,
        handlers::region_banners::create_region_banner,
        handlers::region_banners::delete_region_banner,
        handlers::domestic_tours::list_domestic_tours, handlers::domestic_tours::get_domestic_tour,
        handlers::domestic_tours::create_domestic_tour,
        handlers::domestic_tours::replace_domestic_tour,
        handlers::domestic_tours::patch_domestic_tour,
        handlers::domestic_tours::delete_domestic_tour,
        handlers::international_tours::list_international_tours,
        handlers::international_tours::get_international_tour,
        handlers::international_tours::create_international_tour,
        handlers::international_tours::replace_international_tour,
        handlers::international_tours::patch_international_tour,
        handlers::international_tours::delete_international_tour,
        handlers::banners::list_banners, handlers::banners::get_banner,
        handlers::banners::create_banner, handlers::banners::replace_banner,
        handlers::banners::patch_banner, handlers::banners::delete_banner
    ),
    components(
        schemas(
            models::Region, models::RegionBanner, models::TourImage, models::DomesticTour,
            models::InternationalTour, models::Banner, models::BannerType, models::User,
            models::RegisterRequest, models::TokenRequest, models::RefreshRequest,
            models::TokenPair, models::AccessToken, models::MessageResponse,
            models::RegionUpload, models::TourUpload, models::BannerUpload,
            models::RegionBannerUpload, error::ErrorBody,
        )
    ),
    tags(
        (name = "accounts", description = "Registration and JWT tokens"),
        (name = "regions", description = "Regions and their banners"),
        (name = "domestic-tours", description = "Tours inside the country"),
        (name = "international-tours", description = "Tours abroad, grouped by region"),
        (name = "banners", description = "Site banners")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single shared container handed to every handler: persistence, object storage and the
/// loaded configuration.
#[derive(Clone)]
pub struct AppState {
    /// Repository Layer: PostgreSQL in deployments, in-memory in tests.
    pub repo: RepositoryState,
    /// Storage Layer: S3/MinIO for thumbnails, PDFs and images.
    pub storage: StorageState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

// Let extractors such as `AuthUser` pull only the parts of the state they need.

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects the request with 401 unless an `AuthUser` can be extracted from it.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routing tree, applies global and scoped middleware and registers the state.
pub fn create_router(state: AppState) -> Router {
    // 1. CORS Configuration
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");
    let body_limit = state.config.max_upload_bytes;

    // 2. Base Router Assembly
    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        // Write routes: the auth layer only wraps the methods registered here, so the public GETs
        // merged onto the same paths stay open.
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        // Multipart uploads exceed axum's 2 MiB default.
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    // 3. Observability and Correlation Layers
    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens the per-request span carrying method, URI and the `x-request-id` set above, so every
/// log line of one request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
