use crate::{
    AppState,
    handlers::{accounts, banners, domestic_tours, international_tours, region_banners, regions},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints open to anonymous clients: health, account creation, token issuance and every
/// catalogue read. Reads return inactive records too unless the caller filters with
/// `is_active=true`.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // --- Accounts ---
        .route("/register", post(accounts::register_user))
        .route("/token", post(accounts::obtain_token))
        .route("/token/refresh", post(accounts::refresh_token))
        // --- Regions ---
        // GET /regions?is_active=...
        .route("/regions", get(regions::list_regions))
        // GET /regions/{key}
        // `key` is a numeric id or a slug.
        .route("/regions/{key}", get(regions::get_region))
        .route(
            "/regions/{key}/banners",
            get(region_banners::list_region_banners),
        )
        // --- Tours ---
        .route("/domestic-tours", get(domestic_tours::list_domestic_tours))
        .route(
            "/domestic-tours/{key}",
            get(domestic_tours::get_domestic_tour),
        )
        // GET /international-tours?is_active=...&region_id=...&region_slug=...
        // An unknown region_slug answers 404.
        .route(
            "/international-tours",
            get(international_tours::list_international_tours),
        )
        .route(
            "/international-tours/{key}",
            get(international_tours::get_international_tour),
        )
        // --- Site Banners ---
        // GET /banners?type=...&is_active=...
        .route("/banners", get(banners::list_banners))
        .route("/banners/{id}", get(banners::get_banner))
}
