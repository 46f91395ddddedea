use crate::{
    AppState,
    handlers::{accounts, banners, domestic_tours, international_tours, region_banners, regions},
};
use axum::{
    Router,
    routing::{delete, get, post, put},
};

/// Authenticated Router Module
///
/// Every write endpoint of the catalogue plus `/me`. The router is wrapped in the auth
/// middleware by `create_router`; handlers additionally take `AuthUser` to log the acting user.
///
/// Paths overlap with the public router; axum merges the method routers registered for a path.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        .route("/me", get(accounts::get_me))
        // --- Regions ---
        .route("/regions", post(regions::create_region))
        // PUT/PATCH/DELETE /regions/{key}
        // Updates push an is_active change down to the region's international tours;
        // delete deactivates and detaches them.
        .route(
            "/regions/{key}",
            put(regions::replace_region)
                .patch(regions::patch_region)
                .delete(regions::delete_region),
        )
        .route(
            "/regions/{key}/banners",
            post(region_banners::create_region_banner),
        )
        .route(
            "/regions/{key}/banners/{banner_id}",
            delete(region_banners::delete_region_banner),
        )
        // --- Domestic Tours ---
        .route("/domestic-tours", post(domestic_tours::create_domestic_tour))
        .route(
            "/domestic-tours/{key}",
            put(domestic_tours::replace_domestic_tour)
                .patch(domestic_tours::patch_domestic_tour)
                .delete(domestic_tours::delete_domestic_tour),
        )
        // --- International Tours ---
        // Writes naming an inactive region are rejected; writes that keep an inactive region
        // store the tour inactive.
        .route(
            "/international-tours",
            post(international_tours::create_international_tour),
        )
        .route(
            "/international-tours/{key}",
            put(international_tours::replace_international_tour)
                .patch(international_tours::patch_international_tour)
                .delete(international_tours::delete_international_tour),
        )
        // --- Site Banners ---
        .route("/banners", post(banners::create_banner))
        .route(
            "/banners/{id}",
            put(banners::replace_banner)
                .patch(banners::patch_banner)
                .delete(banners::delete_banner),
        )
}
