use crate::{
    error::AppResult,
    filters::{ActiveFilter, ActiveOnlyFilter, BannerFilter, InternationalTourCriteria, Lookup},
    models::{
        Banner, BannerChanges, DomesticTour, InternationalTour, InternationalTourChanges,
        NewBanner, NewInternationalTour, NewRegion, NewRegionBanner, NewTour, NewTourImage,
        NewUser, Region, RegionBanner, RegionChanges, TourChanges, User, UserCredentials,
    },
};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// Repository Trait
///
/// The persistence contract behind every handler. Each write method is atomic: slug
/// assignment, cascades and image inserts happen inside the same transaction (Postgres) or
/// the same lock (in-memory) as the write that triggers them.
///
/// `update_*` and `delete_*` return `None`/`false` when the row does not exist.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Regions ---
    async fn list_regions(&self, filter: ActiveOnlyFilter) -> AppResult<Vec<Region>>;
    async fn find_region(&self, lookup: &Lookup) -> AppResult<Option<Region>>;
    // Assigns the slug.
    async fn create_region(&self, input: NewRegion) -> AppResult<Region>;
    // Cascades an is_active change to the region's international tours.
    async fn update_region(&self, id: i64, changes: RegionChanges) -> AppResult<Option<Region>>;
    // Deactivates the region's international tours, then removes the region and its banners.
    async fn delete_region(&self, id: i64) -> AppResult<bool>;

    // --- Region Banners ---
    async fn list_region_banners(
        &self,
        region_id: i64,
        is_active: ActiveFilter,
    ) -> AppResult<Vec<RegionBanner>>;
    async fn create_region_banner(
        &self,
        region_id: i64,
        input: NewRegionBanner,
    ) -> AppResult<RegionBanner>;
    async fn delete_region_banner(&self, region_id: i64, banner_id: i64) -> AppResult<bool>;

    // --- Domestic Tours ---
    async fn list_domestic_tours(&self, filter: ActiveOnlyFilter) -> AppResult<Vec<DomesticTour>>;
    async fn find_domestic_tour(&self, lookup: &Lookup) -> AppResult<Option<DomesticTour>>;
    async fn create_domestic_tour(
        &self,
        input: NewTour,
        images: Vec<NewTourImage>,
    ) -> AppResult<DomesticTour>;
    async fn update_domestic_tour(
        &self,
        id: i64,
        changes: TourChanges,
        images: Vec<NewTourImage>,
    ) -> AppResult<Option<DomesticTour>>;
    // Hard-deletes the tour and its images.
    async fn delete_domestic_tour(&self, id: i64) -> AppResult<bool>;

    // --- International Tours ---
    async fn list_international_tours(
        &self,
        criteria: &InternationalTourCriteria,
    ) -> AppResult<Vec<InternationalTour>>;
    async fn find_international_tour(
        &self,
        lookup: &Lookup,
    ) -> AppResult<Option<InternationalTour>>;
    // Forces is_active=false when the region is inactive.
    async fn create_international_tour(
        &self,
        input: NewInternationalTour,
        images: Vec<NewTourImage>,
    ) -> AppResult<InternationalTour>;
    async fn update_international_tour(
        &self,
        id: i64,
        changes: InternationalTourChanges,
        images: Vec<NewTourImage>,
    ) -> AppResult<Option<InternationalTour>>;
    async fn delete_international_tour(&self, id: i64) -> AppResult<bool>;

    // --- Banners ---
    async fn list_banners(&self, filter: BannerFilter) -> AppResult<Vec<Banner>>;
    async fn find_banner(&self, id: i64) -> AppResult<Option<Banner>>;
    async fn create_banner(&self, input: NewBanner) -> AppResult<Banner>;
    async fn update_banner(&self, id: i64, changes: BannerChanges) -> AppResult<Option<Banner>>;
    async fn delete_banner(&self, id: i64) -> AppResult<bool>;

    // --- Users ---
    // Fails with a validation error when the username is taken.
    async fn create_user(&self, input: NewUser) -> AppResult<User>;
    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn find_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// Error message for a duplicate username, shared by both implementations.
pub(crate) fn username_taken(username: &str) -> crate::error::AppError {
    crate::error::AppError::Validation(format!(
        "username: A user with the username '{username}' already exists."
    ))
}
