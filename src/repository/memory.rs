use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Repository, username_taken};
use crate::{
    cascade,
    error::{AppError, AppResult},
    filters::{ActiveFilter, ActiveOnlyFilter, BannerFilter, InternationalTourCriteria, Lookup},
    models::{
        Banner, BannerChanges, DomesticTour, ImageOwner, InternationalTour,
        InternationalTourChanges, NewBanner, NewInternationalTour, NewRegion, NewRegionBanner,
        NewTour, NewTourImage, NewUser, Region, RegionBanner, RegionChanges, TourChanges,
        TourImage, TourKind, User, UserCredentials,
    },
    slug::{self, SlugCandidates},
};

/// Rows addressable by id or slug.
trait Slugged {
    fn slug(&self) -> &str;
}

macro_rules! slugged {
    ($($ty:ty),*) => {
        $(impl Slugged for $ty {
            fn slug(&self) -> &str {
                &self.slug
            }
        })*
    };
}

slugged!(Region, DomesticTour, InternationalTour);

fn find_by_lookup<'a, T: Slugged>(table: &'a BTreeMap<i64, T>, lookup: &Lookup) -> Option<&'a T> {
    match lookup {
        Lookup::Id(id) => table.get(id),
        Lookup::Slug(slug) => table.values().find(|row| row.slug() == slug),
    }
}

/// Next identifier as the Postgres implementation computes it for slug suffixes.
fn next_id<T>(table: &BTreeMap<i64, T>) -> i64 {
    table.keys().next_back().map_or(1, |id| id + 1)
}

fn assign_slug<T: Slugged>(
    table: &BTreeMap<i64, T>,
    name: &str,
    fallback: &str,
) -> AppResult<String> {
    let base = slug::base_slug(name, fallback);
    SlugCandidates::new(base.clone(), next_id(table))
        .find(|candidate| !table.values().any(|row| row.slug() == candidate))
        .ok_or_else(|| AppError::SlugConflict(slug::exhausted_message(&base)))
}

#[derive(Default)]
struct Sequence(i64);

impl Sequence {
    fn next(&mut self) -> i64 {
        self.0 += 1;
        self.0
    }
}

struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Default)]
struct Tables {
    regions: BTreeMap<i64, Region>,
    region_banners: BTreeMap<i64, RegionBanner>,
    domestic_tours: BTreeMap<i64, DomesticTour>,
    international_tours: BTreeMap<i64, InternationalTour>,
    images: BTreeMap<i64, (ImageOwner, TourImage)>,
    banners: BTreeMap<i64, Banner>,
    users: HashMap<Uuid, StoredUser>,
    region_seq: Sequence,
    region_banner_seq: Sequence,
    domestic_seq: Sequence,
    international_seq: Sequence,
    image_seq: Sequence,
    banner_seq: Sequence,
}

impl Tables {
    fn insert_images(&mut self, owner: ImageOwner, images: Vec<NewTourImage>) {
        for image in images {
            let id = self.image_seq.next();
            let row = TourImage {
                id,
                image: image.image,
                caption: image.caption,
            };
            self.images.insert(id, (owner, row));
        }
    }

    fn images_of(&self, owner: ImageOwner) -> Vec<TourImage> {
        self.images
            .values()
            .filter(|(row_owner, _)| *row_owner == owner)
            .map(|(_, image)| image.clone())
            .collect()
    }

    fn remove_images_of(&mut self, owner: ImageOwner) {
        self.images.retain(|_, (row_owner, _)| *row_owner != owner);
    }

    fn domestic_view(&self, tour: &DomesticTour) -> DomesticTour {
        DomesticTour {
            images: self.images_of(ImageOwner::domestic(tour.id)),
            ..tour.clone()
        }
    }

    fn international_view(&self, tour: &InternationalTour) -> InternationalTour {
        InternationalTour {
            images: self.images_of(ImageOwner::international(tour.id)),
            region: tour.region_id.and_then(|id| self.regions.get(&id).cloned()),
            ..tour.clone()
        }
    }
}

/// Copies every `Some` field of a `TourChanges` onto a domestic or international tour.
macro_rules! apply_tour_changes {
    ($tour:expr, $changes:expr) => {{
        let changes: TourChanges = $changes;
        let tour = $tour;
        if let Some(value) = changes.name {
            tour.name = value;
        }
        if let Some(value) = changes.airline {
            tour.airline = value;
        }
        if let Some(value) = changes.start_date {
            tour.start_date = value;
        }
        if let Some(value) = changes.end_date {
            tour.end_date = value;
        }
        if let Some(value) = changes.price {
            tour.price = value;
        }
        if let Some(value) = changes.description {
            tour.description = value;
        }
        if let Some(value) = changes.is_active {
            tour.is_active = value;
        }
        if let Some(value) = changes.thumbnail {
            tour.thumbnail = value;
        }
        if let Some(value) = changes.tour_program_pdf {
            tour.tour_program_pdf = Some(value);
        }
        tour.updated_at = Utc::now();
    }};
}

/// InMemoryRepository
///
/// A `Repository` kept entirely in process memory. All tables sit behind one async mutex, so
/// every operation (including its cascade) is atomic with respect to the others. Used by the
/// HTTP test suite and for running the API without a database.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    // --- REGIONS ---

    async fn list_regions(&self, filter: ActiveOnlyFilter) -> AppResult<Vec<Region>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .regions
            .values()
            .filter(|region| filter.is_active.matches(region.is_active))
            .cloned()
            .collect())
    }

    async fn find_region(&self, lookup: &Lookup) -> AppResult<Option<Region>> {
        let tables = self.tables.lock().await;
        Ok(find_by_lookup(&tables.regions, lookup).cloned())
    }

    async fn create_region(&self, input: NewRegion) -> AppResult<Region> {
        let mut tables = self.tables.lock().await;
        let slug = assign_slug(&tables.regions, &input.name, "region")?;
        let region = Region {
            id: tables.region_seq.next(),
            name: input.name,
            slug,
            is_active: input.is_active,
            thumbnail: input.thumbnail,
        };
        tables.regions.insert(region.id, region.clone());
        Ok(region)
    }

    async fn update_region(&self, id: i64, changes: RegionChanges) -> AppResult<Option<Region>> {
        let mut tables = self.tables.lock().await;
        let Some(region) = tables.regions.get_mut(&id) else {
            return Ok(None);
        };
        let pushed = cascade::region_cascade(region.is_active, changes.is_active);
        if let Some(name) = changes.name {
            region.name = name;
        }
        if let Some(is_active) = changes.is_active {
            region.is_active = is_active;
        }
        if let Some(thumbnail) = changes.thumbnail {
            region.thumbnail = Some(thumbnail);
        }
        let region = region.clone();

        if let Some(state) = pushed {
            let now = Utc::now();
            let mut tours = 0;
            for tour in tables
                .international_tours
                .values_mut()
                .filter(|tour| tour.region_id == Some(id))
            {
                tour.is_active = state;
                tour.updated_at = now;
                tours += 1;
            }
            tracing::info!(
                region_id = id,
                is_active = state,
                tours,
                "region activation cascaded to international tours"
            );
        }
        Ok(Some(region))
    }

    async fn delete_region(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        if tables.regions.remove(&id).is_none() {
            return Ok(false);
        }
        let now = Utc::now();
        for tour in tables
            .international_tours
            .values_mut()
            .filter(|tour| tour.region_id == Some(id))
        {
            tour.is_active = cascade::DELETED_REGION_TOUR_STATE;
            tour.region_id = None;
            tour.updated_at = now;
        }
        tables.region_banners.retain(|_, banner| banner.region_id != id);
        tracing::info!(region_id = id, "region deleted, tours deactivated");
        Ok(true)
    }

    // --- REGION BANNERS ---

    async fn list_region_banners(
        &self,
        region_id: i64,
        is_active: ActiveFilter,
    ) -> AppResult<Vec<RegionBanner>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .region_banners
            .values()
            .filter(|banner| banner.region_id == region_id && is_active.matches(banner.is_active))
            .cloned()
            .collect())
    }

    async fn create_region_banner(
        &self,
        region_id: i64,
        input: NewRegionBanner,
    ) -> AppResult<RegionBanner> {
        let mut tables = self.tables.lock().await;
        if !tables.regions.contains_key(&region_id) {
            return Err(AppError::NotFound(format!("Region '{region_id}' not found")));
        }
        let banner = RegionBanner {
            id: tables.region_banner_seq.next(),
            region_id,
            image: input.image,
            title: input.title,
            description: input.description,
            is_active: input.is_active,
        };
        tables.region_banners.insert(banner.id, banner.clone());
        Ok(banner)
    }

    async fn delete_region_banner(&self, region_id: i64, banner_id: i64) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        let owned = tables
            .region_banners
            .get(&banner_id)
            .is_some_and(|banner| banner.region_id == region_id);
        if owned {
            tables.region_banners.remove(&banner_id);
        }
        Ok(owned)
    }

    // --- DOMESTIC TOURS ---

    async fn list_domestic_tours(&self, filter: ActiveOnlyFilter) -> AppResult<Vec<DomesticTour>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .domestic_tours
            .values()
            .filter(|tour| filter.is_active.matches(tour.is_active))
            .map(|tour| tables.domestic_view(tour))
            .collect())
    }

    async fn find_domestic_tour(&self, lookup: &Lookup) -> AppResult<Option<DomesticTour>> {
        let tables = self.tables.lock().await;
        Ok(find_by_lookup(&tables.domestic_tours, lookup).map(|tour| tables.domestic_view(tour)))
    }

    async fn create_domestic_tour(
        &self,
        input: NewTour,
        images: Vec<NewTourImage>,
    ) -> AppResult<DomesticTour> {
        let mut tables = self.tables.lock().await;
        let slug = assign_slug(
            &tables.domestic_tours,
            &input.name,
            TourKind::Domestic.label(),
        )?;
        let now = Utc::now();
        let tour = DomesticTour {
            id: tables.domestic_seq.next(),
            name: input.name,
            slug,
            airline: input.airline,
            start_date: input.start_date,
            end_date: input.end_date,
            price: input.price,
            description: input.description,
            is_active: input.is_active,
            thumbnail: input.thumbnail,
            tour_program_pdf: input.tour_program_pdf,
            created_at: now,
            updated_at: now,
            images: Vec::new(),
        };
        tables.insert_images(ImageOwner::domestic(tour.id), images);
        tables.domestic_tours.insert(tour.id, tour.clone());
        Ok(tables.domestic_view(&tour))
    }

    async fn update_domestic_tour(
        &self,
        id: i64,
        changes: TourChanges,
        images: Vec<NewTourImage>,
    ) -> AppResult<Option<DomesticTour>> {
        let mut tables = self.tables.lock().await;
        let Some(tour) = tables.domestic_tours.get_mut(&id) else {
            return Ok(None);
        };
        apply_tour_changes!(&mut *tour, changes);
        let tour = tour.clone();
        tables.insert_images(ImageOwner::domestic(id), images);
        Ok(Some(tables.domestic_view(&tour)))
    }

    async fn delete_domestic_tour(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        let removed = tables.domestic_tours.remove(&id).is_some();
        if removed {
            tables.remove_images_of(ImageOwner::domestic(id));
        }
        Ok(removed)
    }

    // --- INTERNATIONAL TOURS ---

    async fn list_international_tours(
        &self,
        criteria: &InternationalTourCriteria,
    ) -> AppResult<Vec<InternationalTour>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .international_tours
            .values()
            .filter(|tour| criteria.matches(tour.is_active, tour.region_id))
            .map(|tour| tables.international_view(tour))
            .collect())
    }

    async fn find_international_tour(
        &self,
        lookup: &Lookup,
    ) -> AppResult<Option<InternationalTour>> {
        let tables = self.tables.lock().await;
        Ok(find_by_lookup(&tables.international_tours, lookup)
            .map(|tour| tables.international_view(tour)))
    }

    async fn create_international_tour(
        &self,
        input: NewInternationalTour,
        images: Vec<NewTourImage>,
    ) -> AppResult<InternationalTour> {
        let mut tables = self.tables.lock().await;
        let region = tables.regions.get(&input.region_id).ok_or_else(|| {
            AppError::Validation(format!(
                "region_id: Invalid pk \"{}\" - region does not exist.",
                input.region_id
            ))
        })?;
        let is_active = cascade::effective_tour_state(Some(region), input.tour.is_active);

        let tour = input.tour;
        let slug = assign_slug(
            &tables.international_tours,
            &tour.name,
            TourKind::International.label(),
        )?;
        let now = Utc::now();
        let created = InternationalTour {
            id: tables.international_seq.next(),
            name: tour.name,
            slug,
            airline: tour.airline,
            start_date: tour.start_date,
            end_date: tour.end_date,
            price: tour.price,
            description: tour.description,
            is_active,
            region_id: Some(input.region_id),
            region: None,
            thumbnail: tour.thumbnail,
            tour_program_pdf: tour.tour_program_pdf,
            created_at: now,
            updated_at: now,
            images: Vec::new(),
        };
        tables.insert_images(ImageOwner::international(created.id), images);
        tables
            .international_tours
            .insert(created.id, created.clone());
        Ok(tables.international_view(&created))
    }

    async fn update_international_tour(
        &self,
        id: i64,
        changes: InternationalTourChanges,
        images: Vec<NewTourImage>,
    ) -> AppResult<Option<InternationalTour>> {
        let mut tables = self.tables.lock().await;
        let Some(current) = tables.international_tours.get(&id) else {
            return Ok(None);
        };

        let region_id = changes.region_id.or(current.region_id);
        let region = region_id.and_then(|region_id| tables.regions.get(&region_id).cloned());
        if let (Some(requested), None) = (changes.region_id, &region) {
            return Err(AppError::Validation(format!(
                "region_id: Invalid pk \"{requested}\" - region does not exist."
            )));
        }
        let requested = changes.tour.is_active.unwrap_or(current.is_active);
        let is_active = cascade::effective_tour_state(region.as_ref(), requested);

        let Some(tour) = tables.international_tours.get_mut(&id) else {
            return Ok(None);
        };
        apply_tour_changes!(&mut *tour, changes.tour);
        tour.is_active = is_active;
        tour.region_id = region.as_ref().map(|region| region.id);
        let tour = tour.clone();
        tables.insert_images(ImageOwner::international(id), images);
        Ok(Some(tables.international_view(&tour)))
    }

    async fn delete_international_tour(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        let removed = tables.international_tours.remove(&id).is_some();
        if removed {
            tables.remove_images_of(ImageOwner::international(id));
        }
        Ok(removed)
    }

    // --- BANNERS ---

    async fn list_banners(&self, filter: BannerFilter) -> AppResult<Vec<Banner>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .banners
            .values()
            .filter(|banner| filter.matches(banner.is_active, banner.banner_type))
            .cloned()
            .collect())
    }

    async fn find_banner(&self, id: i64) -> AppResult<Option<Banner>> {
        let tables = self.tables.lock().await;
        Ok(tables.banners.get(&id).cloned())
    }

    async fn create_banner(&self, input: NewBanner) -> AppResult<Banner> {
        let mut tables = self.tables.lock().await;
        let banner = Banner {
            id: tables.banner_seq.next(),
            title: input.title,
            description: input.description,
            image: input.image,
            banner_type: input.banner_type,
            is_active: input.is_active,
        };
        tables.banners.insert(banner.id, banner.clone());
        Ok(banner)
    }

    async fn update_banner(&self, id: i64, changes: BannerChanges) -> AppResult<Option<Banner>> {
        let mut tables = self.tables.lock().await;
        let Some(banner) = tables.banners.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            banner.title = title;
        }
        if let Some(description) = changes.description {
            banner.description = Some(description);
        }
        if let Some(image) = changes.image {
            banner.image = image;
        }
        if let Some(banner_type) = changes.banner_type {
            banner.banner_type = banner_type;
        }
        if let Some(is_active) = changes.is_active {
            banner.is_active = is_active;
        }
        Ok(Some(banner.clone()))
    }

    async fn delete_banner(&self, id: i64) -> AppResult<bool> {
        let mut tables = self.tables.lock().await;
        Ok(tables.banners.remove(&id).is_some())
    }

    // --- USERS ---

    async fn create_user(&self, input: NewUser) -> AppResult<User> {
        let mut tables = self.tables.lock().await;
        if tables
            .users
            .values()
            .any(|stored| stored.user.username == input.username)
        {
            return Err(username_taken(&input.username));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: input.username,
            email: input.email,
            created_at: Utc::now(),
        };
        tables.users.insert(
            user.id,
            StoredUser {
                user: user.clone(),
                password_hash: input.password_hash,
            },
        );
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&id).map(|stored| stored.user.clone()))
    }

    async fn find_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|stored| stored.user.username == username)
            .map(|stored| UserCredentials {
                id: stored.user.id,
                username: stored.user.username.clone(),
                password_hash: stored.password_hash.clone(),
            }))
    }
}
