use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, postgres::PgRow, query_builder::QueryBuilder};
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

const REGION_COLUMNS: &str = "id, name, slug, is_active, thumbnail";
const REGION_BANNER_COLUMNS: &str = "id, region_id, image, title, description, is_active";
const DOMESTIC_COLUMNS: &str = "id, name, slug, airline, start_date, end_date, price, description, \
     is_active, thumbnail, tour_program_pdf, created_at, updated_at";
const INTERNATIONAL_COLUMNS: &str = "id, name, slug, airline, start_date, end_date, price, \
     description, is_active, region_id, thumbnail, tour_program_pdf, created_at, updated_at";
const BANNER_COLUMNS: &str = "id, title, description, image, type, is_active";
const USER_COLUMNS: &str = "id, username, email, created_at";

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL. Multi-statement writes run in one
/// transaction; every query is built at runtime (`query_as` / `QueryBuilder`) with bound
/// parameters only.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn tour_table(kind: TourKind) -> &'static str {
    match kind {
        TourKind::Domestic => "domestic_tours",
        TourKind::International => "international_tours",
    }
}

/// Fetches one row of `table` by id or slug.
async fn fetch_by_lookup<T>(
    conn: &mut PgConnection,
    columns: &str,
    table: &str,
    lookup: &Lookup,
) -> AppResult<Option<T>>
where
    T: for<'r> sqlx::FromRow<'r, PgRow> + Send + Unpin,
{
    let mut builder: QueryBuilder<Postgres> =
        QueryBuilder::new(format!("SELECT {columns} FROM {table} WHERE "));
    match lookup {
        Lookup::Id(id) => builder.push("id = ").push_bind(*id),
        Lookup::Slug(slug) => builder.push("slug = ").push_bind(slug.clone()),
    };
    Ok(builder.build_query_as::<T>().fetch_optional(conn).await?)
}

/// slug_candidates
///
/// The base slug for `name` and its bounded candidate sequence in `table`. Each create tries the
/// candidates with `INSERT .. ON CONFLICT (slug) DO NOTHING`, so a concurrent insert that takes
/// a candidate first only moves it on to the next one.
async fn slug_candidates(
    conn: &mut PgConnection,
    table: &'static str,
    name: &str,
    fallback: &str,
) -> AppResult<(String, SlugCandidates)> {
    let base = slug::base_slug(name, fallback);
    let next_id: i64 = sqlx::query_scalar(&format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {table}"))
        .fetch_one(&mut *conn)
        .await?;
    let candidates = SlugCandidates::new(base.clone(), next_id);
    Ok((base, candidates))
}

/// Unwraps the row of the first candidate that was free.
fn slug_assigned<T>(table: &'static str, base: &str, row: Option<T>) -> AppResult<T> {
    row.ok_or_else(|| {
        tracing::warn!(table, base, "slug candidates exhausted");
        AppError::SlugConflict(slug::exhausted_message(base))
    })
}

async fn insert_images(
    conn: &mut PgConnection,
    owner: ImageOwner,
    images: Vec<NewTourImage>,
) -> AppResult<()> {
    if images.is_empty() {
        return Ok(());
    }
    let (domestic_id, international_id) = owner.columns();
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
        "INSERT INTO tour_images (domestic_tour_id, international_tour_id, image, caption) ",
    );
    builder.push_values(images, |mut row, image| {
        row.push_bind(domestic_id)
            .push_bind(international_id)
            .push_bind(image.image)
            .push_bind(image.caption);
    });
    builder.build().execute(conn).await?;
    Ok(())
}

/// Loads the images of every listed tour of `kind`, grouped by tour id.
async fn load_images(
    conn: &mut PgConnection,
    kind: TourKind,
    tour_ids: &[i64],
) -> AppResult<HashMap<i64, Vec<TourImage>>> {
    if tour_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let owner_column = match kind {
        TourKind::Domestic => "domestic_tour_id",
        TourKind::International => "international_tour_id",
    };
    let rows: Vec<(i64, i64, String, Option<String>)> = sqlx::query_as(&format!(
        "SELECT {owner_column}, id, image, caption FROM tour_images \
         WHERE {owner_column} = ANY($1) ORDER BY id"
    ))
    .bind(tour_ids)
    .fetch_all(conn)
    .await?;

    let mut grouped: HashMap<i64, Vec<TourImage>> = HashMap::new();
    for (tour_id, id, image, caption) in rows {
        grouped
            .entry(tour_id)
            .or_default()
            .push(TourImage { id, image, caption });
    }
    Ok(grouped)
}

async fn attach_domestic(
    conn: &mut PgConnection,
    mut tours: Vec<DomesticTour>,
) -> AppResult<Vec<DomesticTour>> {
    let ids: Vec<i64> = tours.iter().map(|tour| tour.id).collect();
    let mut images = load_images(conn, TourKind::Domestic, &ids).await?;
    for tour in &mut tours {
        tour.images = images.remove(&tour.id).unwrap_or_default();
    }
    Ok(tours)
}

async fn attach_international(
    conn: &mut PgConnection,
    mut tours: Vec<InternationalTour>,
) -> AppResult<Vec<InternationalTour>> {
    let ids: Vec<i64> = tours.iter().map(|tour| tour.id).collect();
    let mut images = load_images(&mut *conn, TourKind::International, &ids).await?;

    let region_ids: Vec<i64> = tours.iter().filter_map(|tour| tour.region_id).collect();
    let regions: HashMap<i64, Region> = if region_ids.is_empty() {
        HashMap::new()
    } else {
        sqlx::query_as::<_, Region>(&format!(
            "SELECT {REGION_COLUMNS} FROM regions WHERE id = ANY($1)"
        ))
        .bind(&region_ids)
        .fetch_all(&mut *conn)
        .await?
        .into_iter()
        .map(|region| (region.id, region))
        .collect()
    };

    for tour in &mut tours {
        tour.images = images.remove(&tour.id).unwrap_or_default();
        tour.region = tour.region_id.and_then(|id| regions.get(&id).cloned());
    }
    Ok(tours)
}

/// Reads a region and holds it `FOR SHARE` until the transaction ends, so a concurrent
/// deactivation cannot commit between this read and the tour write that depends on it.
async fn share_region(conn: &mut PgConnection, id: i64) -> AppResult<Option<Region>> {
    Ok(sqlx::query_as::<_, Region>(&format!(
        "SELECT {REGION_COLUMNS} FROM regions WHERE id = $1 FOR SHARE"
    ))
    .bind(id)
    .fetch_optional(conn)
    .await?)
}

async fn delete_tour(pool: &PgPool, kind: TourKind, id: i64) -> AppResult<bool> {
    // tour_images rows go with the tour through ON DELETE CASCADE.
    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = $1", tour_table(kind)))
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- REGIONS ---

    async fn list_regions(&self, filter: ActiveOnlyFilter) -> AppResult<Vec<Region>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {REGION_COLUMNS} FROM regions WHERE TRUE"));
        if let Some(flag) = filter.is_active.flag() {
            builder.push(" AND is_active = ").push_bind(flag);
        }
        builder.push(" ORDER BY id");
        Ok(builder.build_query_as::<Region>().fetch_all(&self.pool).await?)
    }

    async fn find_region(&self, lookup: &Lookup) -> AppResult<Option<Region>> {
        let mut conn = self.pool.acquire().await?;
        fetch_by_lookup(&mut conn, REGION_COLUMNS, "regions", lookup).await
    }

    async fn create_region(&self, input: NewRegion) -> AppResult<Region> {
        let mut tx = self.pool.begin().await?;
        let (base, candidates) = slug_candidates(&mut tx, "regions", &input.name, "region").await?;
        let mut inserted = None;
        for slug in candidates {
            inserted = sqlx::query_as::<_, Region>(&format!(
                "INSERT INTO regions (name, slug, is_active, thumbnail) VALUES ($1, $2, $3, $4) \
                 ON CONFLICT (slug) DO NOTHING RETURNING {REGION_COLUMNS}"
            ))
            .bind(&input.name)
            .bind(&slug)
            .bind(input.is_active)
            .bind(&input.thumbnail)
            .fetch_optional(&mut *tx)
            .await?;
            if inserted.is_some() {
                break;
            }
        }
        let region = slug_assigned("regions", &base, inserted)?;
        tx.commit().await?;
        Ok(region)
    }

    /// update_region
    ///
    /// Reads the persisted row under a row lock, applies the update and, when `is_active`
    /// flips, overwrites the flag of every international tour of the region in the same
    /// transaction.
    async fn update_region(&self, id: i64, changes: RegionChanges) -> AppResult<Option<Region>> {
        let mut tx = self.pool.begin().await?;
        let persisted: Option<bool> =
            sqlx::query_scalar("SELECT is_active FROM regions WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(persisted) = persisted else {
            return Ok(None);
        };

        let region = sqlx::query_as::<_, Region>(&format!(
            "UPDATE regions SET name = COALESCE($2, name), is_active = COALESCE($3, is_active), \
             thumbnail = COALESCE($4, thumbnail) WHERE id = $1 RETURNING {REGION_COLUMNS}"
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(changes.is_active)
        .bind(&changes.thumbnail)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(state) = cascade::region_cascade(persisted, changes.is_active) {
            let result = sqlx::query(
                "UPDATE international_tours SET is_active = $1, updated_at = NOW() \
                 WHERE region_id = $2",
            )
            .bind(state)
            .bind(id)
            .execute(&mut *tx)
            .await?;
            tracing::info!(
                region_id = id,
                is_active = state,
                tours = result.rows_affected(),
                "region activation cascaded to international tours"
            );
        }

        tx.commit().await?;
        Ok(Some(region))
    }

    async fn delete_region(&self, id: i64) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;
        let deactivated = sqlx::query(
            "UPDATE international_tours SET is_active = $1, updated_at = NOW() WHERE region_id = $2",
        )
        .bind(cascade::DELETED_REGION_TOUR_STATE)
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        // Tours keep their rows (region_id is set NULL); region banners are removed.
        let deleted = sqlx::query("DELETE FROM regions WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if deleted == 0 {
            return Ok(false);
        }

        tx.commit().await?;
        tracing::info!(region_id = id, tours = deactivated, "region deleted, tours deactivated");
        Ok(true)
    }

    // --- REGION BANNERS ---

    async fn list_region_banners(
        &self,
        region_id: i64,
        is_active: ActiveFilter,
    ) -> AppResult<Vec<RegionBanner>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {REGION_BANNER_COLUMNS} FROM region_banners WHERE region_id = "
        ));
        builder.push_bind(region_id);
        if let Some(flag) = is_active.flag() {
            builder.push(" AND is_active = ").push_bind(flag);
        }
        builder.push(" ORDER BY id");
        Ok(builder
            .build_query_as::<RegionBanner>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_region_banner(
        &self,
        region_id: i64,
        input: NewRegionBanner,
    ) -> AppResult<RegionBanner> {
        Ok(sqlx::query_as::<_, RegionBanner>(&format!(
            "INSERT INTO region_banners (region_id, image, title, description, is_active) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {REGION_BANNER_COLUMNS}"
        ))
        .bind(region_id)
        .bind(&input.image)
        .bind(&input.title)
        .bind(&input.description)
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn delete_region_banner(&self, region_id: i64, banner_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM region_banners WHERE id = $1 AND region_id = $2")
            .bind(banner_id)
            .bind(region_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- DOMESTIC TOURS ---

    async fn list_domestic_tours(&self, filter: ActiveOnlyFilter) -> AppResult<Vec<DomesticTour>> {
        let mut conn = self.pool.acquire().await?;
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {DOMESTIC_COLUMNS} FROM domestic_tours WHERE TRUE"));
        if let Some(flag) = filter.is_active.flag() {
            builder.push(" AND is_active = ").push_bind(flag);
        }
        builder.push(" ORDER BY id");
        let tours = builder
            .build_query_as::<DomesticTour>()
            .fetch_all(&mut *conn)
            .await?;
        attach_domestic(&mut conn, tours).await
    }

    async fn find_domestic_tour(&self, lookup: &Lookup) -> AppResult<Option<DomesticTour>> {
        let mut conn = self.pool.acquire().await?;
        let Some(tour) =
            fetch_by_lookup(&mut conn, DOMESTIC_COLUMNS, "domestic_tours", lookup).await?
        else {
            return Ok(None);
        };
        Ok(attach_domestic(&mut conn, vec![tour]).await?.pop())
    }

    async fn create_domestic_tour(
        &self,
        input: NewTour,
        images: Vec<NewTourImage>,
    ) -> AppResult<DomesticTour> {
        let mut tx = self.pool.begin().await?;
        let (base, candidates) = slug_candidates(
            &mut tx,
            "domestic_tours",
            &input.name,
            TourKind::Domestic.label(),
        )
        .await?;
        let mut inserted = None;
        for slug in candidates {
            inserted = sqlx::query_as::<_, DomesticTour>(&format!(
                "INSERT INTO domestic_tours (name, slug, airline, start_date, end_date, price, \
                 description, is_active, thumbnail, tour_program_pdf) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
                 ON CONFLICT (slug) DO NOTHING RETURNING {DOMESTIC_COLUMNS}"
            ))
            .bind(&input.name)
            .bind(&slug)
            .bind(&input.airline)
            .bind(input.start_date)
            .bind(input.end_date)
            .bind(input.price)
            .bind(&input.description)
            .bind(input.is_active)
            .bind(&input.thumbnail)
            .bind(&input.tour_program_pdf)
            .fetch_optional(&mut *tx)
            .await?;
            if inserted.is_some() {
                break;
            }
        }
        let tour = slug_assigned("domestic_tours", &base, inserted)?;

        insert_images(&mut tx, ImageOwner::domestic(tour.id), images).await?;
        let tour = attach_domestic(&mut tx, vec![tour])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("inserted tour vanished".to_string()))?;
        tx.commit().await?;
        Ok(tour)
    }

    async fn update_domestic_tour(
        &self,
        id: i64,
        changes: TourChanges,
        images: Vec<NewTourImage>,
    ) -> AppResult<Option<DomesticTour>> {
        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, DomesticTour>(&format!(
            "UPDATE domestic_tours SET name = COALESCE($2, name), airline = COALESCE($3, airline), \
             start_date = COALESCE($4, start_date), end_date = COALESCE($5, end_date), \
             price = COALESCE($6, price), description = COALESCE($7, description), \
             is_active = COALESCE($8, is_active), thumbnail = COALESCE($9, thumbnail), \
             tour_program_pdf = COALESCE($10, tour_program_pdf), updated_at = NOW() \
             WHERE id = $1 RETURNING {DOMESTIC_COLUMNS}"
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.airline)
        .bind(changes.start_date)
        .bind(changes.end_date)
        .bind(changes.price)
        .bind(&changes.description)
        .bind(changes.is_active)
        .bind(&changes.thumbnail)
        .bind(&changes.tour_program_pdf)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(tour) = updated else {
            return Ok(None);
        };

        insert_images(&mut tx, ImageOwner::domestic(id), images).await?;
        let tour = attach_domestic(&mut tx, vec![tour]).await?.pop();
        tx.commit().await?;
        Ok(tour)
    }

    async fn delete_domestic_tour(&self, id: i64) -> AppResult<bool> {
        delete_tour(&self.pool, TourKind::Domestic, id).await
    }

    // --- INTERNATIONAL TOURS ---

    async fn list_international_tours(
        &self,
        criteria: &InternationalTourCriteria,
    ) -> AppResult<Vec<InternationalTour>> {
        let mut conn = self.pool.acquire().await?;
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {INTERNATIONAL_COLUMNS} FROM international_tours WHERE TRUE"
        ));
        if let Some(flag) = criteria.is_active.flag() {
            builder.push(" AND is_active = ").push_bind(flag);
        }
        for region_id in &criteria.region_ids {
            builder.push(" AND region_id = ").push_bind(*region_id);
        }
        builder.push(" ORDER BY id");
        let tours = builder
            .build_query_as::<InternationalTour>()
            .fetch_all(&mut *conn)
            .await?;
        attach_international(&mut conn, tours).await
    }

    async fn find_international_tour(
        &self,
        lookup: &Lookup,
    ) -> AppResult<Option<InternationalTour>> {
        let mut conn = self.pool.acquire().await?;
        let Some(tour) =
            fetch_by_lookup(&mut conn, INTERNATIONAL_COLUMNS, "international_tours", lookup)
                .await?
        else {
            return Ok(None);
        };
        Ok(attach_international(&mut conn, vec![tour]).await?.pop())
    }

    /// create_international_tour
    ///
    /// Reads the region inside the transaction so the forced deactivation sees the same region
    /// state that the insert is committed against.
    async fn create_international_tour(
        &self,
        input: NewInternationalTour,
        images: Vec<NewTourImage>,
    ) -> AppResult<InternationalTour> {
        let mut tx = self.pool.begin().await?;
        let region = share_region(&mut tx, input.region_id)
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "region_id: Invalid pk \"{}\" - region does not exist.",
                    input.region_id
                ))
            })?;
        let is_active = cascade::effective_tour_state(Some(&region), input.tour.is_active);

        let tour = input.tour;
        let (base, candidates) = slug_candidates(
            &mut tx,
            "international_tours",
            &tour.name,
            TourKind::International.label(),
        )
        .await?;
        let mut inserted = None;
        for slug in candidates {
            inserted = sqlx::query_as::<_, InternationalTour>(&format!(
                "INSERT INTO international_tours (name, slug, airline, start_date, end_date, \
                 price, description, is_active, region_id, thumbnail, tour_program_pdf) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
                 ON CONFLICT (slug) DO NOTHING RETURNING {INTERNATIONAL_COLUMNS}"
            ))
            .bind(&tour.name)
            .bind(&slug)
            .bind(&tour.airline)
            .bind(tour.start_date)
            .bind(tour.end_date)
            .bind(tour.price)
            .bind(&tour.description)
            .bind(is_active)
            .bind(region.id)
            .bind(&tour.thumbnail)
            .bind(&tour.tour_program_pdf)
            .fetch_optional(&mut *tx)
            .await?;
            if inserted.is_some() {
                break;
            }
        }
        let created = slug_assigned("international_tours", &base, inserted)?;

        insert_images(&mut tx, ImageOwner::international(created.id), images).await?;
        let created = attach_international(&mut tx, vec![created])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal("inserted tour vanished".to_string()))?;
        tx.commit().await?;
        Ok(created)
    }

    /// update_international_tour
    ///
    /// Locks the tour, resolves the region it will belong to after the update and stores the
    /// effective active flag: a tour under an inactive (or deleted) region is written inactive.
    async fn update_international_tour(
        &self,
        id: i64,
        changes: InternationalTourChanges,
        images: Vec<NewTourImage>,
    ) -> AppResult<Option<InternationalTour>> {
        let mut tx = self.pool.begin().await?;
        let current: Option<(bool, Option<i64>)> = sqlx::query_as(
            "SELECT is_active, region_id FROM international_tours WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((persisted_active, persisted_region)) = current else {
            return Ok(None);
        };

        let region_id = changes.region_id.or(persisted_region);
        let region = match region_id {
            Some(region_id) => share_region(&mut tx, region_id).await?,
            None => None,
        };
        if let (Some(requested), None) = (changes.region_id, &region) {
            return Err(AppError::Validation(format!(
                "region_id: Invalid pk \"{requested}\" - region does not exist."
            )));
        }
        let requested = changes.tour.is_active.unwrap_or(persisted_active);
        let is_active = cascade::effective_tour_state(region.as_ref(), requested);

        let changes_tour = changes.tour;
        let updated = sqlx::query_as::<_, InternationalTour>(&format!(
            "UPDATE international_tours SET name = COALESCE($2, name), \
             airline = COALESCE($3, airline), start_date = COALESCE($4, start_date), \
             end_date = COALESCE($5, end_date), price = COALESCE($6, price), \
             description = COALESCE($7, description), is_active = $8, region_id = $9, \
             thumbnail = COALESCE($10, thumbnail), \
             tour_program_pdf = COALESCE($11, tour_program_pdf), updated_at = NOW() \
             WHERE id = $1 RETURNING {INTERNATIONAL_COLUMNS}"
        ))
        .bind(id)
        .bind(&changes_tour.name)
        .bind(&changes_tour.airline)
        .bind(changes_tour.start_date)
        .bind(changes_tour.end_date)
        .bind(changes_tour.price)
        .bind(&changes_tour.description)
        .bind(is_active)
        .bind(region.as_ref().map(|region| region.id))
        .bind(&changes_tour.thumbnail)
        .bind(&changes_tour.tour_program_pdf)
        .fetch_one(&mut *tx)
        .await?;

        insert_images(&mut tx, ImageOwner::international(id), images).await?;
        let updated = attach_international(&mut tx, vec![updated]).await?.pop();
        tx.commit().await?;
        Ok(updated)
    }

    async fn delete_international_tour(&self, id: i64) -> AppResult<bool> {
        delete_tour(&self.pool, TourKind::International, id).await
    }

    // --- BANNERS ---

    async fn list_banners(&self, filter: BannerFilter) -> AppResult<Vec<Banner>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {BANNER_COLUMNS} FROM banners WHERE TRUE"));
        if let Some(kind) = filter.banner_type {
            builder.push(" AND type = ").push_bind(kind.as_str());
        }
        if let Some(flag) = filter.is_active.flag() {
            builder.push(" AND is_active = ").push_bind(flag);
        }
        builder.push(" ORDER BY id");
        Ok(builder.build_query_as::<Banner>().fetch_all(&self.pool).await?)
    }

    async fn find_banner(&self, id: i64) -> AppResult<Option<Banner>> {
        Ok(sqlx::query_as::<_, Banner>(&format!(
            "SELECT {BANNER_COLUMNS} FROM banners WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_banner(&self, input: NewBanner) -> AppResult<Banner> {
        Ok(sqlx::query_as::<_, Banner>(&format!(
            "INSERT INTO banners (title, description, image, type, is_active) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {BANNER_COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.image)
        .bind(input.banner_type.as_str())
        .bind(input.is_active)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn update_banner(&self, id: i64, changes: BannerChanges) -> AppResult<Option<Banner>> {
        Ok(sqlx::query_as::<_, Banner>(&format!(
            "UPDATE banners SET title = COALESCE($2, title), \
             description = COALESCE($3, description), image = COALESCE($4, image), \
             type = COALESCE($5, type), is_active = COALESCE($6, is_active) \
             WHERE id = $1 RETURNING {BANNER_COLUMNS}"
        ))
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.image)
        .bind(changes.banner_type.map(|kind| kind.as_str()))
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_banner(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM banners WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- USERS ---

    async fn create_user(&self, input: NewUser) -> AppResult<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (username) DO NOTHING RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.password_hash)
        .fetch_optional(&self.pool)
        .await?;
        created.ok_or_else(|| username_taken(&input.username))
    }

    async fn get_user(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(
            sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_credentials(&self, username: &str) -> AppResult<Option<UserCredentials>> {
        Ok(sqlx::query_as::<_, UserCredentials>(
            "SELECT id, username, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?)
    }
}
