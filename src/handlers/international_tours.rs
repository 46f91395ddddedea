use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use super::{
    domestic_tours::{new_tour, tour_changes},
    ensure_date_order, required, store_gallery,
};
use crate::{
    AppState,
    auth::AuthUser,
    cascade,
    error::{AppError, AppResult, ErrorBody},
    filters::{InternationalTourCriteria, InternationalTourFilter, Lookup, QueryParams},
    forms::{FormData, FormMode, InternationalTourForm, MultipartRequest},
    models::{
        InternationalTour, InternationalTourChanges, NewInternationalTour, TourKind, TourUpload,
    },
};

async fn resolve_tour(state: &AppState, key: &str) -> AppResult<InternationalTour> {
    let lookup = Lookup::parse(key);
    state
        .repo
        .find_international_tour(&lookup)
        .await?
        .ok_or_else(|| lookup.not_found("International tour"))
}

/// Rejects an explicitly selected region that is missing or inactive.
async fn check_region_selection(state: &AppState, region_id: i64) -> AppResult<()> {
    let region = state.repo.find_region(&Lookup::Id(region_id)).await?;
    cascade::ensure_assignable(region_id, region.as_ref())
}

/// list_international_tours
///
/// [Public Route] Lists international tours with their region and images.
///
/// `region_slug` is resolved first; an unknown slug is a 404 rather than an empty list.
/// When both `region_id` and `region_slug` are given, a tour must satisfy both.
#[utoipa::path(
    get,
    path = "/international-tours",
    tag = "international-tours",
    params(
        ("is_active" = Option<String>, Query, description = "true, false or all (default)"),
        ("region_id" = Option<i64>, Query, description = "Exact region id"),
        ("region_slug" = Option<String>, Query, description = "Region slug")
    ),
    responses(
        (status = 200, description = "International tours", body = [InternationalTour]),
        (status = 400, description = "Unknown or invalid query parameter", body = ErrorBody),
        (status = 404, description = "Unknown region_slug", body = ErrorBody)
    )
)]
pub async fn list_international_tours(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> AppResult<Json<Vec<InternationalTour>>> {
    let filter = InternationalTourFilter::from_query(&params)?;

    let mut criteria = InternationalTourCriteria {
        is_active: filter.is_active,
        region_ids: filter.region_id.into_iter().collect(),
    };
    if let Some(slug) = filter.region_slug {
        let region = state
            .repo
            .find_region(&Lookup::Slug(slug.clone()))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Region '{slug}' not found")))?;
        criteria.region_ids.push(region.id);
    }

    Ok(Json(state.repo.list_international_tours(&criteria).await?))
}

/// get_international_tour
///
/// [Public Route] Retrieves one international tour by numeric id or slug.
#[utoipa::path(
    get,
    path = "/international-tours/{key}",
    tag = "international-tours",
    params(("key" = String, Path, description = "Numeric id or slug")),
    responses(
        (status = 200, description = "International tour", body = InternationalTour),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_international_tour(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<InternationalTour>> {
    Ok(Json(resolve_tour(&state, &key).await?))
}

/// create_international_tour
///
/// [Authenticated Route] Creates an international tour under an active region.
#[utoipa::path(
    post,
    path = "/international-tours",
    tag = "international-tours",
    request_body(content = TourUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created", body = InternationalTour),
        (status = 400, description = "Validation failed or region inactive", body = ErrorBody),
        (status = 409, description = "Slug could not be assigned", body = ErrorBody)
    )
)]
pub async fn create_international_tour(
    user: AuthUser,
    State(state): State<AppState>,
    multipart: MultipartRequest,
) -> AppResult<(StatusCode, Json<InternationalTour>)> {
    let form = FormData::from_multipart(multipart).await?;
    let parsed = InternationalTourForm::parse(&form, FormMode::Create)?;
    let region_id = required(parsed.region_id, "region_id")?;
    check_region_selection(&state, region_id).await?;

    let folder = TourKind::International.image_folder();
    let images = store_gallery(&state.storage, folder, &parsed.tour.images).await?;
    let input = NewInternationalTour {
        tour: new_tour(&state.storage, parsed.tour).await?,
        region_id,
    };
    let tour = state.repo.create_international_tour(input, images).await?;

    tracing::info!(
        tour_id = tour.id,
        slug = %tour.slug,
        region_id,
        is_active = tour.is_active,
        user = %user.username,
        "international tour created"
    );
    Ok((StatusCode::CREATED, Json(tour)))
}

/// replace_international_tour
///
/// [Authenticated Route] Full update. Without `region_id` the tour keeps its region, and is
/// stored inactive if that region is inactive.
#[utoipa::path(
    put,
    path = "/international-tours/{key}",
    tag = "international-tours",
    params(("key" = String, Path, description = "Numeric id or slug")),
    request_body(content = TourUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = InternationalTour),
        (status = 400, description = "Validation failed or region inactive", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn replace_international_tour(
    user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
    multipart: MultipartRequest,
) -> AppResult<Json<InternationalTour>> {
    update_international_tour(user, state, key, multipart, FormMode::Replace).await
}

/// patch_international_tour
///
/// [Authenticated Route] Partial update.
#[utoipa::path(
    patch,
    path = "/international-tours/{key}",
    tag = "international-tours",
    params(("key" = String, Path, description = "Numeric id or slug")),
    request_body(content = TourUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = InternationalTour),
        (status = 400, description = "Validation failed or region inactive", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn patch_international_tour(
    user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
    multipart: MultipartRequest,
) -> AppResult<Json<InternationalTour>> {
    update_international_tour(user, state, key, multipart, FormMode::Patch).await
}

async fn update_international_tour(
    user: AuthUser,
    state: AppState,
    key: String,
    multipart: MultipartRequest,
    mode: FormMode,
) -> AppResult<Json<InternationalTour>> {
    let existing = resolve_tour(&state, &key).await?;
    let form = FormData::from_multipart(multipart).await?;
    let parsed = InternationalTourForm::parse(&form, mode)?;
    ensure_date_order(
        parsed.tour.start_date,
        parsed.tour.end_date,
        (existing.start_date, existing.end_date),
    )?;
    if let Some(region_id) = parsed.region_id {
        check_region_selection(&state, region_id).await?;
    }

    let folder = TourKind::International.image_folder();
    let images = store_gallery(&state.storage, folder, &parsed.tour.images).await?;
    let changes = InternationalTourChanges {
        tour: tour_changes(&state.storage, parsed.tour).await?,
        region_id: parsed.region_id,
    };
    let tour = state
        .repo
        .update_international_tour(existing.id, changes, images)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("International tour '{key}' not found")))?;

    tracing::info!(
        tour_id = tour.id,
        is_active = tour.is_active,
        user = %user.username,
        "international tour updated"
    );
    Ok(Json(tour))
}

/// delete_international_tour
///
/// [Authenticated Route] Deletes the tour together with its images.
#[utoipa::path(
    delete,
    path = "/international-tours/{key}",
    tag = "international-tours",
    params(("key" = String, Path, description = "Numeric id or slug")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_international_tour(
    user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<StatusCode> {
    let tour = resolve_tour(&state, &key).await?;
    if !state.repo.delete_international_tour(tour.id).await? {
        return Err(AppError::NotFound(format!(
            "International tour '{key}' not found"
        )));
    }
    tracing::info!(tour_id = tour.id, user = %user.username, "international tour deleted");
    Ok(StatusCode::NO_CONTENT)
}
