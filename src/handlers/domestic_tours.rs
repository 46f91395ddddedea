use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use super::{
    THUMBNAIL_FOLDER, TOUR_PROGRAM_FOLDER, ensure_date_order, required, store_gallery,
    store_optional, store_upload,
};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult, ErrorBody},
    filters::{ActiveOnlyFilter, Lookup, QueryParams},
    forms::{FormData, FormMode, MultipartRequest, TourForm},
    models::{DomesticTour, NewTour, TourChanges, TourKind, TourUpload},
    storage::StorageState,
};

/// Builds the creation input of either tour kind, storing every upload first.
pub(crate) async fn new_tour(
    storage: &StorageState,
    parsed: TourForm,
) -> AppResult<NewTour> {
    let thumbnail = required(parsed.thumbnail.as_ref(), "thumbnail")?;
    Ok(NewTour {
        thumbnail: store_upload(storage, THUMBNAIL_FOLDER, thumbnail).await?,
        tour_program_pdf: store_optional(
            storage,
            TOUR_PROGRAM_FOLDER,
            parsed.tour_program_pdf.as_ref(),
        )
        .await?,
        name: required(parsed.name, "name")?,
        airline: required(parsed.airline, "airline")?,
        start_date: required(parsed.start_date, "start_date")?,
        end_date: required(parsed.end_date, "end_date")?,
        price: required(parsed.price, "price")?,
        description: required(parsed.description, "description")?,
        is_active: parsed.is_active.unwrap_or(true),
    })
}

/// Builds the update input of either tour kind. Absent files keep the stored ones.
pub(crate) async fn tour_changes(
    storage: &StorageState,
    parsed: TourForm,
) -> AppResult<TourChanges> {
    Ok(TourChanges {
        thumbnail: store_optional(storage, THUMBNAIL_FOLDER, parsed.thumbnail.as_ref()).await?,
        tour_program_pdf: store_optional(
            storage,
            TOUR_PROGRAM_FOLDER,
            parsed.tour_program_pdf.as_ref(),
        )
        .await?,
        name: parsed.name,
        airline: parsed.airline,
        start_date: parsed.start_date,
        end_date: parsed.end_date,
        price: parsed.price,
        description: parsed.description,
        is_active: parsed.is_active,
    })
}

async fn resolve_tour(state: &AppState, key: &str) -> AppResult<DomesticTour> {
    let lookup = Lookup::parse(key);
    state
        .repo
        .find_domestic_tour(&lookup)
        .await?
        .ok_or_else(|| lookup.not_found("Domestic tour"))
}

/// list_domestic_tours
///
/// [Public Route] Lists domestic tours with their images, optionally filtered by `is_active`.
#[utoipa::path(
    get,
    path = "/domestic-tours",
    tag = "domestic-tours",
    params(("is_active" = Option<String>, Query, description = "true, false or all (default)")),
    responses(
        (status = 200, description = "Domestic tours", body = [DomesticTour]),
        (status = 400, description = "Unknown or invalid query parameter", body = ErrorBody)
    )
)]
pub async fn list_domestic_tours(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> AppResult<Json<Vec<DomesticTour>>> {
    let filter = ActiveOnlyFilter::from_query(&params)?;
    Ok(Json(state.repo.list_domestic_tours(filter).await?))
}

/// get_domestic_tour
///
/// [Public Route] Retrieves one domestic tour by numeric id or slug.
#[utoipa::path(
    get,
    path = "/domestic-tours/{key}",
    tag = "domestic-tours",
    params(("key" = String, Path, description = "Numeric id or slug")),
    responses(
        (status = 200, description = "Domestic tour", body = DomesticTour),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_domestic_tour(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<DomesticTour>> {
    Ok(Json(resolve_tour(&state, &key).await?))
}

/// create_domestic_tour
///
/// [Authenticated Route] Creates a domestic tour with its thumbnail, optional program PDF and
/// any number of supplementary `images` (captioned by position through `captions`).
#[utoipa::path(
    post,
    path = "/domestic-tours",
    tag = "domestic-tours",
    request_body(content = TourUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created", body = DomesticTour),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 409, description = "Slug could not be assigned", body = ErrorBody)
    )
)]
pub async fn create_domestic_tour(
    user: AuthUser,
    State(state): State<AppState>,
    multipart: MultipartRequest,
) -> AppResult<(StatusCode, Json<DomesticTour>)> {
    let form = FormData::from_multipart(multipart).await?;
    let parsed = TourForm::parse(&form, FormMode::Create)?;

    let folder = TourKind::Domestic.image_folder();
    let images = store_gallery(&state.storage, folder, &parsed.images).await?;
    let input = new_tour(&state.storage, parsed).await?;
    let tour = state.repo.create_domestic_tour(input, images).await?;

    tracing::info!(tour_id = tour.id, slug = %tour.slug, user = %user.username, "domestic tour created");
    Ok((StatusCode::CREATED, Json(tour)))
}

/// replace_domestic_tour
///
/// [Authenticated Route] Full update. Uploaded `images` are added to the existing ones.
#[utoipa::path(
    put,
    path = "/domestic-tours/{key}",
    tag = "domestic-tours",
    params(("key" = String, Path, description = "Numeric id or slug")),
    request_body(content = TourUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = DomesticTour),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn replace_domestic_tour(
    user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
    multipart: MultipartRequest,
) -> AppResult<Json<DomesticTour>> {
    update_domestic_tour(user, state, key, multipart, FormMode::Replace).await
}

/// patch_domestic_tour
///
/// [Authenticated Route] Partial update.
#[utoipa::path(
    patch,
    path = "/domestic-tours/{key}",
    tag = "domestic-tours",
    params(("key" = String, Path, description = "Numeric id or slug")),
    request_body(content = TourUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = DomesticTour),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn patch_domestic_tour(
    user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
    multipart: MultipartRequest,
) -> AppResult<Json<DomesticTour>> {
    update_domestic_tour(user, state, key, multipart, FormMode::Patch).await
}

async fn update_domestic_tour(
    user: AuthUser,
    state: AppState,
    key: String,
    multipart: MultipartRequest,
    mode: FormMode,
) -> AppResult<Json<DomesticTour>> {
    let existing = resolve_tour(&state, &key).await?;
    let form = FormData::from_multipart(multipart).await?;
    let parsed = TourForm::parse(&form, mode)?;
    ensure_date_order(
        parsed.start_date,
        parsed.end_date,
        (existing.start_date, existing.end_date),
    )?;

    let folder = TourKind::Domestic.image_folder();
    let images = store_gallery(&state.storage, folder, &parsed.images).await?;
    let changes = tour_changes(&state.storage, parsed).await?;
    let tour = state
        .repo
        .update_domestic_tour(existing.id, changes, images)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Domestic tour '{key}' not found")))?;

    tracing::info!(tour_id = tour.id, user = %user.username, "domestic tour updated");
    Ok(Json(tour))
}

/// delete_domestic_tour
///
/// [Authenticated Route] Deletes the tour together with its images.
#[utoipa::path(
    delete,
    path = "/domestic-tours/{key}",
    tag = "domestic-tours",
    params(("key" = String, Path, description = "Numeric id or slug")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_domestic_tour(
    user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<StatusCode> {
    let tour = resolve_tour(&state, &key).await?;
    if !state.repo.delete_domestic_tour(tour.id).await? {
        return Err(AppError::NotFound(format!("Domestic tour '{key}' not found")));
    }
    tracing::info!(tour_id = tour.id, user = %user.username, "domestic tour deleted");
    Ok(StatusCode::NO_CONTENT)
}
