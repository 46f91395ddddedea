use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use super::{THUMBNAIL_FOLDER, required, store_optional};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult, ErrorBody},
    filters::{ActiveOnlyFilter, Lookup, QueryParams},
    forms::{FormData, FormMode, MultipartRequest, RegionForm},
    models::{NewRegion, Region, RegionChanges, RegionUpload},
};

/// Resolves a `{key}` path value (id or slug) to a region, or 404.
pub(crate) async fn resolve_region(state: &AppState, key: &str) -> AppResult<Region> {
    let lookup = Lookup::parse(key);
    state
        .repo
        .find_region(&lookup)
        .await?
        .ok_or_else(|| lookup.not_found("Region"))
}

/// list_regions
///
/// [Public Route] Lists regions ordered by id, optionally filtered by `is_active`.
#[utoipa::path(
    get,
    path = "/regions",
    tag = "regions",
    params(("is_active" = Option<String>, Query, description = "true, false or all (default)")),
    responses(
        (status = 200, description = "Regions", body = [Region]),
        (status = 400, description = "Unknown or invalid query parameter", body = ErrorBody)
    )
)]
pub async fn list_regions(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> AppResult<Json<Vec<Region>>> {
    let filter = ActiveOnlyFilter::from_query(&params)?;
    Ok(Json(state.repo.list_regions(filter).await?))
}

/// get_region
///
/// [Public Route] Retrieves one region by numeric id or slug.
#[utoipa::path(
    get,
    path = "/regions/{key}",
    tag = "regions",
    params(("key" = String, Path, description = "Numeric id or slug")),
    responses(
        (status = 200, description = "Region", body = Region),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_region(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<Region>> {
    Ok(Json(resolve_region(&state, &key).await?))
}

/// create_region
///
/// [Authenticated Route] Creates a region. The slug is derived from the name.
#[utoipa::path(
    post,
    path = "/regions",
    tag = "regions",
    request_body(content = RegionUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created", body = Region),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 409, description = "Slug could not be assigned", body = ErrorBody)
    )
)]
pub async fn create_region(
    user: AuthUser,
    State(state): State<AppState>,
    multipart: MultipartRequest,
) -> AppResult<(StatusCode, Json<Region>)> {
    let form = FormData::from_multipart(multipart).await?;
    let parsed = RegionForm::parse(&form, FormMode::Create)?;

    let thumbnail = store_optional(&state.storage, THUMBNAIL_FOLDER, parsed.thumbnail.as_ref()).await?;
    let region = state
        .repo
        .create_region(NewRegion {
            name: required(parsed.name, "name")?,
            is_active: parsed.is_active.unwrap_or(true),
            thumbnail,
        })
        .await?;

    tracing::info!(region_id = region.id, slug = %region.slug, user = %user.username, "region created");
    Ok((StatusCode::CREATED, Json(region)))
}

/// replace_region
///
/// [Authenticated Route] Full update. A change of `is_active` is pushed to every international
/// tour of the region.
#[utoipa::path(
    put,
    path = "/regions/{key}",
    tag = "regions",
    params(("key" = String, Path, description = "Numeric id or slug")),
    request_body(content = RegionUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = Region),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn replace_region(
    user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
    multipart: MultipartRequest,
) -> AppResult<Json<Region>> {
    update_region(user, state, key, multipart, FormMode::Replace).await
}

/// patch_region
///
/// [Authenticated Route] Partial update; same cascade as the full update.
#[utoipa::path(
    patch,
    path = "/regions/{key}",
    tag = "regions",
    params(("key" = String, Path, description = "Numeric id or slug")),
    request_body(content = RegionUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = Region),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn patch_region(
    user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
    multipart: MultipartRequest,
) -> AppResult<Json<Region>> {
    update_region(user, state, key, multipart, FormMode::Patch).await
}

async fn update_region(
    user: AuthUser,
    state: AppState,
    key: String,
    multipart: MultipartRequest,
    mode: FormMode,
) -> AppResult<Json<Region>> {
    let existing = resolve_region(&state, &key).await?;
    let form = FormData::from_multipart(multipart).await?;
    let parsed = RegionForm::parse(&form, mode)?;

    let thumbnail = store_optional(&state.storage, THUMBNAIL_FOLDER, parsed.thumbnail.as_ref()).await?;
    let changes = RegionChanges {
        name: parsed.name,
        is_active: parsed.is_active,
        thumbnail,
    };
    let region = state
        .repo
        .update_region(existing.id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Region '{key}' not found")))?;

    tracing::info!(region_id = region.id, user = %user.username, "region updated");
    Ok(Json(region))
}

/// delete_region
///
/// [Authenticated Route] Deletes a region and its banners. Its international tours are kept,
/// deactivated and detached.
#[utoipa::path(
    delete,
    path = "/regions/{key}",
    tag = "regions",
    params(("key" = String, Path, description = "Numeric id or slug")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_region(
    user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<StatusCode> {
    let region = resolve_region(&state, &key).await?;
    if !state.repo.delete_region(region.id).await? {
        return Err(AppError::NotFound(format!("Region '{key}' not found")));
    }
    tracing::info!(region_id = region.id, user = %user.username, "region deleted");
    Ok(StatusCode::NO_CONTENT)
}
