use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use super::{REGION_BANNER_FOLDER, regions::resolve_region, store_upload};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult, ErrorBody},
    filters::{ActiveOnlyFilter, QueryParams, parse_numeric_id},
    forms::{FormData, MultipartRequest, RegionBannerForm},
    models::{NewRegionBanner, RegionBanner, RegionBannerUpload},
};

/// list_region_banners
///
/// [Public Route] Lists the banners of one region.
#[utoipa::path(
    get,
    path = "/regions/{key}/banners",
    tag = "regions",
    params(
        ("key" = String, Path, description = "Region id or slug"),
        ("is_active" = Option<String>, Query, description = "true, false or all (default)")
    ),
    responses(
        (status = 200, description = "Region banners", body = [RegionBanner]),
        (status = 400, description = "Unknown or invalid query parameter", body = ErrorBody),
        (status = 404, description = "Region not found", body = ErrorBody)
    )
)]
pub async fn list_region_banners(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(params): Query<QueryParams>,
) -> AppResult<Json<Vec<RegionBanner>>> {
    let filter = ActiveOnlyFilter::from_query(&params)?;
    let region = resolve_region(&state, &key).await?;
    let banners = state
        .repo
        .list_region_banners(region.id, filter.is_active)
        .await?;
    Ok(Json(banners))
}

/// create_region_banner
///
/// [Authenticated Route] Attaches a banner image to a region.
#[utoipa::path(
    post,
    path = "/regions/{key}/banners",
    tag = "regions",
    params(("key" = String, Path, description = "Region id or slug")),
    request_body(content = RegionBannerUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created", body = RegionBanner),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Region not found", body = ErrorBody)
    )
)]
pub async fn create_region_banner(
    user: AuthUser,
    State(state): State<AppState>,
    Path(key): Path<String>,
    multipart: MultipartRequest,
) -> AppResult<(StatusCode, Json<RegionBanner>)> {
    let region = resolve_region(&state, &key).await?;
    let form = FormData::from_multipart(multipart).await?;
    let parsed = RegionBannerForm::parse(&form)?;

    let image = store_upload(&state.storage, REGION_BANNER_FOLDER, &parsed.image).await?;
    let banner = state
        .repo
        .create_region_banner(
            region.id,
            NewRegionBanner {
                image,
                title: parsed.title,
                description: parsed.description,
                is_active: parsed.is_active.unwrap_or(true),
            },
        )
        .await?;

    tracing::info!(region_id = region.id, banner_id = banner.id, user = %user.username, "region banner created");
    Ok((StatusCode::CREATED, Json(banner)))
}

/// delete_region_banner
///
/// [Authenticated Route] Removes one banner; the banner must belong to the region in the path.
#[utoipa::path(
    delete,
    path = "/regions/{key}/banners/{banner_id}",
    tag = "regions",
    params(
        ("key" = String, Path, description = "Region id or slug"),
        ("banner_id" = i64, Path, description = "Region banner id")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_region_banner(
    user: AuthUser,
    State(state): State<AppState>,
    Path((key, banner_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let region = resolve_region(&state, &key).await?;
    let banner_id = parse_numeric_id(&banner_id, "Region banner")?;
    if !state.repo.delete_region_banner(region.id, banner_id).await? {
        return Err(AppError::NotFound(format!(
            "Region banner '{banner_id}' not found"
        )));
    }
    tracing::info!(region_id = region.id, banner_id, user = %user.username, "region banner deleted");
    Ok(StatusCode::NO_CONTENT)
}
