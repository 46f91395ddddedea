use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use super::{BANNER_FOLDER, required, store_optional, store_upload};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult, ErrorBody},
    filters::{BannerFilter, QueryParams, parse_numeric_id},
    forms::{BannerForm, FormData, FormMode, MultipartRequest},
    models::{Banner, BannerChanges, BannerUpload, NewBanner},
};

async fn resolve_banner(state: &AppState, raw_id: &str) -> AppResult<Banner> {
    let id = parse_numeric_id(raw_id, "Banner")?;
    state
        .repo
        .find_banner(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Banner '{id}' not found")))
}

/// list_banners
///
/// [Public Route] Lists site banners, optionally filtered by `type` and `is_active`.
#[utoipa::path(
    get,
    path = "/banners",
    tag = "banners",
    params(
        ("is_active" = Option<String>, Query, description = "true, false or all (default)"),
        ("type" = Option<String>, Query, description = "home, domestic, international, contact or about")
    ),
    responses(
        (status = 200, description = "Banners", body = [Banner]),
        (status = 400, description = "Unknown or invalid query parameter", body = ErrorBody)
    )
)]
pub async fn list_banners(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> AppResult<Json<Vec<Banner>>> {
    let filter = BannerFilter::from_query(&params)?;
    Ok(Json(state.repo.list_banners(filter).await?))
}

/// get_banner
///
/// [Public Route] Retrieves one banner by numeric id.
#[utoipa::path(
    get,
    path = "/banners/{id}",
    tag = "banners",
    params(("id" = i64, Path, description = "Banner id")),
    responses(
        (status = 200, description = "Banner", body = Banner),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_banner(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Banner>> {
    Ok(Json(resolve_banner(&state, &id).await?))
}

/// create_banner
///
/// [Authenticated Route] Creates a site banner; `type` defaults to `home`.
#[utoipa::path(
    post,
    path = "/banners",
    tag = "banners",
    request_body(content = BannerUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created", body = Banner),
        (status = 400, description = "Validation failed", body = ErrorBody)
    )
)]
pub async fn create_banner(
    user: AuthUser,
    State(state): State<AppState>,
    multipart: MultipartRequest,
) -> AppResult<(StatusCode, Json<Banner>)> {
    let form = FormData::from_multipart(multipart).await?;
    let parsed = BannerForm::parse(&form, FormMode::Create)?;

    let image = required(parsed.image.as_ref(), "image")?;
    let input = NewBanner {
        image: store_upload(&state.storage, BANNER_FOLDER, image).await?,
        title: required(parsed.title, "title")?,
        description: parsed.description,
        banner_type: parsed.banner_type.unwrap_or_default(),
        is_active: parsed.is_active.unwrap_or(true),
    };
    let banner = state.repo.create_banner(input).await?;

    tracing::info!(banner_id = banner.id, kind = %banner.banner_type, user = %user.username, "banner created");
    Ok((StatusCode::CREATED, Json(banner)))
}

/// replace_banner
///
/// [Authenticated Route] Full update; the stored image is kept when none is uploaded.
#[utoipa::path(
    put,
    path = "/banners/{id}",
    tag = "banners",
    params(("id" = i64, Path, description = "Banner id")),
    request_body(content = BannerUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = Banner),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn replace_banner(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: MultipartRequest,
) -> AppResult<Json<Banner>> {
    update_banner(user, state, id, multipart, FormMode::Replace).await
}

/// patch_banner
///
/// [Authenticated Route] Partial update.
#[utoipa::path(
    patch,
    path = "/banners/{id}",
    tag = "banners",
    params(("id" = i64, Path, description = "Banner id")),
    request_body(content = BannerUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = Banner),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn patch_banner(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: MultipartRequest,
) -> AppResult<Json<Banner>> {
    update_banner(user, state, id, multipart, FormMode::Patch).await
}

async fn update_banner(
    user: AuthUser,
    state: AppState,
    raw_id: String,
    multipart: MultipartRequest,
    mode: FormMode,
) -> AppResult<Json<Banner>> {
    let existing = resolve_banner(&state, &raw_id).await?;
    let form = FormData::from_multipart(multipart).await?;
    let parsed = BannerForm::parse(&form, mode)?;

    let changes = BannerChanges {
        image: store_optional(&state.storage, BANNER_FOLDER, parsed.image.as_ref()).await?,
        title: parsed.title,
        description: parsed.description,
        banner_type: parsed.banner_type,
        is_active: parsed.is_active,
    };
    let banner = state
        .repo
        .update_banner(existing.id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Banner '{raw_id}' not found")))?;

    tracing::info!(banner_id = banner.id, user = %user.username, "banner updated");
    Ok(Json(banner))
}

/// delete_banner
#[utoipa::path(
    delete,
    path = "/banners/{id}",
    tag = "banners",
    params(("id" = i64, Path, description = "Banner id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_banner(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let banner = resolve_banner(&state, &id).await?;
    if !state.repo.delete_banner(banner.id).await? {
        return Err(AppError::NotFound(format!("Banner '{id}' not found")));
    }
    tracing::info!(banner_id = banner.id, user = %user.username, "banner deleted");
    Ok(StatusCode::NO_CONTENT)
}
