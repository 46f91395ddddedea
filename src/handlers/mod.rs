//! HTTP handlers, one module per resource.
//!
//! Write handlers share the same pipeline: collect the multipart body, parse and validate it
//! into a typed form, push uploads to object storage, then hand plain values to the repository.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    forms::UploadedFile,
    models::NewTourImage,
    storage::StorageState,
};

pub mod accounts;
pub mod banners;
pub mod domestic_tours;
pub mod international_tours;
pub mod region_banners;
pub mod regions;

// Storage folders, one per file kind.
pub(crate) const THUMBNAIL_FOLDER: &str = "thumbnails";
pub(crate) const TOUR_PROGRAM_FOLDER: &str = "tour_programs";
pub(crate) const BANNER_FOLDER: &str = "banners";
pub(crate) const REGION_BANNER_FOLDER: &str = "region_banners";

/// store_upload
///
/// Writes one validated upload under `{folder}/{uuid}.{ext}` and returns its public URL.
pub(crate) async fn store_upload(
    storage: &StorageState,
    folder: &str,
    file: &UploadedFile,
) -> AppResult<String> {
    let key = format!("{folder}/{}.{}", Uuid::new_v4(), file.extension());
    let url = storage
        .put_object(&key, &file.content_type, file.bytes.to_vec())
        .await
        .map_err(AppError::Storage)?;
    tracing::debug!(%key, size = file.bytes.len(), "upload stored");
    Ok(url)
}

pub(crate) async fn store_optional(
    storage: &StorageState,
    folder: &str,
    file: Option<&UploadedFile>,
) -> AppResult<Option<String>> {
    match file {
        Some(file) => store_upload(storage, folder, file).await.map(Some),
        None => Ok(None),
    }
}

/// Stores the supplementary images of a tour, keeping each caption with its file.
pub(crate) async fn store_gallery(
    storage: &StorageState,
    folder: &str,
    gallery: &[(UploadedFile, Option<String>)],
) -> AppResult<Vec<NewTourImage>> {
    let mut images = Vec::with_capacity(gallery.len());
    for (file, caption) in gallery {
        images.push(NewTourImage {
            image: store_upload(storage, folder, file).await?,
            caption: caption.clone(),
        });
    }
    Ok(images)
}

/// Checks the date range a partial update leaves behind, merging the new dates with the stored ones.
pub(crate) fn ensure_date_order(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    stored: (NaiveDate, NaiveDate),
) -> AppResult<()> {
    let start = start.unwrap_or(stored.0);
    let end = end.unwrap_or(stored.1);
    if end < start {
        return Err(AppError::Validation(
            "end_date: End date must not be before the start date.".to_string(),
        ));
    }
    Ok(())
}

/// Unwraps a field the form parser already reported as required for this mode.
pub(crate) fn required<T>(value: Option<T>, field: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Validation(format!("{field}: This field is required.")))
}
