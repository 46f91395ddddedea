use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Core Application Schemas (Mapped to Database) ---

/// Region
///
/// A geographic region grouping international tours (`public.regions`).
/// Its `is_active` flag is authoritative over the active state of every tour it owns.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Region {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub thumbnail: Option<String>,
}

/// RegionBanner
///
/// A promotional banner shown on a region page. Its active flag is never touched by the
/// region cascade; the row itself is removed together with its region.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct RegionBanner {
    pub id: i64,
    pub region_id: i64,
    pub image: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
}

/// TourImage
///
/// A supplementary image attached to a tour. Deleted together with its parent tour.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct TourImage {
    pub id: i64,
    pub image: String,
    pub caption: Option<String>,
}

/// TourKind
///
/// Discriminates the two tour tables. Used as the owner tag of image attachments and to
/// pick the slug fallback and upload folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TourKind {
    Domestic,
    International,
}

impl TourKind {
    /// Slug root used when a tour name yields an empty slug.
    pub fn label(self) -> &'static str {
        match self {
            TourKind::Domestic => "domestic-tour",
            TourKind::International => "international-tour",
        }
    }

    /// Storage folder for the tour's supplementary images.
    pub fn image_folder(self) -> &'static str {
        match self {
            TourKind::Domestic => "domestic_tour_images",
            TourKind::International => "international_tour_images",
        }
    }
}

/// ImageOwner
///
/// The parent of a tour image: exactly one tour of exactly one kind.
/// Persisted as two nullable foreign keys guarded by a CHECK constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageOwner {
    pub kind: TourKind,
    pub tour_id: i64,
}

impl ImageOwner {
    pub fn domestic(tour_id: i64) -> Self {
        Self {
            kind: TourKind::Domestic,
            tour_id,
        }
    }

    pub fn international(tour_id: i64) -> Self {
        Self {
            kind: TourKind::International,
            tour_id,
        }
    }

    /// Splits the owner into the `(domestic_tour_id, international_tour_id)` column pair.
    pub fn columns(self) -> (Option<i64>, Option<i64>) {
        match self.kind {
            TourKind::Domestic => (Some(self.tour_id), None),
            TourKind::International => (None, Some(self.tour_id)),
        }
    }
}

/// DomesticTour
///
/// A tour inside the country (`public.domestic_tours`), with its image attachments.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct DomesticTour {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub airline: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Serialized as a decimal string, e.g. `"1499.90"`.
    #[ts(type = "string")]
    #[schema(value_type = String, example = "1499.90")]
    pub price: Decimal,
    pub description: String,
    pub is_active: bool,
    pub thumbnail: String,
    pub tour_program_pdf: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    // Loaded by a second query in the repository.
    #[sqlx(skip)]
    pub images: Vec<TourImage>,
}

/// InternationalTour
///
/// A tour abroad (`public.international_tours`). `region_id` is `None` only for tours whose
/// region has been deleted; such tours are always inactive.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct InternationalTour {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub airline: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[ts(type = "string")]
    #[schema(value_type = String, example = "2499.00")]
    pub price: Decimal,
    pub description: String,
    pub is_active: bool,
    pub region_id: Option<i64>,
    // Nested copy of the owning region, resolved by the repository.
    #[sqlx(skip)]
    pub region: Option<Region>,
    pub thumbnail: String,
    pub tour_program_pdf: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub images: Vec<TourImage>,
}

/// BannerType
///
/// The page a site banner belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum BannerType {
    #[default]
    Home,
    Domestic,
    International,
    Contact,
    About,
}

impl BannerType {
    pub const ALL: [BannerType; 5] = [
        BannerType::Home,
        BannerType::Domestic,
        BannerType::International,
        BannerType::Contact,
        BannerType::About,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BannerType::Home => "home",
            BannerType::Domestic => "domestic",
            BannerType::International => "international",
            BannerType::Contact => "contact",
            BannerType::About => "about",
        }
    }
}

impl fmt::Display for BannerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("'{0}' is not a valid banner type (expected one of: home, domestic, international, contact, about)")]
pub struct ParseBannerTypeError(pub String);

impl FromStr for BannerType {
    type Err = ParseBannerTypeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        BannerType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == raw)
            .ok_or_else(|| ParseBannerTypeError(raw.to_string()))
    }
}

impl TryFrom<String> for BannerType {
    type Error = ParseBannerTypeError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        raw.parse()
    }
}

/// Banner
///
/// A site-wide promotional banner (`public.banners`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Banner {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub image: String,
    // `type` is reserved in Rust; the column and the JSON key keep the short name.
    #[serde(rename = "type")]
    #[sqlx(rename = "type", try_from = "String")]
    pub banner_type: BannerType,
    pub is_active: bool,
}

/// User
///
/// A registered account as exposed by the API. The password hash is kept in `UserCredentials`
/// and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// UserCredentials
///
/// Internal row used by the token endpoint to verify a login.
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
}

// --- Repository Inputs (validated, files already stored) ---

#[derive(Debug, Clone)]
pub struct NewRegion {
    pub name: String,
    pub is_active: bool,
    pub thumbnail: Option<String>,
}

/// RegionChanges
///
/// Partial region update; `None` keeps the persisted value. The slug is never part of it.
#[derive(Debug, Clone, Default)]
pub struct RegionChanges {
    pub name: Option<String>,
    pub is_active: Option<bool>,
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewRegionBanner {
    pub image: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewTourImage {
    pub image: String,
    pub caption: Option<String>,
}

/// NewTour
///
/// The fields shared by both tour kinds on creation.
#[derive(Debug, Clone)]
pub struct NewTour {
    pub name: String,
    pub airline: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price: Decimal,
    pub description: String,
    pub is_active: bool,
    pub thumbnail: String,
    pub tour_program_pdf: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TourChanges {
    pub name: Option<String>,
    pub airline: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub price: Option<Decimal>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub thumbnail: Option<String>,
    pub tour_program_pdf: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewInternationalTour {
    pub tour: NewTour,
    pub region_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct InternationalTourChanges {
    pub tour: TourChanges,
    pub region_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewBanner {
    pub title: String,
    pub description: Option<String>,
    pub image: String,
    pub banner_type: BannerType,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct BannerChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub banner_type: Option<BannerType>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Input payload for the public registration endpoint (POST /register).
/// Neither password field is ever persisted; only the Argon2 hash of `password` is.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 150, message = "Username must be 1 to 150 characters long."))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,
    pub confirm_password: String,
}

/// TokenRequest
///
/// Credentials exchanged for a token pair (POST /token).
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct TokenRequest {
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub username: String,
    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,
}

/// RefreshRequest
///
/// A refresh token exchanged for a new access token (POST /token/refresh).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh: String,
}

// --- Response Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AccessToken {
    pub access: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

// --- Multipart Upload Schemas (OpenAPI only) ---
//
// Write endpoints read `multipart/form-data`; these structs only describe the accepted parts in
// the generated document. Parsing lives in `forms`.

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct RegionUpload {
    name: String,
    is_active: Option<bool>,
    #[schema(value_type = Option<String>, format = Binary)]
    thumbnail: Option<Vec<u8>>,
}

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct TourUpload {
    name: String,
    airline: String,
    #[schema(example = "2025-06-01")]
    start_date: String,
    #[schema(example = "2025-06-08")]
    end_date: String,
    #[schema(example = "1499.90")]
    price: String,
    /// Also accepted as `tour_info`.
    description: String,
    is_active: Option<bool>,
    #[schema(value_type = String, format = Binary)]
    thumbnail: Vec<u8>,
    #[schema(value_type = Option<String>, format = Binary)]
    tour_program_pdf: Option<Vec<u8>>,
    /// Repeated file part, one per supplementary image.
    #[schema(value_type = Vec<String>, format = Binary)]
    images: Vec<Vec<u8>>,
    /// Repeated text part, matched to `images` by position.
    captions: Vec<String>,
    /// International tours only.
    region_id: Option<i64>,
}

#[derive(Deserialize, ToSchema)]
#[allow(dead_code)]
pub struct BannerUpload {
    title: String,
    description: Option<String>,
    #[serde(rename = "type")]
    #[schema(value_type = Option<BannerType>)]
    banner_type: Option<String>,
    is_active: Option<bool>,
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
}

#[derive(ToSchema)]
#[allow(dead_code)]
pub struct RegionBannerUpload {
    title: Option<String>,
    description: Option<String>,
    is_active: Option<bool>,
    #[schema(value_type = String, format = Binary)]
    image: Vec<u8>,
}
