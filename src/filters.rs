//! Query-parameter filters for list endpoints and id-or-slug lookups for detail endpoints.
//!
//! Every list endpoint declares the parameters it accepts; anything else is rejected with
//! `InvalidParameter` before the repository is touched.

use std::collections::HashMap;
use std::fmt;

use crate::{error::AppError, models::BannerType};

/// Raw query parameters as extracted by `Query<HashMap<String, String>>`.
pub type QueryParams = HashMap<String, String>;

/// ActiveFilter
///
/// The `is_active` parameter: `true`, `false` or `all` (case-insensitive, default `all`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveFilter {
    #[default]
    All,
    Active,
    Inactive,
}

impl ActiveFilter {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(ActiveFilter::All),
            "true" => Ok(ActiveFilter::Active),
            "false" => Ok(ActiveFilter::Inactive),
            _ => Err(AppError::InvalidParameter(format!(
                "is_active: '{raw}' is not one of 'true', 'false', 'all'"
            ))),
        }
    }

    /// The required flag value, or `None` when no filter applies.
    pub fn flag(self) -> Option<bool> {
        match self {
            ActiveFilter::All => None,
            ActiveFilter::Active => Some(true),
            ActiveFilter::Inactive => Some(false),
        }
    }

    pub fn matches(self, is_active: bool) -> bool {
        self.flag().is_none_or(|flag| flag == is_active)
    }

    fn from_params(params: &QueryParams) -> Result<Self, AppError> {
        params
            .get("is_active")
            .map(|raw| ActiveFilter::parse(raw))
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

/// Rejects any parameter name not listed in `allowed`.
pub fn ensure_whitelisted(params: &QueryParams, allowed: &[&str]) -> Result<(), AppError> {
    let mut unknown: Vec<&str> = params
        .keys()
        .map(String::as_str)
        .filter(|key| !allowed.contains(key))
        .collect();
    if unknown.is_empty() {
        return Ok(());
    }
    unknown.sort_unstable();
    Err(AppError::InvalidParameter(format!(
        "Unknown query parameter(s): {}. Allowed: {}",
        unknown.join(", "),
        allowed.join(", ")
    )))
}

/// A non-empty, trimmed parameter value.
fn non_empty<'a>(params: &'a QueryParams, key: &str) -> Option<&'a str> {
    params
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

/// Filter for region, domestic tour and region banner lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveOnlyFilter {
    pub is_active: ActiveFilter,
}

impl ActiveOnlyFilter {
    pub const PARAMS: &'static [&'static str] = &["is_active"];

    pub fn from_query(params: &QueryParams) -> Result<Self, AppError> {
        ensure_whitelisted(params, Self::PARAMS)?;
        Ok(Self {
            is_active: ActiveFilter::from_params(params)?,
        })
    }
}

/// Filter for international tour lists.
///
/// `region_slug` is carried unresolved; the handler turns it into a region id (or a 404).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InternationalTourFilter {
    pub is_active: ActiveFilter,
    pub region_id: Option<i64>,
    pub region_slug: Option<String>,
}

impl InternationalTourFilter {
    pub const PARAMS: &'static [&'static str] = &["is_active", "region_id", "region_slug"];

    pub fn from_query(params: &QueryParams) -> Result<Self, AppError> {
        ensure_whitelisted(params, Self::PARAMS)?;
        let region_id = non_empty(params, "region_id")
            .map(|raw| {
                raw.parse::<i64>().map_err(|_| {
                    AppError::InvalidParameter(format!("region_id: '{raw}' is not a valid id"))
                })
            })
            .transpose()?;
        Ok(Self {
            is_active: ActiveFilter::from_params(params)?,
            region_id,
            region_slug: non_empty(params, "region_slug").map(str::to_string),
        })
    }
}

/// Resolved criteria for the international tour query: every listed region id must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InternationalTourCriteria {
    pub is_active: ActiveFilter,
    pub region_ids: Vec<i64>,
}

impl InternationalTourCriteria {
    pub fn matches(&self, is_active: bool, region_id: Option<i64>) -> bool {
        self.is_active.matches(is_active)
            && self
                .region_ids
                .iter()
                .all(|wanted| region_id == Some(*wanted))
    }
}

/// Filter for site banner lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BannerFilter {
    pub is_active: ActiveFilter,
    pub banner_type: Option<BannerType>,
}

impl BannerFilter {
    pub const PARAMS: &'static [&'static str] = &["is_active", "type"];

    pub fn from_query(params: &QueryParams) -> Result<Self, AppError> {
        ensure_whitelisted(params, Self::PARAMS)?;
        let banner_type = non_empty(params, "type")
            .map(|raw| {
                raw.parse::<BannerType>()
                    .map_err(|e| AppError::InvalidParameter(format!("type: {e}")))
            })
            .transpose()?;
        Ok(Self {
            is_active: ActiveFilter::from_params(params)?,
            banner_type,
        })
    }

    pub fn matches(&self, is_active: bool, banner_type: BannerType) -> bool {
        self.is_active.matches(is_active) && self.banner_type.is_none_or(|kind| kind == banner_type)
    }
}

/// Lookup
///
/// A detail-route path value: all ASCII digits means a numeric id, anything else a slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Id(i64),
    Slug(String),
}

impl Lookup {
    pub fn parse(raw: &str) -> Self {
        let all_digits = !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit());
        match raw.parse::<i64>() {
            Ok(id) if all_digits => Lookup::Id(id),
            _ => Lookup::Slug(raw.to_string()),
        }
    }

    /// The `NotFound` error naming this lookup value.
    pub fn not_found(&self, entity: &str) -> AppError {
        AppError::NotFound(format!("{entity} '{self}' not found"))
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::Id(id) => write!(f, "{id}"),
            Lookup::Slug(slug) => f.write_str(slug),
        }
    }
}

/// Parses a numeric-only path value (banners, region banners).
pub fn parse_numeric_id(raw: &str, entity: &str) -> Result<i64, AppError> {
    match Lookup::parse(raw) {
        Lookup::Id(id) => Ok(id),
        Lookup::Slug(_) => Err(AppError::NotFound(format!("{entity} '{raw}' not found"))),
    }
}
