//! Activation-state rules tying international tours to their region.
//!
//! Both repository implementations call into these functions inside their write path, so the
//! Postgres transaction and the in-memory lock apply exactly the same decisions.

use crate::{error::AppError, models::Region};

/// The state pushed down to a region's tours when the region is updated.
///
/// Returns `Some(new_state)` only when the incoming flag differs from the persisted one.
/// The push is an unconditional overwrite: reactivating a region reactivates every tour.
pub fn region_cascade(persisted: bool, incoming: Option<bool>) -> Option<bool> {
    match incoming {
        Some(next) if next != persisted => Some(next),
        _ => None,
    }
}

/// The state written to every tour of a region that is being deleted.
pub const DELETED_REGION_TOUR_STATE: bool = false;

/// The active flag actually persisted for an international tour.
///
/// A tour under an inactive region, or without a region, is always stored inactive.
pub fn effective_tour_state(region: Option<&Region>, requested: bool) -> bool {
    requested && region.is_some_and(|region| region.is_active)
}

/// Validation-time check for a request that explicitly selects a region.
///
/// Rejects the selection outright instead of silently deactivating the tour.
pub fn ensure_assignable(region_id: i64, region: Option<&Region>) -> Result<(), AppError> {
    match region {
        None => Err(AppError::Validation(format!(
            "region_id: Invalid pk \"{region_id}\" - region does not exist."
        ))),
        Some(region) if !region.is_active => Err(AppError::Validation(format!(
            "region_id: The selected region '{}' is not active.",
            region.name
        ))),
        Some(_) => Ok(()),
    }
}
