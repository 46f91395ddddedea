//! Router Module Index
//!
//! Splits the API by access level. Authentication is applied as a layer on the whole
//! authenticated router, so a write endpoint cannot be registered without it.

/// Catalogue reads, registration and token endpoints.
pub mod public;

/// Catalogue writes and the caller's profile. Requires a valid access token.
pub mod authenticated;
