//! Incoming form structs and their typed payload conversions.

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod businesses;
pub mod import_export;

/// Collapse empty/whitespace-only optional inputs to `None`.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim().to_string();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    })
}
