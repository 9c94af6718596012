//! # Validation Utilities
//!
//! Input validation helpers.

/// Validate that a string is not empty.
///
/// Only the empty string is rejected; whitespace is kept as content.
pub fn validate_not_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}
