//! Validation of item names before they reach the `op` command line.

use crate::{OpError, Result};

/// Validates an item name.
///
/// Names are passed to `op` as separate arguments (never through a shell),
/// so the checks are about what `op` itself would misread:
/// - Empty names
/// - Null bytes and control characters
/// - A leading `-`, which `op` would parse as a flag
///
/// # Errors
///
/// Returns [`OpError::InvalidItemName`] if validation fails.
///
/// # Example
///
/// ```
/// use opsession::validation::validate_item_name;
///
/// assert!(validate_item_name("github").is_ok());
/// assert!(validate_item_name("AWS (prod) root").is_ok());
///
/// assert!(validate_item_name("").is_err());
/// assert!(validate_item_name("--vault=Shared").is_err());
/// ```
pub fn validate_item_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(OpError::InvalidItemName("name cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(OpError::InvalidItemName(
            "name contains null byte".to_string(),
        ));
    }

    if name.chars().any(char::is_control) {
        return Err(OpError::InvalidItemName(
            "name contains control characters".to_string(),
        ));
    }

    if name.starts_with('-') {
        return Err(OpError::InvalidItemName(format!(
            "name '{}' would be read as an option",
            name
        )));
    }

    Ok(())
}
