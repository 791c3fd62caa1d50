//! Utility functions for identity stamps on cell attributes.

use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur during UUID validation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UuidValidationError {
    /// The UUID is nil (all zeros), which is not allowed.
    #[error("UUID is nil (all zeros) which is not allowed")]
    NilUuid,
    /// The UUID is not version 4.
    #[error("UUID is not version 4: expected version 4, found version {found}")]
    InvalidVersion {
        /// The version number that was found.
        found: usize,
    },
}

// =============================================================================
// UUID HELPERS
// =============================================================================

/// Generates a fresh version-4 UUID for a cell attribute.
///
/// # Examples
///
/// ```rust
/// use cmap::core::util::make_uuid;
///
/// let id = make_uuid();
/// assert_eq!(id.get_version_num(), 4);
/// ```
#[must_use]
pub fn make_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Validates that a UUID is non-nil and version 4.
///
/// # Errors
///
/// Returns [`UuidValidationError::NilUuid`] for the nil UUID and
/// [`UuidValidationError::InvalidVersion`] for any version other than 4.
pub fn validate_uuid(uuid: &Uuid) -> Result<(), UuidValidationError> {
    if uuid.is_nil() {
        return Err(UuidValidationError::NilUuid);
    }
    let version = uuid.get_version_num();
    if version != 4 {
        return Err(UuidValidationError::InvalidVersion { found: version });
    }
    Ok(())
}
