//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted messaging handle.
const MAX_HANDLE_LEN: usize = 64;

/// Validates that a messaging handle is non-empty, at most 64 characters and
/// free of whitespace.
///
/// # Examples
///
/// ```ignore
/// validate_handle("alice_01") // Ok
/// validate_handle("")         // Err - empty
/// validate_handle("a b")      // Err - whitespace
/// ```
pub fn validate_handle(handle: &str) -> Result<(), ValidationError> {
    let len = handle.chars().count();
    if len == 0 || len > MAX_HANDLE_LEN {
        let mut err = ValidationError::new("handle_length");
        err.message = Some(
            format!("Handle must be between 1 and {MAX_HANDLE_LEN} characters (got {len})").into(),
        );
        return Err(err);
    }

    if handle.chars().any(char::is_whitespace) {
        let mut err = ValidationError::new("handle_format");
        err.message = Some("Handle must not contain whitespace".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_handle_valid() {
        assert!(validate_handle("alice").is_ok());
        assert!(validate_handle("user_1234").is_ok());
        assert!(validate_handle("игрок").is_ok());
    }

    #[test]
    fn test_validate_handle_invalid_length() {
        assert!(validate_handle("").is_err());
        assert!(validate_handle(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_handle_invalid_format() {
        assert!(validate_handle("alice smith").is_err());
        assert!(validate_handle("tab\there").is_err());
    }
}
