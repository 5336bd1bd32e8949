//! Cache key derivation for attendance records.
//!
//! Keys have the form `attendance_{classId}_{studentId}_{YYYY-MM-DD}`.
//! Identifiers are restricted to `[A-Za-z0-9.-]` so the `_` separator can
//! never appear inside a segment; `class_of_key` relies on this.

use crate::error::{CoreError, Result};
use time::Date;
use time::macros::format_description;

const KEY_PREFIX: &str = "attendance_";
const MAX_ID_LEN: usize = 64;

/// Validate a class or student identifier.
///
/// Accepts 1-64 characters from `[A-Za-z0-9.-]`.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > MAX_ID_LEN {
        return Err(CoreError::invalid_id(id));
    }
    if !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-') {
        return Err(CoreError::invalid_id(id));
    }
    Ok(())
}

/// Derive the cache key for a `(class, student, date)` tuple.
///
/// Pure and deterministic: the same inputs always produce the same key,
/// and any change of calendar date produces a distinct key.
pub fn attendance_key(class_id: &str, student_id: &str, date: Date) -> String {
    let date_str = date
        .format(format_description!("[year]-[month]-[day]"))
        .expect("date formatting with a const format cannot fail");
    format!("{KEY_PREFIX}{class_id}_{student_id}_{date_str}")
}

/// Extract the class segment from a derived cache key.
///
/// Returns `None` for strings that do not follow the key format.
pub fn class_of_key(key: &str) -> Option<&str> {
    let rest = key.strip_prefix(KEY_PREFIX)?;
    let mut segments = rest.split('_');
    let class_id = segments.next().filter(|s| !s.is_empty())?;
    // A well-formed key has exactly student and date segments remaining.
    segments.next().filter(|s| !s.is_empty())?;
    segments.next().filter(|s| !s.is_empty())?;
    if segments.next().is_some() {
        return None;
    }
    Some(class_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_key_format() {
        let key = attendance_key("123", "456", date!(2025 - 03 - 10));
        assert_eq!(key, "attendance_123_456_2025-03-10");
    }

    #[test]
    fn test_key_is_deterministic() {
        let d = date!(2025 - 03 - 10);
        assert_eq!(attendance_key("123", "456", d), attendance_key("123", "456", d));
    }

    #[test]
    fn test_key_changes_with_date() {
        let a = attendance_key("123", "456", date!(2025 - 03 - 10));
        let b = attendance_key("123", "456", date!(2025 - 03 - 11));
        assert_ne!(a, b);
    }

    #[test]
    fn test_single_digit_month_and_day_are_zero_padded() {
        let key = attendance_key("c1", "s2", date!(2025 - 01 - 05));
        assert_eq!(key, "attendance_c1_s2_2025-01-05");
    }

    #[test]
    fn test_class_of_key() {
        assert_eq!(class_of_key("attendance_123_456_2025-03-10"), Some("123"));
        assert_eq!(class_of_key("attendance_math-7b_s9_2025-03-10"), Some("math-7b"));
    }

    #[test]
    fn test_class_of_key_rejects_malformed() {
        assert_eq!(class_of_key("bogus"), None);
        assert_eq!(class_of_key("attendance_123"), None);
        assert_eq!(class_of_key("attendance_123_456"), None);
        assert_eq!(class_of_key("attendance_123_456_2025-03-10_extra"), None);
        assert_eq!(class_of_key("attendance__456_2025-03-10"), None);
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("123").is_ok());
        assert!(validate_id("math-7b.2025").is_ok());

        assert!(validate_id("").is_err());
        assert!(validate_id("has_underscore").is_err());
        assert!(validate_id("has space").is_err());
        assert!(validate_id(&"x".repeat(65)).is_err());
    }
}
