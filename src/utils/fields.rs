//! Column limits and request field helpers shared by the handlers.

use serde::{Deserialize, Deserializer};

use crate::error::{AppError, AppResult};

/// Column widths from the migrations
pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_CATEGORY_LEN: usize = 50;

/// Reject `value` when it is longer than `max` characters
pub fn ensure_max_len(field: &str, value: &str, max: usize) -> AppResult<()> {
    if value.chars().count() > max {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

/// Deserialize a patch field where an explicit `null` clears the value.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: a missing key stays `None`, `null` becomes
/// `Some(None)`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        value: Option<Option<f64>>,
    }

    #[test]
    fn test_ensure_max_len_counts_characters() {
        assert!(ensure_max_len("phone", "+919876543210", MAX_PHONE_LEN).is_ok());
        assert!(ensure_max_len("name", &"ब".repeat(MAX_NAME_LEN), MAX_NAME_LEN).is_ok());
        assert!(matches!(
            ensure_max_len("phone", &"9".repeat(MAX_PHONE_LEN + 1), MAX_PHONE_LEN),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_nullable_distinguishes_missing_from_null() {
        let missing: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.value, None);

        let cleared: Patch = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert_eq!(cleared.value, Some(None));

        let set: Patch = serde_json::from_str(r#"{"value": 2.5}"#).unwrap();
        assert_eq!(set.value, Some(Some(2.5)));
    }
}
