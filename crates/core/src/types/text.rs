use crate::error::ValidationError;

/// Checks that `value` holds between `min` and `max` characters.
///
/// Lengths are counted in Unicode scalar values, not bytes, so multi-byte
/// authors and content are bounded by what a reader sees.
pub fn check_length(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Required { field });
    }
    let len = value.chars().count();
    if len < min {
        return Err(ValidationError::TooShort { field, min });
    }
    if len > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_value_as_required() {
        assert_eq!(
            check_length("author", "", 2, 50),
            Err(ValidationError::Required { field: "author" })
        );
    }

    #[test]
    fn enforces_bounds() {
        assert_eq!(
            check_length("author", "a", 2, 50),
            Err(ValidationError::TooShort {
                field: "author",
                min: 2
            })
        );
        assert!(check_length("author", "ab", 2, 50).is_ok());
        assert_eq!(
            check_length("content", &"x".repeat(1001), 1, 1000),
            Err(ValidationError::TooLong {
                field: "content",
                max: 1000
            })
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        let value = "é".repeat(50);
        assert_eq!(value.len(), 100);
        assert!(check_length("author", &value, 2, 50).is_ok());
    }
}
