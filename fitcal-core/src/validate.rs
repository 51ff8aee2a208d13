//! Boundary checks for raw user input.
//!
//! Producers run these before calling into the ledger. The ledger repeats the
//! numeric checks on its own inputs so a bad value can never reach a counter.

use thiserror::Error;

/// Lowest accepted daily calorie target.
pub const MIN_CALORIE_TARGET: u32 = 1;
/// Highest accepted daily calorie target.
pub const MAX_CALORIE_TARGET: u32 = 5000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be a whole number, got '{value}'")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} would overflow")]
    Overflow { field: &'static str },
}

/// Parses a strictly positive whole number.
pub fn parse_positive(field: &'static str, raw: &str) -> Result<u32, ValidationError> {
    let value = parse_integer(field, raw)?;
    if value <= 0 {
        return Err(ValidationError::NotPositive { field });
    }
    to_u32(field, value)
}

/// Parses a whole number that may be zero.
pub fn parse_non_negative(field: &'static str, raw: &str) -> Result<u32, ValidationError> {
    let value = parse_integer(field, raw)?;
    if value < 0 {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min: 0,
            max: i64::from(u32::MAX),
        });
    }
    to_u32(field, value)
}

pub fn check_positive(field: &'static str, value: u32) -> Result<u32, ValidationError> {
    if value == 0 {
        return Err(ValidationError::NotPositive { field });
    }
    Ok(value)
}

pub fn check_calorie_target(value: u32) -> Result<u32, ValidationError> {
    if !(MIN_CALORIE_TARGET..=MAX_CALORIE_TARGET).contains(&value) {
        return Err(ValidationError::OutOfRange {
            field: "calorie target",
            value: i64::from(value),
            min: i64::from(MIN_CALORIE_TARGET),
            max: i64::from(MAX_CALORIE_TARGET),
        });
    }
    Ok(value)
}

/// Trims a display name and rejects blanks.
pub fn check_name(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    Ok(trimmed.to_string())
}

fn parse_integer(field: &'static str, raw: &str) -> Result<i64, ValidationError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ValidationError::NotANumber {
            field,
            value: raw.to_string(),
        })
}

fn to_u32(field: &'static str, value: i64) -> Result<u32, ValidationError> {
    u32::try_from(value).map_err(|_| ValidationError::OutOfRange {
        field,
        value,
        min: 0,
        max: i64::from(u32::MAX),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive_accepts_whole_numbers() {
        assert_eq!(parse_positive("duration", "30").unwrap(), 30);
        assert_eq!(parse_positive("duration", " 45 ").unwrap(), 45);
    }

    #[test]
    fn test_parse_positive_rejects_zero_and_negative() {
        assert_eq!(
            parse_positive("duration", "0"),
            Err(ValidationError::NotPositive { field: "duration" })
        );
        assert_eq!(
            parse_positive("duration", "-5"),
            Err(ValidationError::NotPositive { field: "duration" })
        );
    }

    #[test]
    fn test_parse_positive_rejects_garbage() {
        let err = parse_positive("calories", "lots").unwrap_err();
        assert!(matches!(err, ValidationError::NotANumber { .. }));
        assert!(err.to_string().contains("'lots'"));

        assert!(parse_positive("calories", "").is_err());
        assert!(parse_positive("calories", "12.5").is_err());
    }

    #[test]
    fn test_parse_non_negative_allows_zero() {
        assert_eq!(parse_non_negative("calories", "0").unwrap(), 0);
        assert!(matches!(
            parse_non_negative("calories", "-1"),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_parse_rejects_values_beyond_u32() {
        assert!(matches!(
            parse_positive("calories", "99999999999"),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_check_calorie_target_bounds() {
        assert_eq!(check_calorie_target(1).unwrap(), 1);
        assert_eq!(check_calorie_target(5000).unwrap(), 5000);
        assert!(check_calorie_target(0).is_err());

        let err = check_calorie_target(6000).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfRange {
                field: "calorie target",
                value: 6000,
                min: 1,
                max: 5000,
            }
        );
    }

    #[test]
    fn test_check_name() {
        assert_eq!(check_name("meal name", "  Banana ").unwrap(), "Banana");
        assert_eq!(
            check_name("meal name", "   "),
            Err(ValidationError::Empty { field: "meal name" })
        );
    }
}
