//! crates/swim_admin_core/src/validation.rs
//!
//! Explicit parsing of raw form input. Every failure here is reported before
//! any request is sent.

/// A blocking, user-visible form error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },
    #[error("{field} must be a whole number, got '{value}'")]
    NotANumber { field: &'static str, value: String },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },
    #[error("{field} must be MM:SS or a number of seconds, got '{value}'")]
    BadDuration { field: &'static str, value: String },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Rejects blank text and returns it trimmed.
pub fn require_text(field: &'static str, raw: &str) -> ValidationResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    Ok(trimmed.to_string())
}

/// Blank optional text becomes `None`.
pub fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parses a required integer field.
pub fn parse_int_field(field: &'static str, raw: &str) -> ValidationResult<i64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| ValidationError::NotANumber {
            field,
            value: trimmed.to_string(),
        })
}

/// Parses a required record id. Ids are assigned by the server and start at 1.
pub fn parse_id(field: &'static str, raw: &str) -> ValidationResult<i64> {
    let value = parse_int_field(field, raw)?;
    if value < 1 {
        return Err(ValidationError::OutOfRange {
            field,
            min: 1,
            max: i64::MAX,
        });
    }
    Ok(value)
}

/// Parses a record id that may be left blank.
pub fn parse_optional_id(field: &'static str, raw: Option<&str>) -> ValidationResult<Option<i64>> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => parse_id(field, value).map(Some),
    }
}

/// Parses a required integer and checks it lies in `min..=max`.
pub fn parse_bounded(field: &'static str, raw: &str, min: u32, max: u32) -> ValidationResult<u32> {
    let value = parse_int_field(field, raw)?;
    u32::try_from(value)
        .ok()
        .filter(|v| (min..=max).contains(v))
        .ok_or(ValidationError::OutOfRange {
            field,
            min: i64::from(min),
            max: i64::from(max),
        })
}

/// Accepts `MM:SS` or a plain number of seconds. Blank means no rest.
pub fn parse_rest_time(field: &'static str, raw: &str) -> ValidationResult<u32> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let bad = || ValidationError::BadDuration {
        field,
        value: trimmed.to_string(),
    };
    match trimmed.split_once(':') {
        None => trimmed.parse::<u32>().map_err(|_| bad()),
        Some((minutes, seconds)) => {
            let minutes = minutes.parse::<u32>().map_err(|_| bad())?;
            let seconds = seconds.parse::<u32>().map_err(|_| bad())?;
            if seconds >= 60 || seconds_len(trimmed) != 2 {
                return Err(bad());
            }
            minutes
                .checked_mul(60)
                .and_then(|m| m.checked_add(seconds))
                .ok_or_else(bad)
        }
    }
}

fn seconds_len(raw: &str) -> usize {
    raw.rsplit(':').next().map_or(0, str::len)
}
