//! Common validation utilities.
//!
//! Field validators here are written for `#[validate(custom(...))]` and
//! `#[validate(schema(...))]` hooks on request payloads in the domain crate.

use chrono::NaiveDate;
use std::collections::HashSet;
use validator::ValidationError;

/// Highest teaching period in a day.
pub const MAX_HOUR: i32 = 8;

/// Maximum length of a stored material filename.
pub const MAX_MATERIAL_NAME_LEN: usize = 255;

fn error(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Usernames follow the classic account rules: letters, digits and `@.+-_`.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        Ok(())
    } else {
        Err(error(
            "invalid_username",
            "Username may only contain letters, digits and @/./+/-/_",
        ))
    }
}

/// Validates a `#rrggbb` theme colour.
pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    let bytes = color.as_bytes();
    if bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(u8::is_ascii_hexdigit) {
        Ok(())
    } else {
        Err(error(
            "invalid_color",
            "Theme color must be a hex value like #5d58ff",
        ))
    }
}

/// Validates that every period is within 1..=8 and appears once.
pub fn validate_hours<I>(hours: I) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = i32>,
{
    let mut seen = HashSet::new();
    for hour in hours {
        if !(1..=MAX_HOUR).contains(&hour) {
            return Err(error("hour_range", "Hour must be between 1 and 8"));
        }
        if !seen.insert(hour) {
            return Err(error("duplicate_hour", "Each hour may appear only once"));
        }
    }
    Ok(())
}

/// Validates an inclusive date range.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if start <= end {
        Ok(())
    } else {
        Err(error(
            "date_range",
            "End date must not be before start date",
        ))
    }
}

/// Validates an inclusive year span for a cohort.
pub fn validate_year_span(start_year: i32, end_year: i32) -> Result<(), ValidationError> {
    if start_year <= end_year {
        Ok(())
    } else {
        Err(error("year_span", "End year must not be before start year"))
    }
}

/// Validates an awarded score against its maximum.
pub fn validate_score(marks: f64, max_marks: f64) -> Result<(), ValidationError> {
    if !marks.is_finite() || !max_marks.is_finite() {
        return Err(error("score_not_finite", "Marks must be finite numbers"));
    }
    if max_marks <= 0.0 {
        return Err(error("max_marks_range", "Maximum marks must be positive"));
    }
    if !(0.0..=max_marks).contains(&marks) {
        return Err(error(
            "marks_range",
            "Marks must be between 0 and the maximum marks",
        ));
    }
    Ok(())
}

/// Material entries are opaque filenames; only emptiness and length are checked.
pub fn validate_material_names(materials: &[String]) -> Result<(), ValidationError> {
    if materials
        .iter()
        .all(|m| !m.trim().is_empty() && m.len() <= MAX_MATERIAL_NAME_LEN)
    {
        Ok(())
    } else {
        Err(error(
            "material_name",
            "Material names must be non-empty and at most 255 characters",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("jai.akash").is_ok());
        assert!(validate_username("dean_saravanan").is_ok());
        assert!(validate_username("a+b@x-y").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("semi;colon").is_err());
    }

    #[test]
    fn test_validate_hex_color() {
        assert!(validate_hex_color("#5d58ff").is_ok());
        assert!(validate_hex_color("#ABCDEF").is_ok());
        assert!(validate_hex_color("5d58ff").is_err());
        assert!(validate_hex_color("#5d58f").is_err());
        assert!(validate_hex_color("#5d58fg").is_err());
    }

    #[test]
    fn test_validate_hours() {
        assert!(validate_hours(vec![1, 2, 3, 8]).is_ok());
        assert!(validate_hours(Vec::new()).is_ok());

        let err = validate_hours(vec![0]).unwrap_err();
        assert_eq!(err.code, "hour_range");
        let err = validate_hours(vec![9]).unwrap_err();
        assert_eq!(err.code, "hour_range");
        let err = validate_hours(vec![2, 3, 2]).unwrap_err();
        assert_eq!(err.code, "duplicate_hour");
    }

    #[test]
    fn test_validate_date_range() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        assert!(validate_date_range(d(1), d(1)).is_ok());
        assert!(validate_date_range(d(1), d(5)).is_ok());
        assert!(validate_date_range(d(5), d(1)).is_err());
    }

    #[test]
    fn test_validate_year_span() {
        assert!(validate_year_span(2024, 2028).is_ok());
        assert!(validate_year_span(2024, 2024).is_ok());
        assert!(validate_year_span(2028, 2024).is_err());
    }

    #[test]
    fn test_validate_score() {
        assert!(validate_score(0.0, 100.0).is_ok());
        assert!(validate_score(100.0, 100.0).is_ok());
        assert!(validate_score(42.5, 50.0).is_ok());
        assert_eq!(validate_score(101.0, 100.0).unwrap_err().code, "marks_range");
        assert_eq!(validate_score(-1.0, 100.0).unwrap_err().code, "marks_range");
        assert_eq!(validate_score(1.0, 0.0).unwrap_err().code, "max_marks_range");
        assert_eq!(
            validate_score(f64::NAN, 100.0).unwrap_err().code,
            "score_not_finite"
        );
    }

    #[test]
    fn test_validate_material_names() {
        assert!(validate_material_names(&[]).is_ok());
        assert!(validate_material_names(&["unit1.pdf".into(), "notes v2.docx".into()]).is_ok());
        assert!(validate_material_names(&["  ".into()]).is_err());
        assert!(validate_material_names(&["x".repeat(256)]).is_err());
    }
}
