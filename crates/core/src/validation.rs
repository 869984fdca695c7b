//! Input validation for profile forms and query parameters
//!
//! Form input is rejected client-side before any network call is made.
//! The fluent [`Validator`] collects every problem instead of stopping at
//! the first one, so a form can highlight all invalid fields at once.
//!
//! # Example
//!
//! ```rust
//! use findixi_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .required("name", "La Casona")
//!     .max_length("name", "La Casona", 120)
//!     .validate();
//!
//! assert!(result.is_valid());
//! ```

use crate::error::{Error, ErrorCode, Result};
use serde::{Deserialize, Serialize};

/// Validation error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
    /// Expected value (if applicable)
    pub expected: Option<String>,
    /// Actual value (if applicable)
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Get all warnings
    pub fn warnings(&self) -> &[ValidationError] {
        &self.warnings
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: ValidationError) {
        self.warnings.push(warning);
    }

    /// Convert to Result type
    pub fn to_result(self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            let messages: Vec<String> = self.errors.iter().map(|e| e.to_string()).collect();
            Err(Error::new(
                ErrorCode::ValidationError,
                format!("Validation failed: {}", messages.join("; ")),
            ))
        }
    }
}

/// Fluent validator builder
pub struct Validator {
    result: ValidationResult,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            result: ValidationResult::new(),
        }
    }

    /// Validate that a field is not empty
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: "Field is required".to_string(),
                code: "REQUIRED".to_string(),
                expected: Some("non-empty value".to_string()),
                actual: Some("empty".to_string()),
            });
        }
        self
    }

    /// Validate minimum length
    pub fn min_length(mut self, field: &str, value: &str, min: usize) -> Self {
        if value.chars().count() < min {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be at least {} characters", min),
                code: "MIN_LENGTH".to_string(),
                expected: Some(format!(">= {} chars", min)),
                actual: Some(format!("{} chars", value.chars().count())),
            });
        }
        self
    }

    /// Validate maximum length
    pub fn max_length(mut self, field: &str, value: &str, max: usize) -> Self {
        if value.chars().count() > max {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be at most {} characters", max),
                code: "MAX_LENGTH".to_string(),
                expected: Some(format!("<= {} chars", max)),
                actual: Some(format!("{} chars", value.chars().count())),
            });
        }
        self
    }

    /// Validate that a value is in a list of allowed values
    pub fn one_of(mut self, field: &str, value: &str, allowed: &[&str]) -> Self {
        if !allowed.contains(&value) {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be one of: {}", allowed.join(", ")),
                code: "ONE_OF".to_string(),
                expected: Some(allowed.join(", ")),
                actual: Some(value.to_string()),
            });
        }
        self
    }

    /// Validate a numeric range
    pub fn range<T: PartialOrd + std::fmt::Display>(
        mut self,
        field: &str,
        value: T,
        min: T,
        max: T,
    ) -> Self {
        if value < min || value > max {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: format!("Must be between {} and {}", min, max),
                code: "RANGE".to_string(),
                expected: Some(format!("{} - {}", min, max)),
                actual: Some(value.to_string()),
            });
        }
        self
    }

    /// Add a custom validation; the closure returns an error message on failure
    pub fn custom<F>(mut self, field: &str, f: F) -> Self
    where
        F: FnOnce() -> Option<String>,
    {
        if let Some(message) = f() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message,
                code: "CUSTOM".to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Add a warning (non-blocking)
    pub fn warn_if(mut self, field: &str, condition: bool, message: &str) -> Self {
        if condition {
            self.result.add_warning(ValidationError {
                field: field.to_string(),
                message: message.to_string(),
                code: "WARNING".to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> ValidationResult {
        self.result
    }
}

/// Validate a geographic coordinate pair
pub fn validate_coordinates(latitude: f64, longitude: f64) -> ValidationResult {
    Validator::new()
        .range("latitude", latitude, -90.0, 90.0)
        .range("longitude", longitude, -180.0, 180.0)
        .custom("coordinates", || {
            if latitude == 0.0 && longitude == 0.0 {
                Some("Null Island coordinates are almost certainly unset".to_string())
            } else {
                None
            }
        })
        .validate()
}

/// Validate a NANP phone number (10 digits, optionally 11 with leading 1)
pub fn validate_phone(field: &str, phone: &str) -> ValidationResult {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();

    Validator::new()
        .custom(field, || {
            match digits.len() {
                10 => None,
                11 if digits.starts_with('1') => None,
                0 => Some("Phone number is required".to_string()),
                n => Some(format!("Expected 10 digits, got {}", n)),
            }
        })
        .validate()
}

/// Validate an operating-hours window given as `HH:MM` strings
pub fn validate_hours_window(open: &str, close: &str) -> ValidationResult {
    let mut result = ValidationResult::new();

    let parse = |value: &str| -> Option<(u8, u8)> {
        let (h, m) = value.split_once(':')?;
        let h: u8 = h.parse().ok()?;
        let m: u8 = m.parse().ok()?;
        (h < 24 && m < 60).then_some((h, m))
    };

    let open_hm = parse(open);
    let close_hm = parse(close);

    if open_hm.is_none() {
        result.add_error(ValidationError {
            field: "open".to_string(),
            message: format!("Invalid time: {}", open),
            code: "INVALID_TIME".to_string(),
            expected: Some("HH:MM".to_string()),
            actual: Some(open.to_string()),
        });
    }
    if close_hm.is_none() {
        result.add_error(ValidationError {
            field: "close".to_string(),
            message: format!("Invalid time: {}", close),
            code: "INVALID_TIME".to_string(),
            expected: Some("HH:MM".to_string()),
            actual: Some(close.to_string()),
        });
    }

    // Overnight windows (close before open) are legitimate for bars; only
    // an exactly-equal pair is flagged, as a zero-length window.
    if let (Some(o), Some(c)) = (open_hm, close_hm) {
        if o == c {
            result.add_error(ValidationError {
                field: "close".to_string(),
                message: "Opening and closing time are identical".to_string(),
                code: "EMPTY_WINDOW".to_string(),
                expected: None,
                actual: Some(format!("{} - {}", open, close)),
            });
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_validation() {
        let result = Validator::new().required("name", "  ").validate();
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].code, "REQUIRED");
    }

    #[test]
    fn test_length_bounds() {
        let result = Validator::new()
            .min_length("term", "ab", 3)
            .max_length("name", "abcdefghijk", 5)
            .validate();
        assert_eq!(result.errors().len(), 2);
    }

    #[test]
    fn test_one_of_validation() {
        let result = Validator::new()
            .one_of("sort", "random", &["az", "recent", "distance"])
            .validate();
        assert!(!result.is_valid());
        assert_eq!(result.errors()[0].code, "ONE_OF");
    }

    #[test]
    fn test_coordinates_valid() {
        assert!(validate_coordinates(18.2208, -66.5901).is_valid());
    }

    #[test]
    fn test_coordinates_out_of_range() {
        let result = validate_coordinates(91.0, -66.0);
        assert!(!result.is_valid());
    }

    #[test]
    fn test_null_island_rejected() {
        assert!(!validate_coordinates(0.0, 0.0).is_valid());
    }

    #[test]
    fn test_phone_ten_digits() {
        assert!(validate_phone("phone", "787-555-0199").is_valid());
    }

    #[test]
    fn test_phone_eleven_with_country_code() {
        assert!(validate_phone("phone", "1 (787) 555-0199").is_valid());
    }

    #[test]
    fn test_phone_wrong_length() {
        let result = validate_phone("phone", "555-0199");
        assert!(!result.is_valid());
    }

    #[test]
    fn test_hours_window_valid() {
        assert!(validate_hours_window("09:00", "17:30").is_valid());
    }

    #[test]
    fn test_hours_window_overnight_allowed() {
        assert!(validate_hours_window("20:00", "02:00").is_valid());
    }

    #[test]
    fn test_hours_window_empty_rejected() {
        assert!(!validate_hours_window("09:00", "09:00").is_valid());
    }

    #[test]
    fn test_hours_window_garbage_rejected() {
        assert!(!validate_hours_window("25:00", "17:00").is_valid());
    }
}
