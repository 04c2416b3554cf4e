//! Input validation for RPC-supplied fields.

use std::fmt;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid email format.
    InvalidEmail(String),
    /// Invalid URL.
    InvalidUrl(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
    /// Number outside its permitted range.
    OutOfRange { field: String, min: i64, max: i64, actual: i64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
            ValidationError::OutOfRange {
                field,
                min,
                max,
                actual,
            } => write!(f, "{} must be between {} and {} (got {})", field, min, max, actual),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum allowed length for campaign names.
pub const MAX_CAMPAIGN_NAME_LENGTH: usize = 100;

/// Bounds on a campaign's search radius.
pub const MIN_RADIUS_MILES: i64 = 1;
pub const MAX_RADIUS_MILES: i64 = 100;

/// Default search radius when the caller omits one.
pub const DEFAULT_RADIUS_MILES: i64 = 25;

/// Bounds on list page sizes.
pub const MAX_PAGE_LIMIT: i64 = 100;
pub const DEFAULT_PAGE_LIMIT: i64 = 25;

/// Validate an email address (basic RFC 5322 format check).
///
/// This is a basic validation that checks:
/// - Contains exactly one @
/// - Has at least one character before @
/// - Has at least one character after @
/// - Has at least one dot after @
/// - Is not too long
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }

    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    if domain.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing domain (after @)".to_string(),
        ));
    }

    if !domain.contains('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must contain at least one dot".to_string(),
        ));
    }

    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidEmail(
            "domain cannot start or end with a dot".to_string(),
        ));
    }

    if domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "domain cannot contain consecutive dots".to_string(),
        ));
    }

    Ok(())
}

/// Require a non-blank value.
pub fn validate_required(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }
    Ok(())
}

/// Validate a campaign name: non-empty and at most 100 characters.
pub fn validate_campaign_name(name: &str) -> Result<(), ValidationError> {
    validate_required("name", name)?;

    let len = name.chars().count();
    if len > MAX_CAMPAIGN_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_CAMPAIGN_NAME_LENGTH,
            actual: len,
        });
    }

    Ok(())
}

/// Validate an integer against inclusive bounds.
pub fn validate_range(field: &str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            actual: value,
        });
    }
    Ok(())
}

/// Validate an absolute http(s) URL.
pub fn validate_url(field: &str, value: &str) -> Result<(), ValidationError> {
    let parsed = url::Url::parse(value.trim())
        .map_err(|e| ValidationError::InvalidUrl(format!("{}: {}", field, e)))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ValidationError::InvalidUrl(format!(
            "{}: unsupported scheme '{}'",
            field,
            parsed.scheme()
        )));
    }

    if parsed.host_str().is_none() {
        return Err(ValidationError::InvalidUrl(format!("{}: missing host", field)));
    }

    Ok(())
}

/// Normalized pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: i64,
    /// Rows per page.
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build a page request, applying defaults and validating bounds.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Result<Self, ValidationError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);

        validate_range("limit", limit, 1, MAX_PAGE_LIMIT)?;
        // The row offset must fit in an i64.
        validate_range("page", page, 1, (i64::MAX / limit).saturating_add(1))?;

        Ok(Self { page, limit })
    }

    /// Row offset of the first item on this page.
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    /// Number of pages needed for `total` rows.
    pub fn total_pages(&self, total: i64) -> i64 {
        (total + self.limit - 1) / self.limit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.co.uk").is_ok());
        assert!(validate_email(" test@example.com ").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(matches!(validate_email(""), Err(ValidationError::Empty(_))));
        assert!(matches!(
            validate_email("test.example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example@com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("@example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@localhost"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example..com"),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_validate_campaign_name() {
        assert!(validate_campaign_name("Dentists in Austin").is_ok());
        assert!(matches!(
            validate_campaign_name("   "),
            Err(ValidationError::Empty(_))
        ));
        let long = "x".repeat(101);
        assert!(matches!(
            validate_campaign_name(&long),
            Err(ValidationError::TooLong { max: 100, actual: 101, .. })
        ));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("website", "https://example.com").is_ok());
        assert!(validate_url("website", "http://example.com/about").is_ok());
        assert!(matches!(
            validate_url("website", "example.com"),
            Err(ValidationError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_url("website", "ftp://example.com"),
            Err(ValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_page_request() {
        let page = PageRequest::new(None, None).unwrap();
        assert_eq!(page, PageRequest { page: 1, limit: 25 });
        assert_eq!(page.offset(), 0);

        let page = PageRequest::new(Some(3), Some(10)).unwrap();
        assert_eq!(page.offset(), 20);
        assert_eq!(page.total_pages(0), 0);
        assert_eq!(page.total_pages(10), 1);
        assert_eq!(page.total_pages(11), 2);

        assert!(PageRequest::new(Some(0), None).is_err());
        assert!(PageRequest::new(None, Some(101)).is_err());
        assert!(PageRequest::new(None, Some(0)).is_err());
    }

    #[test]
    fn test_page_request_offset_cannot_overflow() {
        assert!(matches!(
            PageRequest::new(Some(i64::MAX), Some(100)),
            Err(ValidationError::OutOfRange { .. })
        ));

        let last = PageRequest::new(Some(i64::MAX / 100 + 1), Some(100)).unwrap();
        assert_eq!(last.offset(), i64::MAX / 100 * 100);

        let single = PageRequest::new(Some(i64::MAX), Some(1)).unwrap();
        assert_eq!(single.offset(), i64::MAX - 1);
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::OutOfRange {
            field: "search_radius_miles".to_string(),
            min: 1,
            max: 100,
            actual: 500,
        };
        assert_eq!(
            err.to_string(),
            "search_radius_miles must be between 1 and 100 (got 500)"
        );
    }
}
