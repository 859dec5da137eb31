//! Input parsing helpers shared by the modules.

use once_cell::sync::Lazy;
use regex::Regex;
use shelf_db::{records::calendar_date, RecordId};
use shelf_kernel::{settings::EmptyListPolicy, DomainError};
use time::Date;

static EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("email pattern"));

/// Optional `+91` country prefix followed by exactly ten digits.
static PHONE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\+91)?[0-9]{10}$").expect("phone pattern"));

/// Parse a path or body identifier; `label` names it in the error message.
pub fn parse_id(raw: &str, label: &str) -> Result<RecordId, DomainError> {
    raw.parse()
        .map_err(|_| DomainError::invalid_fields(format!("Invalid {}.", label), &[(label, "malformed identifier")]))
}

/// Trimmed value, or `None` when absent or blank.
pub fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

pub fn is_valid_phone(phone: &str) -> bool {
    PHONE.is_match(phone)
}

/// The ten-digit form of a valid phone, so `+919876543210` and `9876543210`
/// are the same number.
pub fn canonical_phone(phone: &str) -> String {
    phone.strip_prefix("+91").unwrap_or(phone).to_string()
}

/// `YYYY-MM-DD`.
pub fn parse_calendar_date(raw: &str, field: &str) -> Result<Date, DomainError> {
    calendar_date::parse(raw).map_err(|_| {
        DomainError::invalid_fields(
            format!("{} must be a date in YYYY-MM-DD format.", field),
            &[(field, "invalid date")],
        )
    })
}

/// Subcategories with blanks dropped; `None` if nothing remains.
pub fn subcategories(values: Vec<String>) -> Option<Vec<String>> {
    let cleaned: Vec<String> = values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Apply the configured empty-result policy to a list read.
pub fn list_result<T>(items: Vec<T>, policy: EmptyListPolicy, what: &str) -> Result<Vec<T>, DomainError> {
    if items.is_empty() && policy == EmptyListPolicy::NotFound {
        return Err(DomainError::not_found(format!("No {} found.", what)));
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("a@x.com"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a x@y.com"));
    }

    #[test]
    fn test_phone_shape() {
        assert!(is_valid_phone("+911234567890"));
        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("+44123456789"));
        assert!(!is_valid_phone("12345"));
    }

    #[test]
    fn test_canonical_phone_drops_country_prefix() {
        assert_eq!(canonical_phone("+919876543210"), "9876543210");
        assert_eq!(canonical_phone("9876543210"), "9876543210");
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(matches!(
            parse_id("abc", "bookId"),
            Err(DomainError::Validation { .. })
        ));
        let id = RecordId::new();
        assert_eq!(parse_id(&id.to_string(), "bookId").unwrap(), id);
    }

    #[test]
    fn test_calendar_date() {
        let date = parse_calendar_date("2020-01-01", "releasedAt").unwrap();
        assert_eq!(date.year(), 2020);
        assert!(parse_calendar_date("01/01/2020", "releasedAt").is_err());
    }

    #[test]
    fn test_list_policy() {
        let empty: Vec<u8> = Vec::new();
        assert!(list_result(empty.clone(), EmptyListPolicy::Empty, "books").unwrap().is_empty());
        assert!(matches!(
            list_result(empty, EmptyListPolicy::NotFound, "books"),
            Err(DomainError::NotFound { .. })
        ));
    }

    #[test]
    fn test_subcategories_drop_blanks() {
        assert_eq!(
            subcategories(vec![" Drama ".to_string(), "".to_string()]),
            Some(vec!["Drama".to_string()])
        );
        assert_eq!(subcategories(vec!["  ".to_string()]), None);
    }
}
