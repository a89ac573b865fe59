use lazy_static::lazy_static;
use regex::Regex;

use crate::store::{StoreError, StoreResult};

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn check_email(email: &str) -> StoreResult<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(StoreError::Validation(format!("invalid email `{email}`")))
    }
}

pub fn check_max_len(field: &str, value: Option<&str>, max: usize) -> StoreResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(StoreError::Validation(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

pub fn check_not_blank(field: &str, value: &str) -> StoreResult<()> {
    if value.trim().is_empty() {
        Err(StoreError::Validation(format!("{field} must not be blank")))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example@x.io"));
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn max_len_counts_characters() {
        assert!(check_max_len("title", Some("ü".repeat(200).as_str()), 200).is_ok());
        assert!(check_max_len("title", Some("a".repeat(201).as_str()), 200).is_err());
        assert!(check_max_len("title", None, 200).is_ok());
    }
}
