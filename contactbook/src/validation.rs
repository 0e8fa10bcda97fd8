//! Input checks shared by the request models.

use once_cell::sync::Lazy;
use regex::Regex;

/// `local@domain.tld`, no whitespace, at least one dot in the domain.
static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Trimmed, lower-cased email, or a message describing why it was rejected.
pub fn normalize_email(email: &str) -> Result<String, String> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if !is_valid_email(email) {
        return Err(format!("'{email}' is not a valid email address"));
    }
    Ok(email.to_lowercase())
}
