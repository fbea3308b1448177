//! Input validation for API requests.
//!
//! Plain `Result<(), String>` helpers; handlers collect failures into a
//! `ValidationErrorBuilder` so every offending field is reported at once and
//! can be corrected independently.

use lazy_static::lazy_static;
use regex::Regex;

/// Longest accepted title, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Longest accepted description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 1000;

lazy_static! {
    /// Absolute http(s) URLs. Syntax only; reachability is never probed.
    static ref IMAGE_URL_REGEX: Regex = Regex::new(
        r"^https?://[a-zA-Z0-9][-a-zA-Z0-9]*(\.[a-zA-Z0-9][-a-zA-Z0-9]*)*(:\d+)?(/[^\s]*)?$"
    ).unwrap();

    /// Loose email shape; the mail provider is the real arbiter
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[^@\s]+@[^@\s]+\.[^@\s]+$"
    ).unwrap();
}

pub fn validate_title(title: &str) -> Result<(), String> {
    if title.trim().is_empty() {
        return Err("Title is required".to_string());
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(format!("Title is too long (max {MAX_TITLE_CHARS} characters)"));
    }
    Ok(())
}

pub fn validate_description(description: &Option<String>) -> Result<(), String> {
    if let Some(description) = description {
        if description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(format!(
                "Description is too long (max {MAX_DESCRIPTION_CHARS} characters)"
            ));
        }
    }
    Ok(())
}

pub fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() {
        return Err("Price must be a number".to_string());
    }
    if price < 0.0 {
        return Err("Price must not be negative".to_string());
    }
    Ok(())
}

/// Empty is allowed and means "no image, show placeholder".
pub fn validate_image_url(url: &Option<String>) -> Result<(), String> {
    match url.as_deref() {
        None | Some("") => Ok(()),
        Some(url) if IMAGE_URL_REGEX.is_match(url) => Ok(()),
        Some(_) => Err("Invalid image URL".to_string()),
    }
}

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 320 || !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email address".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_limits() {
        assert!(validate_title("Commode Louis XV").is_ok());
        assert!(validate_title("").is_err());
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(100)).is_ok());
        assert!(validate_title(&"x".repeat(101)).is_err());
    }

    #[test]
    fn description_is_optional_but_bounded() {
        assert!(validate_description(&None).is_ok());
        assert!(validate_description(&Some(String::new())).is_ok());
        assert!(validate_description(&Some("y".repeat(1000))).is_ok());
        assert!(validate_description(&Some("y".repeat(1001))).is_err());
    }

    #[test]
    fn price_must_be_non_negative() {
        assert!(validate_price(0.0).is_ok());
        assert!(validate_price(1250.50).is_ok());
        assert!(validate_price(-0.01).is_err());
        assert!(validate_price(f64::NAN).is_err());
    }

    #[test]
    fn image_url_is_syntax_checked_only() {
        assert!(validate_image_url(&None).is_ok());
        assert!(validate_image_url(&Some(String::new())).is_ok());
        assert!(validate_image_url(&Some(
            "https://img.example.com/chair.jpg".to_string()
        ))
        .is_ok());
        assert!(validate_image_url(&Some("http://localhost:9000/x".to_string())).is_ok());
        assert!(validate_image_url(&Some("ftp://example.com/x".to_string())).is_err());
        assert!(validate_image_url(&Some("not a url".to_string())).is_err());
    }

    #[test]
    fn email_shape() {
        assert!(validate_email("jeanne@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
    }
}
