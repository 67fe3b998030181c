//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate a display name
pub fn validate_full_name(full_name: &str) -> Result<(), String> {
    let length = full_name.chars().count();

    if length == 0 {
        return Err("Full name must not be empty".to_string());
    }

    if length > 100 {
        return Err("Full name must be at most 100 characters long".to_string());
    }

    if full_name.chars().any(char::is_control) {
        return Err("Full name must not contain control characters".to_string());
    }

    Ok(())
}

/// Validate an image link supplied with an event or resource
pub fn validate_image_url(url: &str) -> Result<(), String> {
    static URL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = URL_REGEX.get_or_init(|| {
        Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("Failed to compile URL regex")
    });

    if url.len() > 2048 || !regex.is_match(url) {
        return Err("Image URL must be an http(s) link".to_string());
    }

    Ok(())
}
