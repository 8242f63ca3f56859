//! Input validation helpers
//!
//! Centralized text length constants and validation functions. Every failure
//! is a `ValidationFailed` error carrying `details[field] = message`.

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;
pub const MIN_EMAIL_LEN: usize = 5;

/// Passwords (before hashing)
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 50;

/// Display names
pub const MAX_NAME_LEN: usize = 50;

/// Ordered product description
pub const MAX_PRODUCT_LEN: usize = 200;

/// Delivery addresses
pub const MAX_LOCATION_LEN: usize = 500;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::invalid_field(
            field,
            format!("{field} must not be empty"),
        ));
    }
    let len = value.chars().count();
    if len > max_len {
        return Err(AppError::invalid_field(
            field,
            format!("{field} is too long ({len} chars, max {max_len})"),
        ));
    }
    Ok(())
}

/// Validate that a string length lies within `min..=max` characters.
pub fn validate_text_len(value: &str, field: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::invalid_field(
            field,
            format!("{field} must be between {min} and {max} characters"),
        ));
    }
    Ok(())
}

/// Validate an email address shape: `local@domain.tld`.
pub fn validate_email(email: &str) -> Result<(), AppError> {
    validate_text_len(email, "email", MIN_EMAIL_LEN, MAX_EMAIL_LEN)?;

    let invalid = || AppError::invalid_field("email", "Please provide a valid email");
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) if !host.is_empty() && !tld.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    validate_text_len(password, "password", MIN_PASSWORD_LEN, MAX_PASSWORD_LEN)
}

pub fn validate_name(name: &str) -> Result<(), AppError> {
    validate_required_text(name, "name", MAX_NAME_LEN)
}

pub fn validate_quantity(quantity: u32) -> Result<(), AppError> {
    if quantity < 1 {
        return Err(AppError::invalid_field(
            "quantity",
            "quantity must be at least 1",
        ));
    }
    Ok(())
}
