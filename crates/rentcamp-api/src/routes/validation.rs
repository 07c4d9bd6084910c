//! Input validation shared by the route modules

use crate::error::ApiError;

/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum allowed password length (prevent DoS with very large passwords)
const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length
const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum length for free-text fields
const MAX_TEXT_LENGTH: usize = 1024;
/// Maximum length for image URLs
const MAX_URL_LENGTH: usize = 2048;

/// Validate username format and length
pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::BadRequest("Username cannot be empty".to_string()));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Username exceeds maximum length of {} characters",
            MAX_USERNAME_LENGTH
        )));
    }
    // Only allow alphanumeric characters, underscores, and hyphens
    if !username.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(ApiError::BadRequest(
            "Username can only contain alphanumeric characters, underscores, and hyphens".to_string(),
        ));
    }
    Ok(())
}

/// Validate password length
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        )));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "Password exceeds maximum length of {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

/// Validate a required free-text field
pub fn validate_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{} cannot be empty", field)));
    }
    if value.len() > MAX_TEXT_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "{} exceeds maximum length of {} characters",
            field, MAX_TEXT_LENGTH
        )));
    }
    Ok(())
}

/// Validate an email address (shape only)
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    validate_text("Email", email)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ApiError::BadRequest(format!("Invalid email: {}", email))),
    }
}

/// Validate a price or stock amount
pub fn validate_amount(field: &str, value: i64) -> Result<(), ApiError> {
    if value < 0 {
        return Err(ApiError::BadRequest(format!(
            "{} cannot be negative",
            field
        )));
    }
    Ok(())
}

/// Validate a product image URL
pub fn validate_image_url(url: &str) -> Result<(), ApiError> {
    if url.len() > MAX_URL_LENGTH {
        return Err(ApiError::BadRequest(format!(
            "URL exceeds maximum length of {} characters",
            MAX_URL_LENGTH
        )));
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(ApiError::BadRequest(
            "Image URL must use http or https".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("gita_01").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"p".repeat(257)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("gita@example.com").is_ok());
        assert!(validate_email("gita.example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("gita@localhost").is_err());
    }

    #[test]
    fn test_validate_amount_and_url() {
        assert!(validate_amount("Price", 0).is_ok());
        assert!(validate_amount("Price", -1).is_err());
        assert!(validate_image_url("https://cdn.example.com/tent.png").is_ok());
        assert!(validate_image_url("ftp://cdn.example.com/tent.png").is_err());
    }
}
