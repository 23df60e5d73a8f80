use crate::error::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Input validation for credentials

pub const MIN_PASSWORD_LEN: usize = 6;

// Hardcoded pattern, always valid
static EMAIL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("hardcoded email regex is invalid - fix source code")
});

/// Validate email format (`local@domain.tld`)
pub fn validate_email(email: &str) -> bool {
    !email.is_empty() && email.len() <= 254 && EMAIL_REGEX.is_match(email)
}

/// Validate password length (at least 6 characters)
pub fn validate_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

/// Check an email/password pair, failing on the first bad field
pub fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::new("email", "email is required"));
    }
    if !validate_email(email) {
        return Err(ValidationError::new("email", "invalid email format"));
    }
    if password.is_empty() {
        return Err(ValidationError::new("password", "password is required"));
    }
    if !validate_password(password) {
        return Err(ValidationError::new(
            "password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters long"),
        ));
    }

    Ok(())
}
