//! Client-side checks run before submitting login or registration.

use super::AuthError;

pub const MIN_PASSWORD_LENGTH: usize = 6;

fn invalid(message: &str) -> AuthError {
    AuthError::InvalidInput(message.to_string())
}

fn looks_like_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty() && !domain.contains('@'),
        None => false,
    }
}

pub fn validate_login(email: &str, password: &str) -> Result<(), AuthError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(invalid("Please enter both email and password"));
    }
    Ok(())
}

pub fn validate_registration(email: &str, password: &str, display_name: &str) -> Result<(), AuthError> {
    if display_name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(invalid("Please fill in all fields"));
    }
    if !looks_like_email(email) {
        return Err(invalid("Please enter a valid email address"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(invalid("Password must be at least 6 characters"));
    }
    Ok(())
}

/// Full registration form check, including the confirm-password field
pub fn validate_registration_form(
    display_name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), AuthError> {
    if confirm_password.is_empty() {
        return Err(invalid("Please fill in all fields"));
    }
    validate_registration(email, password, display_name)?;
    if password != confirm_password {
        return Err(invalid("Passwords do not match"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(result: Result<(), AuthError>) -> String {
        result.expect_err("expected validation failure").message().to_string()
    }

    #[test]
    fn test_validate_login() {
        assert!(validate_login("farmer@example.com", "password123").is_ok());
        assert_eq!(message(validate_login("", "pw")), "Please enter both email and password");
        assert_eq!(message(validate_login("   ", "pw")), "Please enter both email and password");
        assert_eq!(message(validate_login("a@b.com", "")), "Please enter both email and password");
    }

    #[test]
    fn test_validate_registration_form_order() {
        assert_eq!(message(validate_registration_form("", "a@b.com", "secret1", "secret1")), "Please fill in all fields");
        assert_eq!(message(validate_registration_form("Ada", "a@b.com", "secret1", "")), "Please fill in all fields");
        assert_eq!(
            message(validate_registration_form("Ada", "not-an-email", "secret1", "secret1")),
            "Please enter a valid email address"
        );
        assert_eq!(
            message(validate_registration_form("Ada", "a@b.com", "abc", "abc")),
            "Password must be at least 6 characters"
        );
        assert_eq!(
            message(validate_registration_form("Ada", "a@b.com", "secret1", "secret2")),
            "Passwords do not match"
        );
        assert!(validate_registration_form("Ada", "a@b.com", "secret1", "secret1").is_ok());
    }

    #[test]
    fn test_password_length_counts_chars() {
        // Counted in chars, not bytes
        assert!(validate_registration("a@b.com", "ññññññ", "Ada").is_ok());
        assert!(validate_registration("a@b.com", "ñññ", "Ada").is_err());
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("a@b.com"));
        assert!(!looks_like_email("@b.com"));
        assert!(!looks_like_email("a@"));
        assert!(!looks_like_email("a@b@c"));
    }
}
