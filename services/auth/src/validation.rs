//! Input validation utilities

use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

/// Characters accepted as the required special character
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Minimum password length, counted in characters
pub const MIN_PASSWORD_LENGTH: usize = 8;

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
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Individual password rule outcomes
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PasswordChecks {
    pub min_length: bool,
    pub has_uppercase: bool,
    pub has_special_char: bool,
}

/// Password validation result with one message per failed rule
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PasswordValidation {
    pub is_valid: bool,
    pub checks: PasswordChecks,
    pub errors: Vec<String>,
}

/// Length in UTF-16 code units, the way browsers count it
fn password_length(password: &str) -> usize {
    password.encode_utf16().count()
}

/// Validate password
pub fn validate_password(password: &str) -> PasswordValidation {
    let checks = PasswordChecks {
        min_length: password_length(password) >= MIN_PASSWORD_LENGTH,
        has_uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
        has_special_char: password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
    };

    let mut errors = Vec::new();
    if !checks.min_length {
        errors.push(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !checks.has_uppercase {
        errors.push("Password must contain at least one uppercase letter".to_string());
    }
    if !checks.has_special_char {
        errors.push("Password must contain at least one special character".to_string());
    }

    PasswordValidation {
        is_valid: errors.is_empty(),
        checks,
        errors,
    }
}

/// Coarse strength rating shown next to the password field
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

/// Rate a password; one point per satisfied criterion
pub fn password_strength(password: &str) -> PasswordStrength {
    let length = password_length(password);
    let criteria = [
        length >= 8,
        length >= 12,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
    ];
    let score = criteria.iter().filter(|met| **met).count();

    match score {
        0..=2 => PasswordStrength::Weak,
        3..=4 => PasswordStrength::Medium,
        _ => PasswordStrength::Strong,
    }
}
