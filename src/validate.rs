//! Local form validation. These checks run before any network call, so a
//! malformed email or password never reaches the API.

use regex::Regex;

/// Basic email shape check.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").is_ok_and(|re| re.is_match(email))
}

/// Passwords need at least 8 characters with an uppercase letter, a
/// lowercase letter, and a digit.
#[must_use]
pub fn valid_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
}

/// Short name: 2-20 characters of Arabic or Latin letters, Arabic-Indic
/// digits, and spaces.
#[must_use]
pub fn valid_name(name: &str) -> bool {
    Regex::new(r"^[\u{0621}-\u{064A}\u{0660}-\u{0669}a-zA-Z\s]{2,20}$")
        .is_ok_and(|re| re.is_match(name.trim()))
}

/// Egyptian mobile number: 010/011/012/015 followed by 8 digits, ignoring
/// spaces and dashes.
#[must_use]
pub fn valid_phone(phone: &str) -> bool {
    let digits = phone.replace([' ', '-'], "");
    Regex::new(r"^(010|011|012|015)\d{8}$").is_ok_and(|re| re.is_match(&digits))
}

/// Full registration name: 10-100 characters from the allowed alphabet,
/// at least three parts, every part at least two characters.
#[must_use]
pub fn valid_full_name(full_name: &str) -> bool {
    let trimmed = full_name.trim();

    let length = trimmed.chars().count();
    if !(10..=100).contains(&length) {
        return false;
    }

    let allowed = Regex::new(r"^[\u{0621}-\u{064A}\u{0660}-\u{0669}a-zA-Z\s]+$")
        .is_ok_and(|re| re.is_match(trimmed));
    if !allowed {
        return false;
    }

    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    parts.len() >= 3 && parts.iter().all(|part| part.chars().count() >= 2)
}
