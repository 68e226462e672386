//! Input checks applied before any mutating command runs.

use crate::error::ValidationError;

/// Default advisory minimum password length.
pub const DEFAULT_MIN_PASSWORD_LEN: usize = 8;

/// Check a login or group name: an ASCII letter, then letters, digits, `_` or `-`.
///
/// `what` names the field in the resulting error ("username", "group name").
/// An empty name is just another malformed one.
pub fn validate_name(what: &'static str, name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    if first_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        Ok(())
    } else {
        Err(ValidationError::InvalidFormat { what, value: name.to_string() })
    }
}

/// Free-text fields end up in a colon-separated database line.
pub fn validate_comment(what: &'static str, text: &str) -> Result<(), ValidationError> {
    match text.chars().find(|c| *c == ':' || c.is_control()) {
        Some(ch) => Err(ValidationError::ForbiddenChar { what, ch }),
        None => Ok(()),
    }
}

/// Passwords shorter than `min_len` characters need explicit confirmation.
pub fn is_weak_password(password: &str, min_len: usize) -> bool {
    password.chars().count() < min_len
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_letter_then_word_chars() {
        for ok in ["a", "alice", "Bob_2", "svc-backup", "x-_9"] {
            assert!(validate_name("username", ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn rejects_bad_leading_char_and_symbols() {
        assert_eq!(
            validate_name("username", ""),
            Err(ValidationError::InvalidFormat { what: "username", value: String::new() })
        );
        for bad in ["1alice", "_alice", "-alice", "al ice", "al.ice", "alice$", "éric", "a:b"] {
            assert!(
                matches!(
                    validate_name("username", bad),
                    Err(ValidationError::InvalidFormat { .. })
                ),
                "{bad}"
            );
        }
    }

    #[test]
    fn comment_rejects_field_separator() {
        assert!(validate_comment("full name", "Alice A, Room 4").is_ok());
        assert!(validate_comment("full name", "").is_ok());
        assert_eq!(
            validate_comment("full name", "Alice:A"),
            Err(ValidationError::ForbiddenChar { what: "full name", ch: ':' })
        );
    }

    #[test]
    fn weak_password_counts_chars() {
        assert!(is_weak_password("short", DEFAULT_MIN_PASSWORD_LEN));
        assert!(is_weak_password("1234567", DEFAULT_MIN_PASSWORD_LEN));
        assert!(!is_weak_password("12345678", DEFAULT_MIN_PASSWORD_LEN));
        // multibyte characters count once
        assert!(is_weak_password("ééééééé", DEFAULT_MIN_PASSWORD_LEN));
    }
}
