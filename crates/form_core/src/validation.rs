//! Field validators and the per-field state the controller owns.

use std::sync::LazyLock;

use regex::Regex;
use shared::{
    domain::{FieldId, InvalidReason, ValidationResult},
    error::ValidationError,
};

pub const NAME_MIN_CHARS: usize = 2;
pub const MESSAGE_MIN_CHARS: usize = 10;

// Structural check only: no whitespace or '@' in any segment.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles")
});

pub type Validator = fn(&str) -> ValidationResult;

pub fn validate_name(raw: &str) -> ValidationResult {
    let value = raw.trim();
    if value.is_empty() {
        return ValidationResult::invalid(InvalidReason::Empty, "Please enter your name.");
    }
    if value.chars().count() < NAME_MIN_CHARS {
        return ValidationResult::invalid(
            InvalidReason::TooShort {
                min: NAME_MIN_CHARS,
            },
            "Name must be at least 2 characters.",
        );
    }
    ValidationResult::Valid
}

pub fn validate_email(raw: &str) -> ValidationResult {
    let value = raw.trim();
    if value.is_empty() {
        return ValidationResult::invalid(InvalidReason::Empty, "Please enter your email.");
    }
    if !EMAIL_PATTERN.is_match(value) {
        return ValidationResult::invalid(
            InvalidReason::InvalidFormat,
            "Please enter a valid email address.",
        );
    }
    ValidationResult::Valid
}

pub fn validate_message(raw: &str) -> ValidationResult {
    let value = raw.trim();
    if value.is_empty() {
        return ValidationResult::invalid(InvalidReason::Empty, "Please enter a message.");
    }
    if value.chars().count() < MESSAGE_MIN_CHARS {
        return ValidationResult::invalid(
            InvalidReason::TooShort {
                min: MESSAGE_MIN_CHARS,
            },
            "Message must be at least 10 characters.",
        );
    }
    ValidationResult::Valid
}

pub fn validator_for(field: FieldId) -> Validator {
    match field {
        FieldId::Name => validate_name,
        FieldId::Email => validate_email,
        FieldId::Message => validate_message,
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    identifier: FieldId,
    current_value: String,
    validate: Validator,
    last_result: Option<ValidationResult>,
}

impl FieldSpec {
    pub fn new(identifier: FieldId) -> Self {
        Self::with_validator(identifier, validator_for(identifier))
    }

    pub fn with_validator(identifier: FieldId, validate: Validator) -> Self {
        Self {
            identifier,
            current_value: String::new(),
            validate,
            last_result: None,
        }
    }

    pub fn value(&self) -> &str {
        &self.current_value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.current_value = value.into();
    }

    /// Runs the validator on the current value and records the verdict.
    pub fn revalidate(&mut self) -> &ValidationResult {
        let result = (self.validate)(&self.current_value);
        self.last_result.insert(result)
    }

    /// True while the most recent verdict was invalid.
    pub fn in_error(&self) -> bool {
        matches!(&self.last_result, Some(result) if !result.is_valid())
    }

    pub fn last_result(&self) -> Option<&ValidationResult> {
        self.last_result.as_ref()
    }

    pub fn validation_error(&self) -> Option<ValidationError> {
        self.last_result
            .as_ref()
            .and_then(ValidationResult::reason)
            .map(|reason| ValidationError::new(self.identifier, reason))
    }

    /// Empties the value and forgets the verdict, as a form reset does.
    pub fn reset(&mut self) {
        self.current_value.clear();
        self.last_result = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(result: ValidationResult) -> Option<&'static str> {
        result.reason().map(|r| r.as_str())
    }

    #[test]
    fn whitespace_only_values_are_empty() {
        assert_eq!(reason(validate_name("   ")), Some("empty"));
        assert_eq!(reason(validate_email("\t\n")), Some("empty"));
        assert_eq!(reason(validate_message("")), Some("empty"));
    }

    #[test]
    fn short_values_are_too_short_not_empty() {
        assert_eq!(reason(validate_name("A")), Some("too short"));
        assert_eq!(reason(validate_name("  A  ")), Some("too short"));
        for len in 1..MESSAGE_MIN_CHARS {
            let value = format!("  {}  ", "x".repeat(len));
            assert_eq!(reason(validate_message(&value)), Some("too short"), "{value:?}");
        }
    }

    #[test]
    fn lengths_at_threshold_are_valid() {
        assert!(validate_name("Al").is_valid());
        assert!(validate_message("0123456789").is_valid());
        assert!(validate_message("   0123456789   ").is_valid());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        assert_eq!(reason(validate_name("é")), Some("too short"));
        assert!(validate_name("Zoë").is_valid());
    }

    #[test]
    fn email_accepts_local_at_domain_tld_shapes() {
        for email in [
            "ana@example.com",
            "a@b.c",
            "first.last+tag@sub.example.co.uk",
            "  padded@example.org  ",
            "x@y..z",
        ] {
            assert!(validate_email(email).is_valid(), "{email}");
        }
    }

    #[test]
    fn email_rejects_missing_at_or_dot() {
        for email in [
            "bad",
            "ana.example.com",
            "ana@example",
            "ana@@example.com",
            "@example.com",
            "ana@.com",
            "ana@example.",
            "an a@example.com",
        ] {
            assert_eq!(reason(validate_email(email)), Some("invalid format"), "{email}");
        }
    }

    #[test]
    fn field_spec_tracks_latest_verdict() {
        let mut field = FieldSpec::new(FieldId::Name);
        assert!(!field.in_error());
        assert!(field.last_result().is_none());

        field.set_value("");
        assert!(!field.revalidate().is_valid());
        assert!(field.in_error());
        assert_eq!(
            field.validation_error(),
            Some(ValidationError::new(FieldId::Name, InvalidReason::Empty))
        );

        field.set_value("Ana");
        assert!(field.revalidate().is_valid());
        assert!(!field.in_error());
        assert!(field.validation_error().is_none());

        field.reset();
        assert_eq!(field.value(), "");
        assert!(field.last_result().is_none());
    }
}
