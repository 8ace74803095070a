use std::sync::LazyLock;

use folio_models::contact::{FieldErrorKind, FormField, FormInput, ValidationResult};
use regex::Regex;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").unwrap());

/// Checks every field of the contact form independently and reports all
/// invalid fields at once.
pub fn validate(input: &FormInput) -> ValidationResult {
    let mut result = ValidationResult::default();

    if is_blank(&input.name) {
        result.insert(FormField::Name, FieldErrorKind::Required);
    }

    if !EMAIL_REGEX.is_match(input.email.trim()) {
        result.insert(FormField::Email, FieldErrorKind::InvalidFormat);
    }

    if is_blank(&input.message) {
        result.insert(FormField::Message, FieldErrorKind::Required);
    }

    result
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
