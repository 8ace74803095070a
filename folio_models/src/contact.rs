use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// The raw values of the contact form at the time of a submission attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Name,
    Email,
    Message,
}

impl FormField {
    pub const ALL: [Self; 3] = [Self::Name, Self::Email, Self::Message];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Message => "message",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldErrorKind {
    /// The field is empty or only contains whitespace.
    Required,
    /// The field does not have the expected shape.
    InvalidFormat,
}

impl FieldErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::InvalidFormat => "invalid-format",
        }
    }
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub kind: FieldErrorKind,
    /// Message to display next to the field.
    pub message: String,
}

impl FieldError {
    pub fn new(field: FormField, kind: FieldErrorKind) -> Self {
        let message = match (field, kind) {
            (FormField::Name, FieldErrorKind::Required) => "Please tell me your name".into(),
            (FormField::Email, FieldErrorKind::InvalidFormat) => {
                "Please enter a valid email address".into()
            }
            (FormField::Message, FieldErrorKind::Required) => "Your message is empty".into(),
            (field, FieldErrorKind::Required) => format!("The {field} field is required"),
            (field, FieldErrorKind::InvalidFormat) => format!("The {field} field is invalid"),
        };

        Self { kind, message }
    }
}

/// Field-level validation errors of one submission attempt. An empty result
/// means the input is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationResult(BTreeMap<FormField, FieldError>);

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: FormField) -> Option<&FieldError> {
        self.0.get(&field)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn insert(&mut self, field: FormField, kind: FieldErrorKind) {
        self.0.insert(field, FieldError::new(field, kind));
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &FieldError)> {
        self.0.iter().map(|(&field, error)| (field, error))
    }
}

impl FromIterator<(FormField, FieldErrorKind)> for ValidationResult {
    fn from_iter<T: IntoIterator<Item = (FormField, FieldErrorKind)>>(iter: T) -> Self {
        let mut result = Self::default();
        for (field, kind) in iter {
            result.insert(field, kind);
        }
        result
    }
}
