//! Field Errors - Field-scoped validation messages
//!
//! A [`FieldErrors`] list keeps messages in the order they were added, which
//! is the order the rule set declared the fields. Responses render them in
//! that order so clients see a stable field sequence.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;

/// One message attached to one input field
///
/// `message` is a translation key (`validation.unique`, `auth.throttle`);
/// `params` are the placeholders the translator substitutes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: Cow<'static, str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }
}

/// Ordered collection of [`FieldError`]s
///
/// ## Examples
/// ```rust
/// use kernel::error::field::FieldErrors;
///
/// let errors = FieldErrors::for_fields(["email", "name"], "validation.unique");
/// assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["email", "name"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// A single message for a single field
    pub fn single(field: impl Into<String>, message: impl Into<Cow<'static, str>>) -> Self {
        Self(vec![FieldError::new(field, message)])
    }

    /// The same message for every listed field, in iteration order
    pub fn for_fields<I, S>(fields: I, message: impl Into<Cow<'static, str>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let message = message.into();
        Self(
            fields
                .into_iter()
                .map(|field| FieldError::new(field, message.clone()))
                .collect(),
        )
    }

    pub fn push(&mut self, error: FieldError) {
        self.0.push(error);
    }

    /// Append a message, builder style
    pub fn with(mut self, field: impl Into<String>, message: impl Into<Cow<'static, str>>) -> Self {
        self.0.push(FieldError::new(field, message));
        self
    }

    /// Attach a placeholder to every message in the list
    pub fn with_param(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        for error in &mut self.0 {
            error.params.insert(key.to_string(), value.clone());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Field names in insertion order (duplicates kept)
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.field.as_str())
    }

    /// Messages recorded for one field
    pub fn messages_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |e| e.field == field)
            .map(|e| e.message.as_ref())
    }

    pub fn contains(&self, field: &str, message: &str) -> bool {
        self.messages_for(field).any(|m| m == message)
    }
}

impl IntoIterator for FieldErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<FieldError> for FieldErrors {
    fn from_iter<T: IntoIterator<Item = FieldError>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
