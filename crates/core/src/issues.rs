//! Structured validation issues.

use serde::{Deserialize, Serialize};
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

/// A single failed check on an input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted path to the field (`subscription.keys.auth`, `items[2].name`).
    pub path: String,
    /// Rule that failed (`length`, `email`, `invalid_type`, ...).
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(
        path: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    fn from_field(path: &str, err: &ValidationError) -> Self {
        let message = match &err.message {
            Some(msg) => msg.to_string(),
            None => format!("failed `{}` check", err.code),
        };
        Self::new(path, err.code.to_string(), message)
    }
}

/// Ordered list of validation issues for one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationIssues(Vec<ValidationIssue>);

impl ValidationIssues {
    /// Issue for input whose shape could not be decoded at all.
    pub fn invalid_type(message: impl Into<String>) -> Self {
        Self(vec![ValidationIssue::new("", "invalid_type", message)])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.0.iter()
    }
}

impl From<Vec<ValidationIssue>> for ValidationIssues {
    fn from(issues: Vec<ValidationIssue>) -> Self {
        Self(issues)
    }
}

impl From<&ValidationErrors> for ValidationIssues {
    fn from(errors: &ValidationErrors) -> Self {
        let mut out = Vec::new();
        flatten("", errors, &mut out);
        Self(out)
    }
}

impl From<ValidationErrors> for ValidationIssues {
    fn from(errors: ValidationErrors) -> Self {
        Self::from(&errors)
    }
}

impl From<&serde_json::Error> for ValidationIssues {
    fn from(err: &serde_json::Error) -> Self {
        Self::invalid_type(err.to_string())
    }
}

fn join(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

// Field order in `ValidationErrors` is hash order; sort for stable output.
fn flatten(prefix: &str, errors: &ValidationErrors, out: &mut Vec<ValidationIssue>) {
    let mut fields: Vec<_> = errors.errors().iter().collect();
    fields.sort_by_key(|(name, _)| **name);

    for (field, kind) in fields {
        let path = join(prefix, field);
        match kind {
            ValidationErrorsKind::Field(list) => {
                out.extend(list.iter().map(|err| ValidationIssue::from_field(&path, err)));
            }
            ValidationErrorsKind::Struct(inner) => flatten(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (idx, inner) in items {
                    flatten(&format!("{path}[{idx}]"), inner, out);
                }
            }
        }
    }
}
