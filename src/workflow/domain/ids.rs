//! Identifier types for the workflow domain.

use super::WorkflowDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the work item a workflow instance is scoped to.
///
/// Work items are usually tracker issue numbers but may be arbitrary slugs.
/// Both forms are normalised to a string over `[A-Za-z0-9._-]` so the
/// identifier can double as a storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkItemId(String);

impl WorkItemId {
    /// Creates a validated work item identifier.
    ///
    /// A single leading `#` is stripped so `#42` and `42` name the same item.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::InvalidWorkItemId`] when the value is
    /// empty or contains characters outside `[A-Za-z0-9._-]`.
    pub fn new(value: impl Into<String>) -> Result<Self, WorkflowDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let normalized = trimmed.strip_prefix('#').unwrap_or(trimmed);
        let is_valid = !normalized.is_empty()
            && !normalized.starts_with('.')
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'));

        if !is_valid {
            return Err(WorkflowDomainError::InvalidWorkItemId(raw));
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for WorkItemId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl TryFrom<String> for WorkItemId {
    type Error = WorkflowDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WorkItemId> for String {
    fn from(value: WorkItemId) -> Self {
        value.0
    }
}

impl AsRef<str> for WorkItemId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for WorkItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
