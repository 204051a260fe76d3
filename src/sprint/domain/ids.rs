//! Identifier types for sprint synchronisation.

use super::SprintDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an issue in the external tracker.
///
/// Stored without the conventional leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackerId(String);

impl TrackerId {
    /// Creates a validated tracker identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SprintDomainError::InvalidTrackerId`] when the value is
    /// blank or contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, SprintDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        let normalized = trimmed.strip_prefix('#').unwrap_or(trimmed);
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(SprintDomainError::InvalidTrackerId(raw));
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for TrackerId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl TryFrom<String> for TrackerId {
    type Error = SprintDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TrackerId> for String {
    fn from(value: TrackerId) -> Self {
        value.0
    }
}

impl fmt::Display for TrackerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Natural key of a task: its phase name and its title.
///
/// Titles are unique within a phase, so the pair identifies a task even
/// before it is linked to an issue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskKey {
    phase: String,
    title: String,
}

impl TaskKey {
    /// Creates a key from a phase name and task title.
    #[must_use]
    pub fn new(phase: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            phase: phase.into(),
            title: title.into(),
        }
    }

    /// Returns the phase name.
    #[must_use]
    pub fn phase(&self) -> &str {
        &self.phase
    }

    /// Returns the task title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.phase, self.title)
    }
}
