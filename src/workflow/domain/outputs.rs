//! Evidence submitted when a phase is completed or skipped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Named outputs reported by a completed phase.
///
/// Values are free-form JSON so callers can record paths, flags, counts and
/// references without the core owning their format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseOutputs(BTreeMap<String, Value>);

impl PhaseOutputs {
    /// Creates an empty output set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an output value.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Returns the raw value recorded under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns the trimmed string under `key` when it is present and
    /// non-empty.
    #[must_use]
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }

    /// Returns the boolean under `key`.
    #[must_use]
    pub fn flag(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    /// Returns whether no outputs were reported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over outputs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for PhaseOutputs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// Justification recorded when a phase is bypassed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipJustification {
    /// Caller's assessment of how well the scope is understood.
    ///
    /// Only the exact value `clear` permits skipping investigation.
    pub scope_clarity: String,
    /// Free-form explanation kept for the audit trail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl SkipJustification {
    /// Scope clarity value that permits skipping investigation.
    pub const CLEAR: &'static str = "clear";

    /// Creates a justification with the given scope clarity.
    #[must_use]
    pub fn new(scope_clarity: impl Into<String>) -> Self {
        Self {
            scope_clarity: scope_clarity.into(),
            reason: None,
        }
    }

    /// Sets the free-form explanation.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        let value = reason.into();
        let normalized = value.trim();
        self.reason = (!normalized.is_empty()).then(|| normalized.to_owned());
        self
    }

    /// Returns whether the scope was declared clear.
    #[must_use]
    pub fn is_scope_clear(&self) -> bool {
        self.scope_clarity == Self::CLEAR
    }
}
