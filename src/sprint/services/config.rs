//! Sync engine configuration.

use crate::sprint::domain::LabelPolicy;
use serde::{Deserialize, Serialize};

/// Template rendering an issue body from its task.
///
/// Available variables: `title`, `description`, `phase`, `sprint` and
/// `dependencies` (a list).
pub const DEFAULT_ISSUE_BODY_TEMPLATE: &str = "{{ description }}\
{% if dependencies %}\n\nDepends on: {{ dependencies | join(', ') }}{% endif %}";

/// Settings shaping how a plan maps onto tracker issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Labels applied to every task in addition to the sprint's own labels.
    pub default_labels: Vec<String>,
    /// Prefix of the label naming a task's phase.
    pub phase_label_prefix: String,
    /// Label added to tasks of blocked phases.
    pub blocked_label: String,
    /// Comment posted when an orphaned issue is closed.
    pub orphan_comment: String,
    /// Whether orphans found already closed still get the comment.
    pub comment_on_closed_orphans: bool,
    /// `minijinja` template for new issue bodies.
    pub issue_body_template: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_labels: Vec::new(),
            phase_label_prefix: "phase:".to_owned(),
            blocked_label: "blocked".to_owned(),
            orphan_comment: "task removed from plan".to_owned(),
            comment_on_closed_orphans: false,
            issue_body_template: DEFAULT_ISSUE_BODY_TEMPLATE.to_owned(),
        }
    }
}

impl SyncConfig {
    /// Reads a configuration from YAML; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the parse error for malformed YAML or mistyped values.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Returns the label policy these settings describe.
    #[must_use]
    pub fn label_policy(&self) -> LabelPolicy {
        LabelPolicy::new(&self.phase_label_prefix, &self.blocked_label)
            .with_default_labels(self.default_labels.iter().cloned())
    }
}
