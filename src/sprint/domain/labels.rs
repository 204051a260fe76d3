//! Sprint-owned labels and the batched diff applied to each issue.
//!
//! The sprint only ever touches labels in its own vocabulary. Anything else
//! on an issue (triage labels, team labels and so on) is invisible to the
//! diff and therefore never removed.

use super::{PhaseStatus, SprintPhase, SprintTask, TaskModel};
use std::collections::BTreeSet;

/// How labels are derived from a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelPolicy {
    phase_prefix: String,
    blocked_label: String,
    default_labels: BTreeSet<String>,
}

impl LabelPolicy {
    /// Creates a policy with the given phase label prefix and blocked label.
    #[must_use]
    pub fn new(phase_prefix: impl Into<String>, blocked_label: impl Into<String>) -> Self {
        Self {
            phase_prefix: phase_prefix.into(),
            blocked_label: blocked_label.into().trim().to_owned(),
            default_labels: BTreeSet::new(),
        }
    }

    /// Sets labels applied to every task of every sprint.
    #[must_use]
    pub fn with_default_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_labels = labels
            .into_iter()
            .map(Into::<String>::into)
            .map(|label| label.trim().to_owned())
            .filter(|label| !label.is_empty())
            .collect();
        self
    }

    /// Returns the label naming a phase, such as `phase:Infra`.
    #[must_use]
    pub fn phase_label(&self, phase: &SprintPhase) -> String {
        format!("{}{}", self.phase_prefix, phase.name())
    }

    /// Returns the full label set a task's issue should carry.
    ///
    /// Task labels, the phase label, the blocked label for blocked phases,
    /// the sprint's own labels and the default labels.
    #[must_use]
    pub fn desired_labels(
        &self,
        model: &TaskModel,
        phase: &SprintPhase,
        task: &SprintTask,
    ) -> BTreeSet<String> {
        let mut labels = task.labels().clone();
        labels.insert(self.phase_label(phase));
        if phase.status() == PhaseStatus::Blocked && !self.blocked_label.is_empty() {
            labels.insert(self.blocked_label.clone());
        }
        labels.extend(model.labels().iter().cloned());
        labels.extend(self.default_labels.iter().cloned());
        labels
    }

    /// Builds the vocabulary of labels the sprint controls.
    ///
    /// `previously_managed` carries the vocabulary of earlier passes so that a
    /// label dropped from the plan, such as the label of a renamed phase, is
    /// still recognised and removed.
    #[must_use]
    pub fn vocabulary(
        &self,
        model: &TaskModel,
        previously_managed: &BTreeSet<String>,
    ) -> LabelVocabulary {
        let mut labels: BTreeSet<String> = model.labels().clone();
        labels.extend(self.default_labels.iter().cloned());
        if !self.blocked_label.is_empty() {
            labels.insert(self.blocked_label.clone());
        }
        for phase in model.phases() {
            labels.insert(self.phase_label(phase));
            for task in phase.tasks() {
                labels.extend(task.labels().iter().cloned());
            }
        }
        let carried = previously_managed.difference(&labels).cloned().collect();

        LabelVocabulary { labels, carried }
    }
}

impl Default for LabelPolicy {
    fn default() -> Self {
        Self::new("phase:", "blocked")
    }
}

/// Labels under sprint control.
///
/// Ownership is explicit: a label is owned when the current plan produces it
/// or an earlier pass managed it. Naming conventions such as the phase prefix
/// confer no ownership.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelVocabulary {
    labels: BTreeSet<String>,
    carried: BTreeSet<String>,
}

impl LabelVocabulary {
    /// Returns whether the sprint owns `label`.
    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label) || self.carried.contains(label)
    }

    /// Returns the labels the current plan produces.
    #[must_use]
    pub const fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// Returns labels managed by earlier passes that the plan no longer
    /// produces.
    #[must_use]
    pub const fn carried(&self) -> &BTreeSet<String> {
        &self.carried
    }

    /// Returns the vocabulary to record for the next pass.
    ///
    /// Carried labels are released once `settled`, meaning every linked issue
    /// was read and had its stale labels removed. Until then they stay owned
    /// so a later pass can finish the cleanup.
    #[must_use]
    pub fn remembered(&self, settled: bool) -> BTreeSet<String> {
        if settled {
            self.labels.clone()
        } else {
            self.labels.union(&self.carried).cloned().collect()
        }
    }
}

/// Labels to add and remove on one issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelDiff {
    /// Desired labels the issue lacks.
    pub to_add: BTreeSet<String>,
    /// Sprint-owned labels the issue carries but should not.
    pub to_remove: BTreeSet<String>,
}

impl LabelDiff {
    /// Computes the diff between the desired and current labels.
    ///
    /// Only labels in `vocabulary` are eligible for removal.
    #[must_use]
    pub fn compute(
        desired: &BTreeSet<String>,
        current: &BTreeSet<String>,
        vocabulary: &LabelVocabulary,
    ) -> Self {
        let to_add = desired.difference(current).cloned().collect();
        let to_remove = current
            .iter()
            .filter(|label| vocabulary.contains(label) && !desired.contains(*label))
            .cloned()
            .collect();
        Self { to_add, to_remove }
    }

    /// Returns whether the issue already carries the right labels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}
