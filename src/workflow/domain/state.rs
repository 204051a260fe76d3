//! Persisted workflow state for a single work item.

use super::{Phase, PhaseOutputs, SkipJustification, WorkItemId, WorkflowDomainError};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Phase that has been started but not yet settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePhase {
    /// Phase in progress.
    pub phase: Phase,
    /// When the phase was started.
    pub started_at: DateTime<Utc>,
}

/// Append-only record of a completed phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    /// Completed phase.
    pub phase: Phase,
    /// When the phase was started.
    pub started_at: DateTime<Utc>,
    /// When the completion was recorded.
    pub completed_at: DateTime<Utc>,
    /// Outputs validated at completion.
    pub outputs: PhaseOutputs,
}

/// Record of a phase that was bypassed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedPhase {
    /// Skipped phase.
    pub phase: Phase,
    /// Justification accepted for the skip.
    pub justification: SkipJustification,
    /// When the skip was recorded.
    pub skipped_at: DateTime<Utc>,
}

/// Workflow progress for one work item.
///
/// `current_phase` is always the earliest phase that is neither completed nor
/// skipped. Once every phase is settled it stays on
/// [`Phase::Monitoring`], which may be re-entered for monitoring updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    work_item_id: WorkItemId,
    current_phase: Phase,
    active: Option<ActivePhase>,
    phase_history: Vec<PhaseRecord>,
    skipped_phases: Vec<SkippedPhase>,
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl WorkflowState {
    /// Creates an unsaved workflow positioned at the first phase.
    #[must_use]
    pub fn new(work_item_id: WorkItemId, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            work_item_id,
            current_phase: Phase::Investigation,
            active: None,
            phase_history: Vec::new(),
            skipped_phases: Vec::new(),
            version: 0,
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    /// Returns the work item identifier.
    #[must_use]
    pub const fn work_item_id(&self) -> &WorkItemId {
        &self.work_item_id
    }

    /// Returns the phase that must be worked on next.
    #[must_use]
    pub const fn current_phase(&self) -> Phase {
        self.current_phase
    }

    /// Returns the phase in progress, if one has been started.
    #[must_use]
    pub const fn active(&self) -> Option<&ActivePhase> {
        self.active.as_ref()
    }

    /// Returns completed phases in completion order.
    #[must_use]
    pub fn phase_history(&self) -> &[PhaseRecord] {
        &self.phase_history
    }

    /// Returns skipped phases in skip order.
    #[must_use]
    pub fn skipped_phases(&self) -> &[SkippedPhase] {
        &self.skipped_phases
    }

    /// Returns the persisted version; `0` means the record was never saved.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether `phase` has at least one completion record.
    #[must_use]
    pub fn is_completed(&self, phase: Phase) -> bool {
        self.phase_history.iter().any(|record| record.phase == phase)
    }

    /// Returns whether `phase` was skipped.
    #[must_use]
    pub fn is_skipped(&self, phase: Phase) -> bool {
        self.skipped_phases.iter().any(|skip| skip.phase == phase)
    }

    /// Returns whether `phase` was completed or skipped.
    #[must_use]
    pub fn is_settled(&self, phase: Phase) -> bool {
        self.is_completed(phase) || self.is_skipped(phase)
    }

    /// Returns whether the terminal phase has been completed at least once.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.is_completed(Phase::Monitoring)
    }

    /// Returns the most recent completion record for `phase`.
    #[must_use]
    pub fn latest_record(&self, phase: Phase) -> Option<&PhaseRecord> {
        self.phase_history
            .iter()
            .rev()
            .find(|record| record.phase == phase)
    }

    /// Returns an output recorded by the latest completion of `phase`.
    #[must_use]
    pub fn recorded_output(&self, phase: Phase, key: &str) -> Option<&Value> {
        self.latest_record(phase)
            .and_then(|record| record.outputs.get(key))
    }

    /// Marks `phase` as started.
    pub(crate) fn begin(&mut self, phase: Phase, clock: &impl Clock) {
        let timestamp = clock.utc();
        self.active = Some(ActivePhase {
            phase,
            started_at: timestamp,
        });
        self.updated_at = timestamp;
    }

    /// Appends a completion record and advances the current phase.
    pub(crate) fn record_completion(
        &mut self,
        phase: Phase,
        outputs: PhaseOutputs,
        clock: &impl Clock,
    ) {
        let timestamp = clock.utc();
        let started_at = self
            .active
            .take()
            .filter(|active| active.phase == phase)
            .map_or(timestamp, |active| active.started_at);
        self.phase_history.push(PhaseRecord {
            phase,
            started_at,
            completed_at: timestamp,
            outputs,
        });
        self.current_phase = self.derive_current_phase();
        self.updated_at = timestamp;
    }

    /// Records a skip and advances the current phase.
    pub(crate) fn record_skip(
        &mut self,
        phase: Phase,
        justification: SkipJustification,
        clock: &impl Clock,
    ) {
        let timestamp = clock.utc();
        if self.active.as_ref().is_some_and(|active| active.phase == phase) {
            self.active = None;
        }
        self.skipped_phases.push(SkippedPhase {
            phase,
            justification,
            skipped_at: timestamp,
        });
        self.current_phase = self.derive_current_phase();
        self.updated_at = timestamp;
    }

    /// Returns a copy stamped with the version assigned by a store.
    #[must_use]
    pub(crate) fn with_version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    fn derive_current_phase(&self) -> Phase {
        Phase::ALL
            .into_iter()
            .find(|phase| !self.is_settled(*phase))
            .unwrap_or(Phase::Monitoring)
    }

    /// Checks the phase invariants of a reconstructed record.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowDomainError::Inconsistent`] naming the first broken
    /// invariant.
    pub fn validate(&self) -> Result<(), WorkflowDomainError> {
        let inconsistent = |reason: String| WorkflowDomainError::Inconsistent {
            work_item_id: self.work_item_id.clone(),
            reason,
        };

        if let Some(skip) = self
            .skipped_phases
            .iter()
            .find(|skip| !skip.phase.is_skippable() || !skip.justification.is_scope_clear())
        {
            return Err(inconsistent(format!("{} cannot be skipped", skip.phase)));
        }

        if let Some(phase) = Phase::ALL
            .into_iter()
            .find(|phase| self.is_completed(*phase) && self.is_skipped(*phase))
        {
            return Err(inconsistent(format!("{phase} is both completed and skipped")));
        }

        let mut previous: Option<Phase> = None;
        for record in &self.phase_history {
            let repeats = previous == Some(record.phase);
            if previous.is_some_and(|prior| prior > record.phase)
                || (repeats && !record.phase.is_terminal())
            {
                return Err(inconsistent(format!(
                    "{} recorded out of order",
                    record.phase
                )));
            }
            previous = Some(record.phase);
        }

        for phase in Phase::ALL.into_iter().filter(|phase| self.is_settled(*phase)) {
            if let Some(gap) = Phase::ALL
                .into_iter()
                .take_while(|earlier| *earlier < phase)
                .find(|earlier| !self.is_settled(*earlier))
            {
                return Err(inconsistent(format!(
                    "{phase} is settled but {gap} is not"
                )));
            }
        }

        let derived = self.derive_current_phase();
        if self.current_phase != derived {
            return Err(inconsistent(format!(
                "current phase is {} but should be {derived}",
                self.current_phase
            )));
        }

        if let Some(active) = &self.active
            && active.phase != self.current_phase
        {
            return Err(inconsistent(format!(
                "{} is active while {} is current",
                active.phase, self.current_phase
            )));
        }

        Ok(())
    }
}
