//! Phase prerequisites, required outputs and the transition planner.
//!
//! Rules are data. Conditions that can be decided from the workflow record
//! and the submitted outputs are decided here; conditions that need the
//! outside world become [`PendingEvidence`] for a service to resolve through
//! an evidence port.

use super::{
    Phase, PhaseOutputs, PhaseRuleError, PhaseTransition, SkipJustification, WorkflowState,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Shape an output value must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// A string that is not blank.
    NonEmptyText,
    /// The boolean `true`.
    True,
}

impl OutputShape {
    fn accepts(self, value: Option<&Value>) -> Result<(), &'static str> {
        match (self, value) {
            (_, None) => Err("missing"),
            (Self::NonEmptyText, Some(Value::String(text))) if !text.trim().is_empty() => Ok(()),
            (Self::NonEmptyText, Some(_)) => Err("expected a non-empty string"),
            (Self::True, Some(Value::Bool(true))) => Ok(()),
            (Self::True, Some(_)) => Err("expected true"),
        }
    }
}

/// Kind of external evidence a rule asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    /// The artifact at the subject path exists.
    ArtifactExists,
    /// The subject branch carries commits beyond its base.
    BranchHasCommits,
    /// The work item's test suite passed.
    TestsPassed,
    /// The work item's linters passed.
    LintPassed,
    /// The subject reference (for example a pull request) exists.
    PublishedRefExists,
}

impl EvidenceKind {
    /// Returns the short name used in requirement names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ArtifactExists => "exists",
            Self::BranchHasCommits => "has_commits",
            Self::TestsPassed => "tests_passed",
            Self::LintPassed => "lint_passed",
            Self::PublishedRefExists => "published",
        }
    }
}

impl fmt::Display for EvidenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an evidence requirement takes its subject from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    /// The work item itself; the query carries no subject.
    WorkItem,
    /// An output submitted with the current completion.
    Submitted(&'static str),
    /// An output recorded by an earlier phase.
    Recorded(Phase, &'static str),
}

/// A single condition on a phase start or completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// The given phase has been completed or skipped.
    Settled(Phase),
    /// An earlier phase recorded an output of the given shape.
    Recorded {
        /// Phase that recorded the output.
        phase: Phase,
        /// Output key.
        key: &'static str,
        /// Required shape.
        shape: OutputShape,
    },
    /// The submitted outputs contain a value of the given shape.
    Output {
        /// Output key.
        key: &'static str,
        /// Required shape.
        shape: OutputShape,
    },
    /// External evidence must confirm the condition.
    Evidence {
        /// Kind of evidence.
        kind: EvidenceKind,
        /// Where the evidence subject comes from.
        subject: Subject,
    },
}

impl Requirement {
    /// Returns the dotted name reported when the requirement is unmet.
    #[must_use]
    pub fn name(&self, phase: Phase) -> String {
        match self {
            Self::Settled(settled) => format!("{settled}.settled"),
            Self::Recorded {
                phase: source, key, ..
            } => format!("{source}.{key}"),
            Self::Output { key, .. } => format!("{phase}.{key}"),
            Self::Evidence { kind, subject } => match subject {
                Subject::WorkItem => format!("{phase}.{kind}"),
                Subject::Submitted(key) => format!("{phase}.{key}.{kind}"),
                Subject::Recorded(source, key) => format!("{source}.{key}.{kind}"),
            },
        }
    }

    fn check(&self, state: &WorkflowState, submitted: Option<&PhaseOutputs>) -> Check {
        match self {
            Self::Settled(phase) => {
                if state.is_settled(*phase) {
                    Check::Satisfied
                } else {
                    Check::Unmet(format!("{phase} is neither completed nor skipped"))
                }
            }
            Self::Recorded { phase, key, shape } => {
                match shape.accepts(state.recorded_output(*phase, key)) {
                    Ok(()) => Check::Satisfied,
                    Err(reason) => Check::Unmet(format!("{phase} output '{key}': {reason}")),
                }
            }
            Self::Output { key, shape } => {
                match shape.accepts(submitted.and_then(|outputs| outputs.get(key))) {
                    Ok(()) => Check::Satisfied,
                    Err(reason) => Check::Unmet(reason.to_owned()),
                }
            }
            Self::Evidence { kind, subject } => {
                let resolved = match subject {
                    Subject::WorkItem => Ok(None),
                    Subject::Submitted(key) => submitted
                        .and_then(|outputs| outputs.text(key))
                        .map(|text| Some(text.to_owned()))
                        .ok_or_else(|| format!("no '{key}' to check")),
                    Subject::Recorded(phase, key) => state
                        .recorded_output(*phase, key)
                        .and_then(Value::as_str)
                        .map(|text| Some(text.trim().to_owned()))
                        .ok_or_else(|| format!("{phase} recorded no '{key}' to check")),
                };
                match resolved {
                    Ok(subject) => Check::Evidence(EvidenceQuery {
                        kind: *kind,
                        subject,
                    }),
                    Err(reason) => Check::Unmet(reason),
                }
            }
        }
    }
}

enum Check {
    Satisfied,
    Unmet(String),
    Evidence(EvidenceQuery),
}

/// Question put to an evidence provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EvidenceQuery {
    /// Kind of evidence requested.
    pub kind: EvidenceKind,
    /// Subject of the query, such as an artifact path or branch name.
    pub subject: Option<String>,
}

impl EvidenceQuery {
    /// Creates a query without a subject.
    #[must_use]
    pub const fn new(kind: EvidenceKind) -> Self {
        Self {
            kind,
            subject: None,
        }
    }

    /// Creates a query about a specific subject.
    #[must_use]
    pub fn about(kind: EvidenceKind, subject: impl Into<String>) -> Self {
        Self {
            kind,
            subject: Some(subject.into()),
        }
    }
}

impl fmt::Display for EvidenceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.subject {
            Some(subject) => write!(f, "{}({subject})", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// Evidence that must be confirmed before a plan may be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEvidence {
    /// Requirement name reported if the evidence is refused.
    pub name: String,
    /// Query to resolve.
    pub query: EvidenceQuery,
}

/// Outcome of planning a phase start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPlan {
    /// The phase is already in progress; nothing to do.
    AlreadyActive,
    /// The phase may start once the pending evidence is confirmed.
    Begin {
        /// Evidence still to confirm.
        evidence: Vec<PendingEvidence>,
    },
}

/// Outcome of planning a completion or skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionPlan {
    /// The identical transition was already recorded; nothing to do.
    AlreadyApplied,
    /// The transition may be recorded once the pending evidence is confirmed.
    Apply {
        /// Evidence still to confirm.
        evidence: Vec<PendingEvidence>,
    },
}

const fn text_output(key: &'static str) -> Requirement {
    Requirement::Output {
        key,
        shape: OutputShape::NonEmptyText,
    }
}

const fn recorded_text(phase: Phase, key: &'static str) -> Requirement {
    Requirement::Recorded {
        phase,
        key,
        shape: OutputShape::NonEmptyText,
    }
}

const INVESTIGATION_PREREQUISITES: &[Requirement] = &[];
const INVESTIGATION_OUTPUTS: &[Requirement] = &[text_output("findings")];

const PLANNING_PREREQUISITES: &[Requirement] = &[Requirement::Settled(Phase::Investigation)];
const PLANNING_OUTPUTS: &[Requirement] = &[
    text_output("task_breakdown"),
    text_output("execution_plan"),
    Requirement::Evidence {
        kind: EvidenceKind::ArtifactExists,
        subject: Subject::Submitted("task_breakdown"),
    },
    Requirement::Evidence {
        kind: EvidenceKind::ArtifactExists,
        subject: Subject::Submitted("execution_plan"),
    },
];

const IMPLEMENTATION_PREREQUISITES: &[Requirement] = &[
    Requirement::Settled(Phase::Planning),
    recorded_text(Phase::Planning, "task_breakdown"),
];
const IMPLEMENTATION_OUTPUTS: &[Requirement] = &[
    text_output("branch"),
    Requirement::Evidence {
        kind: EvidenceKind::BranchHasCommits,
        subject: Subject::Submitted("branch"),
    },
];

const VALIDATION_PREREQUISITES: &[Requirement] = &[
    Requirement::Settled(Phase::Implementation),
    recorded_text(Phase::Implementation, "branch"),
];
const VALIDATION_OUTPUTS: &[Requirement] = &[
    Requirement::Output {
        key: "tests_passed",
        shape: OutputShape::True,
    },
    Requirement::Output {
        key: "lint_passed",
        shape: OutputShape::True,
    },
    Requirement::Evidence {
        kind: EvidenceKind::TestsPassed,
        subject: Subject::WorkItem,
    },
    Requirement::Evidence {
        kind: EvidenceKind::LintPassed,
        subject: Subject::WorkItem,
    },
];

const PUBLICATION_PREREQUISITES: &[Requirement] = &[
    Requirement::Settled(Phase::Validation),
    Requirement::Recorded {
        phase: Phase::Validation,
        key: "tests_passed",
        shape: OutputShape::True,
    },
];
const PUBLICATION_OUTPUTS: &[Requirement] = &[
    text_output("published_ref"),
    Requirement::Evidence {
        kind: EvidenceKind::PublishedRefExists,
        subject: Subject::Submitted("published_ref"),
    },
];

const MONITORING_PREREQUISITES: &[Requirement] = &[
    Requirement::Settled(Phase::Publication),
    recorded_text(Phase::Publication, "published_ref"),
];
const MONITORING_OUTPUTS: &[Requirement] = &[text_output("status")];

/// Ordered phase set with per-phase prerequisite and output rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhaseStateMachine;

impl PhaseStateMachine {
    /// Creates the state machine.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Returns the conditions that must hold before `phase` may start.
    #[must_use]
    pub const fn prerequisites(&self, phase: Phase) -> &'static [Requirement] {
        match phase {
            Phase::Investigation => INVESTIGATION_PREREQUISITES,
            Phase::Planning => PLANNING_PREREQUISITES,
            Phase::Implementation => IMPLEMENTATION_PREREQUISITES,
            Phase::Validation => VALIDATION_PREREQUISITES,
            Phase::Publication => PUBLICATION_PREREQUISITES,
            Phase::Monitoring => MONITORING_PREREQUISITES,
        }
    }

    /// Returns the conditions the outputs of `phase` must satisfy.
    #[must_use]
    pub const fn outputs(&self, phase: Phase) -> &'static [Requirement] {
        match phase {
            Phase::Investigation => INVESTIGATION_OUTPUTS,
            Phase::Planning => PLANNING_OUTPUTS,
            Phase::Implementation => IMPLEMENTATION_OUTPUTS,
            Phase::Validation => VALIDATION_OUTPUTS,
            Phase::Publication => PUBLICATION_OUTPUTS,
            Phase::Monitoring => MONITORING_OUTPUTS,
        }
    }

    /// Plans starting `phase`.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseRuleError::PhaseAlreadySettled`] for a phase that is
    /// behind the current one, or [`PhaseRuleError::Prerequisite`] when the
    /// phase is ahead of the current one or a prerequisite fails.
    pub fn plan_start(
        &self,
        state: &WorkflowState,
        phase: Phase,
    ) -> Result<StartPlan, PhaseRuleError> {
        self.ensure_reachable(state, phase)?;

        if state.active().is_some_and(|active| active.phase == phase) {
            return Ok(StartPlan::AlreadyActive);
        }

        let evidence = self
            .evaluate(state, phase, self.prerequisites(phase), None)
            .map_err(|(condition, _)| PhaseRuleError::Prerequisite {
                work_item_id: state.work_item_id().clone(),
                phase,
                condition,
            })?;
        Ok(StartPlan::Begin { evidence })
    }

    /// Plans settling `phase` through `transition`.
    ///
    /// Completion and skipping are validated here and nowhere else.
    ///
    /// # Errors
    ///
    /// Returns the [`PhaseRuleError`] naming the first violated rule.
    pub fn plan_transition(
        &self,
        state: &WorkflowState,
        phase: Phase,
        transition: &PhaseTransition,
    ) -> Result<TransitionPlan, PhaseRuleError> {
        match transition {
            PhaseTransition::Completed(outputs) => self.plan_completion(state, phase, outputs),
            PhaseTransition::Skipped(justification) => {
                Self::plan_skip(state, phase, justification)
            }
        }
    }

    fn plan_completion(
        &self,
        state: &WorkflowState,
        phase: Phase,
        outputs: &PhaseOutputs,
    ) -> Result<TransitionPlan, PhaseRuleError> {
        let is_active = state.active().is_some_and(|active| active.phase == phase);

        if state.is_settled(phase) && !is_active {
            return match state.latest_record(phase) {
                Some(record) if record.outputs == *outputs => Ok(TransitionPlan::AlreadyApplied),
                _ => Err(PhaseRuleError::PhaseAlreadySettled {
                    work_item_id: state.work_item_id().clone(),
                    phase,
                }),
            };
        }

        self.ensure_reachable(state, phase)?;
        if !is_active {
            return Err(PhaseRuleError::Prerequisite {
                work_item_id: state.work_item_id().clone(),
                phase,
                condition: format!("{phase}.started"),
            });
        }

        let evidence = self
            .evaluate(state, phase, self.outputs(phase), Some(outputs))
            .map_err(|(output, reason)| PhaseRuleError::OutputValidation {
                work_item_id: state.work_item_id().clone(),
                phase,
                output,
                reason,
            })?;
        Ok(TransitionPlan::Apply { evidence })
    }

    fn plan_skip(
        state: &WorkflowState,
        phase: Phase,
        justification: &SkipJustification,
    ) -> Result<TransitionPlan, PhaseRuleError> {
        let refuse = |reason: String| PhaseRuleError::SkipNotAllowed {
            work_item_id: state.work_item_id().clone(),
            phase,
            reason,
        };

        if !phase.is_skippable() {
            return Err(refuse(format!("{phase} is mandatory")));
        }
        if !justification.is_scope_clear() {
            return Err(refuse(format!(
                "scope_clarity must be '{}', got '{}'",
                SkipJustification::CLEAR,
                justification.scope_clarity
            )));
        }
        if state.is_skipped(phase) {
            return Ok(TransitionPlan::AlreadyApplied);
        }
        if state.is_completed(phase) {
            return Err(PhaseRuleError::PhaseAlreadySettled {
                work_item_id: state.work_item_id().clone(),
                phase,
            });
        }
        Ok(TransitionPlan::Apply {
            evidence: Vec::new(),
        })
    }

    /// Rejects phases other than the current one.
    ///
    /// A finished workflow may re-enter the terminal phase.
    fn ensure_reachable(&self, state: &WorkflowState, phase: Phase) -> Result<(), PhaseRuleError> {
        let current = state.current_phase();
        let reentering = phase.is_terminal() && state.is_finished();

        if phase < current || (state.is_settled(phase) && !reentering) {
            return Err(PhaseRuleError::PhaseAlreadySettled {
                work_item_id: state.work_item_id().clone(),
                phase,
            });
        }
        if phase > current {
            return Err(PhaseRuleError::Prerequisite {
                work_item_id: state.work_item_id().clone(),
                phase,
                condition: format!("{current}.settled"),
            });
        }
        Ok(())
    }

    /// Evaluates local requirements and collects evidence queries.
    ///
    /// Returns the failing requirement name and reason on the first unmet
    /// local requirement.
    fn evaluate(
        &self,
        state: &WorkflowState,
        phase: Phase,
        requirements: &[Requirement],
        submitted: Option<&PhaseOutputs>,
    ) -> Result<Vec<PendingEvidence>, (String, String)> {
        let mut evidence = Vec::new();
        for requirement in requirements {
            match requirement.check(state, submitted) {
                Check::Satisfied => {}
                Check::Unmet(reason) => return Err((requirement.name(phase), reason)),
                Check::Evidence(query) => evidence.push(PendingEvidence {
                    name: requirement.name(phase),
                    query,
                }),
            }
        }
        Ok(evidence)
    }
}
