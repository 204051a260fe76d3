//! Enforcement of the phase sequence for work items.

use crate::workflow::{
    domain::{
        PendingEvidence, Phase, PhaseOutputs, PhaseRuleError, PhaseStateMachine, PhaseTransition,
        SkipJustification, StartPlan, TransitionPlan, WorkItemId, WorkflowState,
    },
    ports::{EvidenceError, EvidenceProvider, WorkflowStateStore, WorkflowStoreError},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Service-level errors for workflow enforcement.
#[derive(Debug, Clone, Error)]
pub enum WorkflowEnforcerError {
    /// A phase rule rejected the request.
    #[error(transparent)]
    Rule(#[from] PhaseRuleError),
    /// The state store failed or detected a conflicting write.
    #[error(transparent)]
    Store(#[from] WorkflowStoreError),
    /// An evidence collaborator failed.
    #[error(transparent)]
    Evidence(#[from] EvidenceError),
}

impl WorkflowEnforcerError {
    /// Returns whether reloading and retrying the operation may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Store(err) => err.is_transient(),
            Self::Rule(_) | Self::Evidence(_) => false,
        }
    }

    /// Returns the rule violation, if this error is one.
    #[must_use]
    pub const fn as_rule(&self) -> Option<&PhaseRuleError> {
        match self {
            Self::Rule(err) => Some(err),
            Self::Store(_) | Self::Evidence(_) => None,
        }
    }
}

/// Result type for workflow enforcement operations.
pub type WorkflowEnforcerResult<T> = Result<T, WorkflowEnforcerError>;

/// Gatekeeper for phase starts, completions and skips.
///
/// Every request is validated against the phase rules and the evidence
/// provider before anything is written. A rejected request leaves the stored
/// state untouched; an accepted one is persisted with a single
/// compare-and-swap write.
#[derive(Clone)]
pub struct WorkflowEnforcer<S, E, C>
where
    S: WorkflowStateStore,
    E: EvidenceProvider,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    evidence: Arc<E>,
    clock: Arc<C>,
    machine: PhaseStateMachine,
}

impl<S, E, C> WorkflowEnforcer<S, E, C>
where
    S: WorkflowStateStore,
    E: EvidenceProvider,
    C: Clock + Send + Sync,
{
    /// Creates a new enforcer.
    #[must_use]
    pub const fn new(store: Arc<S>, evidence: Arc<E>, clock: Arc<C>) -> Self {
        Self {
            store,
            evidence,
            clock,
            machine: PhaseStateMachine::new(),
        }
    }

    /// Returns the phase rules this enforcer applies.
    #[must_use]
    pub const fn rules(&self) -> &PhaseStateMachine {
        &self.machine
    }

    /// Starts `phase` for a work item, creating its workflow on first use.
    ///
    /// Starting the phase that is already in progress is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseRuleError::Prerequisite`] naming the unmet condition,
    /// [`PhaseRuleError::PhaseAlreadySettled`] for a phase that is behind the
    /// current one, or a store or evidence error.
    pub async fn start_phase(
        &self,
        work_item_id: &WorkItemId,
        phase: Phase,
    ) -> WorkflowEnforcerResult<WorkflowState> {
        let state = self.load_or_create(work_item_id).await?;

        let evidence = match self.machine.plan_start(&state, phase)? {
            StartPlan::AlreadyActive => {
                tracing::debug!(work_item_id = %work_item_id, %phase, "phase already in progress");
                return Ok(state);
            }
            StartPlan::Begin { evidence } => evidence,
        };

        if let Some(refused) = self.first_refused(work_item_id, evidence).await? {
            return Err(PhaseRuleError::Prerequisite {
                work_item_id: work_item_id.clone(),
                phase,
                condition: refused.name,
            }
            .into());
        }

        let mut next = state;
        next.begin(phase, &*self.clock);
        let saved = self.persist(&next).await?;
        tracing::info!(
            work_item_id = %work_item_id,
            %phase,
            version = saved.version(),
            "phase started"
        );
        Ok(saved)
    }

    /// Completes the in-progress `phase` with the given outputs.
    ///
    /// Resubmitting the outputs of an already completed phase succeeds without
    /// writing.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseRuleError::OutputValidation`] naming the missing or
    /// unconfirmed output, [`PhaseRuleError::Prerequisite`] when the phase
    /// was not started, or a store or evidence error.
    pub async fn complete_phase(
        &self,
        work_item_id: &WorkItemId,
        phase: Phase,
        outputs: PhaseOutputs,
    ) -> WorkflowEnforcerResult<WorkflowState> {
        self.apply_transition(work_item_id, phase, PhaseTransition::Completed(outputs))
            .await
    }

    /// Skips `phase` with a justification.
    ///
    /// Only investigation may be skipped, and only when the scope is clear.
    ///
    /// # Errors
    ///
    /// Returns [`PhaseRuleError::SkipNotAllowed`] when the phase is mandatory
    /// or the justification is insufficient, or a store error.
    pub async fn skip_phase(
        &self,
        work_item_id: &WorkItemId,
        phase: Phase,
        justification: SkipJustification,
    ) -> WorkflowEnforcerResult<WorkflowState> {
        self.apply_transition(work_item_id, phase, PhaseTransition::Skipped(justification))
            .await
    }

    /// Returns the current phase of a work item.
    ///
    /// Unknown work items are reported at the first phase.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowEnforcerError::Store`] when the state cannot be read.
    pub async fn current_phase(&self, work_item_id: &WorkItemId) -> WorkflowEnforcerResult<Phase> {
        Ok(self
            .store
            .load(work_item_id)
            .await?
            .map_or(Phase::Investigation, |state| state.current_phase()))
    }

    /// Returns the stored workflow of a work item, if any.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowEnforcerError::Store`] when the state cannot be read.
    pub async fn state(
        &self,
        work_item_id: &WorkItemId,
    ) -> WorkflowEnforcerResult<Option<WorkflowState>> {
        Ok(self.store.load(work_item_id).await?)
    }

    async fn apply_transition(
        &self,
        work_item_id: &WorkItemId,
        phase: Phase,
        transition: PhaseTransition,
    ) -> WorkflowEnforcerResult<WorkflowState> {
        let state = self.load_or_create(work_item_id).await?;

        let evidence = match self.machine.plan_transition(&state, phase, &transition)? {
            TransitionPlan::AlreadyApplied => {
                tracing::debug!(
                    work_item_id = %work_item_id,
                    %phase,
                    "transition already recorded"
                );
                return Ok(state);
            }
            TransitionPlan::Apply { evidence } => evidence,
        };

        if let Some(refused) = self.first_refused(work_item_id, evidence).await? {
            return Err(PhaseRuleError::OutputValidation {
                work_item_id: work_item_id.clone(),
                phase,
                reason: format!("{} was not confirmed", refused.query),
                output: refused.name,
            }
            .into());
        }

        let mut next = state;
        let skipped = matches!(transition, PhaseTransition::Skipped(_));
        match transition {
            PhaseTransition::Completed(outputs) => {
                next.record_completion(phase, outputs, &*self.clock);
            }
            PhaseTransition::Skipped(justification) => {
                next.record_skip(phase, justification, &*self.clock);
            }
        }

        let saved = self.persist(&next).await?;
        tracing::info!(
            work_item_id = %work_item_id,
            %phase,
            skipped,
            current_phase = %saved.current_phase(),
            version = saved.version(),
            "phase settled"
        );
        Ok(saved)
    }

    async fn load_or_create(
        &self,
        work_item_id: &WorkItemId,
    ) -> WorkflowEnforcerResult<WorkflowState> {
        Ok(self
            .store
            .load(work_item_id)
            .await?
            .unwrap_or_else(|| WorkflowState::new(work_item_id.clone(), &*self.clock)))
    }

    /// Asks the evidence provider about each pending query in order.
    ///
    /// Returns the first query answered negatively.
    async fn first_refused(
        &self,
        work_item_id: &WorkItemId,
        pending: Vec<PendingEvidence>,
    ) -> WorkflowEnforcerResult<Option<PendingEvidence>> {
        for item in pending {
            if !self.evidence.check(work_item_id, &item.query).await? {
                tracing::debug!(
                    work_item_id = %work_item_id,
                    requirement = %item.name,
                    "evidence refused"
                );
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    async fn persist(&self, state: &WorkflowState) -> WorkflowEnforcerResult<WorkflowState> {
        self.store.save(state).await.map_err(|err| {
            if err.is_transient() {
                tracing::warn!(
                    work_item_id = %state.work_item_id(),
                    error = %err,
                    "workflow write conflict"
                );
            }
            err.into()
        })
    }
}
