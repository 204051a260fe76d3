//! Reconciliation of a sprint plan with the issue tracker.

use minijinja::{Environment, context};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::SyncConfig;
use crate::keyed_locks::KeyedLocks;
use crate::sprint::{
    domain::{
        IssueRecord, IssueState, LabelDiff, LabelPolicy, LabelVocabulary, NewIssue,
        SprintDomainError, SprintPhase, SprintTask, SyncAction, SyncLedger, SyncReport, SyncStage,
        SyncSubject, TaskKey, TaskModel, TrackerId,
    },
    ports::{IssueTrackerClient, SyncLedgerError, SyncLedgerStore, TrackerError},
};

const BODY_TEMPLATE: &str = "issue_body";

/// Errors that stop a sync pass before any remote change.
///
/// Failures of individual tracker calls are not errors; they are reported as
/// [`SyncAction::Failed`] entries and the pass carries on.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The plan is malformed.
    #[error(transparent)]
    Structural(#[from] SprintDomainError),
    /// The previous pass's ledger could not be read.
    #[error(transparent)]
    Ledger(#[from] SyncLedgerError),
    /// The issue body template does not compile.
    #[error("invalid issue body template: {0}")]
    Template(#[from] minijinja::Error),
}

/// Result type for sync passes.
pub type SyncResult<T> = Result<T, SyncError>;

/// What the tracker knows about a task's candidate issue.
enum Lookup {
    Found(IssueRecord),
    Missing,
    Failed,
}

/// Read-only inputs shared by every step of one pass.
struct PassContext<'pass> {
    model: &'pass TaskModel,
    ledger: &'pass SyncLedger,
    explicit: BTreeMap<TrackerId, TaskKey>,
    policy: LabelPolicy,
    vocabulary: LabelVocabulary,
    templates: Environment<'pass>,
}

/// Engine making the tracker reflect a sprint plan.
///
/// Each pass is idempotent: running it again with the same plan and an
/// unchanged tracker applies nothing. Passes for the same sprint are
/// serialised; passes for different sprints run independently.
pub struct TaskSyncEngine<T, L>
where
    T: IssueTrackerClient,
    L: SyncLedgerStore,
{
    tracker: Arc<T>,
    ledger: Arc<L>,
    config: SyncConfig,
    sprint_locks: Arc<KeyedLocks<String>>,
}

impl<T, L> TaskSyncEngine<T, L>
where
    T: IssueTrackerClient,
    L: SyncLedgerStore,
{
    /// Creates a new engine.
    #[must_use]
    pub fn new(tracker: Arc<T>, ledger: Arc<L>, config: SyncConfig) -> Self {
        Self {
            tracker,
            ledger,
            config,
            sprint_locks: Arc::new(KeyedLocks::new()),
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Runs one sync pass.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] only for problems found before any remote call:
    /// a malformed plan, an unreadable ledger or a broken body template.
    pub async fn sync(&self, model: TaskModel) -> SyncResult<SyncReport> {
        self.sync_with_cancellation(model, &CancellationToken::new())
            .await
    }

    /// Runs one sync pass that stops early once `cancel` fires.
    ///
    /// Cancellation is checked before every task and before orphan handling.
    /// Changes already applied stay applied; the ledger records every link
    /// made so far so the next pass converges.
    ///
    /// # Errors
    ///
    /// See [`TaskSyncEngine::sync`].
    pub async fn sync_with_cancellation(
        &self,
        model: TaskModel,
        cancel: &CancellationToken,
    ) -> SyncResult<SyncReport> {
        model.validate()?;
        let mut templates = Environment::new();
        templates.add_template(BODY_TEMPLATE, &self.config.issue_body_template)?;

        let lock = self.sprint_locks.lock_for(&model.sprint().to_owned());
        let _guard = lock.lock().await;

        let ledger = self.ledger.load(model.sprint()).await?;
        let policy = self.config.label_policy();
        let context = PassContext {
            model: &model,
            ledger: &ledger,
            explicit: model.linked_ids(),
            vocabulary: policy.vocabulary(&model, ledger.managed_labels()),
            policy,
            templates,
        };
        tracing::info!(sprint = model.sprint(), "sync pass started");

        let mut updated = model.clone();
        let mut actions = Vec::new();
        let mut cancelled = false;
        for (phase, task) in model.tasks() {
            if cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let key = phase.key_of(task);
            let link = self.sync_task(&context, phase, task, &key, &mut actions).await;
            updated.link(&key, link);
        }

        let mut links = updated.linked_ids();
        let mut retained = self
            .settle_orphans(&ledger, &links, cancel, &mut cancelled, &mut actions)
            .await;
        links.append(&mut retained);
        let settled = labels_settled(&actions, cancelled);
        let next = SyncLedger::new(links, context.vocabulary.remembered(settled));
        if next != ledger {
            self.persist_ledger(model.sprint(), &next, &mut actions).await;
        }

        tracing::info!(
            sprint = model.sprint(),
            actions = actions.len(),
            cancelled,
            "sync pass finished"
        );
        Ok(SyncReport {
            model: updated,
            actions,
            cancelled,
        })
    }

    /// Handles previously linked issues the plan no longer links.
    ///
    /// Returns the orphans to remember for the next pass: those whose
    /// handling failed and, once cancelled, those not handled at all.
    async fn settle_orphans(
        &self,
        ledger: &SyncLedger,
        current: &BTreeMap<TrackerId, TaskKey>,
        cancel: &CancellationToken,
        cancelled: &mut bool,
        actions: &mut Vec<SyncAction>,
    ) -> BTreeMap<TrackerId, TaskKey> {
        let mut retained = BTreeMap::new();
        for (tracker_id, key) in ledger.links() {
            if current.contains_key(tracker_id) {
                continue;
            }
            *cancelled = *cancelled || cancel.is_cancelled();
            if *cancelled || !self.handle_orphan(tracker_id, key, actions).await {
                retained.insert(tracker_id.clone(), key.clone());
            }
        }
        retained
    }

    async fn persist_ledger(
        &self,
        sprint: &str,
        ledger: &SyncLedger,
        actions: &mut Vec<SyncAction>,
    ) {
        if let Err(err) = self.ledger.save(sprint, ledger).await {
            fail(actions, SyncSubject::Ledger, SyncStage::PersistLedger, &err);
        }
    }

    /// Brings one task's issue in line with the plan.
    ///
    /// Returns the issue the task is linked to afterwards.
    async fn sync_task(
        &self,
        context: &PassContext<'_>,
        phase: &SprintPhase,
        task: &SprintTask,
        key: &TaskKey,
        actions: &mut Vec<SyncAction>,
    ) -> Option<TrackerId> {
        let candidate = task.tracker_id().cloned().or_else(|| {
            context
                .ledger
                .link_for(key)
                .filter(|tracker_id| !context.explicit.contains_key(*tracker_id))
                .cloned()
        });

        let record = match &candidate {
            Some(tracker_id) => self.lookup(key, tracker_id, actions).await,
            None => Lookup::Missing,
        };
        let desired_labels = context.policy.desired_labels(context.model, phase, task);

        match record {
            Lookup::Failed => candidate,
            Lookup::Missing => {
                let body = match render_body(context, phase, task) {
                    Ok(body) => body,
                    Err(err) => {
                        fail(actions, SyncSubject::Task(key.clone()), SyncStage::Create, &err);
                        return None;
                    }
                };
                let issue = NewIssue {
                    title: task.title().to_owned(),
                    body,
                    labels: desired_labels,
                };
                let desired_state = phase.status().desired_issue_state();
                self.create(key, &issue, desired_state, candidate, actions)
                    .await
            }
            Lookup::Found(issue) => {
                if task.tracker_id().is_none() {
                    tracing::debug!(
                        task = %key,
                        tracker_id = %issue.tracker_id,
                        "relinked task from ledger"
                    );
                }
                let desired_state = phase.status().desired_issue_state();
                if issue.state != desired_state {
                    self.set_state(key, &issue.tracker_id, issue.state, desired_state, actions)
                        .await;
                }
                let diff = LabelDiff::compute(&desired_labels, &issue.labels, &context.vocabulary);
                self.apply_labels(key, &issue.tracker_id, diff, actions).await;
                Some(issue.tracker_id)
            }
        }
    }

    async fn lookup(
        &self,
        key: &TaskKey,
        tracker_id: &TrackerId,
        actions: &mut Vec<SyncAction>,
    ) -> Lookup {
        match self.tracker.get_issue(tracker_id).await {
            Ok(Some(issue)) => Lookup::Found(issue),
            Ok(None) | Err(TrackerError::NotFound(_)) => {
                tracing::warn!(task = %key, %tracker_id, "linked issue no longer exists");
                Lookup::Missing
            }
            Err(err) => {
                fail(actions, SyncSubject::Task(key.clone()), SyncStage::Lookup, &err);
                Lookup::Failed
            }
        }
    }

    async fn create(
        &self,
        key: &TaskKey,
        issue: &NewIssue,
        desired_state: IssueState,
        replaced: Option<TrackerId>,
        actions: &mut Vec<SyncAction>,
    ) -> Option<TrackerId> {
        let tracker_id = match self.tracker.create_issue(issue).await {
            Ok(tracker_id) => tracker_id,
            Err(err) => {
                fail(actions, SyncSubject::Task(key.clone()), SyncStage::Create, &err);
                return None;
            }
        };
        tracing::info!(task = %key, %tracker_id, "created issue");
        actions.push(SyncAction::Created {
            task: key.clone(),
            tracker_id: tracker_id.clone(),
            replaced,
        });

        if desired_state != IssueState::Open {
            self.set_state(key, &tracker_id, IssueState::Open, desired_state, actions)
                .await;
        }
        Some(tracker_id)
    }

    async fn set_state(
        &self,
        key: &TaskKey,
        tracker_id: &TrackerId,
        from: IssueState,
        to: IssueState,
        actions: &mut Vec<SyncAction>,
    ) {
        match self.tracker.set_issue_state(tracker_id, to).await {
            Ok(()) => {
                tracing::info!(task = %key, %tracker_id, %from, %to, "changed issue state");
                actions.push(SyncAction::StateChanged {
                    task: key.clone(),
                    tracker_id: tracker_id.clone(),
                    from,
                    to,
                });
            }
            Err(err) => fail(actions, SyncSubject::Task(key.clone()), SyncStage::SetState, &err),
        }
    }

    /// Applies a label diff in at most one add and one remove call.
    async fn apply_labels(
        &self,
        key: &TaskKey,
        tracker_id: &TrackerId,
        diff: LabelDiff,
        actions: &mut Vec<SyncAction>,
    ) {
        if !diff.to_add.is_empty() {
            let labels: Vec<String> = diff.to_add.into_iter().collect();
            match self.tracker.add_labels(tracker_id, &labels).await {
                Ok(()) => actions.push(SyncAction::LabelsAdded {
                    task: key.clone(),
                    tracker_id: tracker_id.clone(),
                    labels,
                }),
                Err(err) => fail(
                    actions,
                    SyncSubject::Task(key.clone()),
                    SyncStage::AddLabels,
                    &err,
                ),
            }
        }
        if !diff.to_remove.is_empty() {
            let labels: Vec<String> = diff.to_remove.into_iter().collect();
            match self.tracker.remove_labels(tracker_id, &labels).await {
                Ok(()) => actions.push(SyncAction::LabelsRemoved {
                    task: key.clone(),
                    tracker_id: tracker_id.clone(),
                    labels,
                }),
                Err(err) => fail(
                    actions,
                    SyncSubject::Task(key.clone()),
                    SyncStage::RemoveLabels,
                    &err,
                ),
            }
        }
    }

    /// Closes and comments on an issue whose task left the plan.
    ///
    /// Returns whether the orphan is dealt with and can be forgotten.
    async fn handle_orphan(
        &self,
        tracker_id: &TrackerId,
        key: &TaskKey,
        actions: &mut Vec<SyncAction>,
    ) -> bool {
        let subject = || SyncSubject::Orphan(tracker_id.clone());
        let issue = match self.tracker.get_issue(tracker_id).await {
            Ok(Some(issue)) => issue,
            Ok(None) | Err(TrackerError::NotFound(_)) => {
                tracing::debug!(%tracker_id, task = %key, "orphaned issue no longer exists");
                return true;
            }
            Err(err) => {
                fail(actions, subject(), SyncStage::Lookup, &err);
                return false;
            }
        };

        let was_open = issue.state == IssueState::Open;
        if was_open
            && let Err(err) = self
                .tracker
                .set_issue_state(tracker_id, IssueState::Closed)
                .await
        {
            fail(actions, subject(), SyncStage::SetState, &err);
            return false;
        }

        let commented = was_open || self.config.comment_on_closed_orphans;
        if commented
            && let Err(err) = self
                .tracker
                .add_comment(tracker_id, &self.config.orphan_comment)
                .await
        {
            fail(actions, subject(), SyncStage::Comment, &err);
            return false;
        }

        tracing::info!(%tracker_id, task = %key, was_open, commented, "closed orphaned issue");
        actions.push(SyncAction::OrphanClosed {
            tracker_id: tracker_id.clone(),
            task: key.clone(),
            was_open,
            commented,
        });
        true
    }
}

/// Returns whether every linked issue was read and relabelled this pass.
fn labels_settled(actions: &[SyncAction], cancelled: bool) -> bool {
    !cancelled
        && !actions.iter().any(|action| {
            matches!(
                action,
                SyncAction::Failed {
                    subject: SyncSubject::Task(_),
                    stage: SyncStage::Lookup | SyncStage::RemoveLabels,
                    ..
                }
            )
        })
}

fn render_body(
    context: &PassContext<'_>,
    phase: &SprintPhase,
    task: &SprintTask,
) -> Result<String, minijinja::Error> {
    context.templates.get_template(BODY_TEMPLATE)?.render(context! {
        title => task.title(),
        description => task.description(),
        phase => phase.name(),
        sprint => context.model.sprint(),
        dependencies => task.dependencies().iter().collect::<Vec<_>>(),
    })
}

fn fail(
    actions: &mut Vec<SyncAction>,
    subject: SyncSubject,
    stage: SyncStage,
    err: &dyn std::error::Error,
) {
    tracing::warn!(%subject, %stage, error = %err, "sync step failed");
    actions.push(SyncAction::Failed {
        subject,
        stage,
        error: err.to_string(),
    });
}
