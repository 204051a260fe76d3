//! In-memory issue tracker with a call log and scripted failures.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::sprint::{
    domain::{IssueRecord, IssueState, NewIssue, TrackerId},
    ports::{IssueTrackerClient, TrackerError, TrackerResult},
};

/// Kind of tracker call, used to script failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerCallKind {
    /// [`IssueTrackerClient::create_issue`].
    CreateIssue,
    /// [`IssueTrackerClient::get_issue`].
    GetIssue,
    /// [`IssueTrackerClient::set_issue_state`].
    SetIssueState,
    /// [`IssueTrackerClient::add_labels`].
    AddLabels,
    /// [`IssueTrackerClient::remove_labels`].
    RemoveLabels,
    /// [`IssueTrackerClient::add_comment`].
    AddComment,
}

/// A call received by the fake, failed or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerCall {
    /// An issue creation with the given title.
    CreateIssue(String),
    /// An issue read.
    GetIssue(TrackerId),
    /// A state change.
    SetIssueState(TrackerId, IssueState),
    /// A batched label addition.
    AddLabels(TrackerId, Vec<String>),
    /// A batched label removal.
    RemoveLabels(TrackerId, Vec<String>),
    /// A comment.
    AddComment(TrackerId, String),
}

impl TrackerCall {
    /// Returns the kind of call.
    #[must_use]
    pub const fn kind(&self) -> TrackerCallKind {
        match self {
            Self::CreateIssue(_) => TrackerCallKind::CreateIssue,
            Self::GetIssue(_) => TrackerCallKind::GetIssue,
            Self::SetIssueState(..) => TrackerCallKind::SetIssueState,
            Self::AddLabels(..) => TrackerCallKind::AddLabels,
            Self::RemoveLabels(..) => TrackerCallKind::RemoveLabels,
            Self::AddComment(..) => TrackerCallKind::AddComment,
        }
    }

    /// Returns whether the call changes tracker state.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        !matches!(self, Self::GetIssue(_))
    }

    const fn tracker_id(&self) -> Option<&TrackerId> {
        match self {
            Self::CreateIssue(_) => None,
            Self::GetIssue(tracker_id)
            | Self::SetIssueState(tracker_id, _)
            | Self::AddLabels(tracker_id, _)
            | Self::RemoveLabels(tracker_id, _)
            | Self::AddComment(tracker_id, _) => Some(tracker_id),
        }
    }
}

#[derive(Debug)]
struct ScriptedFailure {
    kind: TrackerCallKind,
    tracker_id: Option<TrackerId>,
    error: TrackerError,
}

#[derive(Debug)]
struct TrackerState {
    issues: BTreeMap<TrackerId, IssueRecord>,
    comments: BTreeMap<TrackerId, Vec<String>>,
    next_number: u64,
    calls: Vec<TrackerCall>,
    failures: Vec<ScriptedFailure>,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            issues: BTreeMap::new(),
            comments: BTreeMap::new(),
            next_number: 1,
            calls: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl TrackerState {
    /// Logs `call` and returns the first scripted failure matching it.
    fn record(&mut self, call: TrackerCall) -> TrackerResult<()> {
        let kind = call.kind();
        let position = self.failures.iter().position(|failure| {
            failure.kind == kind
                && failure
                    .tracker_id
                    .as_ref()
                    .is_none_or(|expected| call.tracker_id() == Some(expected))
        });
        self.calls.push(call);
        position.map_or(Ok(()), |index| Err(self.failures.remove(index).error))
    }

    fn issue_mut(&mut self, tracker_id: &TrackerId) -> TrackerResult<&mut IssueRecord> {
        self.issues
            .get_mut(tracker_id)
            .ok_or_else(|| TrackerError::NotFound(tracker_id.clone()))
    }
}

/// Issue tracker kept entirely in memory.
///
/// Issues are numbered sequentially. Every call is logged, including calls
/// that fail, and failures can be scripted per call kind and issue.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIssueTracker {
    state: Arc<RwLock<TrackerState>>,
}

impl InMemoryIssueTracker {
    /// Creates an empty tracker numbering issues from 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Numbers the next created issue `number`.
    #[must_use]
    pub fn with_starting_number(self, number: u64) -> Self {
        self.write().next_number = number;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, TrackerState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TrackerState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores an issue as if someone else had created it.
    pub fn seed_issue(&self, issue: IssueRecord) {
        self.write().issues.insert(issue.tracker_id.clone(), issue);
    }

    /// Deletes an issue, as a tracker admin might.
    pub fn delete_issue(&self, tracker_id: &TrackerId) {
        self.write().issues.remove(tracker_id);
    }

    /// Makes the next matching call fail with `error`.
    pub fn fail_next(&self, kind: TrackerCallKind, error: TrackerError) {
        self.write().failures.push(ScriptedFailure {
            kind,
            tracker_id: None,
            error,
        });
    }

    /// Makes the next matching call about `tracker_id` fail with `error`.
    pub fn fail_next_for(&self, kind: TrackerCallKind, tracker_id: TrackerId, error: TrackerError) {
        self.write().failures.push(ScriptedFailure {
            kind,
            tracker_id: Some(tracker_id),
            error,
        });
    }

    /// Returns a snapshot of an issue.
    #[must_use]
    pub fn issue(&self, tracker_id: &TrackerId) -> Option<IssueRecord> {
        self.read().issues.get(tracker_id).cloned()
    }

    /// Returns every stored issue in id order.
    #[must_use]
    pub fn issues(&self) -> Vec<IssueRecord> {
        self.read().issues.values().cloned().collect()
    }

    /// Returns the comments posted on an issue.
    #[must_use]
    pub fn comments(&self, tracker_id: &TrackerId) -> Vec<String> {
        self.read()
            .comments
            .get(tracker_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns every call received so far.
    #[must_use]
    pub fn calls(&self) -> Vec<TrackerCall> {
        self.read().calls.clone()
    }

    /// Returns only the calls that change tracker state.
    #[must_use]
    pub fn mutations(&self) -> Vec<TrackerCall> {
        self.read()
            .calls
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }

    /// Forgets the call log.
    pub fn clear_calls(&self) {
        self.write().calls.clear();
    }
}

#[async_trait]
impl IssueTrackerClient for InMemoryIssueTracker {
    async fn create_issue(&self, issue: &NewIssue) -> TrackerResult<TrackerId> {
        let mut state = self.write();
        state.record(TrackerCall::CreateIssue(issue.title.clone()))?;

        let tracker_id = TrackerId::from(state.next_number);
        state.next_number += 1;
        state.issues.insert(
            tracker_id.clone(),
            IssueRecord {
                tracker_id: tracker_id.clone(),
                title: issue.title.clone(),
                state: IssueState::Open,
                labels: issue.labels.clone(),
                body: issue.body.clone(),
            },
        );
        Ok(tracker_id)
    }

    async fn get_issue(&self, tracker_id: &TrackerId) -> TrackerResult<Option<IssueRecord>> {
        let mut state = self.write();
        state.record(TrackerCall::GetIssue(tracker_id.clone()))?;
        Ok(state.issues.get(tracker_id).cloned())
    }

    async fn set_issue_state(
        &self,
        tracker_id: &TrackerId,
        issue_state: IssueState,
    ) -> TrackerResult<()> {
        let mut state = self.write();
        state.record(TrackerCall::SetIssueState(tracker_id.clone(), issue_state))?;
        state.issue_mut(tracker_id)?.state = issue_state;
        Ok(())
    }

    async fn add_labels(&self, tracker_id: &TrackerId, labels: &[String]) -> TrackerResult<()> {
        let mut state = self.write();
        state.record(TrackerCall::AddLabels(tracker_id.clone(), labels.to_vec()))?;
        state
            .issue_mut(tracker_id)?
            .labels
            .extend(labels.iter().cloned());
        Ok(())
    }

    async fn remove_labels(&self, tracker_id: &TrackerId, labels: &[String]) -> TrackerResult<()> {
        let mut state = self.write();
        state.record(TrackerCall::RemoveLabels(tracker_id.clone(), labels.to_vec()))?;
        let removed: BTreeSet<&String> = labels.iter().collect();
        state
            .issue_mut(tracker_id)?
            .labels
            .retain(|label| !removed.contains(label));
        Ok(())
    }

    async fn add_comment(&self, tracker_id: &TrackerId, body: &str) -> TrackerResult<()> {
        let mut state = self.write();
        state.record(TrackerCall::AddComment(tracker_id.clone(), body.to_owned()))?;
        state.issue_mut(tracker_id)?;
        state
            .comments
            .entry(tracker_id.clone())
            .or_default()
            .push(body.to_owned());
        Ok(())
    }
}
