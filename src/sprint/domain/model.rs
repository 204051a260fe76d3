//! Sprint plan: phases, their status and their tasks.

use super::{IssueState, SprintDomainError, TaskKey, TrackerId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Progress of a sprint phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    /// Not started.
    #[default]
    Pending,
    /// Being worked on.
    InProgress,
    /// Done.
    Completed,
    /// Waiting on something outside the sprint.
    Blocked,
}

impl PhaseStatus {
    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
        }
    }

    /// Returns the issue state tasks of a phase with this status should have.
    #[must_use]
    pub const fn desired_issue_state(self) -> IssueState {
        match self {
            Self::Completed => IssueState::Closed,
            Self::Pending | Self::InProgress | Self::Blocked => IssueState::Open,
        }
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for PhaseStatus {
    type Error = SprintDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "blocked" => Ok(Self::Blocked),
            _ => Err(SprintDomainError::UnknownPhaseStatus(value.to_owned())),
        }
    }
}

fn normalized_set<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values
        .into_iter()
        .map(Into::<String>::into)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .collect()
}

/// One planned unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintTask {
    title: String,
    description: String,
    labels: BTreeSet<String>,
    dependencies: BTreeSet<String>,
    tracker_id: Option<TrackerId>,
}

impl SprintTask {
    /// Creates an unlinked task with a trimmed title.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into().trim().to_owned(),
            description: String::new(),
            labels: BTreeSet::new(),
            dependencies: BTreeSet::new(),
            tracker_id: None,
        }
    }

    /// Sets the description used as the issue body.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets task labels; blank entries are dropped.
    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = normalized_set(labels);
        self
    }

    /// Sets dependencies, by task title or tracker id.
    #[must_use]
    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = normalized_set(dependencies);
        self
    }

    /// Links the task to a tracker issue.
    #[must_use]
    pub fn with_tracker_id(mut self, tracker_id: TrackerId) -> Self {
        self.tracker_id = Some(tracker_id);
        self
    }

    /// Returns the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the task labels.
    #[must_use]
    pub const fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// Returns the dependencies.
    #[must_use]
    pub const fn dependencies(&self) -> &BTreeSet<String> {
        &self.dependencies
    }

    /// Returns the linked tracker issue, if any.
    #[must_use]
    pub const fn tracker_id(&self) -> Option<&TrackerId> {
        self.tracker_id.as_ref()
    }
}

/// Ordered group of tasks sharing a status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SprintPhase {
    index: usize,
    name: String,
    status: PhaseStatus,
    tasks: Vec<SprintTask>,
}

impl SprintPhase {
    /// Creates an empty phase with a trimmed name.
    #[must_use]
    pub fn new(name: impl Into<String>, status: PhaseStatus) -> Self {
        Self {
            index: 0,
            name: name.into().trim().to_owned(),
            status,
            tasks: Vec::new(),
        }
    }

    /// Appends a task.
    #[must_use]
    pub fn with_task(mut self, task: SprintTask) -> Self {
        self.tasks.push(task);
        self
    }

    /// Appends several tasks.
    #[must_use]
    pub fn with_tasks(mut self, tasks: impl IntoIterator<Item = SprintTask>) -> Self {
        self.tasks.extend(tasks);
        self
    }

    /// Returns the zero-based position of the phase in its sprint.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the phase name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the phase status.
    #[must_use]
    pub const fn status(&self) -> PhaseStatus {
        self.status
    }

    /// Returns the tasks in plan order.
    #[must_use]
    pub fn tasks(&self) -> &[SprintTask] {
        &self.tasks
    }

    /// Returns the key of `task` within this phase.
    #[must_use]
    pub fn key_of(&self, task: &SprintTask) -> TaskKey {
        TaskKey::new(&self.name, &task.title)
    }
}

/// A sprint plan: named, labelled and split into ordered phases.
///
/// Building a model never fails; [`TaskModel::validate`] reports structural
/// problems before the model is used to drive the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskModel {
    sprint: String,
    labels: BTreeSet<String>,
    phases: Vec<SprintPhase>,
}

impl TaskModel {
    /// Creates an empty plan for the named sprint.
    #[must_use]
    pub fn new(sprint: impl Into<String>) -> Self {
        Self {
            sprint: sprint.into().trim().to_owned(),
            labels: BTreeSet::new(),
            phases: Vec::new(),
        }
    }

    /// Sets sprint-level labels applied to every task; blank entries are
    /// dropped.
    #[must_use]
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = normalized_set(labels);
        self
    }

    /// Appends a phase, numbering it after the existing ones.
    #[must_use]
    pub fn with_phase(mut self, mut phase: SprintPhase) -> Self {
        phase.index = self.phases.len();
        self.phases.push(phase);
        self
    }

    /// Returns the sprint name.
    #[must_use]
    pub fn sprint(&self) -> &str {
        &self.sprint
    }

    /// Returns sprint-level labels.
    #[must_use]
    pub const fn labels(&self) -> &BTreeSet<String> {
        &self.labels
    }

    /// Returns phases in plan order.
    #[must_use]
    pub fn phases(&self) -> &[SprintPhase] {
        &self.phases
    }

    /// Iterates over every task with its phase, in plan order.
    pub fn tasks(&self) -> impl Iterator<Item = (&SprintPhase, &SprintTask)> {
        self.phases
            .iter()
            .flat_map(|phase| phase.tasks.iter().map(move |task| (phase, task)))
    }

    /// Returns the task identified by `key`.
    #[must_use]
    pub fn task(&self, key: &TaskKey) -> Option<&SprintTask> {
        self.phases
            .iter()
            .find(|phase| phase.name == key.phase())
            .and_then(|phase| phase.tasks.iter().find(|task| task.title == key.title()))
    }

    /// Returns every tracker id the plan links, with the linking task.
    #[must_use]
    pub fn linked_ids(&self) -> BTreeMap<TrackerId, TaskKey> {
        self.tasks()
            .filter_map(|(phase, task)| {
                task.tracker_id
                    .clone()
                    .map(|tracker_id| (tracker_id, phase.key_of(task)))
            })
            .collect()
    }

    /// Checks the plan for structural problems.
    ///
    /// # Errors
    ///
    /// Returns the first [`SprintDomainError`] found: an empty sprint name,
    /// empty or repeated phase names, empty or repeated task titles within a
    /// phase, or one issue linked from two tasks.
    pub fn validate(&self) -> Result<(), SprintDomainError> {
        if self.sprint.is_empty() {
            return Err(SprintDomainError::EmptySprintName);
        }

        let mut phase_names = HashSet::new();
        let mut links: BTreeMap<&TrackerId, TaskKey> = BTreeMap::new();
        for (index, phase) in self.phases.iter().enumerate() {
            if phase.name.is_empty() {
                return Err(SprintDomainError::EmptyPhaseName { index });
            }
            if !phase_names.insert(phase.name.as_str()) {
                return Err(SprintDomainError::DuplicatePhase {
                    name: phase.name.clone(),
                });
            }

            let mut titles = HashSet::new();
            for task in &phase.tasks {
                if task.title.is_empty() {
                    return Err(SprintDomainError::EmptyTaskTitle {
                        phase: phase.name.clone(),
                    });
                }
                if !titles.insert(task.title.as_str()) {
                    return Err(SprintDomainError::DuplicateTask {
                        phase: phase.name.clone(),
                        title: task.title.clone(),
                    });
                }
                if let Some(tracker_id) = &task.tracker_id
                    && let Some(first) = links.insert(tracker_id, phase.key_of(task))
                {
                    return Err(SprintDomainError::DuplicateTrackerLink {
                        tracker_id: tracker_id.clone(),
                        first: first.to_string(),
                        second: phase.key_of(task).to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Sets or clears the tracker link of the task identified by `key`.
    ///
    /// Returns whether the task exists.
    pub(crate) fn link(&mut self, key: &TaskKey, tracker_id: Option<TrackerId>) -> bool {
        let Some(task) = self
            .phases
            .iter_mut()
            .find(|phase| phase.name == key.phase())
            .and_then(|phase| {
                phase
                    .tasks
                    .iter_mut()
                    .find(|task| task.title == key.title())
            })
        else {
            return false;
        };
        task.tracker_id = tracker_id;
        true
    }
}
