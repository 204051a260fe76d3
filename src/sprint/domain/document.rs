//! YAML sprint documents.
//!
//! ```yaml
//! sprint: payments-hardening
//! labels: [sprint:payments]
//! phases:
//!   - name: Infra
//!     status: pending
//!     tasks:
//!       - title: Add healthcheck
//!         description: Expose /healthz
//!         labels: [priority:high]
//!         depends_on: []
//!         issue: "50"
//! ```

use super::{PhaseStatus, SprintDomainError, SprintPhase, SprintTask, TaskModel, TrackerId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading or writing sprint documents.
#[derive(Debug, Error)]
pub enum SprintDocumentError {
    /// The text is not a well-formed sprint document.
    #[error("malformed sprint document: {0}")]
    Parse(#[source] serde_yaml::Error),

    /// The document parsed but describes an invalid plan.
    #[error(transparent)]
    Invalid(#[from] SprintDomainError),

    /// The plan could not be rendered.
    #[error("failed to render sprint document: {0}")]
    Render(#[source] serde_yaml::Error),
}

/// On-disk shape of a sprint plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintDocument {
    sprint: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    labels: Vec<String>,
    #[serde(default)]
    phases: Vec<PhaseEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PhaseEntry {
    name: String,
    #[serde(default = "default_status")]
    status: String,
    #[serde(default)]
    tasks: Vec<TaskEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct TaskEntry {
    title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    issue: Option<IssueEntry>,
}

/// Issue references may be written as numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum IssueEntry {
    Number(u64),
    Text(String),
}

fn default_status() -> String {
    PhaseStatus::Pending.as_str().to_owned()
}

impl SprintDocument {
    /// Parses and validates a YAML sprint document.
    ///
    /// # Errors
    ///
    /// Returns [`SprintDocumentError::Parse`] for malformed YAML and
    /// [`SprintDocumentError::Invalid`] for structural problems such as
    /// unknown statuses or duplicate titles.
    pub fn from_yaml_str(text: &str) -> Result<TaskModel, SprintDocumentError> {
        let document: Self = serde_yaml::from_str(text).map_err(SprintDocumentError::Parse)?;
        let model = document.into_model()?;
        model.validate()?;
        Ok(model)
    }

    /// Renders a plan, including its tracker links, as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`SprintDocumentError::Render`] when serialisation fails.
    pub fn to_yaml_string(model: &TaskModel) -> Result<String, SprintDocumentError> {
        serde_yaml::to_string(&Self::from_model(model)).map_err(SprintDocumentError::Render)
    }

    fn into_model(self) -> Result<TaskModel, SprintDomainError> {
        let mut model = TaskModel::new(self.sprint).with_labels(self.labels);
        for entry in self.phases {
            let status = PhaseStatus::try_from(entry.status.as_str())?;
            let mut phase = SprintPhase::new(entry.name, status);
            for task_entry in entry.tasks {
                let mut task = SprintTask::new(task_entry.title)
                    .with_description(task_entry.description)
                    .with_labels(task_entry.labels)
                    .with_dependencies(task_entry.depends_on);
                if let Some(issue) = task_entry.issue {
                    let tracker_id = match issue {
                        IssueEntry::Number(number) => TrackerId::from(number),
                        IssueEntry::Text(text) => TrackerId::new(text)?,
                    };
                    task = task.with_tracker_id(tracker_id);
                }
                phase = phase.with_task(task);
            }
            model = model.with_phase(phase);
        }
        Ok(model)
    }

    fn from_model(model: &TaskModel) -> Self {
        Self {
            sprint: model.sprint().to_owned(),
            labels: model.labels().iter().cloned().collect(),
            phases: model
                .phases()
                .iter()
                .map(|phase| PhaseEntry {
                    name: phase.name().to_owned(),
                    status: phase.status().as_str().to_owned(),
                    tasks: phase
                        .tasks()
                        .iter()
                        .map(|task| TaskEntry {
                            title: task.title().to_owned(),
                            description: task.description().to_owned(),
                            labels: task.labels().iter().cloned().collect(),
                            depends_on: task.dependencies().iter().cloned().collect(),
                            issue: task
                                .tracker_id()
                                .map(|tracker_id| IssueEntry::Text(tracker_id.to_string())),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}
