//! Domain model for sprint task synchronisation.

mod actions;
mod document;
mod error;
mod ids;
mod issue;
mod labels;
mod ledger;
mod model;

pub use actions::{SyncAction, SyncReport, SyncStage, SyncSubject};
pub use document::{SprintDocument, SprintDocumentError};
pub use error::SprintDomainError;
pub use ids::{TaskKey, TrackerId};
pub use issue::{IssueRecord, IssueState, NewIssue};
pub use labels::{LabelDiff, LabelPolicy, LabelVocabulary};
pub use ledger::SyncLedger;
pub use model::{PhaseStatus, SprintPhase, SprintTask, TaskModel};
