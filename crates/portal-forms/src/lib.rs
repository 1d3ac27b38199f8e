//! Student Portal Forms Platform
//!
//! Forms and polls for the student portal: a builder for administrators,
//! response collection for students, and aggregation over collected
//! responses.
//!
//! ## Features
//! - Closed field taxonomy (text, choice, select, date questions)
//! - Draft/published lifecycle with whole-document edits
//! - One response per student per form (advisory check, see `submissions`)
//! - Per-field summary statistics and CSV export
//!
//! Persistence is delegated to a [`storage::Storage`] collaborator; every
//! service here is a thin orchestration layer over it. The aggregation in
//! [`summary`] and [`export`] is pure and performs no I/O.

use std::sync::Arc;

use thiserror::Error;

pub mod export;
pub mod forms;
pub mod schema;
pub mod storage;
pub mod submissions;
pub mod summary;

pub use export::{export_csv, export_filename};
pub use forms::{FormDefinition, FormKind, FormListEntry, FormPatch, FormService, ListFilter, NewForm};
pub use schema::{AnswerMap, AnswerValue, Field, FieldKind};
pub use storage::{MemoryStorage, RespondentProfile, Storage};
pub use submissions::{Submission, SubmissionService, SubmissionView};
pub use summary::{summarize, FieldStats, FieldSummary, OptionTally};

/// Forms error types
#[derive(Debug, Error)]
pub enum FormsError {
    /// Malformed input to create/update/submit
    #[error("validation error: {0}")]
    Validation(String),

    /// Unknown form id
    #[error("form not found")]
    NotFound,

    /// Submission against a draft form
    #[error("form is not published")]
    NotPublished,

    /// Second submission from the same respondent
    #[error("response already submitted for this form")]
    DuplicateSubmission,

    /// Persistence collaborator failure
    #[error("storage error: {0}")]
    Storage(String),
}

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, FormsError>;

/// Forms platform: the services wired over one storage backend.
pub struct FormsPlatform {
    /// Form definition store
    pub forms: FormService,
    /// Response collector
    pub submissions: SubmissionService,
}

impl FormsPlatform {
    /// Wire the platform over a storage backend.
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            forms: FormService::new(storage.clone()),
            submissions: SubmissionService::new(storage),
        }
    }

    /// Platform backed by in-memory storage, used by tests and the dev server.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }
}
