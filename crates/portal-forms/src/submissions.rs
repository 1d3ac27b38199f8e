//! Response collector: accepts one respondent's answer set for a published
//! form, exactly once per respondent.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::forms::FormDefinition;
use crate::schema::{answers_from_wire, answers_to_wire, AnswerMap, AnswerValue, Field, FieldKind};
use crate::storage::{Storage, SubmissionRecord};
use crate::{FormsError, Result};

/// One respondent's complete submission to one form. Immutable once stored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    pub form_id: Uuid,
    /// Opaque respondent identity
    pub respondent_id: String,
    pub submitted_at: DateTime<Utc>,
    pub answers: AnswerMap,
}

impl Submission {
    pub(crate) fn from_record(record: SubmissionRecord) -> Result<Self> {
        Ok(Self {
            id: record.id,
            form_id: record.form_id,
            respondent_id: record.respondent_id,
            submitted_at: record.submitted_at,
            answers: answers_from_wire(record.answers)?,
        })
    }

    pub(crate) fn to_record(&self) -> Result<SubmissionRecord> {
        Ok(SubmissionRecord {
            id: self.id,
            form_id: self.form_id,
            respondent_id: self.respondent_id.clone(),
            submitted_at: self.submitted_at,
            answers: answers_to_wire(&self.answers)?,
        })
    }
}

/// Submission joined with the respondent's directory entry, for response
/// listings and exports.
#[derive(Clone, Debug, Serialize)]
pub struct SubmissionView {
    #[serde(flatten)]
    pub submission: Submission,
    pub respondent_name: String,
    pub student_id: String,
}

/// Response collector over a storage backend.
pub struct SubmissionService {
    storage: Arc<dyn Storage>,
}

impl SubmissionService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Accept one respondent's answers for a published form.
    ///
    /// Rejects drafts and repeat submissions, validates required answers
    /// against the form's fields, then persists a single row. Validation
    /// failures never reach storage. The duplicate check is a point lookup
    /// immediately before insert, not a transactional constraint: two
    /// concurrent submissions racing past it can both land.
    pub async fn submit(
        &self,
        form_id: Uuid,
        respondent_id: &str,
        answers: AnswerMap,
    ) -> Result<Submission> {
        let record = self
            .storage
            .get_form(form_id)
            .await?
            .ok_or(FormsError::NotFound)?;
        let form = FormDefinition::from_record(record)?;
        if !form.published {
            return Err(FormsError::NotPublished);
        }

        if self
            .storage
            .find_submission(form_id, respondent_id)
            .await?
            .is_some()
        {
            return Err(FormsError::DuplicateSubmission);
        }

        validate_answers(&form.fields, &answers)?;

        let submission = Submission {
            id: Uuid::new_v4(),
            form_id,
            respondent_id: respondent_id.to_string(),
            submitted_at: Utc::now(),
            answers,
        };
        self.storage
            .insert_submission(submission.to_record()?)
            .await?;
        tracing::info!(
            form_id = %form_id,
            submission_id = %submission.id,
            "response submitted"
        );
        Ok(submission)
    }

    /// Whether this respondent has already submitted to this form.
    pub async fn has_submitted(&self, form_id: Uuid, respondent_id: &str) -> Result<bool> {
        Ok(self
            .storage
            .find_submission(form_id, respondent_id)
            .await?
            .is_some())
    }

    /// All responses to a form, newest first, joined with respondent
    /// directory entries.
    pub async fn responses(&self, form_id: Uuid) -> Result<Vec<SubmissionView>> {
        if self.storage.get_form(form_id).await?.is_none() {
            return Err(FormsError::NotFound);
        }
        let mut submissions = Vec::new();
        for record in self.storage.list_submissions(form_id).await? {
            submissions.push(Submission::from_record(record)?);
        }
        submissions.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

        let mut views = Vec::with_capacity(submissions.len());
        for submission in submissions {
            let profile = self.storage.get_profile(&submission.respondent_id).await?;
            let (respondent_name, student_id) = match profile {
                Some(profile) => {
                    let name = profile.display_name();
                    (
                        if name.is_empty() { "Unknown User".to_string() } else { name },
                        profile
                            .student_id
                            .unwrap_or_else(|| "No Student ID".to_string()),
                    )
                }
                None => ("Unknown User".to_string(), "No Student ID".to_string()),
            };
            views.push(SubmissionView {
                submission,
                respondent_name,
                student_id,
            });
        }
        Ok(views)
    }
}

/// Every required field must have a present, non-empty answer; present
/// answers must match the field's shape. Answer keys with no matching field
/// are accepted and stored as-is.
fn validate_answers(fields: &[Field], answers: &AnswerMap) -> Result<()> {
    for field in fields {
        match answers.get(&field.id) {
            Some(answer) => {
                let shape_ok = match field.kind {
                    FieldKind::MultiChoice => matches!(answer, AnswerValue::Selections(_)),
                    _ => matches!(answer, AnswerValue::Text(_)),
                };
                if !shape_ok {
                    return Err(FormsError::Validation(format!(
                        "answer to '{}' has the wrong shape",
                        field.label
                    )));
                }
                if field.required && answer.is_empty() {
                    return Err(FormsError::Validation(format!(
                        "'{}' is required",
                        field.label
                    )));
                }
            }
            None if field.required => {
                return Err(FormsError::Validation(format!(
                    "'{}' is required",
                    field.label
                )));
            }
            None => {}
        }
    }
    Ok(())
}
