//! Persistence collaborator: create/read/update/delete plus filtered list
//! over the three entity collections (forms, submissions, respondent
//! profiles).
//!
//! Field and answer blobs are stored as generic JSON trees; typed
//! conversion and validation happen in [`crate::schema`] when records are
//! read back. The in-memory backend mirrors what the hosted backend
//! provides: single-write atomicity, no transactions, and no composite
//! uniqueness constraint on (form, respondent).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::forms::FormKind;
use crate::Result;

/// Stored form row. `fields` is the opaque question blob.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub form_kind: FormKind,
    pub published: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub fields: serde_json::Value,
}

/// Stored submission row. `answers` is the opaque answer blob.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmissionRecord {
    pub id: Uuid,
    pub form_id: Uuid,
    pub respondent_id: String,
    pub submitted_at: DateTime<Utc>,
    pub answers: serde_json::Value,
}

/// Respondent directory entry, joined into response views and exports.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RespondentProfile {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub student_id: Option<String>,
}

impl RespondentProfile {
    /// "First Last", trimmed; empty when neither name is set.
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or(""),
            self.last_name.as_deref().unwrap_or("")
        )
        .trim()
        .to_string()
    }
}

/// Storage backend contract.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn insert_form(&self, record: FormRecord) -> Result<()>;
    async fn get_form(&self, id: Uuid) -> Result<Option<FormRecord>>;
    /// Whole-row replace; last write wins under concurrent editors.
    async fn replace_form(&self, record: FormRecord) -> Result<()>;
    async fn delete_form(&self, id: Uuid) -> Result<()>;
    async fn list_forms(&self) -> Result<Vec<FormRecord>>;

    async fn insert_submission(&self, record: SubmissionRecord) -> Result<()>;
    /// Point lookup for the advisory duplicate-submission check.
    async fn find_submission(
        &self,
        form_id: Uuid,
        respondent_id: &str,
    ) -> Result<Option<SubmissionRecord>>;
    async fn list_submissions(&self, form_id: Uuid) -> Result<Vec<SubmissionRecord>>;
    async fn count_submissions(&self, form_id: Uuid) -> Result<u64>;
    async fn delete_submissions_for(&self, form_id: Uuid) -> Result<()>;

    async fn get_profile(&self, user_id: &str) -> Result<Option<RespondentProfile>>;
    async fn upsert_profile(&self, profile: RespondentProfile) -> Result<()>;
}

/// In-memory backend for tests and the development server.
#[derive(Default)]
pub struct MemoryStorage {
    forms: DashMap<Uuid, FormRecord>,
    submissions: DashMap<Uuid, SubmissionRecord>,
    profiles: DashMap<String, RespondentProfile>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn insert_form(&self, record: FormRecord) -> Result<()> {
        self.forms.insert(record.id, record);
        Ok(())
    }

    async fn get_form(&self, id: Uuid) -> Result<Option<FormRecord>> {
        Ok(self.forms.get(&id).map(|r| r.value().clone()))
    }

    async fn replace_form(&self, record: FormRecord) -> Result<()> {
        self.forms.insert(record.id, record);
        Ok(())
    }

    async fn delete_form(&self, id: Uuid) -> Result<()> {
        self.forms.remove(&id);
        Ok(())
    }

    async fn list_forms(&self) -> Result<Vec<FormRecord>> {
        Ok(self.forms.iter().map(|r| r.value().clone()).collect())
    }

    async fn insert_submission(&self, record: SubmissionRecord) -> Result<()> {
        self.submissions.insert(record.id, record);
        Ok(())
    }

    async fn find_submission(
        &self,
        form_id: Uuid,
        respondent_id: &str,
    ) -> Result<Option<SubmissionRecord>> {
        Ok(self
            .submissions
            .iter()
            .find(|r| r.form_id == form_id && r.respondent_id == respondent_id)
            .map(|r| r.value().clone()))
    }

    async fn list_submissions(&self, form_id: Uuid) -> Result<Vec<SubmissionRecord>> {
        Ok(self
            .submissions
            .iter()
            .filter(|r| r.form_id == form_id)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn count_submissions(&self, form_id: Uuid) -> Result<u64> {
        Ok(self
            .submissions
            .iter()
            .filter(|r| r.form_id == form_id)
            .count() as u64)
    }

    async fn delete_submissions_for(&self, form_id: Uuid) -> Result<()> {
        self.submissions.retain(|_, r| r.form_id != form_id);
        Ok(())
    }

    async fn get_profile(&self, user_id: &str) -> Result<Option<RespondentProfile>> {
        Ok(self.profiles.get(user_id).map(|r| r.value().clone()))
    }

    async fn upsert_profile(&self, profile: RespondentProfile) -> Result<()> {
        self.profiles.insert(profile.user_id.clone(), profile);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(form_id: Uuid, respondent: &str) -> SubmissionRecord {
        SubmissionRecord {
            id: Uuid::new_v4(),
            form_id,
            respondent_id: respondent.into(),
            submitted_at: Utc::now(),
            answers: json!({}),
        }
    }

    #[tokio::test]
    async fn find_submission_is_a_point_lookup() {
        let storage = MemoryStorage::new();
        let form_id = Uuid::new_v4();
        storage.insert_submission(record(form_id, "alice")).await.unwrap();
        storage.insert_submission(record(form_id, "bob")).await.unwrap();

        assert!(storage.find_submission(form_id, "alice").await.unwrap().is_some());
        assert!(storage.find_submission(form_id, "carol").await.unwrap().is_none());
        assert!(storage
            .find_submission(Uuid::new_v4(), "alice")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn delete_submissions_only_touches_one_form() {
        let storage = MemoryStorage::new();
        let keep = Uuid::new_v4();
        let drop = Uuid::new_v4();
        storage.insert_submission(record(keep, "alice")).await.unwrap();
        storage.insert_submission(record(drop, "alice")).await.unwrap();
        storage.insert_submission(record(drop, "bob")).await.unwrap();

        storage.delete_submissions_for(drop).await.unwrap();

        assert_eq!(storage.count_submissions(keep).await.unwrap(), 1);
        assert_eq!(storage.count_submissions(drop).await.unwrap(), 0);
    }

    #[test]
    fn display_name_trims_missing_parts() {
        let profile = RespondentProfile {
            user_id: "u1".into(),
            first_name: Some("Ada".into()),
            last_name: None,
            student_id: Some("S-100".into()),
        };
        assert_eq!(profile.display_name(), "Ada");
        assert_eq!(RespondentProfile::default().display_name(), "");
    }
}
