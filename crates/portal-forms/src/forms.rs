//! Form definition store: create, edit, publish, list, and delete forms.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{fields_from_wire, fields_to_wire, Field};
use crate::storage::{FormRecord, Storage};
use crate::{FormsError, Result};

/// Forms collect detailed information; polls are for quick opinion
/// gathering. The distinction is presentational, both behave identically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormKind {
    Form,
    Poll,
}

/// One form or poll.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FormDefinition {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub form_kind: FormKind,
    pub published: bool,
    /// Opaque operator identity
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    /// Ordered questions; the order is both edit and respondent-facing order.
    pub fields: Vec<Field>,
}

impl FormDefinition {
    pub(crate) fn from_record(record: FormRecord) -> Result<Self> {
        Ok(Self {
            id: record.id,
            title: record.title,
            description: record.description,
            form_kind: record.form_kind,
            published: record.published,
            created_by: record.created_by,
            created_at: record.created_at,
            fields: fields_from_wire(record.fields)?,
        })
    }

    pub(crate) fn to_record(&self) -> Result<FormRecord> {
        Ok(FormRecord {
            id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            form_kind: self.form_kind,
            published: self.published,
            created_by: self.created_by.clone(),
            created_at: self.created_at,
            fields: fields_to_wire(&self.fields)?,
        })
    }
}

/// Input for [`FormService::create`].
#[derive(Clone, Debug, Deserialize)]
pub struct NewForm {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub form_kind: FormKind,
    #[serde(default)]
    pub published: bool,
    pub fields: Vec<Field>,
    pub created_by: String,
}

/// Replacement for a form's mutable fields. Edits are whole-document
/// replaces, never field-level patches.
#[derive(Clone, Debug, Deserialize)]
pub struct FormPatch {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub form_kind: FormKind,
    pub published: bool,
    pub fields: Vec<Field>,
}

/// Listing filter: kind plus case-insensitive substring search over title
/// and description.
#[derive(Clone, Debug, Default)]
pub struct ListFilter {
    pub kind: Option<FormKind>,
    pub search: Option<String>,
}

/// One entry of the operator listing.
#[derive(Clone, Debug, Serialize)]
pub struct FormListEntry {
    #[serde(flatten)]
    pub form: FormDefinition,
    pub submission_count: u64,
}

/// Form definition store over a storage backend.
pub struct FormService {
    storage: Arc<dyn Storage>,
}

impl FormService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Create a new form in draft state unless `published` is set.
    pub async fn create(&self, new: NewForm) -> Result<FormDefinition> {
        validate_title(&new.title)?;
        validate_fields(&new.fields)?;

        let form = FormDefinition {
            id: Uuid::new_v4(),
            title: new.title,
            description: new.description,
            form_kind: new.form_kind,
            published: new.published,
            created_by: new.created_by,
            created_at: Utc::now(),
            fields: new.fields,
        };
        self.storage.insert_form(form.to_record()?).await?;
        tracing::info!(form_id = %form.id, title = %form.title, "form created");
        Ok(form)
    }

    /// Fetch one form.
    pub async fn get(&self, id: Uuid) -> Result<FormDefinition> {
        let record = self.storage.get_form(id).await?.ok_or(FormsError::NotFound)?;
        FormDefinition::from_record(record)
    }

    /// Replace the form's mutable fields wholesale. Identity, creator, and
    /// creation time are preserved.
    pub async fn update(&self, id: Uuid, patch: FormPatch) -> Result<FormDefinition> {
        validate_title(&patch.title)?;
        validate_fields(&patch.fields)?;

        let mut form = self.get(id).await?;
        form.title = patch.title;
        form.description = patch.description;
        form.form_kind = patch.form_kind;
        form.published = patch.published;
        form.fields = patch.fields;

        self.storage.replace_form(form.to_record()?).await?;
        tracing::info!(form_id = %id, "form updated");
        Ok(form)
    }

    /// Toggle respondent visibility. Effective for subsequent fetches
    /// immediately; there is no caching layer in between.
    pub async fn set_published(&self, id: Uuid, value: bool) -> Result<FormDefinition> {
        let mut form = self.get(id).await?;
        form.published = value;
        self.storage.replace_form(form.to_record()?).await?;
        tracing::info!(form_id = %id, published = value, "form visibility changed");
        Ok(form)
    }

    /// Delete the form and every response referencing it. Irreversible.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        if self.storage.get_form(id).await?.is_none() {
            return Err(FormsError::NotFound);
        }
        // Responses go first so a failure midway cannot orphan them.
        self.storage.delete_submissions_for(id).await?;
        self.storage.delete_form(id).await?;
        tracing::info!(form_id = %id, "form deleted with its responses");
        Ok(())
    }

    /// List forms newest-created-first, each with its response count.
    pub async fn list(&self, filter: ListFilter) -> Result<Vec<FormListEntry>> {
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let mut forms = Vec::new();
        for record in self.storage.list_forms().await? {
            let form = FormDefinition::from_record(record)?;
            if let Some(kind) = filter.kind {
                if form.form_kind != kind {
                    continue;
                }
            }
            if let Some(needle) = &needle {
                let in_title = form.title.to_lowercase().contains(needle);
                let in_description = form
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(needle));
                if !in_title && !in_description {
                    continue;
                }
            }
            let submission_count = self.storage.count_submissions(form.id).await?;
            forms.push(FormListEntry { form, submission_count });
        }
        forms.sort_by(|a, b| b.form.created_at.cmp(&a.form.created_at));
        Ok(forms)
    }
}

fn validate_title(title: &str) -> Result<()> {
    if title.chars().count() < 3 {
        return Err(FormsError::Validation(
            "title must be at least 3 characters".into(),
        ));
    }
    Ok(())
}

fn validate_fields(fields: &[Field]) -> Result<()> {
    if fields.is_empty() {
        return Err(FormsError::Validation(
            "a form needs at least one question".into(),
        ));
    }
    for field in fields {
        field.validate()?;
    }
    let mut seen = std::collections::HashSet::new();
    for field in fields {
        if !seen.insert(field.id.as_str()) {
            return Err(FormsError::Validation(format!(
                "duplicate field id '{}'",
                field.id
            )));
        }
    }
    Ok(())
}
