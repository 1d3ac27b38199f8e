//! Field schema: the closed set of question kinds and their shape contract.
//!
//! Forms store their question list as an opaque JSON blob, and submissions
//! store their answer map the same way. Both are validated when they cross
//! the storage boundary rather than trusting the stored shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{FormsError, Result};

/// Question kind. Determines the widget, the answer shape, and whether the
/// field carries an options list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text input
    ShortText,
    /// Multi-line paragraph input
    LongText,
    /// Radio group, one option
    SingleChoice,
    /// Checkbox group, zero or more options
    MultiChoice,
    /// Dropdown, one option
    SingleSelect,
    /// Calendar date, stored as its string form
    Date,
}

impl FieldKind {
    /// Whether fields of this kind must declare an options list.
    pub fn options_required(self) -> bool {
        matches!(
            self,
            FieldKind::SingleChoice | FieldKind::MultiChoice | FieldKind::SingleSelect
        )
    }

    /// Whether answers to this kind are free text (including dates).
    pub fn is_text(self) -> bool {
        matches!(self, FieldKind::ShortText | FieldKind::LongText | FieldKind::Date)
    }
}

/// One question within a form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Opaque unique id, stable across edits; the answer-map key.
    pub id: String,
    /// Question kind
    pub kind: FieldKind,
    /// Display text
    pub label: String,
    /// Governs response validation only
    #[serde(default)]
    pub required: bool,
    /// Present iff the kind takes options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Hint text for text/date kinds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
}

impl Field {
    /// Check the field's internal invariants: non-empty label, and options
    /// presence fully determined by the kind (with at least two entries
    /// where present).
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(FormsError::Validation("field id must not be empty".into()));
        }
        if self.label.trim().is_empty() {
            return Err(FormsError::Validation(format!(
                "field '{}' has an empty label",
                self.id
            )));
        }
        match (&self.options, self.kind.options_required()) {
            (Some(options), true) => {
                if options.len() < 2 {
                    return Err(FormsError::Validation(format!(
                        "field '{}' needs at least two options",
                        self.label
                    )));
                }
            }
            (None, true) => {
                return Err(FormsError::Validation(format!(
                    "field '{}' requires an options list",
                    self.label
                )));
            }
            (Some(_), false) => {
                return Err(FormsError::Validation(format!(
                    "field '{}' does not take options",
                    self.label
                )));
            }
            (None, false) => {}
        }
        Ok(())
    }
}

/// One answer value. Single-valued kinds answer with a string, multi-choice
/// answers with an ordered list of selected options; on the wire this is a
/// JSON string or array of strings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    /// Text, date, or single-choice answer
    Text(String),
    /// Multi-choice selections, in selection order
    Selections(Vec<String>),
}

impl AnswerValue {
    /// Empty string or empty selection list.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(text) => text.is_empty(),
            AnswerValue::Selections(items) => items.is_empty(),
        }
    }

    /// Flattened cell form: selections joined with `", "`.
    pub fn as_cell(&self) -> String {
        match self {
            AnswerValue::Text(text) => text.clone(),
            AnswerValue::Selections(items) => items.join(", "),
        }
    }
}

/// Answer map keyed by [`Field::id`]. Keys with no matching field are
/// accepted and stored untouched.
pub type AnswerMap = BTreeMap<String, AnswerValue>;

/// Serialize a field list into its stored blob form.
pub fn fields_to_wire(fields: &[Field]) -> Result<serde_json::Value> {
    serde_json::to_value(fields).map_err(|e| FormsError::Storage(e.to_string()))
}

/// Deserialize and validate a stored field blob.
pub fn fields_from_wire(value: serde_json::Value) -> Result<Vec<Field>> {
    let fields: Vec<Field> = serde_json::from_value(value)
        .map_err(|e| FormsError::Validation(format!("malformed field blob: {e}")))?;
    for field in &fields {
        field.validate()?;
    }
    Ok(fields)
}

/// Serialize an answer map into its stored blob form.
pub fn answers_to_wire(answers: &AnswerMap) -> Result<serde_json::Value> {
    serde_json::to_value(answers).map_err(|e| FormsError::Storage(e.to_string()))
}

/// Deserialize a stored answer blob.
pub fn answers_from_wire(value: serde_json::Value) -> Result<AnswerMap> {
    serde_json::from_value(value)
        .map_err(|e| FormsError::Validation(format!("malformed answer blob: {e}")))
}
