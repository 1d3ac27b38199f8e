//! Response aggregator: per-field summary statistics over a form's
//! collected responses.
//!
//! Pure computation over `(FormDefinition, submissions)`; no I/O and no
//! hidden state, so running it twice over the same input yields identical
//! output.

use serde::Serialize;

use crate::forms::FormDefinition;
use crate::schema::{AnswerValue, Field, FieldKind};
use crate::submissions::Submission;

/// Tally for one declared option of a choice field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OptionTally {
    pub option: String,
    pub count: u64,
    /// Rounded to the nearest whole percent; 0 when the denominator is 0.
    pub percentage: u32,
}

/// Per-field statistics, keyed by field kind.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldStats {
    /// Choice kinds: one tally per declared option, zero-match options
    /// included.
    Choice { options: Vec<OptionTally> },
    /// Text kinds: answer-rate statistics, plus the raw non-empty answers
    /// for short/long text (dates are counted, not echoed).
    Text {
        answered: u64,
        skipped: u64,
        percentage_answered: u32,
        responses: Vec<String>,
    },
}

/// One field's summary.
#[derive(Clone, Debug, Serialize)]
pub struct FieldSummary {
    pub field: Field,
    pub stats: FieldStats,
}

/// Summarize every field of `form` over `submissions`, in field order.
///
/// Denominators differ by kind, preserving the source system's observed
/// behaviour: single-valued choice percentages are relative to respondents
/// who answered that field, while multi-choice and text percentages are
/// relative to all responses (a respondent may legitimately select zero
/// boxes).
pub fn summarize(form: &FormDefinition, submissions: &[Submission]) -> Vec<FieldSummary> {
    let total = submissions.len() as u64;
    form.fields
        .iter()
        .map(|field| FieldSummary {
            field: field.clone(),
            stats: summarize_field(field, submissions, total),
        })
        .collect()
}

fn summarize_field(field: &Field, submissions: &[Submission], total: u64) -> FieldStats {
    match field.kind {
        FieldKind::SingleChoice | FieldKind::SingleSelect => {
            let answered: Vec<&AnswerValue> = submissions
                .iter()
                .filter_map(|s| s.answers.get(&field.id))
                .filter(|a| !a.is_empty())
                .collect();
            let answered_total = answered.len() as u64;
            let options = declared_options(field)
                .iter()
                .map(|option| {
                    let count = answered
                        .iter()
                        .filter(|a| matches!(a, AnswerValue::Text(t) if t == option))
                        .count() as u64;
                    OptionTally {
                        option: option.clone(),
                        count,
                        percentage: percent(count, answered_total),
                    }
                })
                .collect();
            FieldStats::Choice { options }
        }
        FieldKind::MultiChoice => {
            let options = declared_options(field)
                .iter()
                .map(|option| {
                    let count = submissions
                        .iter()
                        .filter_map(|s| s.answers.get(&field.id))
                        .filter(|a| {
                            matches!(a, AnswerValue::Selections(items) if items.iter().any(|i| i == option))
                        })
                        .count() as u64;
                    OptionTally {
                        option: option.clone(),
                        count,
                        percentage: percent(count, total),
                    }
                })
                .collect();
            FieldStats::Choice { options }
        }
        FieldKind::ShortText | FieldKind::LongText | FieldKind::Date => {
            let non_empty: Vec<String> = submissions
                .iter()
                .filter_map(|s| s.answers.get(&field.id))
                .filter(|a| !a.is_empty())
                .map(AnswerValue::as_cell)
                .collect();
            let answered = non_empty.len() as u64;
            FieldStats::Text {
                answered,
                skipped: total - answered,
                percentage_answered: percent(answered, total),
                responses: if field.kind == FieldKind::Date { Vec::new() } else { non_empty },
            }
        }
    }
}

fn declared_options(field: &Field) -> &[String] {
    field.options.as_deref().unwrap_or(&[])
}

/// Round-half-up integer percentage, 0 on a zero denominator.
fn percent(count: u64, total: u64) -> u32 {
    if total == 0 {
        0
    } else {
        ((count as f64 / total as f64) * 100.0).round() as u32
    }
}
