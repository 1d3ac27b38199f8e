//! Tabular CSV export of a form's responses.
//!
//! One row per response, one column per field in field order, after three
//! fixed leading columns. Pure over its inputs, like [`crate::summary`].

use crate::forms::FormDefinition;
use crate::submissions::SubmissionView;

/// Fixed leading columns of every export.
pub const LEAD_COLUMNS: [&str; 3] = ["Respondent Name", "Respondent ID", "Submitted At"];

/// Download filename derived from the form title.
pub fn export_filename(title: &str) -> String {
    format!("{title} - Responses.csv")
}

/// Build the export table: header row first, then one row per response.
/// Multi-choice answers are joined with `", "`; missing answers become
/// empty cells; timestamps are RFC 3339.
pub fn export_rows(form: &FormDefinition, responses: &[SubmissionView]) -> Vec<Vec<String>> {
    let mut header: Vec<String> = LEAD_COLUMNS.iter().map(|s| s.to_string()).collect();
    header.extend(form.fields.iter().map(|f| f.label.clone()));

    let mut rows = Vec::with_capacity(responses.len() + 1);
    rows.push(header);
    for view in responses {
        let mut row = vec![
            view.respondent_name.clone(),
            view.student_id.clone(),
            view.submission.submitted_at.to_rfc3339(),
        ];
        for field in &form.fields {
            row.push(
                view.submission
                    .answers
                    .get(&field.id)
                    .map(|a| a.as_cell())
                    .unwrap_or_default(),
            );
        }
        rows.push(row);
    }
    rows
}

/// Encode the export table as CSV text.
pub fn export_csv(form: &FormDefinition, responses: &[SubmissionView]) -> String {
    let rows = export_rows(form, responses);
    let mut out = String::new();
    for row in rows {
        let encoded: Vec<String> = row.iter().map(|cell| quote(cell)).collect();
        out.push_str(&encoded.join(","));
        out.push('\n');
    }
    out
}

// RFC 4180: quote cells containing the delimiter, quotes, or line breaks;
// double any embedded quotes.
fn quote(cell: &str) -> String {
    if cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r') {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forms::FormKind;
    use crate::schema::{AnswerMap, AnswerValue, Field, FieldKind};
    use crate::submissions::Submission;
    use chrono::Utc;
    use uuid::Uuid;

    fn comment_form() -> FormDefinition {
        FormDefinition {
            id: Uuid::new_v4(),
            title: "Course feedback".into(),
            description: None,
            form_kind: FormKind::Form,
            published: true,
            created_by: "admin-1".into(),
            created_at: Utc::now(),
            fields: vec![Field {
                id: "q1".into(),
                kind: FieldKind::ShortText,
                label: "Comment".into(),
                required: false,
                options: None,
                placeholder: None,
            }],
        }
    }

    fn view(form: &FormDefinition, name: &str, student: &str, answers: AnswerMap) -> SubmissionView {
        SubmissionView {
            submission: Submission {
                id: Uuid::new_v4(),
                form_id: form.id,
                respondent_id: student.to_lowercase(),
                submitted_at: Utc::now(),
                answers,
            },
            respondent_name: name.into(),
            student_id: student.into(),
        }
    }

    #[test]
    fn header_and_missing_answers() {
        let form = comment_form();
        let mut answers = AnswerMap::new();
        answers.insert("q1".into(), AnswerValue::Text("Hi".into()));
        let views = vec![
            view(&form, "Ada Lovelace", "S-100", answers),
            view(&form, "Alan Turing", "S-200", AnswerMap::new()),
        ];

        let rows = export_rows(&form, &views);
        assert_eq!(
            rows[0],
            vec!["Respondent Name", "Respondent ID", "Submitted At", "Comment"]
        );
        assert_eq!(rows[1][0], "Ada Lovelace");
        assert_eq!(rows[1][3], "Hi");
        assert_eq!(rows[2][3], "");
    }

    #[test]
    fn multi_choice_cells_join_with_separator() {
        let mut form = comment_form();
        form.fields = vec![Field {
            id: "q1".into(),
            kind: FieldKind::MultiChoice,
            label: "Days".into(),
            required: false,
            options: Some(vec!["Mon".into(), "Wed".into(), "Fri".into()]),
            placeholder: None,
        }];
        let mut answers = AnswerMap::new();
        answers.insert(
            "q1".into(),
            AnswerValue::Selections(vec!["Mon".into(), "Fri".into()]),
        );
        let views = vec![view(&form, "Ada Lovelace", "S-100", answers)];

        let rows = export_rows(&form, &views);
        assert_eq!(rows[1][3], "Mon, Fri");
        // The joined cell contains the delimiter, so the CSV form is quoted.
        let csv = export_csv(&form, &views);
        assert!(csv.contains("\"Mon, Fri\""));
    }

    #[test]
    fn embedded_quotes_and_newlines_are_escaped() {
        let form = comment_form();
        let mut answers = AnswerMap::new();
        answers.insert(
            "q1".into(),
            AnswerValue::Text("she said \"hi\"\nand left".into()),
        );
        let views = vec![view(&form, "Ada Lovelace", "S-100", answers)];

        let csv = export_csv(&form, &views);
        assert!(csv.contains("\"she said \"\"hi\"\"\nand left\""));
    }

    #[test]
    fn export_is_deterministic() {
        let form = comment_form();
        let mut answers = AnswerMap::new();
        answers.insert("q1".into(), AnswerValue::Text("same".into()));
        let views = vec![view(&form, "Ada Lovelace", "S-100", answers)];
        assert_eq!(export_csv(&form, &views), export_csv(&form, &views));
    }

    #[test]
    fn filename_derives_from_title() {
        assert_eq!(
            export_filename("Course feedback"),
            "Course feedback - Responses.csv"
        );
    }
}
