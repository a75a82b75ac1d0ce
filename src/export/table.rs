// src/export/table.rs
//
// Flattens one survey's nested export into a single wide CSV table: one row
// per participant, one ten-column family per question element. The column
// plan is computed once per export from the live element list, then filled
// per row; nothing about a survey's layout is compiled in.

use std::collections::HashMap;

use crate::export::aggregate::{AnnotatedResponse, NestedExport};
use crate::models::element::SurveyElement;
use crate::utils::text::clean_text;

/// Marker emitted when a single response value cannot be encoded; the rest
/// of the export continues.
const UNENCODABLE: &str = "[unencodable]";

const PARTICIPANT_COLUMNS: [&str; 11] = [
    "participant_id",
    "prolific_pid",
    "study_id",
    "session_id",
    "start_time",
    "end_time",
    "consent_given",
    "completed",
    "is_test_run",
    "page_durations_log",
    // Reserved for per-participant randomization assignments; always empty
    // until assignment persistence lands.
    "randomization_assignment",
];

const FAMILY_SUFFIXES: [&str; 10] = [
    "question_text",
    "question_type",
    "task_identifier",
    "randomization_group",
    "llm_assist_enabled",
    "answer",
    "displayed_position",
    "paste_count",
    "focus_lost_count",
    "chat_history",
];

/// The per-export schema: header row plus the question elements backing
/// each column family, in display order.
struct ColumnPlan<'a> {
    headers: Vec<String>,
    questions: Vec<&'a SurveyElement>,
}

fn build_column_plan(elements: &[SurveyElement]) -> ColumnPlan<'_> {
    let questions: Vec<&SurveyElement> = elements
        .iter()
        .filter(|e| e.element_type == "question")
        .collect();

    let mut headers: Vec<String> = PARTICIPANT_COLUMNS
        .iter()
        .map(|c| c.to_string())
        .collect();

    for question in &questions {
        for suffix in FAMILY_SUFFIXES {
            headers.push(format!("q{}_{}", question.id, suffix));
        }
    }

    headers.push("total_paste_count".to_string());
    headers.push("total_focus_lost_count".to_string());

    ColumnPlan { headers, questions }
}

/// Projects the nested export to CSV text, headers first, one pass. The
/// whole body is the atomic unit; no incremental delivery.
pub fn project_to_csv(export: &NestedExport) -> String {
    let plan = build_column_plan(&export.elements);

    let mut out = String::new();
    write_record(&mut out, plan.headers.iter().map(|h| h.as_str()));

    for participant_export in &export.participants {
        let p = &participant_export.participant;

        // Last write wins if a participant somehow answered twice.
        let by_element: HashMap<i64, &AnnotatedResponse> = participant_export
            .responses
            .iter()
            .map(|r| (r.response.survey_element_id, r))
            .collect();

        let mut row: Vec<String> = Vec::with_capacity(plan.headers.len());
        row.push(p.id.to_string());
        row.push(p.prolific_pid.clone().unwrap_or_default());
        row.push(p.study_id.clone().unwrap_or_default());
        row.push(p.session_id.clone().unwrap_or_default());
        row.push(p.start_time.to_rfc3339());
        row.push(p.end_time.map(|t| t.to_rfc3339()).unwrap_or_default());
        row.push(p.consent_given.to_string());
        row.push(p.completed.to_string());
        row.push(p.is_test_run.to_string());
        row.push(
            p.page_durations_log
                .as_ref()
                .map(|log| serde_json::to_string(&log.0).unwrap_or_else(|_| UNENCODABLE.into()))
                .unwrap_or_default(),
        );
        row.push(String::new()); // randomization_assignment

        let mut total_paste = 0i64;
        let mut total_focus_lost = 0i64;

        for question in &plan.questions {
            match by_element.get(&question.id) {
                Some(annotated) => {
                    total_paste += annotated.response.paste_count;
                    total_focus_lost += annotated.response.focus_lost_count;
                    fill_family(&mut row, question, annotated);
                }
                // Non-response is a valid terminal state (skipped optional
                // question, abandoned survey): the whole family stays empty.
                None => row.extend(std::iter::repeat_n(String::new(), FAMILY_SUFFIXES.len())),
            }
        }

        row.push(total_paste.to_string());
        row.push(total_focus_lost.to_string());

        write_record(&mut out, row.iter().map(|f| f.as_str()));
    }

    out
}

fn fill_family(row: &mut Vec<String>, question: &SurveyElement, annotated: &AnnotatedResponse) {
    let r = &annotated.response;

    row.push(clean_text(question.question_text.as_deref().unwrap_or("")));
    row.push(question.question_type.clone().unwrap_or_default());
    row.push(question.task_identifier.clone().unwrap_or_default());
    row.push(question.randomization_group.clone().unwrap_or_default());
    row.push(question.llm_assistance_enabled.to_string());

    // JSON keeps the original type distinction: numbers, strings, lists and
    // booleans all round-trip through the cell text.
    row.push(match &r.response_value {
        Some(value) => {
            serde_json::to_string(&value.0).unwrap_or_else(|_| UNENCODABLE.to_string())
        }
        None => "null".to_string(),
    });

    row.push(match (r.displayed_page, r.displayed_ordering) {
        (Some(page), Some(ordering)) => format!("{}:{}", page, ordering),
        _ => String::new(),
    });

    row.push(r.paste_count.to_string());
    row.push(r.focus_lost_count.to_string());

    row.push(match &r.llm_chat_history {
        Some(history) => {
            serde_json::to_string(&history.0).unwrap_or_else(|_| UNENCODABLE.to_string())
        }
        None => String::new(),
    });
}

fn write_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        first = false;
        push_escaped(out, field);
    }
    out.push_str("\r\n");
}

/// RFC 4180 quoting: fields containing a comma, quote or line break are
/// wrapped in quotes with inner quotes doubled.
fn push_escaped(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        for c in field.chars() {
            if c == '"' {
                out.push('"');
            }
            out.push(c);
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
}
