// src/models/response.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// One message of an LLM-assisted chat transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// 'user' or 'assistant'.
    pub role: String,
    pub content: String,
}

/// Represents the 'responses' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Response {
    pub id: i64,
    pub participant_id: i64,

    /// Non-owning back-reference, used only for annotation during export.
    /// The element may have been deleted since; the response survives.
    pub survey_element_id: i64,

    /// Answer as JSON: string, list of strings, number, bool, or null.
    pub response_value: Option<sqlx::types::Json<serde_json::Value>>,

    pub llm_chat_history: Option<sqlx::types::Json<Vec<ChatMessage>>>,

    pub paste_count: i64,
    pub focus_lost_count: i64,

    /// Position actually shown to this participant at response time. A
    /// snapshot, not a live join: it may differ from the element's current
    /// (page, ordering) if the survey was edited afterwards.
    pub displayed_page: Option<i64>,
    pub displayed_ordering: Option<i64>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// One answer inside a submission payload.
#[derive(Debug, Deserialize, Validate)]
pub struct AnswerCreate {
    pub element_id: i64,
    pub value: Option<serde_json::Value>,
    pub llm_chat_history: Option<Vec<ChatMessage>>,
    #[serde(default)]
    pub paste_count: i64,
    #[serde(default)]
    pub focus_lost_count: i64,
    pub displayed_page: Option<i64>,
    pub displayed_ordering: Option<i64>,
}

/// DTO for a respondent submitting their results: one participant plus all
/// of their answers, stored atomically.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmissionRequest {
    #[validate(length(max = 64))]
    pub prolific_pid: Option<String>,
    #[validate(length(max = 64))]
    pub study_id: Option<String>,
    #[validate(length(max = 64))]
    pub session_id: Option<String>,

    pub consent_given: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub is_test_run: bool,

    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    pub page_durations_log: Option<HashMap<String, i64>>,

    #[validate(nested)]
    pub answers: Vec<AnswerCreate>,
}
