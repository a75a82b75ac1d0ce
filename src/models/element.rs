// src/models/element.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// Represents the 'survey_elements' table in the database.
///
/// One unit of survey content. `element_type` is 'info', 'consent' or
/// 'question'; only questions carry a `question_type` ('shorttext',
/// 'single_choice', 'multi_choice', 'likert', ...).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SurveyElement {
    pub id: i64,
    pub survey_id: i64,
    pub element_type: String,
    pub question_type: Option<String>,
    pub question_text: Option<String>,

    /// Answer options as JSON (shape depends on question_type).
    pub options: Option<sqlx::types::Json<serde_json::Value>>,

    /// Display position. Sorting is by (page, ordering), ascending, stable
    /// on ties; duplicate pairs within one survey are tolerated.
    pub page: i64,
    pub ordering: i64,

    pub image_url: Option<String>,
    pub required: bool,
    pub paste_disabled: bool,
    pub allow_back_navigation: bool,
    pub llm_assistance_enabled: bool,
    pub maxlength: Option<i64>,
    pub max_duration_seconds: Option<i64>,
    pub randomization_group: Option<String>,

    /// Groups elements into a logical task (e.g. stimulus + follow-up).
    pub task_identifier: Option<String>,

    /// Same-survey self-reference. Must be nulled out before the referenced
    /// row is deleted; the cascade module owns that ordering.
    pub references_element_id: Option<i64>,
}

/// DTO for one element inside a create/replace survey payload.
///
/// `references_element_index` points at another element by its zero-based
/// position IN THIS PAYLOAD; row ids are assigned at insert time and the
/// index is remapped to the new id afterwards. Payloads cannot reference
/// elements of a previous survey version.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = validate_element_kind))]
pub struct ElementSpec {
    #[validate(length(min = 1, max = 50))]
    pub element_type: String,
    #[validate(length(min = 1, max = 50))]
    pub question_type: Option<String>,
    #[validate(length(max = 10000))]
    pub question_text: Option<String>,
    pub options: Option<serde_json::Value>,

    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default)]
    pub ordering: i64,

    pub image_url: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub paste_disabled: bool,
    #[serde(default = "default_true")]
    pub allow_back_navigation: bool,
    #[serde(default)]
    pub llm_assistance_enabled: bool,
    pub maxlength: Option<i64>,
    pub max_duration_seconds: Option<i64>,
    pub randomization_group: Option<String>,
    pub task_identifier: Option<String>,

    pub references_element_index: Option<i64>,
}

fn default_page() -> i64 {
    1
}

fn default_true() -> bool {
    true
}

/// A 'question' element without a question subtype cannot be rendered or
/// exported; reject it before any mutation happens.
fn validate_element_kind(spec: &ElementSpec) -> Result<(), validator::ValidationError> {
    if spec.element_type == "question" && spec.question_type.is_none() {
        return Err(validator::ValidationError::new(
            "question_element_requires_question_type",
        ));
    }
    Ok(())
}
