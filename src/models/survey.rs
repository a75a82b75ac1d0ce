// src/models/survey.rs

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

use crate::models::element::{ElementSpec, SurveyElement};

/// Represents the 'surveys' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Survey {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,

    /// Structured randomization configuration, stored as JSON.
    pub config: Option<sqlx::types::Json<serde_json::Value>>,

    pub prolific_enabled: bool,
    pub prolific_completion_url: Option<String>,

    /// Global switch for the behavioral tracking options below.
    pub enable_advanced_tracking: bool,
    pub track_copy_paste: bool,
    pub track_tab_focus: bool,
    pub track_page_duration: bool,
    pub display_time_spent: bool,

    pub enable_max_duration: bool,
    pub max_duration_minutes: Option<i64>,
    pub max_duration_warning_minutes: Option<i64>,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a survey together with its ordered element list.
///
/// Also used for `PUT /api/admin/surveys/{id}`, where the element list
/// REPLACES the existing one. Replacing elements destroys all participants
/// and responses already collected for the survey (the instrument and its
/// data are versioned together).
#[derive(Debug, Deserialize, Validate)]
pub struct SurveyRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(max = 10000))]
    pub description: Option<String>,
    pub config: Option<serde_json::Value>,

    #[serde(default)]
    pub prolific_enabled: bool,
    pub prolific_completion_url: Option<String>,

    #[serde(default)]
    pub enable_advanced_tracking: bool,
    #[serde(default)]
    pub track_copy_paste: bool,
    #[serde(default)]
    pub track_tab_focus: bool,
    #[serde(default)]
    pub track_page_duration: bool,
    #[serde(default)]
    pub display_time_spent: bool,

    #[serde(default)]
    pub enable_max_duration: bool,
    pub max_duration_minutes: Option<i64>,
    pub max_duration_warning_minutes: Option<i64>,

    #[serde(default)]
    #[validate(nested)]
    pub elements: Vec<ElementSpec>,
}

/// Survey with its elements in display order, as served to respondents
/// and to the authoring UI.
#[derive(Debug, Serialize)]
pub struct SurveyWithElements {
    #[serde(flatten)]
    pub survey: Survey,
    pub elements: Vec<SurveyElement>,
}
