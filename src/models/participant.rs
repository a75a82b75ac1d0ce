// src/models/participant.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

/// Represents the 'survey_participants' table in the database.
///
/// Created once, atomically, at submission time; never edited. Only ever
/// bulk-deleted as a side effect of survey replacement or removal.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct SurveyParticipant {
    pub id: i64,
    pub survey_id: i64,

    // Prolific panel integration.
    pub prolific_pid: Option<String>,
    pub study_id: Option<String>,
    pub session_id: Option<String>,

    pub consent_given: bool,
    pub completed: bool,

    pub start_time: chrono::DateTime<chrono::Utc>,
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,

    /// Milliseconds spent per page, e.g. {"1": 30500, "2": 45200}.
    pub page_durations_log: Option<sqlx::types::Json<HashMap<String, i64>>>,

    /// Test runs stay in the data set; exclusion is an analysis convention,
    /// not a query filter.
    pub is_test_run: bool,
}
