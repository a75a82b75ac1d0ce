// src/handlers/submission.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{error::AppError, models::response::SubmissionRequest, state::AppState};

/// Stores a respondent's submission: one participant row plus all of their
/// responses, atomically. Public endpoint; participants are created once
/// and never edited afterwards.
pub async fn submit_results(
    State(state): State<AppState>,
    Path(survey_id): Path<i64>,
    Json(payload): Json<SubmissionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mut tx = state.pool.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM surveys WHERE id = ?")
        .bind(survey_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Survey not found".to_string()));
    }

    let participant_id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO survey_participants
        (survey_id, prolific_pid, study_id, session_id, consent_given,
         completed, start_time, end_time, page_durations_log, is_test_run)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(survey_id)
    .bind(&payload.prolific_pid)
    .bind(&payload.study_id)
    .bind(&payload.session_id)
    .bind(payload.consent_given)
    .bind(payload.completed)
    .bind(chrono::Utc::now())
    .bind(payload.end_time)
    .bind(payload.page_durations_log.clone().map(sqlx::types::Json))
    .bind(payload.is_test_run)
    .fetch_one(&mut *tx)
    .await?;

    for answer in &payload.answers {
        sqlx::query(
            r#"
            INSERT INTO responses
            (participant_id, survey_element_id, response_value, llm_chat_history,
             paste_count, focus_lost_count, displayed_page, displayed_ordering,
             created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(participant_id)
        .bind(answer.element_id)
        .bind(answer.value.clone().map(sqlx::types::Json))
        .bind(answer.llm_chat_history.clone().map(sqlx::types::Json))
        .bind(answer.paste_count)
        .bind(answer.focus_lost_count)
        .bind(answer.displayed_page)
        .bind(answer.displayed_ordering)
        .bind(chrono::Utc::now())
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "participant_id": participant_id,
            "message": "Results stored successfully"
        })),
    ))
}
