// src/handlers/survey.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    cascade,
    error::AppError,
    models::survey::{Survey, SurveyRequest, SurveyWithElements},
    state::AppState,
    utils::{files, html::clean_html},
};

/// Creates a survey together with its ordered element list.
/// Admin only. Validation happens before any mutation; the insert of the
/// survey row and all elements is one transaction.
pub async fn create_survey(
    State(state): State<AppState>,
    Json(payload): Json<SurveyRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    cascade::validate_references(&payload.elements)?;

    let mut tx = state.pool.begin().await?;

    let now = chrono::Utc::now();
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO surveys
        (title, description, config, prolific_enabled, prolific_completion_url,
         enable_advanced_tracking, track_copy_paste, track_tab_focus,
         track_page_duration, display_time_spent, enable_max_duration,
         max_duration_minutes, max_duration_warning_minutes, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(&payload.title)
    .bind(payload.description.as_deref().map(clean_html))
    .bind(payload.config.clone().map(sqlx::types::Json))
    .bind(payload.prolific_enabled)
    .bind(&payload.prolific_completion_url)
    .bind(payload.enable_advanced_tracking)
    .bind(payload.track_copy_paste)
    .bind(payload.track_tab_focus)
    .bind(payload.track_page_duration)
    .bind(payload.display_time_spent)
    .bind(payload.enable_max_duration)
    .bind(payload.max_duration_minutes)
    .bind(payload.max_duration_warning_minutes)
    .bind(now)
    .bind(now)
    .fetch_one(&mut *tx)
    .await?;

    let element_ids = cascade::insert_elements(&mut tx, id, &payload.elements).await?;

    tx.commit().await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id, "element_ids": element_ids })),
    ))
}

/// Lists all surveys (metadata only).
/// Admin only.
pub async fn list_surveys(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let surveys = sqlx::query_as::<_, Survey>("SELECT * FROM surveys ORDER BY id DESC")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(surveys))
}

/// Fetches one survey with its elements in display order.
/// Public: this is what the respondent frontend renders.
pub async fn get_survey(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let survey = sqlx::query_as::<_, Survey>("SELECT * FROM surveys WHERE id = ?")
        .bind(id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::NotFound("Survey not found".to_string()))?;

    let elements = sqlx::query_as::<_, crate::models::element::SurveyElement>(
        "SELECT * FROM survey_elements WHERE survey_id = ? ORDER BY page, ordering, id",
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(SurveyWithElements { survey, elements }))
}

/// Replaces a survey: metadata plus the entire element set.
/// Admin only.
///
/// DATA LOSS: if the survey already has participants, all of them and all
/// of their responses are destroyed before the new elements are inserted.
/// The response body reports the destroyed counts so the loss is explicit.
pub async fn update_survey(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<SurveyRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let outcome = cascade::replace_survey(&state.pool, id, &payload).await?;

    files::schedule_orphan_cleanup(
        state.config.upload_dir.clone(),
        outcome.orphaned_image_urls,
    );

    Ok(Json(serde_json::json!({
        "id": id,
        "element_ids": outcome.element_ids,
        "destroyed_participants": outcome.destroyed_participants,
        "destroyed_responses": outcome.destroyed_responses,
    })))
}

/// Deletes a survey and everything beneath it.
/// Admin only.
pub async fn delete_survey(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = cascade::delete_survey(&state.pool, id).await?;

    files::schedule_orphan_cleanup(
        state.config.upload_dir.clone(),
        outcome.orphaned_image_urls,
    );

    Ok(StatusCode::NO_CONTENT)
}
