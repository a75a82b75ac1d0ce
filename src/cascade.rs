// src/cascade.rs
//
// Structural changes to a survey's element set. Everything here runs inside
// one transaction and follows a fixed dependency order so that no foreign
// reference ever points at a deleted row, not even mid-sequence:
//
//   responses -> participants -> break element self-references -> elements
//
// Replacing elements destroys all participants and responses collected for
// the survey. That is the documented contract, not an accident: a survey
// instrument and its collected data are versioned together, and responses
// keyed to deleted elements would be meaningless.

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::{
    error::AppError,
    models::{element::ElementSpec, survey::SurveyRequest},
    utils::html::clean_html,
};

/// What a replace operation did, surfaced to the caller so data loss is
/// never silent.
#[derive(Debug)]
pub struct ReplaceOutcome {
    pub element_ids: Vec<i64>,
    pub destroyed_participants: u64,
    pub destroyed_responses: u64,
    /// Uploaded images of the deleted elements; handed to the background
    /// orphan cleanup after commit.
    pub orphaned_image_urls: Vec<String>,
}

/// What a delete-survey operation removed.
#[derive(Debug)]
pub struct DeleteOutcome {
    pub orphaned_image_urls: Vec<String>,
}

/// Checks the intra-payload reference indices before any mutation begins.
/// `references_element_index` is the zero-based position of another element
/// in the same payload; out-of-range or self-pointing indices are rejected.
pub fn validate_references(specs: &[ElementSpec]) -> Result<(), AppError> {
    for (i, spec) in specs.iter().enumerate() {
        if let Some(idx) = spec.references_element_index {
            if idx < 0 || idx as usize >= specs.len() {
                return Err(AppError::BadRequest(format!(
                    "Element {} references index {} which is out of range",
                    i, idx
                )));
            }
            if idx as usize == i {
                return Err(AppError::BadRequest(format!(
                    "Element {} cannot reference itself",
                    i
                )));
            }
        }
    }
    Ok(())
}

/// Inserts a fresh element list for `survey_id`, preserving caller order.
///
/// Two passes: rows are inserted with `references_element_id` NULL, then the
/// payload indices are remapped to the freshly assigned row ids. Returns the
/// new ids in payload order.
pub async fn insert_elements(
    tx: &mut Transaction<'_, Sqlite>,
    survey_id: i64,
    specs: &[ElementSpec],
) -> Result<Vec<i64>, AppError> {
    let mut new_ids = Vec::with_capacity(specs.len());

    for spec in specs {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO survey_elements
            (survey_id, element_type, question_type, question_text, options,
             page, ordering, image_url, required, paste_disabled,
             allow_back_navigation, llm_assistance_enabled, maxlength,
             max_duration_seconds, randomization_group, task_identifier,
             references_element_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL)
            RETURNING id
            "#,
        )
        .bind(survey_id)
        .bind(&spec.element_type)
        .bind(&spec.question_type)
        .bind(spec.question_text.as_deref().map(clean_html))
        .bind(spec.options.clone().map(sqlx::types::Json))
        .bind(spec.page)
        .bind(spec.ordering)
        .bind(&spec.image_url)
        .bind(spec.required)
        .bind(spec.paste_disabled)
        .bind(spec.allow_back_navigation)
        .bind(spec.llm_assistance_enabled)
        .bind(spec.maxlength)
        .bind(spec.max_duration_seconds)
        .bind(&spec.randomization_group)
        .bind(&spec.task_identifier)
        .fetch_one(&mut **tx)
        .await?;

        new_ids.push(id);
    }

    for (i, spec) in specs.iter().enumerate() {
        if let Some(idx) = spec.references_element_index {
            sqlx::query("UPDATE survey_elements SET references_element_id = ? WHERE id = ?")
                .bind(new_ids[idx as usize])
                .bind(new_ids[i])
                .execute(&mut **tx)
                .await?;
        }
    }

    Ok(new_ids)
}

/// Deletes everything hanging off the survey, in dependency order, within
/// the caller's transaction. Does NOT touch the survey row itself.
///
/// Self-references are nulled out before the element rows are deleted;
/// relying on the store to resolve deletion order for a self-referencing
/// foreign key is exactly the failure mode this module exists to prevent.
async fn cascade_children(
    tx: &mut Transaction<'_, Sqlite>,
    survey_id: i64,
) -> Result<(u64, u64, Vec<String>), AppError> {
    let orphaned_image_urls: Vec<String> = sqlx::query_scalar(
        "SELECT image_url FROM survey_elements WHERE survey_id = ? AND image_url IS NOT NULL",
    )
    .bind(survey_id)
    .fetch_all(&mut **tx)
    .await?;

    let destroyed_responses = sqlx::query(
        r#"
        DELETE FROM responses
        WHERE participant_id IN
            (SELECT id FROM survey_participants WHERE survey_id = ?)
        "#,
    )
    .bind(survey_id)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    let destroyed_participants =
        sqlx::query("DELETE FROM survey_participants WHERE survey_id = ?")
            .bind(survey_id)
            .execute(&mut **tx)
            .await?
            .rows_affected();

    // Break self-references first. Elements only ever reference elements of
    // their own survey, so clearing by survey scope covers every back-edge.
    sqlx::query("UPDATE survey_elements SET references_element_id = NULL WHERE survey_id = ?")
        .bind(survey_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM survey_elements WHERE survey_id = ?")
        .bind(survey_id)
        .execute(&mut **tx)
        .await?;

    Ok((destroyed_responses, destroyed_participants, orphaned_image_urls))
}

/// Replaces the survey in place: metadata update plus full element-set
/// replacement, one transaction.
///
/// Destroys all participants and responses for the survey before inserting
/// the new elements; the counts in the outcome let the handler surface the
/// data loss. Atomic: any failure rolls the store back to its prior state.
/// Concurrent replaces of the same survey serialize on the store's
/// single-writer transaction; last committed writer wins.
pub async fn replace_survey(
    pool: &SqlitePool,
    survey_id: i64,
    req: &SurveyRequest,
) -> Result<ReplaceOutcome, AppError> {
    validate_references(&req.elements)?;

    let mut tx = pool.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM surveys WHERE id = ?")
        .bind(survey_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Survey not found".to_string()));
    }

    sqlx::query(
        r#"
        UPDATE surveys SET
            title = ?, description = ?, config = ?,
            prolific_enabled = ?, prolific_completion_url = ?,
            enable_advanced_tracking = ?, track_copy_paste = ?,
            track_tab_focus = ?, track_page_duration = ?,
            display_time_spent = ?, enable_max_duration = ?,
            max_duration_minutes = ?, max_duration_warning_minutes = ?,
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.title)
    .bind(req.description.as_deref().map(clean_html))
    .bind(req.config.clone().map(sqlx::types::Json))
    .bind(req.prolific_enabled)
    .bind(&req.prolific_completion_url)
    .bind(req.enable_advanced_tracking)
    .bind(req.track_copy_paste)
    .bind(req.track_tab_focus)
    .bind(req.track_page_duration)
    .bind(req.display_time_spent)
    .bind(req.enable_max_duration)
    .bind(req.max_duration_minutes)
    .bind(req.max_duration_warning_minutes)
    .bind(chrono::Utc::now())
    .bind(survey_id)
    .execute(&mut *tx)
    .await?;

    let (destroyed_responses, destroyed_participants, orphaned_image_urls) =
        cascade_children(&mut tx, survey_id).await?;

    let element_ids = insert_elements(&mut tx, survey_id, &req.elements).await?;

    tx.commit().await?;

    if destroyed_participants > 0 {
        tracing::warn!(
            "Replaced elements of survey {}: destroyed {} participants and {} responses",
            survey_id,
            destroyed_participants,
            destroyed_responses
        );
    }

    Ok(ReplaceOutcome {
        element_ids,
        destroyed_participants,
        destroyed_responses,
        orphaned_image_urls,
    })
}

/// Deletes the survey and everything beneath it, in dependency order,
/// atomically. NotFound if the survey does not exist.
pub async fn delete_survey(
    pool: &SqlitePool,
    survey_id: i64,
) -> Result<DeleteOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM surveys WHERE id = ?")
        .bind(survey_id)
        .fetch_optional(&mut *tx)
        .await?;
    if exists.is_none() {
        return Err(AppError::NotFound("Survey not found".to_string()));
    }

    let (_, _, orphaned_image_urls) = cascade_children(&mut tx, survey_id).await?;

    sqlx::query("DELETE FROM surveys WHERE id = ?")
        .bind(survey_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(DeleteOutcome { orphaned_image_urls })
}
