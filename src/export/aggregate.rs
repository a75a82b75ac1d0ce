// src/export/aggregate.rs
//
// Read-only projections of one survey (or the whole store) into the two
// export shapes. No mutation, no transaction: a single consistent read.

use std::collections::HashMap;

use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{
        element::SurveyElement, participant::SurveyParticipant, response::Response,
        survey::Survey,
    },
};

/// Placeholder for annotation fields whose element no longer exists.
pub const NOT_AVAILABLE: &str = "[not available]";

/// Flat shape: four independent entity lists, no cross-referencing. Exists
/// for full-fidelity backup/import round-tripping; consumers join by id.
#[derive(Debug, Serialize)]
pub struct FlatExport {
    pub surveys: Vec<Survey>,
    pub elements: Vec<SurveyElement>,
    pub participants: Vec<SurveyParticipant>,
    pub responses: Vec<Response>,
}

/// A response annotated with the CURRENT metadata of the element it
/// references. If that element has been deleted, the text fields degrade to
/// [`NOT_AVAILABLE`] and the optional fields to None; the response itself
/// always survives.
#[derive(Debug, Serialize)]
pub struct AnnotatedResponse {
    #[serde(flatten)]
    pub response: Response,
    pub question_text: String,
    pub question_type: String,
    pub task_identifier: Option<String>,
    pub references_element_id: Option<i64>,
    pub randomization_group: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ParticipantExport {
    #[serde(flatten)]
    pub participant: SurveyParticipant,
    pub responses: Vec<AnnotatedResponse>,
}

/// Nested shape: one survey-rooted tree. Elements in display order,
/// participants most-recent-start-first.
#[derive(Debug, Serialize)]
pub struct NestedExport {
    #[serde(flatten)]
    pub survey: Survey,
    pub elements: Vec<SurveyElement>,
    pub participants: Vec<ParticipantExport>,
}

/// Flat export. `survey_id = None` exports the entire store (backup scope);
/// with a survey id, only that survey's records are included.
pub async fn aggregate_flat(
    pool: &SqlitePool,
    survey_id: Option<i64>,
) -> Result<FlatExport, AppError> {
    match survey_id {
        None => {
            let surveys = sqlx::query_as::<_, Survey>("SELECT * FROM surveys ORDER BY id")
                .fetch_all(pool)
                .await?;
            let elements =
                sqlx::query_as::<_, SurveyElement>("SELECT * FROM survey_elements ORDER BY id")
                    .fetch_all(pool)
                    .await?;
            let participants = sqlx::query_as::<_, SurveyParticipant>(
                "SELECT * FROM survey_participants ORDER BY id",
            )
            .fetch_all(pool)
            .await?;
            let responses = sqlx::query_as::<_, Response>("SELECT * FROM responses ORDER BY id")
                .fetch_all(pool)
                .await?;

            Ok(FlatExport {
                surveys,
                elements,
                participants,
                responses,
            })
        }
        Some(id) => {
            let survey = sqlx::query_as::<_, Survey>("SELECT * FROM surveys WHERE id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?
                .ok_or(AppError::NotFound("Survey not found".to_string()))?;

            let elements = sqlx::query_as::<_, SurveyElement>(
                "SELECT * FROM survey_elements WHERE survey_id = ? ORDER BY id",
            )
            .bind(id)
            .fetch_all(pool)
            .await?;

            let participants = sqlx::query_as::<_, SurveyParticipant>(
                "SELECT * FROM survey_participants WHERE survey_id = ? ORDER BY id",
            )
            .bind(id)
            .fetch_all(pool)
            .await?;

            let responses = sqlx::query_as::<_, Response>(
                r#"
                SELECT * FROM responses
                WHERE participant_id IN
                    (SELECT id FROM survey_participants WHERE survey_id = ?)
                ORDER BY id
                "#,
            )
            .bind(id)
            .fetch_all(pool)
            .await?;

            Ok(FlatExport {
                surveys: vec![survey],
                elements,
                participants,
                responses,
            })
        }
    }
}

/// Nested export of one survey.
///
/// Element metadata for annotation is looked up against the elements loaded
/// here, never re-queried per response. Responses keep insertion order; the
/// position actually shown is already captured per-response.
pub async fn aggregate_nested(
    pool: &SqlitePool,
    survey_id: i64,
) -> Result<NestedExport, AppError> {
    let survey = sqlx::query_as::<_, Survey>("SELECT * FROM surveys WHERE id = ?")
        .bind(survey_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Survey not found".to_string()))?;

    // Display order; trailing id keeps duplicate (page, ordering) pairs in
    // stable insertion order instead of rejecting them.
    let elements = sqlx::query_as::<_, SurveyElement>(
        "SELECT * FROM survey_elements WHERE survey_id = ? ORDER BY page, ordering, id",
    )
    .bind(survey_id)
    .fetch_all(pool)
    .await?;

    let participants = sqlx::query_as::<_, SurveyParticipant>(
        "SELECT * FROM survey_participants WHERE survey_id = ? ORDER BY start_time DESC, id DESC",
    )
    .bind(survey_id)
    .fetch_all(pool)
    .await?;

    let responses = sqlx::query_as::<_, Response>(
        r#"
        SELECT * FROM responses
        WHERE participant_id IN
            (SELECT id FROM survey_participants WHERE survey_id = ?)
        ORDER BY id
        "#,
    )
    .bind(survey_id)
    .fetch_all(pool)
    .await?;

    let by_id: HashMap<i64, &SurveyElement> = elements.iter().map(|e| (e.id, e)).collect();

    let mut grouped: HashMap<i64, Vec<AnnotatedResponse>> = HashMap::new();
    for response in responses {
        let annotated = annotate(response, &by_id);
        grouped
            .entry(annotated.response.participant_id)
            .or_default()
            .push(annotated);
    }

    let participants = participants
        .into_iter()
        .map(|participant| {
            let responses = grouped.remove(&participant.id).unwrap_or_default();
            ParticipantExport {
                participant,
                responses,
            }
        })
        .collect();

    Ok(NestedExport {
        survey,
        elements,
        participants,
    })
}

fn annotate(response: Response, by_id: &HashMap<i64, &SurveyElement>) -> AnnotatedResponse {
    match by_id.get(&response.survey_element_id) {
        Some(element) => AnnotatedResponse {
            question_text: element
                .question_text
                .clone()
                .unwrap_or_default(),
            question_type: element.question_type.clone().unwrap_or_default(),
            task_identifier: element.task_identifier.clone(),
            references_element_id: element.references_element_id,
            randomization_group: element.randomization_group.clone(),
            response,
        },
        // Element deleted after the response was recorded: annotate with
        // explicit placeholders, never fail the aggregation.
        None => AnnotatedResponse {
            question_text: NOT_AVAILABLE.to_string(),
            question_type: NOT_AVAILABLE.to_string(),
            task_identifier: None,
            references_element_id: None,
            randomization_group: None,
            response,
        },
    }
}
