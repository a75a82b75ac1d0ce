// src/handlers/results.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
};
use serde::Deserialize;

use crate::{
    error::AppError,
    export::{self, ExportShape, SurveyExport},
    state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct ResultsQuery {
    pub shape: Option<ExportShape>,
}

/// Returns one survey's collected results.
/// Admin only. `?shape=flat` gives the four raw entity lists (backup
/// fidelity); `?shape=nested` (default) gives the survey-rooted tree with
/// element-annotated responses.
pub async fn get_results(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ResultsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let export = match query.shape.unwrap_or(ExportShape::Nested) {
        ExportShape::Flat => {
            SurveyExport::Flat(export::aggregate::aggregate_flat(&state.pool, Some(id)).await?)
        }
        ExportShape::Nested => {
            SurveyExport::Nested(export::aggregate::aggregate_nested(&state.pool, id).await?)
        }
    };

    Ok(Json(export))
}

/// Full-store flat export across all surveys, for backups.
/// Admin only.
pub async fn export_all(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let export = export::aggregate::aggregate_flat(&state.pool, None).await?;
    Ok(Json(export))
}

/// Downloads one survey's results as a wide CSV table, one row per
/// participant. Admin only. The whole body is built in one pass; a client
/// disconnecting mid-download has nothing to roll back.
pub async fn export_csv(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let nested = export::aggregate::aggregate_nested(&state.pool, id).await?;
    let csv = export::table::project_to_csv(&nested);

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"survey_{}_results.csv\"", id),
            ),
        ],
        csv,
    ))
}
