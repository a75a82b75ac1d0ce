// src/routes.rs

use axum::{
    Router, http::Method, middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{results, submission, survey},
    state::AppState,
    utils::auth::admin_middleware,
};

/// Assembles the main application router.
///
/// * Public routes: fetch a survey, submit results.
/// * Admin routes: survey authoring and results export, guarded by the
///   static bearer token.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let public_routes = Router::new()
        .route("/surveys/{id}", get(survey::get_survey))
        .route("/surveys/{id}/results", post(submission::submit_results));

    let admin_routes = Router::new()
        .route("/surveys", get(survey::list_surveys).post(survey::create_survey))
        .route(
            "/surveys/{id}",
            put(survey::update_survey).delete(survey::delete_survey),
        )
        .route("/surveys/{id}/results", get(results::get_results))
        .route("/surveys/{id}/results/csv", get(results::export_csv))
        .route("/export", get(results::export_all))
        .layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    Router::new()
        .nest("/api", public_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
