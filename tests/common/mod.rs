// tests/common/mod.rs

use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use survey_backend::{config::Config, routes, state::AppState};

pub const ADMIN_TOKEN: &str = "test-admin-token";

/// Spawns the app on a random port against a fresh in-memory SQLite
/// database. Returns the base URL and the pool for direct assertions.
pub async fn spawn_app() -> (String, SqlitePool) {
    // One connection: every handle sees the same in-memory database.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        admin_token: ADMIN_TOKEN.to_string(),
        upload_dir: std::env::temp_dir().to_string_lossy().to_string(),
        rust_log: "error".to_string(),
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

/// A minimal question element payload at the given position.
pub fn question(text: &str, page: i64, ordering: i64) -> serde_json::Value {
    serde_json::json!({
        "element_type": "question",
        "question_type": "shorttext",
        "question_text": text,
        "page": page,
        "ordering": ordering
    })
}

/// A survey create/replace payload with the given elements.
pub fn survey_payload(title: &str, elements: Vec<serde_json::Value>) -> serde_json::Value {
    serde_json::json!({
        "title": title,
        "enable_advanced_tracking": true,
        "track_copy_paste": true,
        "track_tab_focus": true,
        "elements": elements
    })
}

/// Creates a survey through the admin API; returns (survey_id, element_ids).
pub async fn create_survey(
    client: &reqwest::Client,
    address: &str,
    title: &str,
    elements: Vec<serde_json::Value>,
) -> (i64, Vec<i64>) {
    let response = client
        .post(format!("{}/api/admin/surveys", address))
        .bearer_auth(ADMIN_TOKEN)
        .json(&survey_payload(title, elements))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.expect("Invalid JSON");
    let survey_id = body["id"].as_i64().unwrap();
    let element_ids = body["element_ids"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_i64().unwrap())
        .collect();

    (survey_id, element_ids)
}
