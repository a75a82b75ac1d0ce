// tests/export_tests.rs
//
// End-to-end tests of results aggregation (flat/nested) and the CSV
// projection.

mod common;

use common::{ADMIN_TOKEN, spawn_app};

/// Minimal RFC 4180 line parser for assertions on downloaded CSV.
fn parse_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

async fn submit(
    client: &reqwest::Client,
    address: &str,
    survey_id: i64,
    answers: serde_json::Value,
) {
    let response = client
        .post(format!("{}/api/surveys/{}/results", address, survey_id))
        .json(&serde_json::json!({
            "consent_given": true,
            "completed": true,
            "answers": answers
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn flat_shape_returns_four_independent_lists() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (survey_id, element_ids) =
        common::create_survey(&client, &address, "S", vec![common::question("Q", 1, 1)]).await;
    submit(
        &client,
        &address,
        survey_id,
        serde_json::json!([{ "element_id": element_ids[0], "value": 1 }]),
    )
    .await;

    let flat: serde_json::Value = client
        .get(format!(
            "{}/api/admin/surveys/{}/results?shape=flat",
            address, survey_id
        ))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Invalid JSON");

    assert_eq!(flat["surveys"].as_array().unwrap().len(), 1);
    assert_eq!(flat["elements"].as_array().unwrap().len(), 1);
    assert_eq!(flat["participants"].as_array().unwrap().len(), 1);
    assert_eq!(flat["responses"].as_array().unwrap().len(), 1);
    // No cross-referencing: responses carry raw ids, no element annotation.
    assert!(flat["responses"][0].get("question_text").is_none());
}

#[tokio::test]
async fn nested_aggregation_is_idempotent() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (survey_id, element_ids) =
        common::create_survey(&client, &address, "S", vec![common::question("Q", 1, 1)]).await;
    submit(
        &client,
        &address,
        survey_id,
        serde_json::json!([{ "element_id": element_ids[0], "value": "x" }]),
    )
    .await;

    let url = format!(
        "{}/api/admin/surveys/{}/results?shape=nested",
        address, survey_id
    );
    let first = client
        .get(&url)
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .expect("Failed to execute request")
        .text()
        .await
        .expect("Failed to read body");
    let second = client
        .get(&url)
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .expect("Failed to execute request")
        .text()
        .await
        .expect("Failed to read body");

    assert_eq!(first, second);
}

#[tokio::test]
async fn nested_annotates_responses_with_current_element_metadata() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let mut question = common::question("How often?", 1, 1);
    question["task_identifier"] = serde_json::json!("task-a");

    let (survey_id, element_ids) =
        common::create_survey(&client, &address, "S", vec![question]).await;
    submit(
        &client,
        &address,
        survey_id,
        serde_json::json!([{ "element_id": element_ids[0], "value": "daily" }]),
    )
    .await;

    let nested: serde_json::Value = client
        .get(format!(
            "{}/api/admin/surveys/{}/results",
            address, survey_id
        ))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Invalid JSON");

    let response = &nested["participants"][0]["responses"][0];
    assert_eq!(response["question_text"], "How often?");
    assert_eq!(response["question_type"], "shorttext");
    assert_eq!(response["task_identifier"], "task-a");
}

#[tokio::test]
async fn response_to_deleted_element_gets_placeholders_not_failure() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (survey_id, element_ids) =
        common::create_survey(&client, &address, "S", vec![common::question("Q", 1, 1)]).await;

    // One answer to the real element, one to an element that does not exist
    // (as if the survey was edited after the response was recorded).
    submit(
        &client,
        &address,
        survey_id,
        serde_json::json!([
            { "element_id": element_ids[0], "value": "ok" },
            { "element_id": 999999, "value": "orphan" }
        ]),
    )
    .await;

    let nested: serde_json::Value = client
        .get(format!(
            "{}/api/admin/surveys/{}/results",
            address, survey_id
        ))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Invalid JSON");

    let responses = nested["participants"][0]["responses"].as_array().unwrap();
    assert_eq!(responses.len(), 2);
    let orphan = responses
        .iter()
        .find(|r| r["survey_element_id"] == 999999)
        .unwrap();
    assert_eq!(orphan["question_text"], "[not available]");
    assert_eq!(orphan["question_type"], "[not available]");
}

#[tokio::test]
async fn participants_are_ordered_most_recent_first() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (survey_id, element_ids) =
        common::create_survey(&client, &address, "S", vec![common::question("Q", 1, 1)]).await;
    submit(
        &client,
        &address,
        survey_id,
        serde_json::json!([{ "element_id": element_ids[0], "value": 1 }]),
    )
    .await;
    submit(
        &client,
        &address,
        survey_id,
        serde_json::json!([{ "element_id": element_ids[0], "value": 2 }]),
    )
    .await;

    let nested: serde_json::Value = client
        .get(format!(
            "{}/api/admin/surveys/{}/results",
            address, survey_id
        ))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Invalid JSON");

    let participants = nested["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 2);
    let first = participants[0]["id"].as_i64().unwrap();
    let second = participants[1]["id"].as_i64().unwrap();
    assert!(first > second, "newest participant must come first");
}

#[tokio::test]
async fn csv_preserves_value_types_and_totals() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (survey_id, element_ids) = common::create_survey(
        &client,
        &address,
        "S1",
        vec![common::question("Favorite color?", 1, 1)],
    )
    .await;
    let q = element_ids[0];

    // Three participants, three value types. The first also carries a chat
    // transcript and a page-duration log.
    let response = client
        .post(format!("{}/api/surveys/{}/results", address, survey_id))
        .json(&serde_json::json!({
            "consent_given": true,
            "completed": true,
            "page_durations_log": { "1": 30500 },
            "answers": [{
                "element_id": q,
                "value": "blue",
                "paste_count": 2,
                "llm_chat_history": [
                    { "role": "user", "content": "help me pick" },
                    { "role": "assistant", "content": "blue is popular" }
                ]
            }]
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    submit(
        &client,
        &address,
        survey_id,
        serde_json::json!([{ "element_id": q, "value": 42 }]),
    )
    .await;
    submit(
        &client,
        &address,
        survey_id,
        serde_json::json!([{ "element_id": q, "value": ["red", "green"] }]),
    )
    .await;

    let csv = client
        .get(format!(
            "{}/api/admin/surveys/{}/results/csv",
            address, survey_id
        ))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .expect("Failed to execute request")
        .text()
        .await
        .expect("Failed to read body");

    let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
    assert_eq!(lines.len(), 4, "header plus one row per participant");

    let header = parse_csv_line(lines[0]);
    let answer_col = header
        .iter()
        .position(|h| *h == format!("q{}_answer", q))
        .unwrap();
    let paste_col = header
        .iter()
        .position(|h| *h == format!("q{}_paste_count", q))
        .unwrap();
    let total_paste_col = header.iter().position(|h| h == "total_paste_count").unwrap();
    let total_focus_col = header
        .iter()
        .position(|h| h == "total_focus_lost_count")
        .unwrap();
    let pid_col = header.iter().position(|h| h == "participant_id").unwrap();

    // Rows are most-recent-first; index them by participant id instead.
    let mut decoded = std::collections::HashMap::new();
    for line in &lines[1..] {
        let row = parse_csv_line(line);
        let value: serde_json::Value = serde_json::from_str(&row[answer_col]).unwrap();
        decoded.insert(row[pid_col].clone(), (value, row.clone()));
    }

    let (blue_value, blue_row) = &decoded["1"];
    assert_eq!(blue_value, &serde_json::json!("blue"));
    assert_eq!(blue_row[paste_col], "2");
    assert_eq!(blue_row[total_paste_col], "2");
    assert_eq!(blue_row[total_focus_col], "0");

    let chat_col = header
        .iter()
        .position(|h| *h == format!("q{}_chat_history", q))
        .unwrap();
    let chat: serde_json::Value = serde_json::from_str(&blue_row[chat_col]).unwrap();
    assert_eq!(chat[0]["role"], "user");
    assert_eq!(chat[1]["content"], "blue is popular");

    let log_col = header
        .iter()
        .position(|h| h == "page_durations_log")
        .unwrap();
    let log: serde_json::Value = serde_json::from_str(&blue_row[log_col]).unwrap();
    assert_eq!(log["1"], 30500);

    assert_eq!(decoded["2"].0, serde_json::json!(42));
    assert_eq!(decoded["3"].0, serde_json::json!(["red", "green"]));
}

#[tokio::test]
async fn csv_leaves_unanswered_question_family_empty() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    let (survey_id, element_ids) = common::create_survey(
        &client,
        &address,
        "S",
        vec![
            common::question("Q1", 1, 1),
            common::question("Q2 (optional)", 1, 2),
        ],
    )
    .await;

    // Only Q1 answered; Q2 skipped is a valid terminal state.
    submit(
        &client,
        &address,
        survey_id,
        serde_json::json!([{ "element_id": element_ids[0], "value": "yes" }]),
    )
    .await;

    let csv = client
        .get(format!(
            "{}/api/admin/surveys/{}/results/csv",
            address, survey_id
        ))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .expect("Failed to execute request")
        .text()
        .await
        .expect("Failed to read body");

    let lines: Vec<&str> = csv.split("\r\n").filter(|l| !l.is_empty()).collect();
    let header = parse_csv_line(lines[0]);
    let row = parse_csv_line(lines[1]);

    let q2 = element_ids[1];
    let q2_start = header
        .iter()
        .position(|h| *h == format!("q{}_question_text", q2))
        .unwrap();
    for i in q2_start..q2_start + 10 {
        assert_eq!(row[i], "", "column {} should be empty", header[i]);
    }
}

#[tokio::test]
async fn full_store_export_spans_all_surveys() {
    let (address, _pool) = spawn_app().await;
    let client = reqwest::Client::new();

    common::create_survey(&client, &address, "A", vec![common::question("Q", 1, 1)]).await;
    common::create_survey(&client, &address, "B", vec![common::question("Q", 1, 1)]).await;

    let flat: serde_json::Value = client
        .get(format!("{}/api/admin/export", address))
        .bearer_auth(ADMIN_TOKEN)
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .expect("Invalid JSON");

    assert_eq!(flat["surveys"].as_array().unwrap().len(), 2);
    assert_eq!(flat["elements"].as_array().unwrap().len(), 2);
}
