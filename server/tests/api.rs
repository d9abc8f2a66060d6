use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use jimmy_server::{AppConfig, AppState, build_router};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

struct TestApp {
    _dir: TempDir,
    config: AppConfig,
    router: Router,
}

async fn spawn_app(configure: impl FnOnce(&mut AppConfig)) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.database.path = dir.path().join("jimmy.db").to_string_lossy().into_owned();
    config.ai.base_url = "http://127.0.0.1:9".to_string();
    configure(&mut config);

    let state = AppState::from_config(&config).await.unwrap();
    TestApp {
        _dir: dir,
        config,
        router: build_router(state, CorsLayer::new()),
    }
}

async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn program() -> Value {
    json!({
        "program_name": "Full Body",
        "schedule": ["A", "B"],
        "workouts": [
            {"id": "A", "name": "Day A", "exercises": [
                {"name": "Back Squat", "sets": 3, "reps": 5, "targetWeight": 40},
                {"name": "Pull Up", "sets": 3, "reps": "max", "isBodyweight": true}
            ]},
            {"id": "B", "name": "Day B", "exercises": [
                {"name": "Overhead Press", "sets": 3, "reps": 5, "targetWeight": 25}
            ]}
        ]
    })
}

fn chat_reply(content: &str) -> String {
    json!({"choices": [{"message": {"role": "assistant", "content": content}}]}).to_string()
}

#[tokio::test]
async fn fresh_store_serves_defaults() {
    let app = spawn_app(|_| {}).await;
    let (status, data) = send(&app.router, Method::GET, "/api/data", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["user_settings"]["name"], "Lifter");
    assert_eq!(data["user_settings"]["barbell_weight"], 7.0);
    assert_eq!(data["workout_programs"], json!([]));

    let (status, plan) = send(&app.router, Method::GET, "/api/workouts/next", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(plan, Value::Null);
}

#[tokio::test]
async fn program_sessions_and_progression() {
    let app = spawn_app(|_| {}).await;

    let body = json!({"program": program(), "settings": {"name": "Ada", "barbell_weight": 20}});
    let (status, data) = send(&app.router, Method::PUT, "/api/program", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["workout_programs"][0]["frequency"], 2);
    assert_eq!(data["user_settings"]["name"], "Ada");

    let (_, plan) = send(&app.router, Method::GET, "/api/workouts/next", None).await;
    assert_eq!(plan["workout_id"], "A");
    // No history: 20 kg bar + 20 for a squat.
    assert_eq!(plan["exercises"][0]["weight"], 40.0);
    assert_eq!(plan["exercises"][1]["weight"], 0.0);

    let session = json!({
        "workout_id": "A",
        "date": "2024-03-01T09:30:00Z",
        "exercises_performed": [
            {"name": "Back Squat", "sets_completed": [
                {"reps": 5, "weight": 40}, {"reps": 5, "weight": 40}, {"reps": 5, "weight": 40}
            ]}
        ]
    });
    let (status, saved) = send(&app.router, Method::POST, "/api/sessions", Some(session)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["session_id"], "session_2024-03-01T09:30:00.000Z");

    let (_, plan) = send(&app.router, Method::GET, "/api/workouts/next", None).await;
    assert_eq!(plan["workout_id"], "B");

    let (status, next) = send(
        &app.router,
        Method::GET,
        "/api/exercises/Back%20Squat/next-weight",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(next["exercise"], "Back Squat");
    // Default plates include 0.5 kg, so success adds 1 kg.
    assert_eq!(next["weight"], 41.0);
}

#[tokio::test]
async fn data_survives_a_restart() {
    let app = spawn_app(|_| {}).await;
    let session = json!({"workout_id": "A", "exercises_performed": []});
    let (status, _) = send(&app.router, Method::POST, "/api/sessions", Some(session)).await;
    assert_eq!(status, StatusCode::CREATED);

    let TestApp { _dir: dir, config, router } = app;
    drop(router);

    let state = AppState::from_config(&config).await.unwrap();
    let router = build_router(state, CorsLayer::new());
    let (_, data) = send(&router, Method::GET, "/api/data", None).await;
    assert_eq!(data["session_history"].as_array().unwrap().len(), 1);
    drop(dir);
}

#[tokio::test]
async fn rejects_blank_workout_id() {
    let app = spawn_app(|_| {}).await;
    let body = json!({"workout_id": "  ", "exercises_performed": []});
    let (status, error) = send(&app.router, Method::POST, "/api/sessions", Some(body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"].as_str().unwrap().contains("workout_id"));
}

#[tokio::test]
async fn same_date_session_is_rejected() {
    let app = spawn_app(|_| {}).await;
    let session = json!({"workout_id": "A", "date": "2024-03-01T09:30:00Z"});
    let (status, _) = send(&app.router, Method::POST, "/api/sessions", Some(session.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, error) = send(&app.router, Method::POST, "/api/sessions", Some(session)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"].as_str().unwrap().contains("already logged"));

    let (_, data) = send(&app.router, Method::GET, "/api/data", None).await;
    assert_eq!(data["session_history"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn program_setup_keeps_equipment() {
    let app = spawn_app(|_| {}).await;
    let settings = json!({
        "available_plates": [{"weight": 1.25, "quantity": 2}],
        "rest_timer_seconds": 180
    });
    let (status, _) = send(&app.router, Method::PUT, "/api/settings", Some(settings)).await;
    assert_eq!(status, StatusCode::OK);

    let body = json!({"program": program(), "settings": {"name": "Ada", "barbell_weight": 20}});
    let (status, data) = send(&app.router, Method::PUT, "/api/program", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    let settings = &data["user_settings"];
    assert_eq!(settings["name"], "Ada");
    assert_eq!(settings["barbell_weight"], 20.0);
    assert_eq!(settings["available_plates"], json!([{"weight": 1.25, "quantity": 2}]));
    assert_eq!(settings["rest_timer_seconds"], 180);

    let bad_bar = json!({"program": program(), "settings": {"barbell_weight": -5}});
    let (status, _) = send(&app.router, Method::PUT, "/api/program", Some(bad_bar)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn settings_are_validated() {
    let app = spawn_app(|_| {}).await;

    let bad_bar = json!({"barbell_weight": -1});
    let (status, _) = send(&app.router, Method::PUT, "/api/settings", Some(bad_bar)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bad_plate = json!({"available_plates": [{"weight": 0, "quantity": 2}]});
    let (status, _) = send(&app.router, Method::PUT, "/api/settings", Some(bad_plate)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let good = json!({"barbell_weight": 20, "available_plates": [{"weight": 20, "quantity": 4}]});
    let (status, saved) = send(&app.router, Method::PUT, "/api/settings", Some(good)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["barbell_weight"], 20.0);
    assert_eq!(saved["rest_timer_seconds"], 90);

    let (status, load) = send(&app.router, Method::GET, "/api/plates?target=140", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(load["plates"], json!([{"weight": 20.0, "count": 3}]));
    assert_eq!(load["loaded_weight"], 140.0);
}

#[tokio::test]
async fn import_replaces_or_rejects() {
    let app = spawn_app(|_| {}).await;

    let incomplete = json!({"user_settings": {}, "workout_programs": []});
    let (status, _) = send(&app.router, Method::POST, "/api/import", Some(incomplete)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (_, data) = send(&app.router, Method::GET, "/api/data", None).await;
    assert_eq!(data["user_settings"]["name"], "Lifter");

    let document = json!({
        "user_settings": {"name": "Imported"},
        "workout_programs": [program()],
        "session_history": []
    });
    let (status, data) = send(&app.router, Method::POST, "/api/import", Some(document)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["user_settings"]["name"], "Imported");
    assert_eq!(data["user_settings"]["barbell_weight"], 7.0);
    assert_eq!(data["workout_programs"][0]["frequency"], 2);
}

#[tokio::test]
async fn export_is_an_attachment() {
    let app = spawn_app(|_| {}).await;
    let request = Request::builder()
        .uri("/api/export")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"workout_log.json\""
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let document: Value = serde_json::from_slice(&bytes).unwrap();
    for key in ["user_settings", "workout_programs", "session_history"] {
        assert!(document.get(key).is_some(), "missing {key}");
    }
}

#[tokio::test]
async fn ai_prompt_requires_text() {
    let app = spawn_app(|_| {}).await;
    let (status, error) = send(
        &app.router,
        Method::POST,
        "/api/ai/prompt",
        Some(json!({"prompt": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"].as_str().unwrap().contains("Prompt is required."));
}

#[tokio::test]
async fn ai_prompt_without_backend_is_bad_gateway() {
    let app = spawn_app(|_| {}).await;
    let (status, _) = send(
        &app.router,
        Method::POST,
        "/api/ai/prompt",
        Some(json!({"prompt": "hello"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn ai_program_is_parsed_but_not_stored() {
    let mut server = mockito::Server::new_async().await;
    let content = format!(
        "```json\n{}\n```",
        json!({
            "program_name": "Drafted",
            "ai_description": "Two days a week.",
            "frequency": 2,
            "schedule": ["A", "B"],
            "workouts": program()["workouts"].clone()
        })
    );
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_reply(&content))
        .create_async()
        .await;

    let url = server.url();
    let app = spawn_app(|config| {
        config.ai.base_url = url;
        config.ai.api_key = Some("test-key".to_string());
    })
    .await;

    let (status, drafted) = send(
        &app.router,
        Method::POST,
        "/api/ai/program",
        Some(json!({"prompt": "two day plan"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(drafted["program_name"], "Drafted");

    let (_, data) = send(&app.router, Method::GET, "/api/data", None).await;
    assert_eq!(data["workout_programs"], json!([]));
}

#[tokio::test]
async fn ai_program_rejects_incomplete_drafts() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_reply(r#"{"program_name": "Half", "schedule": ["A"]}"#))
        .create_async()
        .await;

    let url = server.url();
    let app = spawn_app(|config| {
        config.ai.base_url = url;
        config.ai.api_key = Some("test-key".to_string());
    })
    .await;

    let (status, error) = send(
        &app.router,
        Method::POST,
        "/api/ai/program",
        Some(json!({"prompt": "plan"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(error["error"].as_str().unwrap().contains("workouts"));
}

#[tokio::test]
async fn advice_is_parsed_or_null() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_reply("Wednesday, March 6 | Two rest days after heavy squats."))
        .create_async()
        .await;

    let url = server.url();
    let app = spawn_app(|config| {
        config.ai.base_url = url;
        config.ai.api_key = Some("test-key".to_string());
    })
    .await;

    let body = json!({"prompt": "when next?", "kind": "next_workout_date"});
    let (status, reply) = send(&app.router, Method::POST, "/api/ai/advice", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["suggestion"]["kind"], "next_workout_date");
    assert_eq!(reply["suggestion"]["date"], "Wednesday, March 6");

    let offline = spawn_app(|_| {}).await;
    let body = json!({"prompt": "what to eat?", "kind": "diet"});
    let (status, reply) = send(&offline.router, Method::POST, "/api/ai/advice", Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(reply["suggestion"], Value::Null);
}

#[tokio::test]
async fn ai_routes_are_rate_limited() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(chat_reply("ok"))
        .expect(2)
        .create_async()
        .await;

    let url = server.url();
    let app = spawn_app(|config| {
        config.ai.base_url = url;
        config.ai.api_key = Some("test-key".to_string());
        config.rate_limit.ai_requests_per_minute = 2;
    })
    .await;

    let body = json!({"prompt": "hi"});
    for _ in 0..2 {
        let (status, reply) =
            send(&app.router, Method::POST, "/api/ai/prompt", Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reply["text"], "ok");
    }
    let (status, _) = send(&app.router, Method::POST, "/api/ai/prompt", Some(body)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    // Non-AI routes are not counted.
    let (status, _) = send(&app.router, Method::GET, "/api/data", None).await;
    assert_eq!(status, StatusCode::OK);
    mock.assert_async().await;
}
