use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use jimmy_core::{
    self as core, Advice, AdviceKind, AppData, ExercisePerformed, PlateCount, ProfileUpdate,
    Session, UserSettings, WorkoutPlan, WorkoutProgram, ai,
};

use crate::{AppError, AppResult, AppState, rate_limit};

const EXPORT_FILENAME: &str = "workout_log.json";

pub fn api(state: &AppState) -> Router<AppState> {
    let ai_routes = Router::new()
        .route("/api/ai/prompt", post(ai_prompt))
        .route("/api/ai/program", post(ai_program))
        .route("/api/ai/advice", post(ai_advice))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::limit_ai_requests,
        ));

    Router::new()
        // Bundle
        .route("/api/data", get(get_data))
        .route("/api/export", get(export_data))
        .route("/api/import", post(import_data))
        // Setup
        .route("/api/settings", put(put_settings))
        .route("/api/program", put(put_program))
        // Training
        .route("/api/sessions", post(log_session))
        .route("/api/workouts/next", get(next_workout))
        .route("/api/exercises/{name}/next-weight", get(next_weight))
        .route("/api/plates", get(plates))
        .merge(ai_routes)
}

// ============================================================================
// Bundle handlers
// ============================================================================

async fn get_data(State(state): State<AppState>) -> Json<AppData> {
    Json(state.store.snapshot().await)
}

async fn export_data(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let body = state.store.read(core::export_bundle).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{EXPORT_FILENAME}\""),
            ),
        ],
        body,
    ))
}

async fn import_data(State(state): State<AppState>, body: Bytes) -> AppResult<Json<AppData>> {
    let text = std::str::from_utf8(&body)
        .map_err(|_| AppError::BadRequest("document is not valid UTF-8".into()))?;
    let imported = core::import_bundle(text)?;

    let data = state
        .store
        .update(|data| {
            *data = imported;
            Ok(data.clone())
        })
        .await?;
    tracing::info!(sessions = data.session_history.len(), "data imported");
    Ok(Json(data))
}

// ============================================================================
// Setup handlers
// ============================================================================

#[derive(Debug, Deserialize)]
struct ProgramInput {
    program: WorkoutProgram,
    settings: Option<ProfileUpdate>,
}

async fn put_settings(
    State(state): State<AppState>,
    Json(settings): Json<UserSettings>,
) -> AppResult<Json<UserSettings>> {
    validate_settings(&settings)?;
    let saved = state
        .store
        .update(|data| {
            data.user_settings = settings;
            Ok(data.user_settings.clone())
        })
        .await?;
    Ok(Json(saved))
}

/// Replaces the program list with one program, optionally updating the
/// profile. Plates and the rest timer are only changed through settings.
async fn put_program(
    State(state): State<AppState>,
    Json(input): Json<ProgramInput>,
) -> AppResult<Json<AppData>> {
    if input.program.schedule.is_empty() || input.program.workouts.is_empty() {
        return Err(AppError::BadRequest("program needs a schedule and workouts".into()));
    }
    if let Some(bar) = input.settings.as_ref().and_then(|s| s.barbell_weight) {
        validate_barbell(bar)?;
    }

    let data = state
        .store
        .update(|data| {
            data.workout_programs = vec![input.program];
            if let Some(profile) = input.settings {
                profile.apply(&mut data.user_settings);
            }
            data.normalize();
            Ok(data.clone())
        })
        .await?;
    tracing::info!(program = %data.workout_programs[0].program_name, "program set");
    Ok(Json(data))
}

fn validate_settings(settings: &UserSettings) -> AppResult<()> {
    validate_barbell(settings.barbell_weight)?;
    if let Some(plate) = settings
        .available_plates
        .iter()
        .find(|p| !p.weight.is_finite() || p.weight <= 0.0)
    {
        return Err(AppError::BadRequest(format!(
            "plate weight must be positive, got {}",
            plate.weight
        )));
    }
    Ok(())
}

fn validate_barbell(weight: f64) -> AppResult<()> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(AppError::BadRequest("barbell weight must be zero or more".into()));
    }
    Ok(())
}

// ============================================================================
// Training handlers
// ============================================================================

#[derive(Debug, Deserialize)]
struct SessionInput {
    workout_id: String,
    #[serde(default)]
    exercises_performed: Vec<ExercisePerformed>,
    date: Option<DateTime<Utc>>,
}

async fn log_session(
    State(state): State<AppState>,
    Json(input): Json<SessionInput>,
) -> AppResult<impl IntoResponse> {
    let workout_id = input.workout_id.trim();
    if workout_id.is_empty() {
        return Err(AppError::BadRequest("workout_id required".into()));
    }

    let date = input.date.unwrap_or_else(Utc::now);
    let session = Session {
        session_id: format!("session_{}", date.to_rfc3339_opts(SecondsFormat::Millis, true)),
        date,
        workout_id: workout_id.to_string(),
        exercises_performed: input.exercises_performed,
    };

    let saved = state
        .store
        .update(|data| {
            if data
                .session_history
                .iter()
                .any(|s| s.session_id == session.session_id)
            {
                return Err(AppError::BadRequest(format!(
                    "session {} already logged",
                    session.session_id
                )));
            }
            data.session_history.push(session.clone());
            Ok(session)
        })
        .await?;
    tracing::info!(workout = %saved.workout_id, "session logged");
    Ok((StatusCode::CREATED, Json(saved)))
}

async fn next_workout(State(state): State<AppState>) -> Json<Option<WorkoutPlan>> {
    Json(state.store.read(core::plan_next_workout).await)
}

#[derive(Debug, Serialize)]
struct NextWeight {
    exercise: String,
    weight: f64,
}

async fn next_weight(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<NextWeight> {
    let weight = state.store.read(|data| core::next_weight(&name, data)).await;
    Json(NextWeight {
        exercise: name,
        weight,
    })
}

#[derive(Debug, Deserialize)]
struct PlatesQuery {
    target: f64,
}

#[derive(Debug, Serialize)]
struct PlateLoad {
    target: f64,
    barbell_weight: f64,
    plates: Vec<PlateCount>,
    loaded_weight: f64,
}

async fn plates(
    State(state): State<AppState>,
    Query(query): Query<PlatesQuery>,
) -> Json<PlateLoad> {
    let load = state
        .store
        .read(|data| {
            let settings = &data.user_settings;
            let plates = core::plate_breakdown(query.target, settings);
            PlateLoad {
                target: query.target,
                barbell_weight: settings.barbell_weight,
                loaded_weight: core::loaded_weight(settings.barbell_weight, &plates),
                plates,
            }
        })
        .await;
    Json(load)
}

// ============================================================================
// AI handlers
// ============================================================================

#[derive(Debug, Deserialize)]
struct PromptInput {
    #[serde(default)]
    prompt: String,
}

#[derive(Debug, Serialize)]
struct PromptReply {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AdviceInput {
    #[serde(default)]
    prompt: String,
    kind: AdviceKind,
}

#[derive(Debug, Serialize)]
struct AdviceReply {
    suggestion: Option<Advice>,
}

fn require_prompt(prompt: &str) -> AppResult<&str> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::BadRequest("Prompt is required.".into()));
    }
    Ok(prompt)
}

async fn ai_prompt(
    State(state): State<AppState>,
    Json(input): Json<PromptInput>,
) -> AppResult<Json<PromptReply>> {
    let prompt = require_prompt(&input.prompt)?;
    let text = state.ai.complete(prompt).await?;
    Ok(Json(PromptReply { text }))
}

/// Drafts a program from the model. The draft is returned, not stored.
async fn ai_program(
    State(state): State<AppState>,
    Json(input): Json<PromptInput>,
) -> AppResult<Json<WorkoutProgram>> {
    let prompt = require_prompt(&input.prompt)?;
    let text = state.ai.complete(prompt).await?;
    let program = ai::parse_program(&text)?;
    tracing::info!(program = %program.program_name, "program drafted");
    Ok(Json(program))
}

async fn ai_advice(
    State(state): State<AppState>,
    Json(input): Json<AdviceInput>,
) -> AppResult<Json<AdviceReply>> {
    let prompt = require_prompt(&input.prompt)?;
    let suggestion = match state.ai.complete(prompt).await {
        Ok(text) => {
            let advice = ai::parse_advice(input.kind, &text);
            if advice.is_none() {
                tracing::warn!(kind = ?input.kind, "unusable advice reply");
            }
            advice
        }
        Err(err) => {
            tracing::warn!(kind = ?input.kind, error = %err, "advice unavailable");
            None
        }
    };
    Ok(Json(AdviceReply { suggestion }))
}
