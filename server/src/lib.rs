mod ai;
mod db;
mod error;
mod rate_limit;
mod routes;
mod store;

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
};
use config::Config;
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub use crate::ai::AiClient;
pub use crate::db::init_database;
pub use crate::error::{AppError, AppResult};
pub use crate::rate_limit::RateLimiter;
pub use crate::store::Store;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "jimmy.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Sent as `HTTP-Referer`.
    pub site_url: Option<String>,
    /// Sent as `X-Title`.
    pub site_name: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "moonshotai/kimi-k2:free".to_string(),
            api_key: None,
            site_url: None,
            site_name: None,
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub ai_requests_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            ai_requests_per_minute: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ai: AiConfig,
    pub rate_limit: RateLimitConfig,
}

fn load_config() -> AppResult<AppConfig> {
    let mut app_config: AppConfig = Config::builder()
        .add_source(
            config::Environment::with_prefix("JIMMY")
                .separator("__")
                .list_separator(",")
                .try_parsing(true)
                .with_list_parse_key("server.cors_origins"),
        )
        .build()
        .map_err(|err| AppError::Internal(format!("failed to load config: {err}")))?
        .try_deserialize()
        .map_err(|err| AppError::Internal(format!("failed to parse config: {err}")))?;

    if app_config.ai.api_key.is_none() {
        app_config.ai.api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());
    }
    Ok(app_config)
}

// ============================================================================
// Application
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub ai: AiClient,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    pub async fn from_config(app_config: &AppConfig) -> AppResult<Self> {
        let db = init_database(&app_config.database.path).await?;
        Ok(Self {
            store: Arc::new(Store::open(db).await?),
            ai: AiClient::new(app_config.ai.clone())?,
            limiter: Arc::new(RateLimiter::per_minute(
                app_config.rate_limit.ai_requests_per_minute,
            )),
        })
    }
}

pub fn build_router(state: AppState, cors_layer: CorsLayer) -> Router {
    routes::api(&state)
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}

pub fn build_cors_layer(origins: &[String]) -> AppResult<CorsLayer> {
    let allowed_origins: Vec<HeaderValue> = origins
        .iter()
        .map(|origin| {
            origin
                .parse()
                .map_err(|err| AppError::Internal(format!("invalid CORS origin '{origin}': {err}")))
        })
        .collect::<std::result::Result<_, _>>()?;

    Ok(CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_origin(allowed_origins)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn,jimmy_server=info,tower_http=warn"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(env_filter);

    let _ = subscriber.try_init();
}

pub async fn run() -> AppResult<()> {
    init_tracing();

    let app_config = load_config()?;
    let cors_layer = build_cors_layer(&app_config.server.cors_origins)?;

    let state = AppState::from_config(&app_config).await?;
    if !state.ai.is_configured() {
        warn!("no AI API key configured, AI routes will fail");
    }

    let app = build_router(state, cors_layer);

    let addr: SocketAddr = ([0, 0, 0, 0], app_config.server.port).into();
    let listener = TcpListener::bind(addr).await?;
    info!(
        "listening on {addr}, database: {}",
        app_config.database.path
    );
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
