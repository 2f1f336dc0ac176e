pub mod analyze;
pub mod clear_cache;
pub mod config;
pub mod locations;
pub mod session;
pub mod widget;

use chrono::Utc;
use clap::Args;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::runtime::Runtime;
use tracing::warn;
use velocity_agent::{GeminiClient, GeminiSummarizer};
use velocity_core::config::{AppConfig, LoadOptions};
use velocity_core::schema::structured_data;
use velocity_core::{
    AnalysisResult, BusinessRecord, SessionState, StoreError, Tier, WidgetDataService,
    WidgetRequest,
};
use velocity_db::{connect_with_settings, migrations, SqliteCacheStore};
use velocity_places::PlacesClient;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with(command, message, None)
    }

    pub fn success_with(command: &str, message: impl Into<String>, data: Option<Value>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

/// Business selection shared by `widget` and `analyze`.
#[derive(Debug, Clone, Args)]
pub struct TargetArgs {
    #[arg(help = "Demo id (b1, b2), place id, or business name")]
    pub business_id: String,
    #[arg(long, default_value = "prospect", help = "Access tier: prospect or client")]
    pub tier: Tier,
    #[arg(long, default_value = "", help = "Free-text search that overrides the business id")]
    pub query: String,
    #[arg(long, help = "Places API key; falls back to places.api_key from config")]
    pub maps_key: Option<String>,
}

impl TargetArgs {
    pub fn new(business_id: impl Into<String>, tier: Tier) -> Self {
        Self { business_id: business_id.into(), tier, query: String::new(), maps_key: None }
    }

    fn request<'a>(&'a self, config: &'a AppConfig) -> WidgetRequest<'a> {
        WidgetRequest {
            business_id: &self.business_id,
            tier: self.tier,
            query: &self.query,
            credentials: self.maps_key.as_deref().or_else(|| config.places.api_key()),
        }
    }
}

/// Error tuple carried out of `block_on`: (error_class, message, exit_code).
pub(crate) type Failure = (&'static str, String, u8);

pub(crate) type Service =
    WidgetDataService<SqliteCacheStore, PlacesClient, GeminiSummarizer<GeminiClient>>;

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

pub(crate) async fn open_store(config: &AppConfig) -> Result<SqliteCacheStore, Failure> {
    let pool = connect_with_settings(
        &config.store.url,
        config.store.max_connections,
        config.store.timeout_secs,
    )
    .await
    .map_err(|error| ("store", error.to_string(), 4u8))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 4u8))?;
    Ok(SqliteCacheStore::new(pool))
}

pub(crate) async fn open_service(config: &AppConfig) -> Result<Service, Failure> {
    let store = open_store(config).await?;
    let places = PlacesClient::from_config(&config.places)
        .map_err(|error| ("runtime_init", error.to_string(), 3u8))?;
    let llm = GeminiClient::from_config(&config.llm)
        .map_err(|error| ("runtime_init", error.to_string(), 3u8))?;
    Ok(WidgetDataService::new(store, places, GeminiSummarizer::new(llm))
        .with_policy(config.cache.freshness_policy()))
}

pub(crate) fn store_failure(error: StoreError) -> Failure {
    ("store", error.to_string(), 4)
}

/// Remember the last selection so the next invocation can restore it.
pub(crate) async fn remember_selection(service: &Service, tier: Tier, record: &BusinessRecord) {
    let session = SessionState {
        tier,
        business_id: record.id.clone(),
        business_name: Some(record.name.clone()),
    };
    if let Err(error) = service.save_session(&session).await {
        warn!(event_name = "cli.session.save_failed", error = %error, "could not save session");
    }
}

pub(crate) fn widget_payload(
    record: &BusinessRecord,
    analysis: Option<&AnalysisResult>,
    analysis_error: Option<&str>,
) -> Value {
    let now = Utc::now();
    json!({
        "record": record,
        "provenance": record.provenance(),
        "velocity": record.velocity(now),
        "analysis": analysis,
        "analysis_error": analysis_error,
        "structured_data": structured_data(record, analysis, now),
    })
}
