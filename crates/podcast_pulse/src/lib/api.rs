//! HTTP entrypoints for ingestion and episode processing.
//!
//! Both routes speak JSON, accept cross-origin calls from any origin and always answer
//! with a structured body: `{success: true, ..}` or `{error, ..}` with a non-2xx status.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use podcast_datastore::DataStore;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::{
    error::Error,
    ingest::{IngestReport, PodcastIngestHandler},
    llm::summarizer::ProviderInfo,
    processor::{EpisodeDispatcher, ProcessOutcome},
    xyz::PageFetcher,
};

pub const INGEST_ROUTE: &str = "/functions/v1/fetch-xiaoyuzhou-podcast";
pub const PROCESS_ROUTE: &str = "/functions/v1/process-episode";

pub struct AppState<D, F, P>
where
    D: DataStore + Send + Sync + 'static,
    F: PageFetcher + Send + Sync + 'static,
    P: EpisodeDispatcher + Send + Sync + 'static,
{
    pub ingest: Arc<PodcastIngestHandler<D, F, P>>,
    pub dispatcher: P,
}

impl<D, F, P> Clone for AppState<D, F, P>
where
    D: DataStore + Send + Sync + 'static,
    F: PageFetcher + Send + Sync + 'static,
    P: EpisodeDispatcher + Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            ingest: Arc::clone(&self.ingest),
            dispatcher: self.dispatcher.clone(),
        }
    }
}

/// Error response: `{error}`, plus provider `debug` info for processing failures.
#[derive(Debug)]
pub struct ApiError {
    error: Error,
    debug: Option<ProviderInfo>,
}

impl ApiError {
    fn with_debug(error: impl Into<Error>, debug: ProviderInfo) -> Self {
        ApiError {
            error: error.into(),
            debug: Some(debug),
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        ApiError { error, debug: None }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::InvalidRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Error::from(rejection).into()
    }
}

pub fn status_code(error: &Error) -> StatusCode {
    match error {
        Error::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        Error::NotFound { .. } => StatusCode::NOT_FOUND,
        Error::UpstreamFetch { .. } | Error::UpstreamAi { .. } => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_code(&self.error);
        if status.is_server_error() {
            tracing::error!(error = %self.error, "Request failed");
        }

        let body = match self.debug {
            Some(debug) => json!({ "error": self.error.to_string(), "debug": debug }),
            None => json!({ "error": self.error.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[serde(default)]
    pub podcast_id: String,
    #[serde(default)]
    pub creator_id: String,
}

#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub success: bool,
    #[serde(flatten)]
    pub report: IngestReport,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    #[serde(default)]
    pub episode_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    pub success: bool,
    pub episode_id: Uuid,
}

async fn ingest_podcast<D, F, P>(
    State(state): State<AppState<D, F, P>>,
    payload: Result<Json<IngestRequest>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError>
where
    D: DataStore + Send + Sync + 'static,
    F: PageFetcher + Send + Sync + 'static,
    P: EpisodeDispatcher + Clone + Send + Sync + 'static,
{
    let Json(request) = payload?;
    let report = state
        .ingest
        .ingest(&request.podcast_id, &request.creator_id)
        .await?;

    Ok(Json(IngestResponse {
        success: true,
        report,
    }))
}

async fn process_episode<D, F, P>(
    State(state): State<AppState<D, F, P>>,
    payload: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<ProcessResponse>, ApiError>
where
    D: DataStore + Send + Sync + 'static,
    F: PageFetcher + Send + Sync + 'static,
    P: EpisodeDispatcher + Clone + Send + Sync + 'static,
{
    let debug = state.dispatcher.provider();
    let episode_id = match payload.map_err(Error::from).and_then(parse_episode_id) {
        Ok(id) => id,
        Err(error) => return Err(ApiError::with_debug(error, debug)),
    };

    match state.dispatcher.dispatch(episode_id).await {
        ProcessOutcome::Success { episode_id } => Ok(Json(ProcessResponse {
            success: true,
            episode_id,
        })),
        ProcessOutcome::Failed { error, debug } => Err(ApiError::with_debug(error, debug)),
    }
}

fn parse_episode_id(Json(request): Json<ProcessRequest>) -> Result<Uuid, Error> {
    let raw_id = request.episode_id.trim();
    if raw_id.is_empty() {
        return Err(Error::InvalidRequest("Missing episodeId".to_string()));
    }
    Uuid::parse_str(raw_id)
        .map_err(|_| Error::InvalidRequest(format!("Invalid episodeId: {raw_id}")))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router<D, F, P>(state: AppState<D, F, P>) -> Router
where
    D: DataStore + Send + Sync + 'static,
    F: PageFetcher + Send + Sync + 'static,
    P: EpisodeDispatcher + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route(INGEST_ROUTE, post(ingest_podcast::<D, F, P>))
        .route(PROCESS_ROUTE, post(process_episode::<D, F, P>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
