//! HTTP surface for the re-tagging frontend.
//!
//! Routes:
//! - `GET /list_collections`
//! - `GET /list_documents?collection=`
//! - `GET /get_document?collection=&document=`
//! - `POST /update_tags?collection=`
//!
//! Ranking is CPU-bound and runs on the blocking pool; the batch itself
//! fans out over the ranker's rayon pool.

use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

use crate::batch::TagRanker;
use crate::catalog::{Catalog, CollectionInfo};
use crate::config::Settings;
use crate::error::{CatalogError, RankError};
use crate::io::{ErrorBody, UpdateTagsRequest, UpdateTagsResponse};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    ranker: Arc<TagRanker>,
    catalog: Arc<Catalog>,
}

impl AppState {
    pub fn new(ranker: Arc<TagRanker>, catalog: Arc<Catalog>) -> Self {
        Self { ranker, catalog }
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let ranker = Arc::new(TagRanker::from_settings(settings)?);
        let catalog = Arc::new(Catalog::new(settings.resolved_models_dir()));
        Ok(Self::new(ranker, catalog))
    }
}

/// Handler failure rendered as `{code, message}`.
#[derive(Debug)]
pub enum ApiError {
    Rank(RankError),
    Internal(String),
}

impl From<RankError> for ApiError {
    fn from(err: RankError) -> Self {
        Self::Rank(err)
    }
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        Self::Rank(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Rank(err) => {
                let status = match err {
                    RankError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
                    RankError::UnknownCollection { .. } => StatusCode::NOT_FOUND,
                    RankError::FileRead { source, .. }
                        if source.kind() == std::io::ErrorKind::NotFound =>
                    {
                        StatusCode::NOT_FOUND
                    }
                    RankError::DataUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, ErrorBody::from(err))
            }
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: message.clone(),
                    suggestions: Vec::new(),
                },
            ),
        };

        tracing::warn!("request failed ({status}): {}", body.message);
        (status, axum::Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct CollectionQuery {
    collection: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DocumentQuery {
    collection: Option<String>,
    document: Option<String>,
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value.ok_or_else(|| RankError::invalid(format!("missing '{name}' query parameter")).into())
}

async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("worker task failed: {e}")))?
}

async fn list_collections(
    State(state): State<AppState>,
) -> Result<axum::Json<Vec<CollectionInfo>>, ApiError> {
    let catalog = Arc::clone(&state.catalog);
    let collections = blocking(move || Ok(catalog.list_collections()?)).await?;
    Ok(axum::Json(collections))
}

async fn list_documents(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
) -> Result<axum::Json<Vec<String>>, ApiError> {
    let Some(collection) = query.collection else {
        return Ok(axum::Json(Vec::new()));
    };
    let catalog = Arc::clone(&state.catalog);
    let documents = blocking(move || match catalog.list_documents(&collection) {
        Err(CatalogError::UnknownCollection(_)) => Ok(Vec::new()),
        other => Ok(other?),
    })
    .await?;
    Ok(axum::Json(documents))
}

async fn get_document(
    State(state): State<AppState>,
    Query(query): Query<DocumentQuery>,
) -> Result<axum::Json<Option<String>>, ApiError> {
    let Some(collection) = query.collection else {
        return Ok(axum::Json(None));
    };
    let document = required(query.document, "document")?;
    let catalog = Arc::clone(&state.catalog);
    let text = blocking(move || match catalog.get_document(&collection, &document) {
        Err(CatalogError::UnknownCollection(_)) => Ok(None),
        other => Ok(Some(other?)),
    })
    .await?;
    Ok(axum::Json(text))
}

async fn update_tags(
    State(state): State<AppState>,
    Query(query): Query<CollectionQuery>,
    body: String,
) -> Result<axum::Json<UpdateTagsResponse>, ApiError> {
    let collection = required(query.collection, "collection")?;
    let request = UpdateTagsRequest::from_json(&body)?;
    tracing::debug!(
        "update_tags for '{collection}' with {} tags",
        request.constraints.len()
    );

    let ranker = Arc::clone(&state.ranker);
    let outcome =
        blocking(move || Ok(ranker.process(&collection, request.into_batch())?)).await?;
    Ok(axum::Json(outcome.into()))
}

async fn health_check() -> &'static str {
    "OK"
}

/// Builds the router with permissive CORS.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/list_collections", get(list_collections))
        .route("/list_documents", get(list_documents))
        .route("/get_document", get(get_document))
        .route("/update_tags", post(update_tags))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl+c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("received shutdown signal");
}

/// Serves until ctrl+c.
pub async fn serve(settings: Settings, bind: String) -> anyhow::Result<()> {
    let state = AppState::from_settings(&settings)?;
    tracing::info!(
        "serving collections from {}",
        state.catalog.models_dir().display()
    );

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!("listening on http://{bind}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}
