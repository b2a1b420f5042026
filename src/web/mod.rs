// Web module
// Single-page question form plus JSON endpoints: GET /, POST /api/ask, GET /health

#[cfg(test)]
mod tests;

mod error;

pub use error::{WebError, WebResult};

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::qa::{QaService, Response};

const INDEX_HTML: &str = include_str!("index.html");

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SourceView {
    pub ordinal: usize,
    pub text: String,
    pub source: String,
    pub distance: f32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceView>,
}

impl From<Response> for AskResponse {
    fn from(response: Response) -> Self {
        let sources = response
            .sources()
            .iter()
            .map(|retrieved| SourceView {
                ordinal: retrieved.segment.ordinal,
                text: retrieved.segment.text.clone(),
                source: retrieved.segment.source.clone(),
                distance: retrieved.distance,
            })
            .collect();
        Self {
            answer: response.text().to_string(),
            sources,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub segments: usize,
    pub dimension: usize,
    pub metric: String,
    pub top_k: usize,
    pub embedding_model: String,
    pub generation_model: String,
}

/// Build the router serving the form and the question endpoint
#[inline]
pub fn build_router(service: Arc<QaService>) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/api/ask", post(ask))
        .route("/health", get(health))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Bind `addr` and serve until Ctrl+C or SIGTERM
#[inline]
pub async fn serve(service: Arc<QaService>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(service);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Serving question form on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

#[allow(clippy::unused_async, reason = "axum handlers are async functions")]
async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn ask(
    State(service): State<Arc<QaService>>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> WebResult<Json<AskResponse>> {
    let Json(request) = payload?;
    debug!("Received question ({} chars)", request.query.len());

    // Embedding and generation block on HTTP calls to the model server
    let response =
        tokio::task::spawn_blocking(move || service.respond(&request.query)).await??;

    Ok(Json(response.into()))
}

#[allow(clippy::unused_async, reason = "axum handlers are async functions")]
async fn health(State(service): State<Arc<QaService>>) -> Json<HealthResponse> {
    let chain = service.chain();
    let retriever = chain.retriever();
    let index = retriever.index();

    Json(HealthResponse {
        status: "ok".to_string(),
        segments: index.len(),
        dimension: index.dimension(),
        metric: index.metric().to_string(),
        top_k: retriever.top_k(),
        embedding_model: retriever.embedder().model_name().to_string(),
        generation_model: chain.generator().model_name().to_string(),
    })
}

#[allow(clippy::unused_async, reason = "axum handlers are async functions")]
async fn not_found() -> WebError {
    WebError::NotFound
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        () = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
