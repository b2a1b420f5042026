use super::*;
use crate::QaError;
use crate::config::Config;
use crate::embeddings::HashingEmbedder;
use crate::generation::Generator;
use crate::ingest::{ChunkingPolicy, segment_text};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

const KNOWLEDGE: &str = "Refunds are processed within 5 business days.\n\nShipping is free on orders over fifty dollars.\n\nOur office is open Monday to Friday.";

struct FixedGenerator;

impl Generator for FixedGenerator {
    fn generate(&self, prompt: &str) -> crate::Result<String> {
        Ok(format!("Answer based on {} chars of prompt", prompt.len()))
    }

    fn model_name(&self) -> &str {
        "fixed"
    }
}

struct UnreachableGenerator;

impl Generator for UnreachableGenerator {
    fn generate(&self, _prompt: &str) -> crate::Result<String> {
        Err(QaError::Generation("model server unreachable".to_string()))
    }

    fn model_name(&self) -> &str {
        "unreachable"
    }
}

fn service_with(generator: Arc<dyn Generator>) -> Arc<QaService> {
    let mut config = Config::default();
    config.chunking = ChunkingPolicy::Paragraphs(crate::ingest::ChunkingConfig {
        target_chunk_size: 10,
        max_chunk_size: 40,
        min_chunk_size: 1,
        overlap_size: 0,
        ..Default::default()
    });
    let segments = segment_text(KNOWLEDGE, "kb.txt", &config.chunking);
    let service = QaService::build(
        segments,
        Arc::new(HashingEmbedder::default()),
        generator,
        &config,
    )
    .expect("service should build");
    Arc::new(service)
}

fn ask_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/ask")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request should build")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

#[tokio::test(flavor = "multi_thread")]
async fn index_page_serves_form() {
    let app = build_router(service_with(Arc::new(FixedGenerator)));
    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).expect("request"))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let html = String::from_utf8(bytes.to_vec()).expect("utf-8 page");
    assert!(html.contains("<title>Business Q&amp;A Chatbot</title>"));
    assert!(html.contains("placeholder=\"Ask a business question...\""));
    assert!(html.contains("/api/ask"));
}

#[tokio::test(flavor = "multi_thread")]
async fn ask_returns_answer_and_sources() {
    let app = build_router(service_with(Arc::new(FixedGenerator)));
    let response = app
        .oneshot(ask_request(r#"{"query": "How long do refunds take?"}"#))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert!(
        json["answer"]
            .as_str()
            .expect("answer string")
            .starts_with("Answer based on")
    );
    let sources = json["sources"].as_array().expect("sources array");
    assert_eq!(sources.len(), 3);
    assert_eq!(sources[0]["source"], "kb.txt");
    assert!(
        sources[0]["text"]
            .as_str()
            .expect("text")
            .contains("Refunds")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn blank_query_returns_guidance() {
    let app = build_router(service_with(Arc::new(UnreachableGenerator)));
    let response = app
        .oneshot(ask_request(r#"{"query": "   "}"#))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["answer"], "Please enter a business-related question.");
    assert_eq!(json["sources"], serde_json::json!([]));
}

#[tokio::test(flavor = "multi_thread")]
async fn generation_failure_maps_to_bad_gateway() {
    let app = build_router(service_with(Arc::new(UnreachableGenerator)));
    let response = app
        .oneshot(ask_request(r#"{"query": "Is shipping free?"}"#))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "GENERATION_ERROR");
    assert!(
        json["error"]["message"]
            .as_str()
            .expect("message")
            .contains("model server unreachable")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_body_is_rejected() {
    let app = build_router(service_with(Arc::new(FixedGenerator)));
    let response = app
        .oneshot(ask_request("not json"))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
    assert!(json["error"]["message"].as_str().is_some_and(|m| !m.is_empty()));
}

#[tokio::test(flavor = "multi_thread")]
async fn missing_query_field_is_json_bad_request() {
    let app = build_router(service_with(Arc::new(FixedGenerator)));
    let response = app
        .oneshot(ask_request(r#"{"question": "Is shipping free?"}"#))
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "BAD_REQUEST");
    assert!(
        json["error"]["message"]
            .as_str()
            .expect("message")
            .contains("query")
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn health_reports_loaded_index() {
    let app = build_router(service_with(Arc::new(FixedGenerator)));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse =
        serde_json::from_value(body_json(response).await).expect("health shape");
    assert_eq!(health.status, "ok");
    assert_eq!(health.segments, 3);
    assert_eq!(health.dimension, 384);
    assert_eq!(health.metric, "l2");
    assert_eq!(health.top_k, 3);
    assert_eq!(health.embedding_model, "hashing");
    assert_eq!(health.generation_model, "fixed");
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_route_is_json_not_found() {
    let app = build_router(service_with(Arc::new(FixedGenerator)));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/missing")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("router should respond");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "NOT_FOUND");
}

#[test]
fn ask_response_from_guidance_has_no_sources() {
    let response = AskResponse::from(crate::qa::Response::Guidance);
    assert_eq!(response.answer, crate::qa::GUIDANCE_MESSAGE);
    assert!(response.sources.is_empty());
}
