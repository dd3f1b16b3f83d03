use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use ai_llm_service::chat_message::ChatMessage;
use api::{AppState, router};
use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use faq_answer::{ChatBackend, EnhancementError, Enhancer, EnhancerConfig, ServiceContext};
use faq_index::{
    EmbeddingInput, EmbeddingsProvider, FaqEntry, FaqStore, IndexError, Retriever, SimilarityIndex,
};
use serde_json::{Value, json};
use tower::ServiceExt;

struct KeywordEmbedder;

impl EmbeddingsProvider for KeywordEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>> {
        let v = if text.contains("COVID") {
            vec![1.0, 0.0]
        } else {
            vec![100.0, 100.0]
        };
        Box::pin(async move { Ok(v) })
    }
}

struct EchoChat(Option<&'static str>);

impl ChatBackend for EchoChat {
    fn complete<'a>(
        &'a self,
        _messages: &'a [ChatMessage],
        _temperature: f32,
    ) -> Pin<Box<dyn Future<Output = Result<String, EnhancementError>> + Send + 'a>> {
        let reply = self.0;
        Box::pin(async move {
            reply
                .map(str::to_string)
                .ok_or_else(|| EnhancementError::Provider("HTTP 500".into()))
        })
    }
}

fn app(chat: EchoChat) -> axum::Router {
    let mut idx = SimilarityIndex::new(2);
    idx.add(&[1.0, 0.0]).unwrap();
    let lookup = vec![FaqEntry {
        question: "What is COVID-19?".into(),
        answer: "A viral respiratory illness.".into(),
    }];
    let store = FaqStore::new(idx, lookup, EmbeddingInput::QuestionAndAnswer, "test").unwrap();

    let cfg = EnhancerConfig {
        timeout: Duration::from_millis(200),
        ..EnhancerConfig::default()
    };
    let ctx = ServiceContext::new(
        Arc::new(store),
        Retriever::new(Some(1.0)),
        Arc::new(KeywordEmbedder),
        Enhancer::new(Arc::new(chat), cfg),
    );
    router(Arc::new(AppState::new(Arc::new(ctx), None)))
}

async fn post(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri("/get_faq_response")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn answers_with_enhanced_text() {
    let (status, body) = post(
        app(EchoChat(Some("COVID-19 is a viral respiratory illness."))),
        json!({"query": "What is COVID-19?", "history": []}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["query"], "What is COVID-19?");
    assert_eq!(body["enhanced_response"], "COVID-19 is a viral respiratory illness.");
}

#[tokio::test]
async fn falls_back_to_faq_answer_with_200() {
    let (status, body) = post(app(EchoChat(None)), json!({"query": "What is COVID-19?"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enhanced_response"], "A viral respiratory illness.");
}

#[tokio::test]
async fn unrelated_query_is_404() {
    let (status, body) = post(
        app(EchoChat(Some("unused"))),
        json!({"query": "Who won the match?", "history": []}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
    assert_eq!(body["message"], "No relevant FAQ found.");
}

#[tokio::test]
async fn malformed_history_is_400() {
    let (status, body) = post(
        app(EchoChat(Some("unused"))),
        json!({"query": "What is COVID-19?", "history": [{"question": " ", "answer": "x"}]}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn malformed_body_is_400() {
    let (status, body) = post(app(EchoChat(Some("unused"))), json!({"history": "nope"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn health_reports_index_size() {
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app(EchoChat(None)).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["index_entries"], 1);
    assert_eq!(body["dim"], 2);
    assert_eq!(body["providers"], json!([]));
}
