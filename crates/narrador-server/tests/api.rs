use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use narrador_core::NewStoryRecord;
use narrador_runtime::providers::{ChatMessage, CompletionResponse};
use narrador_runtime::{
    ApiCredential, CredentialSource, LlmProvider, PersistenceError, PromptExecutor,
    ProviderError, SqliteStoryStore, StorySink,
};
use narrador_server::{error, router, AppState};

const TOKEN: &str = "test-token";

struct StubProvider {
    name: &'static str,
    reply: Option<&'static str>,
    usage: Value,
    calls: AtomicUsize,
}

impl StubProvider {
    fn new(name: &'static str, reply: &'static str) -> Arc<Self> {
        Arc::new(Self::build(name, Some(reply)))
    }

    fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self::build(name, None))
    }

    /// Replies without any usage report.
    fn without_usage(name: &'static str, reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            usage: Value::Null,
            ..Self::build(name, Some(reply))
        })
    }

    fn build(name: &'static str, reply: Option<&'static str>) -> Self {
        Self {
            name,
            reply,
            usage: json!({"total_tokens": 64, "completion_tokens_details": null}),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for StubProvider {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.reply {
            Some(text) => Ok(CompletionResponse {
                content: text.to_string(),
                usage: self.usage.clone(),
                model: "stub".to_string(),
            }),
            None => Err(ProviderError::Timeout(std::time::Duration::from_secs(60))),
        }
    }

    async fn health_check(&self) -> bool {
        self.reply.is_some()
    }

    fn name(&self) -> &str {
        self.name
    }

    fn model(&self) -> &str {
        "stub"
    }
}

struct BrokenSink;

#[async_trait]
impl StorySink for BrokenSink {
    async fn append(
        &self,
        _record: NewStoryRecord,
    ) -> Result<narrador_core::StoryRecord, PersistenceError> {
        Err(PersistenceError::Join("database is locked at /srv/narrador.db".to_string()))
    }
}

fn app(providers: Vec<Arc<dyn LlmProvider>>, sink: Arc<dyn StorySink>) -> Router {
    let token = ApiCredential::new(TOKEN, CredentialSource::Programmatic, "API token");
    let state = AppState::new(Arc::new(PromptExecutor::new(providers)), sink, token);
    router(state)
}

fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("x-api-token", TOKEN)
        .body(Body::empty())
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_missing_token_is_rejected_before_any_provider_call() {
    let groq = StubProvider::new("groq", "esboço");
    let app = app(vec![groq.clone()], Arc::new(SqliteStoryStore::in_memory().unwrap()));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v1/llm/gerar_historia?tema=mar")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await, json!({"detail": error::INVALID_TOKEN}));
    assert_eq!(groq.calls(), 0);
}

#[tokio::test]
async fn test_wrong_token_is_rejected() {
    let app = app(Vec::new(), Arc::new(SqliteStoryStore::in_memory().unwrap()));

    let request = Request::builder()
        .method(Method::POST)
        .uri("/v2/llm/resumir_texto_avancado?texto=abc")
        .header("x-api-token", "nope")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_accepted_from_query() {
    let openai = StubProvider::new("openai", "Um resumo.");
    let app = app(vec![openai.clone()], Arc::new(SqliteStoryStore::in_memory().unwrap()));

    let request = Request::builder()
        .method(Method::POST)
        .uri(format!("/v1/llm/resumir_texto?texto=abc&x_api_token={}", TOKEN))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(openai.calls(), 1);
}

#[tokio::test]
async fn test_summary_shape() {
    let openai = StubProvider::new("openai", "Um resumo curto.");
    let store = SqliteStoryStore::in_memory().unwrap();
    let app = app(vec![openai.clone()], Arc::new(store.clone()));

    let response = app
        .oneshot(post("/v1/llm/resumir_texto?texto=O%20mar%20estava%20calmo"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["resumo"], "Um resumo curto.");
    assert!(body["tempo"].as_f64().unwrap() >= 0.0);
    assert_eq!(body["tokens"]["total_tokens"], 64);
    assert_eq!(body["tokens"]["completion_tokens_details"], "null");
    assert_eq!(openai.calls(), 1);
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_no_providers_configured_is_bad_request() {
    let app = app(Vec::new(), Arc::new(SqliteStoryStore::in_memory().unwrap()));

    let response = app.oneshot(post("/v1/llm/gerar_historia?tema=mar")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await, json!({"detail": error::NO_CONTENT}));
}

#[tokio::test]
async fn test_basic_story_with_one_failing_provider() {
    let store = SqliteStoryStore::in_memory().unwrap();
    let app = app(
        vec![StubProvider::failing("groq"), StubProvider::new("openai", "Era uma vez")],
        Arc::new(store.clone()),
    );

    let response = app.oneshot(post("/v1/llm/gerar_historia?tema=mar")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["historia"]["Groq"], Value::Null);
    assert_eq!(body["historia"]["OpenAI"]["historia"], "Era uma vez");
    assert_eq!(
        body["historia"]["OpenAI"]["tokens"]["completion_tokens_details"],
        "null"
    );

    let stored = store.recent(1).unwrap();
    assert_eq!(stored[0].prompt, "mar");
    assert!(stored[0].provider_a_output.is_null());
}

#[tokio::test]
async fn test_evolutionary_story_shape_and_record() {
    let store = SqliteStoryStore::in_memory().unwrap();
    let app = app(
        vec![
            StubProvider::new("groq", "Once there was a dragon..."),
            StubProvider::new("openai", "Once there was a mighty dragon who..."),
        ],
        Arc::new(store.clone()),
    );

    let response = app
        .oneshot(post(
            "/v2/llm/gerar_historia_evolutiva?tema=a%20dragon&estilo=terror",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["esboco"], "Once there was a dragon...");
    assert_eq!(body["historia_evolutiva"], "Once there was a mighty dragon who...");
    assert!(body["tempo_groq"].as_f64().unwrap() >= 0.0);
    assert!(body["tempo_openai"].as_f64().unwrap() >= 0.0);
    assert_eq!(body["tokens_openai"]["total_tokens"], 64);

    assert_eq!(store.count().unwrap(), 1);
    let record = store.recent(1).unwrap().remove(0);
    assert_eq!(record.prompt, "a dragon");
    assert_eq!(record.provider_a_output["esboco"], "Once there was a dragon...");
    assert_eq!(
        record.provider_b_output["historia_final"],
        "Once there was a mighty dragon who..."
    );
}

#[tokio::test]
async fn test_draft_failure_is_bad_request() {
    let openai = StubProvider::new("openai", "final");
    let app = app(
        vec![StubProvider::failing("groq"), openai.clone()],
        Arc::new(SqliteStoryStore::in_memory().unwrap()),
    );

    let response = app
        .oneshot(post("/v2/llm/gerar_historia_evolutiva?tema=mar"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"detail": "Falha ao gerar esboço com Groq."})
    );
    assert_eq!(openai.calls(), 0);
}

#[tokio::test]
async fn test_persistence_failure_hides_detail() {
    let app = app(
        vec![
            StubProvider::new("groq", "esboço"),
            StubProvider::new("openai", "final"),
        ],
        Arc::new(BrokenSink),
    );

    let response = app
        .oneshot(post("/v2/llm/gerar_historia_evolutiva?tema=mar"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body, json!({"detail": error::EVOLUTIONARY_STORY_FAILED}));
    assert!(!body.to_string().contains("/srv/narrador.db"));
}

#[tokio::test]
async fn test_advanced_summary_shape() {
    let openai = StubProvider::new("openai", "Resumo. Palavras-chave: mar. Sentimento: neutro.");
    let store = SqliteStoryStore::in_memory().unwrap();
    let app = app(vec![openai.clone()], Arc::new(store.clone()));

    let response = app
        .oneshot(post(
            "/v2/llm/resumir_texto_avancado?texto=O%20mar%20estava%20calmo&tamanho=conciso",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["resumo"], "Resumo. Palavras-chave: mar. Sentimento: neutro.");
    assert!(body["tempo"].as_f64().unwrap() >= 0.0);
    assert_eq!(body["tokens"]["total_tokens"], 64);
    assert_eq!(openai.calls(), 1);
    assert_eq!(store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_summary_without_openai_is_internal_error() {
    let app = app(
        vec![StubProvider::new("groq", "x")],
        Arc::new(SqliteStoryStore::in_memory().unwrap()),
    );

    let response = app
        .oneshot(post("/v1/llm/resumir_texto?texto=abc"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await, json!({"detail": error::SUMMARY_FAILED}));
}

#[tokio::test]
async fn test_missing_query_parameter_is_rejected() {
    let groq = StubProvider::new("groq", "x");
    let app = app(vec![groq.clone()], Arc::new(SqliteStoryStore::in_memory().unwrap()));

    let response = app.oneshot(post("/v1/llm/gerar_historia")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(groq.calls(), 0);
}

#[tokio::test]
async fn test_health_needs_no_token() {
    let app = app(
        vec![StubProvider::new("groq", "x"), StubProvider::new("openai", "y")],
        Arc::new(SqliteStoryStore::in_memory().unwrap()),
    );

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"status": "ok", "providers": {"groq": true, "openai": true}})
    );
}

#[tokio::test]
async fn test_health_reports_unhealthy_provider() {
    let app = app(
        vec![StubProvider::new("groq", "x"), StubProvider::failing("openai")],
        Arc::new(SqliteStoryStore::in_memory().unwrap()),
    );

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"status": "degraded", "providers": {"groq": true, "openai": false}})
    );
}

#[tokio::test]
async fn test_missing_usage_is_stored_as_empty_map() {
    let store = SqliteStoryStore::in_memory().unwrap();
    let app = app(
        vec![
            StubProvider::without_usage("groq", "esboço"),
            StubProvider::without_usage("openai", "final"),
        ],
        Arc::new(store.clone()),
    );

    let response = app
        .oneshot(post("/v2/llm/gerar_historia_evolutiva?tema=mar"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["tokens_openai"], json!({}));

    let record = store.recent(1).unwrap().remove(0);
    assert_eq!(record.provider_b_output["tokens"], json!({}));
}
