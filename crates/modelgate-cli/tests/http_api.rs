//! Routing, authentication and error mapping of the HTTP surface, driven
//! in-process through `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use modelgate_cli::server;
use modelgate_testing::{ManualClock, ScriptedModel, StubProvisioner, TestWorld};
use serde_json::{Value, json};
use tower::ServiceExt;

const KEY: &str = "local-dev-key-001";

const ARTICLE: &str = "The city council approved the new transit plan on Monday. \
Construction of two light rail lines starts next spring. Officials expect ridership to double.";

struct Harness {
    app: Router,
    _world: TestWorld,
}

async fn harness_with(world: TestWorld, provisioner: StubProvisioner) -> Harness {
    let gateway = world
        .gateway(Arc::new(provisioner), Arc::new(ManualClock::ymd(2025, 12, 10)))
        .await
        .unwrap();
    Harness {
        app: server::app(Arc::new(gateway)),
        _world: world,
    }
}

async fn harness(reply: &str) -> Harness {
    harness_with(
        TestWorld::new(),
        StubProvisioner::new(ScriptedModel::new(reply)),
    )
    .await
}

impl Harness {
    async fn send(&self, method: Method, uri: &str, key: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(key) = key {
            builder = builder.header("X-API-Key", key);
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.raw(request).await
    }

    async fn raw(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(KEY), None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(KEY), Some(body)).await
    }
}

#[tokio::test]
async fn test_health_and_root_are_public() {
    let h = harness("ok").await;

    let (status, body) = h.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["models"].as_array().unwrap().len(), 3);

    let (status, body) = h.send(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "modelgate");
}

#[tokio::test]
async fn test_missing_or_wrong_key_is_forbidden() {
    let h = harness("ok").await;

    let (status, body) = h.send(Method::GET, "/limits", None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = h
        .send(Method::GET, "/limits", Some("not-a-real-key"), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = h
        .send(
            Method::POST,
            "/operations/classify",
            Some("wrong"),
            Some(json!({ "text": "x", "categories": ["a", "b"] })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_summarize_round_trip() {
    let h = harness("Council approved transit plan. Rail lines start next spring.").await;

    let (status, body) = h
        .post(
            "/operations/summarize",
            json!({ "text": ARTICLE, "max_sentences": 2, "request_id": "req-42" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["sentence_count"], 2);
    assert_eq!(body["meta"]["operation"], "summarize");
    assert_eq!(body["meta"]["model_used"], "qwen-summarize");
    assert_eq!(body["meta"]["request_id"], "req-42");
    assert_eq!(body["meta"]["input_chars"], ARTICLE.chars().count());

    let (_, usage) = h.get("/limits/usage").await;
    let summarize = usage["usage"]
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["operation"] == "summarize")
        .unwrap();
    assert_eq!(summarize["request_count"], 1);
    assert_eq!(summarize["remaining"], 999);
}

#[tokio::test]
async fn test_translate_and_classify() {
    let model = ScriptedModel::new("unused");
    model.push_output("Bonjour le monde");
    model.push_output("```json\n{\"label\": \"NEGATIVE\", \"confidence\": 0.9}\n```");
    let h = harness_with(TestWorld::new(), StubProvisioner::new(model)).await;

    let (status, body) = h
        .post(
            "/operations/translate",
            json!({ "text": "Hello world", "source_language": "en", "target_language": "fr" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["translated_text"], "Bonjour le monde");
    assert_eq!(body["target_language"], "fr");

    let (status, body) = h
        .post(
            "/operations/classify",
            json!({ "text": "Terrible service", "categories": ["positive", "negative", "neutral"] }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["label"], "negative");
    assert_eq!(body["confidence"], 0.9);
    assert_eq!(body["scores"]["negative"], 0.9);
}

#[tokio::test]
async fn test_validation_errors_are_422() {
    let h = harness("ok").await;

    let (status, body) = h
        .post("/operations/summarize", json!({ "text": "too short" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_input");

    let (status, body) = h
        .post(
            "/operations/translate",
            json!({ "text": "Hello", "source_language": "en", "target_language": "en" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_input");

    let (_, usage) = h.get("/limits/usage").await;
    for row in usage["usage"].as_array().unwrap() {
        assert_eq!(row["request_count"], 0);
    }
}

#[tokio::test]
async fn test_malformed_body_is_422() {
    let h = harness("ok").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/operations/classify")
        .header("X-API-Key", KEY)
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = h.raw(request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_input");

    let (status, _) = h
        .post("/operations/classify", json!({ "text": "hi", "labels": ["a", "b"] }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_input_too_large_carries_detail() {
    let world = TestWorld::new().with_input_cap(modelgate_types::Operation::Summarize, 60);
    let h = harness_with(world, StubProvisioner::new(ScriptedModel::new("ok"))).await;

    let (status, body) = h
        .post("/operations/summarize", json!({ "text": ARTICLE }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "input_too_large");
    assert_eq!(body["detail"]["limit"], 60);
    assert_eq!(body["detail"]["length"], ARTICLE.chars().count());
}

#[tokio::test]
async fn test_quota_exceeded_is_429() {
    let h = harness(r#"{"label": "spam", "confidence": 0.7}"#).await;

    let (status, _) = h
        .send(
            Method::PUT,
            "/limits",
            Some(KEY),
            Some(json!({ "operation": "classify", "daily_limit": 1 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let request = json!({ "text": "WIN A PRIZE", "categories": ["spam", "ham"] });
    let (status, _) = h.post("/operations/classify", request.clone()).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = h.post("/operations/classify", request).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "quota_exceeded");
    assert_eq!(body["detail"]["used"], 1);
    assert_eq!(body["detail"]["limit"], 1);
}

#[tokio::test]
async fn test_update_limit_validation() {
    let h = harness("ok").await;

    let (status, body) = h
        .send(
            Method::PUT,
            "/limits",
            Some(KEY),
            Some(json!({ "operation": "translate", "daily_limit": 250 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let translate = body["limits"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["operation"] == "translate")
        .unwrap();
    assert_eq!(translate["daily_limit"], 250);

    let (status, body) = h
        .send(
            Method::PUT,
            "/limits",
            Some(KEY),
            Some(json!({ "operation": "translate", "daily_limit": 100_001 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invalid_input");

    let (_, limits) = h.get("/limits").await;
    let translate = limits["limits"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["operation"] == "translate")
        .unwrap();
    assert_eq!(translate["daily_limit"], 250);
}

#[tokio::test]
async fn test_missing_model_is_503_without_internals() {
    let provisioner =
        StubProvisioner::new(ScriptedModel::new("ok")).with_missing("qwen-translate");
    let h = harness_with(TestWorld::new(), provisioner).await;

    let (status, body) = h
        .post(
            "/operations/translate",
            json!({ "text": "Hello", "source_language": "en", "target_language": "de" }),
        )
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "orchestration_error");
    assert!(!body["message"].as_str().unwrap().contains("/stub/models"));
}

#[tokio::test]
async fn test_models_listing_and_eviction() {
    let h = harness(r#"{"label": "a", "confidence": 1.0}"#).await;

    let (status, _) = h
        .post("/operations/classify", json!({ "text": "x", "categories": ["a", "b"] }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = h.get("/models").await;
    let classify = body["models"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["model"] == "qwen-classify")
        .unwrap();
    assert_eq!(classify["loaded"], true);

    let (status, body) = h
        .send(Method::DELETE, "/models/qwen-classify", Some(KEY), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["evicted"], true);

    let (status, body) = h
        .send(Method::DELETE, "/models/qwen-classify", Some(KEY), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["evicted"], false);

    let (status, _) = h
        .send(Method::DELETE, "/models/not-configured", Some(KEY), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_settings_exposes_operations() {
    let h = harness("ok").await;

    let (status, body) = h.get("/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["app_name"], "modelgate");
    assert_eq!(body["default_daily_limit"], 1000);
    assert_eq!(body["operations"].as_array().unwrap().len(), 3);
    assert!(body.get("api_keys").is_none());
}
