//! API routes for rulesd
//!
//! Status mapping on `/evaluate`: 400 for payload problems, 413 for bodies
//! over the configured limit, 500 for every evaluation failure. The 500 body
//! names the failing stage in `kind`.

use crate::server::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use rules_common::{
    ErrorResponse, EvaluateRequest, EvaluateResponse, FailureResponse, HealthResponse,
    ServiceInfo, ValidationError, SERVICE_NAME, VERSION,
};
use std::sync::Arc;
use tracing::{error, info, warn};

type AppStateArc = Arc<AppState>;

/// ISO-8601 UTC timestamp with millisecond precision
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Evaluate Routes
// ============================================================================

pub fn evaluate_routes() -> Router<AppStateArc> {
    Router::new().route("/evaluate", post(evaluate))
}

async fn evaluate(
    State(state): State<AppStateArc>,
    payload: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(JsonRejection::BytesRejection(e)) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!("Could not buffer /evaluate body: {}", e);
            return reject(
                StatusCode::PAYLOAD_TOO_LARGE,
                ValidationError::BodyTooLarge(state.config.server.max_body_bytes),
            );
        }
        Err(rejection) => {
            return bad_request(ValidationError::MalformedBody(rejection.body_text()));
        }
    };

    let text = match request.text_to_analyze() {
        Ok(text) => text,
        Err(e) => return bad_request(e),
    };

    info!("Processing input: {:?}", text);

    match state.engine.evaluate(text).await {
        Ok(result) => Json(EvaluateResponse::new(text, result, timestamp())).into_response(),
        Err(e) => {
            error!("Error in /evaluate endpoint [{}]: {}", e.kind(), e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FailureResponse::internal(e.to_string(), e.kind())),
            )
                .into_response()
        }
    }
}

fn bad_request(err: ValidationError) -> Response {
    reject(StatusCode::BAD_REQUEST, err)
}

fn reject(status: StatusCode, err: ValidationError) -> Response {
    warn!("Rejected /evaluate request: {}", err);
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health_check))
}

/// Liveness only; does not touch the model backend
async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        version: VERSION.to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: timestamp(),
    })
}

// ============================================================================
// Info Routes
// ============================================================================

pub fn info_routes() -> Router<AppStateArc> {
    Router::new().route("/", get(service_info))
}

async fn service_info() -> Json<ServiceInfo> {
    Json(ServiceInfo::describe(SERVICE_NAME, VERSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::fakes::{FakeGateway, FakeRules};
    use crate::engine::RulesEngine;
    use crate::server::router;
    use axum::body::Body;
    use axum::http::{header::CONTENT_TYPE, Request};
    use http_body_util::BodyExt;
    use rules_common::{Config, EngineError};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app(gateway: Arc<FakeGateway>, rules: Arc<FakeRules>) -> Router {
        app_with_config(gateway, rules, Config::default())
    }

    fn app_with_config(
        gateway: Arc<FakeGateway>,
        rules: Arc<FakeRules>,
        config: Config,
    ) -> Router {
        let engine = RulesEngine::new(gateway, rules);
        router(Arc::new(AppState::new(engine, config)))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/evaluate")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_evaluate_success_shape() {
        let gateway = Arc::new(FakeGateway::replying("all good"));
        let rules = Arc::new(FakeRules::text("rules"));

        let response = app(gateway, rules)
            .oneshot(post_json(r#"{"text": "hello"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["input"], "hello");
        assert_eq!(body["result"], "all good");
        assert_eq!(body["analysis"], "all good");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_blank_input_is_400_and_engine_untouched() {
        let gateway = Arc::new(FakeGateway::replying("unused"));
        let rules = Arc::new(FakeRules::text("rules"));

        let response = app(gateway.clone(), rules.clone())
            .oneshot(post_json(r#"{"input": "   "}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Input cannot be empty");
        assert_eq!(gateway.verify_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
        assert_eq!(rules.load_count(), 0);
    }

    #[tokio::test]
    async fn test_non_string_input_is_400() {
        let gateway = Arc::new(FakeGateway::replying("unused"));
        let rules = Arc::new(FakeRules::text("rules"));

        let response = app(gateway, rules)
            .oneshot(post_json(r#"{"input": 1500}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().contains("must be a string"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let gateway = Arc::new(FakeGateway::replying("unused"));
        let rules = Arc::new(FakeRules::text("rules"));

        let response = app(gateway, rules)
            .oneshot(post_json("{not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
    }

    #[tokio::test]
    async fn test_long_input_passes_through_in_full() {
        let gateway = Arc::new(FakeGateway::replying("ok"));
        let rules = Arc::new(FakeRules::text("rules"));
        let long_text = "a".repeat(80_000);

        let response = app(gateway.clone(), rules)
            .oneshot(post_json(&json!({ "text": long_text }).to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let prompts = gateway.prompts.lock().unwrap();
        assert!(prompts[0].contains(&long_text));
    }

    #[tokio::test]
    async fn test_body_over_limit_names_size() {
        let gateway = Arc::new(FakeGateway::replying("unused"));
        let rules = Arc::new(FakeRules::text("rules"));
        let mut config = Config::default();
        config.server.max_body_bytes = 1024;

        let response = app_with_config(gateway.clone(), rules, config)
            .oneshot(post_json(&json!({ "text": "b".repeat(4096) }).to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body = json_body(response).await;
        assert_eq!(body["error"], "Request body exceeds the 1024-byte limit");
        assert_eq!(gateway.chat_calls(), 0);
    }

    #[tokio::test]
    async fn test_every_engine_failure_is_500() {
        let cases = [
            (
                FakeGateway::replying("x").with_installed(Ok(false)),
                FakeRules::text("r"),
                "model_unavailable",
            ),
            (
                FakeGateway::replying("x"),
                FakeRules::failing("rules.txt: missing"),
                "rule_load",
            ),
            (
                FakeGateway::replying("x").with_reply(Err(EngineError::BackendUnavailable(
                    "Error communicating with Ollama: connection refused".into(),
                ))),
                FakeRules::text("r"),
                "backend_unavailable",
            ),
            (
                FakeGateway::replying("x").with_reply(Err(EngineError::BackendResponse(
                    "missing message.content".into(),
                ))),
                FakeRules::text("r"),
                "backend_response",
            ),
        ];

        for (gateway, rules, kind) in cases {
            let response = app(Arc::new(gateway), Arc::new(rules))
                .oneshot(post_json(r#"{"text": "input"}"#))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{}", kind);

            let body = json_body(response).await;
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], "Internal server error");
            assert_eq!(body["kind"], kind);
            assert!(body["details"]
                .as_str()
                .unwrap()
                .starts_with("Error applying rules:"));
        }
    }

    #[tokio::test]
    async fn test_health_does_not_touch_backend() {
        let gateway = Arc::new(FakeGateway::replying("x").with_installed(Err(
            EngineError::BackendUnavailable("down".into()),
        )));
        let rules = Arc::new(FakeRules::failing("missing"));

        let response = app(gateway.clone(), rules)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], SERVICE_NAME);
        assert!(body["uptime_seconds"].is_u64());
        assert_eq!(gateway.verify_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_root_describes_service() {
        let gateway = Arc::new(FakeGateway::replying("x"));
        let rules = Arc::new(FakeRules::text("r"));

        let response = app(gateway, rules)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["service"], SERVICE_NAME);
        assert_eq!(body["version"], VERSION);
        assert!(body["endpoints"]["POST /evaluate"].is_string());
        assert!(body["example"]["body"]["text"].is_string());
    }
}
