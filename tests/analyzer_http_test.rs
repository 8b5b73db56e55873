use httpmock::prelude::*;
use nutri_track::domain::model::{MealAnalysisRequest, UserContext};
use nutri_track::domain::ports::ConfigProvider;
use nutri_track::{ChatCompletionsClient, ErrorCode, MealAnalyzer, ServiceConfig};
use serde_json::json;
use std::time::Duration;

fn service_config(server: &MockServer) -> ServiceConfig {
    ServiceConfig::from_toml_str(&format!(
        "[vision]\nendpoint = \"{}\"\napi_key = \"sk-test\"\n",
        server.url("/chat/completions")
    ))
    .unwrap()
}

fn analyzer(server: &MockServer) -> MealAnalyzer<ChatCompletionsClient<ServiceConfig>> {
    MealAnalyzer::new(ChatCompletionsClient::new(service_config(server)).unwrap())
}

fn chat_reply(content: serde_json::Value) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

fn meal_json() -> String {
    json!({
        "calories_kcal": 520,
        "macros": {"protein_g": 24.5, "carbs_g": 60, "fat_g": 18, "fiber_g": 6},
        "food_items": [
            {"name": "dal", "probability": 0.9, "portion_estimate_g": 150},
            {"name": "rice", "probability": 0.85, "portion_estimate_g": 180}
        ],
        "confidence_score": 0.72,
        "recommendations": ["Add a side of vegetables"],
        "explainability": ["Lentils provide most of the protein"]
    })
    .to_string()
}

fn request() -> MealAnalysisRequest {
    let mut request = MealAnalysisRequest::new("aGVsbG8=");
    request.tag = Some("lunch".to_string());
    request
}

#[tokio::test]
async fn test_successful_analysis() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .header("authorization", "Bearer sk-test")
            .body_contains("\"model\":\"deepseek-chat\"")
            .body_contains("data:image/jpeg;base64,aGVsbG8=");
        then.status(200).json_body(chat_reply(json!(meal_json())));
    });

    let outcome = analyzer(&server).analyze(&request(), &UserContext::default()).await;

    api_mock.assert();
    assert!(outcome.is_success());
    let analysis = outcome.analysis().unwrap();
    assert_eq!(analysis.nutrients().calories_kcal, 520.0);
    assert_eq!(analysis.nutrients().protein_g, 24.5);
    assert_eq!(analysis.nutrients().fiber_g, 6.0);
    assert_eq!(analysis.items().len(), 2);
    assert!(analysis.needs_confirmation());
    assert!(analysis.needs_portion_confirmation());
    assert!(!analysis.very_low_confidence());

    let envelope = serde_json::to_value(&outcome).unwrap();
    assert_eq!(envelope["status"], "success");
    assert_eq!(envelope["data"]["calories_kcal"], 520.0);
    assert_eq!(envelope["data"]["needs_confirmation"], true);
}

#[tokio::test]
async fn test_prompt_carries_user_context() {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/chat/completions")
            .body_contains("Allergies: peanuts")
            .body_contains("User-estimated portion: 250 ml");
        then.status(200).json_body(chat_reply(json!(meal_json())));
    });

    let context = UserContext {
        goal: Some("fat_loss".to_string()),
        allergies: vec!["peanuts".to_string()],
        ..UserContext::default()
    };
    let mut request = request();
    request.portion_amount = Some(250.0);
    request.portion_unit = Some("ml".to_string());

    let outcome = analyzer(&server).analyze(&request, &context).await;

    api_mock.assert();
    assert!(outcome.is_success());
}

#[tokio::test]
async fn test_fenced_reply_is_accepted() {
    let server = MockServer::start();
    let fenced = format!("Here is the analysis:\n```json\n{}\n```", meal_json());
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(chat_reply(json!(fenced)));
    });

    let outcome = analyzer(&server).analyze(&request(), &UserContext::default()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.analysis().unwrap().nutrients().carbs_g, 60.0);
}

#[tokio::test]
async fn test_multi_part_reply_is_concatenated() {
    let server = MockServer::start();
    let text = meal_json();
    let (head, tail) = text.split_at(text.len() / 2);
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(chat_reply(json!([
            {"type": "text", "text": head},
            {"type": "text", "text": tail}
        ])));
    });

    let outcome = analyzer(&server).analyze(&request(), &UserContext::default()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.analysis().unwrap().items()[1].name, "rice");
}

#[tokio::test]
async fn test_rate_limit_maps_to_rate_limit_code() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(429).body("Too Many Requests");
    });

    let outcome = analyzer(&server).analyze(&request(), &UserContext::default()).await;

    assert_eq!(outcome.error_code(), Some(ErrorCode::RateLimit));
    let envelope = serde_json::to_value(&outcome).unwrap();
    assert_eq!(envelope["status"], "error");
    assert_eq!(envelope["code"], "RATE_LIMIT");
}

#[tokio::test]
async fn test_server_error_maps_to_external_service_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(500).body("x".repeat(1_000));
    });

    let outcome = analyzer(&server).analyze(&request(), &UserContext::default()).await;

    assert_eq!(outcome.error_code(), Some(ErrorCode::ExternalServiceError));
}

#[tokio::test]
async fn test_non_json_reply_is_malformed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200)
            .json_body(chat_reply(json!("I think this is a sandwich, around 400 kcal.")));
    });

    let outcome = analyzer(&server).analyze(&request(), &UserContext::default()).await;

    assert_eq!(outcome.error_code(), Some(ErrorCode::MalformedResponse));
}

#[tokio::test]
async fn test_non_json_envelope_is_malformed() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).body("<html>gateway</html>");
    });

    let outcome = analyzer(&server).analyze(&request(), &UserContext::default()).await;

    assert_eq!(outcome.error_code(), Some(ErrorCode::MalformedResponse));
}

#[tokio::test]
async fn test_schema_failure_names_field() {
    let server = MockServer::start();
    let reply = json!({
        "calories_kcal": 300,
        "macros": {"protein_g": 10, "carbs_g": 40, "fat_g": 8},
        "food_items": [],
        "confidence_score": 0.9
    })
    .to_string();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(chat_reply(json!(reply)));
    });

    let outcome = analyzer(&server).analyze(&request(), &UserContext::default()).await;

    assert_eq!(outcome.error_code(), Some(ErrorCode::SchemaValidationError));
    let envelope = serde_json::to_value(&outcome).unwrap();
    assert_eq!(envelope["message"], "Validation failed: No food items detected");
}

#[tokio::test]
async fn test_explicit_null_calories_is_missing_field() {
    let server = MockServer::start();
    let reply = json!({
        "calories_kcal": null,
        "macros": {"protein_g": 10, "carbs_g": 40, "fat_g": 8},
        "food_items": [{"name": "toast", "probability": 0.9, "portion_estimate_g": 60}],
        "confidence_score": 0.9
    })
    .to_string();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(chat_reply(json!(reply)));
    });

    let outcome = analyzer(&server).analyze(&request(), &UserContext::default()).await;

    let envelope = serde_json::to_value(&outcome).unwrap();
    assert_eq!(envelope["code"], "SCHEMA_VALIDATION_ERROR");
    assert_eq!(
        envelope["message"],
        "Validation failed: Missing required field: calories_kcal"
    );
}

struct ShortTimeoutConfig {
    endpoint: String,
}

impl ConfigProvider for ShortTimeoutConfig {
    fn vision_endpoint(&self) -> &str {
        &self.endpoint
    }
    fn api_key(&self) -> &str {
        "sk-test"
    }
    fn model(&self) -> &str {
        "deepseek-chat"
    }
    fn timeout(&self) -> Duration {
        Duration::from_millis(200)
    }
    fn temperature(&self) -> f32 {
        0.4
    }
    fn max_tokens(&self) -> u32 {
        800
    }
}

#[tokio::test]
async fn test_slow_service_maps_to_timeout() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200)
            .delay(Duration::from_secs(2))
            .json_body(chat_reply(json!(meal_json())));
    });

    let client = ChatCompletionsClient::new(ShortTimeoutConfig {
        endpoint: server.url("/chat/completions"),
    })
    .unwrap();
    let outcome = MealAnalyzer::new(client)
        .analyze(&request(), &UserContext::default())
        .await;

    assert_eq!(outcome.error_code(), Some(ErrorCode::Timeout));
}

#[tokio::test]
async fn test_unreachable_service_maps_to_network() {
    let client = ChatCompletionsClient::new(ShortTimeoutConfig {
        endpoint: "http://127.0.0.1:1/chat/completions".to_string(),
    })
    .unwrap();
    let outcome = MealAnalyzer::new(client)
        .analyze(&request(), &UserContext::default())
        .await;

    assert_eq!(outcome.error_code(), Some(ErrorCode::Network));
}
