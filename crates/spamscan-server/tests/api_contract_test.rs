use std::path::PathBuf;
use std::sync::Arc;

use rocket::http::{ContentType, Header, Status};
use rocket::local::asynchronous::Client;
use serde_json::{Value, json};

use spamscan_ai::{
    Encoding, ModelHandle, ModelSource, SequenceClassifier, SpamLabels, TextTokenizer,
};
use spamscan_server::{
    app, error::EMPTY_CONTENT_MESSAGE, routes::INVALID_BODY_MESSAGE, service::InferenceService,
};

const SPAM_WORDS: &[&str] = &["congratulations", "won", "free", "prize", "click"];

/// Word-level tokenizer: id 1 for spam-like words, 0 otherwise.
struct LexicalTokenizer;

impl TextTokenizer for LexicalTokenizer {
    fn encode(&self, text: &str) -> anyhow::Result<Encoding> {
        let ids: Vec<i64> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| SPAM_WORDS.contains(&w.to_lowercase().as_str()) as i64)
            .collect();
        Ok(Encoding {
            attention_mask: vec![1; ids.len()],
            token_type_ids: vec![0; ids.len()],
            input_ids: ids,
        })
    }
}

/// Logits grow with the number of spam-like tokens.
struct LexicalModel {
    labels: Vec<String>,
}

impl SequenceClassifier for LexicalModel {
    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn logits(&self, input: &Encoding) -> anyhow::Result<Vec<f32>> {
        anyhow::ensure!(input.len() < 64, "input exceeds maximum sequence length");
        let hits = input.input_ids.iter().sum::<i64>() as f32;
        Ok(vec![2.0 - 2.0 * hits, 2.0 * hits - 2.0])
    }
}

fn service() -> Arc<InferenceService> {
    let local = ModelSource::Local(PathBuf::from("saved-model"));
    let handle = ModelHandle::new(
        Box::new(LexicalTokenizer),
        Box::new(LexicalModel {
            labels: vec!["LABEL_0".into(), "LABEL_1".into()],
        }),
        ModelSource::Hub("distilbert-base-uncased".into()),
        local,
    );
    let service = InferenceService::new(handle, &SpamLabels::default(), None)
        .expect("default spam label must be in the label space");
    Arc::new(service)
}

async fn client() -> Client {
    Client::tracked(app::build(service(), rocket::Config::debug_default()))
        .await
        .expect("client should build")
}

async fn read_json(response: rocket::local::asynchronous::LocalResponse<'_>) -> Value {
    response
        .into_string()
        .await
        .map(|s| serde_json::from_str::<Value>(&s).expect("response must be valid JSON"))
        .expect("response body should exist")
}

async fn predict(client: &Client, payload: Value) -> (Status, Value) {
    let response = client
        .post("/predict")
        .header(ContentType::JSON)
        .body(payload.to_string())
        .dispatch()
        .await;
    let status = response.status();
    (status, read_json(response).await)
}

#[rocket::async_test]
async fn root_reports_liveness() {
    let client = client().await;
    let response = client.get("/").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Spam Email Detector API is running");
}

#[rocket::async_test]
async fn spam_text_is_flagged() {
    let client = client().await;
    let (status, body) = predict(
        &client,
        json!({"email_content": "Congratulations! You won a free prize, click now!"}),
    )
    .await;

    assert_eq!(status, Status::Ok);
    assert_eq!(body["is_spam"], true);
    let confidence = body["confidence"].as_f64().unwrap();
    assert!(confidence > 0.99 && confidence <= 1.0, "{confidence}");
    assert_eq!(body["confidence"], body["details"]["raw_score"]);
    assert_eq!(body["details"]["raw_label"], "LABEL_1");
    assert_eq!(body["details"]["content_length"], 49);
    assert_eq!(
        body["details"]["model_source"],
        "model=local:saved-model tokenizer=hub:distilbert-base-uncased"
    );
}

#[rocket::async_test]
async fn ordinary_text_is_not_flagged() {
    let client = client().await;
    let (status, body) = predict(
        &client,
        json!({"email_content": "Let's meet for lunch tomorrow at noon."}),
    )
    .await;

    assert_eq!(status, Status::Ok);
    assert_eq!(body["is_spam"], false);
    assert_eq!(body["details"]["raw_label"], "LABEL_0");
    let confidence = body["confidence"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&confidence));
}

#[rocket::async_test]
async fn empty_content_is_rejected() {
    let client = client().await;
    for content in ["", "   ", "\n\t"] {
        let (status, body) = predict(&client, json!({ "email_content": content })).await;
        assert_eq!(status, Status::BadRequest);
        assert_eq!(body["detail"], EMPTY_CONTENT_MESSAGE);
        assert_eq!(body["detail"], "Email content cannot be empty");
    }
}

#[rocket::async_test]
async fn inference_failure_is_500_with_message() {
    let client = client().await;
    let long = "word ".repeat(100);
    let (status, body) = predict(&client, json!({ "email_content": long })).await;

    assert_eq!(status, Status::InternalServerError);
    assert_eq!(
        body["detail"],
        "Prediction error: input exceeds maximum sequence length"
    );
}

#[rocket::async_test]
async fn content_length_counts_untrimmed_characters() {
    let client = client().await;
    let (status, body) = predict(&client, json!({"email_content": "  ünïcode  "})).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["details"]["content_length"], 11);
}

#[rocket::async_test]
async fn malformed_body_returns_json_detail() {
    let client = client().await;
    let response = client
        .post("/predict")
        .header(ContentType::JSON)
        .body(r#"{"content": "missing field"}"#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::UnprocessableEntity);
    let body = read_json(response).await;
    assert_eq!(body["detail"], INVALID_BODY_MESSAGE);
}

#[rocket::async_test]
async fn truncated_json_is_unprocessable() {
    let client = client().await;
    let response = client
        .post("/predict")
        .header(ContentType::JSON)
        .body(r#"{"email_content": "#)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::UnprocessableEntity);
    let body = read_json(response).await;
    assert_eq!(body["detail"], INVALID_BODY_MESSAGE);
}

#[rocket::async_test]
async fn wrong_field_type_is_unprocessable() {
    let client = client().await;
    let (status, body) = predict(&client, json!({ "email_content": 42 })).await;
    assert_eq!(status, Status::UnprocessableEntity);
    assert_eq!(body["detail"], INVALID_BODY_MESSAGE);
}

#[rocket::async_test]
async fn unknown_route_returns_json_404() {
    let client = client().await;
    let response = client.get("/nope").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    let body = read_json(response).await;
    assert_eq!(body["detail"], "Not found: /nope");
}

#[rocket::async_test]
async fn cors_headers_echo_origin() {
    let client = client().await;
    let response = client
        .get("/")
        .header(Header::new("Origin", "http://localhost:5173"))
        .dispatch()
        .await;
    let headers = response.headers();
    assert_eq!(
        headers.get_one("Access-Control-Allow-Origin"),
        Some("http://localhost:5173")
    );
    assert_eq!(
        headers.get_one("Access-Control-Allow-Credentials"),
        Some("true")
    );
}

#[rocket::async_test]
async fn preflight_is_answered() {
    let client = client().await;
    let response = client
        .options("/predict")
        .header(Header::new("Origin", "http://localhost:5173"))
        .header(Header::new("Access-Control-Request-Method", "POST"))
        .header(Header::new(
            "Access-Control-Request-Headers",
            "content-type",
        ))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);
    assert_eq!(
        response.headers().get_one("Access-Control-Allow-Headers"),
        Some("content-type")
    );
}
