use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use loan_form::{
    AssessmentSession, FormSchema, GENERIC_FAILURE, HttpPredictionClient, PredictionClient,
    SubmissionState, SubmitError, View,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct Captured {
    bodies: Arc<Mutex<Vec<Value>>>,
    content_types: Arc<Mutex<Vec<String>>>,
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/predict", addr)
}

fn rejected_body() -> Value {
    json!({
        "loan_status": "Rejected",
        "risk_category": "High Risk",
        "probability_of_default": "68.20%",
        "explanations": {
            "shap_top_factors": [
                {"feature": "previous_loan_defaults_on_file_Yes", "impact_score": 2.1, "impact_direction": "Increases Risk"}
            ],
            "lime_rules": [
                {"rule": "loan_percent_income > 0.19", "weight": 0.12, "impact": "Increases Risk"}
            ]
        },
        "action_plan": [
            ["Increase income by $5000"],
            ["Reduce loan amount to $8000", "Improve credit score"]
        ]
    })
}

#[tokio::test]
async fn test_success_posts_json_and_parses_result() {
    let captured = Captured::default();
    let router = Router::new()
        .route(
            "/predict",
            post(
                |State(captured): State<Captured>, headers: HeaderMap, Json(body): Json<Value>| async move {
                    let content_type = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or_default()
                        .to_string();
                    captured.content_types.lock().await.push(content_type);
                    captured.bodies.lock().await.push(body);
                    Json(rejected_body())
                },
            ),
        )
        .with_state(captured.clone());
    let endpoint = serve(router).await;

    let client = HttpPredictionClient::new(endpoint);
    let mut session = AssessmentSession::new(FormSchema::risk_scoring());
    session.update_field("person_income", "50000");
    session.update_field("loan_amnt", "10000");
    session.update_field("person_age", "29");

    let state = session.submit(&client).await;
    let result = state.result().expect("submission should succeed");
    assert_eq!(result.loan_status, "Rejected");
    assert_eq!(result.action_plan.len(), 2);
    assert_eq!(session.view(), View::Result);
    assert!(session.submit_enabled());

    let bodies = captured.bodies.lock().await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["loan_percent_income"], json!(0.2));
    assert_eq!(bodies[0]["person_age"], json!(29));
    assert_eq!(bodies[0]["person_income"], json!(50000.0));
    assert_eq!(bodies[0]["previous_loan_defaults_on_file"], json!("No"));

    let content_types = captured.content_types.lock().await;
    assert_eq!(content_types[0], "application/json");
}

#[tokio::test]
async fn test_error_detail_is_surfaced() {
    let router = Router::new().route(
        "/predict",
        post(|| async {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"detail": "Model not loaded"})),
            )
        }),
    );
    let endpoint = serve(router).await;

    let client = HttpPredictionClient::new(endpoint);
    let mut session = AssessmentSession::new(FormSchema::risk_scoring());
    session.update_field("credit_score", "700");

    let state = session.submit(&client).await;
    assert_eq!(state, &SubmissionState::Failure("Model not loaded".to_string()));
    assert_eq!(session.view(), View::Form);
    assert_eq!(
        session.form().get("credit_score").map(|v| v.to_string()),
        Some("700".to_string())
    );
}

#[tokio::test]
async fn test_empty_error_body_falls_back() {
    let router = Router::new().route("/predict", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    let endpoint = serve(router).await;

    let client = HttpPredictionClient::new(endpoint);
    let err = client
        .predict(&loan_form::build_payload(
            &FormSchema::eligibility(),
            &FormSchema::eligibility().defaults(),
        )
        .unwrap())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SubmitError::Rejected {
            status: 500,
            detail: GENERIC_FAILURE.to_string()
        }
    );
}

#[tokio::test]
async fn test_undecodable_success_body() {
    let router = Router::new().route("/predict", post(|| async { "not json" }));
    let endpoint = serve(router).await;

    let client = HttpPredictionClient::new(endpoint);
    let mut session = AssessmentSession::new(FormSchema::risk_scoring());
    let state = session.submit(&client).await;

    let message = state.error().expect("submission should fail");
    assert!(message.starts_with("Invalid response from prediction service"));
}

#[tokio::test]
async fn test_connection_refused_is_a_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpPredictionClient::new(format!("http://{}/predict", addr));
    let mut session = AssessmentSession::new(FormSchema::risk_scoring());
    let state = session.submit(&client).await;

    let message = state.error().expect("submission should fail");
    assert!(!message.is_empty());
    assert!(session.submit_enabled());
    assert_eq!(session.view(), View::Form);
}
