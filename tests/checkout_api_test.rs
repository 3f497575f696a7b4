//! End-to-end tests driving the router with a recording payment provider.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tower::ServiceExt;

use lodging_checkout::clock::FixedClock;
use lodging_checkout::config::AppConfig;
use lodging_checkout::payments::{CheckoutSession, PaymentError, PaymentSessionService};
use lodging_checkout::{app, AppState};

const SESSION_URL: &str = "https://checkout.stripe.test/c/pay/cs_test_123";

#[derive(Default)]
struct RecordingPayments {
    sessions: Mutex<Vec<CheckoutSession>>,
    reject_with: Option<String>,
    delay: Duration,
}

impl RecordingPayments {
    fn rejecting(message: &str) -> Self {
        Self {
            reject_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    fn slow(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }

    fn recorded(&self) -> Vec<CheckoutSession> {
        self.sessions.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentSessionService for RecordingPayments {
    async fn create_session(&self, session: &CheckoutSession) -> Result<String, PaymentError> {
        self.sessions.lock().unwrap().push(session.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.reject_with {
            Some(message) => Err(PaymentError::Provider {
                status: 400,
                message: message.clone(),
            }),
            None => Ok(SESSION_URL.to_string()),
        }
    }
}

fn configured() -> AppConfig {
    AppConfig {
        stripe_secret_key: Some("sk_test_123".to_string()),
        success_url: Some("https://gite.example/merci".to_string()),
        cancel_url: Some("https://gite.example/annule".to_string()),
        ..AppConfig::default()
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()
}

fn test_state(config: AppConfig, payments: Arc<RecordingPayments>) -> AppState {
    AppState::with_services(config, payments, Arc::new(FixedClock(today())))
}

fn test_app(config: AppConfig, payments: Arc<RecordingPayments>) -> Router {
    app(test_state(config, payments))
}

fn keyed_post(path: &str, key: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header("content-type", "application/json")
        .header("Idempotency-Key", key)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn post_json(app: Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn quote_returns_breakdown_for_full_payment() {
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(configured(), payments.clone());

    let (status, body) = post_json(
        app,
        "/api/quote",
        json!({
            "lodgingType": "apartment",
            "startDate": "2025-09-01",
            "endDate": "2025-09-04",
            "adults": 2,
            "payMode": "full"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nights"], 3);
    assert_eq!(body["lodgingSubtotal"]["amount"], "180");
    assert_eq!(body["cityTax"]["amount"], "7.2");
    assert_eq!(body["totalMinorUnits"], 18720);
    assert_eq!(body["lastMinute"], false);
    assert!(payments.recorded().is_empty());
}

#[tokio::test]
async fn create_session_sends_deposit_line_item() {
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(configured(), payments.clone());

    let (status, body) = post_json(
        app,
        "/api/create-session",
        json!({
            "lodgingType": "house",
            "startDate": "2025-09-01",
            "endDate": "2025-09-03",
            "adults": 4,
            "payMode": "deposit",
            "customerEmail": "guest@example.com"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], SESSION_URL);

    let sessions = payments.recorded();
    assert_eq!(sessions.len(), 1);
    let session = &sessions[0];
    assert_eq!(session.currency, "eur");
    assert_eq!(session.items.len(), 1);
    assert_eq!(session.items[0].unit_amount, 26500);
    assert_eq!(session.success_url, "https://gite.example/merci");
    assert_eq!(session.customer_email.as_deref(), Some("guest@example.com"));
    assert_eq!(session.metadata["lodgingType"], "house");
    assert_eq!(session.metadata["nights"], "2");
    assert_eq!(session.metadata["adults"], "4");
    assert_eq!(session.metadata["lastMinute"], "no");
}

#[tokio::test]
async fn last_minute_booking_charges_lodging_and_tax() {
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(configured(), payments.clone());

    let (status, _) = post_json(
        app,
        "/api/create-session",
        json!({
            "lodgingType": "apartment",
            "startDate": "2025-07-04",
            "endDate": "2025-07-05",
            "adults": 2
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let session = &payments.recorded()[0];
    let amounts: Vec<i64> = session.items.iter().map(|i| i.unit_amount).collect();
    assert_eq!(amounts, vec![6000, 240]);
    assert_eq!(session.items[1].name, "Taxe de séjour");
    assert_eq!(session.metadata["lastMinute"], "yes");
}

#[tokio::test]
async fn invalid_input_never_reaches_provider() {
    let payments = Arc::new(RecordingPayments::default());

    let cases = [
        json!({"startDate": "2025-09-03", "endDate": "2025-09-01"}),
        json!({"startDate": "not-a-date", "endDate": "2025-09-01"}),
        json!({"startDate": "2025-09-01", "endDate": "2025-09-03", "adults": -1}),
        json!({"lodgingType": "castle", "startDate": "2025-09-01", "endDate": "2025-09-03"}),
    ];

    for case in cases {
        let app = test_app(configured(), payments.clone());
        let (status, body) = post_json(app, "/api/create-session", case.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "case {}", case);
        assert!(body["error"].is_string());
    }

    assert!(payments.recorded().is_empty());
}

#[tokio::test]
async fn empty_body_is_rejected_as_invalid_dates() {
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(configured(), payments.clone());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/create-session")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid dates"));
}

#[tokio::test]
async fn provider_error_message_is_surfaced() {
    let payments = Arc::new(RecordingPayments::rejecting("Invalid API Key provided"));
    let app = test_app(configured(), payments.clone());

    let (status, body) = post_json(
        app,
        "/api/create-session",
        json!({"startDate": "2025-09-01", "endDate": "2025-09-03", "payMode": "full"}),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Invalid API Key provided");
    assert_eq!(payments.recorded().len(), 1);
}

#[tokio::test]
async fn missing_redirect_urls_is_a_configuration_error() {
    let payments = Arc::new(RecordingPayments::default());
    let config = AppConfig {
        success_url: None,
        ..configured()
    };
    let app = test_app(config, payments.clone());

    let (status, body) = post_json(
        app,
        "/api/create-session",
        json!({"startDate": "2025-09-01", "endDate": "2025-09-03"}),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Missing SUCCESS_URL or CANCEL_URL");
    assert!(payments.recorded().is_empty());
}

#[tokio::test]
async fn idempotency_key_reuses_created_session() {
    let payments = Arc::new(RecordingPayments::default());
    let state = test_state(configured(), payments.clone());
    let body = json!({"startDate": "2025-09-01", "endDate": "2025-09-03"});

    for _ in 0..2 {
        let request = keyed_post("/api/create-session", "booking-42", &body);
        let (status, resp) = send(app(state.clone()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp["url"], SESSION_URL);
    }

    let sessions = payments.recorded();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].idempotency_key.as_deref(), Some("booking-42"));
}

#[tokio::test]
async fn idempotency_key_reused_for_other_checkout_conflicts() {
    let payments = Arc::new(RecordingPayments::default());
    let state = test_state(configured(), payments.clone());

    let deposit = json!({"startDate": "2025-09-01", "endDate": "2025-09-03", "payMode": "deposit"});
    let request = keyed_post("/api/create-session", "booking-7", &deposit);
    let (status, _) = send(app(state.clone()), request).await;
    assert_eq!(status, StatusCode::OK);

    let full = json!({"startDate": "2025-09-01", "endDate": "2025-09-03", "payMode": "full"});
    let request = keyed_post("/api/create-session", "booking-7", &full);
    let (status, body) = send(app(state.clone()), request).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Idempotency key"));

    let request = keyed_post("/api/checkout", "booking-7", &json!({"amountToPay": 10}));
    let (status, _) = send(app(state), request).await;
    assert_eq!(status, StatusCode::CONFLICT);

    assert_eq!(payments.recorded().len(), 1);
}

#[tokio::test]
async fn concurrent_requests_with_one_key_create_one_session() {
    let payments = Arc::new(RecordingPayments::slow(Duration::from_millis(100)));
    let state = test_state(configured(), payments.clone());
    let body = json!({"startDate": "2025-09-01", "endDate": "2025-09-03"});

    let (a, b) = tokio::join!(
        send(app(state.clone()), keyed_post("/api/create-session", "booking-9", &body)),
        send(app(state.clone()), keyed_post("/api/create-session", "booking-9", &body)),
    );

    assert_eq!(a.0, StatusCode::OK);
    assert_eq!(b.0, StatusCode::OK);
    assert_eq!(a.1["url"], b.1["url"]);
    assert_eq!(payments.recorded().len(), 1);
}

#[tokio::test]
async fn slow_provider_times_out_with_json_error() {
    let payments = Arc::new(RecordingPayments::slow(Duration::from_millis(500)));
    let config = AppConfig {
        payment_timeout_secs: 0,
        ..configured()
    };
    let app = test_app(config, payments);

    let (status, body) = post_json(
        app,
        "/api/create-session",
        json!({"startDate": "2025-09-01", "endDate": "2025-09-03"}),
    )
    .await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"], "Request timed out");
}

#[tokio::test]
async fn oversized_guest_counts_are_rejected() {
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(configured(), payments.clone());

    let (status, body) = post_json(
        app,
        "/api/quote",
        json!({
            "startDate": "2025-09-01",
            "endDate": "2025-09-03",
            "adults": 4294967295u64,
            "children": 1
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid guest count"));
}

#[tokio::test]
async fn huge_precomputed_stay_is_rejected_before_pricing() {
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(configured(), payments.clone());

    let (status, body) = post_json(
        app,
        "/api/create-session/precomputed",
        json!({
            "lodging": "house",
            "nights": 4000000000u64,
            "extraGuests": 1000000000u64,
            "payMode": "deposit"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_ne!(body["error"], "Nothing to pay");
    assert!(body["error"].as_str().unwrap().starts_with("Invalid dates"));
    assert!(payments.recorded().is_empty());
}

#[tokio::test]
async fn direct_checkout_rejects_amount_too_large() {
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(configured(), payments.clone());

    let (status, body) = post_json(app, "/api/checkout", json!({"amountToPay": 1e20})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad amount: amount too large");
    assert!(payments.recorded().is_empty());
}

#[tokio::test]
async fn precomputed_session_uses_given_figures() {
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(configured(), payments.clone());

    let (status, _) = post_json(
        app,
        "/api/create-session/precomputed",
        json!({
            "lodging": "house",
            "nights": 2,
            "extraGuests": 2,
            "cityTaxTotal": 9.6,
            "payMode": "full"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let session = &payments.recorded()[0];
    let amounts: Vec<i64> = session.items.iter().map(|i| i.unit_amount).collect();
    assert_eq!(amounts, vec![53000, 960]);
    assert_eq!(session.metadata["pay_mode"], "full");
    assert_eq!(session.metadata["city_tax_total"], "9.6");
}

#[tokio::test]
async fn direct_checkout_appends_session_id() {
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(configured(), payments.clone());

    let (status, body) = post_json(app, "/api/checkout", json!({"amountToPay": 132.5})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], SESSION_URL);
    let session = &payments.recorded()[0];
    assert_eq!(session.items[0].name, "Acompte réservation");
    assert_eq!(session.items[0].unit_amount, 13250);
    assert_eq!(
        session.success_url,
        "https://gite.example/merci?session_id={CHECKOUT_SESSION_ID}"
    );
}

#[tokio::test]
async fn direct_checkout_rejects_bad_amount() {
    let payments = Arc::new(RecordingPayments::default());
    let app = test_app(configured(), payments.clone());

    let (status, body) = post_json(app, "/api/checkout", json!({"amountToPay": -5})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Bad amount"));
    assert!(payments.recorded().is_empty());
}

#[tokio::test]
async fn get_on_session_route_is_method_not_allowed() {
    let app = test_app(configured(), Arc::new(RecordingPayments::default()));

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/create-session")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(app, request).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn cors_preflight_is_answered() {
    let app = test_app(configured(), Arc::new(RecordingPayments::default()));

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/create-session")
        .header("origin", "https://gite.example")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "*"
    );
}

#[tokio::test]
async fn health_reports_status() {
    let app = test_app(configured(), Arc::new(RecordingPayments::default()));

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["today"], "2025-07-01");
    assert_eq!(body["paymentsConfigured"], true);
}
