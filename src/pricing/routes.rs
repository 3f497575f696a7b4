//! Pricing and checkout route handlers

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::cache::{CachedSession, SessionCache};
use crate::error::{AppError, Result};
use crate::payments::{CheckoutSession, PaymentError, SessionItem};
use crate::AppState;

use super::calculators::to_minor_units;
use super::models::{Quote, Reservation};
use super::requests::{DirectCheckoutRequest, PrecomputedRequest, ReservationRequest};
use super::responses::{QuoteResponse, SessionResponse};
use super::services::{quote_precomputed, quote_reservation};

const IDEMPOTENCY_HEADER: &str = "idempotency-key";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/quote", post(quote))
        .route("/create-session", post(create_session))
        .route("/create-session/precomputed", post(create_precomputed_session))
        .route("/checkout", post(direct_checkout))
}

/// Price a reservation without opening a payment session
async fn quote(State(state): State<AppState>, body: Bytes) -> Result<Json<QuoteResponse>> {
    let req: ReservationRequest = parse_body(&body)?;
    let quote = price_reservation(&state, &req.to_reservation()?)?;
    Ok(Json(QuoteResponse::from_quote(&quote, &state.config.currency)))
}

/// Price a reservation and open a checkout session for the amount due now
async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SessionResponse>> {
    let req: ReservationRequest = parse_body(&body)?;
    let reservation = req.to_reservation()?;
    let quote = price_reservation(&state, &reservation)?;
    let idempotency_key = idempotency_key(&headers, req.idempotency_key.as_deref())?;
    let (success_url, cancel_url) = redirect_urls(&state)?;

    let mut metadata = BTreeMap::new();
    metadata.insert("lodgingType".to_string(), reservation.lodging.as_str().to_string());
    metadata.insert("startDate".to_string(), reservation.start_date.to_string());
    metadata.insert("endDate".to_string(), reservation.end_date.to_string());
    metadata.insert("adults".to_string(), reservation.adults.to_string());
    metadata.insert("children".to_string(), reservation.children.to_string());
    metadata.insert("babies".to_string(), reservation.babies.to_string());
    metadata.insert("nights".to_string(), quote.breakdown.nights.to_string());
    metadata.insert(
        "lastMinute".to_string(),
        if quote.last_minute { "yes" } else { "no" }.to_string(),
    );
    metadata.insert("payMode".to_string(), quote.pay_mode.as_str().to_string());
    if let Some(name) = req.customer_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        metadata.insert("customerName".to_string(), name.to_string());
    }

    let session = CheckoutSession {
        currency: state.config.currency.clone(),
        items: session_items(&quote)?,
        success_url,
        cancel_url,
        customer_email: req
            .customer_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(ToOwned::to_owned),
        metadata,
        idempotency_key,
    };

    let url = open_session(&state, session).await?;
    Ok(Json(SessionResponse { url }))
}

/// Checkout for a stay whose nights, extra guests and city tax are already known
async fn create_precomputed_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SessionResponse>> {
    let req: PrecomputedRequest = parse_body(&body)?;
    let stay = req.to_stay()?;
    let quote = quote_precomputed(&stay, &state.tariff)?;
    let idempotency_key = idempotency_key(&headers, req.idempotency_key.as_deref())?;
    let (success_url, cancel_url) = redirect_urls(&state)?;

    let mut metadata = BTreeMap::new();
    metadata.insert("lodging".to_string(), stay.lodging.as_str().to_string());
    metadata.insert("nights".to_string(), stay.nights.to_string());
    metadata.insert("extra_guests".to_string(), stay.extra_guests.to_string());
    metadata.insert("city_tax_total".to_string(), stay.city_tax_total.normalize().to_string());
    metadata.insert("pay_mode".to_string(), stay.pay_mode.as_str().to_string());

    let session = CheckoutSession {
        currency: state.config.currency.clone(),
        items: session_items(&quote)?,
        success_url,
        cancel_url,
        customer_email: None,
        metadata,
        idempotency_key,
    };

    let url = open_session(&state, session).await?;
    Ok(Json(SessionResponse { url }))
}

/// Checkout for a single amount chosen by the caller
async fn direct_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SessionResponse>> {
    let req: DirectCheckoutRequest = parse_body(&body)?;
    let amount = req.amount()?;
    let idempotency_key = idempotency_key(&headers, req.idempotency_key.as_deref())?;

    let success_url = req
        .success_url
        .as_deref()
        .or(state.config.success_url.as_deref())
        .map(str::trim)
        .filter(|u| !u.is_empty());
    let cancel_url = req
        .cancel_url
        .as_deref()
        .or(state.config.cancel_url.as_deref())
        .map(str::trim)
        .filter(|u| !u.is_empty());
    let (Some(success_url), Some(cancel_url)) = (success_url, cancel_url) else {
        return Err(AppError::Configuration(
            "Missing SUCCESS_URL or CANCEL_URL".to_string(),
        ));
    };

    let unit_amount = to_minor_units(amount)?;
    if unit_amount <= 0 {
        return Err(AppError::BadRequest("Bad amount".to_string()));
    }

    let session = CheckoutSession {
        currency: state.config.currency.clone(),
        items: vec![SessionItem {
            name: req.description.clone(),
            unit_amount,
            quantity: 1,
        }],
        success_url: with_session_id(success_url),
        cancel_url: cancel_url.to_string(),
        customer_email: None,
        metadata: BTreeMap::new(),
        idempotency_key,
    };

    let url = open_session(&state, session).await?;
    Ok(Json(SessionResponse { url }))
}

fn price_reservation(state: &AppState, reservation: &Reservation) -> Result<Quote> {
    let quote = quote_reservation(
        reservation,
        state.clock.today(),
        &state.config.rate_schedule,
        &state.tariff,
    )?;
    Ok(quote)
}

/// Hand the session to the provider, reusing an earlier result for the same
/// idempotency key. A key replayed with a different checkout is a conflict.
async fn open_session(state: &AppState, session: CheckoutSession) -> Result<String> {
    let request_id = Uuid::new_v4();

    let Some(key) = session.idempotency_key.clone() else {
        let url = state.payments.create_session(&session).await?;
        log_created(request_id, &session);
        return Ok(url);
    };

    let fingerprint = session.fingerprint();
    let create = async {
        let url = state.payments.create_session(&session).await?;
        Ok::<_, PaymentError>(CachedSession {
            fingerprint: fingerprint.clone(),
            url,
        })
    };

    let (cached, created) = state
        .sessions
        .get_or_create(&key, create)
        .await
        .map_err(|e| AppError::Payment((*e).clone()))?;

    if cached.fingerprint != fingerprint {
        tracing::warn!(request_id = %request_id, "Idempotency key reused for a different checkout");
        return Err(AppError::Conflict(
            "Idempotency key was already used for a different checkout".to_string(),
        ));
    }

    if created {
        log_created(request_id, &session);
    } else {
        tracing::debug!(request_id = %request_id, "Cache HIT for idempotency key");
    }

    Ok(cached.url.clone())
}

fn log_created(request_id: Uuid, session: &CheckoutSession) {
    let total_minor_units: i64 = session
        .items
        .iter()
        .map(|i| i.unit_amount.saturating_mul(i64::from(i.quantity)))
        .sum();
    tracing::info!(
        request_id = %request_id,
        items = session.items.len(),
        total_minor_units,
        "Checkout session created"
    );
}

fn session_items(quote: &Quote) -> Result<Vec<SessionItem>> {
    if quote.line_items.is_empty() {
        return Err(AppError::BadRequest("Nothing to pay".to_string()));
    }
    Ok(quote.line_items.iter().map(SessionItem::from).collect())
}

fn redirect_urls(state: &AppState) -> Result<(String, String)> {
    state
        .config
        .redirect_urls()
        .map(|(success, cancel)| (success.to_string(), cancel.to_string()))
        .ok_or_else(|| AppError::Configuration("Missing SUCCESS_URL or CANCEL_URL".to_string()))
}

/// Header wins over the body field
fn idempotency_key(headers: &HeaderMap, body_key: Option<&str>) -> Result<Option<String>> {
    let header_key = match headers.get(IDEMPOTENCY_HEADER) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| AppError::BadRequest("Idempotency-Key must be ASCII".to_string()))?,
        ),
        None => None,
    };

    SessionCache::normalize_key(header_key.or(body_key)).map_err(AppError::BadRequest)
}

/// Parse a JSON body; an empty body reads as `{}`
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        &body[..]
    };
    serde_json::from_slice(raw)
        .map_err(|e| AppError::BadRequest(format!("Invalid request body: {}", e)))
}

fn with_session_id(success_url: &str) -> String {
    let separator = if success_url.contains('?') { '&' } else { '?' };
    format!("{success_url}{separator}session_id={{CHECKOUT_SESSION_ID}}")
}
