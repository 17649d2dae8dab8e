use crate::config::Config;
use crate::emailjs::EmailJsClient;
use crate::errors::AppError;
use crate::form::LeadForm;
use crate::gate;
use crate::models::*;
use crate::relay::SubmissionRelayer;
use crate::storage::LeadStore;
use crate::turnstile::{client_ip_from_headers, TurnstileClient};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (acceptance channel).
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// Client for the bot-verification service (optional).
    pub turnstile: Option<TurnstileClient>,
    /// Client for the email-delivery provider (absent when unconfigured;
    /// the email channel then degrades to a logged failure).
    pub emailjs: Option<EmailJsClient>,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "echoweb-api",
            "version": "0.1.0"
        })),
    )
}

/// POST /api/v1/leads
///
/// The local acceptance endpoint: boundary-validates the submission through
/// the form collector, then relays it through the email (advisory) and
/// storage (authoritative) channels.
///
/// Responds 200 with `{success: true, message, emailSent}` whenever the
/// acceptance channel captured the lead, even when the email channel
/// failed. Local validation failures are 400; an acceptance-channel failure
/// is 500 with a fallback contact address in the message.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `headers` - Request headers (user agent provenance).
/// * `payload` - The loose intake shape posted by the site's forms.
pub async fn submit_lead(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SubmitLeadRequest>,
) -> Result<(StatusCode, Json<LeadResponse>), AppError> {
    tracing::info!(
        "POST /leads - type: {}, email: {:?}",
        payload.form_type.as_deref().unwrap_or("general"),
        payload.email
    );

    let (submission, mut form) = collect_submission(&payload, &headers)?;

    let outcome = relayer(&state).relay(&submission).await;
    form.mark_delivered(outcome.accepted);

    let status = if outcome.accepted {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((
        status,
        Json(LeadResponse {
            success: outcome.accepted,
            message: outcome.message,
            email_sent: outcome.email_sent,
        }),
    ))
}

/// POST /api/v1/turnstile/verify
///
/// Confirms a challenge token with the third-party verification service.
///
/// A missing/empty token is rejected immediately (400) with no upstream
/// call. A rejected token is also 400, carrying the service's diagnostic
/// payload; an unreachable service is a 500 so callers can distinguish
/// "redo the challenge" from "try again later".
pub async fn verify_turnstile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<VerifyTokenRequest>,
) -> Result<(StatusCode, Json<VerifyTokenResponse>), AppError> {
    if payload.turnstile_token.trim().is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(VerifyTokenResponse {
                success: false,
                error: Some("Missing Turnstile token".to_string()),
                details: None,
            }),
        ));
    }

    let client = state.turnstile.as_ref().ok_or_else(|| {
        AppError::InternalError("Turnstile client unavailable".to_string())
    })?;

    let client_ip = client_ip_from_headers(&headers);
    let verdict = client.verify(&payload.turnstile_token, &client_ip).await?;

    if verdict.success {
        Ok((
            StatusCode::OK,
            Json(VerifyTokenResponse {
                success: true,
                error: None,
                details: None,
            }),
        ))
    } else {
        Err(AppError::VerificationRejected(verdict.details))
    }
}

/// GET /api/v1/turnstile/config
///
/// Public widget configuration for the frontend. The site key is not a
/// secret; an empty string means the widget is not configured.
pub async fn turnstile_config(State(state): State<Arc<AppState>>) -> Json<TurnstileConfigResponse> {
    Json(TurnstileConfigResponse {
        site_key: state.config.turnstile_site_key.clone().unwrap_or_default(),
    })
}

/// Query parameters for the gated-resource lookup.
#[derive(Debug, Deserialize)]
pub struct ResourceAccessQuery {
    /// Access token from a prior unlock, when the page carries `?token=`.
    token: Option<String>,
}

/// GET /api/v1/resources/{slug}
///
/// Gate check for a downloadable resource: returns the catalog entry plus
/// whether the lead-capture form must be shown. A valid, unexpired access
/// token, from the `token` query parameter or the `resource_token`
/// cookie, bypasses the gate.
pub async fn resource_access(
    State(_state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    Query(query): Query<ResourceAccessQuery>,
    headers: HeaderMap,
) -> Json<ResourceAccessResponse> {
    let now = Utc::now();

    let token = query.token.or_else(|| {
        headers
            .get(header::COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(gate::token_from_cookie_header)
    });

    let unlocked = token
        .as_deref()
        .map(|t| gate::grants_access(t, now))
        .unwrap_or(false);

    let resource = gate::resource_for(&slug);
    tracing::debug!("Resource '{}' gate check: unlocked={}", slug, unlocked);

    Json(ResourceAccessResponse {
        slug: resource.slug,
        title: resource.title,
        description: resource.description,
        gated: !unlocked,
    })
}

/// POST /api/v1/resources/{slug}/unlock
///
/// Gated submission: runs the same validation and relay pipeline as
/// `/api/v1/leads` with the lead-magnet classification attached, then
/// issues a 7-day access token in the body and as a cookie.
pub async fn unlock_resource(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<SubmitLeadRequest>,
) -> Result<Response, AppError> {
    tracing::info!("POST /resources/{}/unlock - email: {:?}", slug, payload.email);

    let mut payload = payload;
    payload.form_type = Some("lead-magnet".to_string());
    payload.resource_slug = Some(slug);

    let (submission, mut form) = collect_submission(&payload, &headers)?;

    let outcome = relayer(&state).relay(&submission).await;
    form.mark_delivered(outcome.accepted);

    if !outcome.accepted {
        return Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(LeadResponse {
                success: false,
                message: outcome.message,
                email_sent: outcome.email_sent,
            }),
        )
            .into_response());
    }

    let token = gate::ResourceToken::issue_at(Utc::now());
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, gate::set_cookie_value(&token))],
        Json(UnlockResponse {
            success: true,
            message: outcome.message,
            email_sent: outcome.email_sent,
            resource_token: token.encode(),
            expires_at: token.expires_at(),
        }),
    )
        .into_response())
}

/// Replays the request through the form collector, attaching provenance at
/// submission time. Every intake path shares these invariants; any rejection
/// here happens before a single network call.
fn collect_submission(
    payload: &SubmitLeadRequest,
    headers: &HeaderMap,
) -> Result<(LeadSubmission, LeadForm), AppError> {
    let mut form = LeadForm::from_request(payload);

    let user_agent = payload.device_type.clone().or_else(|| {
        headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });

    // Keep only page URLs that actually parse; provenance is informational.
    let page_url = payload.page_url.clone().filter(|raw| {
        url::Url::parse(raw)
            .map_err(|e| tracing::debug!("Dropping unparseable page URL '{}': {}", raw, e))
            .is_ok()
    });

    let provenance = Provenance::new(
        payload.utm_source.clone(),
        payload.utm_medium.clone(),
        payload.utm_campaign.clone(),
        page_url,
        user_agent,
        Utc::now(),
    );

    let submission = form
        .submit(provenance)
        .map_err(|e| AppError::BadRequest(e.user_message()))?;

    Ok((submission, form))
}

fn relayer(state: &Arc<AppState>) -> SubmissionRelayer {
    SubmissionRelayer::new(
        state.emailjs.clone(),
        LeadStore::new(state.db.clone()),
        state.config.fallback_contact_email.clone(),
    )
}
