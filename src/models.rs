use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;
use uuid::Uuid;

// ============ Intake (wire) Models ============

/// Loose intake shape posted by the site's forms (contact, booking, lead magnet).
///
/// Field names are camelCase on the wire to match the frontend payloads.
/// Everything is optional here; the required-field rules live in the form
/// collector, which every intake path is replayed through.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitLeadRequest {
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Company name; older forms post this as `businessName`.
    #[serde(alias = "businessName")]
    pub company: Option<String>,

    /// Submission category (`general`, `contact`, `booking`, `lead-magnet`).
    #[serde(rename = "type", alias = "formType")]
    pub form_type: Option<String>,
    pub service_type: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub launch_date: Option<String>,
    pub project_priority: Option<String>,
    pub business_model: Option<String>,
    pub appointment_style: Option<String>,
    pub revenue_stream_type: Option<String>,
    pub main_goal: Option<String>,
    pub resource_slug: Option<String>,

    pub message: Option<String>,
    #[serde(alias = "description")]
    pub service_description: Option<String>,
    pub project_idea: Option<String>,
    pub notes: Option<String>,
    pub consent: Option<bool>,

    /// Challenge proof issued by the Turnstile widget. Presence is a hard
    /// precondition for relaying; checked before any network call.
    pub turnstile_token: Option<String>,

    // Referral tags collected by the frontend at submit time.
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    #[serde(rename = "pageURL", alias = "pageUrl")]
    pub page_url: Option<String>,
    pub device_type: Option<String>,

    /// Any additional tags the frontend attaches (e.g. quiz answers).
    /// Kept in a single explicit map instead of merging into the record.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

// ============ Domain Models ============

/// A validated, immutable lead submission.
///
/// Constructed only by the form collector once required fields pass
/// validation; from then on it is read, serialized, and transmitted,
/// never mutated.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    pub contact: ContactFields,
    pub classification: Classification,
    /// Primary free-text body (message, project description, or idea).
    pub message: String,
    pub notes: Option<String>,
    pub consent: bool,
    pub provenance: Provenance,
    pub tags: LeadTags,
}

/// Contact fields supplied by the visitor.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFields {
    /// Display name; coalesced from first/last name when not given directly.
    pub name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
}

/// Classification fields: the submission category plus the enumerated
/// selections offered by the booking and lead-magnet forms.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub form_type: String,
    pub service_type: Option<String>,
    pub budget: Option<String>,
    pub timeline: Option<String>,
    pub launch_date: Option<String>,
    pub project_priority: Option<String>,
    pub business_model: Option<String>,
    pub appointment_style: Option<String>,
    pub revenue_stream_type: Option<String>,
    pub main_goal: Option<String>,
    /// Set only for gated-resource submissions.
    pub resource_slug: Option<String>,
}

/// Browser-derived provenance, attached at the moment of submission
/// (never at field-edit time).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    #[serde(rename = "pageURL")]
    pub page_url: Option<String>,
    pub user_agent: Option<String>,
    pub submitted_at: DateTime<Utc>,
    /// Additional provenance tags, kept in one explicit map.
    pub extra: BTreeMap<String, String>,
}

impl Provenance {
    /// Referral tags default the way the frontend does when nothing is tracked.
    pub fn new(
        utm_source: Option<String>,
        utm_medium: Option<String>,
        utm_campaign: Option<String>,
        page_url: Option<String>,
        user_agent: Option<String>,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            utm_source: utm_source.unwrap_or_else(|| "direct".to_string()),
            utm_medium: utm_medium.unwrap_or_else(|| "none".to_string()),
            utm_campaign: utm_campaign.unwrap_or_else(|| "none".to_string()),
            page_url,
            user_agent,
            submitted_at,
            extra: BTreeMap::new(),
        }
    }
}

/// Quality/tier labels applied uniformly at submission time (not computed).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadTags {
    pub quality: String,
    pub tier: String,
}

impl Default for LeadTags {
    fn default() -> Self {
        Self {
            quality: "new".to_string(),
            tier: "starter".to_string(),
        }
    }
}

// ============ API Response Models ============

/// Response for the lead acceptance endpoint.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponse {
    /// Whether the submission was accepted (authoritative channel).
    pub success: bool,
    /// User-facing confirmation or fallback message.
    pub message: String,
    /// Advisory flag: whether the notification email also went out.
    pub email_sent: bool,
}

/// Request body for the verification endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyTokenRequest {
    #[serde(default)]
    pub turnstile_token: String,
}

/// Response body for the verification endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyTokenResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The verification service's own diagnostic payload, surfaced for
    /// debugging on rejection. Not meant for end-user display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Public widget configuration served to the frontend.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnstileConfigResponse {
    pub site_key: String,
}

/// Response for the gated-resource lookup endpoint.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceAccessResponse {
    pub slug: String,
    pub title: String,
    pub description: String,
    /// True when no valid access token accompanied the request and the
    /// lead-capture form must be shown.
    pub gated: bool,
}

/// Response for a successful gated-resource unlock.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockResponse {
    pub success: bool,
    pub message: String,
    pub email_sent: bool,
    pub resource_token: String,
    pub expires_at: DateTime<Utc>,
}

// ============ Database Models ============

/// One accepted lead, as stored by the acceptance channel.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StoredLead {
    /// Unique identifier for the lead row.
    pub id: Uuid,
    /// Submission category.
    pub form_type: String,
    /// Visitor display name.
    pub name: String,
    /// Visitor email address.
    pub email: String,
    /// Visitor phone, when provided.
    pub phone: Option<String>,
    /// Visitor company, when provided.
    pub company: Option<String>,
    /// Free-text body of the submission.
    pub message: String,
    /// Gated resource slug, for lead-magnet submissions.
    pub resource_slug: Option<String>,
    /// Full submission record (classification, provenance, tags) as JSON.
    pub payload_raw: serde_json::Value,
    /// Quality label applied at submission time.
    pub lead_quality: String,
    /// Tier label applied at submission time.
    pub revenue_tier: String,
    /// Whether the advisory email channel succeeded for this submission.
    pub email_sent: bool,
    /// Timestamp the acceptance channel recorded the lead.
    pub received_at: DateTime<Utc>,
}
