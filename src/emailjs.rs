use crate::config::Config;
use crate::errors::AppError;
use crate::models::LeadSubmission;
use serde_json::json;
use std::time::Duration;

/// Client for the EmailJS REST API (`/api/v1.0/email/send`).
///
/// The advisory notification channel: one outbound email per accepted
/// submission, rendered from a template on the provider side.
#[derive(Clone)]
pub struct EmailJsClient {
    client: reqwest::Client,
    base_url: String,
    service_id: String,
    template_id: String,
    public_key: String,
}

impl EmailJsClient {
    /// Builds the client when all three provider credentials are configured.
    ///
    /// Returns `None` otherwise, which degrades the email channel to a logged
    /// failure with a user-visible fallback contact address.
    pub fn from_config(config: &Config) -> Option<Result<Self, AppError>> {
        let service_id = config.emailjs_service_id.clone()?;
        let template_id = config.emailjs_template_id.clone()?;
        let public_key = config.emailjs_public_key.clone()?;

        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                return Some(Err(AppError::ExternalApiError(format!(
                    "Failed to create EmailJS client: {}",
                    e
                ))))
            }
        };

        Some(Ok(Self {
            client,
            base_url: config.emailjs_base_url.clone(),
            service_id,
            template_id,
            public_key,
        }))
    }

    /// Sends the lead-notification email for one submission.
    ///
    /// # Returns
    ///
    /// * `Result<(), AppError>` - Ok when the provider accepted the send.
    pub async fn send(&self, submission: &LeadSubmission) -> Result<(), AppError> {
        let url = format!("{}/api/v1.0/email/send", self.base_url);
        tracing::info!(
            "Sending lead notification email (type: {})",
            submission.classification.form_type
        );

        let body = json!({
            "service_id": self.service_id,
            "template_id": self.template_id,
            "user_id": self.public_key,
            "template_params": template_params(submission),
        });

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("EmailJS request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "EmailJS returned {}: {}",
                status, error_text
            )));
        }

        tracing::info!("✓ Lead notification email sent");
        Ok(())
    }
}

/// Template variables for the provider-side email template.
///
/// Mirrors what the site's forms historically posted: addressing fields
/// first, then every classification and provenance value the template may
/// reference.
fn template_params(submission: &LeadSubmission) -> serde_json::Value {
    let contact = &submission.contact;
    let class = &submission.classification;
    let prov = &submission.provenance;

    let mut params = json!({
        "to_name": "Echo Web Team",
        "from_name": contact.name,
        "from_email": contact.email,
        "reply_to": contact.email,
        "message": submission.message,
        "company": contact.company.as_deref().unwrap_or(""),
        "phone": contact.phone.as_deref().unwrap_or(""),
        "type": class.form_type,
        "serviceType": class.service_type.as_deref().unwrap_or("not_provided"),
        "budget": class.budget.as_deref().unwrap_or("not_provided"),
        "timeline": class.timeline.as_deref().unwrap_or("not_provided"),
        "launchDate": class.launch_date.as_deref().unwrap_or(""),
        "projectPriority": class.project_priority.as_deref().unwrap_or("not_provided"),
        "businessModel": class.business_model.as_deref().unwrap_or("not_provided"),
        "appointmentStyle": class.appointment_style.as_deref().unwrap_or("not_provided"),
        "revenueStreamType": class.revenue_stream_type.as_deref().unwrap_or("not_provided"),
        "mainGoal": class.main_goal.as_deref().unwrap_or("not_provided"),
        "notes": submission.notes.as_deref().unwrap_or(""),
        "utmSource": prov.utm_source,
        "utmMedium": prov.utm_medium,
        "utmCampaign": prov.utm_campaign,
        "pageURL": prov.page_url.as_deref().unwrap_or(""),
        "deviceType": prov.user_agent.as_deref().unwrap_or(""),
        "submittedAt": prov.submitted_at.to_rfc3339(),
        "leadQuality": submission.tags.quality,
        "revenueTier": submission.tags.tier,
    });

    if let Some(slug) = class.resource_slug.as_deref() {
        params["resourceSlug"] = json!(slug);
    }
    for (key, value) in &prov.extra {
        // Explicit fields win over provenance tags on name collisions.
        if params.get(key).is_none() {
            params[key.as_str()] = json!(value);
        }
    }

    params
}
